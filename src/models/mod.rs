pub mod bar;
pub mod context;
pub mod decision;

pub use bar::{PriceBar, PriceSeries};
pub use context::{CatalystSignal, FundamentalSnapshot, IndicatorSnapshot, MarketContext, Regime};
pub use decision::{
    BoostDecision, BoostTier, CorrectionEvent, DecisionRecord, ReversalSignal, RiskAssessment,
    RiskViolation, ScoreComponents, SupervisionVerdict, Verdict,
};
