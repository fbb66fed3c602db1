pub mod boost;
pub mod correction;
pub mod emergency;
pub mod reversal;
pub mod risk;
pub mod scorer;

pub use boost::BoostMapper;
pub use correction::CorrectionDetector;
pub use emergency::EmergencyBreaker;
pub use reversal::ReversalDetector;
pub use risk::RiskGate;
pub use scorer::OpportunityScorer;
