pub mod outcome;
pub mod supervisor;

pub use outcome::{CalibrationState, OutcomeRecord, OutcomeTracker, ThresholdDelta};
pub use supervisor::{SupervisionContext, Supervisor};
