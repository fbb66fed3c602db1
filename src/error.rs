use thiserror::Error;

/// Engine-level error taxonomy. Per-ticker failures degrade that ticker's
/// decision and never abort the batch; only `InvalidConfig` is fatal, and
/// only at startup.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("data unavailable for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("analysis timed out for {0}")]
    Timeout(String),

    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}
