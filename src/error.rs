use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::analysis::Stage;

/// Quietcut's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Quietcut's crate-wide error type.
///
/// Producer internals build `anyhow` context chains; those collapse into `Message` at the
/// crate boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// An interval was constructed with `end <= start`, a negative start, or a non-finite bound.
    #[error("invalid interval: start={start_sec}, end={end_sec}")]
    InvalidInterval { start_sec: f64, end_sec: f64 },

    /// A pipeline stage failed and the run cannot continue.
    #[error("{} failed: {message}", stage.label())]
    StageFailed { stage: Stage, message: String },

    /// An external call exceeded its configured time budget.
    #[error("{} timed out after {limit:?}", stage.label())]
    Timeout { stage: Stage, limit: Duration },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    /// The stage this error is attributed to, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } | Self::Timeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
