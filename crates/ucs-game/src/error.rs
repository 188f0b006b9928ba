use std::path::PathBuf;

use thiserror::Error;
use ucs_core::SimError;
use ucs_reactive::ReactiveError;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    Config { message: String },
}

impl GameError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Process exit code for the demo binary.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. } | Self::Json(_) | Self::Config { .. } => 2,
            Self::Sim(SimError::Setup { .. }) => 3,
            _ => 1,
        }
    }
}
