//! Store error types

use std::path::PathBuf;

use crate::core::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown scan job '{job_id}'")]
    JobNotFound { job_id: String },

    #[error(transparent)]
    InvalidTarget(#[from] ValidationError),

    /// Injected failures and internal faults
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl crate::core::error_handling::ContextualError for StoreError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, StoreError::InvalidTarget(_) | StoreError::Io { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StoreError::InvalidTarget(e) => Some(e.message()),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
