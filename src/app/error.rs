//! Errors surfaced by the command-line front end

use crate::consolidation::api::ConsolidationError;
use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::monitor::api::MonitorError;
use crate::store::api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing, unreadable or invalid configuration file
    #[error("{message}")]
    Config { message: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Consolidation(#[from] ConsolidationError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A watched job ended without succeeding
    #[error("{0}")]
    Unfinished(String),

    #[error("could not write output: {0}")]
    Output(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Output(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Output(e.to_string())
    }
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config { .. }
            | AppError::Invalid(_)
            | AppError::Logging(_)
            | AppError::Unfinished(_) => true,
            AppError::Consolidation(e) => e.is_user_actionable(),
            AppError::Monitor(e) => e.is_user_actionable(),
            AppError::Store(e) => e.is_user_actionable(),
            AppError::Output(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Config { message }
            | AppError::Logging(message)
            | AppError::Unfinished(message) => Some(message),
            AppError::Invalid(e) => Some(e.message()),
            AppError::Consolidation(e) => e.user_message(),
            AppError::Monitor(e) => e.user_message(),
            AppError::Store(e) => e.user_message(),
            AppError::Output(_) => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
