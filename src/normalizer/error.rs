//! Normalizer error types

use crate::model::api::AssetKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The record cannot produce a valid identity key and is dropped
    #[error("cannot form {kind} identity from '{input}': {reason}")]
    Identity {
        kind: AssetKind,
        input: String,
        reason: String,
    },
}

impl NormalizeError {
    pub fn identity(kind: AssetKind, input: impl Into<String>, reason: impl Into<String>) -> Self {
        NormalizeError::Identity {
            kind,
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl crate::core::error_handling::ContextualError for NormalizeError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
