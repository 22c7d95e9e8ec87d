//! Validation of operator input
//!
//! Target ids become directory names in the directory store, so they are restricted to a
//! conservative character set. Kind and tool lists are comma-separated on the command line.

use std::str::FromStr;

use crate::model::api::{AssetKind, ToolId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_TARGET_ID_LEN: usize = 128;

/// Accept `[A-Za-z0-9._-]{1,128}`, not starting with a dot
pub fn validate_target_id(target_id: &str) -> ValidationResult<&str> {
    if target_id.is_empty() {
        return Err(ValidationError::new("target id must not be empty"));
    }
    if target_id.len() > MAX_TARGET_ID_LEN {
        return Err(ValidationError::new(format!(
            "target id is longer than {MAX_TARGET_ID_LEN} characters"
        )));
    }
    if target_id.starts_with('.') {
        return Err(ValidationError::new(format!(
            "target id '{target_id}' must not start with '.'"
        )));
    }
    if let Some(bad) = target_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(ValidationError::new(format!(
            "target id '{target_id}' contains invalid character '{bad}'"
        )));
    }
    Ok(target_id)
}

/// Poll intervals must be at least one second
pub fn validate_interval_secs(secs: u64, what: &str) -> ValidationResult<u64> {
    if secs == 0 {
        return Err(ValidationError::new(format!(
            "{what} must be greater than 0 seconds"
        )));
    }
    Ok(secs)
}

pub fn validate_positive(value: usize, what: &str) -> ValidationResult<usize> {
    if value == 0 {
        return Err(ValidationError::new(format!("{what} must be at least 1")));
    }
    Ok(value)
}

/// Parse `fqdn,network_range`; duplicates collapse and order follows first appearance
pub fn parse_kind_list(list: &str) -> ValidationResult<Vec<AssetKind>> {
    parse_list(list, "asset kind")
}

/// Parse `ctl,subfinder`; duplicates collapse and order follows first appearance
pub fn parse_tool_list(list: &str) -> ValidationResult<Vec<ToolId>> {
    parse_list(list, "tool")
}

fn parse_list<T: FromStr + PartialEq>(list: &str, what: &str) -> ValidationResult<Vec<T>> {
    let mut parsed = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let value = T::from_str(item)
            .map_err(|_| ValidationError::new(format!("unknown {what} '{item}'")))?;
        if !parsed.contains(&value) {
            parsed.push(value);
        }
    }
    if parsed.is_empty() {
        return Err(ValidationError::new(format!("no {what} given")));
    }
    Ok(parsed)
}
