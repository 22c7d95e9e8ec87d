//! Shared error reporting
//!
//! Every component error type implements [`ContextualError`] so the binary can decide
//! whether to show the operator the error's own message or a generic description of the
//! operation that failed.

/// Errors that know whether their message is meaningful to an operator
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`. When it returns `false`, `user_message()` returns `None` and the
/// caller falls back to describing the failed operation.
pub trait ContextualError: std::error::Error {
    /// True when the operator can act on the message directly
    /// (bad target id, unknown tool name, invalid configuration value).
    ///
    /// Store outages, transport failures and malformed tool output are not
    /// user-actionable.
    fn is_user_actionable(&self) -> bool;

    /// The operator-facing message for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error at the right level of detail
///
/// User-actionable errors print their own message; everything else prints
/// `operation_context` and leaves the details to debug level.
///
/// # Examples
/// ```rust,no_run
/// # use surfacewatch::core::error_handling::log_error_with_context;
/// # use surfacewatch::core::validation::ValidationError;
/// let err = ValidationError::new("target id must not be empty");
/// log_error_with_context(&err, "Reading command line");
/// // Logs: "FATAL: target id must not be empty"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
