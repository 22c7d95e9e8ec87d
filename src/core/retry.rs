//! Bounded retry for async operations
//!
//! Used for reading raw tool results during consolidation. The attempt count is always
//! finite: a persistently failing source is reported after the last attempt rather than
//! retried forever.

use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for async operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Execute an async operation, retrying failures up to `policy.max_attempts` times
///
/// A policy with `max_attempts == 0` still runs the operation once.
///
/// # Examples
/// ```rust
/// use surfacewatch::core::retry::{retry_async, RetryPolicy};
///
/// # async fn example() -> Result<String, String> {
/// let payload = retry_async("read raw result", RetryPolicy::default(), || async {
///     Ok::<String, String>("a.example.com".to_string())
/// })
/// .await?;
/// # Ok(payload)
/// # }
/// ```
pub async fn retry_async<F, T, E, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if attempt < attempts => {
                log::debug!(
                    "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                    operation_name,
                    attempt,
                    attempts,
                    policy.delay,
                    error
                );
                sleep(policy.delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
