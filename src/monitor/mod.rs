//! Scan Lifecycle Monitor
//!
//! Watches (target, tool) scan jobs until they reach a terminal state, publishing each
//! transition and handing successful jobs to a follow-up handler.

pub(crate) mod error;
pub(crate) mod follow_up;
pub(crate) mod manager;
pub(crate) mod state;

pub mod api;

#[cfg(test)]
mod tests;
