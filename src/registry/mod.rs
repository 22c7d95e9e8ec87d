//! Source Registry
//!
//! Static knowledge about each discovery tool: which asset kinds it yields, how its raw
//! result is laid out, how often to poll its jobs and what to do once a job succeeds.

pub(crate) mod amass;
pub(crate) mod error;
pub(crate) mod parse;
pub(crate) mod tools;

pub mod api;
