//! Attack Surface Store
//!
//! Async traits for the external job, raw-result and snapshot collaborators, with an
//! in-memory implementation and a JSON-file implementation rooted at a directory.

pub(crate) mod directory;
pub(crate) mod error;
pub(crate) mod memory;
pub(crate) mod traits;

pub mod api;
