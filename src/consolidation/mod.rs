//! Consolidation Engine
//!
//! Merges every tool's latest successful result for a target into one de-duplicated
//! snapshot with provenance, derived containment and relationships.

pub(crate) mod derive;
pub(crate) mod digest;
pub(crate) mod engine;
pub(crate) mod error;
pub(crate) mod merge;

pub mod api;

#[cfg(test)]
mod tests;
