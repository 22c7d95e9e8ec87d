//! Shared data model
//!
//! Types here are plain data: they serialise to the JSON written by the directory store and
//! printed by `--json` output, and carry no behaviour beyond simple accessors.

pub(crate) mod asset;
pub(crate) mod job;
pub(crate) mod record;
pub(crate) mod snapshot;
pub(crate) mod tool;

pub mod api;
