//! Public API for the Consolidation Engine

pub use crate::consolidation::derive::{annotate_covering_ranges, relationships};
pub use crate::consolidation::digest::content_digest;
pub use crate::consolidation::engine::Consolidator;
pub use crate::consolidation::error::{ConsolidationError, ConsolidationResult};
pub use crate::consolidation::merge::{merge_metadata, AssetIndex};
