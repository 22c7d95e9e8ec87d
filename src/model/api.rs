//! Public API for the data model

pub use crate::model::asset::{
    Asset, AssetMetadata, AssetRef, AssetSource, AsnMetadata, CloudAssetMetadata, CloudProvider,
    DiscoveryEdge, FqdnMetadata, IpAddressMetadata, LiveWebServerMetadata, NetworkRangeMetadata,
    Relationship, RelationshipKind,
};
pub use crate::model::job::{JobStatus, JobStatusReport, ScanJob, ScanParams};
pub use crate::model::record::{RawFields, RawRecord};
pub use crate::model::snapshot::{
    AssetCounts, ConsolidatedSnapshot, SkippedRecords, SkippedSource, SnapshotSummary,
    SourceInput,
};
pub use crate::model::tool::{AssetKind, ToolId};
