//! Consolidated snapshots and the summaries derived from them

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::asset::{Asset, AssetSource, Relationship};
use crate::model::tool::AssetKind;

/// What one source contributed to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInput {
    pub source: AssetSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Records the parser produced
    pub records: usize,
    /// Records that formed a valid identity
    pub accepted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source: AssetSource,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkippedRecords {
    /// Parsed records whose identity key could not be formed
    pub identity: usize,
    /// Lines or elements the parser could not read
    pub unparseable: usize,
}

impl SkippedRecords {
    pub fn total(&self) -> usize {
        self.identity + self.unparseable
    }
}

/// The full de-duplicated attack surface of one target
///
/// Asset lists are ordered by identity key. Snapshots are replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedSnapshot {
    pub schema_version: u32,
    pub target_id: String,
    pub consolidated_at: DateTime<Utc>,
    /// Kinds recomputed by the run that produced this snapshot
    pub kinds: Vec<AssetKind>,
    pub inputs: Vec<SourceInput>,
    pub skipped_sources: Vec<SkippedSource>,
    pub skipped_records: SkippedRecords,
    pub assets: BTreeMap<AssetKind, Vec<Asset>>,
    pub relationships: Vec<Relationship>,
    pub content_digest: String,
}

impl ConsolidatedSnapshot {
    pub fn assets_of(&self, kind: AssetKind) -> &[Asset] {
        self.assets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn counts(&self) -> AssetCounts {
        let mut counts = AssetCounts::default();
        for (kind, assets) in &self.assets {
            counts.set(*kind, assets.len());
        }
        counts
    }

    pub fn summary(&self, elapsed_ms: u64) -> SnapshotSummary {
        SnapshotSummary {
            target_id: self.target_id.clone(),
            consolidated_at: self.consolidated_at,
            elapsed_ms,
            counts: self.counts(),
            relationships: self.relationships.len(),
            skipped_sources: self.skipped_sources.clone(),
            skipped_records: self.skipped_records.total(),
            content_digest: self.content_digest.clone(),
        }
    }
}

/// Returned to whoever triggered a consolidation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub target_id: String,
    pub consolidated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub counts: AssetCounts,
    pub relationships: usize,
    pub skipped_sources: Vec<SkippedSource>,
    pub skipped_records: usize,
    pub content_digest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetCounts {
    pub asns: usize,
    pub network_ranges: usize,
    pub ip_addresses: usize,
    pub live_web_servers: usize,
    pub cloud_assets: usize,
    pub fqdns: usize,
}

impl AssetCounts {
    pub fn get(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Asn => self.asns,
            AssetKind::NetworkRange => self.network_ranges,
            AssetKind::IpAddress => self.ip_addresses,
            AssetKind::LiveWebServer => self.live_web_servers,
            AssetKind::CloudAsset => self.cloud_assets,
            AssetKind::Fqdn => self.fqdns,
        }
    }

    pub fn set(&mut self, kind: AssetKind, count: usize) {
        let slot = match kind {
            AssetKind::Asn => &mut self.asns,
            AssetKind::NetworkRange => &mut self.network_ranges,
            AssetKind::IpAddress => &mut self.ip_addresses,
            AssetKind::LiveWebServer => &mut self.live_web_servers,
            AssetKind::CloudAsset => &mut self.cloud_assets,
            AssetKind::Fqdn => &mut self.fqdns,
        };
        *slot = count;
    }

    pub fn total(&self) -> usize {
        AssetKind::all().iter().map(|kind| self.get(*kind)).sum()
    }
}
