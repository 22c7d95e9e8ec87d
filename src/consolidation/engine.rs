//! Consolidation Engine
//!
//! Builds one [`ConsolidatedSnapshot`] per target from the latest successful result of every
//! relevant tool, plus the snapshots of targets discovered under it. A tool whose payload
//! cannot be fetched or parsed is skipped and recorded; only a failed snapshot write fails
//! the run.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, info, warn};

use crate::consolidation::derive::{annotate_covering_ranges, relationships};
use crate::consolidation::digest::content_digest;
use crate::consolidation::error::{ConsolidationError, ConsolidationResult};
use crate::consolidation::merge::AssetIndex;
use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::core::validation::validate_target_id;
use crate::core::version::snapshot_schema_version;
use crate::model::api::{
    Asset, AssetCounts, AssetKind, AssetSource, ConsolidatedSnapshot, SkippedRecords,
    SkippedSource, SnapshotSummary, SourceInput, ToolId,
};
use crate::monitor::api::{FollowUpError, FollowUpHandler};
use crate::normalizer::api::normalize;
use crate::notifications::api::{
    publish_event, ConsolidationEvent, ConsolidationEventType, Event, NotificationBus,
};
use crate::registry::api::{parse_payload, tools_for_kinds};
use crate::store::api::{RawResult, RawResultSource, SnapshotStore, StoreError, StoreResult};

/// Kinds a discovered-under target contributes to its parent
const DISCOVERED_KINDS: [AssetKind; 2] = [AssetKind::Fqdn, AssetKind::LiveWebServer];

/// Bookkeeping for one run besides the assets themselves
struct RunLedger {
    kinds: Vec<AssetKind>,
    index: AssetIndex,
    inputs: Vec<SourceInput>,
    skipped_sources: Vec<SkippedSource>,
    skipped_records: SkippedRecords,
    consulted: BTreeSet<AssetSource>,
}

impl RunLedger {
    fn wants(&self, kind: AssetKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn skip(&mut self, source: AssetSource, reason: String) {
        warn!("Skipping {source}: {reason}");
        self.skipped_sources.push(SkippedSource { source, reason });
    }

    /// Parse and normalize one tool's payload into the index
    fn ingest(&mut self, tool: ToolId, raw: RawResult) {
        let source = AssetSource::Tool(tool);
        let parsed = match parse_payload(tool, &raw.payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.skip(source, e.to_string());
                return;
            }
        };
        self.skipped_records.unparseable += parsed.unparseable;

        let mut records = 0;
        let mut accepted = 0;
        for record in parsed.records {
            if !self.wants(record.kind) {
                continue;
            }
            records += 1;
            match normalize(&record) {
                Ok(asset) => {
                    accepted += 1;
                    self.index.add(asset.key, asset.metadata, source.clone());
                }
                Err(e) => {
                    debug!("{tool}: dropped record: {e}");
                    self.skipped_records.identity += 1;
                }
            }
        }
        debug!("{tool}: {accepted}/{records} records accepted from job {}", raw.job_id);
        self.inputs.push(SourceInput {
            source,
            job_id: Some(raw.job_id),
            records,
            accepted,
        });
    }

    /// Take FQDNs and web servers of a target discovered under this one
    fn ingest_discovered(&mut self, child: &ConsolidatedSnapshot) {
        let source = AssetSource::DiscoveredUnder {
            target_id: child.target_id.clone(),
        };
        let wanted: Vec<AssetKind> = DISCOVERED_KINDS
            .into_iter()
            .filter(|kind| self.wants(*kind))
            .collect();
        let mut records = 0;
        for kind in wanted {
            for asset in child.assets_of(kind) {
                records += 1;
                self.index
                    .add(asset.key.clone(), asset.metadata.clone(), source.clone());
            }
        }
        self.inputs.push(SourceInput {
            source,
            job_id: None,
            records,
            accepted: records,
        });
    }

    /// Keep everything the prior snapshot knew about kinds and sources this run left alone
    fn carry_over(&mut self, prior: &ConsolidatedSnapshot) {
        for kind in AssetKind::all() {
            if !self.wants(kind) {
                for asset in prior.assets_of(kind) {
                    self.index.carry_over(asset.clone());
                }
            }
        }
        self.inputs.extend(
            prior
                .inputs
                .iter()
                .filter(|input| !self.consulted.contains(&input.source))
                .cloned(),
        );
        self.skipped_sources.extend(
            prior
                .skipped_sources
                .iter()
                .filter(|skipped| !self.consulted.contains(&skipped.source))
                .cloned(),
        );
    }
}

/// Consolidation Engine over the raw-result and snapshot collaborators
pub struct Consolidator {
    raw: Arc<dyn RawResultSource>,
    snapshots: Arc<dyn SnapshotStore>,
    bus: NotificationBus,
    time: Arc<dyn TimeProvider>,
    retry: RetryPolicy,
}

impl Consolidator {
    pub fn new(
        raw: Arc<dyn RawResultSource>,
        snapshots: Arc<dyn SnapshotStore>,
        bus: NotificationBus,
    ) -> Self {
        Self {
            raw,
            snapshots,
            bus,
            time: Arc::new(SystemTimeProvider),
            retry: RetryPolicy::default(),
        }
    }

    /// Retry policy for each raw-result read
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = time;
        self
    }

    async fn publish(&self, event_type: ConsolidationEventType, target_id: &str, message: String) {
        let event = ConsolidationEvent::with_message(event_type, target_id.to_string(), message);
        publish_event(&self.bus, Event::Consolidation(event)).await;
    }

    async fn fetch(&self, target_id: &str, tool: ToolId) -> StoreResult<Option<RawResult>> {
        let raw = &self.raw;
        let name = format!("read raw result {target_id}/{tool}");
        retry_async(&name, self.retry.clone(), move || {
            raw.read_raw_result(target_id, tool)
        })
        .await
    }

    /// Rebuild and store the target's snapshot
    ///
    /// `kinds` limits the run to some asset kinds; all others are carried over from the
    /// previous snapshot. `None` or an empty filter consolidates every kind.
    pub async fn consolidate(
        &self,
        target_id: &str,
        kinds: Option<&[AssetKind]>,
    ) -> ConsolidationResult<SnapshotSummary> {
        let started = self.time.now();
        validate_target_id(target_id)?;

        let mut requested: Vec<AssetKind> = match kinds {
            Some(kinds) if !kinds.is_empty() => kinds.to_vec(),
            _ => AssetKind::all(),
        };
        requested.sort();
        requested.dedup();
        let filtered = requested.len() < AssetKind::all().len();
        let kind_list = requested
            .iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(",");
        info!("Consolidating {target_id} [{kind_list}]");
        self.publish(ConsolidationEventType::Started, target_id, kind_list)
            .await;

        let prior = match self.snapshots.read_snapshot(target_id).await {
            Ok(prior) => prior,
            Err(source) if filtered => {
                error!("Cannot read the snapshot of {target_id} to carry over: {source}");
                self.publish(ConsolidationEventType::Failed, target_id, source.to_string())
                    .await;
                return Err(ConsolidationError::SnapshotRead {
                    target_id: target_id.to_string(),
                    source,
                });
            }
            Err(e) => {
                warn!("Previous snapshot of {target_id} unreadable, rebuilding: {e}");
                None
            }
        };

        let now = self.time.utc_now();
        let specs = tools_for_kinds(&requested);
        let mut ledger = RunLedger {
            kinds: requested.clone(),
            index: AssetIndex::new(now),
            inputs: Vec::new(),
            skipped_sources: Vec::new(),
            skipped_records: SkippedRecords::default(),
            consulted: specs.iter().map(|spec| spec.tool.into()).collect(),
        };

        let fetched = join_all(specs.iter().map(|spec| self.fetch(target_id, spec.tool))).await;
        for (spec, result) in specs.iter().zip(fetched) {
            match result {
                Ok(Some(raw)) => ledger.ingest(spec.tool, raw),
                Ok(None) => debug!("{}: no successful job for {target_id}", spec.tool),
                Err(e) => ledger.skip(spec.tool.into(), e.to_string()),
            }
        }

        if DISCOVERED_KINDS.iter().any(|kind| ledger.wants(*kind)) {
            self.ingest_edges(target_id, &mut ledger).await;
        }

        if let Some(prior) = &prior {
            if filtered {
                ledger.carry_over(prior);
            }
            for kind in AssetKind::all() {
                ledger.index.restore_first_seen(prior.assets_of(kind));
            }
        }

        for skipped in &ledger.skipped_sources {
            if ledger.consulted.contains(&skipped.source) {
                let message = format!("{}: {}", skipped.source, skipped.reason);
                self.publish(ConsolidationEventType::SourceSkipped, target_id, message)
                    .await;
            }
        }

        let snapshot = match self.build(target_id, now, ledger) {
            Ok(snapshot) => snapshot,
            Err(source) => return Err(self.fail(target_id, source).await),
        };
        let elapsed_ms = self.time.now().duration_since(started).as_millis() as u64;
        let summary = snapshot.summary(elapsed_ms);

        if let Err(source) = self.snapshots.write_snapshot(snapshot).await {
            return Err(self.fail(target_id, source).await);
        }

        info!(
            "Consolidated {target_id}: {} assets, {} relationships, {} skipped sources",
            summary.counts.total(),
            summary.relationships,
            summary.skipped_sources.len()
        );
        self.publish(
            ConsolidationEventType::Completed,
            target_id,
            format!("{} assets", summary.counts.total()),
        )
        .await;
        Ok(summary)
    }

    async fn ingest_edges(&self, target_id: &str, ledger: &mut RunLedger) {
        let edges = match self.snapshots.discovery_edges(target_id).await {
            Ok(edges) => edges,
            Err(e) => {
                warn!("Discovery edges of {target_id} unavailable: {e}");
                return;
            }
        };
        for edge in edges {
            if edge.child_target == target_id {
                continue;
            }
            let source = AssetSource::DiscoveredUnder {
                target_id: edge.child_target.clone(),
            };
            ledger.consulted.insert(source.clone());
            match self.snapshots.read_snapshot(&edge.child_target).await {
                Ok(Some(child)) => ledger.ingest_discovered(&child),
                Ok(None) => debug!("{} has no snapshot yet", edge.child_target),
                Err(e) => ledger.skip(source, e.to_string()),
            }
        }
    }

    fn build(
        &self,
        target_id: &str,
        now: chrono::DateTime<chrono::Utc>,
        mut ledger: RunLedger,
    ) -> StoreResult<ConsolidatedSnapshot> {
        let mut assets = ledger.index.into_assets();
        annotate_covering_ranges(&mut assets);
        let relationships = relationships(&assets);
        let content_digest =
            content_digest(&assets, &relationships).map_err(|source| StoreError::Encode {
                what: format!("content digest of {target_id}"),
                source,
            })?;

        ledger.inputs.sort_by(|a, b| a.source.cmp(&b.source));
        ledger.skipped_sources.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(ConsolidatedSnapshot {
            schema_version: snapshot_schema_version(),
            target_id: target_id.to_string(),
            consolidated_at: now,
            kinds: ledger.kinds,
            inputs: ledger.inputs,
            skipped_sources: ledger.skipped_sources,
            skipped_records: ledger.skipped_records,
            assets,
            relationships,
            content_digest,
        })
    }

    async fn fail(&self, target_id: &str, source: StoreError) -> ConsolidationError {
        error!("Snapshot of {target_id} not stored: {source}");
        self.publish(ConsolidationEventType::Failed, target_id, source.to_string())
            .await;
        ConsolidationError::StoreWrite {
            target_id: target_id.to_string(),
            source,
        }
    }

    /// The stored snapshot, or `None` if the target was never consolidated
    pub async fn snapshot(
        &self,
        target_id: &str,
    ) -> ConsolidationResult<Option<Arc<ConsolidatedSnapshot>>> {
        validate_target_id(target_id)?;
        self.snapshots
            .read_snapshot(target_id)
            .await
            .map_err(|source| ConsolidationError::SnapshotRead {
                target_id: target_id.to_string(),
                source,
            })
    }

    /// Assets of one kind in identity-key order
    pub async fn consolidated_assets(
        &self,
        target_id: &str,
        kind: AssetKind,
    ) -> ConsolidationResult<Vec<Asset>> {
        Ok(self
            .snapshot(target_id)
            .await?
            .map(|snapshot| snapshot.assets_of(kind).to_vec())
            .unwrap_or_default())
    }

    pub async fn asset_counts(&self, target_id: &str) -> ConsolidationResult<AssetCounts> {
        Ok(self
            .snapshot(target_id)
            .await?
            .map(|snapshot| snapshot.counts())
            .unwrap_or_default())
    }
}

#[async_trait]
impl FollowUpHandler for Consolidator {
    async fn on_success(
        &self,
        target_id: &str,
        tool: ToolId,
        kinds: &[AssetKind],
    ) -> Result<(), FollowUpError> {
        debug!("{tool} succeeded for {target_id}, consolidating");
        self.consolidate(target_id, Some(kinds)).await?;
        Ok(())
    }
}
