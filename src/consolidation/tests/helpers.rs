//! Shared fixtures for consolidation tests

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::consolidation::api::Consolidator;
use crate::core::retry::RetryPolicy;
use crate::core::time::FixedTimeProvider;
use crate::model::api::{Asset, AssetKind, AssetSource, ConsolidatedSnapshot, ToolId};
use crate::notifications::api::{
    detached_bus, ConsolidationEventType, Event, EventFilter, EventReceiver,
};
use crate::store::api::{MemoryStore, SnapshotStore};

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: FixedTimeProvider,
    pub consolidator: Consolidator,
    pub events: EventReceiver,
}

pub async fn fixture() -> Fixture {
    let clock = FixedTimeProvider::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    let store = Arc::new(MemoryStore::with_time_provider(Arc::new(clock.clone())));
    let bus = detached_bus();
    let events = bus.lock().await.subscribe(
        "consolidation-test".to_string(),
        EventFilter::ConsolidationOnly,
        "test:consolidation".to_string(),
    );
    let consolidator = Consolidator::new(store.clone(), store.clone(), bus)
        .with_time_provider(Arc::new(clock.clone()))
        .with_retry(RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        });
    Fixture {
        store,
        clock,
        consolidator,
        events,
    }
}

pub async fn stored(store: &MemoryStore, target: &str) -> Arc<ConsolidatedSnapshot> {
    store.read_snapshot(target).await.unwrap().unwrap()
}

pub fn keys(assets: &[Asset]) -> Vec<&str> {
    assets.iter().map(|a| a.key.as_str()).collect()
}

pub fn find<'a>(snapshot: &'a ConsolidatedSnapshot, kind: AssetKind, key: &str) -> &'a Asset {
    snapshot
        .assets_of(kind)
        .iter()
        .find(|a| a.key == key)
        .unwrap_or_else(|| panic!("{kind} {key} missing"))
}

pub fn tools(asset: &Asset) -> Vec<ToolId> {
    asset
        .sources
        .iter()
        .filter_map(|source| match source {
            AssetSource::Tool(tool) => Some(*tool),
            AssetSource::DiscoveredUnder { .. } => None,
        })
        .collect()
}

pub fn event_types(events: &mut EventReceiver) -> Vec<ConsolidationEventType> {
    let mut types = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::Consolidation(event) = event {
            types.push(event.event_type);
        }
    }
    types
}
