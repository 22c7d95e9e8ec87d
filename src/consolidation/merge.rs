//! Identity-keyed asset merging
//!
//! The first record for an identity key creates the asset. Later records only add their
//! source and fill metadata fields that are still empty; a populated field is never
//! overwritten.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::model::api::{Asset, AssetKind, AssetMetadata, AssetSource, CloudProvider};
use crate::normalizer::api::compare_keys;

fn fill<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if slot.is_none() {
        *slot = incoming;
    }
}

fn fill_vec<T>(slot: &mut Vec<T>, incoming: Vec<T>) {
    if slot.is_empty() {
        *slot = incoming;
    }
}

/// Fill empty fields of `existing` from `incoming`; mismatched kinds are ignored
pub fn merge_metadata(existing: &mut AssetMetadata, incoming: AssetMetadata) {
    match (existing, incoming) {
        (AssetMetadata::Asn(a), AssetMetadata::Asn(b)) => {
            fill(&mut a.organization, b.organization);
            fill(&mut a.description, b.description);
            fill(&mut a.country, b.country);
        }
        (AssetMetadata::NetworkRange(a), AssetMetadata::NetworkRange(b)) => {
            fill(&mut a.asn, b.asn);
            fill(&mut a.organization, b.organization);
            fill(&mut a.country, b.country);
        }
        (AssetMetadata::IpAddress(a), AssetMetadata::IpAddress(b)) => {
            fill_vec(&mut a.hostnames, b.hostnames);
            fill(&mut a.organization, b.organization);
            fill_vec(&mut a.open_ports, b.open_ports);
        }
        (AssetMetadata::LiveWebServer(a), AssetMetadata::LiveWebServer(b)) => {
            fill(&mut a.url, b.url);
            fill(&mut a.status_code, b.status_code);
            fill(&mut a.title, b.title);
            fill(&mut a.web_server, b.web_server);
            fill_vec(&mut a.technologies, b.technologies);
            fill(&mut a.content_length, b.content_length);
            fill(&mut a.ip, b.ip);
        }
        (AssetMetadata::CloudAsset(a), AssetMetadata::CloudAsset(b)) => {
            if a.provider == CloudProvider::Unknown {
                a.provider = b.provider;
            }
            fill(&mut a.service, b.service);
            fill(&mut a.source_url, b.source_url);
            fill(&mut a.region, b.region);
            fill(&mut a.bucket, b.bucket);
        }
        (AssetMetadata::Fqdn(a), AssetMetadata::Fqdn(b)) => {
            fill_vec(&mut a.resolved_ips, b.resolved_ips);
        }
        _ => {}
    }
}

/// Assets of one consolidation run, keyed by kind and identity
pub struct AssetIndex {
    now: DateTime<Utc>,
    by_kind: BTreeMap<AssetKind, BTreeMap<String, Asset>>,
}

impl AssetIndex {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            by_kind: BTreeMap::new(),
        }
    }

    /// Add one sighting; returns true when it created a new asset
    pub fn add(&mut self, key: String, metadata: AssetMetadata, source: AssetSource) -> bool {
        let kind = metadata.kind();
        let assets = self.by_kind.entry(kind).or_default();
        match assets.get_mut(&key) {
            Some(asset) => {
                asset.sources.insert(source);
                asset.last_seen = self.now;
                merge_metadata(&mut asset.metadata, metadata);
                false
            }
            None => {
                let asset = Asset {
                    kind,
                    key: key.clone(),
                    sources: BTreeSet::from([source]),
                    first_seen: self.now,
                    last_seen: self.now,
                    metadata,
                };
                assets.insert(key, asset);
                true
            }
        }
    }

    /// Insert an asset from an earlier snapshot as-is
    pub fn carry_over(&mut self, asset: Asset) {
        self.by_kind
            .entry(asset.kind)
            .or_default()
            .insert(asset.key.clone(), asset);
    }

    /// Keep first-seen times from an earlier snapshot for assets seen again
    pub fn restore_first_seen(&mut self, prior: &[Asset]) {
        for old in prior {
            if let Some(asset) = self
                .by_kind
                .get_mut(&old.kind)
                .and_then(|assets| assets.get_mut(&old.key))
            {
                asset.first_seen = asset.first_seen.min(old.first_seen);
            }
        }
    }

    /// Assets per kind in identity-key order; every kind is present
    pub fn into_assets(self) -> BTreeMap<AssetKind, Vec<Asset>> {
        let mut by_kind = self.by_kind;
        AssetKind::all()
            .into_iter()
            .map(|kind| {
                let mut assets: Vec<Asset> = by_kind
                    .remove(&kind)
                    .map(|assets| assets.into_values().collect())
                    .unwrap_or_default();
                assets.sort_by(|a, b| compare_keys(kind, &a.key, &b.key));
                (kind, assets)
            })
            .collect()
    }
}
