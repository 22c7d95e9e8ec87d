//! Snapshot content digest
//!
//! Covers identity keys, provenance, metadata and relationships. Timestamps are left out so
//! two runs over unchanged inputs produce the same digest.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::api::{Asset, AssetKind, AssetMetadata, AssetSource, Relationship};

#[derive(Serialize)]
struct DigestAsset<'a> {
    kind: AssetKind,
    key: &'a str,
    sources: &'a BTreeSet<AssetSource>,
    metadata: &'a AssetMetadata,
}

#[derive(Serialize)]
struct DigestContent<'a> {
    assets: Vec<DigestAsset<'a>>,
    relationships: &'a [Relationship],
}

/// Hex SHA-256 over the timestamp-free content of a snapshot
pub fn content_digest(
    assets: &BTreeMap<AssetKind, Vec<Asset>>,
    relationships: &[Relationship],
) -> Result<String, serde_json::Error> {
    let content = DigestContent {
        assets: assets
            .values()
            .flatten()
            .map(|asset| DigestAsset {
                kind: asset.kind,
                key: &asset.key,
                sources: &asset.sources,
                metadata: &asset.metadata,
            })
            .collect(),
        relationships,
    };
    let bytes = serde_json::to_vec(&content)?;
    Ok(Sha256::digest(&bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
