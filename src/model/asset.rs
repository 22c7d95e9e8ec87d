//! Canonical assets and their provenance

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::model::tool::{AssetKind, ToolId};

/// Where an asset contribution came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    Tool(ToolId),
    /// Carried in from another target's snapshot through a discovery edge
    DiscoveredUnder { target_id: String },
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Tool(tool) => write!(f, "{tool}"),
            AssetSource::DiscoveredUnder { target_id } => write!(f, "discovered_under:{target_id}"),
        }
    }
}

impl From<ToolId> for AssetSource {
    fn from(tool: ToolId) -> Self {
        AssetSource::Tool(tool)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
    Digitalocean,
    Cloudflare,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AsnMetadata {
    pub organization: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkRangeMetadata {
    pub asn: Option<u32>,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub prefix_len: u8,
    /// Number of addresses in the block, saturating for very large IPv6 blocks
    pub address_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpAddressMetadata {
    pub version: u8,
    pub hostnames: Vec<String>,
    pub organization: Option<String>,
    pub open_ports: Vec<u16>,
    /// Network ranges in the same snapshot that contain this address
    pub covering_ranges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiveWebServerMetadata {
    pub url: Option<String>,
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub status_code: Option<u16>,
    pub title: Option<String>,
    pub web_server: Option<String>,
    pub technologies: Vec<String>,
    pub content_length: Option<u64>,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloudAssetMetadata {
    pub provider: CloudProvider,
    pub service: Option<String>,
    /// Page that referenced the asset
    pub source_url: Option<String>,
    pub region: Option<String>,
    /// First path segment of a path-style URL on a shared storage endpoint
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FqdnMetadata {
    pub root_domain: String,
    pub resolved_ips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetMetadata {
    Asn(AsnMetadata),
    NetworkRange(NetworkRangeMetadata),
    IpAddress(IpAddressMetadata),
    LiveWebServer(LiveWebServerMetadata),
    CloudAsset(CloudAssetMetadata),
    Fqdn(FqdnMetadata),
}

impl AssetMetadata {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetMetadata::Asn(_) => AssetKind::Asn,
            AssetMetadata::NetworkRange(_) => AssetKind::NetworkRange,
            AssetMetadata::IpAddress(_) => AssetKind::IpAddress,
            AssetMetadata::LiveWebServer(_) => AssetKind::LiveWebServer,
            AssetMetadata::CloudAsset(_) => AssetKind::CloudAsset,
            AssetMetadata::Fqdn(_) => AssetKind::Fqdn,
        }
    }
}

/// One canonical attack-surface entity in a consolidated snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,
    pub key: String,
    pub sources: BTreeSet<AssetSource>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub metadata: AssetMetadata,
}

impl Asset {
    pub fn asset_ref(&self) -> AssetRef {
        AssetRef {
            kind: self.kind,
            key: self.key.clone(),
        }
    }

    pub fn has_tool(&self, tool: ToolId) -> bool {
        self.sources.contains(&AssetSource::Tool(tool))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub key: String,
}

impl AssetRef {
    pub fn new(kind: AssetKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationshipKind {
    /// parent: network range, child: IP address
    IpInRange,
    /// parent: ASN, child: network range
    RangeAnnouncedBy,
    /// parent: FQDN, child: IP address
    FqdnResolvesTo,
    /// parent: FQDN or IP address, child: live web server
    ServedFrom,
}

/// Derived association between two assets of one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub parent: AssetRef,
    pub child: AssetRef,
}

/// `child_target` was discovered under `parent_target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveryEdge {
    pub child_target: String,
    pub parent_target: String,
}
