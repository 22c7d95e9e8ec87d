//! Tool and asset-kind identifiers

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Every discovery tool whose output the registry knows how to read
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolId {
    Amass,
    AmassIntel,
    AmassEnumCompany,
    #[serde(rename = "sublist3r")]
    #[strum(serialize = "sublist3r")]
    Sublist3r,
    Assetfinder,
    Gau,
    Ctl,
    CtlCompany,
    Subfinder,
    Shuffledns,
    ShufflednsCewl,
    Gospider,
    Subdomainizer,
    Httpx,
    IpPortScan,
    MetabigorCompany,
    ShodanCompany,
    CensysCompany,
    SecuritytrailsCompany,
    GithubRecon,
    CloudEnum,
    KatanaCompany,
    DnsxCompany,
}

impl ToolId {
    pub fn all() -> impl Iterator<Item = ToolId> {
        ToolId::iter()
    }
}

/// The fixed set of attack-surface entity kinds
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    Asn,
    NetworkRange,
    IpAddress,
    LiveWebServer,
    CloudAsset,
    Fqdn,
}

impl AssetKind {
    pub fn all() -> Vec<AssetKind> {
        AssetKind::iter().collect()
    }

    /// Plural label used in tables and count output
    pub fn plural(&self) -> &'static str {
        match self {
            AssetKind::Asn => "asns",
            AssetKind::NetworkRange => "network_ranges",
            AssetKind::IpAddress => "ip_addresses",
            AssetKind::LiveWebServer => "live_web_servers",
            AssetKind::CloudAsset => "cloud_assets",
            AssetKind::Fqdn => "fqdns",
        }
    }
}
