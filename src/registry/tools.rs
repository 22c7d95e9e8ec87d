//! The static tool table

use std::fmt;
use std::time::Duration;

use crate::model::api::{AssetKind, ToolId};
use crate::registry::error::{RegistryError, RegistryResult};

/// Line-oriented log dialects that need field extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDialect {
    /// `SRC (TYPE) --> relation --> DST (TYPE)` plus bare names
    AmassGraph,
}

/// How a tool's raw result is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// One item per line; a JSON array of strings is also accepted
    Lines(AssetKind),
    /// A JSON array of strings or objects; falls back to JSON lines
    JsonArray(AssetKind),
    /// One JSON value per line
    JsonLines(AssetKind),
    /// A JSON object whose named fields hold arrays
    JsonFields(&'static [(&'static str, AssetKind)]),
    StructuredLog(LogDialect),
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadShape::Lines(_) => write!(f, "lines"),
            PayloadShape::JsonArray(_) => write!(f, "json-array"),
            PayloadShape::JsonLines(_) => write!(f, "json-lines"),
            PayloadShape::JsonFields(fields) => {
                let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
                write!(f, "json-fields({})", names.join(","))
            }
            PayloadShape::StructuredLog(LogDialect::AmassGraph) => write!(f, "amass-graph"),
        }
    }
}

/// What happens after a job for the tool succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    None,
    Consolidate(&'static [AssetKind]),
}

impl fmt::Display for FollowUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowUp::None => write!(f, "-"),
            FollowUp::Consolidate(kinds) => {
                let names: Vec<&str> = kinds.iter().map(|k| k.as_ref()).collect();
                write!(f, "consolidate({})", names.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub tool: ToolId,
    pub kinds: &'static [AssetKind],
    pub shape: PayloadShape,
    pub poll_interval: Duration,
    pub follow_up: FollowUp,
}

impl ToolSpec {
    pub fn produces(&self, kind: AssetKind) -> bool {
        self.kinds.contains(&kind)
    }
}

const DEFAULT_POLL: Duration = Duration::from_secs(5);

const FQDN: &[AssetKind] = &[AssetKind::Fqdn];
const WEB: &[AssetKind] = &[AssetKind::LiveWebServer];
const CLOUD: &[AssetKind] = &[AssetKind::CloudAsset];
const RANGES: &[AssetKind] = &[AssetKind::NetworkRange];
const IPS: &[AssetKind] = &[AssetKind::IpAddress];
const GRAPH: &[AssetKind] = &[
    AssetKind::Asn,
    AssetKind::NetworkRange,
    AssetKind::IpAddress,
    AssetKind::CloudAsset,
    AssetKind::Fqdn,
];
const INTEL: &[AssetKind] = &[AssetKind::Asn, AssetKind::NetworkRange, AssetKind::Fqdn];
const TRAILS: &[AssetKind] = &[AssetKind::IpAddress, AssetKind::Fqdn];

const INTEL_FIELDS: &[(&str, AssetKind)] = &[
    ("asns", AssetKind::Asn),
    ("network_ranges", AssetKind::NetworkRange),
    ("domains", AssetKind::Fqdn),
];
const TRAILS_FIELDS: &[(&str, AssetKind)] =
    &[("domains", AssetKind::Fqdn), ("ips", AssetKind::IpAddress)];
const CLOUD_ENUM_FIELDS: &[(&str, AssetKind)] = &[
    ("aws", AssetKind::CloudAsset),
    ("gcp", AssetKind::CloudAsset),
    ("azure", AssetKind::CloudAsset),
];

const fn scraper(tool: ToolId, shape: PayloadShape) -> ToolSpec {
    ToolSpec {
        tool,
        kinds: FQDN,
        shape,
        poll_interval: DEFAULT_POLL,
        follow_up: FollowUp::None,
    }
}

const fn consolidating(tool: ToolId, kinds: &'static [AssetKind], shape: PayloadShape) -> ToolSpec {
    ToolSpec {
        tool,
        kinds,
        shape,
        poll_interval: DEFAULT_POLL,
        follow_up: FollowUp::Consolidate(kinds),
    }
}

/// Subdomain scrapers feed a list the operator consolidates by hand; infrastructure and
/// probing tools trigger consolidation of what they produce.
static TOOLS: [ToolSpec; 23] = [
    consolidating(ToolId::Amass, GRAPH, PayloadShape::StructuredLog(LogDialect::AmassGraph)),
    consolidating(ToolId::AmassIntel, INTEL, PayloadShape::JsonFields(INTEL_FIELDS)),
    consolidating(
        ToolId::AmassEnumCompany,
        GRAPH,
        PayloadShape::StructuredLog(LogDialect::AmassGraph),
    ),
    scraper(ToolId::Sublist3r, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Assetfinder, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Gau, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Ctl, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::CtlCompany, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Subfinder, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Shuffledns, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::ShufflednsCewl, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Gospider, PayloadShape::Lines(AssetKind::Fqdn)),
    scraper(ToolId::Subdomainizer, PayloadShape::Lines(AssetKind::Fqdn)),
    ToolSpec {
        poll_interval: Duration::from_secs(3),
        ..consolidating(ToolId::Httpx, WEB, PayloadShape::JsonLines(AssetKind::LiveWebServer))
    },
    consolidating(
        ToolId::IpPortScan,
        WEB,
        PayloadShape::JsonArray(AssetKind::LiveWebServer),
    ),
    consolidating(
        ToolId::MetabigorCompany,
        RANGES,
        PayloadShape::JsonArray(AssetKind::NetworkRange),
    ),
    consolidating(ToolId::ShodanCompany, IPS, PayloadShape::JsonArray(AssetKind::IpAddress)),
    consolidating(ToolId::CensysCompany, IPS, PayloadShape::JsonArray(AssetKind::IpAddress)),
    consolidating(
        ToolId::SecuritytrailsCompany,
        TRAILS,
        PayloadShape::JsonFields(TRAILS_FIELDS),
    ),
    consolidating(ToolId::GithubRecon, CLOUD, PayloadShape::Lines(AssetKind::CloudAsset)),
    consolidating(ToolId::CloudEnum, CLOUD, PayloadShape::JsonFields(CLOUD_ENUM_FIELDS)),
    consolidating(
        ToolId::KatanaCompany,
        WEB,
        PayloadShape::Lines(AssetKind::LiveWebServer),
    ),
    ToolSpec {
        poll_interval: Duration::from_secs(2),
        ..consolidating(ToolId::DnsxCompany, FQDN, PayloadShape::JsonLines(AssetKind::Fqdn))
    },
];

pub fn spec(tool: ToolId) -> RegistryResult<&'static ToolSpec> {
    TOOLS
        .iter()
        .find(|spec| spec.tool == tool)
        .ok_or(RegistryError::Unregistered { tool })
}

pub fn all() -> &'static [ToolSpec] {
    &TOOLS
}

/// Tools that produce at least one of `kinds`, in table order
pub fn tools_for_kinds(kinds: &[AssetKind]) -> Vec<&'static ToolSpec> {
    TOOLS
        .iter()
        .filter(|spec| kinds.iter().any(|kind| spec.produces(*kind)))
        .collect()
}
