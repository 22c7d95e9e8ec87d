//! Amass graph log extraction
//!
//! Amass prints discovered relations as `SRC (TYPE) --> relation --> DST (TYPE)`, with
//! bare names for nodes that have no relation yet.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::model::api::{AssetKind, RawRecord};
use crate::normalizer::api::{is_cloud_host, parse_cidr};
use crate::registry::parse::ParsedPayload;

static RELATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<src>.+?) \((?P<src_type>\w+)\) --> (?P<rel>\w+) --> (?P<dst>.+?) \((?P<dst_type>\w+)\)$",
    )
    .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeType {
    Fqdn,
    IpAddress,
    Netblock,
    Asn,
    Organization,
}

impl NodeType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "FQDN" => Some(NodeType::Fqdn),
            "IPAddress" => Some(NodeType::IpAddress),
            "Netblock" => Some(NodeType::Netblock),
            "ASN" => Some(NodeType::Asn),
            "RIROrganization" => Some(NodeType::Organization),
            _ => None,
        }
    }

    fn asset_kind(self) -> Option<AssetKind> {
        match self {
            NodeType::Fqdn => Some(AssetKind::Fqdn),
            NodeType::IpAddress => Some(AssetKind::IpAddress),
            NodeType::Netblock => Some(AssetKind::NetworkRange),
            NodeType::Asn => Some(AssetKind::Asn),
            NodeType::Organization => None,
        }
    }
}

struct Edge<'a> {
    src: &'a str,
    src_type: NodeType,
    relation: &'a str,
    dst: &'a str,
    dst_type: NodeType,
}

fn parse_edge(line: &str) -> Option<Edge<'_>> {
    let caps = RELATION.as_ref()?.captures(line)?;
    Some(Edge {
        src: caps.name("src")?.as_str().trim(),
        src_type: NodeType::parse(caps.name("src_type")?.as_str())?,
        relation: caps.name("rel")?.as_str(),
        dst: caps.name("dst")?.as_str().trim(),
        dst_type: NodeType::parse(caps.name("dst_type")?.as_str())?,
    })
}

fn node(kind: AssetKind, name: &str) -> RawRecord {
    RawRecord::from_text(kind, name)
}

/// Records for one relation line; relation-specific fields ride on the records they describe
fn edge_records(edge: &Edge<'_>) -> Vec<RawRecord> {
    let mut src = edge.src_type.asset_kind().map(|kind| node(kind, edge.src));
    let mut dst = edge.dst_type.asset_kind().map(|kind| node(kind, edge.dst));
    let mut extra = Vec::new();

    match (edge.src_type, edge.relation, edge.dst_type) {
        (NodeType::Fqdn, "a_record" | "aaaa_record", NodeType::IpAddress) => {
            src = src.map(|r| r.with_field("resolved_ips", vec![Value::from(edge.dst)]));
        }
        (NodeType::Asn, "announces", NodeType::Netblock) => {
            dst = dst.map(|r| r.with_field("asn", edge.src));
        }
        (NodeType::Asn, "managed_by", NodeType::Organization) => {
            src = src.map(|r| r.with_field("organization", edge.dst));
        }
        (NodeType::Fqdn, "cname_record", NodeType::Fqdn) if is_cloud_host(edge.dst) => {
            extra.push(
                node(AssetKind::CloudAsset, edge.dst).with_field("source_url", edge.src),
            );
        }
        _ => {}
    }

    src.into_iter().chain(dst).chain(extra).collect()
}

fn bare_record(token: &str) -> RawRecord {
    if token.parse::<IpAddr>().is_ok() {
        node(AssetKind::IpAddress, token)
    } else if token.contains('/') && parse_cidr(token).is_some() {
        node(AssetKind::NetworkRange, token)
    } else {
        node(AssetKind::Fqdn, token)
    }
}

pub(crate) fn parse_graph(raw: &str) -> ParsedPayload {
    let mut parsed = ParsedPayload::default();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.contains(" --> ") {
            match parse_edge(line) {
                Some(edge) => parsed.records.extend(edge_records(&edge)),
                None => parsed.unparseable += 1,
            }
        } else if !line.contains(char::is_whitespace) {
            parsed.records.push(bare_record(line));
        } else {
            parsed.unparseable += 1;
        }
    }
    parsed
}
