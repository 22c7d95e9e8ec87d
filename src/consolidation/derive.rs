//! Derived associations
//!
//! Covering ranges and relationships are recomputed from the final asset set on every run.
//! They never change identity keys or merge assets.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::net::IpAddr;

use ipnet::IpNet;

use crate::model::api::{Asset, AssetKind, AssetMetadata, AssetRef, Relationship, RelationshipKind};
use crate::normalizer::api::{compare_keys, parse_cidr};

fn keys_of(assets: &BTreeMap<AssetKind, Vec<Asset>>, kind: AssetKind) -> HashSet<String> {
    assets
        .get(&kind)
        .map(|list| list.iter().map(|a| a.key.clone()).collect())
        .unwrap_or_default()
}

fn canonical_ip(raw: &str) -> Option<String> {
    raw.trim_matches(|c| c == '[' || c == ']')
        .parse::<IpAddr>()
        .ok()
        .map(|ip| ip.to_string())
}

/// Set every IP address's `covering_ranges` to the discovered ranges containing it
pub fn annotate_covering_ranges(assets: &mut BTreeMap<AssetKind, Vec<Asset>>) {
    let ranges: Vec<(String, IpNet)> = assets
        .get(&AssetKind::NetworkRange)
        .map(|list| {
            list.iter()
                .filter_map(|a| parse_cidr(&a.key).map(|cidr| (a.key.clone(), cidr)))
                .collect()
        })
        .unwrap_or_default();

    let Some(ips) = assets.get_mut(&AssetKind::IpAddress) else {
        return;
    };
    for asset in ips.iter_mut() {
        let AssetMetadata::IpAddress(meta) = &mut asset.metadata else {
            continue;
        };
        meta.covering_ranges = match asset.key.parse::<IpAddr>() {
            Ok(ip) => ranges
                .iter()
                .filter(|(_, cidr)| cidr.contains(&ip))
                .map(|(key, _)| key.clone())
                .collect(),
            Err(_) => Vec::new(),
        };
        meta.covering_ranges
            .sort_by(|a, b| compare_keys(AssetKind::NetworkRange, a, b));
    }
}

/// All relationships between assets of the snapshot, sorted and deduplicated
pub fn relationships(assets: &BTreeMap<AssetKind, Vec<Asset>>) -> Vec<Relationship> {
    let ip_keys = keys_of(assets, AssetKind::IpAddress);
    let asn_keys = keys_of(assets, AssetKind::Asn);
    let fqdn_keys = keys_of(assets, AssetKind::Fqdn);
    let mut found = BTreeSet::new();

    let mut link = |kind, parent: AssetRef, child: AssetRef| {
        found.insert(Relationship {
            kind,
            parent,
            child,
        });
    };

    for asset in assets.values().flatten() {
        match &asset.metadata {
            AssetMetadata::IpAddress(meta) => {
                for range in &meta.covering_ranges {
                    link(
                        RelationshipKind::IpInRange,
                        AssetRef::new(AssetKind::NetworkRange, range.clone()),
                        asset.asset_ref(),
                    );
                }
            }
            AssetMetadata::NetworkRange(meta) => {
                if let Some(asn) = meta.asn.map(|n| n.to_string()) {
                    if asn_keys.contains(&asn) {
                        link(
                            RelationshipKind::RangeAnnouncedBy,
                            AssetRef::new(AssetKind::Asn, asn),
                            asset.asset_ref(),
                        );
                    }
                }
            }
            AssetMetadata::Fqdn(meta) => {
                for ip in meta.resolved_ips.iter().filter_map(|ip| canonical_ip(ip)) {
                    if ip_keys.contains(&ip) {
                        link(
                            RelationshipKind::FqdnResolvesTo,
                            asset.asset_ref(),
                            AssetRef::new(AssetKind::IpAddress, ip),
                        );
                    }
                }
            }
            AssetMetadata::LiveWebServer(meta) => {
                let parent = match canonical_ip(&meta.host) {
                    Some(ip) if ip_keys.contains(&ip) => {
                        Some(AssetRef::new(AssetKind::IpAddress, ip))
                    }
                    Some(_) => None,
                    None if fqdn_keys.contains(&meta.host) => {
                        Some(AssetRef::new(AssetKind::Fqdn, meta.host.clone()))
                    }
                    None => None,
                };
                if let Some(parent) = parent {
                    link(RelationshipKind::ServedFrom, parent, asset.asset_ref());
                }
            }
            AssetMetadata::Asn(_) | AssetMetadata::CloudAsset(_) => {}
        }
    }

    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::api::{
        AssetSource, FqdnMetadata, IpAddressMetadata, LiveWebServerMetadata,
        NetworkRangeMetadata, ToolId, AsnMetadata,
    };
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn asset(key: &str, metadata: AssetMetadata) -> Asset {
        let now = Utc::now();
        Asset {
            kind: metadata.kind(),
            key: key.to_string(),
            sources: BTreeSet::from([AssetSource::Tool(ToolId::Amass)]),
            first_seen: now,
            last_seen: now,
            metadata,
        }
    }

    fn surface() -> BTreeMap<AssetKind, Vec<Asset>> {
        let mut assets = BTreeMap::new();
        assets.insert(
            AssetKind::Asn,
            vec![asset("64500", AssetMetadata::Asn(AsnMetadata::default()))],
        );
        assets.insert(
            AssetKind::NetworkRange,
            vec![
                asset(
                    "10.0.0.0/24",
                    AssetMetadata::NetworkRange(NetworkRangeMetadata {
                        asn: Some(64500),
                        ..Default::default()
                    }),
                ),
                asset(
                    "10.0.0.0/25",
                    AssetMetadata::NetworkRange(NetworkRangeMetadata {
                        asn: Some(64999),
                        ..Default::default()
                    }),
                ),
            ],
        );
        assets.insert(
            AssetKind::IpAddress,
            vec![
                asset("10.0.0.7", AssetMetadata::IpAddress(IpAddressMetadata::default())),
                asset("10.0.0.200", AssetMetadata::IpAddress(IpAddressMetadata::default())),
                asset("192.0.2.1", AssetMetadata::IpAddress(IpAddressMetadata::default())),
            ],
        );
        assets.insert(
            AssetKind::Fqdn,
            vec![asset(
                "www.example.com",
                AssetMetadata::Fqdn(FqdnMetadata {
                    root_domain: "example.com".to_string(),
                    resolved_ips: vec!["10.0.0.7".to_string(), "203.0.113.9".to_string()],
                }),
            )],
        );
        assets.insert(
            AssetKind::LiveWebServer,
            vec![
                asset(
                    "https://www.example.com:443",
                    AssetMetadata::LiveWebServer(LiveWebServerMetadata {
                        scheme: "https".to_string(),
                        host: "www.example.com".to_string(),
                        port: 443,
                        ..Default::default()
                    }),
                ),
                asset(
                    "http://192.0.2.1:8080",
                    AssetMetadata::LiveWebServer(LiveWebServerMetadata {
                        scheme: "http".to_string(),
                        host: "192.0.2.1".to_string(),
                        port: 8080,
                        ..Default::default()
                    }),
                ),
            ],
        );
        assets
    }

    fn covering(assets: &BTreeMap<AssetKind, Vec<Asset>>, key: &str) -> Vec<String> {
        assets[&AssetKind::IpAddress]
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| match &a.metadata {
                AssetMetadata::IpAddress(meta) => Some(meta.covering_ranges.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_covering_ranges() {
        let mut assets = surface();
        annotate_covering_ranges(&mut assets);
        assert_eq!(covering(&assets, "10.0.0.7"), vec!["10.0.0.0/24", "10.0.0.0/25"]);
        assert_eq!(covering(&assets, "10.0.0.200"), vec!["10.0.0.0/24"]);
        assert!(covering(&assets, "192.0.2.1").is_empty());
        // Containment never merges ranges
        assert_eq!(assets[&AssetKind::NetworkRange].len(), 2);
    }

    #[test]
    fn test_relationships() {
        let mut assets = surface();
        annotate_covering_ranges(&mut assets);
        let found = relationships(&assets);

        let count = |kind| found.iter().filter(|r| r.kind == kind).count();
        assert_eq!(count(RelationshipKind::IpInRange), 3);
        assert_eq!(count(RelationshipKind::RangeAnnouncedBy), 1);
        assert_eq!(count(RelationshipKind::FqdnResolvesTo), 1);
        assert_eq!(count(RelationshipKind::ServedFrom), 2);

        assert!(found.contains(&Relationship {
            kind: RelationshipKind::RangeAnnouncedBy,
            parent: AssetRef::new(AssetKind::Asn, "64500"),
            child: AssetRef::new(AssetKind::NetworkRange, "10.0.0.0/24"),
        }));
        assert!(found.contains(&Relationship {
            kind: RelationshipKind::ServedFrom,
            parent: AssetRef::new(AssetKind::IpAddress, "192.0.2.1"),
            child: AssetRef::new(AssetKind::LiveWebServer, "http://192.0.2.1:8080"),
        }));

        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted);
    }
}
