//! Record dispatch and identity-key ordering

use std::cmp::Ordering;
use std::net::IpAddr;

use crate::model::api::{AssetKind, AssetMetadata, RawRecord};
use crate::normalizer::error::NormalizeResult;
use crate::normalizer::network::parse_cidr;
use crate::normalizer::{asn, cloud, fqdn, network, web};

/// A record that formed a valid identity
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAsset {
    pub kind: AssetKind,
    pub key: String,
    pub metadata: AssetMetadata,
}

/// Turn one parsed record into its identity key and metadata
///
/// Fails only when the identity key cannot be formed; unusable metadata fields are left
/// empty instead.
pub fn normalize(record: &RawRecord) -> NormalizeResult<NormalizedAsset> {
    let fields = &record.fields;
    let (key, metadata) = match record.kind {
        AssetKind::Asn => asn::normalize_record(fields)?,
        AssetKind::NetworkRange => network::normalize_range_record(fields)?,
        AssetKind::IpAddress => network::normalize_ip_record(fields)?,
        AssetKind::LiveWebServer => web::normalize_record(fields)?,
        AssetKind::CloudAsset => cloud::normalize_record(fields)?,
        AssetKind::Fqdn => fqdn::normalize_record(fields)?,
    };
    Ok(NormalizedAsset {
        kind: record.kind,
        key,
        metadata,
    })
}

/// Ordering of identity keys within one kind
///
/// Ranges, addresses and AS numbers compare numerically; everything else lexically. Keys
/// that fail to parse sort after the ones that do.
pub fn compare_keys(kind: AssetKind, a: &str, b: &str) -> Ordering {
    fn numeric<T: Ord>(a: Option<T>, b: Option<T>) -> Option<Ordering> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (Some(_), None) => Some(Ordering::Less),
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => None,
        }
    }

    let ordering = match kind {
        AssetKind::NetworkRange => numeric(parse_cidr(a), parse_cidr(b)),
        AssetKind::IpAddress => numeric(a.parse::<IpAddr>().ok(), b.parse::<IpAddr>().ok()),
        AssetKind::Asn => numeric(a.parse::<u32>().ok(), b.parse::<u32>().ok()),
        _ => None,
    };
    ordering.unwrap_or_else(|| a.cmp(b)).then_with(|| a.cmp(b))
}
