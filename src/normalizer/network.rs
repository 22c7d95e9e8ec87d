//! CIDR blocks and IP addresses

use std::net::{IpAddr, SocketAddr};

use ipnet::IpNet;

use crate::model::api::{
    AssetKind, AssetMetadata, IpAddressMetadata, NetworkRangeMetadata, RawFields,
};
use crate::normalizer::asn::parse_asn_str;
use crate::normalizer::coerce;
use crate::normalizer::error::{NormalizeError, NormalizeResult};

/// `10.0.0.5/24` parses to `10.0.0.0/24`; a bare address is a host block
pub fn parse_cidr(raw: &str) -> Option<IpNet> {
    let trimmed = raw.trim();
    let net = match trimmed.parse::<IpNet>() {
        Ok(net) => net,
        Err(_) if !trimmed.contains('/') => IpNet::from(trimmed.parse::<IpAddr>().ok()?),
        Err(_) => return None,
    };
    Some(net.trunc())
}

/// Addresses in the block, saturating at `u64::MAX`
pub fn address_count(net: &IpNet) -> u64 {
    let host_bits = u32::from(net.max_prefix_len() - net.prefix_len());
    if host_bits >= 64 {
        u64::MAX
    } else {
        1u64 << host_bits
    }
}

/// Canonical IP string; accepts `ip:port` and `[v6]:port`
pub fn normalize_ip(raw: &str) -> NormalizeResult<IpAddr> {
    let trimmed = raw.trim();
    trimmed
        .parse::<IpAddr>()
        .or_else(|_| trimmed.parse::<SocketAddr>().map(|sock| sock.ip()))
        .or_else(|_| trimmed.trim_matches(['[', ']']).parse::<IpAddr>())
        .map_err(|_| NormalizeError::identity(AssetKind::IpAddress, raw, "not an IP address"))
}

pub fn normalize_cidr(raw: &str) -> NormalizeResult<IpNet> {
    parse_cidr(raw)
        .ok_or_else(|| NormalizeError::identity(AssetKind::NetworkRange, raw, "not a CIDR block"))
}

pub(crate) fn normalize_range_record(
    fields: &RawFields,
) -> NormalizeResult<(String, AssetMetadata)> {
    let raw = coerce::string(fields, &["value", "cidr", "network", "range", "prefix", "netblock"])
        .ok_or_else(|| NormalizeError::identity(AssetKind::NetworkRange, "", "no CIDR field"))?;
    let cidr = normalize_cidr(&raw)?;

    let asn = coerce::string(fields, &["asn", "as_number", "as"])
        .and_then(|s| parse_asn_str(&s));

    Ok((
        cidr.to_string(),
        AssetMetadata::NetworkRange(NetworkRangeMetadata {
            asn,
            organization: coerce::string(fields, &["organization", "org", "owner", "description"]),
            country: coerce::string(fields, &["country", "cc", "country_code"]),
            prefix_len: cidr.prefix_len(),
            address_count: address_count(&cidr),
        }),
    ))
}

pub(crate) fn normalize_ip_record(fields: &RawFields) -> NormalizeResult<(String, AssetMetadata)> {
    let raw = coerce::string(fields, &["value", "ip", "ip_str", "ip_address", "address"])
        .ok_or_else(|| NormalizeError::identity(AssetKind::IpAddress, "", "no address field"))?;
    let ip = normalize_ip(&raw)?;

    Ok((
        ip.to_string(),
        AssetMetadata::IpAddress(IpAddressMetadata {
            version: if ip.is_ipv4() { 4 } else { 6 },
            hostnames: coerce::string_list(fields, &["hostnames", "hostname", "ptr", "domains"])
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            organization: coerce::string(fields, &["organization", "org", "isp"]),
            open_ports: coerce::port_list(fields, &["ports", "port", "open_ports"]),
            covering_ranges: Vec::new(),
        }),
    ))
}
