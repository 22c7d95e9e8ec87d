//! Domain name identity

use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::model::api::{AssetKind, AssetMetadata, FqdnMetadata, RawFields};
use crate::normalizer::coerce;
use crate::normalizer::error::{NormalizeError, NormalizeResult};

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Canonical form of a domain name
///
/// Accepts bare names, `host:port`, and URLs (reduced to their host). Strips a leading `*.`
/// and a trailing dot, lower-cases, then rejects IP literals, single-label names and labels
/// outside `[a-z0-9_-]`.
pub fn normalize_fqdn(raw: &str) -> NormalizeResult<String> {
    let fail = |reason: &str| NormalizeError::identity(AssetKind::Fqdn, raw, reason);

    let host = host_part(raw.trim());
    let host = host.strip_prefix("*.").unwrap_or(host);
    let host = host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase();

    if host.is_empty() {
        return Err(fail("empty name"));
    }
    if host.parse::<IpAddr>().is_ok() {
        return Err(fail("IP literal is not a domain name"));
    }
    if host.len() > MAX_NAME_LEN {
        return Err(fail("name longer than 253 characters"));
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Err(fail("single-label name"));
    }
    for label in &labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(fail("empty or oversized label"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(fail("invalid character in label"));
        }
    }

    Ok(host)
}

/// Drop scheme, credentials, path and port, leaving the host
fn host_part(raw: &str) -> &str {
    let without_scheme = match raw.find("://") {
        Some(idx) => &raw[idx + 3..],
        None => raw,
    };
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);

    match host_port.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
            host
        }
        _ => host_port,
    }
}

/// Last two labels of an already-normalized name
pub fn root_domain(fqdn: &str) -> String {
    let labels: Vec<&str> = fqdn.rsplitn(3, '.').collect();
    match labels.as_slice() {
        [tld, sld, ..] => format!("{sld}.{tld}"),
        _ => fqdn.to_string(),
    }
}

pub(crate) fn normalize_record(fields: &RawFields) -> NormalizeResult<(String, AssetMetadata)> {
    let raw = coerce::string(fields, &["value", "host", "domain", "name", "fqdn", "input"])
        .ok_or_else(|| NormalizeError::identity(AssetKind::Fqdn, "", "no name field"))?;
    let key = normalize_fqdn(&raw)?;

    let resolved: BTreeSet<IpAddr> = coerce::string_list(fields, &["resolved_ips", "a", "aaaa"])
        .into_iter()
        .filter_map(|ip| ip.parse::<IpAddr>().ok())
        .collect();
    let resolved_ips = resolved.iter().map(IpAddr::to_string).collect();

    Ok((
        key.clone(),
        AssetMetadata::Fqdn(FqdnMetadata {
            root_domain: root_domain(&key),
            resolved_ips,
        }),
    ))
}
