//! Autonomous system numbers

use serde_json::Value;

use crate::model::api::{AsnMetadata, AssetKind, AssetMetadata, RawFields};
use crate::normalizer::coerce;
use crate::normalizer::error::{NormalizeError, NormalizeResult};

/// `13335`, `"13335"`, `"AS13335"` and `"as 13335"` all parse; zero does not
pub fn parse_asn_str(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("as") => trimmed[2..].trim_start(),
        _ => trimmed,
    };
    digits.parse::<u32>().ok().filter(|n| *n != 0)
}

pub fn parse_asn(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n != 0),
        Value::String(s) => parse_asn_str(s),
        _ => None,
    }
}

pub(crate) fn normalize_record(fields: &RawFields) -> NormalizeResult<(String, AssetMetadata)> {
    let value = ["value", "asn", "as_number", "number"]
        .iter()
        .find_map(|name| fields.get(*name))
        .ok_or_else(|| NormalizeError::identity(AssetKind::Asn, "", "no ASN field"))?;
    let asn = parse_asn(value).ok_or_else(|| {
        NormalizeError::identity(AssetKind::Asn, value.to_string(), "not a non-zero AS number")
    })?;

    Ok((
        asn.to_string(),
        AssetMetadata::Asn(AsnMetadata {
            organization: coerce::string(fields, &["organization", "org", "name", "holder"]),
            description: coerce::string(fields, &["description", "desc"]),
            country: coerce::string(fields, &["country", "cc", "country_code"]),
        }),
    ))
}
