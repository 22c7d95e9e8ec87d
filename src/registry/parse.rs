//! Payload parsing by registered shape

use log::{debug, trace};
use serde_json::Value;

use crate::model::api::{AssetKind, RawRecord, ToolId};
use crate::registry::amass;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::tools::{self, LogDialect, PayloadShape};

/// Records extracted from one raw result
///
/// `unparseable` counts items that did not fit the shape at all. Records that fit the shape
/// but fail normalization are counted later, during consolidation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPayload {
    pub records: Vec<RawRecord>,
    pub unparseable: usize,
}

impl ParsedPayload {
    fn push_item(&mut self, kind: AssetKind, item: Value) {
        match item {
            Value::String(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    self.records.push(RawRecord::from_text(kind, text));
                }
            }
            Value::Object(fields) => self.records.push(RawRecord::new(kind, fields)),
            _ => self.unparseable += 1,
        }
    }
}

fn is_token(line: &str) -> bool {
    !line.contains(char::is_whitespace) && !line.starts_with(['{', '[', '#'])
}

fn parse_lines(kind: AssetKind, raw: &str) -> ParsedPayload {
    if raw.trim_start().starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
            return parse_items(kind, items);
        }
    }

    let mut parsed = ParsedPayload::default();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_token(line) {
            parsed.records.push(RawRecord::from_text(kind, line));
        } else {
            parsed.unparseable += 1;
        }
    }
    parsed
}

fn parse_items(kind: AssetKind, items: Vec<Value>) -> ParsedPayload {
    let mut parsed = ParsedPayload::default();
    for item in items {
        parsed.push_item(kind, item);
    }
    parsed
}

fn parse_json_lines(kind: AssetKind, raw: &str) -> ParsedPayload {
    let mut parsed = ParsedPayload::default();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Array(items)) => {
                for item in items {
                    parsed.push_item(kind, item);
                }
            }
            Ok(item) => parsed.push_item(kind, item),
            Err(e) => {
                trace!("Skipping non-JSON line: {e}");
                parsed.unparseable += 1;
            }
        }
    }
    parsed
}

fn parse_json_array(kind: AssetKind, raw: &str) -> ParsedPayload {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => parse_items(kind, items),
        _ => parse_json_lines(kind, raw),
    }
}

fn parse_json_fields(fields: &[(&str, AssetKind)], raw: &str) -> ParsedPayload {
    let mut parsed = ParsedPayload::default();
    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => object,
        _ => {
            parsed.unparseable += 1;
            return parsed;
        }
    };

    let mut matched = false;
    for (name, kind) in fields {
        let Some(value) = object.get(*name) else {
            continue;
        };
        matched = true;
        let Value::Array(items) = value else {
            parsed.unparseable += 1;
            continue;
        };
        for item in items {
            let before = parsed.records.len();
            parsed.push_item(*kind, item.clone());
            // The field name is the only provider signal some tools give
            if *kind == AssetKind::CloudAsset && parsed.records.len() > before {
                if let Some(record) = parsed.records.last_mut() {
                    record
                        .fields
                        .entry("provider_hint")
                        .or_insert_with(|| Value::from(*name));
                }
            }
        }
    }

    if !matched {
        parsed.unparseable += 1;
    }
    parsed
}

/// Parse a tool's raw result according to its registered shape
///
/// An empty payload is not an error and yields no records. A non-empty payload where
/// nothing matched the shape is reported as [`RegistryError::MalformedPayload`].
pub fn parse_payload(tool: ToolId, raw: &str) -> RegistryResult<ParsedPayload> {
    let spec = tools::spec(tool)?;
    if raw.trim().is_empty() {
        return Ok(ParsedPayload::default());
    }

    let parsed = match spec.shape {
        PayloadShape::Lines(kind) => parse_lines(kind, raw),
        PayloadShape::JsonArray(kind) => parse_json_array(kind, raw),
        PayloadShape::JsonLines(kind) => parse_json_lines(kind, raw),
        PayloadShape::JsonFields(fields) => parse_json_fields(fields, raw),
        PayloadShape::StructuredLog(LogDialect::AmassGraph) => amass::parse_graph(raw),
    };

    if parsed.records.is_empty() && parsed.unparseable > 0 {
        return Err(RegistryError::MalformedPayload {
            tool,
            reason: format!(
                "no item matches the {} shape ({} unreadable)",
                spec.shape, parsed.unparseable
            ),
        });
    }

    debug!(
        "Parsed {} records from {tool} ({} unreadable items)",
        parsed.records.len(),
        parsed.unparseable
    );
    Ok(parsed)
}
