//! Parsed-but-not-normalized tool output

use serde_json::{Map, Value};

use crate::model::tool::AssetKind;

pub type RawFields = Map<String, Value>;

/// One `(asset-kind, raw-fields)` tuple produced by a payload parser
///
/// Plain-text items are carried as `{"value": "<text>"}`; JSON objects are carried as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub kind: AssetKind,
    pub fields: RawFields,
}

impl RawRecord {
    pub fn new(kind: AssetKind, fields: RawFields) -> Self {
        Self { kind, fields }
    }

    pub fn from_text(kind: AssetKind, text: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("value".to_string(), Value::String(text.to_string()));
        Self { kind, fields }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}
