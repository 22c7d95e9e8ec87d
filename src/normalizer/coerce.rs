//! Lenient field extraction
//!
//! Tools disagree on field names and types (`"status_code": 200` vs `"status-code": "200"`).
//! Each helper takes a list of candidate names and returns the first usable value. A value
//! that cannot be coerced counts as absent.

use serde_json::Value;

use crate::model::api::RawFields;

/// First non-empty string among `names`; numbers are rendered as strings
pub fn string(fields: &RawFields, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match fields.get(*name)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn u64_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn u64_field(fields: &RawFields, names: &[&str]) -> Option<u64> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(u64_value))
}

pub fn u16_field(fields: &RawFields, names: &[&str]) -> Option<u16> {
    names.iter().find_map(|name| {
        fields
            .get(*name)
            .and_then(u64_value)
            .and_then(|n| u16::try_from(n).ok())
    })
}

/// Strings from an array, a single string, or a comma-separated string
///
/// Empty entries are dropped and duplicates collapse, keeping first-appearance order.
pub fn string_list(fields: &RawFields, names: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        let trimmed = s.trim();
        if !trimmed.is_empty() && !out.iter().any(|existing| existing == trimmed) {
            out.push(trimmed.to_string());
        }
    };

    for name in names {
        match fields.get(*name) {
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(s) => push(s),
                        Value::Number(n) => push(&n.to_string()),
                        _ => {}
                    }
                }
            }
            Some(Value::String(s)) => s.split(',').for_each(&mut push),
            _ => {}
        }
    }
    out
}

/// Port numbers from an array or single value; invalid entries are dropped
pub fn port_list(fields: &RawFields, names: &[&str]) -> Vec<u16> {
    let mut ports: Vec<u16> = Vec::new();
    for name in names {
        let candidates: Vec<&Value> = match fields.get(*name) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
            None => continue,
        };
        for port in candidates
            .into_iter()
            .filter_map(u64_value)
            .filter_map(|n| u16::try_from(n).ok())
            .filter(|n| *n != 0)
        {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
    }
    ports.sort_unstable();
    ports
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> RawFields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_string_takes_first_usable_name() {
        let f = fields(json!({"title": "  ", "name": "Login", "code": 7}));
        assert_eq!(string(&f, &["title", "name"]), Some("Login".to_string()));
        assert_eq!(string(&f, &["code"]), Some("7".to_string()));
        assert_eq!(string(&f, &["missing"]), None);
    }

    #[test]
    fn test_numeric_coercion_degrades_to_none() {
        let f = fields(json!({"status_code": "abc", "status": "301", "port": 70000}));
        assert_eq!(u16_field(&f, &["status_code"]), None);
        assert_eq!(u16_field(&f, &["status_code", "status"]), Some(301));
        assert_eq!(u16_field(&f, &["port"]), None);
        assert_eq!(u64_field(&f, &["port"]), Some(70000));
    }

    #[test]
    fn test_string_list_shapes() {
        let f = fields(json!({"tech": ["nginx", "PHP", "nginx"], "hostnames": "a.example.com, b.example.com"}));
        assert_eq!(string_list(&f, &["tech"]), vec!["nginx", "PHP"]);
        assert_eq!(
            string_list(&f, &["hostnames"]),
            vec!["a.example.com", "b.example.com"]
        );
        assert!(string_list(&f, &["nothing"]).is_empty());
    }

    #[test]
    fn test_port_list_sorted_and_filtered() {
        let f = fields(json!({"ports": [443, "80", "x", 0, 443], "port": 8080}));
        assert_eq!(port_list(&f, &["ports", "port"]), vec![80, 443, 8080]);
    }
}
