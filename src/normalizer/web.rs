//! Live web server origins

use std::fmt;
use std::net::IpAddr;

use url::Url;

use crate::model::api::{AssetKind, AssetMetadata, LiveWebServerMetadata, RawFields};
use crate::normalizer::coerce;
use crate::normalizer::error::{NormalizeError, NormalizeResult};

/// `scheme://host:port` with the port always explicit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl Origin {
    /// Host without IPv6 brackets, for matching against FQDN and IP assets
    pub fn bare_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }
}

fn web_error(raw: &str, reason: &str) -> NormalizeError {
    NormalizeError::identity(AssetKind::LiveWebServer, raw, reason)
}

/// Origin of an absolute URL; a missing scheme is read as `http`
pub fn origin_from_url(raw: &str) -> NormalizeResult<Origin> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&candidate).map_err(|e| web_error(raw, &e.to_string()))?;

    let scheme = url.scheme().to_string();
    if scheme != "http" && scheme != "https" {
        return Err(web_error(raw, "scheme is not http or https"));
    }
    let host = url
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| web_error(raw, "no host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| web_error(raw, "no port"))?;

    Ok(Origin { scheme, host, port })
}

/// Origin assembled from separate host/port/scheme fields
///
/// A non-web protocol (`tcp`) is replaced by a guess from the port.
pub fn origin_from_parts(host: &str, port: Option<u16>, scheme: Option<&str>) -> NormalizeResult<Origin> {
    let scheme = match scheme.map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) if s == "http" || s == "https" => s,
        _ => match port {
            Some(443) | Some(8443) => "https".to_string(),
            _ => "http".to_string(),
        },
    };
    let port = port.unwrap_or(if scheme == "https" { 443 } else { 80 });

    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let host = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{v6}]"),
        Ok(IpAddr::V4(v4)) => v4.to_string(),
        Err(_) => host,
    };
    origin_from_url(&format!("{scheme}://{host}:{port}"))
}

pub(crate) fn normalize_record(fields: &RawFields) -> NormalizeResult<(String, AssetMetadata)> {
    let url = coerce::string(fields, &["value", "url", "endpoint"]);
    let origin = match &url {
        Some(url) => origin_from_url(url)?,
        None => {
            let host = coerce::string(fields, &["host", "ip_address", "ip", "domain", "input"])
                .ok_or_else(|| web_error("", "no URL or host field"))?;
            let port = coerce::u16_field(fields, &["port"]);
            let scheme = coerce::string(fields, &["scheme", "protocol"]);
            origin_from_parts(&host, port, scheme.as_deref())?
        }
    };

    let ip = coerce::string(fields, &["ip", "ip_address", "host"])
        .and_then(|s| s.parse::<IpAddr>().ok())
        .or_else(|| {
            coerce::string_list(fields, &["a"])
                .first()
                .and_then(|s| s.parse::<IpAddr>().ok())
        })
        .map(|ip| ip.to_string());

    Ok((
        origin.to_string(),
        AssetMetadata::LiveWebServer(LiveWebServerMetadata {
            url,
            scheme: origin.scheme.clone(),
            host: origin.bare_host().to_string(),
            port: origin.port,
            status_code: coerce::u16_field(fields, &["status_code", "status-code", "status"]),
            title: coerce::string(fields, &["title"]),
            web_server: coerce::string(fields, &["webserver", "web_server", "server_header", "server"]),
            technologies: coerce::string_list(fields, &["tech", "technologies"]),
            content_length: coerce::u64_field(fields, &["content_length", "content-length"]),
            ip,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> NormalizeResult<(String, AssetMetadata)> {
        let Value::Object(fields) = value else {
            unreachable!()
        };
        normalize_record(&fields)
    }

    #[test]
    fn test_origin_has_explicit_port() {
        assert_eq!(
            origin_from_url("https://A.Example.com/login").unwrap().to_string(),
            "https://a.example.com:443"
        );
        assert_eq!(
            origin_from_url("http://a.example.com:8080/").unwrap().to_string(),
            "http://a.example.com:8080"
        );
        assert_eq!(
            origin_from_url("a.example.com/path").unwrap().to_string(),
            "http://a.example.com:80"
        );
        assert!(origin_from_url("ftp://files.example.com").is_err());
        assert!(origin_from_url("https://").is_err());
    }

    #[test]
    fn test_origin_from_parts() {
        assert_eq!(
            origin_from_parts("198.51.100.7", Some(8443), Some("tcp")).unwrap().to_string(),
            "https://198.51.100.7:8443"
        );
        assert_eq!(
            origin_from_parts("a.example.com", None, Some("https")).unwrap().to_string(),
            "https://a.example.com:443"
        );
        let v6 = origin_from_parts("2001:db8::1", Some(80), None).unwrap();
        assert_eq!(v6.to_string(), "http://[2001:db8::1]:80");
        assert_eq!(v6.bare_host(), "2001:db8::1");
    }

    #[test]
    fn test_httpx_style_record() {
        let (key, metadata) = record(json!({
            "url": "https://a.example.com",
            "host": "93.184.216.34",
            "status_code": 200,
            "title": "Example",
            "webserver": "nginx",
            "tech": ["Nginx", "HSTS"],
            "content_length": "1256"
        }))
        .unwrap();
        assert_eq!(key, "https://a.example.com:443");
        let AssetMetadata::LiveWebServer(m) = metadata else {
            panic!("wrong metadata kind")
        };
        assert_eq!(m.status_code, Some(200));
        assert_eq!(m.web_server.as_deref(), Some("nginx"));
        assert_eq!(m.technologies, vec!["Nginx", "HSTS"]);
        assert_eq!(m.content_length, Some(1256));
        assert_eq!(m.ip.as_deref(), Some("93.184.216.34"));
        assert_eq!(m.host, "a.example.com");
    }

    #[test]
    fn test_bad_status_code_degrades() {
        let (_, metadata) = record(json!({"url": "http://b.example.com", "status_code": "OK"})).unwrap();
        let AssetMetadata::LiveWebServer(m) = metadata else {
            panic!("wrong metadata kind")
        };
        assert_eq!(m.status_code, None);
    }

    #[test]
    fn test_port_scan_record_without_url() {
        let (key, _) = record(json!({"ip_address": "198.51.100.7", "port": 8080, "protocol": "http"})).unwrap();
        assert_eq!(key, "http://198.51.100.7:8080");
        assert!(record(json!({"port": 80})).is_err());
    }
}
