//! Cloud resource identity and provider guessing

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::api::{AssetKind, AssetMetadata, CloudAssetMetadata, CloudProvider, RawFields};
use crate::normalizer::coerce;
use crate::normalizer::error::{NormalizeError, NormalizeResult};

/// What a hostname suffix says about the resource behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudGuess {
    pub provider: CloudProvider,
    pub service: &'static str,
}

/// Most specific suffixes first
const SUFFIXES: &[(&str, CloudProvider, &str)] = &[
    ("s3.amazonaws.com", CloudProvider::Aws, "s3"),
    ("cloudfront.net", CloudProvider::Aws, "cloudfront"),
    ("elasticbeanstalk.com", CloudProvider::Aws, "elastic_beanstalk"),
    ("amazonaws.com", CloudProvider::Aws, "aws"),
    ("storage.googleapis.com", CloudProvider::Gcp, "gcs"),
    ("appspot.com", CloudProvider::Gcp, "app_engine"),
    ("firebaseio.com", CloudProvider::Gcp, "firebase"),
    ("firebaseapp.com", CloudProvider::Gcp, "firebase"),
    ("googleapis.com", CloudProvider::Gcp, "google_api"),
    ("googleusercontent.com", CloudProvider::Gcp, "google_content"),
    ("blob.core.windows.net", CloudProvider::Azure, "blob_storage"),
    ("azurewebsites.net", CloudProvider::Azure, "app_service"),
    ("cloudapp.azure.com", CloudProvider::Azure, "cloud_app"),
    ("cloudapp.net", CloudProvider::Azure, "cloud_app"),
    ("azureedge.net", CloudProvider::Azure, "cdn"),
    ("windows.net", CloudProvider::Azure, "azure"),
    ("digitaloceanspaces.com", CloudProvider::Digitalocean, "spaces"),
    ("r2.cloudflarestorage.com", CloudProvider::Cloudflare, "r2"),
    ("workers.dev", CloudProvider::Cloudflare, "workers"),
    ("pages.dev", CloudProvider::Cloudflare, "pages"),
];

static S3_REGIONAL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:^|\.)s3[.-](?:website[.-])?(?P<region>[a-z]{2}-[a-z]+-\d)\.amazonaws\.com$")
        .ok()
});

static SPACES_REGION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|\.)(?P<region>[a-z]{3}\d)\.digitaloceanspaces\.com$").ok());

/// Match `host` against the suffix table
pub fn guess(host: &str) -> Option<CloudGuess> {
    if S3_REGIONAL.as_ref().is_some_and(|re| re.is_match(host)) {
        return Some(CloudGuess {
            provider: CloudProvider::Aws,
            service: "s3",
        });
    }
    SUFFIXES
        .iter()
        .find(|(suffix, _, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
        .map(|(_, provider, service)| CloudGuess {
            provider: *provider,
            service: *service,
        })
}

pub fn is_cloud_host(host: &str) -> bool {
    guess(&host.to_ascii_lowercase()).is_some()
}

fn region(host: &str) -> Option<String> {
    [&*S3_REGIONAL, &*SPACES_REGION]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(host))
        .and_then(|caps| caps.name("region"))
        .map(|m| m.as_str().to_string())
}

/// Provider names as tools spell them
fn provider_from_hint(hint: &str) -> Option<CloudProvider> {
    match hint.trim().to_ascii_lowercase().as_str() {
        "amazon" | "aws" | "s3" => Some(CloudProvider::Aws),
        "google" | "gcp" | "gcs" => Some(CloudProvider::Gcp),
        "azure" | "microsoft" => Some(CloudProvider::Azure),
        "do" | "digitalocean" => Some(CloudProvider::Digitalocean),
        other => CloudProvider::from_str(other)
            .ok()
            .filter(|p| *p != CloudProvider::Unknown),
    }
}

fn parse_url(raw: &str) -> NormalizeResult<url::Url> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    url::Url::parse(&with_scheme)
        .map_err(|e| NormalizeError::identity(AssetKind::CloudAsset, raw, e.to_string()))
}

/// Hostname of a cloud resource, scheme and path stripped
pub fn cloud_host(raw: &str) -> NormalizeResult<String> {
    parse_url(raw)?
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| NormalizeError::identity(AssetKind::CloudAsset, raw, "no hostname"))
}

/// Endpoints that name the bucket in the path rather than the hostname
fn is_shared_endpoint(host: &str) -> bool {
    host == "s3.amazonaws.com"
        || host == "storage.googleapis.com"
        || ((host.starts_with("s3.") || host.starts_with("s3-"))
            && S3_REGIONAL.as_ref().is_some_and(|re| re.is_match(host)))
        || (host.ends_with(".digitaloceanspaces.com") && host.split('.').count() == 3)
}

/// Bucket of a path-style URL such as `https://s3.amazonaws.com/acme-logs/x.png`
fn path_bucket(raw: &str, host: &str) -> Option<String> {
    if !is_shared_endpoint(host) {
        return None;
    }
    parse_url(raw)
        .ok()?
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

pub(crate) fn normalize_record(fields: &RawFields) -> NormalizeResult<(String, AssetMetadata)> {
    let raw = coerce::string(fields, &["value", "url", "host", "bucket_url", "asset"])
        .ok_or_else(|| NormalizeError::identity(AssetKind::CloudAsset, "", "no URL field"))?;
    let host = cloud_host(&raw)?;

    let hinted = coerce::string(fields, &["provider_hint", "provider", "platform"])
        .as_deref()
        .and_then(provider_from_hint);

    let (provider, service) = match (guess(&host), hinted) {
        (Some(found), _) => (found.provider, Some(found.service.to_string())),
        (None, Some(provider)) => (provider, None),
        (None, None) => {
            return Err(NormalizeError::identity(
                AssetKind::CloudAsset,
                raw,
                "host matches no known cloud service",
            ))
        }
    };

    Ok((
        host.clone(),
        AssetMetadata::CloudAsset(CloudAssetMetadata {
            provider,
            service: coerce::string(fields, &["service"]).or(service),
            source_url: coerce::string(fields, &["source_url", "source", "referer"]),
            region: coerce::string(fields, &["region"]).or_else(|| region(&host)),
            bucket: path_bucket(&raw, &host),
        }),
    ))
}
