//! Public API for the Asset Normalizer

pub use crate::normalizer::asn::{parse_asn, parse_asn_str};
pub use crate::normalizer::cloud::{guess as guess_cloud, is_cloud_host, CloudGuess};
pub use crate::normalizer::error::{NormalizeError, NormalizeResult};
pub use crate::normalizer::fqdn::{normalize_fqdn, root_domain};
pub use crate::normalizer::network::{address_count, normalize_cidr, normalize_ip, parse_cidr};
pub use crate::normalizer::normalize::{compare_keys, normalize, NormalizedAsset};
pub use crate::normalizer::web::{origin_from_parts, origin_from_url, Origin};
