//! Asset Normalizer
//!
//! Turns `(asset-kind, raw-fields)` records into canonical identity keys plus metadata. The
//! identity rules decide what counts as a duplicate during consolidation:
//!
//! - FQDN: lower-cased, leading `*.` and trailing dot stripped
//! - network range: CIDR at its base address (`10.0.0.0/24`)
//! - IP address: canonical textual address
//! - live web server: origin with explicit port (`https://a.example.com:443`)
//! - cloud asset: resource hostname, scheme stripped
//! - ASN: the number

pub(crate) mod asn;
pub(crate) mod cloud;
pub(crate) mod coerce;
pub(crate) mod error;
pub(crate) mod fqdn;
pub(crate) mod network;
pub(crate) mod normalize;
pub(crate) mod web;

pub mod api;
