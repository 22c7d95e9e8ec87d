pub mod app;
pub mod consolidation;
pub mod core;
pub mod model;
pub mod monitor;
pub mod normalizer;
pub mod notifications;
pub mod registry;
pub mod store;
