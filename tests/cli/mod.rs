//! CLI integration test modules

pub mod arguments;
pub mod commands;
pub mod toml_config;
