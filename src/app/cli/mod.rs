//! Argument parsing, configuration and output formatting

pub mod api;
pub mod args;
pub mod config;
pub mod display;
