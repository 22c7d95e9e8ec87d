//! Command-line arguments
//!
//! Global flags come first and override the configuration file; each subcommand maps to one
//! operation of the monitor or the consolidation engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "surfacewatch")]
#[command(about = "Scan lifecycle monitor and attack-surface consolidator")]
#[command(version = crate::core::version::long_version())]
#[command(after_help = " * comma-separated list")]
pub struct Args {
    /// Directory holding job results and snapshots
    #[arg(short = 's', long = "store", value_name = "DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true,
          value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true,
          value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Force coloured output
    #[arg(long = "color", global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the registered discovery tools
    Tools,

    /// Rebuild a target's consolidated snapshot
    Consolidate {
        target: String,
        /// Asset kinds to recompute*; others are carried over
        #[arg(short = 'k', long = "kind", value_name = "KINDS")]
        kinds: Option<String>,
    },

    /// List consolidated assets of one kind
    Assets {
        target: String,
        #[arg(short = 'k', long = "kind", value_name = "KIND")]
        kind: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Asset counts per kind
    Counts {
        target: String,
        #[arg(long)]
        json: bool,
    },

    /// Check each tool's latest job once
    Status {
        target: String,
        /// Tools to check* (default: all)
        #[arg(short = 't', long = "tool", value_name = "TOOLS")]
        tools: Option<String>,
    },

    /// Monitor jobs until they finish, consolidating after successful ones
    Watch {
        target: String,
        #[arg(short = 't', long = "tool", value_name = "TOOLS")]
        tools: String,
    },

    /// Enqueue a new job for one tool and monitor it
    Launch {
        target: String,
        tool: String,
        /// Tool parameter as KEY=VALUE; may be repeated
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

impl Args {
    /// `--color` / `--no-color` as a tri-state; `None` leaves the decision to config or TTY
    pub fn color_choice(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Log file from the command line; `none` and `-` disable file logging
    pub fn log_file_choice(&self) -> Option<Option<PathBuf>> {
        self.log_file.as_ref().map(|path| {
            let text = path.to_string_lossy();
            if text.eq_ignore_ascii_case("none") || text == "-" {
                None
            } else {
                Some(path.clone())
            }
        })
    }
}
