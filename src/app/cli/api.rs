//! Public API exports for the CLI module

pub use crate::app::cli::args::{Args, Command};
pub use crate::app::cli::config::{Settings, APP_DIR, CONFIG_FILE};
pub use crate::app::cli::display::{print_table, state_role};
