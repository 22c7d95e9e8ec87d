//! TOML configuration
//!
//! Loaded from `--config-file` or `<config_dir>/surfacewatch/surfacewatch.toml`. Values set
//! on the command line win over the file.
//!
//! ```toml
//! store = "/var/lib/surfacewatch"
//! log-level = "info"
//!
//! [monitor]
//! default-interval-secs = 10
//!
//! [monitor.intervals]
//! httpx = 3
//!
//! [consolidation]
//! fetch-attempts = 3
//! fetch-retry-delay-ms = 500
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::app::cli::args::Args;
use crate::app::error::{AppError, AppResult};
use crate::core::logging::LogFormat;
use crate::core::retry::RetryPolicy;
use crate::core::validation::{
    validate_interval_secs, validate_positive, ValidationError, ValidationResult,
};
use crate::model::api::ToolId;
use crate::monitor::api::PollSchedule;

pub const APP_DIR: &str = "surfacewatch";
pub const CONFIG_FILE: &str = "surfacewatch.toml";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Effective settings after merging the configuration file and command-line flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub store: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub color: Option<bool>,
    pub schedule: PollSchedule,
    pub retry: RetryPolicy,
}

fn invalid(key: &str, expected: &str) -> ValidationError {
    ValidationError::new(format!("{key} must be {expected}"))
}

fn string_value<'a>(table: &'a toml::Table, key: &str) -> ValidationResult<Option<&'a str>> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| invalid(key, "a string")),
    }
}

fn unsigned_value(table: &toml::Table, key: &str, what: &str) -> ValidationResult<Option<u64>> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(what, "a non-negative integer")),
    }
}

fn sub_table<'a>(table: &'a toml::Table, key: &str, what: &str) -> ValidationResult<Option<&'a toml::Table>> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_table()
            .map(Some)
            .ok_or_else(|| invalid(what, "a table")),
    }
}

impl Settings {
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Read the configuration file, if any
    ///
    /// An explicitly named file must exist; a missing default file just yields defaults.
    pub async fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(AppError::config(format!(
                    "the configuration file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            AppError::config(format!("could not read {}: {e}", path.display()))
        })?;
        let table = toml::from_str::<toml::Table>(&contents).map_err(|e| {
            AppError::config(format!("could not parse {}: {e}", path.display()))
        })?;

        let mut settings = Self::default();
        settings.apply_toml_values(&table).map_err(|e| {
            AppError::config(format!("{}: {}", path.display(), e.message()))
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    pub fn apply_toml_values(&mut self, config: &toml::Table) -> ValidationResult<()> {
        if let Some(store) = string_value(config, "store")? {
            self.store = Some(PathBuf::from(store));
        }
        if let Some(level) = string_value(config, "log-level")? {
            if !LOG_LEVELS.contains(&level) {
                return Err(invalid("log-level", "one of trace, debug, info, warn, error, off"));
            }
            self.log_level = Some(level.to_string());
        }
        if let Some(format) = string_value(config, "log-format")? {
            LogFormat::from_str(format).map_err(|_| invalid("log-format", "text, ext or json"))?;
            self.log_format = Some(format.to_string());
        }
        if let Some(log_file) = string_value(config, "log-file")? {
            self.log_file = if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                None
            } else {
                Some(PathBuf::from(log_file))
            };
        }
        if let Some(color) = config.get("color") {
            self.color = Some(color.as_bool().ok_or_else(|| invalid("color", "true or false"))?);
        }

        if let Some(monitor) = sub_table(config, "monitor", "monitor")? {
            self.apply_monitor(monitor)?;
        }
        if let Some(consolidation) = sub_table(config, "consolidation", "consolidation")? {
            self.apply_consolidation(consolidation)?;
        }
        Ok(())
    }

    fn apply_monitor(&mut self, monitor: &toml::Table) -> ValidationResult<()> {
        const DEFAULT_KEY: &str = "monitor.default-interval-secs";
        if let Some(secs) = unsigned_value(monitor, "default-interval-secs", DEFAULT_KEY)? {
            let secs = validate_interval_secs(secs, DEFAULT_KEY)?;
            self.schedule.default_interval = Some(Duration::from_secs(secs));
        }

        if let Some(intervals) = sub_table(monitor, "intervals", "monitor.intervals")? {
            for key in intervals.keys() {
                let what = format!("monitor.intervals.{key}");
                let tool = ToolId::from_str(key)
                    .map_err(|_| ValidationError::new(format!("{what}: unknown tool '{key}'")))?;
                let secs = unsigned_value(intervals, key, &what)?.unwrap_or_default();
                let secs = validate_interval_secs(secs, &what)?;
                self.schedule
                    .intervals
                    .insert(tool, Duration::from_secs(secs));
            }
        }
        Ok(())
    }

    fn apply_consolidation(&mut self, consolidation: &toml::Table) -> ValidationResult<()> {
        const ATTEMPTS_KEY: &str = "consolidation.fetch-attempts";
        const DELAY_KEY: &str = "consolidation.fetch-retry-delay-ms";
        if let Some(attempts) = unsigned_value(consolidation, "fetch-attempts", ATTEMPTS_KEY)? {
            let attempts = usize::try_from(attempts).unwrap_or(usize::MAX);
            self.retry.max_attempts = validate_positive(attempts, ATTEMPTS_KEY)?;
        }
        if let Some(delay) = unsigned_value(consolidation, "fetch-retry-delay-ms", DELAY_KEY)? {
            self.retry.delay = Duration::from_millis(delay);
        }
        Ok(())
    }

    /// Let command-line flags override file values
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(store) = &args.store {
            self.store = Some(store.clone());
        }
        if let Some(level) = &args.log_level {
            self.log_level = Some(level.clone());
        }
        if let Some(format) = &args.log_format {
            self.log_format = Some(format.clone());
        }
        if let Some(log_file) = args.log_file_choice() {
            self.log_file = log_file;
        }
        if let Some(color) = args.color_choice() {
            self.color = Some(color);
        }
    }

    /// Store directory: configured, or `<data_dir>/surfacewatch`
    pub fn store_dir(&self) -> AppResult<PathBuf> {
        self.store
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .ok_or_else(|| AppError::config("no store directory given and no data directory available; use --store"))
    }

    /// Colour unless disabled, defaulting to whether stdout is a terminal
    pub fn use_color(&self) -> bool {
        self.color
            .unwrap_or_else(|| std::io::IsTerminal::is_terminal(&std::io::stdout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn table(text: &str) -> toml::Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_full_configuration() {
        let mut settings = Settings::default();
        settings
            .apply_toml_values(&table(
                r#"
                store = "/srv/surfacewatch"
                log-level = "debug"
                log-format = "json"
                log-file = "none"
                color = false

                [monitor]
                default-interval-secs = 10

                [monitor.intervals]
                httpx = 1
                amass = 30

                [consolidation]
                fetch-attempts = 4
                fetch-retry-delay-ms = 50
                "#,
            ))
            .unwrap();

        assert_eq!(settings.store, Some(PathBuf::from("/srv/surfacewatch")));
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.log_format.as_deref(), Some("json"));
        assert_eq!(settings.log_file, None);
        assert_eq!(settings.color, Some(false));
        assert_eq!(settings.schedule.default_interval, Some(Duration::from_secs(10)));
        assert_eq!(
            settings.schedule.intervals.get(&ToolId::Httpx),
            Some(&Duration::from_secs(1))
        );
        assert_eq!(settings.retry.max_attempts, 4);
        assert_eq!(settings.retry.delay, Duration::from_millis(50));
    }

    #[test]
    fn test_unknown_tool_names_the_key() {
        let err = Settings::default()
            .apply_toml_values(&table("[monitor.intervals]\nnmap = 5\n"))
            .unwrap_err();
        assert!(err.message().contains("monitor.intervals.nmap"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in [
            "[monitor]\ndefault-interval-secs = 0\n",
            "[monitor]\ndefault-interval-secs = -3\n",
            "[consolidation]\nfetch-attempts = 0\n",
            "log-format = \"xml\"\n",
            "log-level = \"loud\"\n",
            "color = \"yes\"\n",
            "monitor = 5\n",
        ] {
            assert!(
                Settings::default().apply_toml_values(&table(text)).is_err(),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_command_line_wins() {
        let mut settings = Settings::default();
        settings
            .apply_toml_values(&table("store = \"/from/file\"\nlog-level = \"warn\"\ncolor = true\n"))
            .unwrap();
        let args = Args::try_parse_from([
            "surfacewatch",
            "--store",
            "/from/cli",
            "--no-color",
            "tools",
        ])
        .unwrap();
        settings.apply_args(&args);

        assert_eq!(settings.store, Some(PathBuf::from("/from/cli")));
        assert_eq!(settings.log_level.as_deref(), Some("warn"));
        assert_eq!(settings.color, Some(false));
        assert!(!settings.use_color());
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            Settings::load(Some(&missing)).await,
            Err(AppError::Config { .. })
        ));

        let present = dir.path().join("surfacewatch.toml");
        std::fs::write(&present, "[consolidation]\nfetch-attempts = 3\n").unwrap();
        let settings = Settings::load(Some(&present)).await.unwrap();
        assert_eq!(settings.retry.max_attempts, 3);
    }
}
