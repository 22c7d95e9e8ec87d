//! Configuration files and their precedence

use std::time::Duration;

use clap::Parser;
use surfacewatch::app::cli::api::{Args, Settings};
use surfacewatch::model::api::ToolId;

#[tokio::test]
async fn test_file_values_then_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surfacewatch.toml");
    std::fs::write(
        &path,
        r#"
store = "/srv/sw"
log-level = "debug"

[monitor.intervals]
ctl = 7

[consolidation]
fetch-attempts = 5
"#,
    )
    .unwrap();

    let mut settings = Settings::load(Some(&path)).await.unwrap();
    assert_eq!(
        settings.schedule.intervals.get(&ToolId::Ctl),
        Some(&Duration::from_secs(7))
    );
    assert_eq!(settings.retry.max_attempts, 5);

    let args = Args::try_parse_from(["surfacewatch", "-l", "error", "tools"]).unwrap();
    settings.apply_args(&args);
    assert_eq!(settings.log_level.as_deref(), Some("error"));
    assert_eq!(settings.store_dir().unwrap(), std::path::PathBuf::from("/srv/sw"));
}

#[tokio::test]
async fn test_unparseable_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "store = [unterminated").unwrap();
    let err = Settings::load(Some(&path)).await.unwrap_err();
    assert!(err.to_string().contains("broken.toml"));
}

#[tokio::test]
async fn test_invalid_interval_names_the_file_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surfacewatch.toml");
    std::fs::write(&path, "[monitor.intervals]\nhttpx = 0\n").unwrap();
    let err = Settings::load(Some(&path)).await.unwrap_err().to_string();
    assert!(err.contains("surfacewatch.toml"));
    assert!(err.contains("monitor.intervals.httpx"));
}
