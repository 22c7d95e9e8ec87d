//! The built binary against a temporary store

use surfacewatch::model::api::ToolId;
use surfacewatch::store::api::DirectoryStore;

use crate::common::{seed_acme, stdout, succeeded, surfacewatch, HTTPX_PAYLOAD};

#[test]
fn test_tools_lists_registry() {
    let dir = tempfile::tempdir().unwrap();
    let output = surfacewatch(dir.path(), &["tools"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("metabigor_company"));
    assert!(text.contains("json-lines"));
}

#[test]
fn test_counts_on_empty_store_are_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = surfacewatch(dir.path(), &["counts", "acme", "--json"]);
    assert!(output.status.success());
    let counts: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(counts["fqdns"], 0);
    assert_eq!(counts["asns"], 0);
}

#[tokio::test]
async fn test_consolidate_then_list_assets() {
    let dir = tempfile::tempdir().unwrap();
    seed_acme(&DirectoryStore::new(dir.path())).await;

    let output = surfacewatch(dir.path(), &["consolidate", "acme"]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("digest"));

    let output = surfacewatch(dir.path(), &["assets", "acme", "-k", "fqdn", "--json"]);
    assert!(output.status.success());
    let assets: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let keys: Vec<&str> = assets
        .as_array()
        .unwrap()
        .iter()
        .map(|asset| asset["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["a.example.com", "b.example.com", "www.example.com"]);

    let output = surfacewatch(dir.path(), &["assets", "acme", "-k", "live_web_server"]);
    assert!(stdout(&output).contains("https://a.example.com:443"));
}

#[tokio::test]
async fn test_watch_consolidates_after_success() {
    let dir = tempfile::tempdir().unwrap();
    succeeded(
        &DirectoryStore::new(dir.path()),
        "acme",
        ToolId::Httpx,
        HTTPX_PAYLOAD,
    )
    .await;

    let output = surfacewatch(dir.path(), &["watch", "acme", "-t", "httpx"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("acme/httpx: success"));
    assert!(text.contains("acme: consolidated"));
    assert!(dir.path().join("acme").join("snapshot.json").exists());
}

#[tokio::test]
async fn test_status_reports_each_tool() {
    let dir = tempfile::tempdir().unwrap();
    succeeded(&DirectoryStore::new(dir.path()), "acme", ToolId::Ctl, "a.example.com\n").await;

    let output = surfacewatch(dir.path(), &["status", "acme", "-t", "ctl,gau"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let ctl = text.lines().find(|line| line.contains("ctl")).unwrap();
    assert!(ctl.contains("success"));
    let gau = text.lines().find(|line| line.contains("gau")).unwrap();
    assert!(gau.contains("not_started"));
}

#[test]
fn test_bad_input_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    for args in [
        vec!["consolidate", "../escape"],
        vec!["consolidate", "acme", "-k", "hosts"],
        vec!["launch", "acme", "nmap"],
        vec!["launch", "acme", "httpx", "-p", "novalue"],
        vec!["-c", "/nonexistent/surfacewatch.toml", "tools"],
    ] {
        let output = surfacewatch(dir.path(), &args);
        assert_eq!(output.status.code(), Some(1), "{args:?}");
    }
}
