//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use chrono::Utc;
use surfacewatch::model::api::{JobStatus, ScanJob, ToolId};
use surfacewatch::store::api::DirectoryStore;

pub const CTL_PAYLOAD: &str = "a.example.com\nb.example.com\nwww.example.com\n";
pub const HTTPX_PAYLOAD: &str =
    r#"{"url":"https://a.example.com","status_code":200,"title":"Shop","host":"10.0.0.5"}"#;
pub const METABIGOR_PAYLOAD: &str = r#"[{"cidr":"10.0.0.0/24","organization":"Acme Corp"}]"#;
pub const SHODAN_PAYLOAD: &str = r#"[{"ip_str":"10.0.0.5","org":"Acme"}]"#;

/// Record a finished job with `payload` as its result
pub async fn succeeded(store: &DirectoryStore, target: &str, tool: ToolId, payload: &str) {
    let job_id = format!("job-{target}-{tool}");
    let mut job = ScanJob::new(job_id, target, tool, Utc::now())
        .with_status(JobStatus::Success)
        .with_result(payload);
    job.completed_at = Some(Utc::now());
    store.record_job(job).await.unwrap();
}

pub async fn seed_acme(store: &DirectoryStore) {
    succeeded(store, "acme", ToolId::Ctl, CTL_PAYLOAD).await;
    succeeded(store, "acme", ToolId::Httpx, HTTPX_PAYLOAD).await;
    succeeded(store, "acme", ToolId::MetabigorCompany, METABIGOR_PAYLOAD).await;
    succeeded(store, "acme", ToolId::ShodanCompany, SHODAN_PAYLOAD).await;
}

/// Run the binary against `store` with colour and file logging off
pub fn surfacewatch(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_surfacewatch"))
        .arg("--store")
        .arg(store)
        .args(["--no-color", "-f", "none", "-l", "warn"])
        .args(args)
        .env("HOME", store)
        .env("XDG_CONFIG_HOME", store.join("config"))
        .output()
        .unwrap()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
