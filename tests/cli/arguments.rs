//! Argument parsing

use clap::Parser;
use surfacewatch::app::cli::api::{Args, Command};

#[test]
fn test_consolidate_with_kind_filter() {
    let args = Args::try_parse_from([
        "surfacewatch",
        "consolidate",
        "acme",
        "--kind",
        "fqdn,live_web_server",
    ])
    .unwrap();
    assert_eq!(
        args.command,
        Command::Consolidate {
            target: "acme".to_string(),
            kinds: Some("fqdn,live_web_server".to_string()),
        }
    );
}

#[test]
fn test_watch_requires_tools() {
    assert!(Args::try_parse_from(["surfacewatch", "watch", "acme"]).is_err());
    let args = Args::try_parse_from(["surfacewatch", "watch", "acme", "-t", "ctl,httpx"]).unwrap();
    assert!(matches!(args.command, Command::Watch { ref tools, .. } if tools == "ctl,httpx"));
}

#[test]
fn test_subcommand_is_required() {
    assert!(Args::try_parse_from(["surfacewatch", "--store", "/tmp/sw"]).is_err());
}

#[test]
fn test_assets_needs_a_kind() {
    assert!(Args::try_parse_from(["surfacewatch", "assets", "acme"]).is_err());
    let args =
        Args::try_parse_from(["surfacewatch", "assets", "acme", "-k", "ip_address", "--json"])
            .unwrap();
    assert_eq!(
        args.command,
        Command::Assets {
            target: "acme".to_string(),
            kind: "ip_address".to_string(),
            json: true,
        }
    );
}
