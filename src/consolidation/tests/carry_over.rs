//! Kind-filtered runs, follow-ups and discovery edges

use super::helpers::{find, fixture, keys, stored, tools};
use crate::model::api::{AssetKind, AssetSource, DiscoveryEdge, ToolId};
use crate::monitor::api::FollowUpHandler;

#[tokio::test]
async fn test_filtered_run_carries_other_kinds() {
    let fx = fixture().await;
    fx.store
        .record_success("acme", ToolId::Ctl, "a.example.com\n")
        .unwrap();
    fx.store
        .record_success("acme", ToolId::Httpx, r#"{"url":"https://a.example.com"}"#)
        .unwrap();
    fx.consolidator.consolidate("acme", None).await.unwrap();

    fx.store
        .record_success(
            "acme",
            ToolId::Httpx,
            "{\"url\":\"https://a.example.com\"}\n{\"url\":\"http://a.example.com:8080\"}\n",
        )
        .unwrap();
    let summary = fx
        .consolidator
        .consolidate("acme", Some(&[AssetKind::LiveWebServer]))
        .await
        .unwrap();
    assert_eq!(summary.counts.live_web_servers, 2);
    assert_eq!(summary.counts.fqdns, 1);

    let snapshot = stored(&fx.store, "acme").await;
    assert_eq!(snapshot.kinds, vec![AssetKind::LiveWebServer]);
    assert_eq!(
        tools(find(&snapshot, AssetKind::Fqdn, "a.example.com")),
        vec![ToolId::Ctl]
    );
    // ctl was not consulted, so its earlier input entry is kept
    assert!(snapshot
        .inputs
        .iter()
        .any(|input| input.source == AssetSource::Tool(ToolId::Ctl)));
    assert_eq!(
        snapshot
            .inputs
            .iter()
            .filter(|input| input.source == AssetSource::Tool(ToolId::Httpx))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_filtered_run_on_fresh_target_stores_every_kind() {
    let fx = fixture().await;
    fx.store
        .record_success("acme", ToolId::Subfinder, "a.example.com\n")
        .unwrap();
    fx.consolidator
        .consolidate("acme", Some(&[AssetKind::Fqdn]))
        .await
        .unwrap();

    let snapshot = stored(&fx.store, "acme").await;
    assert_eq!(snapshot.assets.len(), AssetKind::all().len());
    assert_eq!(snapshot.assets_of(AssetKind::Fqdn).len(), 1);
    assert!(snapshot.assets_of(AssetKind::Asn).is_empty());
}

#[tokio::test]
async fn test_follow_up_consolidates_the_tool_kinds() {
    let fx = fixture().await;
    fx.store
        .record_success(
            "acme",
            ToolId::MetabigorCompany,
            r#"["192.0.2.0/24","198.51.100.0/24"]"#,
        )
        .unwrap();

    fx.consolidator
        .on_success("acme", ToolId::MetabigorCompany, &[AssetKind::NetworkRange])
        .await
        .unwrap();

    let snapshot = stored(&fx.store, "acme").await;
    assert_eq!(snapshot.kinds, vec![AssetKind::NetworkRange]);
    assert_eq!(
        keys(snapshot.assets_of(AssetKind::NetworkRange)),
        vec!["192.0.2.0/24", "198.51.100.0/24"]
    );
}

#[tokio::test]
async fn test_discovered_targets_contribute_with_edge_provenance() {
    let fx = fixture().await;
    fx.store
        .record_success("acme-eu", ToolId::Subfinder, "eu.example.com\nwww.example.com\n")
        .unwrap();
    fx.consolidator.consolidate("acme-eu", None).await.unwrap();

    fx.store
        .record_success("acme", ToolId::Ctl, "www.example.com\n")
        .unwrap();
    for (child, parent) in [("acme-eu", "acme"), ("acme", "acme"), ("acme-apac", "acme")] {
        fx.store
            .add_discovery_edge(DiscoveryEdge {
                child_target: child.to_string(),
                parent_target: parent.to_string(),
            })
            .unwrap();
    }

    let summary = fx.consolidator.consolidate("acme", None).await.unwrap();
    // A child without a snapshot contributes nothing and is not a failure
    assert!(summary.skipped_sources.is_empty());

    let snapshot = stored(&fx.store, "acme").await;
    assert_eq!(
        keys(snapshot.assets_of(AssetKind::Fqdn)),
        vec!["eu.example.com", "www.example.com"]
    );
    let from_child = AssetSource::DiscoveredUnder {
        target_id: "acme-eu".to_string(),
    };
    let eu = find(&snapshot, AssetKind::Fqdn, "eu.example.com");
    assert_eq!(eu.sources.iter().collect::<Vec<_>>(), vec![&from_child]);
    let www = find(&snapshot, AssetKind::Fqdn, "www.example.com");
    assert!(www.sources.contains(&from_child));
    assert!(www.has_tool(ToolId::Ctl));

    let input = snapshot
        .inputs
        .iter()
        .find(|input| input.source == from_child)
        .unwrap();
    assert_eq!(input.records, 2);
    assert!(input.job_id.is_none());
}

#[tokio::test]
async fn test_discovered_targets_respect_kind_filter() {
    let fx = fixture().await;
    fx.store
        .record_success("acme-eu", ToolId::Subfinder, "eu.example.com\n")
        .unwrap();
    fx.store
        .record_success("acme-eu", ToolId::Httpx, r#"{"url":"https://eu.example.com"}"#)
        .unwrap();
    fx.consolidator.consolidate("acme-eu", None).await.unwrap();
    fx.store
        .add_discovery_edge(DiscoveryEdge {
            child_target: "acme-eu".to_string(),
            parent_target: "acme".to_string(),
        })
        .unwrap();

    fx.consolidator
        .consolidate("acme", Some(&[AssetKind::LiveWebServer]))
        .await
        .unwrap();

    let snapshot = stored(&fx.store, "acme").await;
    assert_eq!(
        keys(snapshot.assets_of(AssetKind::LiveWebServer)),
        vec!["https://eu.example.com:443"]
    );
    assert!(snapshot.assets_of(AssetKind::Fqdn).is_empty());
}
