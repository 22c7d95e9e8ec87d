//! Table and line rendering for command output

use prettytable::{format, Cell, Row, Table};

use crate::core::styles::StyleRole;
use crate::model::api::{Asset, AssetCounts, AssetKind, AssetMetadata, SnapshotSummary, ToolId};
use crate::monitor::api::{MonitorState, PollOutcome};
use crate::notifications::api::{
    ConsolidationEvent, ConsolidationEventType, MonitorEvent, MonitorEventType,
};
use crate::registry::api::all_tools;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn cell(text: &str, role: StyleRole, use_color: bool) -> Cell {
    let spec = role.table_spec(use_color);
    if spec.is_empty() {
        Cell::new(text)
    } else {
        Cell::new(text).style_spec(&spec)
    }
}

fn new_table(titles: &[&str], use_color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(Row::new(
        titles
            .iter()
            .map(|title| cell(title, StyleRole::Header, use_color))
            .collect(),
    ));
    table
}

/// Print to stdout, colouring cells only when asked
pub fn print_table(table: &Table, use_color: bool) -> std::io::Result<()> {
    table.print_tty(use_color).map(|_| ())
}

pub fn state_role(state: MonitorState) -> StyleRole {
    match state {
        MonitorState::Success => StyleRole::Success,
        MonitorState::Pending | MonitorState::Running => StyleRole::Progress,
        MonitorState::Error => StyleRole::Failure,
        MonitorState::Inactive => StyleRole::Warning,
        MonitorState::NotStarted => StyleRole::Dim,
    }
}

pub fn tools_table(use_color: bool) -> Table {
    let mut table = new_table(&["Tool", "Kinds", "Payload", "Poll", "Follow-up"], use_color);
    for spec in all_tools() {
        let kinds: Vec<String> = spec.kinds.iter().map(|kind| kind.to_string()).collect();
        table.add_row(Row::new(vec![
            cell(spec.tool.as_ref(), StyleRole::Key, use_color),
            Cell::new(&kinds.join(",")),
            Cell::new(&spec.shape.to_string()),
            Cell::new(&format!("{}s", spec.poll_interval.as_secs())),
            Cell::new(&spec.follow_up.to_string()),
        ]));
    }
    table
}

pub fn summary_table(summary: &SnapshotSummary, use_color: bool) -> Table {
    let mut table = new_table(&["Target", summary.target_id.as_str()], use_color);
    let mut line = |label: &str, value: String| {
        table.add_row(Row::new(vec![
            cell(label, StyleRole::Key, use_color),
            Cell::new(&value),
        ]));
    };

    line(
        "consolidated",
        summary.consolidated_at.format(TIME_FORMAT).to_string(),
    );
    line("elapsed", format!("{} ms", summary.elapsed_ms));
    for kind in AssetKind::all() {
        line(kind.plural(), summary.counts.get(kind).to_string());
    }
    line("relationships", summary.relationships.to_string());
    line("skipped records", summary.skipped_records.to_string());
    for skipped in &summary.skipped_sources {
        line("skipped", format!("{}: {}", skipped.source, skipped.reason));
    }
    line("digest", summary.content_digest.clone());
    table
}

pub fn counts_table(counts: &AssetCounts, use_color: bool) -> Table {
    let mut table = new_table(&["Kind", "Count"], use_color);
    for kind in AssetKind::all() {
        table.add_row(Row::new(vec![
            cell(kind.as_ref(), StyleRole::Key, use_color),
            Cell::new(&counts.get(kind).to_string()).style_spec("r"),
        ]));
    }
    table.add_row(Row::new(vec![
        cell("total", StyleRole::Header, use_color),
        Cell::new(&counts.total().to_string()).style_spec("r"),
    ]));
    table
}

/// Short per-kind description of an asset's metadata
pub fn details(metadata: &AssetMetadata) -> String {
    let mut parts: Vec<String> = Vec::new();
    match metadata {
        AssetMetadata::Asn(meta) => {
            parts.extend(meta.organization.clone());
            parts.extend(meta.country.clone());
        }
        AssetMetadata::NetworkRange(meta) => {
            parts.extend(meta.asn.map(|asn| format!("AS{asn}")));
            parts.extend(meta.organization.clone());
            parts.push(format!("{} addresses", meta.address_count));
        }
        AssetMetadata::IpAddress(meta) => {
            if !meta.covering_ranges.is_empty() {
                parts.push(format!("in {}", meta.covering_ranges.join(",")));
            }
            if !meta.open_ports.is_empty() {
                let ports: Vec<String> = meta.open_ports.iter().map(u16::to_string).collect();
                parts.push(format!("ports {}", ports.join(",")));
            }
            parts.extend(meta.organization.clone());
        }
        AssetMetadata::LiveWebServer(meta) => {
            parts.extend(meta.status_code.map(|code| code.to_string()));
            parts.extend(meta.title.clone());
            parts.extend(meta.web_server.clone());
        }
        AssetMetadata::CloudAsset(meta) => {
            parts.push(meta.provider.to_string());
            parts.extend(meta.service.clone());
        }
        AssetMetadata::Fqdn(meta) => {
            if !meta.resolved_ips.is_empty() {
                parts.push(meta.resolved_ips.join(","));
            }
        }
    }
    parts.join(" | ")
}

pub fn assets_table(assets: &[Asset], use_color: bool) -> Table {
    let mut table = new_table(&["Key", "Sources", "First seen", "Last seen", "Details"], use_color);
    for asset in assets {
        let sources: Vec<String> = asset.sources.iter().map(|s| s.to_string()).collect();
        table.add_row(Row::new(vec![
            cell(&asset.key, StyleRole::Key, use_color),
            Cell::new(&sources.join(",")),
            cell(
                &asset.first_seen.format(TIME_FORMAT).to_string(),
                StyleRole::Dim,
                use_color,
            ),
            cell(
                &asset.last_seen.format(TIME_FORMAT).to_string(),
                StyleRole::Dim,
                use_color,
            ),
            Cell::new(&details(&asset.metadata)),
        ]));
    }
    table
}

pub fn status_table(rows: &[(ToolId, PollOutcome)], use_color: bool) -> Table {
    let mut table = new_table(&["Tool", "State", "Job", "Error"], use_color);
    for (tool, outcome) in rows {
        table.add_row(Row::new(vec![
            cell(tool.as_ref(), StyleRole::Key, use_color),
            cell(&outcome.state.to_string(), state_role(outcome.state), use_color),
            Cell::new(outcome.job_id.as_deref().unwrap_or("-")),
            Cell::new(outcome.error.as_deref().unwrap_or("")),
        ]));
    }
    table
}

/// One line per monitor event for `watch`, or `None` for events not worth printing
pub fn event_line(event: &MonitorEvent, use_color: bool) -> Option<String> {
    let prefix = format!("{}/{}", event.target_id, event.tool);
    match event.event_type {
        MonitorEventType::StateChanged => Some(format!(
            "{prefix}: {}",
            state_role(event.state).paint(&event.state.to_string(), use_color)
        )),
        MonitorEventType::QueryFailed | MonitorEventType::FollowUpFailed => Some(format!(
            "{prefix}: {}",
            StyleRole::Failure.paint(event.message.as_deref().unwrap_or("failed"), use_color)
        )),
        MonitorEventType::Started | MonitorEventType::Stopped => None,
    }
}

pub fn consolidation_line(event: &ConsolidationEvent, use_color: bool) -> Option<String> {
    let message = event.message.as_deref().unwrap_or_default();
    let (role, text) = match event.event_type {
        ConsolidationEventType::Started => return None,
        ConsolidationEventType::Completed => (StyleRole::Success, format!("consolidated, {message}")),
        ConsolidationEventType::SourceSkipped => (StyleRole::Warning, format!("skipped {message}")),
        ConsolidationEventType::Failed => (StyleRole::Failure, format!("consolidation failed: {message}")),
    };
    Some(format!("{}: {}", event.target_id, role.paint(&text, use_color)))
}
