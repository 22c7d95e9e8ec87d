//! Command dispatch
//!
//! Each subcommand is a thin wrapper around one monitor or consolidation operation, run
//! against a [`DirectoryStore`] and the global notification bus.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;

use crate::app::cli::args::Command;
use crate::app::cli::config::Settings;
use crate::app::cli::display;
use crate::app::error::{AppError, AppResult};
use crate::consolidation::api::Consolidator;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::validation::{
    parse_kind_list, parse_tool_list, validate_target_id, ValidationError, ValidationResult,
};
use crate::model::api::{AssetKind, ScanParams, ToolId};
use crate::monitor::api::{MonitorManager, MonitorState, MonitorStart};
use crate::notifications::api::{
    get_notification_service_arc, Event, EventFilter, EventReceiver, NotificationBus,
};
use crate::store::api::DirectoryStore;

const SUBSCRIBER_SOURCE: &str = "cli";

/// Turn repeated `KEY=VALUE` flags into tool parameters
///
/// Values that parse as JSON (numbers, booleans, arrays) keep their type; anything else is
/// a string.
pub fn parse_params(params: &[String]) -> ValidationResult<ScanParams> {
    let mut parsed = ScanParams::new();
    for param in params {
        let (key, value) = param
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| ValidationError::new(format!("parameter '{param}' is not KEY=VALUE")))?;
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        parsed.insert(key.trim().to_string(), value);
    }
    Ok(parsed)
}

fn parse_tool(name: &str) -> ValidationResult<ToolId> {
    ToolId::from_str(name.trim()).map_err(|_| ValidationError::new(format!("unknown tool '{name}'")))
}

fn parse_kind(name: &str) -> ValidationResult<AssetKind> {
    AssetKind::from_str(name.trim())
        .map_err(|_| ValidationError::new(format!("unknown asset kind '{name}'")))
}

pub struct App {
    store: Arc<DirectoryStore>,
    settings: Settings,
    bus: NotificationBus,
    use_color: bool,
}

impl App {
    pub fn new(settings: Settings) -> AppResult<Self> {
        let root = settings.store_dir()?;
        debug!("Using store {}", root.display());
        Ok(Self {
            store: Arc::new(DirectoryStore::new(root)),
            use_color: settings.use_color(),
            settings,
            bus: get_notification_service_arc(),
        })
    }

    fn consolidator(&self) -> Arc<Consolidator> {
        Arc::new(
            Consolidator::new(self.store.clone(), self.store.clone(), self.bus.clone())
                .with_retry(self.settings.retry.clone()),
        )
    }

    fn monitor(&self) -> MonitorManager {
        MonitorManager::new(self.store.clone(), self.bus.clone())
            .with_schedule(self.settings.schedule.clone())
            .with_follow_up(self.consolidator())
    }

    pub async fn run(&self, command: &Command) -> AppResult<()> {
        match command {
            Command::Tools => {
                display::print_table(&display::tools_table(self.use_color), self.use_color)?;
                Ok(())
            }
            Command::Consolidate { target, kinds } => {
                let kinds = kinds.as_deref().map(parse_kind_list).transpose()?;
                self.consolidate(target, kinds.as_deref()).await
            }
            Command::Assets { target, kind, json } => {
                self.assets(target, parse_kind(kind)?, *json).await
            }
            Command::Counts { target, json } => self.counts(target, *json).await,
            Command::Status { target, tools } => {
                let tools = match tools {
                    Some(list) => parse_tool_list(list)?,
                    None => ToolId::all().collect(),
                };
                self.status(target, &tools).await
            }
            Command::Watch { target, tools } => {
                let tools = parse_tool_list(tools)?;
                self.watch(target, &tools, None).await
            }
            Command::Launch {
                target,
                tool,
                params,
            } => {
                let tool = parse_tool(tool)?;
                let params = parse_params(params)?;
                self.watch(target, &[tool], Some(params)).await
            }
        }
    }

    async fn consolidate(&self, target: &str, kinds: Option<&[AssetKind]>) -> AppResult<()> {
        let summary = self.consolidator().consolidate(target, kinds).await?;
        display::print_table(
            &display::summary_table(&summary, self.use_color),
            self.use_color,
        )?;
        Ok(())
    }

    async fn assets(&self, target: &str, kind: AssetKind, json: bool) -> AppResult<()> {
        let assets = self.consolidator().consolidated_assets(target, kind).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&assets)?);
        } else if assets.is_empty() {
            println!("no {} for {target}", kind.plural());
        } else {
            display::print_table(&display::assets_table(&assets, self.use_color), self.use_color)?;
        }
        Ok(())
    }

    async fn counts(&self, target: &str, json: bool) -> AppResult<()> {
        let counts = self.consolidator().asset_counts(target).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&counts)?);
        } else {
            display::print_table(&display::counts_table(&counts, self.use_color), self.use_color)?;
        }
        Ok(())
    }

    async fn status(&self, target: &str, tools: &[ToolId]) -> AppResult<()> {
        validate_target_id(target)?;
        let monitor = MonitorManager::new(self.store.clone(), self.bus.clone());
        let outcomes = join_all(tools.iter().map(|tool| monitor.poll_once(target, *tool))).await;
        let rows: Vec<_> = tools.iter().copied().zip(outcomes).collect();
        display::print_table(&display::status_table(&rows, self.use_color), self.use_color)?;
        Ok(())
    }

    fn print_event(&self, event: &Event) {
        let line = match event {
            Event::Monitor(e) => display::event_line(e, self.use_color),
            Event::Consolidation(e) => display::consolidation_line(e, self.use_color),
            Event::System(_) => None,
        };
        if let Some(line) = line {
            println!("{line}");
        }
    }

    /// Monitor `tools` until each stops, printing transitions as they arrive
    ///
    /// With `launch` set, a new job is started for the single tool first. An interrupt stops
    /// every monitor and returns without error.
    async fn watch(
        &self,
        target: &str,
        tools: &[ToolId],
        launch: Option<ScanParams>,
    ) -> AppResult<()> {
        validate_target_id(target)?;
        let monitor = self.monitor();
        let subscriber = format!("watch-{target}-{}", std::process::id());
        let mut events = self.bus.lock().await.subscribe(
            subscriber.clone(),
            EventFilter::Target(target.to_string()),
            SUBSCRIBER_SOURCE.to_string(),
        );

        match (&launch, tools) {
            (Some(params), [tool]) => {
                let outcome = monitor.launch_scan(target, *tool, params).await?;
                match outcome.job_id {
                    Some(job_id) => println!("{target}/{tool}: started job {job_id}"),
                    None => println!("{target}/{tool}: already monitored, no job started"),
                }
            }
            _ => {
                for tool in tools {
                    if monitor.start_monitor(target, *tool)? == MonitorStart::AlreadyActive {
                        debug!("{target}/{tool} already monitored");
                    }
                }
            }
        }

        let finished = self.follow(&monitor, target, tools, &mut events).await;
        self.bus.lock().await.unsubscribe(&subscriber);
        monitor.shutdown();

        let Some(states) = finished? else {
            info!("Interrupted; monitors stopped");
            return Ok(());
        };
        let rows: Vec<(ToolId, MonitorState)> = tools.iter().copied().zip(states).collect();
        let failed: Vec<String> = rows
            .iter()
            .filter(|(_, state)| *state != MonitorState::Success)
            .map(|(tool, state)| format!("{tool} ended {state}"))
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            warn!("{target}: {}", failed.join(", "));
            Err(AppError::Unfinished(format!("{target}: {}", failed.join(", "))))
        }
    }

    /// Final states in `tools` order, or `None` when interrupted
    async fn follow(
        &self,
        monitor: &MonitorManager,
        target: &str,
        tools: &[ToolId],
        events: &mut EventReceiver,
    ) -> AppResult<Option<Vec<MonitorState>>> {
        ShutdownCoordinator::guard(|mut shutdown_rx| async move {
            let waits = join_all(tools.iter().map(|tool| monitor.wait_for_terminal(target, *tool)));
            tokio::pin!(waits);
            loop {
                tokio::select! {
                    results = &mut waits => {
                        while let Ok(event) = events.try_recv() {
                            self.print_event(&event);
                        }
                        return results
                            .into_iter()
                            .collect::<Result<Vec<_>, _>>()
                            .map(Some)
                            .map_err(AppError::from);
                    }
                    Some(event) = events.recv() => self.print_event(&event),
                    _ = shutdown_rx.recv() => return Ok(None),
                }
            }
        })
        .await
    }
}
