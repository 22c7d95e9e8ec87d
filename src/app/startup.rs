//! Process startup: arguments, configuration, logging, then the command

use clap::{CommandFactory, FromArgMatches};
use log::debug;

use super::cli::args::{Args, Command};
use super::cli::config::Settings;
use super::commands::App;
use super::error::AppError;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::styles::palette_to_clap;
use crate::notifications::api::{
    get_notification_service_arc, publish_event, Event, SystemEvent, SystemEventType,
};

fn operation(command: &Command) -> &'static str {
    match command {
        Command::Tools => "Listing tools",
        Command::Consolidate { .. } => "Consolidating snapshot",
        Command::Assets { .. } => "Reading assets",
        Command::Counts { .. } => "Reading asset counts",
        Command::Status { .. } => "Checking job status",
        Command::Watch { .. } => "Monitoring jobs",
        Command::Launch { .. } => "Launching scan",
    }
}

/// Help colour before configuration is known: off with `--no-color` or when not a terminal
fn help_color() -> bool {
    !std::env::args().any(|arg| arg == "--no-color")
        && std::io::IsTerminal::is_terminal(&std::io::stdout())
}

fn parse_args() -> Args {
    let matches = Args::command()
        .styles(palette_to_clap(help_color()))
        .get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Run the command line and return the process exit code
pub async fn startup() -> i32 {
    let args = parse_args();

    // Logging has to start before a configuration error can be reported through it
    let (mut settings, config_error) = match Settings::load(args.config_file.as_deref()).await {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    settings.apply_args(&args);

    let use_color = settings.use_color();
    colored::control::set_override(use_color);
    let log_file = settings
        .log_file
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());
    if let Err(e) = init_logging(
        settings.log_level.as_deref(),
        settings.log_format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("{}", AppError::Logging(e.to_string()));
        return 1;
    }

    if let Some(e) = config_error {
        log_error_with_context(&e, "Loading configuration");
        return 1;
    }
    debug!("Effective settings: {settings:?}");

    let bus = get_notification_service_arc();
    publish_event(&bus, Event::System(SystemEvent::new(SystemEventType::Startup))).await;
    let result = match App::new(settings) {
        Ok(app) => app.run(&args.command).await,
        Err(e) => Err(e),
    };
    publish_event(&bus, Event::System(SystemEvent::new(SystemEventType::Shutdown))).await;
    match result {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, operation(&args.command));
            1
        }
    }
}
