//! Subcommand wiring for the `canbike` binary.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use canbike_link::{
    LinkError, NullSink, RawLineLog, SerialReader, ShutdownToken, list_ports, open_port_pair,
};
use canbike_telemetry::{TelemetryState, parse_line};
use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, Commands};
use crate::config::DashConfig;
use crate::dashboard::{CrosstermEvents, DashboardLoop, DashboardSettings, SharedLink};
use crate::error::ConfigError;
use crate::replay::ReplaySource;
use crate::terminal::TerminalGuard;

/// Diagnostic log written while the dashboard owns the terminal.
pub const DIAGNOSTIC_LOG_NAME: &str = "canbike.log";

const CRATE_TARGETS: [&str; 6] = [
    "canbike",
    "canbike_dash",
    "canbike_link",
    "canbike_protocol",
    "canbike_scheduler",
    "canbike_telemetry",
];

/// Process exit code for a failed run: 2 when a port could not be opened,
/// 3 for configuration errors, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(LinkError::PortOpen { .. }) = err.downcast_ref::<LinkError>() {
        2
    } else if err.downcast_ref::<ConfigError>().is_some() {
        3
    } else {
        1
    }
}

/// Default filter for `-v` count: warn, info, debug, trace.
pub fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse the command line's intent and run it.
///
/// # Errors
///
/// Whatever the subcommand fails with, with context attached.
pub fn execute(cli: &Cli) -> Result<()> {
    match cli.resolved_command() {
        Commands::Run(args) => {
            let config = resolve_config(cli.config.as_deref(), |config| {
                config.apply(&args.overrides());
            })?;
            let diagnostics = init_file_tracing(cli.verbose, &config.log_dir)?;
            info!(
                diagnostics = %diagnostics.display(),
                ecu = %config.ecu_port,
                actuator = %config.actuator_port,
                "starting live session"
            );
            run_live(&config)
        }
        Commands::Replay { log, speed } => {
            let config = resolve_config(cli.config.as_deref(), |_| {})?;
            let diagnostics = init_file_tracing(cli.verbose, &config.log_dir)?;
            info!(
                diagnostics = %diagnostics.display(),
                log = %log.display(),
                speed,
                "starting replay"
            );
            run_replay(&config, &log, speed)
        }
        Commands::Parse { line, json } => {
            init_stderr_tracing(cli.verbose);
            run_parse(&line, json)
        }
        Commands::Ports { json } => {
            init_stderr_tracing(cli.verbose);
            run_ports(json)
        }
    }
}

fn resolve_config(path: Option<&Path>, adjust: impl FnOnce(&mut DashConfig)) -> Result<DashConfig> {
    let mut config = DashConfig::load(path)?;
    adjust(&mut config);
    config.validate()?;
    Ok(config)
}

fn filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)))
}

fn init_stderr_tracing(verbose: u8) {
    let subscriber = tracing_subscriber::registry().with(filter(verbose)).with(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(io::stderr),
    );
    if let Err(e) = subscriber.try_init() {
        eprintln!("warning: logging unavailable: {e}");
    }
}

/// The terminal belongs to the dashboard, so diagnostics go to a file.
fn init_file_tracing(verbose: u8, log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;
    let path = log_dir.join(DIAGNOSTIC_LOG_NAME);
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open diagnostic log {}", path.display()))?;

    let subscriber = tracing_subscriber::registry().with(filter(verbose)).with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(Mutex::new(file)),
    );
    if let Err(e) = subscriber.try_init() {
        eprintln!("warning: logging unavailable: {e}");
    }
    Ok(path)
}

fn install_interrupt(shutdown: &ShutdownToken) -> Result<()> {
    let token = shutdown.clone();
    ctrlc::set_handler(move || token.cancel()).context("cannot install signal handler")
}

fn settings(config: &DashConfig, guard: &TerminalGuard) -> DashboardSettings {
    DashboardSettings {
        frame_rate_hz: config.frame_rate_hz,
        blink_interval: config.blink_interval(),
        hold_release_timeout: config.hold_release_timeout(),
        release_events: guard.release_events(),
    }
}

/// Live session: both controller ports, raw log, reader thread, dashboard.
///
/// # Errors
///
/// Port, log file, or terminal failures at startup; terminal failures while
/// running.
pub fn run_live(config: &DashConfig) -> Result<()> {
    let shutdown = ShutdownToken::new();
    install_interrupt(&shutdown)?;

    let ports = open_port_pair(&config.ecu_settings(), &config.actuator_settings())
        .context("cannot open controller ports")?;
    let log = RawLineLog::create_in(&config.log_dir, &Local::now())
        .inspect_err(|e| error!(error = %e, "raw line log unavailable"))
        .context("cannot create raw line log")?;

    let link = SharedLink::default();
    let reader = SerialReader::with_config(
        ports.actuator,
        log,
        Arc::clone(&link.state),
        config.reader_config(),
    )
    .last_line(Arc::clone(&link.last_line))
    .counters(Arc::clone(&link.counters))
    .spawn(shutdown.clone())
    .context("cannot start serial reader")?;

    let mut guard = TerminalGuard::enter().context("cannot set up terminal")?;
    let mut dashboard =
        DashboardLoop::new(ports.ecu, link, shutdown, settings(config, &guard))?;
    let outcome = dashboard.run(guard.terminal_mut(), &mut CrosstermEvents);
    let (_ecu, commands) = dashboard.finish();
    drop(guard);

    let reader_stats = reader.stop();
    info!(
        lines = reader_stats.lines,
        faults = reader_stats.faults,
        commands_sent = commands.sent,
        commands_dropped = commands.dropped,
        "session ended"
    );
    outcome.context("dashboard failed")
}

/// Offline session: a recorded log drives the dashboard; commands are
/// discarded.
///
/// # Errors
///
/// Unreadable log file or terminal failures.
pub fn run_replay(config: &DashConfig, log: &Path, speed: f64) -> Result<()> {
    let shutdown = ShutdownToken::new();
    install_interrupt(&shutdown)?;

    let source = ReplaySource::open(log, speed)?;
    let link = SharedLink::default();
    let reader = SerialReader::with_config(
        source,
        NullSink,
        Arc::clone(&link.state),
        config.reader_config(),
    )
    .last_line(Arc::clone(&link.last_line))
    .counters(Arc::clone(&link.counters))
    .spawn(shutdown.clone())
    .context("cannot start replay reader")?;

    let mut guard = TerminalGuard::enter().context("cannot set up terminal")?;
    let mut dashboard = DashboardLoop::new(io::sink(), link, shutdown, settings(config, &guard))?
        .with_source("replay");
    let outcome = dashboard.run(guard.terminal_mut(), &mut CrosstermEvents);
    dashboard.finish();
    drop(guard);

    let reader_stats = reader.stop();
    info!(lines = reader_stats.lines, "replay ended");
    outcome.context("dashboard failed")
}

/// Text rendering of what one line does to a fresh state.
pub fn describe_line(line: &str) -> String {
    let updates = parse_line(line);
    if updates.is_empty() {
        return "no recognised fields".to_owned();
    }
    updates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON rendering: the updates and the resulting snapshot.
///
/// # Errors
///
/// Serialization failure.
pub fn describe_line_json(line: &str) -> Result<String> {
    let updates = parse_line(line);
    let state = TelemetryState::new();
    state.apply_all(&updates);
    let report = serde_json::json!({
        "updates": updates,
        "snapshot": state.snapshot(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

fn run_parse(line: &str, json: bool) -> Result<()> {
    let output = if json {
        describe_line_json(line)?
    } else {
        describe_line(line)
    };
    println!("{output}");
    Ok(())
}

fn run_ports(json: bool) -> Result<()> {
    let ports = list_ports().context("cannot enumerate serial ports")?;
    if json {
        let entries: Vec<_> = ports
            .iter()
            .map(|port| serde_json::json!({ "path": port.path, "description": port.description }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if ports.is_empty() {
        println!("no serial ports found");
    } else {
        for port in &ports {
            println!("{:<24} {}", port.path, port.description);
        }
    }
    Ok(())
}
