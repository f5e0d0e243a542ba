//! # ATC Sequencer Binary
//!
//! Runs one automatic tool change against the simulation driver.
//!
//! # Usage
//!
//! ```bash
//! # Change to tool 7, answering prompts on the terminal
//! atc_sequencer --tool 7
//!
//! # Unattended, with a config file and a JSON report
//! atc_sequencer --config config/atc.toml --tool 15 --assume-yes --report
//!
//! # Verbose logging, spindle running at the start
//! atc_sequencer --tool 3 --spindle-running -v
//! ```

use atc_common::changer::config::AtcConfig;
use atc_common::config::{ConfigLoader, LogLevel};
use atc_common::consts::{DEFAULT_CONFIG_PATH, DEFAULT_STATE_FILE};
use atc_common::machine::driver::OperatorConsole;
use atc_common::machine::types::OperatorResponse;
use atc_common::tool::ToolNumber;
use atc_hal::{ScriptedConsole, SimulatedMachine, SimulationConfig};
use atc_sequencer::config::{LoadedConfig, load_config};
use atc_sequencer::{CycleOutcome, Sequencer};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// ATC Sequencer - automatic tool change for sliding-rack tool changers
#[derive(Parser, Debug)]
#[command(name = "atc_sequencer")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Automatic tool change sequencer (simulation driver)")]
#[command(long_about = None)]
struct Args {
    /// Path to the ATC configuration file. Built-in defaults are used
    /// when omitted and /etc/atc/atc.toml does not exist.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the simulation driver configuration file.
    #[arg(long, value_name = "FILE")]
    sim_config: Option<PathBuf>,

    /// Requested tool number (-1 means the T word was missing).
    #[arg(short, long, allow_hyphen_values = true)]
    tool: i32,

    /// Override the tool recorded in the spindle.
    #[arg(long, allow_hyphen_values = true)]
    current: Option<i32>,

    /// File persisting the tool in the spindle between runs.
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    /// Answer OK to every operator prompt.
    #[arg(short = 'y', long)]
    assume_yes: bool,

    /// Start with the spindle turning.
    #[arg(long)]
    spindle_running: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Print the cycle report as JSON on stdout.
    #[arg(long)]
    report: bool,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("FATAL: {}", e);
            eprintln!("atc_sequencer: {e}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the tool change completed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Installed before config loading so load failures are logged.
    let filter_handle = setup_tracing(&args);

    let loaded = load_atc_config(args.config.as_deref())?;
    apply_config_level(&filter_handle, &args, loaded.config.shared.log_level);

    info!(
        "ATC Sequencer v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        loaded.config.shared.service_name
    );

    let sim_config = match &args.sim_config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let mut machine =
        SimulatedMachine::new(&sim_config, &loaded.config.io).with_state_file(&args.state_file)?;
    if let Some(current) = args.current {
        machine.set_current_tool(ToolNumber::new(current));
    }
    machine.request_tool(ToolNumber::new(args.tool));
    machine.set_spindle_running(args.spindle_running);

    let interrupt = machine.interrupt_handle();
    ctrlc::set_handler(move || {
        info!("Received stop signal");
        interrupt.store(true, Ordering::SeqCst);
    })?;

    let mut console: Box<dyn OperatorConsole> = if args.assume_yes {
        Box::new(ScriptedConsole::proceeding())
    } else {
        Box::new(TerminalConsole)
    };

    let sequencer = Sequencer::new(&loaded.config, &loaded.slot_map);
    let report = sequencer.run(&mut machine, console.as_mut())?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match report.outcome {
        CycleOutcome::Completed { tool } => {
            info!(%tool, elapsed = ?report.elapsed, "Tool change complete");
            Ok(true)
        }
        outcome => {
            warn!(?outcome, "Tool change did not complete");
            Ok(false)
        }
    }
}

/// Explicit path, then the default path if present, then built-in defaults.
fn load_atc_config(path: Option<&Path>) -> Result<LoadedConfig, Box<dyn std::error::Error>> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let loaded = match path {
        Some(path) => load_config(path)?,
        None if default_path.exists() => load_config(default_path)?,
        None => LoadedConfig::from_config(AtcConfig::default())?,
    };
    Ok(loaded)
}

/// Setup tracing subscriber based on CLI arguments.
///
/// The filter sits behind a reload layer so the configured log level can
/// replace the startup level once the config file has been read.
fn setup_tracing(args: &Args) -> reload::Handle<EnvFilter, Registry> {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    let (filter, handle) = reload::Layer::new(filter);

    let registry = tracing_subscriber::registry().with(filter);
    if args.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    handle
}

/// `--verbose` and `RUST_LOG` take precedence over the config file.
fn apply_config_level(handle: &reload::Handle<EnvFilter, Registry>, args: &Args, level: LogLevel) {
    if args.verbose || std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    if let Err(e) = handle.reload(EnvFilter::new(level.as_directive())) {
        warn!("Failed to apply configured log level: {e}");
    }
}

// ─── Terminal Console ───────────────────────────────────────────────

/// Operator console on stdin/stdout. Empty input or `ok` proceeds.
struct TerminalConsole;

impl OperatorConsole for TerminalConsole {
    fn notify(&mut self, message: &str) {
        println!("{message}");
    }

    fn confirm(&mut self, message: &str) -> OperatorResponse {
        print!("{message} [OK/cancel] ");
        if let Err(e) = std::io::stdout().flush() {
            warn!("Failed to flush prompt: {e}");
        }

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => OperatorResponse::Cancel,
            Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
                "" | "ok" | "y" | "yes" => OperatorResponse::Proceed,
                _ => OperatorResponse::Cancel,
            },
        }
    }
}
