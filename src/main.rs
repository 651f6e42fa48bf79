mod error;
mod models;
mod probe;
mod utils;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};

use crate::error::{ProbeError, Result};
use crate::models::{OutputFormat, Settings};
use crate::probe::report::{report_devices, report_json, report_summary};
use crate::probe::DeviceQueryProvider;
use crate::utils::settings::{load_settings, save_settings};

#[derive(Parser, Debug, Default)]
#[command(name = "cuda-probe")]
#[command(version)]
#[command(about = "Reports whether a CUDA device is available and describes it")]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device to report on instead of the runtime default
    #[arg(short, long)]
    device: Option<u32>,

    /// Describe every visible device after the summary
    #[arg(long)]
    all: bool,

    /// Emit a JSON document instead of text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the effective settings to this file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(log_level(cli.verbose, &settings));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run(&settings, &mut out).and_then(|()| out.flush().map_err(ProbeError::from));

    ExitCode::from(exit_status(result, &mut io::stderr()))
}

/// Process status for a finished run: 0 whether or not a device was found,
/// 1 with a single diagnostic line for any error.
fn exit_status<E: Write>(result: Result<()>, err: &mut E) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "device query failed");
            let _ = writeln!(err, "error: {}", e);
            1
        }
    }
}

/// Defaults, overridden by the settings file, overridden by flags.
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };

    if cli.device.is_some() {
        settings.device = cli.device;
    }
    if cli.all {
        settings.all_devices = true;
    }
    if cli.json {
        settings.format = OutputFormat::Json;
    }

    if settings.log_level.parse::<Level>().is_err() {
        return Err(ProbeError::Config(format!(
            "unknown log level '{}'",
            settings.log_level
        )));
    }

    if let Some(path) = &cli.save_config {
        save_settings(&settings, path)?;
    }
    Ok(settings)
}

fn log_level(verbose: u8, settings: &Settings) -> Level {
    match verbose {
        0 => settings.log_level.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cuda")]
fn provider(settings: &Settings) -> impl DeviceQueryProvider {
    probe::CudaProvider::new(settings.selected_device())
}

#[cfg(not(feature = "cuda"))]
fn provider(_settings: &Settings) -> impl DeviceQueryProvider {
    probe::DisabledProvider
}

fn run<W: Write>(settings: &Settings, out: &mut W) -> Result<()> {
    run_with(&provider(settings), settings, out)
}

fn run_with<P, W>(provider: &P, settings: &Settings, out: &mut W) -> Result<()>
where
    P: DeviceQueryProvider + ?Sized,
    W: Write,
{
    info!(device = settings.selected_device(), "querying CUDA runtime");

    match settings.format {
        OutputFormat::Json => report_json(provider, out),
        OutputFormat::Text if settings.all_devices => report_devices(provider, out),
        OutputFormat::Text => report_summary(provider, out).map(|_| ()),
    }
}
