//! Screen auto-rotation daemon for Linux tablets and convertibles.
//!
//! Polls a sysfs IIO accelerometer, debounces the inferred orientation, and
//! applies changes through xrandr/xinput:
//! - CLI arguments and TOML config file support
//! - Accelerometer and touchscreen autodetection
//! - Structured logging with tracing

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use autorotate::{
    detect_accelerometer, detect_touchscreens, Autorotate, AutorotateConfig, XApplier,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(name = "autorotate")]
#[command(version, about = "Rotate an X11 display to follow accelerometer tilt", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "autorotate.toml")]
    config: String,

    /// Comma-separated xinput touchscreen device names (default: autodetect)
    #[arg(long)]
    touchscreens: Option<String>,

    /// xrandr display identifier
    #[arg(long)]
    display: Option<String>,

    /// IIO accelerometer device name, e.g. iio:device0 (default: autodetect)
    #[arg(long)]
    accelerometer: Option<String>,

    /// Minimum tilt magnitude treated as a deliberate orientation change
    #[arg(long)]
    threshold: Option<f64>,

    /// Accelerometer poll interval in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Consecutive confirming samples required before applying a change
    #[arg(long)]
    ticks: Option<u32>,

    /// Roll the committed orientation back when xrandr/xinput fail
    #[arg(long)]
    rollback_on_failure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output format (pretty, json, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// Log file path (logs to both file and stdout)
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sample config file
    GenerateConfig {
        /// Output file path
        #[arg(short, long, default_value = "autorotate.toml")]
        output: String,
    },
    /// Validate config without running
    ValidateConfig,
    /// Print the autodetected accelerometer and touchscreens
    ListDevices,
    /// Run the watcher (default)
    Run,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevicesConfig {
    /// xrandr display identifier
    #[serde(default = "default_display")]
    pub display: String,
    /// Touchscreen device names; an empty list means autodetect
    #[serde(default)]
    pub touchscreens: Vec<String>,
    /// IIO accelerometer name; empty means autodetect
    #[serde(default)]
    pub accelerometer: String,
}

fn default_display() -> String {
    ":0".to_string()
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            display: default_display(),
            touchscreens: Vec::new(),
            accelerometer: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Tilt threshold in scaled gravity units
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Accelerometer poll interval in milliseconds
    #[serde(default = "default_refresh_rate_ms")]
    pub refresh_rate_ms: u64,
    /// Debounce window: confirming samples beyond the initial proposal
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Roll back the committed orientation if applying it fails
    #[serde(default)]
    pub rollback_on_apply_failure: bool,
}

fn default_threshold() -> f64 {
    7.0
}

fn default_refresh_rate_ms() -> u64 {
    200
}

fn default_ticks() -> u32 {
    3
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            refresh_rate_ms: default_refresh_rate_ms(),
            ticks: default_ticks(),
            rollback_on_apply_failure: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: pretty, json, compact
    #[serde(default)]
    pub format: LogFormat,
    /// Optional log file path (logs to both file and stdout)
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (before parsing CLI args)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Handle subcommands
    match &cli.command {
        Some(Commands::GenerateConfig { output }) => {
            generate_sample_config(output)?;
            return Ok(());
        }
        Some(Commands::ValidateConfig) => {
            let config = load_config(&cli)?;
            println!("Configuration is valid:\n{:#?}", config);
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return list_devices().await;
        }
        Some(Commands::Run) | None => {
            // Continue to run the watcher
        }
    }

    // Load and merge configuration
    let config = load_config(&cli)?;

    // Setup tracing/logging
    setup_logging(&config, &cli)?;

    // Resolve devices: CLI flag > config file > autodetection
    let touchscreens = match cli.touchscreens.as_deref().filter(|s| !s.is_empty()) {
        Some(list) => list.split(',').map(str::to_string).collect(),
        None if !config.devices.touchscreens.is_empty() => config.devices.touchscreens.clone(),
        None => detect_touchscreens()
            .await
            .map_err(|e| format!("Cannot autodetect touchscreens: {e}"))?,
    };

    let accelerometer = match cli
        .accelerometer
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| Some(config.devices.accelerometer.clone()).filter(|s| !s.is_empty()))
    {
        Some(name) => name,
        None => detect_accelerometer()
            .await
            .map_err(|e| format!("Cannot autodetect accelerometer: {e}"))?,
    };

    let display = cli
        .display
        .clone()
        .unwrap_or_else(|| config.devices.display.clone());
    let threshold = cli.threshold.unwrap_or(config.detection.threshold);
    let refresh_rate_ms = cli.refresh_rate.unwrap_or(config.detection.refresh_rate_ms);
    let ticks = cli.ticks.unwrap_or(config.detection.ticks);
    let rollback = cli.rollback_on_failure || config.detection.rollback_on_apply_failure;

    let watch_config = AutorotateConfig {
        display: display.clone(),
        touchscreens: touchscreens.clone(),
        accelerometer,
        threshold,
        refresh_rate: Duration::from_millis(refresh_rate_ms),
        max_ticks: ticks,
        rollback_on_apply_failure: rollback,
    };

    info!(
        display = %watch_config.display,
        accelerometer = %watch_config.accelerometer,
        touchscreens = ?watch_config.touchscreens,
        threshold = %watch_config.threshold,
        refresh_rate_ms = refresh_rate_ms,
        ticks = ticks,
        rollback_on_apply_failure = rollback,
        "Starting autorotate"
    );

    let applier = XApplier::new(display, touchscreens);
    let mut watcher = Autorotate::new(watch_config, applier)
        .map_err(|e| format!("Invalid configuration: {e}"))?;

    watcher
        .watch()
        .await
        .map_err(|e| format!("Watcher error: {e}"))?;

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    match detect_accelerometer().await {
        Ok(name) => println!("Accelerometer: {name}"),
        Err(e) => println!("Accelerometer: none ({e})"),
    }
    match detect_touchscreens().await {
        Ok(names) => {
            println!("Touchscreens:");
            for name in names {
                println!("  {name}");
            }
        }
        Err(e) => println!("Touchscreens: none ({e})"),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config_path = &cli.config;
    if Path::new(config_path).exists() {
        let content = std::fs::read_to_string(config_path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    } else {
        // Return default config if file doesn't exist
        Ok(AppConfig::default())
    }
}

fn setup_logging(config: &AppConfig, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = cli.log_level.as_ref().unwrap_or(&config.logging.level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let format = cli
        .log_format
        .as_deref()
        .unwrap_or(match config.logging.format {
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
        });

    // Get log file path from CLI or config
    let log_file = cli.log_file.as_ref().or(config.logging.log_file.as_ref());

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        let file = Mutex::new(file);

        // When logging to file, use JSON format for both (easier to parse)
        let stdout_layer = tracing_subscriber::fmt::layer().json();
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .json();

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();

        eprintln!(
            "Logging to file: {} (using JSON format for both stdout and file)",
            log_path
        );
    } else {
        match format {
            "json" => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .json()
                    .init();
            }
            "compact" => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .compact()
                    .init();
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(false)
                    .init();
            }
        }
    }

    Ok(())
}

fn generate_sample_config(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let sample = AppConfig::default();
    let content = toml::to_string_pretty(&sample)?;

    let with_comments = format!(
        r#"# Autorotate Configuration
# See: autorotate --help
#
# Empty device entries mean autodetection: the first IIO device exposing
# accelerometer channels, and every xinput device matching the touchscreen
# keywords.

{}"#,
        content
    );

    std::fs::write(path, with_comments)?;
    println!("Sample config written to: {}", path);
    Ok(())
}
