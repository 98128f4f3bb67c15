//! Beelight: adaptive backlight daemon and its command-line client.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  IioLightSensor   TrackedBacklight<SysfsBacklight>             │
//! │  (SensorPort)     (BacklightPort, external-change polling)     │
//! │  CsvHistory       LogEventSink     SystemClock                 │
//! │  (HistoryPort)    (EventSink)      (unix time)                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            BrightnessService (decision loop)           │    │
//! │  │  AdaptiveBinModel · HysteresisGate · TransitionStepper │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  auto-loop thread · watcher thread · command socket            │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use tracing_subscriber::{EnvFilter, fmt};

use beelight::adapters::hardware::HardwareAdapter;
use beelight::adapters::history::CsvHistory;
use beelight::adapters::log_sink::LogEventSink;
use beelight::adapters::sysfs::{BACKLIGHT_CLASS_DIR, IIO_DEVICES_DIR, IioLightSensor, SysfsBacklight};
use beelight::adapters::time::SystemClock;
use beelight::adapters::tracked::TrackedBacklight;
use beelight::app::commands::{Command, Response};
use beelight::app::ports::BacklightPort;
use beelight::app::service::BrightnessService;
use beelight::config::{SystemConfig, config_dir};
use beelight::daemon::{self, Core, Timings};
use beelight::ipc;

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "BEELIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Run the brightness daemon
    Daemon,
    /// Set brightness to a percentage (0-100)
    Set { percent: f64 },
    /// Print the current brightness percentage
    Get,
    /// Toggle automatic mode
    Toggle,
    /// Print ambient light, brightness and mode
    Stats,
    /// Print an example config file
    ExampleConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if matches!(args.command, Action::ExampleConfig) {
        print!("{}", SystemConfig::example_toml());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir().join("config.toml"));
    let config = match SystemConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: Failed to load config {}: {e}", config_path.display());
            eprintln!();
            eprintln!("Example config:\n\n{}", SystemConfig::example_toml());
            bail!("invalid configuration");
        }
    };

    match args.command {
        Action::Daemon => run_daemon(&config),
        Action::Set { percent } => client(&config, &Command::SetBrightness { percent }),
        Action::Get => client(&config, &Command::GetBrightness),
        Action::Toggle => client(&config, &Command::ToggleAuto),
        Action::Stats => client(&config, &Command::GetStats),
        Action::ExampleConfig => Ok(()),
    }
}

fn run_daemon(config: &SystemConfig) -> Result<()> {
    let clock = SystemClock;

    let device = match &config.backlight_dir {
        Some(dir) => SysfsBacklight::open(dir),
        None => SysfsBacklight::discover(Path::new(BACKLIGHT_CLASS_DIR)),
    }
    .context("Failed to open backlight")?;
    let sensor = match &config.ambient_sensor_path {
        Some(path) => IioLightSensor::open(path),
        None => IioLightSensor::discover(Path::new(IIO_DEVICES_DIR)),
    }
    .context("Failed to open ambient light sensor")?;

    let backlight = TrackedBacklight::new(device);
    let range = daemon::resolve_range(config, backlight.max_raw())
        .context("Unusable brightness range")?;

    let now = clock.now();
    let store = CsvHistory::new(config.resolved_history_path());
    let mut sink = LogEventSink::new();
    let mut service = BrightnessService::new(config, range, now);
    let seeded = service
        .seed(&store, now)
        .with_context(|| format!("Failed to read history {}", store.path().display()))?;
    service.start(seeded, &mut sink);

    let socket = config.resolved_socket_path();
    let listener = ipc::bind(&socket)
        .with_context(|| format!("Failed to bind command socket {}", socket.display()))?;
    info!("Listening on {}", socket.display());

    let watched = backlight.clone();
    let hw = HardwareAdapter::new(sensor, backlight);
    let core = Core::new(service, hw, store, sink, now);
    daemon::run(core, watched, &listener, Timings::from_config(config))
        .context("Daemon thread failed to start")
}

fn client(config: &SystemConfig, cmd: &Command) -> Result<()> {
    let socket = config.resolved_socket_path();
    let response = ipc::send(&socket, cmd).context("Is the daemon running?")?;
    match response {
        Response::Ok => {}
        Response::Brightness { percent } => println!("{percent:.1}"),
        Response::AutoMode { enabled } => {
            println!("auto mode {}", if enabled { "on" } else { "off" });
        }
        Response::Stats(s) => {
            println!("ambient:    {}", s.ambient);
            println!("brightness: {:.1}%", s.brightness_percent);
            println!("auto mode:  {}", if s.auto_mode { "on" } else { "off" });
        }
        Response::Error { message } => bail!("daemon: {message}"),
    }
    Ok(())
}
