mod controller;
mod observer;
mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use controller::GyroController;
use observer::{Observer, ObserverHandle};
use replay::{PermissionMode, ReplaySource};
use skyview_config::AppConfig;
use skyview_input::gesture::CancellationMonitor;
use skyview_orientation::{OrientationSampler, SamplerSettings, SmoothingParams};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "skyview", version, about = "Phone orientation to sky-view direction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded event log and print the resulting view directions.
    Replay {
        /// JSON-lines event log.
        events: PathBuf,
        /// Config file to use instead of the default location.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Simulate a platform without the north-referenced orientation channel.
        #[arg(long)]
        relative_only: bool,
        /// How the orientation permission prompt is answered.
        #[arg(long, value_enum, default_value_t = PermissionMode::NotRequired)]
        permission: PermissionMode,
        /// Simulate a platform that cannot lock screen orientation.
        #[arg(long)]
        no_portrait_lock: bool,
    },
    /// Print the config file location and effective settings.
    Config,
    /// Write the default config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runtime sampler settings from the loaded config.
fn sampler_settings(config: &AppConfig) -> SamplerSettings {
    let smoothing = &config.orientation.smoothing;
    SamplerSettings {
        update_interval: Duration::from_millis(config.orientation.update_interval_ms),
        smoothing: SmoothingParams::new(
            smoothing.min_factor,
            smoothing.max_factor,
            smoothing.ramp_sharpness,
            smoothing.dead_zone_rad,
        ),
        ar_fov: config.ar.session_fov(),
    }
}

async fn replay_events(
    events: PathBuf,
    config: AppConfig,
    absolute: bool,
    permission: PermissionMode,
    portrait_lock: bool,
) -> Result<()> {
    let events = replay::load_events(&events)
        .with_context(|| format!("Failed to load {}", events.display()))?;
    info!(events = events.len(), "Event log loaded");

    let source = ReplaySource::new(absolute, permission, portrait_lock);
    let sampler = OrientationSampler::new(source, sampler_settings(&config));
    let monitor = CancellationMonitor::new(config.gesture.pan_threshold_px)
        .with_stop_callback(|reason| println!("-- orientation control cancelled: {reason:?}"));
    let mut controller = GyroController::new(sampler, monitor);
    let observer = ObserverHandle::new(Observer::default());

    let report = replay::run_replay(&mut controller, &observer, &events).await;
    if controller.is_active() {
        controller.stop();
    }

    println!();
    println!("sessions started   {}", report.sessions_started);
    println!("start failures     {}", report.start_failures);
    println!("applied            {}", report.applied);
    println!("apply failures     {}", report.apply_failures);
    println!("throttled          {}", report.throttled);
    println!("malformed          {}", report.malformed);
    println!("unheard            {}", report.unheard);
    println!("cancellations      {}", report.cancellations.len());
    if let Some(view) = report.final_view {
        println!(
            "final view         yaw {:.2}°  pitch {:.2}°  roll {:.2}°  fov {:.1}°",
            view.yaw.to_degrees(),
            view.pitch.to_degrees(),
            view.roll.to_degrees(),
            view.fov.to_degrees(),
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skyview=info,skyview_orientation=info,skyview_input=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            events,
            config,
            relative_only,
            permission,
            no_portrait_lock,
        } => {
            let loaded = match &config {
                Some(path) => skyview_config::load_config_from(path),
                None => skyview_config::load_config(),
            };
            let config = loaded.unwrap_or_else(|e| {
                warn!(?e, "Failed to load config, using defaults");
                AppConfig::default()
            });
            replay_events(events, config, !relative_only, permission, !no_portrait_lock).await
        }
        Command::Config => {
            let path = skyview_config::config_path()?;
            let config = skyview_config::load_config()?;
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::InitConfig { force } => {
            let path = skyview_config::config_path()?;
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let path = skyview_config::save_config(&AppConfig::default())?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
