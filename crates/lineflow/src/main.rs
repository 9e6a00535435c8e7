//! Lineflow - Per-segment control for modular line light fixtures
//!
//! Command-line front end: pairs with the controller, inspects the layout
//! and groups, and drives the segments.

mod config;
mod logging_setup;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lineflow_control::{
    pair_within, DeviceSession, Integration, DEFAULT_API_PORT, PAIRING_TIMEOUT,
};
use lineflow_core::Rgb;
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "lineflow",
    version,
    about = "Per-segment control for modular line light fixtures"
)]
struct Args {
    /// Config file (default: <config_dir>/lineflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request an access token and store it in the config file
    Pair {
        /// Controller address
        host: String,
        #[arg(long, default_value_t = DEFAULT_API_PORT)]
        port: u16,
    },
    /// Print the fixture layout
    Layout,
    /// Print segments and groups, optionally replacing the manual groups
    Groups {
        /// Manual groups as segment indices in layout order, e.g. "0,1,2; 3,4,5"
        #[arg(long)]
        set: Option<String>,
    },
    /// Switch the fixture on
    On {
        /// Global brightness, 0-100
        #[arg(long)]
        brightness: Option<u16>,
    },
    /// Switch the fixture off
    Off,
    /// Paint segments with one colour
    Fill {
        /// Colour as "r,g,b"
        #[arg(value_parser = parse_rgb)]
        color: Rgb,
        /// Segment indices in layout order (default: all)
        #[arg(long, value_delimiter = ',')]
        segments: Vec<usize>,
        /// Transition in seconds
        #[arg(long, default_value_t = 0.0)]
        transition: f64,
    },
    /// Set up all lights and poll the device until Ctrl-C
    Run,
}

fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected r,g,b, got '{}'", s));
    };
    let channel = |v: &str| {
        v.parse::<u8>()
            .map_err(|_| format!("'{}' is not a colour channel (0-255)", v))
    };
    Ok(Rgb::new(channel(*r)?, channel(*g)?, channel(*b)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => AppConfig::default_path().context("No config directory on this platform")?,
    };
    let mut config = AppConfig::load(&config_path)?;

    let _log_guard = logging_setup::init(&config.logging, args.verbose, &config_path)?;

    match args.command {
        Command::Pair { host, port } => {
            println!("Hold the power button on the controller for 5-7 seconds until the LEDs flash.");
            let token = pair_within(&host, port, PAIRING_TIMEOUT * 2, Duration::from_secs(2))
                .await
                .context("Pairing failed")?;

            config.device.host = host;
            config.device.port = port;
            config.device.token = token;
            config.save(&config_path)?;
            println!("Paired. Token saved to {}", config_path.display());
        }
        Command::Layout => {
            let session = DeviceSession::connect_reliable_only(config.device_config()?).await?;
            let report = session.layout_report().await?;

            println!("Components: {}", report.total_components());
            for (shape, count) in &report.shape_counts {
                println!("  {:<14} ({:>2}): {}", shape.label(), u16::from(*shape), count);
            }
            if let Some((x, y)) = report.centroid {
                println!("Centroid: ({:.1}, {:.1})", x, y);
            }
            println!("Segments by angle:");
            for panel in &report.panels {
                println!(
                    "  id {:>5}  x {:>8.1}  y {:>8.1}  o {:>5.1}  angle {:>6.2}",
                    panel.id, panel.x, panel.y, panel.orientation, panel.angle
                );
            }
        }
        Command::Groups { set } => {
            if let Some(manual) = set {
                config
                    .set_manual_groups(&manual)
                    .context("Config not changed")?;
                config.save(&config_path)?;
                println!("Manual groups saved: {}", config.groups.manual);
            }

            let options = config.integration_options()?;
            let session = DeviceSession::connect_reliable_only(config.device_config()?).await?;

            println!("Segments (layout order):");
            for (index, panel) in session.panels().iter().enumerate() {
                println!("  {:>2}: id {:>5}  angle {:>6.2}", index, panel.id, panel.angle);
            }
            let groups = session.groups(options.manual_groups.as_ref(), options.group_size);
            let mode = if options.manual_groups.is_some() { "manual" } else { "by angle" };
            println!("Groups ({}):", mode);
            for group in &groups {
                println!("  Group {}: {:?}", group.index + 1, group.panel_ids);
            }
        }
        Command::On { brightness } => {
            let session = DeviceSession::connect_reliable_only(config.device_config()?).await?;
            session.set_state(Some(true), brightness).await?;
        }
        Command::Off => {
            let session = DeviceSession::connect_reliable_only(config.device_config()?).await?;
            session.set_state(Some(false), None).await?;
        }
        Command::Fill {
            color,
            segments,
            transition,
        } => {
            let integration =
                Integration::setup(config.device_config()?, config.integration_options()?).await?;
            let targets: Vec<(usize, Rgb)> = if segments.is_empty() {
                (0..integration.segments().len()).map(|i| (i, color)).collect()
            } else {
                segments.into_iter().map(|i| (i, color)).collect()
            };
            let delivery = integration
                .coordinator()
                .set_multiple_segments(targets, transition)
                .await;
            if !delivery.is_sent() {
                warn!("Colour command not delivered: {:?}", delivery);
            }
            println!("{:?}", delivery);
        }
        Command::Run => {
            let integration =
                Integration::setup(config.device_config()?, config.integration_options()?).await?;
            for light in integration.segments() {
                info!("{} ({})", light.name(), light.unique_id());
            }
            for group in integration.groups() {
                info!("{} ({}) {:?}", group.name(), group.unique_id(), group.group().panel_ids);
            }

            let coordinator = integration.coordinator();
            let mut updates = coordinator.subscribe();
            let polling = coordinator.spawn_polling();

            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if let Some(snapshot) = updates.borrow().as_ref() {
                            info!(
                                "Device {} brightness {:?}",
                                if snapshot.state.is_on() { "on" } else { "off" },
                                snapshot.state.brightness()
                            );
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutting down");
                        break;
                    }
                }
            }
            polling.abort();
        }
    }

    Ok(())
}
