//! Interlude - command-line front end for Sonos group snapshots and
//! notifications.
//!
//! Every command reads the household topology through one reachable player
//! (`--player`), then acts on the group of the selected player.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use interlude_core::utils::parse_hhmmss;
use interlude_core::{Household, NotificationOptions, PlayerSelector, SnapshotOptions};
use serde::Serialize;

use crate::config::CliConfig;

/// Interlude - snapshot, restore and interrupt Sonos groups.
#[derive(Parser, Debug)]
#[command(name = "interlude")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "INTERLUDE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Any reachable player, used to read the topology (overrides config file).
    #[arg(short, long, env = "INTERLUDE_PLAYER")]
    player: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every group in the household.
    Groups,

    /// Print the group a player belongs to.
    Locate(Target),

    /// Capture a group's playback state and print it.
    Snapshot {
        #[command(flatten)]
        target: Target,

        /// Capture member volumes.
        #[arg(long)]
        volumes: bool,

        /// Capture member mute states.
        #[arg(long)]
        mutes: bool,

        /// Restore the snapshot after this long (h:mm:ss).
        #[arg(long, value_name = "H:MM:SS")]
        restore_after: Option<String>,
    },

    /// Interrupt a group (or a single member) with a notification.
    Notify {
        #[command(flatten)]
        target: Target,

        /// Notification URI.
        #[arg(long)]
        uri: String,

        /// DIDL-Lite metadata (guessed from the URI when omitted).
        #[arg(long)]
        metadata: Option<String>,

        /// Volume to play the notification at (0-100).
        #[arg(long)]
        volume: Option<u32>,

        /// Apply the volume to every group member.
        #[arg(long)]
        same_volume: bool,

        /// Fallback duration (h:mm:ss).
        #[arg(long, value_name = "H:MM:SS")]
        duration: Option<String>,

        /// Always wait the fallback duration instead of asking the player.
        #[arg(long)]
        no_automatic_duration: bool,
    },
}

/// Player to act on.
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct Target {
    /// Player host (IP address).
    #[arg(long)]
    host: Option<String>,

    /// Player zone name.
    #[arg(long)]
    name: Option<String>,
}

impl Target {
    fn selector(&self) -> Result<PlayerSelector> {
        match (&self.host, &self.name) {
            (Some(host), _) => Ok(PlayerSelector::Host(host.clone())),
            (None, Some(name)) => Ok(PlayerSelector::Name(name.clone())),
            (None, None) => bail!("either --host or --name is required"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::debug!("Interlude v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(player) = args.player {
        config.player = Some(player);
    }

    let seed = seed_host(&config, &args.command)?;
    let core_config = config.to_core_config();
    log::debug!(
        "Configuration: player={}, settle_delay_ms={}, duration_adjustment_ms={}, soap_timeout_secs={}",
        seed,
        core_config.settle_delay_ms,
        core_config.duration_adjustment_ms,
        core_config.soap_timeout_secs
    );

    let household =
        Household::connect(seed, core_config).context("Failed to set up Sonos client")?;

    run(&household, args.command).await
}

/// Picks the player used for topology queries: `--player`, the config file,
/// or the `--host` of the command itself.
fn seed_host(config: &CliConfig, command: &Command) -> Result<String> {
    if let Some(player) = &config.player {
        return Ok(player.clone());
    }
    let target = match command {
        Command::Groups => None,
        Command::Locate(target)
        | Command::Snapshot { target, .. }
        | Command::Notify { target, .. } => Some(target),
    };
    target
        .and_then(|t| t.host.clone())
        .context("No player to query. Pass --player, set INTERLUDE_PLAYER, or add `player:` to the config file.")
}

async fn run(household: &Household, command: Command) -> Result<()> {
    match command {
        Command::Groups => {
            let groups = household.groups().await.context("Failed to read topology")?;
            print_json(&groups)
        }
        Command::Locate(target) => {
            let location = household
                .locate(&target.selector()?)
                .await
                .context("Failed to locate player")?;
            print_json(&location)
        }
        Command::Snapshot {
            target,
            volumes,
            mutes,
            restore_after,
        } => {
            let restore_after = restore_after
                .as_deref()
                .map(parse_hhmmss)
                .transpose()
                .context("Invalid --restore-after")?;
            let options = SnapshotOptions {
                snap_volumes: volumes,
                snap_mutestates: mutes,
            };

            let snapshot = household
                .snapshot(&target.selector()?, options)
                .await
                .context("Failed to capture snapshot")?;
            print_json(&snapshot)?;

            if let Some(delay) = restore_after {
                log::info!("Restoring in {:?}", delay);
                tokio::time::sleep(delay).await;
                household
                    .restore(&snapshot)
                    .await
                    .context("Failed to restore snapshot")?;
                log::info!("Snapshot restored");
            }
            Ok(())
        }
        Command::Notify {
            target,
            uri,
            metadata,
            volume,
            same_volume,
            duration,
            no_automatic_duration,
        } => {
            let mut builder = NotificationOptions::builder(uri)
                .same_volume(same_volume)
                .automatic_duration(!no_automatic_duration);
            if let Some(metadata) = metadata {
                builder = builder.metadata(metadata);
            }
            if let Some(volume) = volume {
                builder = builder.volume(volume);
            }
            if let Some(duration) = duration {
                builder = builder.duration_text(duration);
            }
            let options = builder.build().context("Invalid notification options")?;

            let started = tokio::time::Instant::now();
            household
                .notify(&target.selector()?, &options)
                .await
                .context("Notification failed")?;
            log::info!("Notification finished after {}", format_elapsed(started.elapsed()));
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}
