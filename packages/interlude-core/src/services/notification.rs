//! Notification interruption: play a short clip over whatever a group is
//! doing, then put the group back.
//!
//! Each invocation is strictly sequential: capture, divert, wait, revert.
//! A failure during the wait or revert leaves the player on the notification;
//! there is no watchdog.

use std::time::Duration;

use futures::future::try_join_all;

use super::pipeline::{Plan, Step};
use crate::error::{InterludeError, InterludeResult, RemoteContext};
use crate::protocol_constants::{
    DEFAULT_NOTIFICATION_DURATION_SECS, GROUP_LINK_URI_PREFIX, NON_RECOVERABLE_URI_PREFIX,
};
use crate::sonos::didl::guess_metadata;
use crate::sonos::traits::SonosClient;
use crate::sonos::types::{MediaInfo, PlayerEndpoint, PositionInfo, SeekTarget};
use crate::state::Config;
use crate::utils::{hhmmss_to_millis, parse_hhmmss};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// What to play and how loud. Build with [`NotificationOptions::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOptions {
    pub uri: String,
    /// DIDL-Lite for `uri`; derived from the uri when absent.
    pub metadata: Option<String>,
    /// Volume to play at; `None` leaves volumes untouched.
    pub volume: Option<u8>,
    /// Apply `volume` to every member instead of the coordinator only.
    pub same_volume: bool,
    /// Derive the wait from the track duration the player reports.
    pub automatic_duration: bool,
    /// Wait used when no duration can be derived.
    pub duration: Duration,
}

impl NotificationOptions {
    pub fn builder(uri: impl Into<String>) -> NotificationOptionsBuilder {
        NotificationOptionsBuilder {
            uri: uri.into(),
            metadata: None,
            volume: None,
            same_volume: false,
            automatic_duration: true,
            duration: DurationSource::Fixed(Duration::from_secs(DEFAULT_NOTIFICATION_DURATION_SECS)),
        }
    }

    fn resolved_metadata(&self) -> String {
        self.metadata
            .clone()
            .unwrap_or_else(|| guess_metadata(&self.uri))
    }
}

#[derive(Debug, Clone)]
enum DurationSource {
    Fixed(Duration),
    Text(String),
}

/// Validating builder for [`NotificationOptions`].
#[derive(Debug, Clone)]
pub struct NotificationOptionsBuilder {
    uri: String,
    metadata: Option<String>,
    volume: Option<u32>,
    same_volume: bool,
    automatic_duration: bool,
    duration: DurationSource,
}

impl NotificationOptionsBuilder {
    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Target volume, 0-100.
    pub fn volume(mut self, volume: u32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn same_volume(mut self, same_volume: bool) -> Self {
        self.same_volume = same_volume;
        self
    }

    pub fn automatic_duration(mut self, automatic: bool) -> Self {
        self.automatic_duration = automatic;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = DurationSource::Fixed(duration);
        self
    }

    /// Fallback duration as `h:mm:ss`, parsed by [`build`](Self::build).
    pub fn duration_text(mut self, text: impl Into<String>) -> Self {
        self.duration = DurationSource::Text(text.into());
        self
    }

    /// # Errors
    /// `InvalidOption` for an empty uri, a volume above 100, or a duration
    /// that is not `h:mm:ss`.
    pub fn build(self) -> InterludeResult<NotificationOptions> {
        let invalid = |message: String| InterludeError::InvalidOption {
            operation: "notification_options",
            message,
        };

        if self.uri.trim().is_empty() {
            return Err(invalid("uri must not be empty".into()));
        }
        let volume = match self.volume {
            Some(v) => Some(u8::try_from(v).ok().filter(|v| *v <= 100).ok_or_else(|| {
                invalid(format!("volume must be 0-100, got {}", v))
            })?),
            None => None,
        };
        let duration = match self.duration {
            DurationSource::Fixed(d) => d,
            DurationSource::Text(text) => parse_hhmmss(&text).map_err(|e| invalid(e.to_string()))?,
        };

        Ok(NotificationOptions {
            uri: self.uri,
            metadata: self.metadata,
            volume,
            same_volume: self.same_volume,
            automatic_duration: self.automatic_duration,
            duration,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capture
// ─────────────────────────────────────────────────────────────────────────────

/// State read before diverting, enough to undo the notification.
#[derive(Debug, Clone)]
struct Captured {
    was_playing: bool,
    media: MediaInfo,
    position: Option<PositionInfo>,
    volumes: Vec<(String, u8)>,
}

async fn capture_volumes(
    client: &dyn SonosClient,
    operation: &'static str,
    players: &[&PlayerEndpoint],
) -> InterludeResult<Vec<(String, u8)>> {
    try_join_all(players.iter().map(|p| async move {
        let volume = client
            .get_speaker_volume(&p.host)
            .await
            .during(operation, "GetVolume")?;
        Ok::<_, InterludeError>((p.host.clone(), volume))
    }))
    .await
}

/// Players whose volume the notification changes.
fn volume_targets<'a>(
    members: &'a [PlayerEndpoint],
    options: &NotificationOptions,
) -> Vec<&'a PlayerEndpoint> {
    match options.volume {
        None => Vec::new(),
        Some(_) if options.same_volume => members.iter().collect(),
        Some(_) => members.iter().take(1).collect(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────────────────────────

fn divert_plan(
    operation: &'static str,
    ip: &str,
    targets: &[&PlayerEndpoint],
    options: &NotificationOptions,
    metadata: String,
) -> Plan {
    let mut plan = Plan::new(operation);
    plan.then(Step::SetTransportUri {
        ip: ip.to_string(),
        uri: options.uri.clone(),
        metadata,
    });
    if let Some(volume) = options.volume {
        plan.then_all(targets.iter().map(|p| Step::SetVolume {
            ip: p.host.clone(),
            volume,
        }));
    }
    plan.then(Step::Play { ip: ip.to_string() });
    plan
}

fn restore_volumes(plan: &mut Plan, captured: &Captured) {
    plan.then_all(captured.volumes.iter().map(|(ip, volume)| Step::SetVolume {
        ip: ip.clone(),
        volume: *volume,
    }));
}

/// Undo plan for a group notification played on the coordinator.
fn group_revert_plan(ip: &str, captured: &Captured, config: &Config) -> Plan {
    let mut plan = Plan::new("play_group_notification");
    restore_volumes(&mut plan, captured);

    let media = &captured.media;
    if media.current_uri.starts_with(NON_RECOVERABLE_URI_PREFIX) {
        log::info!(
            "[Notify] {} was on {}, leaving the notification loaded",
            ip,
            media.current_uri
        );
        return plan;
    }

    plan.then(Step::SetTransportUri {
        ip: ip.to_string(),
        uri: media.current_uri.clone(),
        metadata: media.current_uri_metadata.clone(),
    });

    if let Some(position) = &captured.position {
        if position.track > 1 && media.nr_tracks > 1 {
            plan.then_wait(config.settle_delay()).then_best_effort(Step::Seek {
                ip: ip.to_string(),
                target: SeekTarget::Track(position.track),
            });
        }
        if matches!(hhmmss_to_millis(&position.rel_time), Ok(ms) if ms > 0) {
            plan.then_wait(config.settle_delay()).then_best_effort(Step::Seek {
                ip: ip.to_string(),
                target: SeekTarget::RelTime(position.rel_time.clone()),
            });
        }
    }

    if captured.was_playing {
        plan.then(Step::Play { ip: ip.to_string() });
    }
    plan
}

/// Undo plan for a notification played on a single group member.
fn joiner_revert_plan(ip: &str, captured: &Captured) -> Plan {
    let mut plan = Plan::new("play_joiner_notification");
    restore_volumes(&mut plan, captured);
    plan.then(Step::SetTransportUri {
        ip: ip.to_string(),
        uri: captured.media.current_uri.clone(),
        metadata: captured.media.current_uri_metadata.clone(),
    });
    if captured.was_playing {
        plan.then(Step::Play { ip: ip.to_string() });
    }
    plan
}

// ─────────────────────────────────────────────────────────────────────────────
// Wait
// ─────────────────────────────────────────────────────────────────────────────

/// How long the notification plays before reverting.
///
/// With `automatic_duration` the player is asked for the loaded track's
/// length; a positive value plus the configured adjustment wins. Streams
/// report `0:00:00` and fall back to the explicit duration.
pub(crate) async fn notification_duration(
    client: &dyn SonosClient,
    operation: &'static str,
    ip: &str,
    options: &NotificationOptions,
    config: &Config,
) -> InterludeResult<Duration> {
    if !options.automatic_duration {
        return Ok(options.duration);
    }

    let position = client
        .get_position_info(ip)
        .await
        .during(operation, "GetPositionInfo")?;

    match hhmmss_to_millis(&position.track_duration) {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms) + config.duration_adjustment()),
        Ok(_) => Ok(options.duration),
        Err(e) => {
            log::debug!("[Notify] Reported duration unusable ({}), using fallback", e);
            Ok(options.duration)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrations
// ─────────────────────────────────────────────────────────────────────────────

/// Plays a notification on a whole group through its coordinator.
///
/// `members` must list the coordinator first. When `options.volume` is set
/// the coordinator (or every member with `same_volume`) plays at that volume
/// and is put back to its previous volume afterwards.
///
/// Content that cannot be re-established (`x-sonos-vli` line-in and TV
/// sources) is not restored and the group is not restarted.
///
/// # Errors
/// `InvalidOption` for an empty member list, otherwise the first failing
/// required step. Seeks while reverting are best effort.
pub async fn play_group_notification(
    client: &dyn SonosClient,
    members: &[PlayerEndpoint],
    options: &NotificationOptions,
    config: &Config,
) -> InterludeResult<()> {
    const OPERATION: &str = "play_group_notification";

    let coordinator = members.first().ok_or_else(|| InterludeError::InvalidOption {
        operation: OPERATION,
        message: "group has no members".into(),
    })?;
    let ip = coordinator.host.as_str();
    let metadata = options.resolved_metadata();

    let was_playing = client
        .get_transport_info(ip)
        .await
        .during(OPERATION, "GetTransportInfo")?
        .is_playing();
    let media = client.get_media_info(ip).await.during(OPERATION, "GetMediaInfo")?;
    let position = client
        .get_position_info(ip)
        .await
        .during(OPERATION, "GetPositionInfo")?;
    let targets = volume_targets(members, options);
    let volumes = capture_volumes(client, OPERATION, &targets).await?;
    let captured = Captured {
        was_playing,
        media,
        position: Some(position),
        volumes,
    };

    log::info!(
        "[Notify] {} ({}) -> {}",
        coordinator.zone_name,
        ip,
        options.uri
    );
    divert_plan(OPERATION, ip, &targets, options, metadata)
        .run(client)
        .await?;

    let wait = notification_duration(client, OPERATION, ip, options, config).await?;
    log::debug!("[Notify] Waiting {:?} before reverting {}", wait, ip);
    tokio::time::sleep(wait).await;

    group_revert_plan(ip, &captured, config).run(client).await?;
    log::debug!("[Notify] {} reverted to {}", ip, captured.media.current_uri);
    Ok(())
}

/// Plays a notification on one non-coordinator member only.
///
/// Loading the notification detaches `joiner` from its group. Afterwards its
/// captured transport uri (the `x-rincon:` link to the coordinator) is set
/// again, which rejoins it. The coordinator is only asked whether the group
/// is playing.
///
/// # Errors
/// The first failing required step.
pub async fn play_joiner_notification(
    client: &dyn SonosClient,
    coordinator: &PlayerEndpoint,
    joiner: &PlayerEndpoint,
    options: &NotificationOptions,
    config: &Config,
) -> InterludeResult<()> {
    const OPERATION: &str = "play_joiner_notification";

    let ip = joiner.host.as_str();
    let metadata = options.resolved_metadata();

    let was_playing = client
        .get_transport_info(&coordinator.host)
        .await
        .during(OPERATION, "GetTransportInfo")?
        .is_playing();
    let media = client.get_media_info(ip).await.during(OPERATION, "GetMediaInfo")?;
    if !media.current_uri.starts_with(GROUP_LINK_URI_PREFIX) {
        log::warn!(
            "[Notify] {} is not linked to {} (uri {}), restoring it as is",
            joiner.zone_name,
            coordinator.zone_name,
            media.current_uri
        );
    }
    let targets: Vec<&PlayerEndpoint> = if options.volume.is_some() {
        vec![joiner]
    } else {
        Vec::new()
    };
    let volumes = capture_volumes(client, OPERATION, &targets).await?;
    let captured = Captured {
        was_playing,
        media,
        position: None,
        volumes,
    };

    log::info!("[Notify] {} ({}) -> {}", joiner.zone_name, ip, options.uri);
    divert_plan(OPERATION, ip, &targets, options, metadata)
        .run(client)
        .await?;

    let wait = notification_duration(client, OPERATION, ip, options, config).await?;
    tokio::time::sleep(wait).await;

    joiner_revert_plan(ip, &captured).run(client).await?;
    log::debug!("[Notify] {} rejoined via {}", ip, captured.media.current_uri);
    Ok(())
}
