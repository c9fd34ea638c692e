//! Group snapshot capture and restore.
//!
//! A [`Snapshot`] records what a group was playing, where it was, and
//! optionally each member's volume and mute state. Restoring replays that
//! state through an ordered [`Plan`].
//!
//! Topology is assumed unchanged between capture and restore. The functions
//! here do not check it; [`Household::restore`](super::household::Household::restore)
//! does.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::pipeline::{Plan, Step};
use crate::error::{InterludeError, InterludeResult, RemoteContext};
use crate::sonos::traits::SonosClient;
use crate::sonos::types::{PlayerEndpoint, SeekTarget};
use crate::state::Config;
use crate::utils::is_zero_duration;

/// Which optional per-member state to capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotOptions {
    pub snap_volumes: bool,
    pub snap_mutestates: bool,
}

/// Captured state of one group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberState {
    pub player: PlayerEndpoint,
    /// `None` when volumes were not captured.
    pub volume: Option<u8>,
    /// `None` when mute states were not captured.
    pub muted: Option<bool>,
}

/// Point-in-time playback state of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub was_playing: bool,
    pub current_uri: String,
    pub current_uri_metadata: String,
    pub nr_tracks: u32,
    pub track: u32,
    pub rel_time: String,
    pub track_duration: String,
    /// Members in group order; `members[0]` is the coordinator.
    pub members: Vec<MemberState>,
}

impl Snapshot {
    #[must_use]
    pub fn coordinator(&self) -> Option<&PlayerEndpoint> {
        self.members.first().map(|m| &m.player)
    }

    /// Member uuids in group order.
    pub fn member_uuids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.player.uuid.as_str())
    }
}

/// Captures the playback state of a group.
///
/// `members` must list the coordinator first, as returned by
/// [`extract_group`](super::topology::extract_group). Member volume and mute
/// reads run concurrently; the coordinator's transport, media and position
/// are read afterwards.
///
/// # Errors
/// `InvalidOption` for an empty member list. Any failed read fails the whole
/// snapshot.
pub async fn create_group_snapshot(
    client: &dyn SonosClient,
    members: &[PlayerEndpoint],
    options: SnapshotOptions,
) -> InterludeResult<Snapshot> {
    const OPERATION: &str = "create_group_snapshot";

    let coordinator = members.first().ok_or_else(|| InterludeError::InvalidOption {
        operation: OPERATION,
        message: "group has no members".into(),
    })?;

    let member_states = try_join_all(members.iter().map(|player| async move {
        let volume = if options.snap_volumes {
            Some(
                client
                    .get_speaker_volume(&player.host)
                    .await
                    .during(OPERATION, "GetVolume")?,
            )
        } else {
            None
        };
        let muted = if options.snap_mutestates {
            Some(
                client
                    .get_speaker_mute(&player.host)
                    .await
                    .during(OPERATION, "GetMute")?,
            )
        } else {
            None
        };
        Ok::<_, InterludeError>(MemberState {
            player: player.clone(),
            volume,
            muted,
        })
    }))
    .await?;

    let host = coordinator.host.as_str();
    let transport = client
        .get_transport_info(host)
        .await
        .during(OPERATION, "GetTransportInfo")?;

    let (media, position) = tokio::try_join!(
        async { client.get_media_info(host).await.during(OPERATION, "GetMediaInfo") },
        async { client.get_position_info(host).await.during(OPERATION, "GetPositionInfo") },
    )?;

    log::debug!(
        "[Snapshot] {} ({}): {} track {}/{} at {}",
        coordinator.zone_name,
        host,
        transport,
        position.track,
        media.nr_tracks,
        position.rel_time
    );

    Ok(Snapshot {
        was_playing: transport.is_playing(),
        current_uri: media.current_uri,
        current_uri_metadata: media.current_uri_metadata,
        nr_tracks: media.nr_tracks,
        track: position.track,
        rel_time: position.rel_time,
        track_duration: position.track_duration,
        members: member_states,
    })
}

/// Builds the command sequence that puts a group back into `snapshot`.
///
/// Content is set first and playback resumed last. Both seeks are best
/// effort; every other step is required.
///
/// # Errors
/// `InvalidOption` if the snapshot has no members.
pub fn restore_plan(snapshot: &Snapshot, config: &Config) -> InterludeResult<Plan> {
    let coordinator = snapshot.coordinator().ok_or_else(|| InterludeError::InvalidOption {
        operation: "restore_group_snapshot",
        message: "snapshot has no members".into(),
    })?;
    let ip = coordinator.host.clone();
    let mut plan = Plan::new("restore_group_snapshot");

    plan.then(Step::SetTransportUri {
        ip: ip.clone(),
        uri: snapshot.current_uri.clone(),
        metadata: snapshot.current_uri_metadata.clone(),
    });

    if snapshot.track >= 1 && snapshot.track <= snapshot.nr_tracks {
        plan.then_wait(config.settle_delay()).then_best_effort(Step::Seek {
            ip: ip.clone(),
            target: SeekTarget::Track(snapshot.track),
        });
    }

    if !snapshot.rel_time.is_empty() && !is_zero_duration(&snapshot.track_duration) {
        plan.then_wait(config.settle_delay()).then_best_effort(Step::Seek {
            ip: ip.clone(),
            target: SeekTarget::RelTime(snapshot.rel_time.clone()),
        });
    }

    let rendering = snapshot.members.iter().flat_map(|m| {
        let volume = m.volume.map(|volume| Step::SetVolume {
            ip: m.player.host.clone(),
            volume,
        });
        let mute = m.muted.map(|mute| Step::SetMute {
            ip: m.player.host.clone(),
            mute,
        });
        volume.into_iter().chain(mute)
    });
    plan.then_all(rendering.collect::<Vec<_>>());

    if snapshot.was_playing {
        plan.then(Step::Play { ip });
    }

    Ok(plan)
}

/// Restores a group to a previously captured snapshot.
///
/// # Errors
/// The first failing required step. Seek failures are logged only.
pub async fn restore_group_snapshot(
    client: &dyn SonosClient,
    snapshot: &Snapshot,
    config: &Config,
) -> InterludeResult<()> {
    let plan = restore_plan(snapshot, config)?;
    plan.run(client).await?;

    log::debug!(
        "[Snapshot] Restored {} member(s) to {}",
        snapshot.members.len(),
        snapshot.current_uri
    );
    Ok(())
}
