//! Trait abstractions for Sonos operations.
//!
//! The orchestration services depend on these traits rather than on the HTTP
//! client, so every snapshot, restore and notification sequence can be driven
//! against an in-memory double.

use async_trait::async_trait;

use crate::sonos::soap::SoapResult;
use crate::sonos::types::{MediaInfo, PositionInfo, SeekTarget, TransportState};

/// AVTransport operations.
///
/// Content, seek and play commands must target the group coordinator, except
/// for the joiner flow which deliberately addresses a single member.
#[async_trait]
pub trait SonosPlayback: Send + Sync {
    /// Current transport state of the player.
    async fn get_transport_info(&self, ip: &str) -> SoapResult<TransportState>;

    /// Content loaded on the transport (URI, metadata, track count).
    async fn get_media_info(&self, ip: &str) -> SoapResult<MediaInfo>;

    /// Current track number, track duration and elapsed time.
    async fn get_position_info(&self, ip: &str) -> SoapResult<PositionInfo>;

    /// Loads content onto the transport without starting playback.
    ///
    /// # Arguments
    /// * `uri` - Raw transport URI (escaped by the SOAP layer)
    /// * `metadata` - Raw DIDL-Lite, may be empty
    async fn set_av_transport_uri(&self, ip: &str, uri: &str, metadata: &str) -> SoapResult<()>;

    /// Seeks to a track or to a position inside the current track.
    async fn seek(&self, ip: &str, target: &SeekTarget) -> SoapResult<()>;

    /// Starts playback of whatever is loaded.
    async fn play(&self, ip: &str) -> SoapResult<()>;
}

/// Per-player volume and mute (RenderingControl).
#[async_trait]
pub trait SonosVolumeControl: Send + Sync {
    /// Gets a player's volume (0-100).
    async fn get_speaker_volume(&self, speaker_ip: &str) -> SoapResult<u8>;

    /// Sets a player's volume (0-100, values > 100 are clamped).
    async fn set_speaker_volume(&self, speaker_ip: &str, volume: u8) -> SoapResult<()>;

    /// Gets a player's mute state.
    async fn get_speaker_mute(&self, speaker_ip: &str) -> SoapResult<bool>;

    /// Sets a player's mute state.
    async fn set_speaker_mute(&self, speaker_ip: &str, mute: bool) -> SoapResult<()>;
}

/// Household topology query.
#[async_trait]
pub trait SonosTopology: Send + Sync {
    /// Returns the decoded ZoneGroupState XML as seen by `ip`.
    ///
    /// Any player in the household can answer for all groups.
    async fn get_zone_group_state(&self, ip: &str) -> SoapResult<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Combined trait for all Sonos operations used by the orchestrations.
#[async_trait]
pub trait SonosClient: SonosPlayback + SonosTopology + SonosVolumeControl {}

/// Blanket implementation for any type implementing all traits.
impl<T: SonosPlayback + SonosTopology + SonosVolumeControl> SonosClient for T {}
