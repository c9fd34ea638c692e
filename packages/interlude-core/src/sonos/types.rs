//! Sonos domain types for players, groups and transport state.
//!
//! Everything here is rebuilt from the device on every query. Nothing is cached
//! between orchestrations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Transport State
// ─────────────────────────────────────────────────────────────────────────────

/// Playback transport state of a Sonos player, as reported by AVTransport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
    Transitioning,
    NoMediaPresent,
}

impl TransportState {
    /// Whether the group counts as "playing" for restore purposes.
    ///
    /// A group caught mid-transition is treated as playing so that it is
    /// resumed afterwards.
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing | Self::Transitioning)
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
            Self::Stopped => write!(f, "Stopped"),
            Self::Transitioning => write!(f, "Transitioning"),
            Self::NoMediaPresent => write!(f, "NoMediaPresent"),
        }
    }
}

/// Error returned when parsing an unknown transport state string.
#[derive(Debug, Clone, Error)]
#[error("unknown transport state: {0}")]
pub struct ParseTransportStateError(pub String);

impl std::str::FromStr for TransportState {
    type Err = ParseTransportStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAYING" => Ok(Self::Playing),
            "PAUSED_PLAYBACK" | "PAUSED" => Ok(Self::Paused),
            "STOPPED" => Ok(Self::Stopped),
            "TRANSITIONING" => Ok(Self::Transitioning),
            "NO_MEDIA_PRESENT" => Ok(Self::NoMediaPresent),
            _ => Err(ParseTransportStateError(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AVTransport Responses
// ─────────────────────────────────────────────────────────────────────────────

/// Content currently loaded on a player's transport (`GetMediaInfo`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Number of tracks in the loaded content (1 for streams).
    pub nr_tracks: u32,
    /// Transport URI (queue, stream, `x-rincon:` group link, ...).
    pub current_uri: String,
    /// DIDL-Lite metadata for the transport URI, already entity-decoded.
    pub current_uri_metadata: String,
}

/// Position within the current track (`GetPositionInfo`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    /// 1-based track number (0 when nothing is loaded).
    pub track: u32,
    /// Track length as `h:mm:ss`. `0:00:00` for streams.
    pub track_duration: String,
    pub track_uri: String,
    /// Elapsed time as `h:mm:ss`.
    pub rel_time: String,
    /// `rel_time` in milliseconds, `0` if it did not parse.
    pub rel_time_ms: u64,
}

/// Target of an AVTransport `Seek`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekTarget {
    /// Jump to a 1-based track number (`Unit=TRACK_NR`).
    Track(u32),
    /// Jump to a position inside the current track (`Unit=REL_TIME`).
    RelTime(String),
}

impl SeekTarget {
    /// Returns the `(Unit, Target)` SOAP argument pair.
    #[must_use]
    pub fn unit_and_target(&self) -> (&'static str, String) {
        match self {
            Self::Track(n) => ("TRACK_NR", n.to_string()),
            Self::RelTime(t) => ("REL_TIME", t.clone()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Topology
// ─────────────────────────────────────────────────────────────────────────────

/// One physical Sonos player as declared in the zone group topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEndpoint {
    /// Unique device id in `RINCON_xxxxx` format.
    pub uuid: String,
    /// Connection host (IP address) taken from the device Location.
    pub host: String,
    /// Base network address, e.g. `http://192.168.1.50:1400`.
    pub origin: String,
    /// User-configured room name.
    pub zone_name: String,
    /// Hidden players such as the second speaker of a stereo pair.
    pub invisible: bool,
    /// Stereo-pair bonding (`ChannelMapSet`), if any.
    pub channel_map: Option<String>,
}

/// A zone group with its coordinator always first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Zone group identifier.
    pub id: String,
    /// Visible members; `members[0]` is the coordinator.
    pub members: Vec<PlayerEndpoint>,
}

impl Group {
    /// The player that accepts transport and content commands for the group.
    #[must_use]
    pub fn coordinator(&self) -> Option<&PlayerEndpoint> {
        self.members.first()
    }
}

/// Where a player sits inside the household topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLocation {
    pub group_id: String,
    /// Index of the queried player within `members`.
    pub player_index: usize,
    /// Always `0`.
    pub coordinator_index: usize,
    pub members: Vec<PlayerEndpoint>,
}

impl GroupLocation {
    #[must_use]
    pub fn coordinator(&self) -> &PlayerEndpoint {
        &self.members[self.coordinator_index]
    }

    #[must_use]
    pub fn player(&self) -> &PlayerEndpoint {
        &self.members[self.player_index]
    }

    /// Whether the queried player is the group coordinator.
    #[must_use]
    pub fn is_coordinator(&self) -> bool {
        self.player_index == self.coordinator_index
    }
}
