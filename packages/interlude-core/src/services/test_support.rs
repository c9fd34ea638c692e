//! In-memory Sonos household for orchestration tests.
//!
//! `FakeSonos` keeps per-player transport and rendering state, applies every
//! command to it the way a player would, and records each call in order.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::sonos::soap::{SoapError, SoapResult};
use crate::sonos::traits::{SonosPlayback, SonosTopology, SonosVolumeControl};
use crate::sonos::types::{MediaInfo, PlayerEndpoint, PositionInfo, SeekTarget, TransportState};
use crate::utils::is_zero_duration;

/// One recorded client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetTransportInfo(String),
    GetMediaInfo(String),
    GetPositionInfo(String),
    SetAvTransportUri { ip: String, uri: String, metadata: String },
    Seek { ip: String, target: SeekTarget },
    Play(String),
    GetVolume(String),
    SetVolume { ip: String, volume: u8 },
    GetMute(String),
    SetMute { ip: String, mute: bool },
    GetZoneGroupState(String),
}

impl Call {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetTransportInfo(_) => "GetTransportInfo",
            Self::GetMediaInfo(_) => "GetMediaInfo",
            Self::GetPositionInfo(_) => "GetPositionInfo",
            Self::SetAvTransportUri { .. } => "SetAVTransportURI",
            Self::Seek { .. } => "Seek",
            Self::Play(_) => "Play",
            Self::GetVolume(_) => "GetVolume",
            Self::SetVolume { .. } => "SetVolume",
            Self::GetMute(_) => "GetMute",
            Self::SetMute { .. } => "SetMute",
            Self::GetZoneGroupState(_) => "GetZoneGroupState",
        }
    }
}

/// Simulated state of one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub transport: TransportState,
    pub media: MediaInfo,
    pub position: PositionInfo,
    pub volume: u8,
    pub muted: bool,
    /// Length of the player's queue, restored when the queue URI is set again.
    pub queue_len: u32,
    /// Duration reported for any non-queue content that gets loaded.
    pub loaded_duration: String,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            transport: TransportState::Stopped,
            media: MediaInfo::default(),
            position: PositionInfo {
                rel_time: "0:00:00".into(),
                track_duration: "0:00:00".into(),
                ..PositionInfo::default()
            },
            volume: 20,
            muted: false,
            queue_len: 0,
            loaded_duration: "0:00:00".into(),
        }
    }
}

impl PlayerState {
    /// A player playing `track` of a `queue_len` queue at `rel_time`.
    pub fn playing_queue(uuid: &str, track: u32, queue_len: u32, rel_time: &str) -> Self {
        Self {
            transport: TransportState::Playing,
            media: MediaInfo {
                nr_tracks: queue_len,
                current_uri: format!("x-rincon-queue:{}#0", uuid),
                current_uri_metadata: String::new(),
            },
            position: PositionInfo {
                track,
                track_duration: "0:04:00".into(),
                track_uri: format!("x-file-cifs://nas/music/{}.flac", track),
                rel_time: rel_time.into(),
                rel_time_ms: 0,
            },
            queue_len,
            ..Self::default()
        }
    }

    /// A group member linked to `coordinator_uuid`.
    pub fn joined(coordinator_uuid: &str) -> Self {
        Self {
            transport: TransportState::Playing,
            media: MediaInfo {
                nr_tracks: 1,
                current_uri: format!("x-rincon:{}", coordinator_uuid),
                current_uri_metadata: String::new(),
            },
            ..Self::default()
        }
    }
}

#[derive(Default)]
pub struct FakeSonos {
    players: Mutex<HashMap<String, PlayerState>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
    topology: Mutex<String>,
    topology_on_load: Mutex<HashMap<String, String>>,
}

impl FakeSonos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topology(xml: String) -> Self {
        let fake = Self::default();
        fake.set_topology(xml);
        fake
    }

    pub fn set_topology(&self, xml: String) {
        *self.topology.lock() = xml;
    }

    /// Switches the topology to `xml` whenever any player loads `uri`, the
    /// way a member leaves or rejoins a group.
    pub fn on_load(&self, uri: &str, xml: String) {
        self.topology_on_load.lock().insert(uri.to_string(), xml);
    }

    pub fn set_player(&self, ip: &str, state: PlayerState) {
        self.players.lock().insert(ip.to_string(), state);
    }

    pub fn player(&self, ip: &str) -> PlayerState {
        self.players.lock().get(ip).cloned().unwrap_or_default()
    }

    /// Makes every call of `action` fail with a permanent SOAP fault.
    pub fn fail(&self, action: &'static str) {
        self.failing.lock().insert(action);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.action() == action).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) -> SoapResult<()> {
        let action = call.action();
        self.calls.lock().push(call);
        if self.failing.lock().contains(action) {
            return Err(SoapError::Fault("UPnPError 402".into()));
        }
        Ok(())
    }

    fn with_player<T>(&self, ip: &str, f: impl FnOnce(&mut PlayerState) -> T) -> T {
        let mut players = self.players.lock();
        f(players.entry(ip.to_string()).or_default())
    }
}

/// Builds endpoints the way the topology parser would for tests that do not
/// go through XML.
pub fn endpoint(uuid: &str, host: &str, zone_name: &str) -> PlayerEndpoint {
    PlayerEndpoint {
        uuid: uuid.into(),
        host: host.into(),
        origin: format!("http://{}:1400", host),
        zone_name: zone_name.into(),
        invisible: false,
        channel_map: None,
    }
}

#[async_trait]
impl SonosPlayback for FakeSonos {
    async fn get_transport_info(&self, ip: &str) -> SoapResult<TransportState> {
        self.record(Call::GetTransportInfo(ip.into()))?;
        Ok(self.player(ip).transport)
    }

    async fn get_media_info(&self, ip: &str) -> SoapResult<MediaInfo> {
        self.record(Call::GetMediaInfo(ip.into()))?;
        Ok(self.player(ip).media)
    }

    async fn get_position_info(&self, ip: &str) -> SoapResult<PositionInfo> {
        self.record(Call::GetPositionInfo(ip.into()))?;
        Ok(self.player(ip).position)
    }

    async fn set_av_transport_uri(&self, ip: &str, uri: &str, metadata: &str) -> SoapResult<()> {
        self.record(Call::SetAvTransportUri {
            ip: ip.into(),
            uri: uri.into(),
            metadata: metadata.into(),
        })?;
        self.with_player(ip, |p| {
            let is_queue = uri.starts_with("x-rincon-queue:");
            p.transport = TransportState::Stopped;
            p.media = MediaInfo {
                nr_tracks: if is_queue { p.queue_len } else { 1 },
                current_uri: uri.into(),
                current_uri_metadata: metadata.into(),
            };
            p.position = PositionInfo {
                track: 1,
                track_duration: if is_queue { "0:04:00".into() } else { p.loaded_duration.clone() },
                track_uri: uri.into(),
                rel_time: "0:00:00".into(),
                rel_time_ms: 0,
            };
        });
        if let Some(xml) = self.topology_on_load.lock().get(uri) {
            self.set_topology(xml.clone());
        }
        Ok(())
    }

    async fn seek(&self, ip: &str, target: &SeekTarget) -> SoapResult<()> {
        self.record(Call::Seek {
            ip: ip.into(),
            target: target.clone(),
        })?;
        self.with_player(ip, |p| match target {
            SeekTarget::Track(n) if *n >= 1 && *n <= p.media.nr_tracks => {
                p.position.track = *n;
                p.position.rel_time = "0:00:00".into();
                Ok(())
            }
            SeekTarget::RelTime(t) if !is_zero_duration(&p.position.track_duration) => {
                p.position.rel_time = t.clone();
                Ok(())
            }
            _ => Err(SoapError::Fault("UPnPError 711".into())),
        })
    }

    async fn play(&self, ip: &str) -> SoapResult<()> {
        self.record(Call::Play(ip.into()))?;
        self.with_player(ip, |p| p.transport = TransportState::Playing);
        Ok(())
    }
}

#[async_trait]
impl SonosVolumeControl for FakeSonos {
    async fn get_speaker_volume(&self, speaker_ip: &str) -> SoapResult<u8> {
        self.record(Call::GetVolume(speaker_ip.into()))?;
        Ok(self.player(speaker_ip).volume)
    }

    async fn set_speaker_volume(&self, speaker_ip: &str, volume: u8) -> SoapResult<()> {
        self.record(Call::SetVolume {
            ip: speaker_ip.into(),
            volume,
        })?;
        self.with_player(speaker_ip, |p| p.volume = volume.min(100));
        Ok(())
    }

    async fn get_speaker_mute(&self, speaker_ip: &str) -> SoapResult<bool> {
        self.record(Call::GetMute(speaker_ip.into()))?;
        Ok(self.player(speaker_ip).muted)
    }

    async fn set_speaker_mute(&self, speaker_ip: &str, mute: bool) -> SoapResult<()> {
        self.record(Call::SetMute {
            ip: speaker_ip.into(),
            mute,
        })?;
        self.with_player(speaker_ip, |p| p.muted = mute);
        Ok(())
    }
}

#[async_trait]
impl SonosTopology for FakeSonos {
    async fn get_zone_group_state(&self, ip: &str) -> SoapResult<String> {
        self.record(Call::GetZoneGroupState(ip.into()))?;
        Ok(self.topology.lock().clone())
    }
}
