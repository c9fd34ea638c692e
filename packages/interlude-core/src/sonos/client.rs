//! Concrete Sonos client over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::sonos::soap::SoapResult;
use crate::sonos::traits::{SonosPlayback, SonosTopology, SonosVolumeControl};
use crate::sonos::types::{MediaInfo, PositionInfo, SeekTarget, TransportState};
use crate::sonos::{playback, volume, zone_groups};

/// Concrete implementation of the Sonos client traits.
///
/// Wraps the free functions in `playback`, `volume` and `zone_groups` to
/// provide an injectable interface. Cloning is cheap; the HTTP connection
/// pool is shared.
#[derive(Clone)]
pub struct SonosClientImpl {
    /// HTTP client for Sonos communication.
    client: Client,
}

impl std::fmt::Debug for SonosClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonosClientImpl")
            .field("client", &"Client")
            .finish()
    }
}

impl SonosClientImpl {
    /// Creates a new SonosClientImpl with the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a client whose every SOAP request is bounded by `timeout`.
    ///
    /// # Errors
    /// Returns the reqwest error if the HTTP client cannot be built (TLS
    /// backend initialisation).
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl SonosPlayback for SonosClientImpl {
    async fn get_transport_info(&self, ip: &str) -> SoapResult<TransportState> {
        playback::get_transport_info(&self.client, ip).await
    }

    async fn get_media_info(&self, ip: &str) -> SoapResult<MediaInfo> {
        playback::get_media_info(&self.client, ip).await
    }

    async fn get_position_info(&self, ip: &str) -> SoapResult<PositionInfo> {
        playback::get_position_info(&self.client, ip).await
    }

    async fn set_av_transport_uri(&self, ip: &str, uri: &str, metadata: &str) -> SoapResult<()> {
        playback::set_av_transport_uri(&self.client, ip, uri, metadata).await
    }

    async fn seek(&self, ip: &str, target: &SeekTarget) -> SoapResult<()> {
        playback::seek(&self.client, ip, target).await
    }

    async fn play(&self, ip: &str) -> SoapResult<()> {
        playback::play(&self.client, ip).await
    }
}

#[async_trait]
impl SonosVolumeControl for SonosClientImpl {
    async fn get_speaker_volume(&self, speaker_ip: &str) -> SoapResult<u8> {
        volume::get_speaker_volume(&self.client, speaker_ip).await
    }

    async fn set_speaker_volume(&self, speaker_ip: &str, volume: u8) -> SoapResult<()> {
        volume::set_speaker_volume(&self.client, speaker_ip, volume).await
    }

    async fn get_speaker_mute(&self, speaker_ip: &str) -> SoapResult<bool> {
        volume::get_speaker_mute(&self.client, speaker_ip).await
    }

    async fn set_speaker_mute(&self, speaker_ip: &str, mute: bool) -> SoapResult<()> {
        volume::set_speaker_mute(&self.client, speaker_ip, mute).await
    }
}

#[async_trait]
impl SonosTopology for SonosClientImpl {
    async fn get_zone_group_state(&self, ip: &str) -> SoapResult<String> {
        zone_groups::get_zone_group_state(&self.client, ip).await
    }
}
