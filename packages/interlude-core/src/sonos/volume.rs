//! Per-player volume and mute control (RenderingControl, Master channel).
//!
//! Group volume is deliberately not used: snapshots record and restore every
//! member individually.

use reqwest::Client;

use crate::sonos::soap::{SoapAction, SoapError, SoapResult};
use crate::sonos::utils::extract_xml_text;

/// Gets volume from an individual player (0-100).
pub async fn get_speaker_volume(client: &Client, speaker_ip: &str) -> SoapResult<u8> {
    let response = SoapAction::rendering("GetVolume").send(client, speaker_ip).await?;

    parse_volume(&response)
}

/// Sets volume on an individual player (0-100, values > 100 are clamped).
pub async fn set_speaker_volume(client: &Client, speaker_ip: &str, volume: u8) -> SoapResult<()> {
    let clamped = volume.min(100);

    SoapAction::rendering("SetVolume")
        .arg("DesiredVolume", clamped.to_string())
        .send(client, speaker_ip)
        .await?;

    Ok(())
}

/// Gets mute state from an individual player.
pub async fn get_speaker_mute(client: &Client, speaker_ip: &str) -> SoapResult<bool> {
    let response = SoapAction::rendering("GetMute").send(client, speaker_ip).await?;

    parse_mute(&response)
}

/// Sets mute state on an individual player.
pub async fn set_speaker_mute(client: &Client, speaker_ip: &str, mute: bool) -> SoapResult<()> {
    mute_action(mute).send(client, speaker_ip).await?;

    Ok(())
}

fn mute_action(mute: bool) -> SoapAction {
    SoapAction::rendering("SetMute").arg("DesiredMute", if mute { "1" } else { "0" })
}

fn parse_volume(response: &str) -> SoapResult<u8> {
    extract_xml_text(response, "CurrentVolume")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| SoapError::missing("GetVolume", "CurrentVolume"))
}

fn parse_mute(response: &str) -> SoapResult<bool> {
    extract_xml_text(response, "CurrentMute")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .ok_or_else(|| SoapError::missing("GetMute", "CurrentMute"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sonos::services::SonosService;

    #[test]
    fn parses_volume_response() {
        let xml = r#"<s:Envelope><s:Body><u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>27</CurrentVolume></u:GetVolumeResponse></s:Body></s:Envelope>"#;
        assert_eq!(parse_volume(xml).unwrap(), 27);
    }

    #[test]
    fn volume_response_without_value_is_parse_error() {
        let xml = "<s:Envelope><s:Body><u:GetVolumeResponse/></s:Body></s:Envelope>";
        assert!(matches!(parse_volume(xml), Err(SoapError::Parse(_))));
    }

    #[test]
    fn parses_mute_response() {
        let muted = "<u:GetMuteResponse><CurrentMute>1</CurrentMute></u:GetMuteResponse>";
        let unmuted = "<u:GetMuteResponse><CurrentMute>0</CurrentMute></u:GetMuteResponse>";
        assert!(parse_mute(muted).unwrap());
        assert!(!parse_mute(unmuted).unwrap());
    }

    #[test]
    fn unmute_sends_zero_on_master_channel() {
        let action = mute_action(false);

        assert_eq!(action.service(), SonosService::RenderingControl);
        assert_eq!(action.name(), "SetMute");
        assert_eq!(action.args()[1], ("Channel", "Master".to_string()));
        assert_eq!(action.args()[2], ("DesiredMute", "0".to_string()));
    }
}
