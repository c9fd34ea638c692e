//! AVTransport commands for Sonos players.
//!
//! Content changes and `Play` go through the transient-fault retry; queries
//! and seeks are sent once.

use reqwest::Client;

use crate::protocol_constants::ZERO_DURATION;
use crate::sonos::retry::with_retry;
use crate::sonos::soap::{SoapAction, SoapError, SoapResult};
use crate::sonos::types::{MediaInfo, PositionInfo, SeekTarget, TransportState};
use crate::sonos::utils::extract_xml_text;
use crate::utils::hhmmss_to_millis;

/// Gets the current transport state (`GetTransportInfo`).
pub async fn get_transport_info(client: &Client, ip: &str) -> SoapResult<TransportState> {
    let response = SoapAction::transport("GetTransportInfo").send(client, ip).await?;

    let state = extract_xml_text(&response, "CurrentTransportState")
        .ok_or_else(|| SoapError::missing("GetTransportInfo", "CurrentTransportState"))?;

    state
        .parse::<TransportState>()
        .map_err(|e| SoapError::Parse(e.to_string()))
}

/// Gets the content loaded on the transport (`GetMediaInfo`).
///
/// `NrTracks` and `CurrentURI` must be present; `CurrentURIMetaData` may be
/// empty. Metadata is returned entity-decoded, ready to be sent back verbatim.
pub async fn get_media_info(client: &Client, ip: &str) -> SoapResult<MediaInfo> {
    let response = SoapAction::transport("GetMediaInfo").send(client, ip).await?;

    let nr_tracks = extract_xml_text(&response, "NrTracks")
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| SoapError::missing("GetMediaInfo", "NrTracks"))?;
    let current_uri = extract_xml_text(&response, "CurrentURI")
        .ok_or_else(|| SoapError::missing("GetMediaInfo", "CurrentURI"))?;
    let current_uri_metadata =
        extract_xml_text(&response, "CurrentURIMetaData").unwrap_or_default();

    Ok(MediaInfo {
        nr_tracks,
        current_uri,
        current_uri_metadata,
    })
}

/// Gets the current playback position (`GetPositionInfo`).
///
/// # Note
/// `RelTime` and `TrackDuration` are in "H:MM:SS" format with second
/// precision. Streams report `0:00:00` for the duration, and some sources
/// report `NOT_IMPLEMENTED` for either field.
pub async fn get_position_info(client: &Client, ip: &str) -> SoapResult<PositionInfo> {
    let response = SoapAction::transport("GetPositionInfo").send(client, ip).await?;

    let track = extract_xml_text(&response, "Track")
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| SoapError::missing("GetPositionInfo", "Track"))?;

    let track_duration = extract_xml_text(&response, "TrackDuration").unwrap_or_default();
    let track_uri = extract_xml_text(&response, "TrackURI").unwrap_or_default();
    let rel_time = extract_xml_text(&response, "RelTime").unwrap_or_else(|| ZERO_DURATION.to_string());
    let rel_time_ms = hhmmss_to_millis(&rel_time).unwrap_or(0);

    Ok(PositionInfo {
        track,
        track_duration,
        track_uri,
        rel_time,
        rel_time_ms,
    })
}

/// Loads a URI (with DIDL-Lite metadata) onto the transport without playing it.
///
/// Setting an `x-rincon:` URI on a player joins it to that coordinator's group;
/// setting any other URI on a group member detaches it first.
pub async fn set_av_transport_uri(
    client: &Client,
    ip: &str,
    uri: &str,
    metadata: &str,
) -> SoapResult<()> {
    log::info!("[Sonos] SetAVTransportURI: ip={}, uri={}", ip, uri);

    let action = set_uri_action(uri, metadata);
    with_retry("SetAVTransportURI", || action.send(client, ip)).await?;

    Ok(())
}

/// Seeks to a track number or to a position inside the current track.
pub async fn seek(client: &Client, ip: &str, target: &SeekTarget) -> SoapResult<()> {
    log::debug!("[Sonos] Seek: ip={}, target={:?}", ip, target);

    seek_action(target).send(client, ip).await?;

    Ok(())
}

/// Sends a Play command for whatever is loaded on the transport.
pub async fn play(client: &Client, ip: &str) -> SoapResult<()> {
    log::info!("[Sonos] Sending Play command to {}", ip);

    let action = SoapAction::transport("Play").arg("Speed", "1");
    with_retry("Play", || action.send(client, ip)).await?;

    Ok(())
}

fn set_uri_action(uri: &str, metadata: &str) -> SoapAction {
    SoapAction::transport("SetAVTransportURI")
        .arg("CurrentURI", uri)
        .arg("CurrentURIMetaData", metadata)
}

fn seek_action(target: &SeekTarget) -> SoapAction {
    let (unit, value) = target.unit_and_target();
    SoapAction::transport("Seek")
        .arg("Unit", unit)
        .arg("Target", value)
}
