//! Zone group topology retrieval and parsing.
//!
//! `GetZoneGroupState` returns the whole household topology as an
//! entity-encoded XML blob. The parser here is strict: a missing element or
//! attribute fails the whole parse rather than producing partial groups.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;

use crate::sonos::soap::{SoapAction, SoapError, SoapResult};
use crate::sonos::types::{Group, PlayerEndpoint};
use crate::sonos::utils::{
    extract_ip_from_location, extract_origin_from_location, extract_xml_text, get_xml_attr,
};

/// Fetches the decoded ZoneGroupState XML from any player in the household.
pub async fn get_zone_group_state(client: &Client, ip: &str) -> SoapResult<String> {
    let response = SoapAction::topology("GetZoneGroupState")
        .send(client, ip)
        .await?;

    extract_xml_text(&response, "ZoneGroupState")
        .ok_or_else(|| SoapError::missing("GetZoneGroupState", "ZoneGroupState"))
}

/// Accumulates one `<ZoneGroup>` while its members are read.
struct GroupBuilder {
    id: String,
    coordinator_uuid: String,
    coordinator: Option<PlayerEndpoint>,
    others: Vec<PlayerEndpoint>,
}

impl GroupBuilder {
    fn start(e: &BytesStart) -> SoapResult<Self> {
        Ok(Self {
            id: required_attr(e, b"ID", "ZoneGroup")?,
            coordinator_uuid: required_attr(e, b"Coordinator", "ZoneGroup")?,
            coordinator: None,
            others: Vec::new(),
        })
    }

    fn add(&mut self, member: PlayerEndpoint) {
        if member.uuid == self.coordinator_uuid {
            self.coordinator = Some(member);
        } else {
            self.others.push(member);
        }
    }

    /// Builds the group with the coordinator first and invisible members removed.
    ///
    /// Returns `Ok(None)` for groups led by an invisible device (zone bridges),
    /// which cannot play audio.
    fn finish(self) -> SoapResult<Option<Group>> {
        let coordinator = self.coordinator.ok_or_else(|| {
            SoapError::Parse(format!(
                "ZoneGroup {} declares coordinator {} but has no such member",
                self.id, self.coordinator_uuid
            ))
        })?;

        if coordinator.invisible {
            log::debug!("[Topology] Skipping group {} led by invisible {}", self.id, coordinator.uuid);
            return Ok(None);
        }

        let mut members = Vec::with_capacity(self.others.len() + 1);
        members.push(coordinator);
        members.extend(self.others.into_iter().filter(|m| !m.invisible));

        Ok(Some(Group {
            id: self.id,
            members,
        }))
    }
}

/// Parses decoded ZoneGroupState XML into groups.
///
/// Accepts both `<ZoneGroupState><ZoneGroups>...` and a bare `<ZoneGroups>`
/// root. `Satellite` children (home theater surrounds and subs) are not group
/// members. Zone bridges count as invisible.
///
/// # Errors
/// `SoapError::Parse` when `ZoneGroups` is absent, a group or member lacks a
/// required attribute, a Location has no host, or a group's coordinator is
/// not among its members.
pub fn parse_zone_group_state(xml: &str) -> SoapResult<Vec<Group>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut saw_zone_groups = false;
    let mut current: Option<GroupBuilder> = None;
    let mut groups = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"ZoneGroups" => saw_zone_groups = true,
                b"ZoneGroup" => current = Some(GroupBuilder::start(e)?),
                b"ZoneGroupMember" => add_member(&mut current, e)?,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"ZoneGroups" => saw_zone_groups = true,
                b"ZoneGroup" => groups.extend(GroupBuilder::start(e)?.finish()?),
                b"ZoneGroupMember" => add_member(&mut current, e)?,
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"ZoneGroup" => {
                if let Some(builder) = current.take() {
                    groups.extend(builder.finish()?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SoapError::Parse(format!("malformed ZoneGroupState: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_zone_groups {
        return Err(SoapError::Parse("ZoneGroupState has no ZoneGroups element".into()));
    }

    Ok(groups)
}

fn add_member(current: &mut Option<GroupBuilder>, e: &BytesStart) -> SoapResult<()> {
    let builder = current
        .as_mut()
        .ok_or_else(|| SoapError::Parse("ZoneGroupMember outside of a ZoneGroup".into()))?;
    builder.add(parse_member(e)?);
    Ok(())
}

fn parse_member(e: &BytesStart) -> SoapResult<PlayerEndpoint> {
    let uuid = required_attr(e, b"UUID", "ZoneGroupMember")?;
    let location = required_attr(e, b"Location", "ZoneGroupMember")?;
    let zone_name = required_attr(e, b"ZoneName", "ZoneGroupMember")?;

    let (host, origin) = extract_ip_from_location(&location)
        .zip(extract_origin_from_location(&location))
        .ok_or_else(|| {
            SoapError::Parse(format!("member {} has unusable Location {}", uuid, location))
        })?;

    let invisible = get_xml_attr(e, b"Invisible").as_deref() == Some("1")
        || get_xml_attr(e, b"IsZoneBridge").as_deref() == Some("1");

    Ok(PlayerEndpoint {
        uuid,
        host,
        origin,
        zone_name,
        invisible,
        channel_map: get_xml_attr(e, b"ChannelMapSet"),
    })
}

fn required_attr(e: &BytesStart, name: &[u8], element: &str) -> SoapResult<String> {
    get_xml_attr(e, name).ok_or_else(|| {
        SoapError::Parse(format!(
            "{} is missing attribute {}",
            element,
            String::from_utf8_lossy(name)
        ))
    })
}
