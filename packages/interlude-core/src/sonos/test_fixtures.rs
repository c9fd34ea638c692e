//! Shared test fixtures for topology and AVTransport payloads.

/// Builds a visible ZoneGroupMember element.
pub fn member_xml(uuid: &str, ip: &str, zone_name: &str) -> String {
    format!(
        r#"<ZoneGroupMember UUID="{uuid}" Location="http://{ip}:1400/xml/device_description.xml" ZoneName="{zone_name}" Icon="x-rincon-roomicon:living"/>"#
    )
}

/// Wraps members into a ZoneGroup element.
pub fn group_xml(id: &str, coordinator_uuid: &str, members: &[String]) -> String {
    format!(
        r#"<ZoneGroup Coordinator="{coordinator_uuid}" ID="{id}">{}</ZoneGroup>"#,
        members.join("")
    )
}

/// Wraps groups into the decoded ZoneGroupState document.
pub fn zone_group_state_xml(groups: &[String]) -> String {
    format!(
        "<ZoneGroupState><ZoneGroups>{}</ZoneGroups><VanishedDevices/></ZoneGroupState>",
        groups.join("")
    )
}

/// Two groups: `[A(coord), B]` and `[C(coord), D, E(192.168.1.50)]`, with a
/// hidden stereo partner of C that must never show up.
pub fn household_xml() -> String {
    zone_group_state_xml(&[
        group_xml(
            "RINCON_A:1",
            "RINCON_A",
            &[
                member_xml("RINCON_B", "192.168.1.11", "Bedroom"),
                member_xml("RINCON_A", "192.168.1.10", "Kitchen"),
            ],
        ),
        group_xml(
            "RINCON_C:7",
            "RINCON_C",
            &[
                member_xml("RINCON_C", "192.168.1.30", "Living Room"),
                r#"<ZoneGroupMember UUID="RINCON_C2" Location="http://192.168.1.31:1400/xml/device_description.xml" ZoneName="Living Room" Invisible="1"/>"#.to_string(),
                member_xml("RINCON_D", "192.168.1.40", "Office"),
                member_xml("RINCON_E", "192.168.1.50", "Porch"),
            ],
        ),
    ])
}
