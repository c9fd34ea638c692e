//! Household topology resolution.
//!
//! Topology is fetched fresh for every request. Any player answers for the
//! whole household, so callers only need one reachable host.

use crate::error::{InterludeError, InterludeResult, RemoteContext};
use crate::sonos::traits::SonosClient;
use crate::sonos::types::{Group, GroupLocation};
use crate::sonos::zone_groups::parse_zone_group_state;

/// Fetches and parses every zone group in the household.
///
/// Each returned group lists its coordinator first and contains visible
/// members only.
///
/// # Errors
/// `Remote` if the player cannot be queried, `Parse` if the topology document
/// lacks an expected element or attribute.
pub async fn get_all_groups(client: &dyn SonosClient, host: &str) -> InterludeResult<Vec<Group>> {
    const OPERATION: &str = "get_all_groups";

    let xml = client
        .get_zone_group_state(host)
        .await
        .during(OPERATION, "GetZoneGroupState")?;
    let groups = parse_zone_group_state(&xml).during(OPERATION, "GetZoneGroupState")?;

    log::debug!("[Topology] {} group(s) reported by {}", groups.len(), host);
    Ok(groups)
}

/// Locates a player within `groups`.
///
/// A `name_hint` takes precedence and matches the zone name exactly; without
/// one, `host_hint` is compared with each member's connection host. The first
/// match wins.
///
/// # Errors
/// `NotFound` if no visible member matches.
pub fn extract_group(
    host_hint: &str,
    groups: &[Group],
    name_hint: Option<&str>,
) -> InterludeResult<GroupLocation> {
    for group in groups {
        let members: Vec<_> = group.members.iter().filter(|m| !m.invisible).cloned().collect();
        let found = members.iter().position(|m| match name_hint {
            Some(name) => m.zone_name == name,
            None => m.host == host_hint,
        });

        if let Some(player_index) = found {
            return Ok(GroupLocation {
                group_id: group.id.clone(),
                player_index,
                coordinator_index: 0,
                members,
            });
        }
    }

    Err(InterludeError::NotFound {
        operation: "extract_group",
        player: name_hint.unwrap_or(host_hint).to_string(),
    })
}
