//! Household facade: one entry point per orchestration, serialized per player.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::dispatch::{DispatchGuard, GroupDispatcher};
use super::notification::{play_group_notification, play_joiner_notification, NotificationOptions};
use super::snapshot::{create_group_snapshot, restore_group_snapshot, Snapshot, SnapshotOptions};
use super::topology::{extract_group, get_all_groups};
use crate::error::{InterludeError, InterludeResult};
use crate::sonos::client::SonosClientImpl;
use crate::sonos::traits::SonosClient;
use crate::sonos::types::{Group, GroupLocation};
use crate::state::Config;

/// Times a player may move to another group while its locks are awaited.
const MAX_LOCATE_ATTEMPTS: usize = 3;

/// How a caller identifies a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerSelector {
    /// Connection host, e.g. `192.168.1.50`.
    Host(String),
    /// Zone name, e.g. `Kitchen`.
    Name(String),
}

impl std::fmt::Display for PlayerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(host) => write!(f, "host {}", host),
            Self::Name(name) => write!(f, "zone {:?}", name),
        }
    }
}

/// A Sonos household reached through one seed player.
///
/// Topology is re-read for every call. Orchestrations that touch the same
/// coordinator or player wait for each other, and the selected player is
/// located again once its locks are held.
pub struct Household {
    client: Arc<dyn SonosClient>,
    config: Config,
    seed_host: String,
    dispatcher: GroupDispatcher,
}

impl Household {
    /// Creates a household over an existing client.
    ///
    /// # Errors
    /// `InvalidOption` if `config` fails validation.
    pub fn new(
        client: Arc<dyn SonosClient>,
        seed_host: impl Into<String>,
        config: Config,
    ) -> InterludeResult<Self> {
        validate(&config)?;
        Ok(Self {
            client,
            config,
            seed_host: seed_host.into(),
            dispatcher: GroupDispatcher::new(),
        })
    }

    /// Creates a household with an HTTP client honouring the configured SOAP
    /// timeout.
    ///
    /// # Errors
    /// `InvalidOption` for an invalid config or an HTTP client that cannot be
    /// built.
    pub fn connect(seed_host: impl Into<String>, config: Config) -> InterludeResult<Self> {
        validate(&config)?;
        let client = SonosClientImpl::with_timeout(config.soap_timeout()).map_err(|e| {
            InterludeError::InvalidOption {
                operation: "connect",
                message: format!("cannot build HTTP client: {}", e),
            }
        })?;
        Self::new(Arc::new(client), seed_host, config)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    pub async fn groups(&self) -> InterludeResult<Vec<Group>> {
        get_all_groups(self.client.as_ref(), &self.seed_host).await
    }

    /// Finds the group a player belongs to.
    pub async fn locate(&self, selector: &PlayerSelector) -> InterludeResult<GroupLocation> {
        let groups = self.groups().await?;
        match selector {
            PlayerSelector::Host(host) => extract_group(host, &groups, None),
            PlayerSelector::Name(name) => extract_group(&self.seed_host, &groups, Some(name)),
        }
    }

    /// Locks the selected player and its coordinator, then locates it again.
    ///
    /// Retries when the player changed groups while the locks were awaited.
    async fn lock_location(
        &self,
        selector: &PlayerSelector,
        operation: &'static str,
    ) -> InterludeResult<(DispatchGuard, GroupLocation)> {
        let mut location = self.locate(selector).await?;
        for _ in 0..MAX_LOCATE_ATTEMPTS {
            let guard = self.dispatcher.lock(lock_keys(&location)).await;
            let current = self.locate(selector).await?;
            if guard.covers(lock_keys(&current)) {
                return Ok((guard, current));
            }
            log::debug!(
                "[Household] {} moved from {} to {} while waiting, locking again",
                selector,
                location.group_id,
                current.group_id
            );
            location = current;
        }
        Err(InterludeError::Precondition {
            operation,
            message: format!("group of {} kept changing", selector),
        })
    }

    /// Captures the state of the selected player's group.
    pub async fn snapshot(
        &self,
        selector: &PlayerSelector,
        options: SnapshotOptions,
    ) -> InterludeResult<Snapshot> {
        let (_guard, location) = self.lock_location(selector, "create_group_snapshot").await?;
        create_group_snapshot(self.client.as_ref(), &location.members, options).await
    }

    /// Restores a snapshot after checking the group still has the same
    /// members.
    ///
    /// # Errors
    /// `Precondition` when the snapshot's coordinator no longer leads a group
    /// or the group's membership changed since capture.
    pub async fn restore(&self, snapshot: &Snapshot) -> InterludeResult<()> {
        const OPERATION: &str = "restore_group_snapshot";

        let coordinator = snapshot.coordinator().ok_or_else(|| InterludeError::InvalidOption {
            operation: OPERATION,
            message: "snapshot has no members".into(),
        })?;
        let _guard = self.dispatcher.lock(snapshot.member_uuids()).await;

        let groups = self.groups().await?;
        let group = groups
            .iter()
            .find(|g| g.coordinator().is_some_and(|c| c.uuid == coordinator.uuid))
            .ok_or_else(|| InterludeError::Precondition {
                operation: OPERATION,
                message: format!("{} no longer coordinates a group", coordinator.uuid),
            })?;

        let mut captured: Vec<&str> = snapshot.member_uuids().collect();
        let mut live: Vec<&str> = group.members.iter().map(|m| m.uuid.as_str()).collect();
        captured.sort_unstable();
        live.sort_unstable();
        if captured != live {
            return Err(InterludeError::Precondition {
                operation: OPERATION,
                message: format!(
                    "group {} changed since snapshot: was [{}], now [{}]",
                    group.id,
                    captured.join(", "),
                    live.join(", ")
                ),
            });
        }

        restore_group_snapshot(self.client.as_ref(), snapshot, &self.config).await
    }

    /// Plays a notification on the selected player.
    ///
    /// A coordinator interrupts its whole group; any other member plays the
    /// notification alone and rejoins afterwards.
    pub async fn notify(
        &self,
        selector: &PlayerSelector,
        options: &NotificationOptions,
    ) -> InterludeResult<()> {
        let (_guard, location) = self.lock_location(selector, "notification").await?;
        let client = self.client.as_ref();

        log::info!(
            "[Household] Notification for {} in group {}",
            selector,
            location.group_id
        );

        if location.is_coordinator() {
            play_group_notification(client, &location.members, options, &self.config).await
        } else {
            play_joiner_notification(
                client,
                location.coordinator(),
                location.player(),
                options,
                &self.config,
            )
            .await
        }
    }
}

/// Players an orchestration on `location` must hold.
fn lock_keys(location: &GroupLocation) -> [&str; 2] {
    [
        location.coordinator().uuid.as_str(),
        location.player().uuid.as_str(),
    ]
}

fn validate(config: &Config) -> InterludeResult<()> {
    config
        .validate()
        .map_err(|message| InterludeError::InvalidOption {
            operation: "config",
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{Call, FakeSonos, PlayerState};
    use crate::sonos::test_fixtures::{group_xml, household_xml, member_xml, zone_group_state_xml};
    use crate::sonos::types::TransportState;

    const A: &str = "192.168.1.10";
    const B: &str = "192.168.1.11";

    fn setup() -> (Arc<FakeSonos>, Household) {
        let fake = Arc::new(FakeSonos::with_topology(household_xml()));
        fake.set_player(A, PlayerState::playing_queue("RINCON_A", 2, 4, "0:00:42"));
        fake.set_player(B, PlayerState::joined("RINCON_A"));
        let household = Household::new(fake.clone(), A, Config::default()).unwrap();
        (fake, household)
    }

    fn set_uri_hosts(fake: &FakeSonos) -> Vec<String> {
        fake.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetAvTransportUri { ip, .. } => Some(ip),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let fake = Arc::new(FakeSonos::new());
        let config = Config {
            soap_timeout_secs: 0,
            ..Config::default()
        };
        let err = Household::new(fake, A, config).err().unwrap();
        assert!(matches!(err, InterludeError::InvalidOption { operation: "config", .. }));
    }

    #[tokio::test]
    async fn locate_by_name_and_host() {
        let (_, household) = setup();

        let by_name = household
            .locate(&PlayerSelector::Name("Porch".into()))
            .await
            .unwrap();
        assert_eq!(by_name.group_id, "RINCON_C:7");
        assert_eq!(by_name.player_index, 2);

        let by_host = household
            .locate(&PlayerSelector::Host(B.into()))
            .await
            .unwrap();
        assert_eq!(by_host.group_id, "RINCON_A:1");
        assert!(!by_host.is_coordinator());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_and_restore_through_facade() {
        let (fake, household) = setup();
        let snapshot = household
            .snapshot(
                &PlayerSelector::Host(B.into()),
                SnapshotOptions {
                    snap_volumes: true,
                    snap_mutestates: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(snapshot.coordinator().map(|c| c.uuid.as_str()), Some("RINCON_A"));

        household.restore(&snapshot).await.unwrap();
        assert_eq!(fake.player(A).transport, TransportState::Playing);
        assert_eq!(fake.player(A).position.track, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_refuses_changed_group() {
        let (fake, household) = setup();
        let snapshot = household
            .snapshot(&PlayerSelector::Host(A.into()), SnapshotOptions::default())
            .await
            .unwrap();

        // B left the group
        fake.set_topology(zone_group_state_xml(&[
            group_xml("RINCON_A:1", "RINCON_A", &[member_xml("RINCON_A", A, "Kitchen")]),
            group_xml("RINCON_B:2", "RINCON_B", &[member_xml("RINCON_B", B, "Bedroom")]),
        ]));
        fake.clear_calls();

        let err = household.restore(&snapshot).await.unwrap_err();
        assert!(matches!(err, InterludeError::Precondition { .. }));
        assert_eq!(fake.count("SetAVTransportURI"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn coordinator_notification_targets_group() {
        let (fake, household) = setup();
        let options = NotificationOptions::builder("http://10.0.0.5/chime.mp3")
            .build()
            .unwrap();

        household
            .notify(&PlayerSelector::Name("Kitchen".into()), &options)
            .await
            .unwrap();

        assert_eq!(set_uri_hosts(&fake), [A, A]);
    }

    #[tokio::test(start_paused = true)]
    async fn member_notification_targets_joiner() {
        let (fake, household) = setup();
        let options = NotificationOptions::builder("http://10.0.0.5/chime.mp3")
            .build()
            .unwrap();

        household
            .notify(&PlayerSelector::Name("Bedroom".into()), &options)
            .await
            .unwrap();

        assert_eq!(set_uri_hosts(&fake), [B, B]);
        assert_eq!(fake.player(B).media.current_uri, "x-rincon:RINCON_A");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_member_notification_waits_for_rejoin() {
        let (fake, household) = setup();
        let chime = "http://10.0.0.5/chime.mp3";
        // Loading the chime detaches B into its own group; rejoining restores it
        fake.on_load(
            chime,
            zone_group_state_xml(&[
                group_xml("RINCON_A:1", "RINCON_A", &[member_xml("RINCON_A", A, "Kitchen")]),
                group_xml("RINCON_B:9", "RINCON_B", &[member_xml("RINCON_B", B, "Bedroom")]),
            ]),
        );
        fake.on_load("x-rincon:RINCON_A", household_xml());
        let options = NotificationOptions::builder(chime).build().unwrap();
        let bedroom = PlayerSelector::Name("Bedroom".into());

        let (first, second) = tokio::join!(
            household.notify(&bedroom, &options),
            household.notify(&bedroom, &options),
        );
        first.unwrap();
        second.unwrap();

        let loads: Vec<(String, String)> = fake
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetAvTransportUri { ip, uri, .. } => Some((ip, uri)),
                _ => None,
            })
            .collect();
        let expected = [chime, "x-rincon:RINCON_A", chime, "x-rincon:RINCON_A"];
        assert_eq!(loads.len(), expected.len(), "{:?}", loads);
        for ((ip, uri), want) in loads.iter().zip(expected) {
            assert_eq!(ip, B);
            assert_eq!(uri, want);
        }
        assert_eq!(fake.player(B).media.current_uri, "x-rincon:RINCON_A");
        assert_eq!(fake.player(A).position.track, 2);
    }

    #[tokio::test]
    async fn config_is_held_as_given() {
        let config = Config {
            settle_delay_ms: 250,
            ..Config::default()
        };
        let household = Household::new(Arc::new(FakeSonos::new()), A, config.clone()).unwrap();
        assert_eq!(household.config(), &config);
        assert_eq!(household.seed_host(), A);
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let (_, household) = setup();
        let err = household
            .locate(&PlayerSelector::Name("Attic".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, InterludeError::NotFound { .. }));
    }
}
