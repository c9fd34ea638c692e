//! Orchestration services.
//!
//! Everything here talks to players only through the
//! [`SonosClient`](crate::sonos::SonosClient) trait.
//!
//! - `topology` - Group discovery and player lookup
//! - `snapshot` - Group state capture and restore
//! - `notification` - Notification interruption for groups and single members
//! - `pipeline` - Ordered command plans with best-effort steps
//! - `dispatch` - Per-player serialization
//! - `household` - Facade tying the above together

pub mod dispatch;
pub mod household;
pub mod notification;
pub mod pipeline;
pub mod snapshot;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatch::{DispatchGuard, GroupDispatcher};
pub use household::{Household, PlayerSelector};
pub use notification::{
    play_group_notification, play_joiner_notification, NotificationOptions,
    NotificationOptionsBuilder,
};
pub use pipeline::{best_effort, FailurePolicy, Plan, Step};
pub use snapshot::{
    create_group_snapshot, restore_group_snapshot, restore_plan, MemberState, Snapshot,
    SnapshotOptions,
};
pub use topology::{extract_group, get_all_groups};
