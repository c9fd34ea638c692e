//! Interlude Core - group snapshot, restore and notification orchestration
//! for Sonos households.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`sonos`]: Player control over UPnP/SOAP and topology parsing
//! - [`services`]: Topology resolution, snapshot/restore, notifications and
//!   the [`Household`] facade
//! - [`state`]: Orchestration configuration
//! - [`error`]: Centralized error types
//! - [`utils`]: `h:mm:ss` time conversion
//!
//! # Abstraction Traits
//!
//! Orchestrations depend on [`SonosClient`] (the combination of
//! [`SonosPlayback`], [`SonosVolumeControl`] and [`SonosTopology`]) rather
//! than on HTTP. [`SonosClientImpl`] is the production implementation.

#![warn(clippy::all)]

pub mod error;
pub mod protocol_constants;
pub mod services;
pub mod sonos;
pub mod state;
pub mod utils;

// Re-export commonly used types at the crate root
pub use error::{ErrorCode, InterludeError, InterludeResult, SoapResult};
pub use state::Config;
pub use utils::{hhmmss_to_millis, millis_to_hhmmss, TimeFormatError};

// Re-export Sonos types
pub use sonos::soap::SoapError;
pub use sonos::types::{
    Group, GroupLocation, MediaInfo, PlayerEndpoint, PositionInfo, SeekTarget, TransportState,
};
pub use sonos::{SonosClient, SonosClientImpl, SonosPlayback, SonosTopology, SonosVolumeControl};

// Re-export service types
pub use services::{
    create_group_snapshot, extract_group, get_all_groups, play_group_notification,
    play_joiner_notification, restore_group_snapshot, GroupDispatcher, Household, MemberState,
    NotificationOptions, PlayerSelector, Snapshot, SnapshotOptions,
};
