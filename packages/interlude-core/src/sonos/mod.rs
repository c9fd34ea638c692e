//! Sonos player control over UPnP/SOAP.
//!
//! # Module Structure
//!
//! - `types` - Domain types for players, groups and transport state
//! - `services` - UPnP service definitions (URNs, paths)
//! - `traits` - Trait abstractions for testability
//! - `client` - `SonosClientImpl` concrete trait implementation
//! - `zone_groups` - Zone group topology retrieval and parsing
//! - `didl` - DIDL-Lite metadata synthesis for bare URIs
//! - `playback` - AVTransport commands
//! - `volume` - Per-player volume and mute control
//! - `soap` - SOAP actions, envelopes and fault classification
//! - `utils` - Shared XML and URL helpers

pub mod client;
pub mod didl;
pub(crate) mod playback;
pub(crate) mod retry;
pub mod services;
pub mod soap;
pub mod traits;
pub mod types;
pub mod utils;
pub(crate) mod volume;
pub mod zone_groups;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export domain types
pub use services::SonosService;
pub use types::{
    Group, GroupLocation, MediaInfo, PlayerEndpoint, PositionInfo, SeekTarget, TransportState,
};

// Re-export trait abstractions
pub use traits::{SonosClient, SonosPlayback, SonosTopology, SonosVolumeControl};

// Re-export concrete implementation
pub use client::SonosClientImpl;
