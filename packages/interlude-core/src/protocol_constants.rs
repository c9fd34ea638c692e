//! Fixed protocol constants and tuned defaults.
//!
//! The first section is dictated by Sonos firmware behaviour. The defaults in
//! the second section seed [`Config`](crate::Config) and can be overridden.

// ─────────────────────────────────────────────────────────────────────────────
// Sonos Protocol
// ─────────────────────────────────────────────────────────────────────────────

/// Transport URI prefix for content that cannot be re-established by setting
/// its URI again (line-in and TV sources routed through the virtual line-in).
pub const NON_RECOVERABLE_URI_PREFIX: &str = "x-sonos-vli";

/// Transport URI prefix that links a player to a group coordinator.
pub const GROUP_LINK_URI_PREFIX: &str = "x-rincon:";

/// Duration reported by players for content without a length (streams).
pub const ZERO_DURATION: &str = "0:00:00";

// ─────────────────────────────────────────────────────────────────────────────
// HTTP/SOAP
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout for SOAP HTTP requests (seconds).
///
/// 10 seconds is reasonable for LAN operations.
pub const SOAP_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Orchestration Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Pause between loading content and seeking into it (milliseconds).
///
/// Seeking immediately after `SetAVTransportURI` often fails with 701/714
/// while the player is still loading.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Added to a reported track duration before restoring (milliseconds).
///
/// Covers buffering before the notification audibly starts.
pub const DEFAULT_DURATION_ADJUSTMENT_MS: u64 = 2000;

/// Fallback notification length when no duration can be derived (seconds).
pub const DEFAULT_NOTIFICATION_DURATION_SECS: u64 = 5;
