//! Centralized error types for the interlude core library.
//!
//! Every orchestration failure carries the name of the operation that was
//! running, so a message like `interlude: restore_group_snapshot: SetVolume
//! failed: ...` is enough to locate the step without a backtrace.

use thiserror::Error;

use crate::sonos::soap::SoapError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault(_) => "soap_fault",
            Self::Parse(_) => "soap_parse_error",
        }
    }
}

/// Error type for the topology, snapshot and notification operations.
#[derive(Debug, Error)]
pub enum InterludeError {
    /// Topology or response XML lacked an expected field, or a time value was
    /// not `h:mm:ss`.
    #[error("interlude: {operation}: parse error: {message}")]
    Parse {
        operation: &'static str,
        message: String,
    },

    /// The requested player is not a visible member of any group.
    #[error("interlude: {operation}: player not in any group: {player}")]
    NotFound {
        operation: &'static str,
        player: String,
    },

    /// A player rejected or failed to answer a SOAP action.
    #[error("interlude: {operation}: {action} failed: {source}")]
    Remote {
        operation: &'static str,
        action: &'static str,
        #[source]
        source: SoapError,
    },

    /// The live topology no longer matches the state being acted on.
    #[error("interlude: {operation}: {message}")]
    Precondition {
        operation: &'static str,
        message: String,
    },

    /// Caller-supplied options failed validation.
    #[error("interlude: {operation}: invalid option: {message}")]
    InvalidOption {
        operation: &'static str,
        message: String,
    },
}

impl ErrorCode for InterludeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::NotFound { .. } => "player_not_found",
            Self::Remote { source, .. } => source.code(),
            Self::Precondition { .. } => "topology_changed",
            Self::InvalidOption { .. } => "invalid_option",
        }
    }
}

impl InterludeError {
    /// Wraps a SOAP failure, surfacing response parse problems as [`Self::Parse`].
    pub fn remote(operation: &'static str, action: &'static str, source: SoapError) -> Self {
        match source {
            SoapError::Parse(message) => Self::Parse { operation, message },
            source => Self::Remote {
                operation,
                action,
                source,
            },
        }
    }

    /// Name of the operation that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Parse { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Remote { operation, .. }
            | Self::Precondition { operation, .. }
            | Self::InvalidOption { operation, .. } => *operation,
        }
    }
}

/// Result alias for the orchestration operations.
pub type InterludeResult<T> = Result<T, InterludeError>;

/// Attaches operation and action names to SOAP results.
pub(crate) trait RemoteContext<T> {
    fn during(self, operation: &'static str, action: &'static str) -> InterludeResult<T>;
}

impl<T> RemoteContext<T> for Result<T, SoapError> {
    fn during(self, operation: &'static str, action: &'static str) -> InterludeResult<T> {
        self.map_err(|e| InterludeError::remote(operation, action, e))
    }
}

// Re-export the SOAP result alias from its defining module
pub use crate::sonos::soap::SoapResult;
