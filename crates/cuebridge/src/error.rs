//! Error types for library resolution and bridge operations.
//!
//! Vendor call failures are not errors here: they come back as `false` or an
//! empty list so the caller can decide on its own retry policy.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single candidate library was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidateFailure {
    /// The OS loader could not open the file.
    #[error("library could not be opened: {reason}")]
    NotLoadable {
        /// Loader message.
        reason: String,
    },

    /// The library opened but lacks required exports. It has been unloaded.
    #[error("missing entry points: {}", missing.join(", "))]
    MissingEntryPoints {
        /// Names of every export that failed to resolve.
        missing: Vec<&'static str>,
    },
}

impl CandidateFailure {
    /// Create a not-loadable failure.
    pub fn not_loadable(reason: impl Into<String>) -> Self {
        Self::NotLoadable {
            reason: reason.into(),
        }
    }

    /// Create a missing-entry-points failure.
    pub fn missing(missing: Vec<&'static str>) -> Self {
        Self::MissingEntryPoints { missing }
    }
}

/// One rejected candidate and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    /// Path that was tried.
    pub path: PathBuf,
    /// Why it was rejected.
    pub failure: CandidateFailure,
}

impl fmt::Display for CandidateAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.failure)
    }
}

/// Error type for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Every candidate location was tried and none produced a usable library.
    #[error(
        "Could not load iCUE SDK: all {} known paths were exhausted. \
         Ensure Corsair iCUE is installed and running.",
        attempts.len()
    )]
    LoadFailed {
        /// Each candidate tried, in order.
        attempts: Vec<CandidateAttempt>,
    },

    /// A session or device operation was invoked before a successful load.
    #[error("SDK not loaded. Call load_library() first.")]
    NotLoaded,

    /// Device id cannot be passed to the SDK.
    #[error("Invalid device id '{device_id}': {reason}")]
    InvalidDeviceId {
        /// Offending id.
        device_id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Key name not present in the LED or macro key tables.
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    /// The SDK refused the connect request.
    #[error("Failed to connect to iCUE: {status}")]
    ConnectRejected {
        /// Vendor status code.
        status: cuebridge_abi::CorsairError,
    },

    /// The session did not reach the connected state in time.
    #[error("Session not connected after {timeout_ms}ms")]
    ConnectTimeout {
        /// How long we waited.
        timeout_ms: u64,
    },

    /// No keyboard was reported by the SDK.
    #[error("No Corsair keyboards detected")]
    NoKeyboard,

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BridgeError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create an invalid device id error.
    pub fn invalid_device_id(device_id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidDeviceId {
            device_id: device_id.into(),
            reason,
        }
    }

    /// Whether this error means the vendor library is unavailable.
    pub fn is_sdk_unavailable(&self) -> bool {
        matches!(self, Self::LoadFailed { .. } | Self::NotLoaded)
    }

    /// Whether the caller passed something the bridge could not use.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidDeviceId { .. } | Self::UnknownKey(_) | Self::InvalidConfiguration(_)
        )
    }

    /// Candidate attempts carried by a load failure.
    pub fn attempts(&self) -> &[CandidateAttempt] {
        match self {
            Self::LoadFailed { attempts } => attempts,
            _ => &[],
        }
    }
}

/// A specialized `Result` type for bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failed_message_counts_attempts() {
        let err = BridgeError::LoadFailed {
            attempts: vec![
                CandidateAttempt {
                    path: PathBuf::from("a/iCUESDK.dll"),
                    failure: CandidateFailure::not_loadable("not found"),
                },
                CandidateAttempt {
                    path: PathBuf::from("b/iCUESDK.dll"),
                    failure: CandidateFailure::missing(vec!["CorsairConnect"]),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("all 2 known paths were exhausted"));
        assert!(err.is_sdk_unavailable());
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn test_candidate_failure_display() {
        let failure = CandidateFailure::missing(vec!["CorsairConnect", "CorsairDisconnect"]);
        assert_eq!(
            failure.to_string(),
            "missing entry points: CorsairConnect, CorsairDisconnect"
        );
    }

    #[test]
    fn test_classifiers() {
        assert!(BridgeError::UnknownKey("G99".into()).is_invalid_input());
        assert!(BridgeError::invalid_device_id("x", "too long").is_invalid_input());
        assert!(!BridgeError::NoKeyboard.is_sdk_unavailable());
        assert!(BridgeError::NotLoaded.attempts().is_empty());
    }
}
