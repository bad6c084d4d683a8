//! Error types for cuectl

use cuebridge::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ValidationError(_) | Self::JsonError(_) => 4,
            Self::Bridge(e) => bridge_exit_code(e),
            Self::CommandFailed(_) | Self::IoError(_) => 1,
        }
    }

    /// Short machine-readable name used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bridge(BridgeError::NoKeyboard) => "device_not_found",
            Self::Bridge(e) if e.is_sdk_unavailable() => "sdk_unavailable",
            Self::ValidationError(_) | Self::JsonError(_) => "validation",
            Self::Bridge(e) if e.is_invalid_input() => "validation",
            Self::Bridge(BridgeError::Json(_) | BridgeError::Yaml(_)) => "validation",
            Self::Bridge(BridgeError::ConnectRejected { .. } | BridgeError::ConnectTimeout { .. }) => {
                "connect_failed"
            }
            _ => "error",
        }
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    error.downcast_ref::<CliError>().map_or_else(
        || error.downcast_ref::<BridgeError>().map_or(1, bridge_exit_code),
        CliError::exit_code,
    )
}

fn bridge_exit_code(error: &BridgeError) -> u8 {
    match error {
        BridgeError::NoKeyboard => 2,
        e if e.is_sdk_unavailable() => 3,
        e if e.is_invalid_input() => 4,
        BridgeError::Json(_) | BridgeError::Yaml(_) => 4,
        _ => 1,
    }
}
