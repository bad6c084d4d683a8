//! Device enumeration

use std::time::Duration;

use cuebridge::{BridgeError, DeviceFilter, SessionState};

use crate::commands::Context;
use crate::error::CliError;
use crate::output;

/// Connect and list keyboards, or every device with `all`.
pub fn execute(ctx: &Context, all: bool, limit: usize, timeout_ms: u64) -> Result<(), CliError> {
    if limit == 0 {
        return Err(CliError::ValidationError("--capacity must be at least 1".to_string()));
    }
    let bridge = ctx.loaded_bridge()?;

    let status = bridge.connect_with_status()?;
    if !status.is_success() {
        return Err(BridgeError::ConnectRejected { status }.into());
    }
    if !bridge.wait_for_state(SessionState::Connected, Duration::from_millis(timeout_ms)) {
        return Err(BridgeError::ConnectTimeout { timeout_ms }.into());
    }

    let devices = if all {
        bridge.devices(DeviceFilter::All, limit)?
    } else {
        bridge.devices(DeviceFilter::keyboards(), limit)?
    };
    output::print_devices(&devices, bridge.session_details().as_ref(), ctx.json);

    let report = bridge.shutdown();
    tracing::debug!(?report, "Session closed");
    Ok(())
}
