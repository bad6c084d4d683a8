//! Command implementations for cuectl

pub mod color;
pub mod devices;
pub mod keys;
pub mod probe;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use cuebridge::{Bridge, BridgeConfig, Keyboard, KeyboardOptions};

use crate::error::CliError;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub sdk_path: Option<PathBuf>,
}

impl Context {
    /// Configuration from `--config`, the environment and `--sdk-path`, in
    /// increasing precedence.
    pub fn bridge_config(&self) -> Result<BridgeConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };
        config.apply_env_overrides()?;
        if let Some(path) = &self.sdk_path {
            config.resolver.sdk_path = Some(path.clone());
        }
        tracing::debug!(?config, "Resolved configuration");
        Ok(config)
    }

    /// A bridge with the library loaded.
    pub fn loaded_bridge(&self) -> Result<Bridge, CliError> {
        let bridge = Bridge::new(self.bridge_config()?)?;
        bridge.load_library()?;
        Ok(bridge)
    }
}

/// Load, connect and select the first keyboard.
pub fn open_keyboard(
    bridge: &Bridge,
    exclusive: bool,
    timeout_ms: u64,
) -> Result<Keyboard<'_>, CliError> {
    let options = KeyboardOptions {
        exclusive_control: exclusive,
        connect_timeout: Duration::from_millis(timeout_ms),
    };
    Ok(Keyboard::initialize(bridge, options)?)
}
