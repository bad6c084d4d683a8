//! High-level controller for the first connected keyboard.
//!
//! Addresses keys by name (`"G1"`, `"Esc"`) and reports G-key presses as
//! named actions.

use std::time::Duration;

use cuebridge_abi::{CorsairError, G_KEY_NAMES, LED_KEYS, LedLuid, led_key};
use serde::Serialize;

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::session::{DisconnectReport, SessionState};
use crate::vendor::{DeviceDescriptor, LedColor, Rgb};

/// How [`Keyboard::initialize`] sets up the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardOptions {
    /// Request control at the configured access level after connecting.
    pub exclusive_control: bool,
    /// How long to wait for the vendor to report Connected.
    pub connect_timeout: Duration,
}

impl Default for KeyboardOptions {
    fn default() -> Self {
        Self {
            exclusive_control: false,
            connect_timeout: Duration::from_millis(500),
        }
    }
}

/// A G-key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAction {
    /// Key name, `"G1"` .. `"G12"`.
    pub key: &'static str,
    /// Vendor macro key id.
    pub key_id: i32,
    /// `true` on key down.
    pub pressed: bool,
}

/// The first keyboard reported by the SDK.
#[derive(Debug)]
pub struct Keyboard<'a> {
    bridge: &'a Bridge,
    device: DeviceDescriptor,
    control_granted: bool,
}

impl<'a> Keyboard<'a> {
    /// Load, connect, wait for the session and pick the first keyboard.
    ///
    /// # Errors
    ///
    /// Returns the load error, [`BridgeError::ConnectRejected`],
    /// [`BridgeError::ConnectTimeout`] or [`BridgeError::NoKeyboard`].
    pub fn initialize(bridge: &'a Bridge, options: KeyboardOptions) -> BridgeResult<Self> {
        bridge.load_library()?;

        let status = bridge.connect_with_status()?;
        if status != CorsairError::SUCCESS {
            return Err(BridgeError::ConnectRejected { status });
        }
        if !bridge.wait_for_state(SessionState::Connected, options.connect_timeout) {
            return Err(BridgeError::ConnectTimeout {
                timeout_ms: u64::try_from(options.connect_timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }

        let device = bridge
            .keyboards()?
            .into_iter()
            .next()
            .ok_or(BridgeError::NoKeyboard)?;
        tracing::info!(model = %device.model, id = %device.id, "Using keyboard");

        let control_granted = if options.exclusive_control {
            bridge.request_control(&device.id)?
        } else {
            false
        };

        Ok(Self {
            bridge,
            device,
            control_granted,
        })
    }

    /// The selected keyboard.
    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    /// Whether exclusive control was requested and granted.
    pub fn control_granted(&self) -> bool {
        self.control_granted
    }

    /// Drain pending key events as named actions. Unknown key ids are dropped.
    pub fn poll_actions(&self) -> Vec<KeyAction> {
        self.bridge
            .poll_events()
            .into_iter()
            .filter_map(|event| {
                event.key_name().map(|key| KeyAction {
                    key,
                    key_id: event.key_id,
                    pressed: event.is_pressed,
                })
            })
            .collect()
    }

    /// Set one named key.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownKey`] for names not in the LED table.
    pub fn set_key_color(&self, name: &str, color: Rgb) -> BridgeResult<bool> {
        let luid = lookup(name)?;
        self.bridge.set_key_color(&self.device.id, luid, color)
    }

    /// Set several named keys in one vendor call.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownKey`] before anything is sent if any
    /// name is unknown.
    pub fn set_keys_color(&self, keys: &[(&str, Rgb)]) -> BridgeResult<bool> {
        let colors = keys
            .iter()
            .map(|(name, color)| lookup(name).map(|luid| LedColor::new(luid, *color)))
            .collect::<BridgeResult<Vec<_>>>()?;
        self.bridge.set_led_colors(&self.device.id, &colors)
    }

    /// Turn one key off.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_key_color`].
    pub fn turn_off_key(&self, name: &str) -> BridgeResult<bool> {
        self.set_key_color(name, Rgb::BLACK)
    }

    /// Turn G1..G12 off.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotLoaded`] if the library was unloaded.
    pub fn turn_off_all_keys(&self) -> BridgeResult<bool> {
        let keys: Vec<(&str, Rgb)> = G_KEY_NAMES.iter().map(|name| (*name, Rgb::BLACK)).collect();
        self.set_keys_color(&keys)
    }

    /// Names accepted by the color operations.
    pub fn available_keys() -> Vec<&'static str> {
        LED_KEYS.iter().map(|(name, _)| *name).collect()
    }

    /// End the session.
    pub fn disconnect(self) -> DisconnectReport {
        self.bridge.disconnect()
    }
}

fn lookup(name: &str) -> BridgeResult<LedLuid> {
    led_key(name).ok_or_else(|| BridgeError::UnknownKey(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_keys_include_g_keys_and_function_row() {
        let keys = Keyboard::available_keys();
        assert_eq!(keys.len(), 16);
        assert!(keys.contains(&"G12"));
        assert!(keys.contains(&"Esc"));
    }

    #[test]
    fn test_lookup_unknown_key() {
        assert!(matches!(lookup("Z9"), Err(BridgeError::UnknownKey(ref name)) if name == "Z9"));
        assert!(lookup("f1").is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = KeyboardOptions::default();
        assert!(!options.exclusive_control);
        assert_eq!(options.connect_timeout, Duration::from_millis(500));
    }
}
