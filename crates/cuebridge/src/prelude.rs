//! Convenience re-exports for common types.

pub use crate::bridge::Bridge;
pub use crate::config::BridgeConfig;
pub use crate::error::{BridgeError, BridgeResult};
pub use crate::events::{KeyEvent, OverflowPolicy};
pub use crate::keyboard::{KeyAction, Keyboard, KeyboardOptions};
pub use crate::session::{DisconnectReport, SessionState};
pub use crate::vendor::{AccessLevel, DeviceDescriptor, DeviceFilter, LedColor, Rgb};
pub use cuebridge_abi::LedLuid;
