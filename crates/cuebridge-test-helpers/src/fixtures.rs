//! Devices, configurations and paths shared by cuebridge tests.

use std::path::{Path, PathBuf};

use cuebridge::{BridgeConfig, DeviceDescriptor, ResolverConfig};
use cuebridge_abi::CorsairDeviceType;

/// Id of the keyboard reported by [`crate::mock::FakeVendor::new`].
pub const KEYBOARD_ID: &str = "{0f8e8a3c-6d42-4e2b-9a60-1c1a4b1f6c01}";

/// Id used for the mouse fixture.
pub const MOUSE_ID: &str = "{7b1d2f55-02e4-4c8a-b3f9-58d0c2e7a912}";

/// A keyboard descriptor.
pub fn keyboard(id: &str, model: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        id: id.to_string(),
        model: model.to_string(),
        serial: "17009A4CAF1D8E3C5D6F7A8B".to_string(),
        led_count: 150,
        channel_count: 0,
        device_type: CorsairDeviceType::KEYBOARD,
    }
}

/// A mouse descriptor.
pub fn mouse(id: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        id: id.to_string(),
        model: "DARK CORE RGB PRO".to_string(),
        serial: String::new(),
        led_count: 4,
        channel_count: 0,
        device_type: CorsairDeviceType::MOUSE,
    }
}

/// A mouse followed by a keyboard, so keyboard lookups must filter.
pub fn desk() -> Vec<DeviceDescriptor> {
    vec![mouse(MOUSE_ID), keyboard(KEYBOARD_ID, "K70 RGB PRO")]
}

/// Where the resolver looks for the library inside `dir`.
pub fn library_in(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(cuebridge::config::default_library_name())
}

/// `count` candidate directories named `dir0`, `dir1`, ...
pub fn candidate_dirs(count: usize) -> Vec<PathBuf> {
    (0..count).map(|i| PathBuf::from(format!("dir{i}"))).collect()
}

/// Configuration that searches exactly `dirs`, in order.
pub fn config_for(dirs: &[PathBuf]) -> BridgeConfig {
    BridgeConfig {
        resolver: ResolverConfig::only_dirs(dirs.iter().cloned()),
        ..BridgeConfig::default()
    }
}
