//! Stateless device operations over a loaded vendor library.
//!
//! Vendor failures are not errors here: enumeration yields an empty list and
//! the other calls yield `false`, with the vendor code logged.

use cuebridge_abi::{CORSAIR_DEVICE_COUNT_MAX, LedLuid};

use crate::vendor::{AccessLevel, DeviceDescriptor, DeviceFilter, DeviceId, LedColor, Rgb, VendorSdk};

/// Request/response calls into the vendor library.
#[derive(Clone, Copy)]
pub struct DeviceControl<'a> {
    sdk: &'a dyn VendorSdk,
    access_level: AccessLevel,
}

impl<'a> DeviceControl<'a> {
    /// Wrap a loaded library.
    pub fn new(sdk: &'a dyn VendorSdk, access_level: AccessLevel) -> Self {
        Self { sdk, access_level }
    }

    /// List up to `capacity` devices (at most 64) matching `filter`.
    pub fn enumerate(&self, filter: DeviceFilter, capacity: usize) -> Vec<DeviceDescriptor> {
        let capacity = capacity.min(CORSAIR_DEVICE_COUNT_MAX);
        match self.sdk.get_devices(filter, capacity) {
            Ok(mut devices) => {
                devices.truncate(capacity);
                tracing::debug!(count = devices.len(), ?filter, "Enumerated devices");
                devices
            }
            Err(status) => {
                tracing::debug!(%status, ?filter, "CorsairGetDevices failed");
                Vec::new()
            }
        }
    }

    /// Request control of a device at the configured access level.
    pub fn request_control(&self, device_id: &DeviceId) -> bool {
        let status = self.sdk.request_control(device_id, self.access_level);
        if !status.is_success() {
            tracing::warn!(
                device_id = %device_id,
                access_level = ?self.access_level,
                %status,
                "CorsairRequestControl failed"
            );
        }
        status.is_success()
    }

    /// Set one LED.
    pub fn set_color(&self, device_id: &DeviceId, luid: LedLuid, color: Rgb) -> bool {
        self.set_colors(device_id, &[LedColor::new(luid, color)])
    }

    /// Set several LEDs in a single vendor call.
    pub fn set_colors(&self, device_id: &DeviceId, colors: &[LedColor]) -> bool {
        let status = self.sdk.set_led_colors(device_id, colors);
        if !status.is_success() {
            tracing::debug!(
                device_id = %device_id,
                leds = colors.len(),
                %status,
                "CorsairSetLedColors failed"
            );
        }
        status.is_success()
    }
}

impl std::fmt::Debug for DeviceControl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceControl")
            .field("access_level", &self.access_level)
            .finish_non_exhaustive()
    }
}
