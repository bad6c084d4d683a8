//! Convenience re-exports for common types.

pub use crate::constants::{CORSAIR_DEVICE_COUNT_MAX, CORSAIR_STRING_SIZE_M, entry_point};
pub use crate::keys::{LedGroup, LedLuid, led_key, macro_key_name};
pub use crate::types::{
    CorsairAccessLevel, CorsairDeviceInfo, CorsairDeviceType, CorsairError, CorsairEvent,
    CorsairEventId, CorsairKeyEvent, CorsairLedColor, CorsairSessionState,
    CorsairSessionStateChanged, fixed_c_string, to_fixed_c_string,
};
