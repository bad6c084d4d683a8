//! Safe view of the vendor SDK and the values that cross it.
//!
//! [`VendorSdk`] is the seam between the bridge and the loaded library. The
//! native implementation lives in [`crate::native`]; tests substitute a fake.

use std::ffi::{CStr, CString, c_int};
use std::fmt;

use cuebridge_abi::{
    CORSAIR_STRING_SIZE_M, CorsairAccessLevel, CorsairDeviceFilter, CorsairDeviceInfo,
    CorsairDeviceType, CorsairError, CorsairLedColor, LedLuid, fixed_c_string,
};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{BridgeError, BridgeResult};
use crate::hub::CallbackRegistration;

/// Operations the bridge needs from the vendor library.
///
/// Every method returns the raw vendor status; interpreting it as success or
/// failure is left to the caller.
pub trait VendorSdk: Send + Sync {
    /// `CorsairConnect`, registering the session state handler.
    fn connect(&self, registration: &CallbackRegistration) -> CorsairError;

    /// `CorsairDisconnect`.
    fn disconnect(&self) -> CorsairError;

    /// `CorsairSubscribeForEvents`, registering the event handler.
    fn subscribe_for_events(&self, registration: &CallbackRegistration) -> CorsairError;

    /// `CorsairUnsubscribeFromEvents`.
    fn unsubscribe_from_events(&self) -> CorsairError;

    /// `CorsairGetDevices` with room for at most `capacity` devices.
    ///
    /// # Errors
    ///
    /// Returns the vendor status when the call does not succeed.
    fn get_devices(
        &self,
        filter: DeviceFilter,
        capacity: usize,
    ) -> Result<Vec<DeviceDescriptor>, CorsairError>;

    /// `CorsairRequestControl`.
    fn request_control(&self, device_id: &DeviceId, access: AccessLevel) -> CorsairError;

    /// `CorsairSetLedColors`.
    fn set_led_colors(&self, device_id: &DeviceId, colors: &[LedColor]) -> CorsairError;
}

/// Device id validated to fit the SDK's fixed 128-byte field.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeviceId {
    text: String,
    c_text: CString,
}

impl DeviceId {
    /// Validate an id.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidDeviceId`] for empty ids, ids with an
    /// interior NUL, or ids longer than 127 bytes.
    pub fn new(id: impl Into<String>) -> BridgeResult<Self> {
        let text = id.into();
        if text.is_empty() {
            return Err(BridgeError::invalid_device_id(text, "must not be empty"));
        }
        if text.len() >= CORSAIR_STRING_SIZE_M {
            return Err(BridgeError::invalid_device_id(
                text,
                "longer than 127 bytes",
            ));
        }
        let c_text = match CString::new(text.clone()) {
            Ok(c_text) => c_text,
            Err(_) => return Err(BridgeError::invalid_device_id(text, "contains NUL")),
        };
        Ok(Self { text, c_text })
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// NUL-terminated form for the SDK.
    pub fn as_c_str(&self) -> &CStr {
        &self.c_text
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceId").field(&self.text).finish()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<&str> for DeviceId {
    type Error = BridgeError;

    fn try_from(value: &str) -> BridgeResult<Self> {
        Self::new(value)
    }
}

/// An RGB color. Alpha is always sent as 255.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Build from in-range components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from arbitrary integers, clamping each component to `0..=255`.
    #[must_use]
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        Self::new(clamp_component(r), clamp_component(g), clamp_component(b))
    }
}

fn clamp_component(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

/// One LED color command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedColor {
    /// Target LED.
    pub luid: LedLuid,
    /// Color to apply.
    pub color: Rgb,
}

impl LedColor {
    /// Fully opaque color for one LED.
    #[must_use]
    pub const fn new(luid: LedLuid, color: Rgb) -> Self {
        Self { luid, color }
    }

    /// Vendor representation, alpha fixed at 255.
    #[must_use]
    pub const fn to_raw(self) -> CorsairLedColor {
        CorsairLedColor {
            id: self.luid.raw(),
            r: self.color.r,
            g: self.color.g,
            b: self.color.b,
            a: u8::MAX,
        }
    }
}

/// Which devices an enumeration should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFilter {
    /// Every device type.
    All,
    /// Devices whose type matches any of the given bits.
    Types(CorsairDeviceType),
}

impl DeviceFilter {
    /// Keyboards only.
    #[must_use]
    pub const fn keyboards() -> Self {
        Self::Types(CorsairDeviceType::KEYBOARD)
    }

    /// Vendor representation.
    #[must_use]
    pub fn to_raw(self) -> CorsairDeviceFilter {
        let device_type_mask = match self {
            Self::All => CorsairDeviceType::ALL_MASK,
            Self::Types(types) => c_int::from_ne_bytes(types.bits().to_ne_bytes()),
        };
        CorsairDeviceFilter { device_type_mask }
    }
}

/// Access level requested through `request_control`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Lighting shared with iCUE.
    Shared,
    /// This bridge overrides device lighting.
    #[default]
    ExclusiveLightingControl,
    /// Key events are delivered to this bridge only.
    ExclusiveKeyEventsListening,
    /// Both of the above.
    ExclusiveLightingControlAndKeyEventsListening,
}

impl AccessLevel {
    /// Vendor representation.
    #[must_use]
    pub const fn to_raw(self) -> CorsairAccessLevel {
        match self {
            Self::Shared => CorsairAccessLevel::SHARED,
            Self::ExclusiveLightingControl => CorsairAccessLevel::EXCLUSIVE_LIGHTING_CONTROL,
            Self::ExclusiveKeyEventsListening => {
                CorsairAccessLevel::EXCLUSIVE_KEY_EVENTS_LISTENING
            }
            Self::ExclusiveLightingControlAndKeyEventsListening => {
                CorsairAccessLevel::EXCLUSIVE_LIGHTING_CONTROL_AND_KEY_EVENTS_LISTENING
            }
        }
    }
}

/// Snapshot of one device as reported by enumeration. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Opaque device id.
    pub id: String,
    /// Model name.
    pub model: String,
    /// Serial number.
    pub serial: String,
    /// Number of addressable LEDs.
    pub led_count: u32,
    /// Number of LED channels.
    pub channel_count: u32,
    /// Device type bits.
    #[serde(rename = "type", serialize_with = "serialize_device_type")]
    pub device_type: CorsairDeviceType,
}

impl DeviceDescriptor {
    /// Copy a vendor record into owned strings.
    #[must_use]
    pub fn from_raw(raw: &CorsairDeviceInfo) -> Self {
        Self {
            id: fixed_c_string(&raw.id),
            model: fixed_c_string(&raw.model),
            serial: fixed_c_string(&raw.serial),
            led_count: u32::try_from(raw.led_count).unwrap_or(0),
            channel_count: u32::try_from(raw.channel_count).unwrap_or(0),
            device_type: raw.device_type,
        }
    }

    /// Validated id for follow-up calls.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidDeviceId`] if the SDK reported an id
    /// that cannot be sent back to it.
    pub fn device_id(&self) -> BridgeResult<DeviceId> {
        DeviceId::new(self.id.clone())
    }
}

fn serialize_device_type<S: Serializer>(
    device_type: &CorsairDeviceType,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(device_type.label())
}
