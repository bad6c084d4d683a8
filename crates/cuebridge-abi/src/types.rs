//! `#[repr(C)]` mirrors of the iCUE SDK v4 types.
//!
//! Vendor enums are modelled as transparent integer newtypes with associated
//! constants rather than Rust enums: the SDK may hand back values this crate
//! does not know about, and an out-of-range discriminant in a Rust enum is
//! undefined behaviour.

use std::ffi::{CStr, c_char, c_int, c_uint, c_void};
use std::fmt;

use bitflags::bitflags;
use static_assertions::{assert_eq_align, assert_eq_size};

use crate::constants::CORSAIR_STRING_SIZE_M;

/// Status code returned by every SDK entry point (`CorsairError`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorsairError(pub c_int);

impl CorsairError {
    /// `CE_Success`
    pub const SUCCESS: Self = Self(0);
    /// `CE_NotConnected`
    pub const NOT_CONNECTED: Self = Self(1);
    /// `CE_NoControl`
    pub const NO_CONTROL: Self = Self(2);
    /// `CE_IncompatibleProtocol`
    pub const INCOMPATIBLE_PROTOCOL: Self = Self(3);
    /// `CE_InvalidArguments`
    pub const INVALID_ARGUMENTS: Self = Self(4);
    /// `CE_InvalidOperation`
    pub const INVALID_OPERATION: Self = Self(5);
    /// `CE_DeviceNotFound`
    pub const DEVICE_NOT_FOUND: Self = Self(6);
    /// `CE_NotAllowed`
    pub const NOT_ALLOWED: Self = Self(7);

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Vendor name of the code, or `None` for codes this crate does not know.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("CE_Success"),
            1 => Some("CE_NotConnected"),
            2 => Some("CE_NoControl"),
            3 => Some("CE_IncompatibleProtocol"),
            4 => Some("CE_InvalidArguments"),
            5 => Some("CE_InvalidOperation"),
            6 => Some("CE_DeviceNotFound"),
            7 => Some("CE_NotAllowed"),
            _ => None,
        }
    }
}

impl fmt::Display for CorsairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "unknown status ({})", self.0),
        }
    }
}

/// Session state reported through the state-changed handler (`CorsairSessionState`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorsairSessionState(pub c_int);

impl CorsairSessionState {
    /// `CSS_Invalid`
    pub const INVALID: Self = Self(0);
    /// `CSS_Closed`
    pub const CLOSED: Self = Self(1);
    /// `CSS_Connecting`
    pub const CONNECTING: Self = Self(2);
    /// `CSS_Timeout`
    pub const TIMEOUT: Self = Self(3);
    /// `CSS_ConnectionRefused`
    pub const CONNECTION_REFUSED: Self = Self(4);
    /// `CSS_ConnectionLost`
    pub const CONNECTION_LOST: Self = Self(5);
    /// `CSS_Connected`
    pub const CONNECTED: Self = Self(6);

    /// Vendor name of the state, or `None` for unknown values.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("CSS_Invalid"),
            1 => Some("CSS_Closed"),
            2 => Some("CSS_Connecting"),
            3 => Some("CSS_Timeout"),
            4 => Some("CSS_ConnectionRefused"),
            5 => Some("CSS_ConnectionLost"),
            6 => Some("CSS_Connected"),
            _ => None,
        }
    }
}

/// Discriminant of [`CorsairEvent`] (`CorsairEventId`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorsairEventId(pub c_int);

impl CorsairEventId {
    /// `CEI_Invalid`
    pub const INVALID: Self = Self(0);
    /// `CEI_DeviceConnectionStatusChangedEvent`
    pub const DEVICE_CONNECTION_STATUS_CHANGED: Self = Self(1);
    /// `CEI_KeyEvent`
    pub const KEY_EVENT: Self = Self(2);
}

/// Macro key identifier carried by key events (`CorsairMacroKeyId`).
///
/// `CMKI_1` .. `CMKI_20` map to 1..=20; 0 is `CMKI_Invalid`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorsairMacroKeyId(pub c_int);

impl CorsairMacroKeyId {
    /// `CMKI_Invalid`
    pub const INVALID: Self = Self(0);
}

/// Access level passed to `CorsairRequestControl` (`CorsairAccessLevel`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorsairAccessLevel(pub c_int);

impl CorsairAccessLevel {
    /// `CAL_Shared`
    pub const SHARED: Self = Self(0);
    /// `CAL_ExclusiveLightingControl`
    pub const EXCLUSIVE_LIGHTING_CONTROL: Self = Self(1);
    /// `CAL_ExclusiveKeyEventsListening`
    pub const EXCLUSIVE_KEY_EVENTS_LISTENING: Self = Self(2);
    /// `CAL_ExclusiveLightingControlAndKeyEventsListening`
    pub const EXCLUSIVE_LIGHTING_CONTROL_AND_KEY_EVENTS_LISTENING: Self = Self(3);
}

bitflags! {
    /// Device type bits (`CorsairDeviceType`), also used as a filter mask.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CorsairDeviceType: c_uint {
        /// `CDT_Keyboard`
        const KEYBOARD = 0x0001;
        /// `CDT_Mouse`
        const MOUSE = 0x0002;
        /// `CDT_Mousemat`
        const MOUSEMAT = 0x0004;
        /// `CDT_Headset`
        const HEADSET = 0x0008;
        /// `CDT_HeadsetStand`
        const HEADSET_STAND = 0x0010;
        /// `CDT_FanLedController`
        const FAN_LED_CONTROLLER = 0x0020;
        /// `CDT_LedController`
        const LED_CONTROLLER = 0x0040;
        /// `CDT_MemoryModule`
        const MEMORY_MODULE = 0x0080;
        /// `CDT_Cooler`
        const COOLER = 0x0100;
        /// `CDT_Motherboard`
        const MOTHERBOARD = 0x0200;
        /// `CDT_GraphicsCard`
        const GRAPHICS_CARD = 0x0400;
        /// `CDT_Touchbar`
        const TOUCHBAR = 0x0800;
        /// `CDT_GameController`
        const GAME_CONTROLLER = 0x1000;

        // The SDK may report types newer than this header.
        const _ = !0;
    }
}

impl CorsairDeviceType {
    /// `CDT_All`, the filter mask that matches every device.
    pub const ALL_MASK: c_int = -1;

    /// Lower-case label of the first known type bit, `"unknown"` otherwise.
    #[must_use]
    pub fn label(self) -> &'static str {
        const LABELS: [(CorsairDeviceType, &str); 13] = [
            (CorsairDeviceType::KEYBOARD, "keyboard"),
            (CorsairDeviceType::MOUSE, "mouse"),
            (CorsairDeviceType::MOUSEMAT, "mousemat"),
            (CorsairDeviceType::HEADSET, "headset"),
            (CorsairDeviceType::HEADSET_STAND, "headset_stand"),
            (CorsairDeviceType::FAN_LED_CONTROLLER, "fan_led_controller"),
            (CorsairDeviceType::LED_CONTROLLER, "led_controller"),
            (CorsairDeviceType::MEMORY_MODULE, "memory_module"),
            (CorsairDeviceType::COOLER, "cooler"),
            (CorsairDeviceType::MOTHERBOARD, "motherboard"),
            (CorsairDeviceType::GRAPHICS_CARD, "graphics_card"),
            (CorsairDeviceType::TOUCHBAR, "touchbar"),
            (CorsairDeviceType::GAME_CONTROLLER, "game_controller"),
        ];
        LABELS
            .iter()
            .find(|(flag, _)| self.contains(*flag))
            .map_or("unknown", |(_, label)| label)
    }
}

/// Semantic version triple (`CorsairVersion`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorsairVersion {
    /// Major component.
    pub major: c_int,
    /// Minor component.
    pub minor: c_int,
    /// Patch component.
    pub patch: c_int,
}

impl fmt::Display for CorsairVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Versions negotiated for the session (`CorsairSessionDetails`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorsairSessionDetails {
    /// Version of the SDK client library.
    pub client_version: CorsairVersion,
    /// Version of the iCUE server the client talks to.
    pub server_version: CorsairVersion,
    /// Version of the iCUE host application.
    pub server_host_version: CorsairVersion,
}

/// Payload of the session state-changed handler (`CorsairSessionStateChanged`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsairSessionStateChanged {
    /// New session state.
    pub state: CorsairSessionState,
    /// Version details, valid once connected.
    pub details: CorsairSessionDetails,
}

/// Fixed-size device id string (`CorsairDeviceId`).
pub type CorsairDeviceId = [c_char; CORSAIR_STRING_SIZE_M];

/// LED logical id (`CorsairLedLuid`), see [`crate::keys::LedLuid`].
pub type CorsairLedLuid = c_uint;

/// Device description filled in by `CorsairGetDevices` (`CorsairDeviceInfo`).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CorsairDeviceInfo {
    /// Device type bits.
    pub device_type: CorsairDeviceType,
    /// Opaque device id.
    pub id: CorsairDeviceId,
    /// Serial number.
    pub serial: [c_char; CORSAIR_STRING_SIZE_M],
    /// Model name.
    pub model: [c_char; CORSAIR_STRING_SIZE_M],
    /// Number of addressable LEDs.
    pub led_count: c_int,
    /// Number of channels (LED controllers only).
    pub channel_count: c_int,
}

impl CorsairDeviceInfo {
    /// An all-zero record, used to preallocate output buffers.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            device_type: CorsairDeviceType::empty(),
            id: [0; CORSAIR_STRING_SIZE_M],
            serial: [0; CORSAIR_STRING_SIZE_M],
            model: [0; CORSAIR_STRING_SIZE_M],
            led_count: 0,
            channel_count: 0,
        }
    }
}

impl fmt::Debug for CorsairDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorsairDeviceInfo")
            .field("device_type", &self.device_type)
            .field("id", &fixed_c_string(&self.id))
            .field("serial", &fixed_c_string(&self.serial))
            .field("model", &fixed_c_string(&self.model))
            .field("led_count", &self.led_count)
            .field("channel_count", &self.channel_count)
            .finish()
    }
}

/// Device filter passed to `CorsairGetDevices` (`CorsairDeviceFilter`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsairDeviceFilter {
    /// Bit mask of [`CorsairDeviceType`] values.
    pub device_type_mask: c_int,
}

/// A single LED color (`CorsairLedColor`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CorsairLedColor {
    /// LED logical id.
    pub id: CorsairLedLuid,
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

/// Key event payload (`CorsairKeyEvent`).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CorsairKeyEvent {
    /// Device that produced the event.
    pub device_id: CorsairDeviceId,
    /// Macro key that changed.
    pub key_id: CorsairMacroKeyId,
    /// `true` on key down.
    pub is_pressed: bool,
}

/// Device connection payload (`CorsairDeviceConnectionStatusChangedEvent`).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CorsairDeviceConnectionStatusChangedEvent {
    /// Device whose status changed.
    pub device_id: CorsairDeviceId,
    /// `true` when the device was attached.
    pub is_connected: bool,
}

/// Pointer payload of [`CorsairEvent`], selected by its `id`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union CorsairEventPayload {
    /// Valid when `id == DEVICE_CONNECTION_STATUS_CHANGED`.
    pub device_connection_status_changed: *const CorsairDeviceConnectionStatusChangedEvent,
    /// Valid when `id == KEY_EVENT`.
    pub key_event: *const CorsairKeyEvent,
}

/// Event delivered to the subscription handler (`CorsairEvent`).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CorsairEvent {
    /// Which union member is valid.
    pub id: CorsairEventId,
    /// Borrowed payload, only valid for the duration of the callback.
    pub payload: CorsairEventPayload,
}

/// `CorsairSessionStateChangedHandler`
pub type CorsairSessionStateChangedHandler = Option<
    unsafe extern "C" fn(context: *mut c_void, event_data: *const CorsairSessionStateChanged),
>;

/// `CorsairEventHandler`
pub type CorsairEventHandler =
    Option<unsafe extern "C" fn(context: *mut c_void, event: *const CorsairEvent)>;

/// `CorsairConnect`
pub type CorsairConnectFn = unsafe extern "C" fn(
    on_state_changed: CorsairSessionStateChangedHandler,
    context: *mut c_void,
) -> CorsairError;

/// `CorsairDisconnect`
pub type CorsairDisconnectFn = unsafe extern "C" fn() -> CorsairError;

/// `CorsairSubscribeForEvents`
pub type CorsairSubscribeForEventsFn =
    unsafe extern "C" fn(on_event: CorsairEventHandler, context: *mut c_void) -> CorsairError;

/// `CorsairUnsubscribeFromEvents`
pub type CorsairUnsubscribeFromEventsFn = unsafe extern "C" fn() -> CorsairError;

/// `CorsairSetLedColors`
pub type CorsairSetLedColorsFn = unsafe extern "C" fn(
    device_id: *const c_char,
    size: c_int,
    led_colors: *const CorsairLedColor,
) -> CorsairError;

/// `CorsairGetDevices`
pub type CorsairGetDevicesFn = unsafe extern "C" fn(
    filter: *const CorsairDeviceFilter,
    size_max: c_int,
    devices: *mut CorsairDeviceInfo,
    size: *mut c_int,
) -> CorsairError;

/// `CorsairRequestControl`
pub type CorsairRequestControlFn =
    unsafe extern "C" fn(device_id: *const c_char, access_level: CorsairAccessLevel) -> CorsairError;

/// Read a NUL-terminated string out of a fixed `char` array.
///
/// A missing terminator takes the whole array; invalid UTF-8 is replaced.
#[must_use]
pub fn fixed_c_string(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw.iter().map(|&c| c.to_ne_bytes()[0]).collect();
    match CStr::from_bytes_until_nul(&bytes) {
        Ok(s) => s.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Copy `value` into a fixed `char` array, NUL-terminated.
///
/// Returns `None` when the value (plus terminator) does not fit or contains
/// an interior NUL.
#[must_use]
pub fn to_fixed_c_string<const N: usize>(value: &str) -> Option<[c_char; N]> {
    let bytes = value.as_bytes();
    if bytes.len() >= N || bytes.contains(&0) {
        return None;
    }
    let mut out = [0 as c_char; N];
    for (slot, &byte) in out.iter_mut().zip(bytes) {
        *slot = c_char::from_ne_bytes([byte]);
    }
    Some(out)
}

assert_eq_size!(CorsairError, c_int);
assert_eq_size!(CorsairSessionState, c_int);
assert_eq_size!(CorsairDeviceType, c_int);
assert_eq_size!(CorsairLedColor, [u8; 8]);
assert_eq_size!(CorsairVersion, [c_int; 3]);
assert_eq_size!(CorsairSessionStateChanged, [c_int; 10]);
assert_eq_size!(CorsairDeviceInfo, [u8; 396]);
assert_eq_align!(CorsairDeviceInfo, c_int);
assert_eq_size!(CorsairKeyEvent, [u8; 136]);
