//! Sizes and symbol names fixed by the iCUE SDK v4 header.

/// Size of the short fixed strings in SDK structures.
pub const CORSAIR_STRING_SIZE_S: usize = 64;

/// Size of the medium fixed strings (device id, serial, model).
pub const CORSAIR_STRING_SIZE_M: usize = 128;

/// Maximum number of devices a single `CorsairGetDevices` call can report.
pub const CORSAIR_DEVICE_COUNT_MAX: usize = 64;

/// Maximum number of LEDs on a single device.
pub const CORSAIR_DEVICE_LEDCOUNT_MAX: usize = 512;

/// Base name of the vendor library, without platform prefix or suffix.
///
/// Turned into `iCUESDK.dll` on Windows and `libiCUESDK.so` on Linux.
pub const SDK_LIBRARY_BASE_NAME: &str = "iCUESDK";

/// Names of the entry points that must all resolve for a library to be usable.
pub mod entry_point {
    /// `CorsairConnect(onStateChanged, context)`
    pub const CONNECT: &str = "CorsairConnect";
    /// `CorsairDisconnect()`
    pub const DISCONNECT: &str = "CorsairDisconnect";
    /// `CorsairSubscribeForEvents(onEvent, context)`
    pub const SUBSCRIBE_FOR_EVENTS: &str = "CorsairSubscribeForEvents";
    /// `CorsairUnsubscribeFromEvents()`
    pub const UNSUBSCRIBE_FROM_EVENTS: &str = "CorsairUnsubscribeFromEvents";
    /// `CorsairSetLedColors(deviceId, size, ledColors)`
    pub const SET_LED_COLORS: &str = "CorsairSetLedColors";
    /// `CorsairGetDevices(filter, sizeMax, devices, size)`
    pub const GET_DEVICES: &str = "CorsairGetDevices";
    /// `CorsairRequestControl(deviceId, accessLevel)`
    pub const REQUEST_CONTROL: &str = "CorsairRequestControl";

    /// Every required entry point, in resolution order.
    pub const REQUIRED: [&str; 7] = [
        CONNECT,
        DISCONNECT,
        SUBSCRIBE_FOR_EVENTS,
        UNSUBSCRIBE_FROM_EVENTS,
        SET_LED_COLORS,
        GET_DEVICES,
        REQUEST_CONTROL,
    ];
}
