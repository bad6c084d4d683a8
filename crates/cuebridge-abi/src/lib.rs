//! C ABI definitions for the Corsair iCUE SDK v4.
//!
//! This crate mirrors the parts of `iCUESDK.h` that cuebridge consumes:
//! - Status codes, session states and event ids as transparent integer newtypes
//! - `#[repr(C)]` event, device and LED structures with layout assertions
//! - Entry-point function signatures and their exported names
//! - LED logical id encoding and the named key tables
//!
//! # ABI Stability
//!
//! Every structure matches the vendor header byte for byte on the supported
//! targets. Sizes of the pointer-free structures are checked at compile time.
//! Vendor enums never become Rust enums, so unknown values coming back from
//! the SDK are representable.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod constants;
pub mod keys;
pub mod prelude;
pub mod types;

pub use constants::{
    CORSAIR_DEVICE_COUNT_MAX, CORSAIR_DEVICE_LEDCOUNT_MAX, CORSAIR_STRING_SIZE_M,
    CORSAIR_STRING_SIZE_S, SDK_LIBRARY_BASE_NAME, entry_point,
};
pub use keys::{G_KEY_NAMES, LED_KEYS, LedGroup, LedLuid, MACRO_KEYS, led_key, macro_key_id, macro_key_name};
pub use types::*;
