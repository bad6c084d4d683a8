//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use cuebridge_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{
    KEYBOARD_ID, MOUSE_ID, candidate_dirs, config_for, desk, keyboard, library_in, mouse,
};

#[cfg(feature = "tracking")]
pub use crate::tracking::{AllocationGuard, TrackingAllocator, track};

#[cfg(feature = "mock")]
pub use crate::mock::{
    ConnectBehavior, FakeVendor, ScriptedOpener, Statuses, VendorCall, VendorCommand, VendorThread,
};

pub use cuebridge::{Bridge, BridgeConfig, BridgeError, SessionState};
