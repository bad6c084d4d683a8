//! Runtime bridge to the Corsair iCUE SDK.
//!
//! The vendor ships the SDK only as a dynamic library with a C ABI and
//! delivers session changes and key events through callbacks on a thread it
//! owns. This crate provides:
//! - Discovery of the library across install layouts, with all-or-nothing
//!   entry-point resolution
//! - A session state machine that subscribes for events exactly once per
//!   connection
//! - A bounded queue that turns vendor callbacks into non-blocking polls
//! - Stateless device enumeration, control requests and LED color calls
//! - A [`Keyboard`] controller addressing keys by name
//!
//! # Threading
//!
//! Vendor callbacks never block on consumer work and never unwind into C.
//! The event queue, session state and subscription progress share one mutex,
//! which is never held while the vendor is called. Disconnect waits for a
//! subscribe running on the vendor thread, and shutdown waits for every
//! callback-thread call into the library before unloading it.
//!
//! # Example
//!
//! ```rust,no_run
//! use cuebridge::{Bridge, BridgeConfig, SessionState};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), cuebridge::BridgeError> {
//!     let mut config = BridgeConfig::default();
//!     config.apply_env_overrides()?;
//!
//!     let bridge = Bridge::new(config)?;
//!     bridge.load_library()?;
//!     bridge.connect()?;
//!     bridge.wait_for_state(SessionState::Connected, Duration::from_millis(500));
//!
//!     for event in bridge.poll_events() {
//!         println!("key {} pressed={}", event.key_id, event.is_pressed);
//!     }
//!     bridge.shutdown();
//!     Ok(())
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bridge;
mod callbacks;
pub mod config;
pub mod devices;
pub mod entry_points;
pub mod error;
pub mod events;
pub mod hub;
pub mod keyboard;
pub mod native;
pub mod platform;
pub mod prelude;
pub mod resolver;
pub mod session;
pub mod vendor;

pub use bridge::Bridge;
pub use config::{BridgeConfig, BridgeConfigBuilder, DeviceConfig, EventQueueConfig, ResolverConfig};
pub use devices::DeviceControl;
pub use error::{BridgeError, BridgeResult, CandidateAttempt, CandidateFailure};
pub use events::{
    EventQueue, EventStats, KeyEvent, MAX_EVENT_CAPACITY, OverflowPolicy, PushOutcome, RawEvent,
};
pub use hub::{CallbackHub, CallbackRegistration};
pub use keyboard::{KeyAction, Keyboard, KeyboardOptions};
pub use native::{DynamicLibraryOpener, NativeSdk};
pub use resolver::{Candidate, CandidateOrigin, LibraryInfo, LibraryOpener, Resolver, candidate_paths};
pub use session::{
    DisconnectReport, SessionDetails, SessionState, StepOutcome, Subscription, Version,
};
pub use vendor::{AccessLevel, DeviceDescriptor, DeviceFilter, DeviceId, LedColor, Rgb, VendorSdk};

pub use cuebridge_abi as abi;
