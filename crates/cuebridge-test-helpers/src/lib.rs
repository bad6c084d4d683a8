//! Shared test utilities for cuebridge.
//!
//! # Modules
//!
//! - [`mock`] - [`mock::FakeVendor`], an in-process vendor library, and
//!   [`mock::ScriptedOpener`], which decides per path whether a candidate loads
//! - [`tracking`] - Allocation counting for the vendor callback path
//! - [`fixtures`] - Device descriptors and search configurations
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```rust,ignore
//! use cuebridge_test_helpers::prelude::*;
//!
//! let vendor = FakeVendor::new();
//! let opener = ScriptedOpener::new().load_any(&vendor);
//! let bridge = Bridge::with_opener(config_for(&candidate_dirs(1)), opener.clone())?;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod fixtures;
pub mod prelude;

#[cfg(feature = "tracking")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracking")))]
pub mod tracking;

#[cfg(all(test, feature = "tracking"))]
#[global_allocator]
static GLOBAL_TEST: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(feature = "mock")]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

#[cfg(feature = "tracking")]
pub use tracking::track;
