//! Resolution of the vendor entry-point table.
//!
//! Resolution is all-or-nothing: an [`EntryPoints`] value only exists when
//! every name in [`entry_point::REQUIRED`] produced a non-null address.

use std::ffi::c_void;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use cuebridge_abi::{
    CorsairConnectFn, CorsairDisconnectFn, CorsairGetDevicesFn, CorsairRequestControlFn,
    CorsairSetLedColorsFn, CorsairSubscribeForEventsFn, CorsairUnsubscribeFromEventsFn,
    entry_point,
};
use libloading::Library;

use crate::error::CandidateFailure;

/// Source of exported symbol addresses.
pub trait SymbolLookup {
    /// Address of the export called `name`, if present and non-null.
    fn address(&self, name: &str) -> Option<NonNull<c_void>>;
}

impl SymbolLookup for Library {
    fn address(&self, name: &str) -> Option<NonNull<c_void>> {
        // SAFETY: the symbol is only read as an address, never called or
        // dereferenced here.
        let symbol = unsafe { self.get::<*mut c_void>(name.as_bytes()) }.ok()?;
        NonNull::new(*symbol)
    }
}

/// Names from [`entry_point::REQUIRED`] that `lookup` cannot resolve.
pub fn missing_entry_points(lookup: &impl SymbolLookup) -> Vec<&'static str> {
    entry_point::REQUIRED
        .iter()
        .copied()
        .filter(|name| lookup.address(name).is_none())
        .collect()
}

/// Typed function pointers for every required entry point.
#[derive(Clone, Copy)]
pub struct EntryPoints {
    pub(crate) connect: CorsairConnectFn,
    pub(crate) disconnect: CorsairDisconnectFn,
    pub(crate) subscribe_for_events: CorsairSubscribeForEventsFn,
    pub(crate) unsubscribe_from_events: CorsairUnsubscribeFromEventsFn,
    pub(crate) set_led_colors: CorsairSetLedColorsFn,
    pub(crate) get_devices: CorsairGetDevicesFn,
    pub(crate) request_control: CorsairRequestControlFn,
}

impl EntryPoints {
    /// Resolve every required entry point or report all that are missing.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateFailure::MissingEntryPoints`] listing each name
    /// that did not resolve.
    ///
    /// # Safety
    ///
    /// Each resolved address must be a function with the signature declared
    /// for its name in `cuebridge_abi`, and must stay valid for as long as the
    /// returned table is used.
    pub unsafe fn resolve(lookup: &impl SymbolLookup) -> Result<Self, CandidateFailure> {
        let missing = missing_entry_points(lookup);
        if !missing.is_empty() {
            return Err(CandidateFailure::missing(missing));
        }
        let address = |name: &'static str| {
            lookup
                .address(name)
                .ok_or_else(|| CandidateFailure::missing(vec![name]))
        };

        let connect = address(entry_point::CONNECT)?;
        let disconnect = address(entry_point::DISCONNECT)?;
        let subscribe_for_events = address(entry_point::SUBSCRIBE_FOR_EVENTS)?;
        let unsubscribe_from_events = address(entry_point::UNSUBSCRIBE_FROM_EVENTS)?;
        let set_led_colors = address(entry_point::SET_LED_COLORS)?;
        let get_devices = address(entry_point::GET_DEVICES)?;
        let request_control = address(entry_point::REQUEST_CONTROL)?;

        // SAFETY (all fields below): the caller guarantees each address has
        // the signature declared for its name.
        Ok(Self {
            // SAFETY: see above.
            connect: unsafe { cast_fn(connect) },
            // SAFETY: see above.
            disconnect: unsafe { cast_fn(disconnect) },
            // SAFETY: see above.
            subscribe_for_events: unsafe { cast_fn(subscribe_for_events) },
            // SAFETY: see above.
            unsubscribe_from_events: unsafe { cast_fn(unsubscribe_from_events) },
            // SAFETY: see above.
            set_led_colors: unsafe { cast_fn(set_led_colors) },
            // SAFETY: see above.
            get_devices: unsafe { cast_fn(get_devices) },
            // SAFETY: see above.
            request_control: unsafe { cast_fn(request_control) },
        })
    }
}

/// Reinterpret a symbol address as a function pointer.
///
/// # Safety
///
/// `F` must be a function pointer type matching the export at `address`.
unsafe fn cast_fn<F: Copy>(address: NonNull<c_void>) -> F {
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut c_void>());
    let raw = address.as_ptr();
    // SAFETY: `F` is a pointer-sized function pointer type per the contract.
    unsafe { mem::transmute_copy::<*mut c_void, F>(&raw) }
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints")
            .field("connect", &(self.connect as *const ()))
            .field("disconnect", &(self.disconnect as *const ()))
            .field("get_devices", &(self.get_devices as *const ()))
            .finish_non_exhaustive()
    }
}
