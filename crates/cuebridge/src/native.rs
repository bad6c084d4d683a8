//! [`VendorSdk`] backed by the real vendor library.

use std::ffi::c_int;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cuebridge_abi::{CORSAIR_DEVICE_COUNT_MAX, CorsairDeviceInfo, CorsairError, CorsairLedColor};
use libloading::Library;
use parking_lot::Mutex;

use crate::entry_points::EntryPoints;
use crate::error::CandidateFailure;
use crate::hub::CallbackRegistration;
use crate::resolver::LibraryOpener;
use crate::vendor::{AccessLevel, DeviceDescriptor, DeviceFilter, DeviceId, LedColor, VendorSdk};

/// A loaded vendor library and its entry-point table.
///
/// Fields drop in declaration order: the library is unloaded before the
/// callback registrations it may still reference are released.
pub struct NativeSdk {
    path: PathBuf,
    entry_points: EntryPoints,
    library: Library,
    registrations: Mutex<Vec<CallbackRegistration>>,
}

impl NativeSdk {
    /// Load `path` and resolve every required entry point.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateFailure::NotLoadable`] if the OS loader fails and
    /// [`CandidateFailure::MissingEntryPoints`] if exports are missing. The
    /// library is unloaded in both cases.
    pub fn open(path: &Path) -> Result<Self, CandidateFailure> {
        // SAFETY: loading runs the library's initializers. Only the vendor
        // SDK is expected at the candidate paths.
        let library = unsafe { Library::new(path) }
            .map_err(|e| CandidateFailure::not_loadable(e.to_string()))?;

        // SAFETY: the vendor header fixes each export's signature, and the
        // table never outlives `library` because both live in `Self`.
        let entry_points = unsafe { EntryPoints::resolve(&library) }?;

        Ok(Self {
            path: path.to_path_buf(),
            entry_points,
            library,
            registrations: Mutex::new(Vec::new()),
        })
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the hub behind `registration` alive until the library unloads.
    fn retain(&self, registration: &CallbackRegistration) {
        let mut registrations = self.registrations.lock();
        if !registrations
            .iter()
            .any(|held| Arc::ptr_eq(held.hub(), registration.hub()))
        {
            registrations.push(registration.clone());
        }
    }
}

impl VendorSdk for NativeSdk {
    fn connect(&self, registration: &CallbackRegistration) -> CorsairError {
        self.retain(registration);
        // SAFETY: the handler matches the declared signature and the context
        // stays alive while `self.registrations` holds it.
        unsafe { (self.entry_points.connect)(registration.session_handler(), registration.context()) }
    }

    fn disconnect(&self) -> CorsairError {
        // SAFETY: no arguments; resolved from the loaded library.
        unsafe { (self.entry_points.disconnect)() }
    }

    fn subscribe_for_events(&self, registration: &CallbackRegistration) -> CorsairError {
        self.retain(registration);
        // SAFETY: as for `connect`.
        unsafe {
            (self.entry_points.subscribe_for_events)(
                registration.event_handler(),
                registration.context(),
            )
        }
    }

    fn unsubscribe_from_events(&self) -> CorsairError {
        // SAFETY: no arguments; resolved from the loaded library.
        unsafe { (self.entry_points.unsubscribe_from_events)() }
    }

    fn get_devices(
        &self,
        filter: DeviceFilter,
        capacity: usize,
    ) -> Result<Vec<DeviceDescriptor>, CorsairError> {
        let capacity = capacity.min(CORSAIR_DEVICE_COUNT_MAX);
        if capacity == 0 {
            return Ok(Vec::new());
        }
        let raw_filter = filter.to_raw();
        let mut buffer = vec![CorsairDeviceInfo::zeroed(); capacity];
        let mut size: c_int = 0;
        let Ok(size_max) = c_int::try_from(capacity) else {
            return Err(CorsairError::INVALID_ARGUMENTS);
        };

        // SAFETY: `buffer` has room for `size_max` records and every pointer
        // refers to a live local.
        let status = unsafe {
            (self.entry_points.get_devices)(&raw_filter, size_max, buffer.as_mut_ptr(), &mut size)
        };
        if !status.is_success() {
            return Err(status);
        }

        let reported = usize::try_from(size).unwrap_or(0).min(capacity);
        Ok(buffer[..reported]
            .iter()
            .map(DeviceDescriptor::from_raw)
            .collect())
    }

    fn request_control(&self, device_id: &DeviceId, access: AccessLevel) -> CorsairError {
        // SAFETY: the id is NUL-terminated and shorter than the vendor field.
        unsafe { (self.entry_points.request_control)(device_id.as_c_str().as_ptr(), access.to_raw()) }
    }

    fn set_led_colors(&self, device_id: &DeviceId, colors: &[LedColor]) -> CorsairError {
        let raw: Vec<CorsairLedColor> = colors.iter().map(|c| c.to_raw()).collect();
        let Ok(size) = c_int::try_from(raw.len()) else {
            return CorsairError::INVALID_ARGUMENTS;
        };
        // SAFETY: `raw` holds `size` records; the id is NUL-terminated.
        unsafe {
            (self.entry_points.set_led_colors)(device_id.as_c_str().as_ptr(), size, raw.as_ptr())
        }
    }
}

impl fmt::Debug for NativeSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSdk")
            .field("path", &self.path)
            .field("entry_points", &self.entry_points)
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}

/// Opens candidates with the OS dynamic loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLibraryOpener;

impl LibraryOpener for DynamicLibraryOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn VendorSdk>, CandidateFailure> {
        let sdk = NativeSdk::open(path)?;
        Ok(Arc::new(sdk))
    }
}
