//! Module lookup through `dladdr`.

use std::ffi::{CStr, OsStr};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

pub(super) fn module_path() -> Option<PathBuf> {
    let anchor: fn() -> Option<PathBuf> = module_path;
    let mut info = MaybeUninit::<libc::Dl_info>::zeroed();

    // SAFETY: `anchor` is an address inside this module and `info` is a
    // writable `Dl_info`.
    let found = unsafe { libc::dladdr(anchor as *const libc::c_void, info.as_mut_ptr()) };
    if found == 0 {
        tracing::debug!("dladdr found no module for the current code");
        return None;
    }

    // SAFETY: `dladdr` succeeded and initialized the structure; it was also
    // zeroed beforehand.
    let info = unsafe { info.assume_init() };
    if info.dli_fname.is_null() {
        return None;
    }

    // SAFETY: `dli_fname` is a NUL-terminated string owned by the loader and
    // valid while the module stays loaded.
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    if name.is_empty() {
        // Some loaders leave the main executable unnamed.
        return std::env::current_exe().ok();
    }
    Some(PathBuf::from(OsStr::from_bytes(name.to_bytes())))
}
