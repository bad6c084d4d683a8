//! Module lookup through `GetModuleHandleExW` and `GetModuleFileNameW`.

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;

use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::{
    GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS, GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
    GetModuleFileNameW, GetModuleHandleExW,
};
use windows::core::PCWSTR;

/// Longest path `GetModuleFileNameW` can return with the `\\?\` prefix.
const MAX_EXTENDED_PATH: usize = 32_768;

pub(super) fn module_path() -> Option<PathBuf> {
    let anchor: fn() -> Option<PathBuf> = module_path;
    let mut module = HMODULE::default();

    // SAFETY: with FROM_ADDRESS the name argument is read as an address inside
    // this module, and UNCHANGED_REFCOUNT means no handle must be released.
    let found = unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            PCWSTR(anchor as *const u16),
            &mut module,
        )
    };
    if let Err(e) = found {
        tracing::debug!(error = %e, "GetModuleHandleExW failed");
        return None;
    }

    let mut buffer = vec![0u16; MAX_EXTENDED_PATH];
    // SAFETY: `module` is a valid handle for a module that stays loaded while
    // this code runs; the buffer length is passed through the slice.
    let len = unsafe { GetModuleFileNameW(Some(module), &mut buffer) } as usize;
    if len == 0 || len >= buffer.len() {
        tracing::debug!(len, "GetModuleFileNameW returned no usable path");
        return None;
    }

    Some(PathBuf::from(OsString::from_wide(&buffer[..len])))
}
