//! Location of the module this crate is linked into.
//!
//! The vendor library is commonly shipped next to the binding, so the
//! directory holding the current module is the first place searched after an
//! explicit override.

use std::path::{Path, PathBuf};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as imp;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as imp;

/// Prefix Windows adds to extended-length paths.
const EXTENDED_LENGTH_PREFIX: &str = r"\\?\";

/// Full path of the executable or shared object containing this crate.
pub fn module_path() -> Option<PathBuf> {
    #[cfg(any(windows, unix))]
    {
        imp::module_path()
    }
    #[cfg(not(any(windows, unix)))]
    {
        None
    }
}

/// Directory containing the current module, normalized.
pub fn module_dir() -> Option<PathBuf> {
    let path = module_path()?;
    let dir = module_dir_from_path(&path.to_string_lossy());
    tracing::trace!(module = %path.display(), dir = ?dir, "Resolved module directory");
    dir
}

/// Strip any extended-length prefix and the file name from a module path.
///
/// Both `\` and `/` are treated as separators so the result does not depend
/// on the host platform. Returns `None` when no directory remains.
pub fn module_dir_from_path(path: &str) -> Option<PathBuf> {
    let path = path.strip_prefix(EXTENDED_LENGTH_PREFIX).unwrap_or(path);
    let separator = path.rfind(['\\', '/'])?;
    let dir = &path[..separator];
    if dir.is_empty() {
        // Module at the filesystem root, e.g. "/libfoo.so".
        return Some(PathBuf::from(&path[..=separator]));
    }
    Some(Path::new(dir).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_length_prefix_is_stripped() {
        assert_eq!(
            module_dir_from_path(r"\\?\C:\Program Files\App\binding.node"),
            Some(PathBuf::from(r"C:\Program Files\App"))
        );
    }

    #[test]
    fn test_plain_windows_path() {
        assert_eq!(
            module_dir_from_path(r"D:\build\Release\icue.node"),
            Some(PathBuf::from(r"D:\build\Release"))
        );
    }

    #[test]
    fn test_unix_path() {
        assert_eq!(
            module_dir_from_path("/usr/lib/app/libcuebridge.so"),
            Some(PathBuf::from("/usr/lib/app"))
        );
        assert_eq!(
            module_dir_from_path("/libcuebridge.so"),
            Some(PathBuf::from("/"))
        );
    }

    #[test]
    fn test_bare_file_name_has_no_directory() {
        assert_eq!(module_dir_from_path("binding.node"), None);
        assert_eq!(module_dir_from_path(""), None);
    }

    #[cfg(any(windows, target_os = "linux"))]
    #[test]
    fn test_current_module_is_found() {
        assert!(module_path().is_some());
    }
}
