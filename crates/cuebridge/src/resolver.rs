//! Vendor library discovery.
//!
//! Candidates are built in a fixed order and tried one at a time. The first
//! one that opens and exports every required entry point wins; a library
//! that opens but lacks exports is unloaded before the next candidate.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::error::{BridgeError, BridgeResult, CandidateAttempt, CandidateFailure};
use crate::platform;
use crate::vendor::VendorSdk;

/// Where a candidate path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// `sdk_path` from configuration or `CUEBRIDGE_SDK_PATH`.
    Override,
    /// Directory of the module this crate is linked into.
    ModuleDir,
    /// `extra_dirs` from configuration.
    ConfiguredDir,
    /// Well-known vendor installation directory.
    InstallDir,
    /// Directory relative to the working directory.
    RelativeDir,
    /// Bare file name resolved by the OS loader.
    SystemSearch,
}

impl fmt::Display for CandidateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Override => "override",
            Self::ModuleDir => "module dir",
            Self::ConfiguredDir => "configured dir",
            Self::InstallDir => "install dir",
            Self::RelativeDir => "relative dir",
            Self::SystemSearch => "system search path",
        };
        f.write_str(name)
    }
}

/// One location to try.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Path handed to the opener.
    pub path: PathBuf,
    /// Where it came from.
    pub origin: CandidateOrigin,
}

/// Opens a library file and produces a vendor implementation.
pub trait LibraryOpener: Send + Sync {
    /// Open `path` and resolve every required entry point.
    ///
    /// # Errors
    ///
    /// Returns why the candidate cannot be used. Implementations must not
    /// keep anything loaded when they fail.
    fn open(&self, path: &Path) -> Result<Arc<dyn VendorSdk>, CandidateFailure>;
}

/// Details of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    /// Path that was loaded.
    pub path: PathBuf,
    /// Where the winning path came from.
    pub origin: CandidateOrigin,
    /// Zero-based index of the winner in the candidate list.
    pub candidate_index: usize,
    /// Candidates rejected before the winner, in order.
    pub attempts: Vec<CandidateAttempt>,
}

/// Build the ordered, de-duplicated candidate list.
///
/// `module_dir` is only used when `config.search_module_dir` is set.
pub fn candidate_paths(config: &ResolverConfig, module_dir: Option<&Path>) -> Vec<Candidate> {
    let library_name = Path::new(&config.library_name);
    let mut candidates = Vec::new();

    if let Some(sdk_path) = &config.sdk_path {
        let path = if sdk_path.is_dir() {
            sdk_path.join(library_name)
        } else {
            sdk_path.clone()
        };
        candidates.push(Candidate {
            path,
            origin: CandidateOrigin::Override,
        });
    }

    if config.search_module_dir {
        if let Some(dir) = module_dir {
            candidates.push(Candidate {
                path: dir.join(library_name),
                origin: CandidateOrigin::ModuleDir,
            });
        }
    }

    let dir_groups = [
        (&config.extra_dirs, CandidateOrigin::ConfiguredDir),
        (&config.install_dirs, CandidateOrigin::InstallDir),
        (&config.relative_dirs, CandidateOrigin::RelativeDir),
    ];
    for (dirs, origin) in dir_groups {
        candidates.extend(dirs.iter().map(|dir| Candidate {
            path: dir.join(library_name),
            origin,
        }));
    }

    if config.search_default_path {
        candidates.push(Candidate {
            path: library_name.to_path_buf(),
            origin: CandidateOrigin::SystemSearch,
        });
    }

    let mut seen = HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.path.clone()));
    candidates
}

/// Walks the candidate list with an opener.
pub struct Resolver<'a> {
    config: &'a ResolverConfig,
    opener: &'a dyn LibraryOpener,
}

impl<'a> Resolver<'a> {
    /// Create a resolver.
    pub fn new(config: &'a ResolverConfig, opener: &'a dyn LibraryOpener) -> Self {
        Self { config, opener }
    }

    /// Candidates in the order they will be tried.
    pub fn candidates(&self) -> Vec<Candidate> {
        let module_dir = if self.config.search_module_dir {
            platform::module_dir()
        } else {
            None
        };
        candidate_paths(self.config, module_dir.as_deref())
    }

    /// Try every candidate until one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::LoadFailed`] carrying every attempt when no
    /// candidate is usable.
    pub fn resolve(&self) -> BridgeResult<(Arc<dyn VendorSdk>, LibraryInfo)> {
        let candidates = self.candidates();
        let mut attempts = Vec::new();

        for (index, candidate) in candidates.into_iter().enumerate() {
            tracing::debug!(
                index,
                path = %candidate.path.display(),
                origin = %candidate.origin,
                "Trying iCUE SDK candidate"
            );
            match self.opener.open(&candidate.path) {
                Ok(sdk) => {
                    tracing::info!(
                        path = %candidate.path.display(),
                        origin = %candidate.origin,
                        rejected = attempts.len(),
                        "iCUE SDK loaded"
                    );
                    let info = LibraryInfo {
                        path: candidate.path,
                        origin: candidate.origin,
                        candidate_index: index,
                        attempts,
                    };
                    return Ok((sdk, info));
                }
                Err(failure) => {
                    tracing::debug!(
                        path = %candidate.path.display(),
                        %failure,
                        "iCUE SDK candidate rejected"
                    );
                    attempts.push(CandidateAttempt {
                        path: candidate.path,
                        failure,
                    });
                }
            }
        }

        tracing::warn!(attempts = attempts.len(), "No usable iCUE SDK found");
        Err(BridgeError::LoadFailed { attempts })
    }
}
