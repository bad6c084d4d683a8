//! Bridge configuration.
//!
//! Everything has a working default. A configuration can be read from YAML or
//! JSON, and three environment variables override individual fields.

use std::path::{Path, PathBuf};

use cuebridge_abi::{CORSAIR_DEVICE_COUNT_MAX, SDK_LIBRARY_BASE_NAME};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::events::{MAX_EVENT_CAPACITY, OverflowPolicy};
use crate::vendor::AccessLevel;

/// Explicit library path or directory, tried before anything else.
pub const ENV_SDK_PATH: &str = "CUEBRIDGE_SDK_PATH";
/// Overrides [`EventQueueConfig::capacity`].
pub const ENV_EVENT_CAPACITY: &str = "CUEBRIDGE_EVENT_CAPACITY";
/// Overrides [`EventQueueConfig::poll_batch`].
pub const ENV_POLL_BATCH: &str = "CUEBRIDGE_POLL_BATCH";

/// Vendor installation directories searched after configured ones.
pub const DEFAULT_INSTALL_DIRS: [&str; 7] = [
    r"C:\Program Files\Corsair\SDK",
    r"C:\Program Files\Corsair",
    r"C:\Program Files\Corsair\Corsair iCUE5 Software",
    r"C:\Program Files (x86)\Corsair\SDK",
    r"C:\Program Files (x86)\Corsair",
    r"C:\Program Files\Corsair\CORSAIR iCUE 4\system",
    r"C:\Program Files\Corsair\CORSAIR iCUE\system",
];

/// Directories relative to the working directory searched last.
pub const DEFAULT_RELATIVE_DIRS: [&str; 2] = [".", "build/Release"];

/// Where and how to look for the vendor library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// File name of the library (`iCUESDK.dll`, `libiCUESDK.so`).
    pub library_name: String,
    /// Library file or directory tried first.
    pub sdk_path: Option<PathBuf>,
    /// Whether to search the directory of the current module.
    pub search_module_dir: bool,
    /// Additional directories, searched after the module directory.
    pub extra_dirs: Vec<PathBuf>,
    /// Vendor installation directories.
    pub install_dirs: Vec<PathBuf>,
    /// Working-directory relative locations.
    pub relative_dirs: Vec<PathBuf>,
    /// Whether to finish with the bare library name and the OS search path.
    pub search_default_path: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            library_name: default_library_name(),
            sdk_path: None,
            search_module_dir: true,
            extra_dirs: Vec::new(),
            install_dirs: DEFAULT_INSTALL_DIRS.iter().map(PathBuf::from).collect(),
            relative_dirs: DEFAULT_RELATIVE_DIRS.iter().map(PathBuf::from).collect(),
            search_default_path: true,
        }
    }
}

impl ResolverConfig {
    /// Only the given directories, in order, then nothing else.
    ///
    /// Useful for tests and for hosts that ship the library themselves.
    pub fn only_dirs(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_module_dir: false,
            extra_dirs: dirs.into_iter().map(Into::into).collect(),
            install_dirs: Vec::new(),
            relative_dirs: Vec::new(),
            search_default_path: false,
            ..Self::default()
        }
    }
}

/// Platform file name for the vendor library.
pub fn default_library_name() -> String {
    libloading::library_filename(SDK_LIBRARY_BASE_NAME)
        .to_string_lossy()
        .into_owned()
}

/// Event queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQueueConfig {
    /// Maximum number of pending key events.
    pub capacity: usize,
    /// What happens when a key event arrives and the queue is full.
    pub overflow: OverflowPolicy,
    /// Events returned by one `poll_events` call.
    pub poll_batch: usize,
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            overflow: OverflowPolicy::DropOldest,
            poll_batch: 100,
        }
    }
}

/// Device control defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Devices requested by `keyboards()`.
    pub enumerate_capacity: usize,
    /// Level used by `request_control`.
    pub access_level: AccessLevel,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            enumerate_capacity: 10,
            access_level: AccessLevel::ExclusiveLightingControl,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Library search.
    pub resolver: ResolverConfig,
    /// Event queue.
    pub events: EventQueueConfig,
    /// Device operations.
    pub devices: DeviceConfig,
}

impl BridgeConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.resolver.library_name.trim().is_empty() {
            return Err(BridgeError::invalid_configuration(
                "resolver.library_name must not be empty",
            ));
        }
        if self.events.capacity == 0 || self.events.capacity > MAX_EVENT_CAPACITY {
            return Err(BridgeError::invalid_configuration(format!(
                "events.capacity must be between 1 and {MAX_EVENT_CAPACITY}"
            )));
        }
        if self.events.poll_batch == 0 {
            return Err(BridgeError::invalid_configuration(
                "events.poll_batch must be greater than 0",
            ));
        }
        if self.devices.enumerate_capacity == 0
            || self.devices.enumerate_capacity > CORSAIR_DEVICE_COUNT_MAX
        {
            return Err(BridgeError::invalid_configuration(format!(
                "devices.enumerate_capacity must be between 1 and {CORSAIR_DEVICE_COUNT_MAX}"
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Parse YAML.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed input or invalid values.
    pub fn from_yaml_str(text: &str) -> BridgeResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed input or invalid values.
    pub fn from_json_str(text: &str) -> BridgeResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, choosing JSON for `.json` and YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        tracing::debug!(path = %path.display(), is_json, "Loading bridge configuration");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse or the result
    /// fails validation.
    pub fn apply_env_overrides(&mut self) -> BridgeResult<()> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::apply_env_overrides`].
    pub fn apply_env_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> BridgeResult<()> {
        if let Some(path) = lookup(ENV_SDK_PATH).filter(|v| !v.trim().is_empty()) {
            self.resolver.sdk_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(ENV_EVENT_CAPACITY) {
            self.events.capacity = parse_count(ENV_EVENT_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_BATCH) {
            self.events.poll_batch = parse_count(ENV_POLL_BATCH, &value)?;
        }
        self.validate()
    }
}

fn parse_count(key: &str, value: &str) -> BridgeResult<usize> {
    value.trim().parse().map_err(|e| {
        BridgeError::invalid_configuration(format!("{key}={value:?} is not a count: {e}"))
    })
}

/// Builder for `BridgeConfig`.
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Replace the resolver section.
    #[must_use]
    pub fn resolver(mut self, resolver: ResolverConfig) -> Self {
        self.config.resolver = resolver;
        self
    }

    /// Set the explicit library path or directory.
    #[must_use]
    pub fn sdk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.resolver.sdk_path = Some(path.into());
        self
    }

    /// Append a search directory.
    #[must_use]
    pub fn extra_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.resolver.extra_dirs.push(dir.into());
        self
    }

    /// Set the event queue capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.events.capacity = capacity;
        self
    }

    /// Set the overflow policy.
    #[must_use]
    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.config.events.overflow = policy;
        self
    }

    /// Set the per-poll batch size.
    #[must_use]
    pub fn poll_batch(mut self, batch: usize) -> Self {
        self.config.events.poll_batch = batch;
        self
    }

    /// Set the keyboard enumeration capacity.
    #[must_use]
    pub fn enumerate_capacity(mut self, capacity: usize) -> Self {
        self.config.devices.enumerate_capacity = capacity;
        self
    }

    /// Set the access level for `request_control`.
    #[must_use]
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.config.devices.access_level = level;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> BridgeResult<BridgeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_defaults_are_valid() -> TestResult {
        let config = BridgeConfig::default();
        config.validate()?;
        assert_eq!(config.events.capacity, 4096);
        assert_eq!(config.events.poll_batch, 100);
        assert_eq!(config.devices.enumerate_capacity, 10);
        assert_eq!(config.resolver.install_dirs.len(), 7);
        assert!(config.resolver.library_name.contains("iCUESDK"));
        Ok(())
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let result = BridgeConfig::builder().event_capacity(0).build();
        assert!(matches!(result, Err(BridgeError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_builder_bounds_event_capacity() -> TestResult {
        let config = BridgeConfig::builder()
            .event_capacity(MAX_EVENT_CAPACITY)
            .build()?;
        assert_eq!(config.events.capacity, MAX_EVENT_CAPACITY);

        let result = BridgeConfig::builder()
            .event_capacity(MAX_EVENT_CAPACITY + 1)
            .build();
        assert!(matches!(result, Err(BridgeError::InvalidConfiguration(_))));
        Ok(())
    }

    #[test]
    fn test_builder_rejects_oversized_enumeration() {
        let result = BridgeConfig::builder().enumerate_capacity(65).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> TestResult {
        let config = BridgeConfig::from_yaml_str(
            "events:\n  capacity: 16\n  overflow: reject_new\nresolver:\n  extra_dirs: [\"/opt/icue\"]\n",
        )?;
        assert_eq!(config.events.capacity, 16);
        assert_eq!(config.events.overflow, OverflowPolicy::RejectNew);
        assert_eq!(config.events.poll_batch, 100);
        assert_eq!(config.resolver.extra_dirs, vec![PathBuf::from("/opt/icue")]);
        assert!(config.resolver.search_module_dir);
        Ok(())
    }

    #[test]
    fn test_json_access_level() -> TestResult {
        let config = BridgeConfig::from_json_str(r#"{"devices":{"access_level":"shared"}}"#)?;
        assert_eq!(config.devices.access_level, AccessLevel::Shared);
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> TestResult {
        let env: HashMap<&str, &str> = [
            (ENV_SDK_PATH, "/opt/corsair/libiCUESDK.so"),
            (ENV_EVENT_CAPACITY, " 32 "),
            (ENV_POLL_BATCH, "8"),
        ]
        .into_iter()
        .collect();
        let mut config = BridgeConfig::default();
        config.apply_env_overrides_from(|key| env.get(key).map(ToString::to_string))?;
        assert_eq!(
            config.resolver.sdk_path,
            Some(PathBuf::from("/opt/corsair/libiCUESDK.so"))
        );
        assert_eq!(config.events.capacity, 32);
        assert_eq!(config.events.poll_batch, 8);
        Ok(())
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = BridgeConfig::default();
        let result = config.apply_env_overrides_from(|key| {
            (key == ENV_POLL_BATCH).then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(BridgeError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_blank_sdk_path_is_ignored() -> TestResult {
        let mut config = BridgeConfig::default();
        config.apply_env_overrides_from(|key| (key == ENV_SDK_PATH).then(|| "  ".to_string()))?;
        assert!(config.resolver.sdk_path.is_none());
        Ok(())
    }

    #[test]
    fn test_only_dirs_disables_other_sources() {
        let resolver = ResolverConfig::only_dirs(["a", "b"]);
        assert!(!resolver.search_module_dir);
        assert!(!resolver.search_default_path);
        assert!(resolver.install_dirs.is_empty());
        assert_eq!(resolver.extra_dirs.len(), 2);
    }
}
