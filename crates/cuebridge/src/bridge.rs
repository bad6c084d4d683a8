//! The [`Bridge`] context object.
//!
//! A bridge owns at most one loaded vendor library, the callback hub the
//! vendor talks to, and the configuration. Every operation can be called from
//! any thread.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cuebridge_abi::{CorsairError, LedLuid};
use parking_lot::RwLock;

use crate::config::BridgeConfig;
use crate::devices::DeviceControl;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{EventStats, KeyEvent};
use crate::hub::{CallbackHub, CallbackRegistration};
use crate::native::DynamicLibraryOpener;
use crate::resolver::{Candidate, LibraryInfo, LibraryOpener, Resolver};
use crate::session::{DisconnectReport, SessionDetails, SessionState, StepOutcome};
use crate::vendor::{DeviceDescriptor, DeviceFilter, DeviceId, LedColor, Rgb, VendorSdk};

struct Loaded {
    sdk: Arc<dyn VendorSdk>,
    info: LibraryInfo,
}

/// Connection to the vendor SDK.
pub struct Bridge {
    config: BridgeConfig,
    opener: Box<dyn LibraryOpener>,
    registration: CallbackRegistration,
    loaded: RwLock<Option<Loaded>>,
}

impl Bridge {
    /// Create a bridge that loads the library with the OS dynamic loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        Self::with_opener(config, DynamicLibraryOpener)
    }

    /// Create a bridge with a custom library opener.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_opener(
        config: BridgeConfig,
        opener: impl LibraryOpener + 'static,
    ) -> BridgeResult<Self> {
        config.validate()?;
        let hub = CallbackHub::new(config.events.capacity, config.events.overflow);
        let registration = hub
            .registration()
            .ok_or_else(|| BridgeError::invalid_configuration("callback hub unavailable"))?;
        Ok(Self {
            config,
            opener: Box::new(opener),
            registration,
            loaded: RwLock::new(None),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Candidate paths in the order `load_library` tries them.
    pub fn candidates(&self) -> Vec<Candidate> {
        Resolver::new(&self.config.resolver, self.opener.as_ref()).candidates()
    }

    /// Locate and load the vendor library. Does nothing if already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::LoadFailed`] with every attempt when no
    /// candidate is usable.
    pub fn load_library(&self) -> BridgeResult<LibraryInfo> {
        let mut slot = self.loaded.write();
        if let Some(loaded) = slot.as_ref() {
            return Ok(loaded.info.clone());
        }

        let (sdk, info) = Resolver::new(&self.config.resolver, self.opener.as_ref()).resolve()?;
        self.hub().attach_vendor(&sdk);
        *slot = Some(Loaded {
            sdk,
            info: info.clone(),
        });
        Ok(info)
    }

    /// Whether a library is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.read().is_some()
    }

    /// Details of the loaded library.
    pub fn library_info(&self) -> Option<LibraryInfo> {
        self.loaded.read().as_ref().map(|loaded| loaded.info.clone())
    }

    /// Ask the vendor to connect, returning its raw status.
    ///
    /// The session reaches Connected later, on the vendor's thread.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotLoaded`] before a successful load.
    pub fn connect_with_status(&self) -> BridgeResult<CorsairError> {
        let sdk = self.sdk()?;
        let hub = self.hub();
        hub.begin_connect();
        let status = sdk.connect(&self.registration);
        if status.is_success() {
            tracing::debug!("Connect request accepted");
        } else {
            hub.connect_rejected();
            tracing::warn!(%status, "Connect request rejected");
        }
        Ok(status)
    }

    /// Ask the vendor to connect.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotLoaded`] before a successful load.
    pub fn connect(&self) -> BridgeResult<bool> {
        Ok(self.connect_with_status()?.is_success())
    }

    /// Unsubscribe if needed, then disconnect. Never fails.
    ///
    /// The session is Disconnected afterwards whatever the vendor returns. A
    /// subscribe in progress on the vendor thread finishes first.
    pub fn disconnect(&self) -> DisconnectReport {
        let sdk = self.loaded.read().as_ref().map(|loaded| Arc::clone(&loaded.sdk));
        let was_subscribed = self.hub().begin_disconnect();

        let Some(sdk) = sdk else {
            tracing::debug!("Disconnect without a loaded library");
            return DisconnectReport::not_attempted();
        };

        let unsubscribe = if was_subscribed {
            StepOutcome::from_status(sdk.unsubscribe_from_events())
        } else {
            StepOutcome::Skipped
        };
        let disconnect = StepOutcome::from_status(sdk.disconnect());
        let report = DisconnectReport {
            attempted: true,
            unsubscribe,
            disconnect,
        };
        tracing::debug!(?report, "Disconnected");
        report
    }

    /// Set one LED. Alpha is always 255.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotLoaded`] before a successful load and
    /// [`BridgeError::InvalidDeviceId`] for ids the SDK cannot accept.
    pub fn set_key_color(
        &self,
        device_id: &str,
        led_id: impl Into<LedLuid>,
        color: Rgb,
    ) -> BridgeResult<bool> {
        let sdk = self.sdk()?;
        let device_id = DeviceId::new(device_id)?;
        Ok(self
            .control(sdk.as_ref())
            .set_color(&device_id, led_id.into(), color))
    }

    /// Set several LEDs in one vendor call.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_key_color`].
    pub fn set_led_colors(&self, device_id: &str, colors: &[LedColor]) -> BridgeResult<bool> {
        let sdk = self.sdk()?;
        let device_id = DeviceId::new(device_id)?;
        Ok(self.control(sdk.as_ref()).set_colors(&device_id, colors))
    }

    /// Keyboards, up to the configured enumeration capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotLoaded`] before a successful load.
    pub fn keyboards(&self) -> BridgeResult<Vec<DeviceDescriptor>> {
        self.devices(
            DeviceFilter::keyboards(),
            self.config.devices.enumerate_capacity,
        )
    }

    /// Devices matching `filter`, at most `capacity` (clamped to 64).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotLoaded`] before a successful load.
    pub fn devices(
        &self,
        filter: DeviceFilter,
        capacity: usize,
    ) -> BridgeResult<Vec<DeviceDescriptor>> {
        let sdk = self.sdk()?;
        Ok(self.control(sdk.as_ref()).enumerate(filter, capacity))
    }

    /// Request control of a device at the configured access level.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_key_color`].
    pub fn request_control(&self, device_id: &str) -> BridgeResult<bool> {
        let sdk = self.sdk()?;
        let device_id = DeviceId::new(device_id)?;
        Ok(self.control(sdk.as_ref()).request_control(&device_id))
    }

    /// Drain up to the configured batch of key events.
    pub fn poll_events(&self) -> Vec<KeyEvent> {
        self.drain_events(self.config.events.poll_batch)
    }

    /// Drain up to `max` key events in arrival order.
    pub fn drain_events(&self, max: usize) -> Vec<KeyEvent> {
        self.hub().drain(max)
    }

    /// Current session state.
    pub fn session_state(&self) -> SessionState {
        self.hub().state()
    }

    /// Versions reported when the session connected.
    pub fn session_details(&self) -> Option<SessionDetails> {
        self.hub().details()
    }

    /// Whether an event subscription is active.
    pub fn is_subscribed(&self) -> bool {
        self.hub().is_subscribed()
    }

    /// Block until the session is in `state`, or `timeout` elapses.
    pub fn wait_for_state(&self, state: SessionState, timeout: Duration) -> bool {
        self.hub().wait_for_state(state, timeout)
    }

    /// Event queue counters.
    pub fn event_stats(&self) -> EventStats {
        self.hub().stats()
    }

    /// Disconnect and unload the library.
    ///
    /// Waits for calls the vendor thread is making into the library, so the
    /// library is always released on the calling thread.
    pub fn shutdown(&self) -> DisconnectReport {
        self.hub().detach_vendor();
        let report = self.disconnect();
        let loaded = self.loaded.write().take();
        if let Some(loaded) = loaded {
            tracing::info!(path = %loaded.info.path.display(), "Unloading iCUE SDK");
            drop(loaded);
        }
        report
    }

    fn hub(&self) -> &CallbackHub {
        self.registration.hub()
    }

    fn sdk(&self) -> BridgeResult<Arc<dyn VendorSdk>> {
        self.loaded
            .read()
            .as_ref()
            .map(|loaded| Arc::clone(&loaded.sdk))
            .ok_or(BridgeError::NotLoaded)
    }

    fn control<'a>(&self, sdk: &'a dyn VendorSdk) -> DeviceControl<'a> {
        DeviceControl::new(sdk, self.config.devices.access_level)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if self.loaded.get_mut().is_some() {
            let report = self.shutdown();
            tracing::debug!(?report, "Bridge dropped");
        }
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("library", &self.library_info().map(|info| info.path))
            .field("hub", self.hub())
            .finish_non_exhaustive()
    }
}
