//! In-process stand-ins for the vendor library.
//!
//! [`FakeVendor`] implements [`VendorSdk`] and calls back into the bridge
//! through the same `extern "C"` handlers the real library receives.
//! [`ScriptedOpener`] decides per path whether a candidate loads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Sender};
use cuebridge::{
    AccessLevel, CallbackRegistration, CandidateFailure, DeviceDescriptor, DeviceFilter, DeviceId,
    LedColor, LibraryOpener, VendorSdk,
};
use cuebridge_abi::{
    CorsairDeviceConnectionStatusChangedEvent, CorsairError, CorsairKeyEvent, CorsairMacroKeyId,
    CorsairSessionDetails, CorsairSessionState, CorsairSessionStateChanged, CorsairVersion,
    to_fixed_c_string,
};
use parking_lot::Mutex;

use crate::fixtures;

/// A recorded call into [`FakeVendor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorCall {
    /// `CorsairConnect`
    Connect,
    /// `CorsairDisconnect`
    Disconnect,
    /// `CorsairSubscribeForEvents`
    Subscribe,
    /// `CorsairUnsubscribeFromEvents`
    Unsubscribe,
    /// `CorsairGetDevices` with the requested capacity.
    GetDevices {
        /// Filter passed by the bridge.
        filter: DeviceFilter,
        /// Capacity passed by the bridge.
        capacity: usize,
    },
    /// `CorsairRequestControl`
    RequestControl {
        /// Target device.
        device_id: String,
        /// Requested level.
        access: AccessLevel,
    },
    /// `CorsairSetLedColors`
    SetLedColors {
        /// Target device.
        device_id: String,
        /// Colors sent in the batch.
        colors: Vec<LedColor>,
    },
}

/// What [`FakeVendor`] does when asked to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectBehavior {
    /// Report Connecting then Connected before `connect` returns.
    #[default]
    Immediate,
    /// Only remember the handler; the test emits states itself.
    Deferred,
}

/// Status codes returned by each fake entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statuses {
    /// `CorsairConnect`
    pub connect: CorsairError,
    /// `CorsairDisconnect`
    pub disconnect: CorsairError,
    /// `CorsairSubscribeForEvents`
    pub subscribe: CorsairError,
    /// `CorsairUnsubscribeFromEvents`
    pub unsubscribe: CorsairError,
    /// `CorsairGetDevices`
    pub get_devices: CorsairError,
    /// `CorsairRequestControl`
    pub request_control: CorsairError,
    /// `CorsairSetLedColors`
    pub set_led_colors: CorsairError,
}

impl Default for Statuses {
    fn default() -> Self {
        Self {
            connect: CorsairError::SUCCESS,
            disconnect: CorsairError::SUCCESS,
            subscribe: CorsairError::SUCCESS,
            unsubscribe: CorsairError::SUCCESS,
            get_devices: CorsairError::SUCCESS,
            request_control: CorsairError::SUCCESS,
            set_led_colors: CorsairError::SUCCESS,
        }
    }
}

#[derive(Default)]
struct Handlers {
    session: Option<CallbackRegistration>,
    events: Option<CallbackRegistration>,
}

/// Scriptable vendor library.
pub struct FakeVendor {
    calls: Mutex<Vec<VendorCall>>,
    statuses: Mutex<Statuses>,
    devices: Mutex<Vec<DeviceDescriptor>>,
    behavior: Mutex<ConnectBehavior>,
    handlers: Mutex<Handlers>,
    details: CorsairSessionDetails,
}

impl FakeVendor {
    /// A vendor with one keyboard that connects immediately.
    pub fn new() -> Arc<Self> {
        Self::with_devices(vec![fixtures::keyboard(fixtures::KEYBOARD_ID, "K95 RGB PLATINUM")])
    }

    /// A vendor reporting `devices`.
    pub fn with_devices(devices: Vec<DeviceDescriptor>) -> Arc<Self> {
        let version = |major, minor, patch| CorsairVersion {
            major,
            minor,
            patch,
        };
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            statuses: Mutex::new(Statuses::default()),
            devices: Mutex::new(devices),
            behavior: Mutex::new(ConnectBehavior::Immediate),
            handlers: Mutex::new(Handlers::default()),
            details: CorsairSessionDetails {
                client_version: version(4, 0, 84),
                server_version: version(4, 0, 84),
                server_host_version: version(5, 9, 105),
            },
        })
    }

    /// Change how `connect` behaves.
    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Edit the status codes returned from now on.
    pub fn script(&self, edit: impl FnOnce(&mut Statuses)) {
        edit(&mut self.statuses.lock());
    }

    /// Replace the reported devices.
    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        *self.devices.lock() = devices;
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<VendorCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &VendorCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Whether an event handler is currently registered.
    pub fn has_event_handler(&self) -> bool {
        self.handlers.lock().events.is_some()
    }

    /// Report a session state through the connect handler.
    ///
    /// Returns `false` if no connect handler is registered.
    pub fn emit_session_state(&self, state: CorsairSessionState) -> bool {
        let Some(registration) = self.handlers.lock().session.clone() else {
            return false;
        };
        registration.dispatch_session_state(&CorsairSessionStateChanged {
            state,
            details: self.details,
        });
        true
    }

    /// Report a macro key from the default keyboard.
    ///
    /// Returns `false` unless subscribed, as the vendor only delivers events
    /// to a subscribed handler.
    pub fn emit_key(&self, key_id: i32, is_pressed: bool) -> bool {
        self.emit_key_from(fixtures::KEYBOARD_ID, key_id, is_pressed)
    }

    /// Report a macro key from `device_id`.
    pub fn emit_key_from(&self, device_id: &str, key_id: i32, is_pressed: bool) -> bool {
        let Some(registration) = self.handlers.lock().events.clone() else {
            return false;
        };
        let event = CorsairKeyEvent {
            device_id: to_fixed_c_string(device_id).unwrap_or([0; cuebridge_abi::CORSAIR_STRING_SIZE_M]),
            key_id: CorsairMacroKeyId(key_id),
            is_pressed,
        };
        registration.dispatch_key_event(&event);
        true
    }

    /// Report a device being attached or detached.
    pub fn emit_device_connection(&self, device_id: &str, is_connected: bool) -> bool {
        let Some(registration) = self.handlers.lock().events.clone() else {
            return false;
        };
        let change = CorsairDeviceConnectionStatusChangedEvent {
            device_id: to_fixed_c_string(device_id).unwrap_or([0; cuebridge_abi::CORSAIR_STRING_SIZE_M]),
            is_connected,
        };
        registration.dispatch_device_connection(&change);
        true
    }

    /// Run callbacks from a dedicated thread, as the vendor does.
    pub fn spawn_thread(self: &Arc<Self>) -> VendorThread {
        let (tx, rx) = channel::unbounded::<VendorCommand>();
        let vendor = Arc::clone(self);
        let handle = std::thread::spawn(move || {
            let mut delivered = 0usize;
            for command in rx {
                let sent = match command {
                    VendorCommand::SessionState(state) => vendor.emit_session_state(state),
                    VendorCommand::Key { key_id, is_pressed } => vendor.emit_key(key_id, is_pressed),
                    VendorCommand::DeviceConnection { is_connected } => {
                        vendor.emit_device_connection(fixtures::KEYBOARD_ID, is_connected)
                    }
                    VendorCommand::Stop => break,
                };
                if sent {
                    delivered += 1;
                }
            }
            delivered
        });
        VendorThread {
            tx,
            handle: Some(handle),
        }
    }

    fn record(&self, call: VendorCall) {
        tracing::trace!(?call, "fake vendor call");
        self.calls.lock().push(call);
    }
}

impl VendorSdk for FakeVendor {
    fn connect(&self, registration: &CallbackRegistration) -> CorsairError {
        self.record(VendorCall::Connect);
        let status = self.statuses.lock().connect;
        if !status.is_success() {
            return status;
        }
        self.handlers.lock().session = Some(registration.clone());
        if *self.behavior.lock() == ConnectBehavior::Immediate {
            self.emit_session_state(CorsairSessionState::CONNECTING);
            self.emit_session_state(CorsairSessionState::CONNECTED);
        }
        status
    }

    fn disconnect(&self) -> CorsairError {
        self.record(VendorCall::Disconnect);
        let mut handlers = self.handlers.lock();
        handlers.session = None;
        handlers.events = None;
        self.statuses.lock().disconnect
    }

    fn subscribe_for_events(&self, registration: &CallbackRegistration) -> CorsairError {
        self.record(VendorCall::Subscribe);
        let status = self.statuses.lock().subscribe;
        if status.is_success() {
            self.handlers.lock().events = Some(registration.clone());
        }
        status
    }

    fn unsubscribe_from_events(&self) -> CorsairError {
        self.record(VendorCall::Unsubscribe);
        self.handlers.lock().events = None;
        self.statuses.lock().unsubscribe
    }

    fn get_devices(
        &self,
        filter: DeviceFilter,
        capacity: usize,
    ) -> Result<Vec<DeviceDescriptor>, CorsairError> {
        self.record(VendorCall::GetDevices { filter, capacity });
        let status = self.statuses.lock().get_devices;
        if !status.is_success() {
            return Err(status);
        }
        let wanted = match filter {
            DeviceFilter::All => None,
            DeviceFilter::Types(types) => Some(types),
        };
        Ok(self
            .devices
            .lock()
            .iter()
            .filter(|device| wanted.is_none_or(|types| types.intersects(device.device_type)))
            .take(capacity)
            .cloned()
            .collect())
    }

    fn request_control(&self, device_id: &DeviceId, access: AccessLevel) -> CorsairError {
        self.record(VendorCall::RequestControl {
            device_id: device_id.as_str().to_string(),
            access,
        });
        self.statuses.lock().request_control
    }

    fn set_led_colors(&self, device_id: &DeviceId, colors: &[LedColor]) -> CorsairError {
        self.record(VendorCall::SetLedColors {
            device_id: device_id.as_str().to_string(),
            colors: colors.to_vec(),
        });
        self.statuses.lock().set_led_colors
    }
}

impl std::fmt::Debug for FakeVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeVendor")
            .field("calls", &self.calls.lock().len())
            .field("statuses", &*self.statuses.lock())
            .field("behavior", &*self.behavior.lock())
            .finish_non_exhaustive()
    }
}

/// Work for a [`VendorThread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorCommand {
    /// Call the session handler.
    SessionState(CorsairSessionState),
    /// Deliver a macro key event from the default keyboard.
    Key {
        /// Macro key id.
        key_id: i32,
        /// `true` on key down.
        is_pressed: bool,
    },
    /// Deliver a connection change for the default keyboard.
    DeviceConnection {
        /// `true` when attached.
        is_connected: bool,
    },
    /// Stop the thread.
    Stop,
}

/// A thread that invokes [`FakeVendor`] callbacks.
#[derive(Debug)]
pub struct VendorThread {
    tx: Sender<VendorCommand>,
    handle: Option<JoinHandle<usize>>,
}

impl VendorThread {
    /// Queue a command. Returns `false` once the thread has stopped.
    pub fn send(&self, command: VendorCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Stop the thread and return how many callbacks it delivered.
    pub fn join(mut self) -> usize {
        self.stop()
    }

    fn stop(&mut self) -> usize {
        let _ = self.tx.send(VendorCommand::Stop);
        self.handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for VendorThread {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone)]
enum Outcome {
    Load(Arc<FakeVendor>),
    NotLoadable(String),
    Missing(Vec<&'static str>),
}

#[derive(Default)]
struct OpenerState {
    outcomes: HashMap<PathBuf, Outcome>,
    fallback: Option<Arc<FakeVendor>>,
    opened: Vec<PathBuf>,
}

/// [`LibraryOpener`] with a fixed outcome per path.
///
/// Paths without an outcome fail as not loadable unless a fallback vendor
/// is set. Clones share state, so a test can keep one after handing another
/// to the bridge.
#[derive(Clone, Default)]
pub struct ScriptedOpener {
    state: Arc<Mutex<OpenerState>>,
}

impl ScriptedOpener {
    /// Opener that rejects every path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `vendor` when `path` is opened.
    pub fn load(self, path: impl Into<PathBuf>, vendor: &Arc<FakeVendor>) -> Self {
        self.set(path.into(), Outcome::Load(Arc::clone(vendor)))
    }

    /// Fail `path` as if the OS loader refused it.
    pub fn not_loadable(self, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        self.set(path.into(), Outcome::NotLoadable(reason.into()))
    }

    /// Fail `path` as a library lacking `missing` exports.
    pub fn missing_exports(self, path: impl Into<PathBuf>, missing: &[&'static str]) -> Self {
        self.set(path.into(), Outcome::Missing(missing.to_vec()))
    }

    /// Load `vendor` for any path without an explicit outcome.
    pub fn load_any(self, vendor: &Arc<FakeVendor>) -> Self {
        self.state.lock().fallback = Some(Arc::clone(vendor));
        self
    }

    /// Paths passed to `open`, in order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.state.lock().opened.clone()
    }

    fn set(self, path: PathBuf, outcome: Outcome) -> Self {
        self.state.lock().outcomes.insert(path, outcome);
        self
    }
}

impl LibraryOpener for ScriptedOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn VendorSdk>, CandidateFailure> {
        let mut state = self.state.lock();
        state.opened.push(path.to_path_buf());
        let outcome = match state.outcomes.get(path) {
            Some(outcome) => outcome.clone(),
            None => match &state.fallback {
                Some(vendor) => Outcome::Load(Arc::clone(vendor)),
                None => Outcome::NotLoadable("No such file or directory".to_string()),
            },
        };
        match outcome {
            Outcome::Load(vendor) => Ok(vendor),
            Outcome::NotLoadable(reason) => Err(CandidateFailure::not_loadable(reason)),
            Outcome::Missing(missing) => Err(CandidateFailure::missing(missing)),
        }
    }
}

impl std::fmt::Debug for ScriptedOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScriptedOpener")
            .field("outcomes", &state.outcomes.len())
            .field("opened", &state.opened)
            .finish()
    }
}
