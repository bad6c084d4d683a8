//! Ordering between vendor-thread callbacks and disconnect or shutdown.
//!
//! The vendor here blocks or panics inside `CorsairSubscribeForEvents`, which
//! the shared fake cannot do, and records the thread that finally drops it.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use cuebridge::{
    AccessLevel, CallbackRegistration, CandidateFailure, DeviceDescriptor, DeviceFilter, DeviceId,
    LedColor, LibraryOpener, StepOutcome, VendorSdk,
};
use cuebridge_abi::{
    CorsairError, CorsairSessionDetails, CorsairSessionState, CorsairSessionStateChanged,
};
use cuebridge_test_helpers::prelude::*;
use parking_lot::Mutex;
use tracing_test::traced_test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Connect,
    SubscribeStarted,
    SubscribeReturned,
    Unsubscribe,
    Disconnect,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnSubscribe {
    Succeed,
    WaitForRelease,
    Panic,
}

struct Journal {
    steps: Mutex<Vec<Step>>,
    session: Mutex<Option<CallbackRegistration>>,
    dropped_on: Mutex<Option<ThreadId>>,
    on_subscribe: Mutex<OnSubscribe>,
    entered: Sender<()>,
    release: Receiver<()>,
}

impl Journal {
    /// Journal plus the release sender and the "subscribe entered" receiver.
    fn new(on_subscribe: OnSubscribe) -> (Arc<Self>, Sender<()>, Receiver<()>) {
        let (entered_tx, entered_rx) = channel::unbounded();
        let (release_tx, release_rx) = channel::unbounded();
        let journal = Arc::new(Self {
            steps: Mutex::new(Vec::new()),
            session: Mutex::new(None),
            dropped_on: Mutex::new(None),
            on_subscribe: Mutex::new(on_subscribe),
            entered: entered_tx,
            release: release_rx,
        });
        (journal, release_tx, entered_rx)
    }

    fn record(&self, step: Step) {
        self.steps.lock().push(step);
    }

    fn steps(&self) -> Vec<Step> {
        self.steps.lock().clone()
    }

    fn count(&self, step: Step) -> usize {
        self.steps.lock().iter().filter(|s| **s == step).count()
    }

    fn registration(&self) -> Option<CallbackRegistration> {
        self.session.lock().clone()
    }
}

struct GatedVendor {
    journal: Arc<Journal>,
}

impl Drop for GatedVendor {
    fn drop(&mut self) {
        *self.journal.dropped_on.lock() = Some(thread::current().id());
        self.journal.record(Step::Dropped);
    }
}

impl VendorSdk for GatedVendor {
    fn connect(&self, registration: &CallbackRegistration) -> CorsairError {
        self.journal.record(Step::Connect);
        *self.journal.session.lock() = Some(registration.clone());
        CorsairError::SUCCESS
    }

    fn disconnect(&self) -> CorsairError {
        self.journal.record(Step::Disconnect);
        CorsairError::SUCCESS
    }

    #[allow(clippy::panic)]
    fn subscribe_for_events(&self, _registration: &CallbackRegistration) -> CorsairError {
        self.journal.record(Step::SubscribeStarted);
        let mode = *self.journal.on_subscribe.lock();
        match mode {
            OnSubscribe::Succeed => {}
            OnSubscribe::WaitForRelease => {
                self.journal.entered.send(()).ok();
                self.journal
                    .release
                    .recv_timeout(Duration::from_secs(10))
                    .ok();
            }
            OnSubscribe::Panic => panic!("vendor fault inside CorsairSubscribeForEvents"),
        }
        self.journal.record(Step::SubscribeReturned);
        CorsairError::SUCCESS
    }

    fn unsubscribe_from_events(&self) -> CorsairError {
        self.journal.record(Step::Unsubscribe);
        CorsairError::SUCCESS
    }

    fn get_devices(
        &self,
        _filter: DeviceFilter,
        _capacity: usize,
    ) -> Result<Vec<DeviceDescriptor>, CorsairError> {
        Ok(Vec::new())
    }

    fn request_control(&self, _device_id: &DeviceId, _access: AccessLevel) -> CorsairError {
        CorsairError::SUCCESS
    }

    fn set_led_colors(&self, _device_id: &DeviceId, _colors: &[LedColor]) -> CorsairError {
        CorsairError::SUCCESS
    }
}

struct GatedOpener {
    journal: Arc<Journal>,
}

impl LibraryOpener for GatedOpener {
    fn open(&self, _path: &Path) -> Result<Arc<dyn VendorSdk>, CandidateFailure> {
        Ok(Arc::new(GatedVendor {
            journal: Arc::clone(&self.journal),
        }))
    }
}

fn connected_bridge(journal: &Arc<Journal>) -> Result<Bridge, BridgeError> {
    let bridge = Bridge::with_opener(
        config_for(&candidate_dirs(1)),
        GatedOpener {
            journal: Arc::clone(journal),
        },
    )?;
    bridge.load_library()?;
    assert!(bridge.connect()?);
    Ok(bridge)
}

fn connected_state() -> CorsairSessionStateChanged {
    CorsairSessionStateChanged {
        state: CorsairSessionState::CONNECTED,
        details: CorsairSessionDetails::default(),
    }
}

/// Deliver Connected from a separate thread, as the vendor does.
fn connected_on_vendor_thread(registration: CallbackRegistration) -> JoinHandle<()> {
    thread::spawn(move || registration.dispatch_session_state(&connected_state()))
}

fn release_after(release: Sender<()>, delay: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(delay);
        release.send(()).ok();
    })
}

#[test]
fn test_shutdown_releases_library_on_calling_thread() -> TestResult {
    let (journal, release, entered) = Journal::new(OnSubscribe::WaitForRelease);
    let bridge = connected_bridge(&journal)?;

    let registration = journal.registration().ok_or("connect handler missing")?;
    let vendor_thread = connected_on_vendor_thread(registration);
    let vendor_thread_id = vendor_thread.thread().id();
    entered.recv_timeout(Duration::from_secs(5))?;

    let releaser = release_after(release, Duration::from_millis(50));
    let report = bridge.shutdown();

    assert!(vendor_thread.join().is_ok());
    assert!(releaser.join().is_ok());
    assert!(!bridge.is_loaded());
    assert_eq!(*journal.dropped_on.lock(), Some(thread::current().id()));
    assert_ne!(*journal.dropped_on.lock(), Some(vendor_thread_id));
    assert_eq!(
        journal.steps(),
        vec![
            Step::Connect,
            Step::SubscribeStarted,
            Step::SubscribeReturned,
            Step::Unsubscribe,
            Step::Disconnect,
            Step::Dropped,
        ]
    );
    assert_eq!(report.unsubscribe, StepOutcome::Succeeded);
    Ok(())
}

#[test]
fn test_disconnect_waits_for_subscribe_in_progress() -> TestResult {
    let (journal, release, entered) = Journal::new(OnSubscribe::WaitForRelease);
    let bridge = connected_bridge(&journal)?;

    let registration = journal.registration().ok_or("connect handler missing")?;
    let vendor_thread = connected_on_vendor_thread(registration);
    entered.recv_timeout(Duration::from_secs(5))?;
    assert!(!bridge.is_subscribed());

    let releaser = release_after(release, Duration::from_millis(50));
    let report = bridge.disconnect();

    assert!(vendor_thread.join().is_ok());
    assert!(releaser.join().is_ok());
    assert_eq!(
        journal.steps(),
        vec![
            Step::Connect,
            Step::SubscribeStarted,
            Step::SubscribeReturned,
            Step::Unsubscribe,
            Step::Disconnect,
        ]
    );
    assert_eq!(report.unsubscribe, StepOutcome::Succeeded);
    assert_eq!(bridge.session_state(), SessionState::Disconnected);
    assert!(!bridge.is_subscribed());
    assert!(bridge.is_loaded());
    Ok(())
}

#[test]
#[traced_test]
fn test_panic_in_subscribe_is_absorbed_and_retried() -> TestResult {
    let (journal, _release, _entered) = Journal::new(OnSubscribe::Panic);
    let bridge = connected_bridge(&journal)?;
    let registration = journal.registration().ok_or("connect handler missing")?;

    registration.dispatch_session_state(&connected_state());
    assert_eq!(bridge.session_state(), SessionState::Connected);
    assert!(!bridge.is_subscribed());
    assert!(logs_contain("Panic in event subscription absorbed"));

    // Nothing to undo for a subscription that never happened.
    let report = bridge.disconnect();
    assert_eq!(report.unsubscribe, StepOutcome::Skipped);
    assert!(bridge.connect()?);

    *journal.on_subscribe.lock() = OnSubscribe::Succeed;
    registration.dispatch_session_state(&connected_state());
    assert!(bridge.is_subscribed());
    assert_eq!(journal.count(Step::SubscribeStarted), 2);
    assert_eq!(journal.count(Step::SubscribeReturned), 1);
    assert_eq!(journal.count(Step::Unsubscribe), 0);
    Ok(())
}

#[test]
fn test_panic_in_subscribe_retries_on_next_connected() -> TestResult {
    let (journal, _release, _entered) = Journal::new(OnSubscribe::Panic);
    let bridge = connected_bridge(&journal)?;
    let registration = journal.registration().ok_or("connect handler missing")?;

    registration.dispatch_session_state(&connected_state());
    assert!(!bridge.is_subscribed());

    *journal.on_subscribe.lock() = OnSubscribe::Succeed;
    registration.dispatch_session_state(&connected_state());
    assert!(bridge.is_subscribed());
    assert_eq!(journal.count(Step::SubscribeStarted), 2);
    Ok(())
}
