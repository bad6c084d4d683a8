//! Shared state touched by both the vendor callback thread and the consumer.
//!
//! One mutex guards the event queue, the session state and the subscription
//! progress. The vendor is never called while it is held: transitions decide
//! what to do under the lock and the resulting vendor call happens after
//! release.
//!
//! A subscribe call made from the vendor thread holds a strong reference to
//! the vendor. It is counted in `vendor_calls` so the library is never
//! dropped from inside its own callback.

use std::ffi::c_void;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use cuebridge_abi::{
    CorsairDeviceConnectionStatusChangedEvent, CorsairEvent, CorsairEventHandler, CorsairEventId,
    CorsairEventPayload, CorsairKeyEvent, CorsairSessionDetails, CorsairSessionState,
    CorsairSessionStateChanged, CorsairSessionStateChangedHandler,
};
use parking_lot::{Condvar, Mutex};

use crate::callbacks::{event_received, session_state_changed};
use crate::events::{EventQueue, EventStats, KeyEvent, OverflowPolicy, PushOutcome, RawEvent};
use crate::session::{SessionDetails, SessionState, SessionTracker, Subscription, Transition};
use crate::vendor::VendorSdk;

struct Shared {
    queue: EventQueue,
    session: SessionTracker,
    vendor: Option<Weak<dyn VendorSdk>>,
    vendor_calls: usize,
}

/// Target of the context pointer handed to the vendor.
pub struct CallbackHub {
    shared: Mutex<Shared>,
    changed: Condvar,
    this: Weak<CallbackHub>,
}

impl CallbackHub {
    /// Create a hub whose queue holds at most `capacity` events.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            shared: Mutex::new(Shared {
                queue: EventQueue::new(capacity, policy),
                session: SessionTracker::new(),
                vendor: None,
                vendor_calls: 0,
            }),
            changed: Condvar::new(),
            this: this.clone(),
        })
    }

    /// Handle used to register this hub with the vendor.
    pub fn registration(&self) -> Option<CallbackRegistration> {
        self.this
            .upgrade()
            .map(|hub| CallbackRegistration { hub })
    }

    /// Vendor used for the subscribe call triggered by a Connected notification.
    pub fn attach_vendor(&self, vendor: &Arc<dyn VendorSdk>) {
        self.shared.lock().vendor = Some(Arc::downgrade(vendor));
    }

    /// Forget the vendor before it is unloaded.
    ///
    /// Blocks until calls into the vendor made from its callback thread have
    /// returned and released their reference.
    pub fn detach_vendor(&self) {
        let mut shared = self.shared.lock();
        shared.vendor = None;
        while shared.vendor_calls > 0 {
            self.changed.wait(&mut shared);
        }
    }

    /// Handle a session state notification.
    pub fn on_session_state(&self, raw: CorsairSessionState, details: CorsairSessionDetails) {
        let (transition, state, vendor) = {
            let mut shared = self.shared.lock();
            let transition = shared.session.on_vendor_state(raw, details);
            let vendor = match transition {
                Transition::Subscribe => shared.vendor.as_ref().and_then(Weak::upgrade),
                Transition::None => None,
            };
            if vendor.is_some() {
                shared.vendor_calls = shared.vendor_calls.saturating_add(1);
            }
            (transition, shared.session.state(), vendor)
        };
        self.changed.notify_all();

        tracing::debug!(
            vendor_state = raw.name().unwrap_or("unknown"),
            state = %state,
            "Session state changed"
        );
        if state == SessionState::Connected && transition == Transition::Subscribe {
            tracing::info!(
                server_version = %SessionDetails::from(details).server_version,
                "iCUE session connected"
            );
        }

        if transition != Transition::Subscribe {
            return;
        }

        let counted = vendor.is_some();
        let subscribed = match vendor {
            Some(vendor) => self.subscribe(vendor),
            None => {
                tracing::warn!("Connected notification without a loaded library");
                false
            }
        };
        {
            let mut shared = self.shared.lock();
            shared.session.subscribe_finished(subscribed);
            if counted {
                shared.vendor_calls = shared.vendor_calls.saturating_sub(1);
            }
        }
        self.changed.notify_all();
    }

    /// Subscribe for events, consuming the vendor reference before returning.
    fn subscribe(&self, vendor: Arc<dyn VendorSdk>) -> bool {
        let Some(registration) = self.registration() else {
            return false;
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            vendor.subscribe_for_events(&registration)
        }));
        match result {
            Ok(status) if status.is_success() => true,
            Ok(status) => {
                tracing::warn!(%status, "Event subscription failed");
                false
            }
            Err(_) => {
                tracing::warn!("Panic in event subscription absorbed");
                false
            }
        }
    }

    /// Handle an event from the subscription.
    pub fn on_event(&self, event: RawEvent) {
        let (outcome, stats) = {
            let mut shared = self.shared.lock();
            let outcome = shared.queue.on_raw_event(event);
            (outcome, shared.queue.stats())
        };

        match outcome {
            PushOutcome::Queued => tracing::trace!(?event, "Key event queued"),
            PushOutcome::Ignored => tracing::trace!(?event, "Non-key event ignored"),
            PushOutcome::DroppedOldest | PushOutcome::Rejected => {
                if stats.dropped.is_power_of_two() {
                    tracing::warn!(
                        dropped = stats.dropped,
                        pending = stats.pending,
                        ?outcome,
                        "Event queue full, dropping key events"
                    );
                }
            }
        }
    }

    /// Remove up to `max` queued key events in arrival order.
    pub fn drain(&self, max: usize) -> Vec<KeyEvent> {
        self.shared.lock().queue.drain(max)
    }

    /// Queue counters.
    pub fn stats(&self) -> EventStats {
        self.shared.lock().queue.stats()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.shared.lock().session.state()
    }

    /// Versions from the last Connected notification.
    pub fn details(&self) -> Option<SessionDetails> {
        self.shared.lock().session.details()
    }

    /// Whether an event subscription is active.
    pub fn is_subscribed(&self) -> bool {
        self.shared.lock().session.is_subscribed()
    }

    /// Mark the session as connecting.
    pub fn begin_connect(&self) {
        self.shared.lock().session.begin_connect();
        self.changed.notify_all();
    }

    /// Revert a connect the vendor refused.
    pub fn connect_rejected(&self) {
        self.shared.lock().session.connect_rejected();
        self.changed.notify_all();
    }

    /// Enter Disconnected, returning whether a subscription was active.
    ///
    /// A subscribe still running on the vendor thread is waited for, so its
    /// result is known before the caller decides whether to unsubscribe.
    pub fn begin_disconnect(&self) -> bool {
        let was_subscribed = {
            let mut shared = self.shared.lock();
            while shared.session.subscription() == Subscription::Subscribing {
                self.changed.wait(&mut shared);
            }
            shared.session.begin_disconnect()
        };
        self.changed.notify_all();
        was_subscribed
    }

    /// Subscription progress.
    pub fn subscription(&self) -> Subscription {
        self.shared.lock().session.subscription()
    }

    /// Block until the session reaches `target` or `timeout` elapses.
    pub fn wait_for_state(&self, target: SessionState, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut shared = self.shared.lock();
        while shared.session.state() != target {
            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut shared, deadline).timed_out() {
                        return shared.session.state() == target;
                    }
                }
                None => self.changed.wait(&mut shared),
            }
        }
        true
    }
}

impl fmt::Debug for CallbackHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("CallbackHub")
            .field("queue", &shared.queue)
            .field("session", &shared.session)
            .field("vendor_calls", &shared.vendor_calls)
            .finish_non_exhaustive()
    }
}

/// Context pointer and handlers to pass to `CorsairConnect` and
/// `CorsairSubscribeForEvents`.
///
/// The pointer stays valid for as long as any clone of the registration is
/// alive; the native library keeps one until it is unloaded.
#[derive(Clone)]
pub struct CallbackRegistration {
    hub: Arc<CallbackHub>,
}

impl CallbackRegistration {
    /// Opaque context pointer.
    pub fn context(&self) -> *mut c_void {
        Arc::as_ptr(&self.hub).cast_mut().cast()
    }

    /// Session state handler to pass with [`Self::context`].
    pub fn session_handler(&self) -> CorsairSessionStateChangedHandler {
        Some(session_state_changed)
    }

    /// Event handler to pass with [`Self::context`].
    pub fn event_handler(&self) -> CorsairEventHandler {
        Some(event_received)
    }

    /// The hub behind the context pointer.
    pub fn hub(&self) -> &Arc<CallbackHub> {
        &self.hub
    }

    /// Invoke the session handler as the vendor would.
    pub fn dispatch_session_state(&self, payload: &CorsairSessionStateChanged) {
        // SAFETY: the context points at the hub kept alive by `self`, and the
        // payload reference is valid for the duration of the call.
        unsafe { session_state_changed(self.context(), payload) };
    }

    /// Invoke the event handler with a key event as the vendor would.
    pub fn dispatch_key_event(&self, key_event: &CorsairKeyEvent) {
        let event = CorsairEvent {
            id: CorsairEventId::KEY_EVENT,
            payload: CorsairEventPayload {
                key_event: ptr::from_ref(key_event),
            },
        };
        // SAFETY: the context is valid as above; the payload pointer refers to
        // `key_event`, which outlives the call.
        unsafe { event_received(self.context(), &event) };
    }

    /// Invoke the event handler with a device connection change.
    pub fn dispatch_device_connection(&self, change: &CorsairDeviceConnectionStatusChangedEvent) {
        let event = CorsairEvent {
            id: CorsairEventId::DEVICE_CONNECTION_STATUS_CHANGED,
            payload: CorsairEventPayload {
                device_connection_status_changed: ptr::from_ref(change),
            },
        };
        // SAFETY: the context is valid as above; the payload pointer refers to
        // `change`, which outlives the call.
        unsafe { event_received(self.context(), &event) };
    }
}

impl fmt::Debug for CallbackRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistration")
            .field("context", &self.context())
            .finish()
    }
}
