//! Session lifecycle state machine.
//!
//! [`SessionTracker`] holds the logical state, the subscription progress and
//! the negotiated versions. It never calls the vendor; transitions return what
//! the caller must do once the hub lock is released.

use std::fmt;

use cuebridge_abi::{CorsairError, CorsairSessionDetails, CorsairSessionState, CorsairVersion};
use serde::Serialize;

/// Logical session state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session, or the vendor reported the session as gone.
    #[default]
    Disconnected,
    /// Connect was requested and accepted, Connected not yet reported.
    Connecting,
    /// The vendor reported the session as connected.
    Connected,
}

impl SessionState {
    /// Map a vendor session state. `CSS_Invalid` and unknown values map to `None`.
    pub fn from_vendor(state: CorsairSessionState) -> Option<Self> {
        match state {
            CorsairSessionState::CONNECTED => Some(Self::Connected),
            CorsairSessionState::CONNECTING => Some(Self::Connecting),
            CorsairSessionState::CLOSED
            | CorsairSessionState::TIMEOUT
            | CorsairSessionState::CONNECTION_REFUSED
            | CorsairSessionState::CONNECTION_LOST => Some(Self::Disconnected),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// `major.minor.patch` reported by the vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Version {
    /// Major component.
    pub major: i32,
    /// Minor component.
    pub minor: i32,
    /// Patch component.
    pub patch: i32,
}

impl From<CorsairVersion> for Version {
    fn from(raw: CorsairVersion) -> Self {
        Self {
            major: raw.major,
            minor: raw.minor,
            patch: raw.patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Versions carried by the Connected notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    /// SDK client library version.
    pub client_version: Version,
    /// iCUE server version.
    pub server_version: Version,
    /// iCUE host application version.
    pub server_host_version: Version,
}

impl From<CorsairSessionDetails> for SessionDetails {
    fn from(raw: CorsairSessionDetails) -> Self {
        Self {
            client_version: raw.client_version.into(),
            server_version: raw.server_version.into(),
            server_host_version: raw.server_host_version.into(),
        }
    }
}

/// Follow-up required after a vendor state notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do.
    None,
    /// First Connected notification: subscribe for events now.
    Subscribe,
}

/// Progress of the event subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// No subscription, or the last attempt failed.
    #[default]
    Unsubscribed,
    /// `CorsairSubscribeForEvents` is running on the vendor thread.
    Subscribing,
    /// The vendor accepted the subscription.
    Subscribed,
}

/// State, subscription progress and details for one session.
#[derive(Debug, Default)]
pub struct SessionTracker {
    state: SessionState,
    subscription: Subscription,
    details: Option<SessionDetails>,
    last_vendor_state: Option<CorsairSessionState>,
}

impl SessionTracker {
    /// A disconnected, unsubscribed tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the vendor accepted an event subscription.
    pub fn is_subscribed(&self) -> bool {
        self.subscription == Subscription::Subscribed
    }

    /// Subscription progress.
    pub fn subscription(&self) -> Subscription {
        self.subscription
    }

    /// Versions from the last Connected notification.
    pub fn details(&self) -> Option<SessionDetails> {
        self.details
    }

    /// Last raw state the vendor reported.
    pub fn last_vendor_state(&self) -> Option<CorsairSessionState> {
        self.last_vendor_state
    }

    /// Record that a connect request is about to be issued.
    pub fn begin_connect(&mut self) {
        if self.state == SessionState::Disconnected {
            self.state = SessionState::Connecting;
        }
    }

    /// The vendor refused the connect request.
    pub fn connect_rejected(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Disconnected;
        }
    }

    /// Apply a vendor state notification.
    ///
    /// Only the first Connected notification after a disconnect asks for a
    /// subscription. The tracker moves to [`Subscription::Subscribing`] here,
    /// before the vendor is called, so later notifications do not ask again.
    pub fn on_vendor_state(
        &mut self,
        raw: CorsairSessionState,
        details: CorsairSessionDetails,
    ) -> Transition {
        self.last_vendor_state = Some(raw);
        let Some(state) = SessionState::from_vendor(raw) else {
            return Transition::None;
        };

        self.state = state;
        match state {
            SessionState::Connected => {
                self.details = Some(details.into());
                if self.subscription == Subscription::Unsubscribed {
                    self.subscription = Subscription::Subscribing;
                    Transition::Subscribe
                } else {
                    Transition::None
                }
            }
            SessionState::Connecting | SessionState::Disconnected => Transition::None,
        }
    }

    /// The subscribe call triggered by [`Transition::Subscribe`] returned.
    pub fn subscribe_finished(&mut self, accepted: bool) {
        if self.subscription == Subscription::Subscribing {
            self.subscription = if accepted {
                Subscription::Subscribed
            } else {
                Subscription::Unsubscribed
            };
        }
    }

    /// Enter Disconnected and forget the subscription, returning whether one
    /// was active.
    ///
    /// Callers wait for a [`Subscription::Subscribing`] call to finish first;
    /// its outcome is lost otherwise.
    pub fn begin_disconnect(&mut self) -> bool {
        self.state = SessionState::Disconnected;
        self.details = None;
        std::mem::take(&mut self.subscription) == Subscription::Subscribed
    }
}

/// Outcome of one vendor call made during disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "status")]
pub enum StepOutcome {
    /// The call was not needed or not possible.
    Skipped,
    /// The vendor returned success.
    Succeeded,
    /// The vendor returned the given non-success code.
    Failed(i32),
}

impl StepOutcome {
    /// Classify a vendor status.
    pub fn from_status(status: CorsairError) -> Self {
        if status.is_success() {
            Self::Succeeded
        } else {
            Self::Failed(status.0)
        }
    }

    /// Whether the step ran and succeeded.
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

/// What happened during a disconnect.
///
/// The logical session is Disconnected afterwards regardless of the outcomes
/// recorded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectReport {
    /// `false` when no library was loaded, so nothing was attempted.
    pub attempted: bool,
    /// Best-effort unsubscribe, skipped when no subscription was active.
    pub unsubscribe: StepOutcome,
    /// The vendor disconnect call.
    pub disconnect: StepOutcome,
}

impl DisconnectReport {
    /// Report for a bridge with no loaded library.
    pub const fn not_attempted() -> Self {
        Self {
            attempted: false,
            unsubscribe: StepOutcome::Skipped,
            disconnect: StepOutcome::Skipped,
        }
    }

    /// Whether the vendor disconnect call succeeded. Unsubscribe failures are ignored.
    pub fn succeeded(&self) -> bool {
        self.attempted && self.disconnect.is_success()
    }
}
