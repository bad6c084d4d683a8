//! `extern "C"` handlers registered with the vendor.
//!
//! They run on a thread owned by the vendor. Each one copies the borrowed
//! payload into owned values, forwards it to the [`CallbackHub`] behind the
//! context pointer and absorbs any panic before returning to C.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

use cuebridge_abi::{CorsairEvent, CorsairEventId, CorsairSessionStateChanged};

use crate::events::{KeyEvent, RawEvent};
use crate::hub::CallbackHub;

/// `CorsairSessionStateChangedHandler` implementation.
///
/// # Safety
///
/// `context` must be null or point at a live [`CallbackHub`]; `event_data`
/// must be null or point at a valid payload for the duration of the call.
pub(crate) unsafe extern "C" fn session_state_changed(
    context: *mut c_void,
    event_data: *const CorsairSessionStateChanged,
) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the caller guarantees `context` is null or a live hub.
        let Some(hub) = (unsafe { context.cast::<CallbackHub>().as_ref() }) else {
            return;
        };
        // SAFETY: the caller guarantees `event_data` is null or valid.
        let Some(change) = (unsafe { event_data.as_ref() }) else {
            tracing::debug!("Session state callback without payload");
            return;
        };
        hub.on_session_state(change.state, change.details);
    }));

    if result.is_err() {
        tracing::warn!("Panic in session state callback absorbed");
    }
}

/// `CorsairEventHandler` implementation.
///
/// # Safety
///
/// `context` must be null or point at a live [`CallbackHub`]; `event` must be
/// null or point at a valid event whose payload member matches its id.
pub(crate) unsafe extern "C" fn event_received(context: *mut c_void, event: *const CorsairEvent) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the caller guarantees `context` is null or a live hub.
        let Some(hub) = (unsafe { context.cast::<CallbackHub>().as_ref() }) else {
            return;
        };
        // SAFETY: the caller guarantees `event` is null or valid.
        let Some(event) = (unsafe { event.as_ref() }) else {
            return;
        };
        // SAFETY: the payload member matching `event.id` is valid.
        let raw = unsafe { copy_event(event) };
        hub.on_event(raw);
    }));

    if result.is_err() {
        tracing::warn!("Panic in event callback absorbed");
    }
}

/// Copy the payload selected by `event.id` into an owned [`RawEvent`].
///
/// # Safety
///
/// The union member selected by `event.id` must be null or valid to read.
unsafe fn copy_event(event: &CorsairEvent) -> RawEvent {
    match event.id {
        CorsairEventId::KEY_EVENT => {
            // SAFETY: `id` selects the key event member.
            let payload = unsafe { event.payload.key_event };
            // SAFETY: the member is null or valid for the call.
            match unsafe { payload.as_ref() } {
                Some(key) => RawEvent::Key(KeyEvent::from_raw(key)),
                None => RawEvent::Unknown(event.id.0),
            }
        }
        CorsairEventId::DEVICE_CONNECTION_STATUS_CHANGED => {
            // SAFETY: `id` selects the connection status member.
            let payload = unsafe { event.payload.device_connection_status_changed };
            // SAFETY: the member is null or valid for the call.
            match unsafe { payload.as_ref() } {
                Some(change) => RawEvent::DeviceConnectionChanged {
                    is_connected: change.is_connected,
                },
                None => RawEvent::Unknown(event.id.0),
            }
        }
        other => RawEvent::Unknown(other.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OverflowPolicy;
    use cuebridge_abi::{
        CorsairDeviceConnectionStatusChangedEvent, CorsairEventPayload, CorsairKeyEvent,
        CorsairMacroKeyId, CorsairSessionDetails, CorsairSessionState,
    };
    use std::ptr;
    use std::sync::Arc;

    fn context(hub: &Arc<CallbackHub>) -> *mut c_void {
        Arc::as_ptr(hub).cast_mut().cast()
    }

    #[test]
    fn test_null_pointers_are_tolerated() {
        let hub = CallbackHub::new(4, OverflowPolicy::DropOldest);
        // SAFETY: null context and payload are allowed by the handler contract.
        unsafe { session_state_changed(ptr::null_mut(), ptr::null()) };
        // SAFETY: as above.
        unsafe { event_received(ptr::null_mut(), ptr::null()) };
        // SAFETY: context is a live hub, payload is null.
        unsafe { event_received(context(&hub), ptr::null()) };
        assert_eq!(hub.stats().ignored, 0);
    }

    #[test]
    fn test_unknown_event_id_is_counted() {
        let hub = CallbackHub::new(4, OverflowPolicy::DropOldest);
        let event = CorsairEvent {
            id: CorsairEventId(42),
            payload: CorsairEventPayload {
                key_event: ptr::null(),
            },
        };
        // SAFETY: context is a live hub; the payload is never read for id 42.
        unsafe { event_received(context(&hub), &event) };
        assert_eq!(hub.stats().ignored, 1);
        assert!(hub.drain(10).is_empty());
    }

    #[test]
    fn test_key_event_with_null_payload_is_ignored() {
        let hub = CallbackHub::new(4, OverflowPolicy::DropOldest);
        let event = CorsairEvent {
            id: CorsairEventId::KEY_EVENT,
            payload: CorsairEventPayload {
                key_event: ptr::null(),
            },
        };
        // SAFETY: context is a live hub; a null member is allowed.
        unsafe { event_received(context(&hub), &event) };
        assert_eq!(hub.stats().ignored, 1);
    }

    #[test]
    fn test_device_connection_event_is_not_queued() {
        let hub = CallbackHub::new(4, OverflowPolicy::DropOldest);
        let change = CorsairDeviceConnectionStatusChangedEvent {
            device_id: [0; 128],
            is_connected: true,
        };
        let event = CorsairEvent {
            id: CorsairEventId::DEVICE_CONNECTION_STATUS_CHANGED,
            payload: CorsairEventPayload {
                device_connection_status_changed: &change,
            },
        };
        // SAFETY: context is a live hub and the payload points at `change`.
        unsafe { event_received(context(&hub), &event) };
        assert!(hub.drain(10).is_empty());
        assert_eq!(hub.stats().ignored, 1);
    }

    #[test]
    fn test_key_event_is_copied() {
        let hub = CallbackHub::new(4, OverflowPolicy::DropOldest);
        let key = CorsairKeyEvent {
            device_id: [0; 128],
            key_id: CorsairMacroKeyId(5),
            is_pressed: true,
        };
        let event = CorsairEvent {
            id: CorsairEventId::KEY_EVENT,
            payload: CorsairEventPayload { key_event: &key },
        };
        // SAFETY: context is a live hub and the payload points at `key`.
        unsafe { event_received(context(&hub), &event) };
        let events = hub.drain(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key_id, 5);
        assert!(events[0].is_pressed);
    }

    #[test]
    fn test_session_state_is_forwarded() {
        let hub = CallbackHub::new(4, OverflowPolicy::DropOldest);
        let change = CorsairSessionStateChanged {
            state: CorsairSessionState::CONNECTION_REFUSED,
            details: CorsairSessionDetails::default(),
        };
        hub.begin_connect();
        // SAFETY: context is a live hub and the payload points at `change`.
        unsafe { session_state_changed(context(&hub), &change) };
        assert_eq!(hub.state(), crate::session::SessionState::Disconnected);
    }
}
