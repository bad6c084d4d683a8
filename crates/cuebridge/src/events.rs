//! Bounded hand-off queue between the vendor callback thread and the poller.
//!
//! [`EventQueue`] itself is not synchronized; the session hub keeps it behind
//! the same mutex as the subscription flag. Storage is reserved up front so
//! pushing on the vendor thread never allocates.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;

use cuebridge_abi::{CORSAIR_STRING_SIZE_M, CorsairKeyEvent, macro_key_name};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Largest accepted event queue capacity.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// A macro key press or release, copied out of the vendor payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Macro key id (`CMKI_*`), G1..G12 map to 1..12.
    pub key_id: i32,
    /// `true` on key down.
    pub is_pressed: bool,
    device_id: [u8; CORSAIR_STRING_SIZE_M],
}

impl KeyEvent {
    /// Event with no originating device.
    #[must_use]
    pub const fn new(key_id: i32, is_pressed: bool) -> Self {
        Self {
            key_id,
            is_pressed,
            device_id: [0; CORSAIR_STRING_SIZE_M],
        }
    }

    /// Attach the originating device id, truncated to at most 127 bytes
    /// without splitting a character.
    #[must_use]
    pub fn with_device_id(mut self, device_id: &str) -> Self {
        let limit = CORSAIR_STRING_SIZE_M - 1;
        let len = device_id
            .char_indices()
            .map(|(start, c)| start + c.len_utf8())
            .take_while(|&end| end <= limit)
            .last()
            .unwrap_or(0);
        self.device_id = [0; CORSAIR_STRING_SIZE_M];
        self.device_id[..len].copy_from_slice(&device_id.as_bytes()[..len]);
        self
    }

    /// Copy a vendor key event.
    #[must_use]
    pub fn from_raw(raw: &CorsairKeyEvent) -> Self {
        let mut device_id = [0; CORSAIR_STRING_SIZE_M];
        for (slot, c) in device_id.iter_mut().zip(raw.device_id.iter()) {
            *slot = c.to_ne_bytes()[0];
        }
        // Guarantee a terminator even if the vendor filled the whole field.
        device_id[CORSAIR_STRING_SIZE_M - 1] = 0;
        Self {
            key_id: raw.key_id.0,
            is_pressed: raw.is_pressed,
            device_id,
        }
    }

    /// Id of the device that produced the event, empty if unknown.
    pub fn device_id(&self) -> Cow<'_, str> {
        let end = self
            .device_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.device_id.len());
        String::from_utf8_lossy(&self.device_id[..end])
    }

    /// G-key name for this event, if the id is one of G1..G12.
    pub fn key_name(&self) -> Option<&'static str> {
        macro_key_name(self.key_id)
    }
}

impl fmt::Debug for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEvent")
            .field("key_id", &self.key_id)
            .field("is_pressed", &self.is_pressed)
            .field("device_id", &self.device_id())
            .finish()
    }
}

impl Serialize for KeyEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KeyEvent", 3)?;
        state.serialize_field("keyId", &self.key_id)?;
        state.serialize_field("isPressed", &self.is_pressed)?;
        state.serialize_field("deviceId", &self.device_id())?;
        state.end()
    }
}

/// An event as seen by the callback, before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    /// Macro key event, the only kind that is queued.
    Key(KeyEvent),
    /// A device was attached or detached.
    DeviceConnectionChanged {
        /// `true` when attached.
        is_connected: bool,
    },
    /// Event id this bridge does not understand.
    Unknown(i32),
}

/// What to do when a key event arrives and the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued event to make room.
    #[default]
    DropOldest,
    /// Discard the incoming event.
    RejectNew,
}

/// Result of offering an event to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended without loss.
    Queued,
    /// Appended after evicting the oldest entry.
    DroppedOldest,
    /// Discarded because the queue was full.
    Rejected,
    /// Not a key event.
    Ignored,
}

impl PushOutcome {
    /// Whether an event was lost.
    pub fn is_drop(self) -> bool {
        matches!(self, Self::DroppedOldest | Self::Rejected)
    }
}

/// Counters observed since the queue was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    /// Key events accepted into the queue.
    pub queued: u64,
    /// Key events handed to the consumer.
    pub delivered: u64,
    /// Key events lost to the overflow policy.
    pub dropped: u64,
    /// Non-key events observed and discarded.
    pub ignored: u64,
    /// Events currently waiting.
    pub pending: usize,
}

/// FIFO of key events with a hard capacity.
pub struct EventQueue {
    buffer: VecDeque<KeyEvent>,
    capacity: usize,
    policy: OverflowPolicy,
    stats: EventStats,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` events, clamped to
    /// `1..=MAX_EVENT_CAPACITY`.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.clamp(1, MAX_EVENT_CAPACITY);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            stats: EventStats::default(),
        }
    }

    /// Filter a raw event and queue it if it is a key event.
    pub fn on_raw_event(&mut self, event: RawEvent) -> PushOutcome {
        match event {
            RawEvent::Key(key) => self.push(key),
            RawEvent::DeviceConnectionChanged { .. } | RawEvent::Unknown(_) => {
                self.stats.ignored += 1;
                PushOutcome::Ignored
            }
        }
    }

    /// Append a key event, applying the overflow policy when full.
    pub fn push(&mut self, event: KeyEvent) -> PushOutcome {
        if self.buffer.len() < self.capacity {
            self.buffer.push_back(event);
            self.stats.queued += 1;
            return PushOutcome::Queued;
        }

        self.stats.dropped += 1;
        match self.policy {
            OverflowPolicy::DropOldest => {
                self.buffer.pop_front();
                self.buffer.push_back(event);
                self.stats.queued += 1;
                PushOutcome::DroppedOldest
            }
            OverflowPolicy::RejectNew => PushOutcome::Rejected,
        }
    }

    /// Remove up to `max` events in arrival order.
    pub fn drain(&mut self, max: usize) -> Vec<KeyEvent> {
        let count = max.min(self.buffer.len());
        let events: Vec<KeyEvent> = self.buffer.drain(..count).collect();
        self.stats.delivered += events.len() as u64;
        events
    }

    /// Discard everything pending without counting it as delivered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of pending events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Active overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> EventStats {
        EventStats {
            pending: self.buffer.len(),
            ..self.stats
        }
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.buffer.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("stats", &self.stats)
            .finish()
    }
}
