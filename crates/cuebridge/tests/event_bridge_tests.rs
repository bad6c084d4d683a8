//! Callback-to-poll behavior with a vendor thread producing events.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cuebridge::{BridgeError, KeyEvent, OverflowPolicy};
use cuebridge_test_helpers::assert_no_alloc;
use cuebridge_test_helpers::prelude::*;

#[global_allocator]
static ALLOCATOR: TrackingAllocator = TrackingAllocator;

type TestResult = Result<(), BridgeError>;

fn connected(vendor: &Arc<FakeVendor>, capacity: usize, overflow: OverflowPolicy) -> Result<Bridge, BridgeError> {
    let config = BridgeConfig::builder()
        .resolver(config_for(&candidate_dirs(1)).resolver)
        .event_capacity(capacity)
        .overflow(overflow)
        .build()?;
    let bridge = Bridge::with_opener(config, ScriptedOpener::new().load_any(vendor))?;
    bridge.load_library()?;
    assert!(bridge.connect()?);
    Ok(bridge)
}

fn collect(bridge: &Bridge, expected: usize, timeout: Duration) -> Vec<KeyEvent> {
    let deadline = Instant::now() + timeout;
    let mut events = Vec::with_capacity(expected);
    while events.len() < expected && Instant::now() < deadline {
        let batch = bridge.poll_events();
        if batch.is_empty() {
            thread::yield_now();
        }
        events.extend(batch);
    }
    events
}

#[test]
fn test_events_arrive_in_order_across_threads() -> TestResult {
    let vendor = FakeVendor::new();
    let bridge = connected(&vendor, 20_000, OverflowPolicy::DropOldest)?;
    let total: i32 = 10_000;

    let producer = vendor.spawn_thread();
    for key_id in 0..total {
        producer.send(VendorCommand::Key {
            key_id,
            is_pressed: key_id % 2 == 0,
        });
    }

    let events = collect(&bridge, 10_000, Duration::from_secs(10));
    assert_eq!(producer.join(), 10_000);
    let ids: Vec<i32> = events.iter().map(|e| e.key_id).collect();
    assert_eq!(ids, (0..total).collect::<Vec<_>>());
    assert!(events.iter().all(|e| e.is_pressed == (e.key_id % 2 == 0)));

    let stats = bridge.event_stats();
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.delivered, 10_000);
    assert_eq!(stats.pending, 0);
    Ok(())
}

#[test]
fn test_slow_consumer_sees_newest_events_in_order() -> TestResult {
    let vendor = FakeVendor::new();
    let bridge = connected(&vendor, 64, OverflowPolicy::DropOldest)?;

    let producer = vendor.spawn_thread();
    for key_id in 0..5_000 {
        producer.send(VendorCommand::Key {
            key_id,
            is_pressed: true,
        });
    }
    assert_eq!(producer.join(), 5_000);

    let events = bridge.drain_events(usize::MAX);
    assert_eq!(events.len(), 64);
    let ids: Vec<i32> = events.iter().map(|e| e.key_id).collect();
    assert_eq!(ids, (5_000 - 64..5_000).collect::<Vec<_>>());

    let stats = bridge.event_stats();
    assert_eq!(stats.dropped, 5_000 - 64);
    assert_eq!(stats.queued, 5_000);
    Ok(())
}

#[test]
fn test_reject_new_keeps_oldest() -> TestResult {
    let vendor = FakeVendor::new();
    let bridge = connected(&vendor, 3, OverflowPolicy::RejectNew)?;
    for key_id in 1..=5 {
        vendor.emit_key(key_id, true);
    }
    let ids: Vec<i32> = bridge.drain_events(10).iter().map(|e| e.key_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(bridge.event_stats().dropped, 2);
    Ok(())
}

#[test]
fn test_concurrent_consumers_never_duplicate() -> TestResult {
    let vendor = FakeVendor::new();
    let bridge = connected(&vendor, 50_000, OverflowPolicy::DropOldest)?;
    let total = 8_000;

    let producer = vendor.spawn_thread();
    let mut seen: Vec<i32> = thread::scope(|scope| {
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let deadline = Instant::now() + Duration::from_secs(10);
                    let mut mine = Vec::new();
                    while bridge.event_stats().delivered < total && Instant::now() < deadline {
                        mine.extend(bridge.drain_events(7).into_iter().map(|e| e.key_id));
                        thread::yield_now();
                    }
                    mine
                })
            })
            .collect();
        for key_id in 0..8_000 {
            producer.send(VendorCommand::Key {
                key_id,
                is_pressed: false,
            });
        }
        consumers
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_default())
            .collect()
    });
    producer.join();

    seen.sort_unstable();
    assert_eq!(seen, (0..8_000).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_disconnect_while_vendor_emits() -> TestResult {
    let vendor = FakeVendor::new();
    let bridge = connected(&vendor, 1024, OverflowPolicy::DropOldest)?;

    let producer = vendor.spawn_thread();
    for key_id in 0..2_000 {
        producer.send(VendorCommand::Key {
            key_id,
            is_pressed: true,
        });
    }
    let report = bridge.disconnect();
    let delivered = producer.join();

    assert!(report.succeeded());
    assert_eq!(bridge.session_state(), SessionState::Disconnected);
    assert!(!vendor.emit_key(1, true));
    let stats = bridge.event_stats();
    assert_eq!(stats.queued, delivered as u64);
    Ok(())
}

#[test]
fn test_callback_path_does_not_allocate() -> TestResult {
    let vendor = FakeVendor::new();
    let bridge = connected(&vendor, 8, OverflowPolicy::DropOldest)?;

    // Warm up lazily initialized state on both the queue and overflow paths.
    for key_id in 0..16 {
        vendor.emit_key(key_id, true);
    }
    vendor.emit_device_connection(KEYBOARD_ID, true);
    bridge.drain_events(usize::MAX);

    let guard = track();
    for key_id in 0..100 {
        vendor.emit_key(key_id, key_id % 2 == 0);
    }
    vendor.emit_device_connection(KEYBOARD_ID, false);
    assert_no_alloc!(guard, "key event callback");
    drop(guard);

    assert_eq!(bridge.drain_events(usize::MAX).len(), 8);
    Ok(())
}
