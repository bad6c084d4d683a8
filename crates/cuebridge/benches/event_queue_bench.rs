//! Benchmarks for the callback-to-poll path
//!
//! Run with: cargo bench --bench event_queue_bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use cuebridge::{Bridge, BridgeConfig, EventQueue, KeyEvent, OverflowPolicy};
use cuebridge_test_helpers::prelude::{FakeVendor, ScriptedOpener, candidate_dirs, config_for};

fn bench_queue_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push");
    for policy in [OverflowPolicy::DropOldest, OverflowPolicy::RejectNew] {
        group.bench_with_input(
            BenchmarkId::new("full", format!("{policy:?}")),
            &policy,
            |b, &policy| {
                let mut queue = EventQueue::new(64, policy);
                for id in 0..64 {
                    queue.push(KeyEvent::new(id, true));
                }
                b.iter(|| black_box(queue.push(black_box(KeyEvent::new(7, false)))));
            },
        );
    }
    group.bench_function("push_drain", |b| {
        let mut queue = EventQueue::new(4096, OverflowPolicy::DropOldest);
        b.iter(|| {
            queue.push(black_box(KeyEvent::new(1, true)));
            black_box(queue.drain(1));
        });
    });
    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_drain");
    for batch in [1usize, 100, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let mut queue = EventQueue::new(4096, OverflowPolicy::DropOldest);
            b.iter(|| {
                for id in 0..4096 {
                    queue.push(KeyEvent::new(id, true));
                }
                while !queue.is_empty() {
                    black_box(queue.drain(batch));
                }
            });
        });
    }
    group.finish();
}

fn bench_callback_dispatch(c: &mut Criterion) {
    let vendor = FakeVendor::new();
    let config = BridgeConfig {
        events: cuebridge::EventQueueConfig {
            capacity: 1024,
            ..cuebridge::EventQueueConfig::default()
        },
        ..config_for(&candidate_dirs(1))
    };
    let Ok(bridge) = Bridge::with_opener(config, ScriptedOpener::new().load_any(&vendor)) else {
        return;
    };
    if bridge.load_library().is_err() || !bridge.connect().unwrap_or(false) {
        return;
    }

    c.bench_function("vendor_key_event_to_queue", |b| {
        b.iter(|| black_box(vendor.emit_key(black_box(5), true)));
    });
    c.bench_function("poll_events_batch_100", |b| {
        b.iter(|| {
            for id in 0..100 {
                vendor.emit_key(id, true);
            }
            black_box(bridge.poll_events())
        });
    });
}

criterion_group!(benches, bench_queue_push, bench_drain, bench_callback_dispatch);
criterion_main!(benches);
