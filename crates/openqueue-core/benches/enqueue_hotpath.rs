//! Enqueue/dequeue hot-path benchmarks for openqueue-core.
//!
//! Measures the per-packet cost of the scheduler state machine over the
//! dual-index queue: policy dispatch, double tree insert, largest-key pop
//! with sibling extraction.
//!
//! Run with: cargo bench --package openqueue-core

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use openqueue_core::packet::PacketRef;
use openqueue_core::policies::longest_first::{self, LongestFirstConfig};
use openqueue_core::port::PortBuilder;
use openqueue_core::scheduler::Scheduler;

fn build_scheduler(capacity: i32) -> Scheduler {
    let mut b = PortBuilder::new();
    longest_first::init_port_with(
        &mut b,
        LongestFirstConfig {
            capacity,
            congestion_threshold: capacity,
        },
    )
    .unwrap();
    Scheduler::new(b.finish().unwrap(), Box::new(|_| {}))
}

fn synthetic_pkt(token: u64) -> PacketRef {
    PacketRef::new(token)
        .with_len((token % 1400) as u32)
        .with_tos((token % 64) as u8)
}

fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");
    group.throughput(Throughput::Elements(1));

    group.bench_function("enqueue_dequeue_single", |b| {
        let mut s = build_scheduler(4096);
        let mut token = 0u64;
        b.iter(|| {
            s.enqueue(black_box(synthetic_pkt(token))).unwrap();
            token += 1;
            s.dequeue().unwrap();
        });
    });

    group.bench_function("burst_1k_then_drain", |b| {
        b.iter(|| {
            let mut s = build_scheduler(4096);
            for t in 0..1024u64 {
                s.enqueue(synthetic_pkt(t)).unwrap();
            }
            while s.dequeue().unwrap().is_some() {}
        });
    });

    group.finish();
}

criterion_group!(benches, bench_scheduler);
criterion_main!(benches);
