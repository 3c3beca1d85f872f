//! Thread-local slot benchmarks.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use spindle_core::TlsSlot;

fn bench_slot_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("tls_lifecycle");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_drop", |b| {
        b.iter(|| {
            let slot = TlsSlot::new();
            black_box(&slot);
        });
    });

    group.finish();
}

fn bench_slot_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("tls_access");
    group.throughput(Throughput::Elements(1));

    let slot = TlsSlot::new();
    let value = 0x5110_usize as *mut c_void;

    group.bench_function("set", |b| {
        b.iter(|| slot.set(black_box(value)));
    });

    slot.set(value);
    group.bench_function("get", |b| {
        b.iter(|| black_box(slot.get()));
    });

    group.bench_function("set_get", |b| {
        b.iter(|| {
            slot.set(black_box(value));
            black_box(slot.get());
        });
    });

    group.finish();
}

fn bench_slot_access_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("tls_contended");
    group.throughput(Throughput::Elements(1));

    let slot = TlsSlot::new();
    let stop = AtomicBool::new(false);
    std::thread::scope(|scope| {
        for worker in 0..3usize {
            let slot = &slot;
            let stop = &stop;
            scope.spawn(move || {
                let tag = (0x2000 + worker * 0x10) as *mut c_void;
                while !stop.load(Ordering::Relaxed) {
                    slot.set(tag);
                    black_box(slot.get());
                }
            });
        }

        let value = 0x5110_usize as *mut c_void;
        slot.set(value);
        group.bench_function("get", |b| {
            b.iter(|| black_box(slot.get()));
        });

        stop.store(true, Ordering::Relaxed);
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_slot_lifecycle,
    bench_slot_access,
    bench_slot_access_contended
);
criterion_main!(benches);
