//! Debounce check throughput, bare and under the registry lock

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use watcher::{DebounceGate, EventSource, WatchRegistry};

/// Accepts every subscription without touching the OS
struct NullSource;

impl EventSource for NullSource {
    fn watch(&mut self, _path: &Path) -> notify::Result<()> {
        Ok(())
    }

    fn unwatch(&mut self, _path: &Path) -> notify::Result<()> {
        Ok(())
    }
}

fn bench_gate(c: &mut Criterion) {
    let gate = DebounceGate::new(Duration::from_millis(500));
    let start = Instant::now();
    let mut last = gate.seed(start);
    let mut tick = 0u64;

    c.bench_function("gate_check", |b| {
        b.iter(|| {
            tick += 1;
            let now = start + Duration::from_millis(tick);
            black_box(gate.check(&mut last, now))
        });
    });
}

fn bench_registry(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let dirs: Vec<PathBuf> = (0..256).map(|i| root.join(format!("d{}", i))).collect();
    for dir in &dirs {
        std::fs::create_dir_all(dir).unwrap();
    }

    let registry = WatchRegistry::new(NullSource, Duration::from_millis(500));
    for dir in &dirs {
        registry.register(dir).unwrap();
    }

    let events: Vec<PathBuf> = dirs.iter().map(|d| d.join("file.rs")).collect();
    let mut i = 0usize;

    c.bench_function("registry_should_trigger", |b| {
        b.iter(|| {
            i = (i + 1) % events.len();
            black_box(registry.should_trigger(&events[i], Instant::now()))
        });
    });
}

criterion_group!(benches, bench_gate, bench_registry);
criterion_main!(benches);
