use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use logsweep_core::{EventId, ExpectedVersion, Principal, StreamId};
use logsweep_events::{CheckpointTag, EmittedEvent};
use logsweep_infra::log_store::NewRecord;
use logsweep_infra::{EmittedStreamManager, InMemoryLogStore, JobNames, LogStore, ReclaimConfig};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn manager(store: &Arc<InMemoryLogStore>, config: ReclaimConfig) -> EmittedStreamManager<InMemoryLogStore> {
    EmittedStreamManager::new(
        store.clone(),
        Arc::new(JobNames::new("bench_projection").unwrap()),
        config,
    )
}

fn emitted_events(count: usize) -> Vec<EmittedEvent> {
    (0..count)
        .map(|i| {
            EmittedEvent::new(
                StreamId::new(format!("bench-out-{i}")).unwrap(),
                EventId::new(),
                "type1",
                true,
                Some("{}".to_string()),
                CheckpointTag::from_position(0, i as i64, i as i64),
            )
        })
        .collect()
}

/// A store where `count` emitted streams exist and are tracked.
fn populated_store(rt: &Runtime, count: usize, config: &ReclaimConfig) -> Arc<InMemoryLogStore> {
    let store = Arc::new(InMemoryLogStore::new());
    let events = emitted_events(count);
    rt.block_on(async {
        for event in &events {
            store
                .append(
                    event.stream_id(),
                    ExpectedVersion::Any,
                    NewRecord::new("type1", true, b"{}".to_vec()),
                    &Principal::System,
                )
                .await
                .unwrap();
        }
        manager(&store, config.clone())
            .track_emitted_stream(&events)
            .wait()
            .await;
    });
    store.clear_journal();
    store
}

fn bench_tracking_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracking_throughput");
    let rt = runtime();

    for batch_size in [1, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("track_batch", batch_size),
            batch_size,
            |b, &size| {
                let events = emitted_events(size);
                let store = Arc::new(InMemoryLogStore::new());
                let m = manager(&store, ReclaimConfig::default());

                b.iter(|| {
                    // Spawning needs the runtime context, so track inside block_on.
                    rt.block_on(async { m.track_emitted_stream(black_box(&events)).wait().await });
                });
            },
        );
    }

    group.finish();
}

fn bench_sweep_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_throughput");
    let rt = runtime();
    let config = ReclaimConfig::default();

    for stream_count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*stream_count as u64));
        group.bench_with_input(
            BenchmarkId::new("delete_emitted_streams", stream_count),
            stream_count,
            |b, &count| {
                b.iter_batched(
                    || populated_store(&rt, count, &config),
                    |store| {
                        let report = rt
                            .block_on(manager(&store, config.clone()).sweep())
                            .unwrap();
                        black_box(report);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_checkpoint_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkpoint_threshold");
    let rt = runtime();
    let count = 1000;

    for threshold in [1u32, 10, 100, 1000].iter() {
        let config = ReclaimConfig::default().with_checkpoint_threshold(*threshold);
        group.bench_with_input(
            BenchmarkId::new("sweep_1000", threshold),
            threshold,
            |b, _| {
                b.iter_batched(
                    || populated_store(&rt, count, &config),
                    |store| {
                        black_box(rt.block_on(manager(&store, config.clone()).sweep()).unwrap());
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tracking_throughput,
    bench_sweep_throughput,
    bench_checkpoint_threshold
);
criterion_main!(benches);
