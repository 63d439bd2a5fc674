//! # Hearth Hub Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | dispatch | validate + apply + commit + diff + publish, no listeners |
//! | fan-out | one dispatch with N wildcard listeners |
//! | diff | top-level diff of wide snapshots |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hub_01_state_machine::{diff, ActionRegistryBuilder, StateMachine};
use serde_json::{json, Value};
use shared_bus::EventBus;
use shared_types::State;

fn increment(state: &State, payload: &Value) -> State {
    let mut next = state.clone();
    let count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
    next.insert(
        "count".into(),
        json!(count + payload["amount"].as_i64().unwrap_or(0)),
    );
    next
}

fn machine(extra_keys: usize) -> StateMachine {
    let mut builder = ActionRegistryBuilder::new();
    builder
        .register("COUNTER:INCREMENT", increment, |p| p["amount"].is_number())
        .unwrap();

    let mut initial = State::new();
    for i in 0..extra_keys {
        initial.insert(format!("device_{i}"), json!({"on": i % 2 == 0, "level": i}));
    }
    StateMachine::new(builder.build(), initial, EventBus::new())
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    for keys in [10usize, 100, 1000] {
        let machine = machine(keys);
        let payload = json!({"amount": 1});
        group.bench_with_input(BenchmarkId::new("state_keys", keys), &keys, |b, _| {
            b.iter(|| machine.dispatch(black_box("COUNTER:INCREMENT"), &payload))
        });
    }
    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan-out");

    for listeners in [1usize, 10, 100] {
        let machine = machine(10);
        let subscriptions: Vec<_> = (0..listeners)
            .map(|_| {
                machine.subscribe_all(|topic, payload| {
                    black_box((topic, payload));
                    Ok(())
                })
            })
            .collect();
        let payload = json!({"amount": 1});

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(BenchmarkId::new("wildcard", listeners), &listeners, |b, _| {
            b.iter(|| machine.dispatch("COUNTER:INCREMENT", &payload))
        });
        drop(subscriptions);
    }
    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for keys in [10usize, 100, 1000] {
        let mut old = State::new();
        for i in 0..keys {
            old.insert(format!("k{i}"), json!({"value": i, "tags": ["a", "b"]}));
        }
        let mut new = old.clone();
        new.insert("k0".into(), json!({"value": -1}));

        group.bench_with_input(BenchmarkId::new("keys", keys), &keys, |b, _| {
            b.iter(|| diff(black_box(&old), black_box(&new)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_fan_out, bench_diff);
criterion_main!(benches);
