//! # Component Table Benchmark
//!
//! Locked access paths: per-call point access versus one scoped lock, and
//! entity projections across two tables.
//!
//! Run with: `cargo bench --package gamelib_core --bench component_table_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gamelib_core::{component, EntitySchema, EntityTable, TypedTable};

component! {
    struct Position { x: f32, y: f32, z: f32 }
}

component! {
    struct Velocity { x: f32, y: f32, z: f32 }
}

const ENTITY_COUNT: usize = 50_000;

/// Point writes, one lock per call.
fn bench_point_update(c: &mut Criterion) {
    let positions = TypedTable::<Position>::new().expect("valid schema");
    let ids: Vec<u32> = (0..ENTITY_COUNT)
        .map(|_| positions.create(Position::default()).expect("valid row").id())
        .collect();

    c.bench_function("point_update_50K", |b| {
        b.iter(|| {
            for &id in &ids {
                if let Some(record) = positions.get(id) {
                    let x = record.get(Position::x).unwrap_or_default();
                    record.set(Position::x, x + 0.1);
                }
            }
        });
    });
}

/// The same update through one scoped lock and column slices.
fn bench_locked_update(c: &mut Criterion) {
    let positions = TypedTable::<Position>::new().expect("valid schema");
    let velocities = TypedTable::<Velocity>::new().expect("valid schema");
    for _ in 0..ENTITY_COUNT {
        positions.create(Position::default()).expect("valid row");
        velocities
            .create(Velocity { x: 0.1, y: 0.2, z: 0.3 })
            .expect("valid row");
    }

    c.bench_function("locked_update_50K", |b| {
        b.iter(|| {
            let p = positions.lock();
            let v = velocities.lock();
            let mut xs = p.column_mut(Position::x);
            let vx = v.column(Velocity::x);
            for (x, dx) in xs.iter_mut().zip(vx.iter()) {
                *x += *dx;
            }
            black_box(xs.len())
        });
    });
}

/// Entity projection: entity id column -> component dense index -> value.
fn bench_projection(c: &mut Criterion) {
    let positions = TypedTable::<Position>::new().expect("valid schema");
    let bodies = EntityTable::new(
        EntitySchema::builder("Body")
            .component("position", positions.table())
            .build()
            .expect("valid schema"),
    )
    .expect("valid schema");
    for i in 0..ENTITY_COUNT {
        let p = positions
            .create(Position { x: i as f32, y: 0.0, z: 0.0 })
            .expect("valid row");
        bodies.create(&[p.id()]).expect("live component");
    }

    c.bench_function("entity_projection_50K", |b| {
        b.iter(|| black_box(bodies.project::<f32>("position", "x").expect("declared f32")));
    });
}

criterion_group!(benches, bench_point_update, bench_locked_update, bench_projection);

criterion_main!(benches);
