// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serialize / deserialize throughput of compiled type supports.
//!
//! Covers a fixed-size struct in every extensibility and a struct carrying a
//! numeric buffer, which takes the bulk copy path.

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hdds_typeplugin::dynamic::PrimitiveBuffer;
use hdds_typeplugin::types::{annotations as a, IdlType, PrimitiveKind as P, StructBuilder};
use hdds_typeplugin::{DataRepresentation, DynamicValue, Extensibility, TypeSupportRegistry};

fn pose_value() -> DynamicValue {
    DynamicValue::structure([
        ("id", DynamicValue::U32(42)),
        ("x", DynamicValue::F64(1.25)),
        ("y", DynamicValue::F64(-3.5)),
        ("z", DynamicValue::F64(0.0)),
        ("heading", DynamicValue::F32(90.0)),
        ("frame", DynamicValue::from("map")),
    ])
}

fn bench_pose(c: &mut Criterion) {
    let registry = TypeSupportRegistry::new();
    let mut group = c.benchmark_group("pose");
    for ext in [
        Extensibility::Final,
        Extensibility::Extensible,
        Extensibility::Mutable,
    ] {
        let desc = StructBuilder::new("Pose")
            .extensibility(ext)
            .key_field("id", P::U32)
            .field("x", P::F64)
            .field("y", P::F64)
            .field("z", P::F64)
            .field("heading", P::F32)
            .bounded_string_field("frame", 16)
            .build()
            .expect("Pose");
        let support = registry.get_or_create(&desc).expect("type support");
        let value = pose_value();
        for rep in [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2] {
            let label = format!("{:?}/{:?}", ext, rep);
            let bytes = support.serialize_with(&value, rep).expect("serialize");
            group.throughput(Throughput::Bytes(bytes.len() as u64));
            group.bench_with_input(BenchmarkId::new("serialize", &label), &value, |b, v| {
                b.iter(|| support.serialize_with(black_box(v), rep).expect("serialize"));
            });
            group.bench_with_input(BenchmarkId::new("deserialize", &label), &bytes, |b, data| {
                b.iter(|| support.deserialize(black_box(data)).expect("deserialize"));
            });
        }
    }
    group.finish();
}

fn bench_buffer(c: &mut Criterion) {
    let registry = TypeSupportRegistry::new();
    let desc = StructBuilder::new("Frame")
        .extensibility(Extensibility::Final)
        .field("seq", P::U64)
        .field_with("pixels", IdlType::sequence(P::U16), vec![a::buffer()])
        .build()
        .expect("Frame");
    let support = registry.get_or_create(&desc).expect("type support");

    let mut group = c.benchmark_group("buffer");
    for len in [64usize, 4096, 65_536] {
        let pixels: Vec<u16> = (0..len).map(|i| i as u16).collect();
        let value = DynamicValue::structure([
            ("seq", DynamicValue::U64(7)),
            ("pixels", DynamicValue::Buffer(PrimitiveBuffer::from_slice(&pixels))),
        ]);
        let bytes = support.serialize(&value).expect("serialize");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("serialize", len), &value, |b, v| {
            b.iter(|| support.serialize(black_box(v)).expect("serialize"));
        });
        group.bench_with_input(BenchmarkId::new("deserialize", len), &bytes, |b, data| {
            b.iter(|| support.deserialize(black_box(data)).expect("deserialize"));
        });
    }
    group.finish();
}

fn bench_key_hash(c: &mut Criterion) {
    let registry = TypeSupportRegistry::new();
    let desc = StructBuilder::new("Track")
        .key_field("fleet", IdlType::String)
        .key_field("id", P::U64)
        .field("speed", P::F32)
        .build()
        .expect("Track");
    let support = registry.get_or_create(&desc).expect("type support");
    let value = DynamicValue::structure([
        ("fleet", DynamicValue::from("north-atlantic")),
        ("id", DynamicValue::U64(1_234_567)),
        ("speed", DynamicValue::F32(12.0)),
    ]);
    c.bench_function("key_hash", |b| {
        b.iter(|| support.key_hash(black_box(&value)).expect("key hash"));
    });
}

criterion_group!(benches, bench_pose, bench_buffer, bench_key_hash);
criterion_main!(benches);
