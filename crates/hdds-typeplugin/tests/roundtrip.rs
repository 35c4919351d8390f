// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Round-trip, determinism and worst-case size checks across every
//! extensibility kind and both data representations.

mod common;

use common::{kitchen_sink, line, random_value, registry};
use hdds_typeplugin::types::{annotations as a, IdlType, PrimitiveKind as P, StructBuilder};
use hdds_typeplugin::{DataRepresentation, DynamicValue, Extensibility, WireSize};

const EXTENSIBILITIES: [Extensibility; 3] = [
    Extensibility::Final,
    Extensibility::Extensible,
    Extensibility::Mutable,
];
const REPRESENTATIONS: [DataRepresentation; 2] =
    [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2];

#[test]
fn default_values_round_trip() {
    let registry = registry();
    for ext in EXTENSIBILITIES {
        let support = registry.get_or_create(&kitchen_sink(ext)).unwrap();
        let value = support.create_default().unwrap();
        for rep in REPRESENTATIONS {
            let bytes = support.serialize_with(&value, rep).unwrap();
            assert_eq!(bytes.len() % 4, 0);
            assert_eq!(
                support.deserialize(&bytes).unwrap(),
                value,
                "{:?} / {:?}",
                ext,
                rep
            );
        }
    }
}

#[test]
fn seeded_values_round_trip() {
    let registry = registry();
    for ext in EXTENSIBILITIES {
        let desc = kitchen_sink(ext);
        let support = registry.get_or_create(&desc).unwrap();
        for seed in 0..40u64 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let value = random_value(&desc, &mut rng);
            for rep in REPRESENTATIONS {
                let bytes = support
                    .serialize_with(&value, rep)
                    .unwrap_or_else(|e| panic!("seed {} {:?}/{:?}: {}", seed, ext, rep, e));
                let back = support
                    .deserialize(&bytes)
                    .unwrap_or_else(|e| panic!("seed {} {:?}/{:?}: {}", seed, ext, rep, e));
                assert_eq!(back, value, "seed {} {:?}/{:?}", seed, ext, rep);
            }
        }
    }
}

#[test]
fn serialization_is_deterministic() {
    let registry = registry();
    let desc = kitchen_sink(Extensibility::Mutable);
    let support = registry.get_or_create(&desc).unwrap();
    let mut rng = fastrand::Rng::with_seed(7);
    let value = random_value(&desc, &mut rng);
    for rep in REPRESENTATIONS {
        let first = support.serialize_with(&value, rep).unwrap();
        let second = support.serialize_with(&value, rep).unwrap();
        assert_eq!(first, second);
        // Decode then re-encode yields the same bytes.
        let again = support
            .serialize_with(&support.deserialize(&first).unwrap(), rep)
            .unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn line_of_points_fills_max_size_exactly() {
    let registry = registry();
    for ext in EXTENSIBILITIES {
        let support = registry.get_or_create(&line(ext)).unwrap();
        let point = |x, y| DynamicValue::structure([("x", DynamicValue::I32(x)), ("y", DynamicValue::I32(y))]);
        let value = DynamicValue::structure([("a", point(1, 2)), ("b", point(-3, 4))]);
        for rep in REPRESENTATIONS {
            let bytes = support.serialize_with(&value, rep).unwrap();
            assert_eq!(
                support.max_size_for(rep).unwrap(),
                WireSize::Bounded(bytes.len()),
                "{:?} / {:?}",
                ext,
                rep
            );
            assert_eq!(support.deserialize(&bytes).unwrap(), value);
        }
    }
}

#[test]
fn final_line_is_twenty_bytes() {
    let registry = registry();
    let support = registry.get_or_create(&line(Extensibility::Final)).unwrap();
    assert_eq!(support.max_size().unwrap(), WireSize::Bounded(20));
}

#[test]
fn bounded_int_sequence_at_bound_matches_max_size() {
    let desc = StructBuilder::new("Seq")
        .extensibility(Extensibility::Final)
        .bounded_sequence_field("values", P::I32, 4)
        .build()
        .unwrap();
    let registry = registry();
    let support = registry.get_or_create(&desc).unwrap();
    let full = DynamicValue::structure([(
        "values",
        DynamicValue::from(vec![1i32, 2, 3, 4]),
    )]);
    let bytes = support.serialize(&full).unwrap();
    // header + count + 4 elements
    assert_eq!(bytes.len(), 4 + 4 + 16);
    assert_eq!(support.max_size().unwrap(), WireSize::Bounded(bytes.len()));
    assert_eq!(support.deserialize(&bytes).unwrap(), full);
}

#[test]
fn unbounded_members_have_no_max_size() {
    let desc = StructBuilder::new("Text")
        .string_field("body")
        .build()
        .unwrap();
    let registry = registry();
    let support = registry.get_or_create(&desc).unwrap();
    assert_eq!(support.max_size().unwrap(), WireSize::Unbounded);
    assert!(support.max_size().unwrap().bounded().is_none());
}

#[test]
fn wide_strings_round_trip_in_both_representations() {
    let desc = StructBuilder::new("Wide")
        .field_with("text", IdlType::String, vec![a::utf16()])
        .field("letter", P::WChar)
        .build()
        .unwrap();
    let registry = registry();
    let support = registry.get_or_create(&desc).unwrap();
    let value = DynamicValue::structure([
        ("text", DynamicValue::from("grüße, 世界")),
        ("letter", DynamicValue::Char('Ω')),
    ]);
    for rep in REPRESENTATIONS {
        let bytes = support.serialize_with(&value, rep).unwrap();
        assert_eq!(support.deserialize(&bytes).unwrap(), value);
    }
}

#[test]
fn native_samples_convert_both_ways() {
    let desc = kitchen_sink(Extensibility::Final);
    let registry = registry();
    let support = registry.get_or_create(&desc).unwrap();
    let mut rng = fastrand::Rng::with_seed(99);
    let value = random_value(&desc, &mut rng);
    let sample = support.to_native(&value).unwrap();
    assert_eq!(
        sample.root_bytes().len(),
        support.plugin().unwrap().layout().size()
    );
    assert_eq!(support.from_native(&sample).unwrap(), value);
}

#[test]
fn sequence_of_empty_structs_round_trips() {
    let empty = StructBuilder::new("Empty")
        .extensibility(Extensibility::Final)
        .build()
        .unwrap();
    let desc = StructBuilder::new("Holder")
        .extensibility(Extensibility::Final)
        .sequence_field("items", &empty)
        .build()
        .unwrap();
    let registry = registry();
    let support = registry.get_or_create(&desc).unwrap();
    let item = || DynamicValue::Struct(Default::default());
    let value = DynamicValue::structure([(
        "items",
        DynamicValue::Sequence(vec![item(), item(), item()]),
    )]);

    let xcdr1 = support
        .serialize_with(&value, DataRepresentation::Xcdr1)
        .unwrap();
    // Only the element count is on the wire.
    assert_eq!(xcdr1, [0, 1, 0, 0, 3, 0, 0, 0]);
    let xcdr2 = support
        .serialize_with(&value, DataRepresentation::Xcdr2)
        .unwrap();
    assert_eq!(xcdr2, [0, 7, 0, 0, 4, 0, 0, 0, 3, 0, 0, 0]);
    for bytes in [xcdr1, xcdr2] {
        assert_eq!(support.deserialize(&bytes).unwrap(), value);
    }
    // A count with nothing behind it is still capped.
    assert!(support
        .deserialize(&[0, 1, 0, 0, 0xff, 0xff, 0xff, 0xff])
        .is_err());
}
