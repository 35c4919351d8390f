// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Readers and writers built from different versions of the same type.

mod common;

use common::registry;
use hdds_typeplugin::error::WireError;
use hdds_typeplugin::types::{annotations as a, PrimitiveKind as P, StructBuilder};
use hdds_typeplugin::{DataRepresentation, DynamicValue, Error, Extensibility, TypeDescriptor};
use std::sync::Arc;

const REPRESENTATIONS: [DataRepresentation; 2] =
    [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2];

fn v1(ext: Extensibility) -> Arc<TypeDescriptor> {
    StructBuilder::new("Position")
        .extensibility(ext)
        .key_field("id", P::U32)
        .field("x", P::I32)
        .field("y", P::I32)
        .build()
        .unwrap()
}

fn v2(ext: Extensibility) -> Arc<TypeDescriptor> {
    StructBuilder::new("Position")
        .extensibility(ext)
        .key_field("id", P::U32)
        .field("x", P::I32)
        .field("y", P::I32)
        .string_field("label")
        .field("z", P::I32)
        .build()
        .unwrap()
}

fn old_value() -> DynamicValue {
    DynamicValue::structure([
        ("id", DynamicValue::U32(9)),
        ("x", DynamicValue::I32(-1)),
        ("y", DynamicValue::I32(2)),
    ])
}

fn new_value() -> DynamicValue {
    DynamicValue::structure([
        ("id", DynamicValue::U32(9)),
        ("x", DynamicValue::I32(-1)),
        ("y", DynamicValue::I32(2)),
        ("label", DynamicValue::from("north")),
        ("z", DynamicValue::I32(40)),
    ])
}

#[test]
fn mutable_reader_skips_members_it_does_not_know() {
    let registry = registry();
    let old = registry.get_or_create(&v1(Extensibility::Mutable)).unwrap();
    let new = registry.get_or_create(&v2(Extensibility::Mutable)).unwrap();
    for rep in REPRESENTATIONS {
        let bytes = new.serialize_with(&new_value(), rep).unwrap();
        assert_eq!(old.deserialize(&bytes).unwrap(), old_value(), "{:?}", rep);
    }
}

#[test]
fn mutable_reader_defaults_members_the_writer_lacks() {
    let registry = registry();
    let old = registry.get_or_create(&v1(Extensibility::Mutable)).unwrap();
    let new = registry.get_or_create(&v2(Extensibility::Mutable)).unwrap();
    let mut expected = old_value();
    expected.set_field("label", DynamicValue::from(""));
    expected.set_field("z", DynamicValue::I32(0));
    for rep in REPRESENTATIONS {
        let bytes = old.serialize_with(&old_value(), rep).unwrap();
        assert_eq!(new.deserialize(&bytes).unwrap(), expected, "{:?}", rep);
    }
}

#[test]
fn mutable_members_may_arrive_reordered_by_id() {
    // Same ids, declared in a different order.
    let shuffled = StructBuilder::new("Position")
        .extensibility(Extensibility::Mutable)
        .field_with("y", P::I32, [a::id(2)])
        .field_with("x", P::I32, [a::id(1)])
        .field_with("id", P::U32, [a::id(0), a::key()])
        .build()
        .unwrap();
    let registry = registry();
    let writer = registry.get_or_create(&v1(Extensibility::Mutable)).unwrap();
    let reader = registry.get_or_create(&shuffled).unwrap();
    for rep in REPRESENTATIONS {
        let bytes = writer.serialize_with(&old_value(), rep).unwrap();
        assert_eq!(reader.deserialize(&bytes).unwrap(), old_value());
    }
}

#[test]
fn unknown_must_understand_member_is_rejected() {
    let writer = StructBuilder::new("Position")
        .extensibility(Extensibility::Mutable)
        .key_field("id", P::U32)
        .field("x", P::I32)
        .field("y", P::I32)
        .field_with("zone", P::U16, [a::key(), a::id(7)])
        .build()
        .unwrap();
    let registry = registry();
    let writer = registry.get_or_create(&writer).unwrap();
    let reader = registry.get_or_create(&v1(Extensibility::Mutable)).unwrap();
    let mut value = old_value();
    value.set_field("zone", DynamicValue::U16(3));
    for rep in REPRESENTATIONS {
        let bytes = writer.serialize_with(&value, rep).unwrap();
        let err = reader.deserialize(&bytes).unwrap_err();
        assert_eq!(
            err,
            Error::Wire(WireError::MustUnderstand { member_id: 7 }),
            "{:?}",
            rep
        );
    }
}

#[test]
fn appendable_xcdr2_reader_tolerates_both_directions() {
    let registry = registry();
    let old = registry
        .get_or_create(&v1(Extensibility::Extensible))
        .unwrap();
    let new = registry
        .get_or_create(&v2(Extensibility::Extensible))
        .unwrap();

    let bytes = new
        .serialize_with(&new_value(), DataRepresentation::Xcdr2)
        .unwrap();
    assert_eq!(old.deserialize(&bytes).unwrap(), old_value());

    let bytes = old
        .serialize_with(&old_value(), DataRepresentation::Xcdr2)
        .unwrap();
    let mut expected = old_value();
    expected.set_field("label", DynamicValue::from(""));
    expected.set_field("z", DynamicValue::I32(0));
    assert_eq!(new.deserialize(&bytes).unwrap(), expected);
}

#[test]
fn appendable_xcdr1_has_no_delimiter() {
    let registry = registry();
    let old = registry
        .get_or_create(&v1(Extensibility::Extensible))
        .unwrap();
    let new = registry
        .get_or_create(&v2(Extensibility::Extensible))
        .unwrap();
    let bytes = old
        .serialize_with(&old_value(), DataRepresentation::Xcdr1)
        .unwrap();
    // Twelve payload bytes, nothing to say where the type ends.
    assert_eq!(bytes.len(), 4 + 12);
    let err = new.deserialize(&bytes).unwrap_err();
    assert_eq!(err.as_field_error().map(|f| f.field()), Some("label"));
}

#[test]
fn appendable_nested_in_final_keeps_outer_alignment() {
    let registry = registry();
    let inner_old = v1(Extensibility::Extensible);
    let inner_new = v2(Extensibility::Extensible);
    let outer = |inner: &Arc<TypeDescriptor>| {
        StructBuilder::new("Track")
            .extensibility(Extensibility::Final)
            .field("head", inner)
            .field("speed", P::F64)
            .build()
            .unwrap()
    };
    let writer = registry.get_or_create(&outer(&inner_new)).unwrap();
    let reader = registry.get_or_create(&outer(&inner_old)).unwrap();

    let written = DynamicValue::structure([
        ("head", new_value()),
        ("speed", DynamicValue::F64(12.5)),
    ]);
    let bytes = writer
        .serialize_with(&written, DataRepresentation::Xcdr2)
        .unwrap();
    let read = reader.deserialize(&bytes).unwrap();
    assert_eq!(read.get_field("head"), Some(&old_value()));
    assert_eq!(read.get_field("speed"), Some(&DynamicValue::F64(12.5)));
}
