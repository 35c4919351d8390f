// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Optional members: an absent value and an explicit zero stay distinct on
//! the wire and after decoding.

mod common;

use common::{point, registry};
use hdds_typeplugin::types::{IdlType, PrimitiveKind as P, StructBuilder};
use hdds_typeplugin::{DataRepresentation, DynamicValue, Extensibility};

fn reading(ext: Extensibility) -> std::sync::Arc<hdds_typeplugin::TypeDescriptor> {
    StructBuilder::new("Reading")
        .extensibility(ext)
        .field("id", P::U32)
        .optional_field("value", P::U32)
        .build()
        .unwrap()
}

#[test]
fn absent_and_zero_differ_in_every_encoding() {
    let registry = registry();
    for ext in [
        Extensibility::Final,
        Extensibility::Extensible,
        Extensibility::Mutable,
    ] {
        let support = registry.get_or_create(&reading(ext)).unwrap();
        let absent = DynamicValue::structure([
            ("id", DynamicValue::U32(1)),
            ("value", DynamicValue::Null),
        ]);
        let zero = DynamicValue::structure([
            ("id", DynamicValue::U32(1)),
            ("value", DynamicValue::U32(0)),
        ]);
        for rep in [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2] {
            let a = support.serialize_with(&absent, rep).unwrap();
            let z = support.serialize_with(&zero, rep).unwrap();
            assert_ne!(a, z, "{:?}/{:?}", ext, rep);
            assert_eq!(support.deserialize(&a).unwrap(), absent);
            assert_eq!(support.deserialize(&z).unwrap(), zero);
        }
    }
}

#[test]
fn missing_optional_reads_as_null() {
    let registry = registry();
    let support = registry
        .get_or_create(&reading(Extensibility::Final))
        .unwrap();
    let value = DynamicValue::structure([("id", DynamicValue::U32(5))]);
    let bytes = support.serialize(&value).unwrap();
    let back = support.deserialize(&bytes).unwrap();
    assert_eq!(back.get_field("value"), Some(&DynamicValue::Null));
}

#[test]
fn xcdr2_presence_flag_bytes() {
    let registry = registry();
    let support = registry
        .get_or_create(&reading(Extensibility::Final))
        .unwrap();
    let absent = DynamicValue::structure([("id", DynamicValue::U32(1)), ("value", DynamicValue::Null)]);
    assert_eq!(
        support
            .serialize_with(&absent, DataRepresentation::Xcdr2)
            .unwrap(),
        vec![0x00, 0x07, 0x00, 0x03, 1, 0, 0, 0, 0, 0, 0, 0]
    );
    let zero = DynamicValue::structure([("id", DynamicValue::U32(1)), ("value", DynamicValue::U32(0))]);
    assert_eq!(
        support
            .serialize_with(&zero, DataRepresentation::Xcdr2)
            .unwrap(),
        vec![0x00, 0x07, 0x00, 0x00, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn xcdr1_optional_uses_parameter_header() {
    let registry = registry();
    let support = registry
        .get_or_create(&reading(Extensibility::Final))
        .unwrap();
    let absent = DynamicValue::structure([("id", DynamicValue::U32(1)), ("value", DynamicValue::Null)]);
    assert_eq!(
        support
            .serialize_with(&absent, DataRepresentation::Xcdr1)
            .unwrap(),
        vec![0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 1, 0, 0, 0]
    );
    let zero = DynamicValue::structure([("id", DynamicValue::U32(1)), ("value", DynamicValue::U32(0))]);
    assert_eq!(
        support
            .serialize_with(&zero, DataRepresentation::Xcdr1)
            .unwrap(),
        vec![0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 1, 0, 4, 0, 0, 0, 0, 0]
    );
}

#[test]
fn optional_nested_struct_and_string() {
    let point = point(Extensibility::Final);
    let desc = StructBuilder::new("Marker")
        .optional_field("at", &point)
        .optional_field("label", IdlType::String)
        .build()
        .unwrap();
    let registry = registry();
    let support = registry.get_or_create(&desc).unwrap();

    let present = DynamicValue::structure([
        (
            "at",
            DynamicValue::structure([("x", DynamicValue::I32(0)), ("y", DynamicValue::I32(0))]),
        ),
        ("label", DynamicValue::from("")),
    ]);
    let absent = DynamicValue::structure([("at", DynamicValue::Null), ("label", DynamicValue::Null)]);
    for rep in [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2] {
        let p = support.serialize_with(&present, rep).unwrap();
        let a = support.serialize_with(&absent, rep).unwrap();
        assert_eq!(support.deserialize(&p).unwrap(), present);
        assert_eq!(support.deserialize(&a).unwrap(), absent);
    }
}
