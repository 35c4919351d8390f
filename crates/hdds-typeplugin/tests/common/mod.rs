// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures for the integration tests: a few declared types and a
//! seeded generator of dynamic values that match a declaration.

#![allow(dead_code)] // Each test binary uses a different subset

use hdds_typeplugin::dynamic::PrimitiveBuffer;
use hdds_typeplugin::types::{
    annotations as a, Bound, CharEncoding, ElementKind, EnumBuilder, Extensibility, IdlType,
    MemberDescriptor, PrimitiveKind as P, StructBuilder, TypeDescriptor, TypeKind, UnionBuilder,
};
use hdds_typeplugin::{DynamicValue, TypeSupportRegistry};
use std::sync::Arc;

/// Collections beyond this depth are generated empty, optionals absent.
const MAX_DEPTH: usize = 3;
/// Length cap for unbounded strings and sequences.
const UNBOUNDED_LEN: usize = 6;

pub fn point(extensibility: Extensibility) -> Arc<TypeDescriptor> {
    StructBuilder::new("Point")
        .extensibility(extensibility)
        .field("x", P::I32)
        .field("y", P::I32)
        .build()
        .expect("Point")
}

pub fn line(extensibility: Extensibility) -> Arc<TypeDescriptor> {
    let point = point(extensibility);
    StructBuilder::new("Line")
        .extensibility(extensibility)
        .field("a", &point)
        .field("b", &point)
        .build()
        .expect("Line")
}

pub fn color() -> Arc<TypeDescriptor> {
    EnumBuilder::new("Color")
        .variant("Red")
        .variant("Green")
        .variant_value("Blue", 7)
        .build()
        .expect("Color")
}

/// A struct touching every member kind.
pub fn kitchen_sink(extensibility: Extensibility) -> Arc<TypeDescriptor> {
    let color = color();
    let point = point(extensibility);
    let shape = UnionBuilder::new("Shape", P::I16)
        .case("radius", vec![1], P::F64)
        .case("corner", vec![2, 3], &point)
        .default_case("label", IdlType::String)
        .build()
        .expect("Shape");
    StructBuilder::new("KitchenSink")
        .extensibility(extensibility)
        .key_field("id", P::U32)
        .field("flag", P::Bool)
        .field("small", P::I8)
        .field("wide", P::U64)
        .field("ratio", P::F32)
        .field("letter", P::Char)
        .field("color", &color)
        .string_field("name")
        .bounded_string_field("tag", 8)
        .field_with("title", IdlType::String, vec![a::utf16(), a::bound(12)])
        .field("origin", &point)
        .field("shape", &shape)
        .sequence_field("points", &point)
        .bounded_sequence_field("readings", P::F64, 5)
        .field_with("samples", IdlType::sequence(P::U16), vec![a::buffer()])
        .array_field("matrix", P::I16, vec![2, 3])
        .field_with(
            "names",
            IdlType::sequence(IdlType::String),
            vec![a::array(vec![2]), a::element(vec![a::bound(4)])],
        )
        .optional_field("note", IdlType::String)
        .optional_field("extra", &point)
        .build()
        .expect("KitchenSink")
}

pub fn registry() -> TypeSupportRegistry {
    TypeSupportRegistry::new()
}

/// Random value for an aggregate declaration.
pub fn random_value(desc: &Arc<TypeDescriptor>, rng: &mut fastrand::Rng) -> DynamicValue {
    Generator { rng, depth: 0 }.named(desc)
}

struct Generator<'r> {
    rng: &'r mut fastrand::Rng,
    depth: usize,
}

impl Generator<'_> {
    fn named(&mut self, desc: &Arc<TypeDescriptor>) -> DynamicValue {
        match desc.kind() {
            TypeKind::Struct => self.structure(desc),
            TypeKind::Union => self.union(desc),
            TypeKind::Enum => {
                let all = desc.enumerators();
                let e = &all[self.rng.usize(..all.len())];
                DynamicValue::Enum(i64::from(e.value), e.name.clone())
            }
            TypeKind::Alias => {
                let target = desc.alias_target().expect("alias member");
                self.member(target)
            }
        }
    }

    fn structure(&mut self, desc: &Arc<TypeDescriptor>) -> DynamicValue {
        self.depth += 1;
        let fields: Vec<(String, DynamicValue)> = desc
            .members()
            .iter()
            .map(|m| {
                let value = if m.is_optional() && (self.depth > MAX_DEPTH || self.rng.bool()) {
                    DynamicValue::Null
                } else {
                    self.member(m)
                };
                (m.name().to_string(), value)
            })
            .collect();
        self.depth -= 1;
        DynamicValue::structure(fields)
    }

    fn union(&mut self, desc: &Arc<TypeDescriptor>) -> DynamicValue {
        let union = desc.union().expect("union descriptor");
        let used: Vec<i64> = union.cases().iter().flat_map(|c| c.labels().to_vec()).collect();
        let case = &union.cases()[self.rng.usize(..union.cases().len())];
        let label = match case.labels().first() {
            Some(label) => *label,
            None => free_label(union.discriminator(), &used),
        };
        let member = &desc.members()[case.member_index()];
        self.depth += 1;
        let value = self.member(member);
        self.depth -= 1;
        DynamicValue::union(label, member.name(), value)
    }

    fn member(&mut self, member: &MemberDescriptor) -> DynamicValue {
        self.element(member.element(), member.is_buffer())
    }

    fn element(&mut self, element: &ElementKind, buffer: bool) -> DynamicValue {
        match element {
            ElementKind::Primitive(p) => self.primitive(*p),
            ElementKind::String { encoding, bound } => self.string(*encoding, *bound),
            ElementKind::Type(reference) => {
                let desc = reference.resolve().expect("resolved type");
                if desc.kind() == TypeKind::Alias {
                    let target = desc.alias_target().expect("alias member");
                    return self.element(target.element(), target.is_buffer());
                }
                self.named(desc)
            }
            ElementKind::Sequence { element, bound } => {
                let cap = match bound {
                    Bound::Max(n) => *n as usize,
                    Bound::Unbounded => UNBOUNDED_LEN,
                };
                let len = if self.depth > MAX_DEPTH {
                    0
                } else {
                    self.rng.usize(..=cap)
                };
                self.collection(element, len, buffer, DynamicValue::Sequence)
            }
            ElementKind::Array { element, dims } => {
                let count = dims.iter().map(|d| *d as usize).product();
                self.collection(element, count, buffer, DynamicValue::Array)
            }
        }
    }

    fn collection(
        &mut self,
        element: &ElementKind,
        len: usize,
        buffer: bool,
        wrap: fn(Vec<DynamicValue>) -> DynamicValue,
    ) -> DynamicValue {
        if let (true, ElementKind::Primitive(kind)) = (buffer, element) {
            let mut bytes = Vec::with_capacity(len * kind.size());
            for _ in 0..len {
                bytes.extend_from_slice(&numeric_bytes(&self.primitive(*kind)));
            }
            let buffer = PrimitiveBuffer::from_native_bytes(*kind, bytes).expect("numeric");
            return DynamicValue::Buffer(buffer);
        }
        wrap((0..len).map(|_| self.element(element, false)).collect())
    }

    fn primitive(&mut self, kind: P) -> DynamicValue {
        let rng = &mut *self.rng;
        match kind {
            P::Bool => DynamicValue::Bool(rng.bool()),
            P::U8 => DynamicValue::U8(rng.u8(..)),
            P::U16 => DynamicValue::U16(rng.u16(..)),
            P::U32 => DynamicValue::U32(rng.u32(..)),
            P::U64 => DynamicValue::U64(rng.u64(..)),
            P::I8 => DynamicValue::I8(rng.i8(..)),
            P::I16 => DynamicValue::I16(rng.i16(..)),
            P::I32 => DynamicValue::I32(rng.i32(..)),
            P::I64 => DynamicValue::I64(rng.i64(..)),
            P::F32 => DynamicValue::F32(rng.f32() * 1000.0 - 500.0),
            P::F64 => DynamicValue::F64(rng.f64() * 1.0e6 - 5.0e5),
            P::Char | P::WChar => DynamicValue::Char(rng.alphanumeric()),
        }
    }

    fn string(&mut self, encoding: CharEncoding, bound: Bound) -> DynamicValue {
        let cap = match bound {
            Bound::Max(n) => n as usize,
            Bound::Unbounded => UNBOUNDED_LEN * 2,
        };
        let len = self.rng.usize(..=cap);
        let text: String = (0..len)
            .map(|_| match encoding {
                CharEncoding::Utf8 => self.rng.alphanumeric(),
                // Mix in a non-ASCII BMP character to exercise transcoding.
                CharEncoding::Utf16 if self.rng.u8(..8) == 0 => 'é',
                CharEncoding::Utf16 => self.rng.alphanumeric(),
            })
            .collect();
        DynamicValue::String(text)
    }
}

/// A discriminator value selecting the default case.
fn free_label(discriminator: &ElementKind, used: &[i64]) -> i64 {
    let candidates: Vec<i64> = match discriminator {
        ElementKind::Type(reference) => reference
            .resolve()
            .expect("enum discriminator")
            .enumerators()
            .iter()
            .map(|e| i64::from(e.value))
            .collect(),
        ElementKind::Primitive(P::Bool) => vec![0, 1],
        _ => (0..100).collect(),
    };
    candidates
        .into_iter()
        .find(|c| !used.contains(c))
        .expect("a label outside every case")
}

fn numeric_bytes(value: &DynamicValue) -> Vec<u8> {
    match value {
        DynamicValue::U8(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::U16(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::U32(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::U64(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::I8(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::I16(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::I32(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::I64(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::F32(v) => v.to_ne_bytes().to_vec(),
        DynamicValue::F64(v) => v.to_ne_bytes().to_vec(),
        other => panic!("not a numeric value: {:?}", other),
    }
}

/// Little-endian bytes of a `u32`, for building expected buffers.
pub fn le32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}
