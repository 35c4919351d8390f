// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar conversions between dynamic values and native bytes.

use crate::dynamic::DynamicValue;
use crate::error::FieldFault;
use crate::types::{PrimitiveKind, TypeDescriptor};
use std::sync::Arc;

/// Native size of an enum value.
pub const ENUM_SIZE: usize = 4;

/// Enumerators of an enum type, as the native and codec layers need them.
#[derive(Debug)]
pub struct EnumRepr {
    name: Arc<str>,
    enumerators: Vec<(i32, Arc<str>)>,
}

impl EnumRepr {
    pub(crate) fn from_descriptor(desc: &TypeDescriptor) -> Self {
        Self {
            name: Arc::from(desc.name()),
            enumerators: desc
                .enumerators()
                .iter()
                .map(|e| (e.value, Arc::from(e.name.as_str())))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of a default-initialised member: the first enumerator.
    pub fn default_value(&self) -> i32 {
        self.enumerators.first().map_or(0, |(v, _)| *v)
    }

    pub fn name_of(&self, value: i32) -> Option<&Arc<str>> {
        self.enumerators
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, n)| n)
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.enumerators
            .iter()
            .find(|(_, n)| &**n == name)
            .map(|(v, _)| *v)
    }

    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.enumerators.iter().map(|(v, _)| *v)
    }
}

/// A primitive or enum, stored inline.
#[derive(Debug, Clone)]
pub enum ScalarKind {
    Primitive(PrimitiveKind),
    Enum(Arc<EnumRepr>),
}

fn mismatch(expected: &'static str, found: &DynamicValue) -> FieldFault {
    FieldFault::TypeMismatch {
        expected,
        found: found.kind_name().to_string(),
    }
}

fn out_of_range(value: impl ToString, target: PrimitiveKind) -> FieldFault {
    FieldFault::OutOfRange {
        value: value.to_string(),
        target,
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], FieldFault> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(FieldFault::CorruptSample { offset: 0, len: N })
}

/// Write an integer already known to fit `kind`.
fn write_integer(kind: PrimitiveKind, v: i128, out: &mut [u8]) {
    match kind {
        PrimitiveKind::Bool | PrimitiveKind::U8 | PrimitiveKind::Char => out[0] = v as u8,
        PrimitiveKind::I8 => out[0] = (v as i8) as u8,
        PrimitiveKind::U16 | PrimitiveKind::WChar => {
            out[..2].copy_from_slice(&(v as u16).to_ne_bytes());
        }
        PrimitiveKind::I16 => out[..2].copy_from_slice(&(v as i16).to_ne_bytes()),
        PrimitiveKind::U32 => out[..4].copy_from_slice(&(v as u32).to_ne_bytes()),
        PrimitiveKind::I32 => out[..4].copy_from_slice(&(v as i32).to_ne_bytes()),
        PrimitiveKind::U64 => out[..8].copy_from_slice(&(v as u64).to_ne_bytes()),
        PrimitiveKind::I64 => out[..8].copy_from_slice(&(v as i64).to_ne_bytes()),
        PrimitiveKind::F32 => out[..4].copy_from_slice(&(v as f32).to_ne_bytes()),
        PrimitiveKind::F64 => out[..8].copy_from_slice(&(v as f64).to_ne_bytes()),
    }
}

fn read_integer(kind: PrimitiveKind, bytes: &[u8]) -> Result<i128, FieldFault> {
    Ok(match kind {
        PrimitiveKind::Bool | PrimitiveKind::U8 | PrimitiveKind::Char => {
            i128::from(read_array::<1>(bytes)?[0])
        }
        PrimitiveKind::I8 => i128::from(read_array::<1>(bytes)?[0] as i8),
        PrimitiveKind::U16 | PrimitiveKind::WChar => {
            i128::from(u16::from_ne_bytes(read_array(bytes)?))
        }
        PrimitiveKind::I16 => i128::from(i16::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::U32 => i128::from(u32::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::I32 => i128::from(i32::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::U64 => i128::from(u64::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::I64 => i128::from(i64::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::F32 | PrimitiveKind::F64 => {
            return Err(FieldFault::Malformed("float used as an integer".into()))
        }
    })
}

fn store_primitive(kind: PrimitiveKind, value: &DynamicValue, out: &mut [u8]) -> Result<(), FieldFault> {
    match kind {
        PrimitiveKind::Bool => {
            let b = value.as_bool().ok_or_else(|| mismatch("bool", value))?;
            out[0] = u8::from(b);
        }
        PrimitiveKind::Char | PrimitiveKind::WChar => {
            let c = value.as_char().ok_or_else(|| mismatch("char", value))?;
            let code = i128::from(u32::from(c));
            let (_, max) = kind.integer_range().unwrap_or((0, 0));
            if code > max {
                return Err(out_of_range(format!("{:?}", c), kind));
            }
            write_integer(kind, code, out);
        }
        PrimitiveKind::F32 => {
            let v = value.as_float().ok_or_else(|| mismatch("float", value))?;
            out[..4].copy_from_slice(&(v as f32).to_ne_bytes());
        }
        PrimitiveKind::F64 => {
            let v = value.as_float().ok_or_else(|| mismatch("float", value))?;
            out[..8].copy_from_slice(&v.to_ne_bytes());
        }
        _ => {
            let v = value.as_integer().ok_or_else(|| mismatch("integer", value))?;
            let (min, max) = kind.integer_range().unwrap_or((0, 0));
            if v < min || v > max {
                return Err(out_of_range(v, kind));
            }
            write_integer(kind, v, out);
        }
    }
    Ok(())
}

fn load_primitive(kind: PrimitiveKind, bytes: &[u8]) -> Result<DynamicValue, FieldFault> {
    Ok(match kind {
        PrimitiveKind::Bool => DynamicValue::Bool(read_array::<1>(bytes)?[0] != 0),
        PrimitiveKind::U8 => DynamicValue::U8(read_array::<1>(bytes)?[0]),
        PrimitiveKind::I8 => DynamicValue::I8(read_array::<1>(bytes)?[0] as i8),
        PrimitiveKind::U16 => DynamicValue::U16(u16::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::I16 => DynamicValue::I16(i16::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::U32 => DynamicValue::U32(u32::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::I32 => DynamicValue::I32(i32::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::U64 => DynamicValue::U64(u64::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::I64 => DynamicValue::I64(i64::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::F32 => DynamicValue::F32(f32::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::F64 => DynamicValue::F64(f64::from_ne_bytes(read_array(bytes)?)),
        PrimitiveKind::Char => DynamicValue::Char(char::from(read_array::<1>(bytes)?[0])),
        PrimitiveKind::WChar => {
            let unit = u16::from_ne_bytes(read_array(bytes)?);
            let c = char::from_u32(u32::from(unit)).ok_or_else(|| {
                FieldFault::Transcoding(format!("unpaired surrogate {:#06x}", unit))
            })?;
            DynamicValue::Char(c)
        }
    })
}

impl ScalarKind {
    pub fn size(&self) -> usize {
        match self {
            Self::Primitive(p) => p.size(),
            Self::Enum(_) => ENUM_SIZE,
        }
    }

    /// Convert `value` into native bytes at the start of `out`.
    pub(crate) fn store(&self, value: &DynamicValue, out: &mut [u8]) -> Result<(), FieldFault> {
        match self {
            Self::Primitive(kind) => store_primitive(*kind, value, out),
            Self::Enum(repr) => {
                let v = match value {
                    DynamicValue::String(name) => repr
                        .value_of(name)
                        .ok_or_else(|| mismatch("enumerator name", value))?,
                    other => {
                        let raw = other.as_integer().ok_or_else(|| mismatch("enum", other))?;
                        let v = i32::try_from(raw).map_err(|_| FieldFault::InvalidEnumerator(raw as i64))?;
                        if repr.name_of(v).is_none() {
                            return Err(FieldFault::InvalidEnumerator(i64::from(v)));
                        }
                        v
                    }
                };
                out[..ENUM_SIZE].copy_from_slice(&v.to_ne_bytes());
                Ok(())
            }
        }
    }

    /// Read native bytes back into a dynamic value.
    pub(crate) fn load(&self, bytes: &[u8]) -> Result<DynamicValue, FieldFault> {
        match self {
            Self::Primitive(kind) => load_primitive(*kind, bytes),
            Self::Enum(repr) => {
                let v = i32::from_ne_bytes(read_array(bytes)?);
                let name = repr
                    .name_of(v)
                    .ok_or(FieldFault::InvalidEnumerator(i64::from(v)))?;
                Ok(DynamicValue::Enum(i64::from(v), name.to_string()))
            }
        }
    }

    /// Store a union label as this discriminator kind.
    pub(crate) fn store_label(&self, label: i64, out: &mut [u8]) -> Result<(), FieldFault> {
        match self {
            Self::Primitive(kind) => {
                let (min, max) = kind
                    .integer_range()
                    .ok_or(FieldFault::InvalidDiscriminator(label))?;
                if !(min..=max).contains(&i128::from(label)) {
                    return Err(FieldFault::InvalidDiscriminator(label));
                }
                write_integer(*kind, i128::from(label), out);
                Ok(())
            }
            Self::Enum(_) => {
                let v = i32::try_from(label).map_err(|_| FieldFault::InvalidDiscriminator(label))?;
                out[..ENUM_SIZE].copy_from_slice(&v.to_ne_bytes());
                Ok(())
            }
        }
    }

    /// Read a union discriminator as a label.
    pub(crate) fn load_label(&self, bytes: &[u8]) -> Result<i64, FieldFault> {
        match self {
            Self::Primitive(kind) => Ok(read_integer(*kind, bytes)? as i64),
            Self::Enum(_) => Ok(i64::from(i32::from_ne_bytes(read_array(bytes)?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumBuilder;

    #[test]
    fn test_integer_range_checks() {
        let kind = ScalarKind::Primitive(PrimitiveKind::U8);
        let mut out = [0u8; 1];
        kind.store(&DynamicValue::I32(200), &mut out).expect("fits");
        assert_eq!(out[0], 200);
        let err = kind
            .store(&DynamicValue::I32(256), &mut out)
            .expect_err("too large");
        assert!(matches!(err, FieldFault::OutOfRange { .. }));
        let err = kind
            .store(&DynamicValue::from("7"), &mut out)
            .expect_err("string");
        assert!(matches!(err, FieldFault::TypeMismatch { .. }));
    }

    #[test]
    fn test_float_and_char() {
        let mut out = [0u8; 8];
        let f = ScalarKind::Primitive(PrimitiveKind::F64);
        f.store(&DynamicValue::I32(3), &mut out).expect("int to float");
        assert_eq!(f.load(&out).expect("load"), DynamicValue::F64(3.0));

        let c = ScalarKind::Primitive(PrimitiveKind::Char);
        assert!(c.store(&DynamicValue::Char('\u{263A}'), &mut out).is_err());
        let w = ScalarKind::Primitive(PrimitiveKind::WChar);
        w.store(&DynamicValue::Char('\u{263A}'), &mut out).expect("bmp char");
        assert_eq!(w.load(&out).expect("load"), DynamicValue::Char('\u{263A}'));
    }

    #[test]
    fn test_enum_values() {
        let desc = EnumBuilder::new("Color")
            .variant("Red")
            .variant_value("Blue", 4)
            .build()
            .expect("enum");
        let kind = ScalarKind::Enum(Arc::new(EnumRepr::from_descriptor(&desc)));
        let mut out = [0u8; 4];
        kind.store(&DynamicValue::from("Blue"), &mut out).expect("by name");
        assert_eq!(
            kind.load(&out).expect("load"),
            DynamicValue::Enum(4, "Blue".into())
        );
        assert!(matches!(
            kind.store(&DynamicValue::I32(2), &mut out),
            Err(FieldFault::InvalidEnumerator(2))
        ));
        out.copy_from_slice(&9i32.to_ne_bytes());
        assert!(kind.load(&out).is_err());
    }

    #[test]
    fn test_labels() {
        let kind = ScalarKind::Primitive(PrimitiveKind::I16);
        let mut out = [0u8; 2];
        kind.store_label(-3, &mut out).expect("label");
        assert_eq!(kind.load_label(&out).expect("label"), -3);
        assert!(kind.store_label(70_000, &mut out).is_err());
    }
}
