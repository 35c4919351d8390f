// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values: the object-graph side of every sample program.

use super::PrimitiveBuffer;
use std::collections::HashMap;

/// A dynamic value of any declared type.
///
/// Struct members are looked up by name. An absent optional member is
/// [`DynamicValue::Null`] (or simply missing from the map).
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    // Primitives
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    /// Narrow or wide string; the declaration decides the encoding.
    String(String),

    // Composites
    Struct(HashMap<String, DynamicValue>),
    Sequence(Vec<DynamicValue>),
    Array(Vec<DynamicValue>),
    /// Contiguous numeric collection.
    Buffer(PrimitiveBuffer),
    Enum(i64, String),                     // (value, enumerator name)
    Union(i64, String, Box<DynamicValue>), // (discriminator, case name, value)

    // Special
    Null,
}

macro_rules! exact_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("The value if this is `", stringify!($variant), "`.")]
        pub fn $name(&self) -> Option<$ty> {
            match self {
                Self::$variant(v) => Some(*v),
                _ => None,
            }
        }
    };
}

impl DynamicValue {
    /// Struct value from `(name, value)` pairs.
    pub fn structure<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DynamicValue)>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn union(discriminator: i64, case: impl Into<String>, value: DynamicValue) -> Self {
        Self::Union(discriminator, case.into(), Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    exact_accessor!(as_bool, Bool, bool);
    exact_accessor!(as_u8, U8, u8);
    exact_accessor!(as_u16, U16, u16);
    exact_accessor!(as_u32, U32, u32);
    exact_accessor!(as_u64, U64, u64);
    exact_accessor!(as_i8, I8, i8);
    exact_accessor!(as_i16, I16, i16);
    exact_accessor!(as_i32, I32, i32);
    exact_accessor!(as_i64, I64, i64);
    exact_accessor!(as_f32, F32, f32);
    exact_accessor!(as_f64, F64, f64);
    exact_accessor!(as_char, Char, char);

    /// Any integer variant, widened. Enums yield their value.
    pub fn as_integer(&self) -> Option<i128> {
        Some(match self {
            Self::U8(v) => i128::from(*v),
            Self::U16(v) => i128::from(*v),
            Self::U32(v) => i128::from(*v),
            Self::U64(v) => i128::from(*v),
            Self::I8(v) => i128::from(*v),
            Self::I16(v) => i128::from(*v),
            Self::I32(v) => i128::from(*v),
            Self::I64(v) => i128::from(*v),
            Self::Enum(v, _) => i128::from(*v),
            _ => return None,
        })
    }

    /// Any numeric variant as `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            other => other.as_integer().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Elements of a sequence or array.
    pub fn as_sequence(&self) -> Option<&[DynamicValue]> {
        match self {
            Self::Sequence(v) | Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&PrimitiveBuffer> {
        match self {
            Self::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&HashMap<String, DynamicValue>> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn get_field(&self, name: &str) -> Option<&DynamicValue> {
        self.fields()?.get(name)
    }

    pub fn get_field_mut(&mut self, name: &str) -> Option<&mut DynamicValue> {
        match self {
            Self::Struct(fields) => fields.get_mut(name),
            _ => None,
        }
    }

    /// Set a struct member; returns false if this is not a struct.
    pub fn set_field(&mut self, name: impl Into<String>, value: DynamicValue) -> bool {
        match self {
            Self::Struct(fields) => {
                fields.insert(name.into(), value);
                true
            }
            _ => false,
        }
    }

    pub fn enum_variant(&self) -> Option<&str> {
        match self {
            Self::Enum(_, name) => Some(name),
            _ => None,
        }
    }

    pub fn union_discriminator(&self) -> Option<i64> {
        match self {
            Self::Union(disc, _, _) => Some(*disc),
            _ => None,
        }
    }

    pub fn union_case(&self) -> Option<&str> {
        match self {
            Self::Union(_, case, _) => Some(case),
            _ => None,
        }
    }

    pub fn union_value(&self) -> Option<&DynamicValue> {
        match self {
            Self::Union(_, _, val) => Some(val),
            _ => None,
        }
    }

    /// Variant name, used in type mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Struct(_) => "struct",
            Self::Sequence(_) => "sequence",
            Self::Array(_) => "array",
            Self::Buffer(_) => "buffer",
            Self::Enum(..) => "enum",
            Self::Union(..) => "union",
            Self::Null => "null",
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DynamicValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    PrimitiveBuffer => Buffer,
);

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_widened_accessors() {
        let v = DynamicValue::from(42u32);
        assert_eq!(v.as_u32(), Some(42));
        assert_eq!(v.as_i32(), None);
        assert_eq!(v.as_integer(), Some(42));
        assert_eq!(v.as_float(), Some(42.0));

        let v = DynamicValue::Enum(3, "BLUE".into());
        assert_eq!(v.as_integer(), Some(3));
        assert_eq!(v.enum_variant(), Some("BLUE"));
        assert_eq!(DynamicValue::from("x").as_integer(), None);
    }

    #[test]
    fn test_structure_helper() {
        let mut v = DynamicValue::structure([("x", 10i32.into()), ("y", 20i32.into())]);
        assert_eq!(v.get_field("x").and_then(DynamicValue::as_i32), Some(10));
        assert!(v.set_field("z", DynamicValue::Null));
        assert!(v.get_field("z").is_some_and(DynamicValue::is_null));
        assert!(!DynamicValue::Null.clone().set_field("a", 1u8.into()));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(DynamicValue::from(None::<i32>), DynamicValue::Null);
        assert_eq!(DynamicValue::from(Some(7i16)), DynamicValue::I16(7));
    }

    #[test]
    fn test_union_accessors() {
        let v = DynamicValue::union(1, "int_val", 42i32.into());
        assert_eq!(v.union_discriminator(), Some(1));
        assert_eq!(v.union_case(), Some("int_val"));
        assert_eq!(v.union_value().and_then(DynamicValue::as_i32), Some(42));
        assert_eq!(v.kind_name(), "union");
    }
}
