// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Contiguous numeric buffers.
//!
//! A [`PrimitiveBuffer`] holds elements of one numeric kind packed in native
//! byte order, exactly as the native layout stores a primitive sequence, so
//! conversions in both directions are a single copy.

use super::DynamicValue;
use crate::types::PrimitiveKind;

/// Rust scalar types that map onto a numeric [`PrimitiveKind`].
pub trait BufferElement: Copy {
    const KIND: PrimitiveKind;
    fn write_ne(self, out: &mut [u8]);
    fn read_ne(bytes: &[u8]) -> Self;
}

macro_rules! impl_buffer_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl BufferElement for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                #[inline]
                fn write_ne(self, out: &mut [u8]) {
                    out[..std::mem::size_of::<$ty>()].copy_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn read_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_buffer_element!(
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
);

/// Packed numeric elements of a single kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveBuffer {
    kind: PrimitiveKind,
    bytes: Vec<u8>,
}

impl PrimitiveBuffer {
    pub fn from_slice<T: BufferElement>(values: &[T]) -> Self {
        let width = T::KIND.size();
        let mut bytes = vec![0u8; values.len() * width];
        for (chunk, value) in bytes.chunks_exact_mut(width).zip(values) {
            value.write_ne(chunk);
        }
        Self {
            kind: T::KIND,
            bytes,
        }
    }

    /// Wrap raw native-order bytes. `None` if the kind is not numeric or the
    /// length is not a whole number of elements.
    pub fn from_native_bytes(kind: PrimitiveKind, bytes: Vec<u8>) -> Option<Self> {
        (kind.is_numeric() && bytes.len() % kind.size() == 0).then_some(Self { kind, bytes })
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Typed copy of the elements, if `T` matches the buffer kind.
    pub fn to_vec<T: BufferElement>(&self) -> Option<Vec<T>> {
        if T::KIND != self.kind {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(self.kind.size())
                .map(T::read_ne)
                .collect(),
        )
    }

    /// Element at `index` as a dynamic value.
    pub fn get(&self, index: usize) -> Option<DynamicValue> {
        let width = self.kind.size();
        let chunk = self.bytes.get(index * width..(index + 1) * width)?;
        Some(match self.kind {
            PrimitiveKind::U8 => u8::read_ne(chunk).into(),
            PrimitiveKind::U16 => u16::read_ne(chunk).into(),
            PrimitiveKind::U32 => u32::read_ne(chunk).into(),
            PrimitiveKind::U64 => u64::read_ne(chunk).into(),
            PrimitiveKind::I8 => i8::read_ne(chunk).into(),
            PrimitiveKind::I16 => i16::read_ne(chunk).into(),
            PrimitiveKind::I32 => i32::read_ne(chunk).into(),
            PrimitiveKind::I64 => i64::read_ne(chunk).into(),
            PrimitiveKind::F32 => f32::read_ne(chunk).into(),
            PrimitiveKind::F64 => f64::read_ne(chunk).into(),
            PrimitiveKind::Bool | PrimitiveKind::Char | PrimitiveKind::WChar => return None,
        })
    }

    /// Elements as a list of dynamic values.
    pub fn to_values(&self) -> Vec<DynamicValue> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_round_trip() {
        let buf = PrimitiveBuffer::from_slice(&[1.5f64, -2.0, 3.25]);
        assert_eq!(buf.kind(), PrimitiveKind::F64);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.to_vec::<f64>(), Some(vec![1.5, -2.0, 3.25]));
        assert_eq!(buf.to_vec::<f32>(), None);
    }

    #[test]
    fn test_values_view() {
        let buf = PrimitiveBuffer::from_slice(&[7i16, -1]);
        assert_eq!(
            buf.to_values(),
            vec![DynamicValue::I16(7), DynamicValue::I16(-1)]
        );
        assert_eq!(buf.get(2), None);
    }

    #[test]
    fn test_raw_bytes_validation() {
        assert!(PrimitiveBuffer::from_native_bytes(PrimitiveKind::U32, vec![0; 6]).is_none());
        assert!(PrimitiveBuffer::from_native_bytes(PrimitiveKind::Bool, vec![1]).is_none());
        let buf = PrimitiveBuffer::from_native_bytes(PrimitiveKind::U16, vec![0; 4])
            .expect("valid buffer");
        assert_eq!(buf.len(), 2);
    }
}
