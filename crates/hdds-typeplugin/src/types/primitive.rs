// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive IDL types.

use serde::{Deserialize, Serialize};

/// Primitive type kinds.
///
/// `U8` doubles as IDL `octet`. `Char` is an 8-bit character, `WChar` a
/// UTF-16 code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    WChar,
}

impl PrimitiveKind {
    /// Size in bytes, both native and on the wire.
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 | Self::Char => 1,
            Self::U16 | Self::I16 | Self::WChar => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Native alignment (equal to the size for every primitive).
    pub const fn alignment(self) -> usize {
        self.size()
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Integers and floats; the kinds that can back a bulk buffer.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Kinds valid as a union discriminator.
    pub const fn is_discriminator(self) -> bool {
        self.is_integer() || matches!(self, Self::Bool | Self::Char | Self::WChar)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::Char => "char8",
            Self::WChar => "char16",
        }
    }

    /// Inclusive integer range, for range checks and label validation.
    pub(crate) const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::Bool => Some((0, 1)),
            Self::U8 | Self::Char => Some((0, u8::MAX as i128)),
            Self::U16 | Self::WChar => Some((0, u16::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::F32 | Self::F64 => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_alignment() {
        for kind in [
            PrimitiveKind::Bool,
            PrimitiveKind::U16,
            PrimitiveKind::I32,
            PrimitiveKind::F64,
            PrimitiveKind::WChar,
        ] {
            assert_eq!(kind.size(), kind.alignment());
        }
        assert_eq!(PrimitiveKind::U64.size(), 8);
        assert_eq!(PrimitiveKind::Char.size(), 1);
    }

    #[test]
    fn test_discriminator_kinds() {
        assert!(PrimitiveKind::I32.is_discriminator());
        assert!(PrimitiveKind::Bool.is_discriminator());
        assert!(!PrimitiveKind::F64.is_discriminator());
        assert_eq!(PrimitiveKind::I8.integer_range(), Some((-128, 127)));
    }
}
