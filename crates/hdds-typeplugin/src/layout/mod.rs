// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed native layouts.
//!
//! Every struct and union gets a [`LayoutDescriptor`]: member offsets and
//! [`NativeRepr`]s following C layout rules, plus a default-initialised
//! template block that seeds every new sample.

mod deriver;

pub(crate) use deriver::{derive_layout, validate_alias, PluginResolver};

use crate::error::{Error, Result};
use crate::native::{EnumRepr, ScalarKind, SequenceHeader, ENUM_SIZE, POINTER_SIZE};
use crate::plugin::PluginRef;
use crate::types::{CharEncoding, PrimitiveKind};
use std::sync::Arc;

/// Native representation of a member or element.
#[derive(Debug, Clone)]
pub enum NativeRepr {
    Primitive(PrimitiveKind),
    Enum(Arc<EnumRepr>),
    /// Pointer to a NUL-terminated block; null for the empty string.
    StringRef {
        encoding: CharEncoding,
        bound: Option<usize>,
    },
    /// Nested struct or union stored inline.
    Aggregate(PluginRef),
    /// Pointer to a block holding the inner representation; null when absent.
    Optional(Box<NativeRepr>),
    /// [`SequenceHeader`] plus an element block in the arena.
    Sequence {
        element: Box<NativeRepr>,
        bound: Option<usize>,
    },
    /// `count` elements stored inline.
    Array {
        element: Box<NativeRepr>,
        dims: Vec<u32>,
        count: usize,
    },
}

impl NativeRepr {
    pub fn size(&self) -> Result<usize> {
        Ok(match self {
            Self::Primitive(p) => p.size(),
            Self::Enum(_) => ENUM_SIZE,
            Self::StringRef { .. } | Self::Optional(_) => POINTER_SIZE,
            Self::Aggregate(plugin) => plugin.get()?.layout.size,
            Self::Sequence { .. } => SequenceHeader::SIZE,
            Self::Array { element, count, .. } => element.size()? * count,
        })
    }

    pub fn alignment(&self) -> Result<usize> {
        Ok(match self {
            Self::Primitive(p) => p.alignment(),
            Self::Enum(_) => ENUM_SIZE,
            Self::StringRef { .. } | Self::Optional(_) => POINTER_SIZE,
            Self::Aggregate(plugin) => plugin.get()?.layout.alignment,
            Self::Sequence { .. } => SequenceHeader::ALIGN,
            Self::Array { element, .. } => element.alignment()?,
        })
    }

    /// Primitive or enum view, for inline scalar copies.
    pub fn scalar(&self) -> Option<ScalarKind> {
        match self {
            Self::Primitive(p) => Some(ScalarKind::Primitive(*p)),
            Self::Enum(e) => Some(ScalarKind::Enum(Arc::clone(e))),
            _ => None,
        }
    }

    /// Default-initialised bytes of this representation into `out`.
    pub(crate) fn write_template(&self, out: &mut [u8]) -> Result<()> {
        match self {
            Self::Enum(e) => out[..ENUM_SIZE].copy_from_slice(&e.default_value().to_ne_bytes()),
            Self::Aggregate(plugin) => {
                let template = &plugin.get()?.layout.template;
                out[..template.len()].copy_from_slice(template);
            }
            Self::Array { element, count, .. } => {
                let width = element.size()?;
                for i in 0..*count {
                    element.write_template(&mut out[i * width..(i + 1) * width])?;
                }
            }
            Self::Primitive(_)
            | Self::StringRef { .. }
            | Self::Optional(_)
            | Self::Sequence { .. } => out.fill(0),
        }
        Ok(())
    }

    /// A fresh default-initialised block of this representation.
    pub(crate) fn template(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.size()?];
        self.write_template(&mut out)?;
        Ok(out)
    }
}

/// Placement of one member.
#[derive(Debug, Clone)]
pub struct MemberLayout {
    pub name: Arc<str>,
    pub id: u32,
    pub key: bool,
    pub buffer: bool,
    pub offset: usize,
    pub repr: NativeRepr,
}

impl MemberLayout {
    pub fn is_optional(&self) -> bool {
        matches!(self.repr, NativeRepr::Optional(_))
    }
}

/// Union arm selection data; arm members live in [`LayoutDescriptor::members`].
#[derive(Debug, Clone)]
pub struct CaseLayout {
    pub member: usize,
    pub labels: Vec<i64>,
    pub is_default: bool,
}

#[derive(Debug, Clone)]
pub struct UnionLayout {
    pub discriminator: ScalarKind,
    pub value_offset: usize,
    pub cases: Vec<CaseLayout>,
    /// Discriminator of a default-initialised union.
    pub default_label: i64,
}

impl UnionLayout {
    /// Arm selected by `label`: explicit label first, then the default arm.
    pub fn case_for(&self, label: i64) -> Option<&CaseLayout> {
        self.cases
            .iter()
            .find(|c| c.labels.contains(&label))
            .or_else(|| self.cases.iter().find(|c| c.is_default))
    }
}

/// Native layout of a struct or union.
#[derive(Debug, Clone)]
pub struct LayoutDescriptor {
    pub(crate) size: usize,
    pub(crate) alignment: usize,
    pub(crate) members: Vec<MemberLayout>,
    pub(crate) union: Option<UnionLayout>,
    pub(crate) template: Arc<[u8]>,
}

impl LayoutDescriptor {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn members(&self) -> &[MemberLayout] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberLayout> {
        self.members.iter().find(|m| &*m.name == name)
    }

    /// Key members in member-id order.
    pub fn key_members(&self) -> Vec<&MemberLayout> {
        let mut keys: Vec<&MemberLayout> = self.members.iter().filter(|m| m.key).collect();
        keys.sort_by_key(|m| m.id);
        keys
    }

    /// Members a nested key contributes: its own keys, or every member of a
    /// keyless type.
    pub(crate) fn key_projection(&self) -> Vec<&MemberLayout> {
        let keys = self.key_members();
        if keys.is_empty() {
            self.members.iter().collect()
        } else {
            keys
        }
    }

    pub fn union(&self) -> Option<&UnionLayout> {
        self.union.as_ref()
    }

    pub fn template(&self) -> &Arc<[u8]> {
        &self.template
    }
}

#[inline]
pub(crate) fn align_up(offset: usize, alignment: usize) -> usize {
    match alignment {
        0 | 1 => offset,
        a => offset.div_ceil(a) * a,
    }
}

pub(crate) fn checked_size(count: usize, width: usize, what: &str) -> Result<usize> {
    count.checked_mul(width).ok_or_else(|| {
        Error::from(crate::error::WireError::Malformed(format!(
            "{} size overflows",
            what
        )))
    })
}
