// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Worst-case serialized size.
//!
//! The walk mirrors the encoder over the layout with every bounded collection
//! at its bound. While everything before a position is fixed-size, padding
//! is computed exactly; after the first variable-size item each alignment
//! counts its worst-case padding instead.

use crate::config::{
    ENCAPSULATION_HEADER_LEN, MAX_SIZE_UNROLL_LIMIT, PID_SHORT_MAX_ID,
};
use crate::error::Result;
use crate::layout::{align_up, MemberLayout, NativeRepr, UnionLayout};
use crate::plugin::TypePlugin;
use crate::types::{CharEncoding, DataRepresentation, Extensibility, TypeIdentity};
use std::fmt;

/// Result of a size query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSize {
    Bounded(usize),
    /// Unbounded strings or sequences, or a recursive type.
    Unbounded,
}

impl WireSize {
    pub fn bounded(self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(n),
            Self::Unbounded => None,
        }
    }

    pub fn is_bounded(self) -> bool {
        matches!(self, Self::Bounded(_))
    }
}

impl fmt::Display for WireSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{} bytes", n),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Walker {
    offset: usize,
    exact: bool,
    max_align: usize,
}

impl Walker {
    fn align(&mut self, alignment: usize) {
        let alignment = alignment.min(self.max_align);
        if alignment <= 1 {
            return;
        }
        if self.exact {
            self.offset = align_up(self.offset, alignment);
        } else {
            self.offset = self.offset.saturating_add(alignment - 1);
        }
    }

    fn add(&mut self, bytes: usize) {
        self.offset = self.offset.saturating_add(bytes);
    }
}

struct Sizer {
    representation: DataRepresentation,
    walker: Walker,
    stack: Vec<TypeIdentity>,
    unbounded: bool,
    /// Sizing a serialized key rather than a sample.
    key_only: bool,
}

impl Sizer {
    fn aggregate(&mut self, plugin: &TypePlugin) -> Result<()> {
        let identity = plugin.descriptor.identity();
        if self.stack.contains(&identity) {
            self.unbounded = true;
            return Ok(());
        }
        self.stack.push(identity);
        let result = match &plugin.layout.union {
            Some(union) => self.union(plugin, union),
            None => self.structure(plugin),
        };
        self.stack.pop();
        result
    }

    fn dheader(&mut self) {
        self.walker.align(4);
        self.walker.add(4);
    }

    fn structure(&mut self, plugin: &TypePlugin) -> Result<()> {
        if self.key_only {
            for member in plugin.layout.key_projection() {
                self.member_plain(member)?;
            }
            return Ok(());
        }
        let members = &plugin.layout.members;
        match (self.representation, plugin.descriptor.extensibility()) {
            (_, Extensibility::Final) | (DataRepresentation::Xcdr1, Extensibility::Extensible) => {
                for member in members {
                    self.member_plain(member)?;
                }
            }
            (DataRepresentation::Xcdr2, Extensibility::Extensible) => {
                self.dheader();
                for member in members {
                    self.member_plain(member)?;
                }
            }
            (DataRepresentation::Xcdr1, Extensibility::Mutable) => {
                for member in members {
                    self.walker.align(4);
                    self.walker.add(4);
                    self.parameter_body(member.id, member_value(member), true)?;
                    if member.is_optional() {
                        self.walker.exact = false;
                    }
                }
                self.walker.align(4);
                self.walker.add(4);
            }
            (DataRepresentation::Xcdr2, Extensibility::Mutable) => {
                self.dheader();
                for member in members {
                    let repr = member_value(member);
                    self.walker.align(4);
                    self.walker.add(if repr.scalar().is_some() { 4 } else { 8 });
                    self.value(repr)?;
                    if member.is_optional() {
                        self.walker.exact = false;
                    }
                }
            }
        }
        Ok(())
    }

    /// Body of an XCDR1 parameter, plus the extended header when needed.
    fn parameter_body(&mut self, id: u32, repr: &NativeRepr, pad: bool) -> Result<()> {
        let before = self.walker.offset;
        self.value(repr)?;
        if pad {
            self.walker.align(4);
        }
        if id > PID_SHORT_MAX_ID || self.walker.offset - before > usize::from(u16::MAX) {
            self.walker.add(8);
        }
        Ok(())
    }

    fn member_plain(&mut self, member: &MemberLayout) -> Result<()> {
        let NativeRepr::Optional(inner) = &member.repr else {
            return self.value(&member.repr);
        };
        match self.representation {
            DataRepresentation::Xcdr2 => {
                self.walker.add(1);
                self.value(inner)?;
            }
            DataRepresentation::Xcdr1 => {
                self.walker.align(4);
                self.walker.add(4);
                self.parameter_body(member.id, inner, false)?;
            }
        }
        self.walker.exact = false;
        Ok(())
    }

    fn union(&mut self, plugin: &TypePlugin, union: &UnionLayout) -> Result<()> {
        if self.representation == DataRepresentation::Xcdr2
            && !self.key_only
            && plugin.descriptor.extensibility() == Extensibility::Extensible
        {
            self.dheader();
        }
        let width = union.discriminator.size();
        self.walker.align(width);
        self.walker.add(width);

        let start = self.walker;
        let mut ends = Vec::with_capacity(union.cases.len() + 1);
        if !union.cases.iter().any(|c| c.is_default) {
            ends.push(start);
        }
        for case in &union.cases {
            self.walker = start;
            self.value(&plugin.layout.members[case.member].repr)?;
            ends.push(self.walker);
        }
        let offset = ends.iter().map(|w| w.offset).max().unwrap_or(start.offset);
        let exact = ends.iter().all(|w| w.exact && w.offset == offset);
        self.walker = Walker {
            offset,
            exact,
            max_align: start.max_align,
        };
        Ok(())
    }

    fn delimits(&self, element: &NativeRepr) -> bool {
        self.representation == DataRepresentation::Xcdr2 && element.scalar().is_none()
    }

    fn value(&mut self, repr: &NativeRepr) -> Result<()> {
        if self.unbounded {
            return Ok(());
        }
        match repr {
            NativeRepr::Primitive(p) => {
                self.walker.align(p.alignment());
                self.walker.add(p.size());
            }
            NativeRepr::Enum(_) => {
                self.walker.align(4);
                self.walker.add(4);
            }
            NativeRepr::StringRef { encoding, bound } => {
                let Some(bound) = *bound else {
                    self.unbounded = true;
                    return Ok(());
                };
                self.walker.align(4);
                let body = match (encoding, self.representation) {
                    (CharEncoding::Utf8, _) => bound.saturating_add(1),
                    (CharEncoding::Utf16, DataRepresentation::Xcdr2) => bound.saturating_mul(2),
                    (CharEncoding::Utf16, DataRepresentation::Xcdr1) => {
                        bound.saturating_add(1).saturating_mul(2)
                    }
                };
                self.walker.add(4);
                self.walker.add(body);
                self.walker.exact = false;
            }
            NativeRepr::Aggregate(plugin) => self.aggregate(plugin.get()?)?,
            NativeRepr::Sequence { element, bound } => {
                let Some(bound) = *bound else {
                    self.unbounded = true;
                    return Ok(());
                };
                if self.delimits(element) {
                    self.dheader();
                }
                self.walker.align(4);
                self.walker.add(4);
                self.elements(element, bound)?;
                self.walker.exact = false;
            }
            NativeRepr::Array { element, count, .. } => {
                if self.delimits(element) {
                    self.dheader();
                }
                self.elements(element, *count)?;
            }
            NativeRepr::Optional(inner) => {
                self.value(inner)?;
                self.walker.exact = false;
            }
        }
        Ok(())
    }

    fn elements(&mut self, element: &NativeRepr, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        if let Some(scalar) = element.scalar() {
            let width = scalar.size();
            self.walker.align(width);
            self.walker.add(width.saturating_mul(count));
            return Ok(());
        }
        if count <= MAX_SIZE_UNROLL_LIMIT {
            for _ in 0..count {
                self.value(element)?;
                if self.unbounded {
                    break;
                }
            }
            return Ok(());
        }
        // Estimate: one element measured from an unknown position, times count.
        let outer = self.walker;
        self.walker = Walker {
            offset: 0,
            exact: false,
            max_align: outer.max_align,
        };
        self.value(element)?;
        let per_element = self.walker.offset;
        self.walker = Walker {
            offset: outer
                .offset
                .saturating_add(per_element.saturating_mul(count)),
            exact: false,
            max_align: outer.max_align,
        };
        Ok(())
    }
}

fn member_value(member: &MemberLayout) -> &NativeRepr {
    match &member.repr {
        NativeRepr::Optional(inner) => inner,
        repr => repr,
    }
}

fn sizer(representation: DataRepresentation, key_only: bool) -> Sizer {
    Sizer {
        representation,
        walker: Walker {
            offset: 0,
            exact: true,
            max_align: representation.max_alignment(),
        },
        stack: Vec::new(),
        unbounded: false,
        key_only,
    }
}

/// Worst-case size of the serialized key, as written by `encode_key`.
pub(crate) fn max_key_size(plugin: &TypePlugin) -> Result<WireSize> {
    let mut sizer = sizer(DataRepresentation::Xcdr2, true);
    sizer.stack.push(plugin.descriptor.identity());
    for member in plugin.layout.key_members() {
        sizer.value(&member.repr)?;
    }
    if sizer.unbounded || sizer.walker.offset == usize::MAX {
        return Ok(WireSize::Unbounded);
    }
    Ok(WireSize::Bounded(sizer.walker.offset))
}

/// Worst-case size of a serialized sample, header and trailing pad included.
pub(crate) fn max_size(plugin: &TypePlugin, representation: DataRepresentation) -> Result<WireSize> {
    let mut sizer = sizer(representation, false);
    sizer.aggregate(plugin)?;
    if sizer.unbounded || sizer.walker.offset == usize::MAX {
        return Ok(WireSize::Unbounded);
    }
    let payload = align_up(sizer.walker.offset, 4);
    Ok(WireSize::Bounded(ENCAPSULATION_HEADER_LEN + payload))
}
