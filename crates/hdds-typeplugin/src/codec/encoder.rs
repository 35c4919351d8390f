// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native sample -> XCDR payload.

use super::cursor::WireWriter;
use super::parameter::{begin_parameter, end_parameter, write_emheader, write_list_end, LengthCode};
use crate::error::{Error, FieldFault, Result, WireError};
use crate::layout::{MemberLayout, NativeRepr, UnionLayout};
use crate::native::{NativeSample, Place};
use crate::plugin::TypePlugin;
use crate::types::{CharEncoding, DataRepresentation, Extensibility};

fn indexed(err: Error, index: usize) -> Error {
    err.in_field(&format!("[{}]", index))
}

fn wire_len(length: usize, bound: Option<usize>) -> Result<u32> {
    let limit = bound.unwrap_or(u32::MAX as usize);
    if length > limit {
        return Err(FieldFault::BoundExceeded {
            length,
            bound: limit,
        }
        .into());
    }
    u32::try_from(length).map_err(|_| {
        FieldFault::BoundExceeded {
            length,
            bound: u32::MAX as usize,
        }
        .into()
    })
}

/// Walks a plugin's layout and writes the members of one sample.
pub(crate) struct Encoder<'s> {
    sample: &'s NativeSample,
    w: WireWriter,
    representation: DataRepresentation,
    /// Key serialization: aggregates written as final, reduced to their keys.
    flatten: bool,
    depth: usize,
    max_depth: usize,
}

impl<'s> Encoder<'s> {
    pub fn new(
        sample: &'s NativeSample,
        w: WireWriter,
        representation: DataRepresentation,
        max_depth: usize,
    ) -> Self {
        Self {
            sample,
            w,
            representation,
            flatten: false,
            depth: 0,
            max_depth,
        }
    }

    pub fn finish(self) -> WireWriter {
        self.w
    }

    fn extensibility(&self, plugin: &TypePlugin) -> Extensibility {
        if self.flatten {
            Extensibility::Final
        } else {
            plugin.descriptor.extensibility()
        }
    }

    pub fn aggregate(&mut self, plugin: &TypePlugin, at: Place) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(WireError::NestingTooDeep {
                limit: self.max_depth,
            }
            .into());
        }
        let result = match &plugin.layout.union {
            Some(union) => self.union(plugin, union, at),
            None => self.structure(plugin, at),
        };
        self.depth -= 1;
        result
    }

    /// Key members in member-id order. Nested structs contribute their own
    /// key members, or all members when they declare none.
    pub fn key(&mut self, plugin: &TypePlugin, at: Place) -> Result<()> {
        self.flatten = true;
        for member in plugin.layout.key_members() {
            self.value(&member.repr, at.at(member.offset))
                .map_err(|e| e.in_field(&member.name))?;
        }
        Ok(())
    }

    fn delimited<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let dheader = self.w.reserve_u32();
        body(self)?;
        let len = self.w.position() - dheader - 4;
        self.w.patch_u32(dheader, wire_len(len, None)?);
        Ok(())
    }

    fn structure(&mut self, plugin: &TypePlugin, at: Place) -> Result<()> {
        if self.flatten {
            for member in plugin.layout.key_projection() {
                self.member_plain(member, at)
                    .map_err(|e| e.in_field(&member.name))?;
            }
            return Ok(());
        }
        let members = &plugin.layout.members;
        match (self.representation, self.extensibility(plugin)) {
            (_, Extensibility::Final) | (DataRepresentation::Xcdr1, Extensibility::Extensible) => {
                self.members_plain(members, at)
            }
            (DataRepresentation::Xcdr2, Extensibility::Extensible) => {
                self.delimited(|enc| enc.members_plain(members, at))
            }
            (DataRepresentation::Xcdr1, Extensibility::Mutable) => {
                for member in members {
                    self.parameter(member, at)
                        .map_err(|e| e.in_field(&member.name))?;
                }
                write_list_end(&mut self.w);
                Ok(())
            }
            (DataRepresentation::Xcdr2, Extensibility::Mutable) => self.delimited(|enc| {
                for member in members {
                    enc.emheader_member(member, at)
                        .map_err(|e| e.in_field(&member.name))?;
                }
                Ok(())
            }),
        }
    }

    fn members_plain(&mut self, members: &[MemberLayout], at: Place) -> Result<()> {
        for member in members {
            self.member_plain(member, at)
                .map_err(|e| e.in_field(&member.name))?;
        }
        Ok(())
    }

    fn member_plain(&mut self, member: &MemberLayout, at: Place) -> Result<()> {
        let slot = at.at(member.offset);
        let NativeRepr::Optional(inner) = &member.repr else {
            return self.value(&member.repr, slot);
        };
        let present = self.sample.read_pointer(slot)?;
        match self.representation {
            DataRepresentation::Xcdr2 => {
                self.w.write_u8(u8::from(present.is_some()));
                match present {
                    Some(block) => self.value(inner, block),
                    None => Ok(()),
                }
            }
            DataRepresentation::Xcdr1 => {
                let mark = begin_parameter(&mut self.w);
                if let Some(block) = present {
                    self.value(inner, block)?;
                }
                end_parameter(&mut self.w, mark, member.id, false, false)
            }
        }
    }

    /// Present value of a mutable member: the inner block of an optional or
    /// the member slot. `None` for an absent optional.
    fn mutable_target<'m>(
        &self,
        member: &'m MemberLayout,
        at: Place,
    ) -> Result<Option<(&'m NativeRepr, Place)>> {
        let slot = at.at(member.offset);
        match &member.repr {
            NativeRepr::Optional(inner) => Ok(self
                .sample
                .read_pointer(slot)?
                .map(|block| (&**inner, block))),
            repr => Ok(Some((repr, slot))),
        }
    }

    fn parameter(&mut self, member: &MemberLayout, at: Place) -> Result<()> {
        let Some((repr, place)) = self.mutable_target(member, at)? else {
            return Ok(());
        };
        let mark = begin_parameter(&mut self.w);
        self.value(repr, place)?;
        end_parameter(&mut self.w, mark, member.id, member.key, true)
    }

    fn emheader_member(&mut self, member: &MemberLayout, at: Place) -> Result<()> {
        let Some((repr, place)) = self.mutable_target(member, at)? else {
            return Ok(());
        };
        let lc = repr
            .scalar()
            .and_then(|s| LengthCode::for_scalar(s.size()))
            .unwrap_or(LengthCode::NextInt);
        match write_emheader(&mut self.w, member.id, member.key, lc) {
            Some(nextint) => {
                self.value(repr, place)?;
                let len = self.w.position() - nextint - 4;
                self.w.patch_u32(nextint, wire_len(len, None)?);
                Ok(())
            }
            None => self.value(repr, place),
        }
    }

    fn union(&mut self, plugin: &TypePlugin, union: &UnionLayout, at: Place) -> Result<()> {
        let body = |enc: &mut Self| -> Result<()> {
            let width = union.discriminator.size();
            let bytes = enc.sample.bytes(at, width)?;
            let label = union
                .discriminator
                .load_label(bytes)
                .map_err(|fault| Error::from(fault).in_field("discriminator"))?;
            enc.w.align(width);
            enc.w.write_native(bytes, width);
            if let Some(case) = union.case_for(label) {
                let member = &plugin.layout.members[case.member];
                enc.value(&member.repr, at.at(union.value_offset))
                    .map_err(|e| e.in_field(&member.name))?;
            }
            Ok(())
        };
        match (self.representation, self.extensibility(plugin)) {
            (DataRepresentation::Xcdr2, Extensibility::Extensible) => self.delimited(body),
            _ => body(self),
        }
    }

    fn value(&mut self, repr: &NativeRepr, place: Place) -> Result<()> {
        match repr {
            NativeRepr::Primitive(p) => {
                let width = p.size();
                self.w.align(p.alignment());
                self.w.write_native(self.sample.bytes(place, width)?, width);
                Ok(())
            }
            NativeRepr::Enum(_) => {
                self.w.align(4);
                self.w.write_native(self.sample.bytes(place, 4)?, 4);
                Ok(())
            }
            NativeRepr::StringRef { encoding, bound } => self.string(*encoding, *bound, place),
            NativeRepr::Aggregate(plugin) => self.aggregate(plugin.get()?, place),
            NativeRepr::Sequence { element, bound } => {
                let header = self.sample.read_header(place)?;
                let length = header.length as usize;
                let count = wire_len(length, *bound)?;
                let block = self.sample.sequence_buffer(&header, place)?;
                let body = |enc: &mut Self| -> Result<()> {
                    enc.w.align(4);
                    enc.w.write_u32(count);
                    enc.elements(element, block, length)
                };
                if self.delimits(element) {
                    self.delimited(body)
                } else {
                    body(self)
                }
            }
            NativeRepr::Array { element, count, .. } => {
                if self.delimits(element) {
                    self.delimited(|enc| enc.elements(element, Some(place), *count))
                } else {
                    self.elements(element, Some(place), *count)
                }
            }
            NativeRepr::Optional(_) => {
                Err(WireError::Malformed("optional outside a member".into()).into())
            }
        }
    }

    /// XCDR2 collections of non-primitive elements carry a DHEADER.
    fn delimits(&self, element: &NativeRepr) -> bool {
        self.representation == DataRepresentation::Xcdr2 && element.scalar().is_none()
    }

    fn elements(&mut self, element: &NativeRepr, block: Option<Place>, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let block = block.ok_or(FieldFault::CorruptSample { offset: 0, len: 0 })?;
        if let Some(scalar) = element.scalar() {
            let width = scalar.size();
            self.w.align(width);
            self.w
                .write_native(self.sample.bytes(block, count * width)?, width);
            return Ok(());
        }
        let width = element.size()?;
        for i in 0..count {
            self.value(element, block.at(i * width))
                .map_err(|e| indexed(e, i))?;
        }
        Ok(())
    }

    fn string(&mut self, encoding: CharEncoding, bound: Option<usize>, slot: Place) -> Result<()> {
        let stored: &[u8] = match self.sample.read_pointer(slot)? {
            Some(block) => self.sample.bytes(block, self.sample.block_len(block))?,
            None => &[],
        };
        self.w.align(4);
        match encoding {
            CharEncoding::Utf8 => {
                let end = stored.iter().position(|b| *b == 0).unwrap_or(stored.len());
                let text = &stored[..end];
                // Length on the wire counts the terminator.
                wire_len(text.len(), bound)?;
                self.w.write_u32(wire_len(text.len() + 1, None)?);
                self.w.write_bytes(text);
                self.w.write_u8(0);
            }
            CharEncoding::Utf16 => {
                let units = stored
                    .chunks_exact(2)
                    .position(|unit| unit == [0, 0])
                    .unwrap_or(stored.len() / 2);
                wire_len(units, bound)?;
                let text = &stored[..units * 2];
                match self.representation {
                    DataRepresentation::Xcdr2 => {
                        self.w.write_u32(wire_len(units * 2, None)?);
                        self.w.write_native(text, 2);
                    }
                    DataRepresentation::Xcdr1 => {
                        self.w.write_u32(wire_len(units + 1, None)?);
                        self.w.write_native(text, 2);
                        self.w.write_u16(0);
                    }
                }
            }
        }
        Ok(())
    }
}
