// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XCDR payload -> native sample.
//!
//! The destination starts from the type's template, so members absent from
//! the payload (older writers, omitted optionals) keep their defaults.

use super::cursor::WireReader;
use super::parameter::{read_emheader, read_parameter, MemberHeader, Parameter};
use crate::error::{Error, FieldFault, Result, WireError};
use crate::layout::{checked_size, MemberLayout, NativeRepr, UnionLayout};
use crate::native::{NativeSample, Place, ScalarKind, SequenceHeader};
use crate::plugin::TypePlugin;
use crate::types::{CharEncoding, DataRepresentation, Extensibility, PrimitiveKind};

/// Ceiling on a decoded sequence of elements that occupy no payload bytes.
const MAX_EMPTY_ELEMENTS: usize = 1 << 20;

fn indexed(err: Error, index: usize) -> Error {
    err.in_field(&format!("[{}]", index))
}

fn check_bound(length: usize, bound: Option<usize>) -> Result<()> {
    match bound {
        Some(bound) if length > bound => Err(FieldFault::BoundExceeded { length, bound }.into()),
        _ => Ok(()),
    }
}

pub(crate) struct Decoder<'a, 's> {
    r: WireReader<'a>,
    sample: &'s mut NativeSample,
    representation: DataRepresentation,
    depth: usize,
    max_depth: usize,
}

impl<'a, 's> Decoder<'a, 's> {
    pub fn new(
        r: WireReader<'a>,
        sample: &'s mut NativeSample,
        representation: DataRepresentation,
        max_depth: usize,
    ) -> Self {
        Self {
            r,
            sample,
            representation,
            depth: 0,
            max_depth,
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

    /// Run `body` inside a DHEADER-delimited scope, then skip to its end.
    fn delimited<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self, usize) -> Result<()>,
    {
        self.r.align(4)?;
        let len = self.r.read_u32()? as usize;
        let end = self
            .r
            .position()
            .checked_add(len)
            .ok_or(WireError::Truncated {
                offset: self.r.position(),
            })?;
        let outer = self.r.enter(end)?;
        body(self, end)?;
        self.r.leave(outer);
        Ok(())
    }

    fn structure(&mut self, plugin: &TypePlugin, at: Place) -> Result<()> {
        let members = &plugin.layout.members;
        match (self.representation, plugin.descriptor.extensibility()) {
            (_, Extensibility::Final) | (DataRepresentation::Xcdr1, Extensibility::Extensible) => {
                for member in members {
                    self.member_plain(member, at)
                        .map_err(|e| e.in_field(&member.name))?;
                }
                Ok(())
            }
            (DataRepresentation::Xcdr2, Extensibility::Extensible) => {
                self.delimited(|dec, end| {
                    for member in members {
                        // A shorter body from an older writer: the rest keep defaults.
                        if dec.r.position() >= end {
                            break;
                        }
                        dec.member_plain(member, at)
                            .map_err(|e| e.in_field(&member.name))?;
                    }
                    Ok(())
                })
            }
            (DataRepresentation::Xcdr1, Extensibility::Mutable) => loop {
                match read_parameter(&mut self.r)? {
                    Parameter::ListEnd => return Ok(()),
                    Parameter::Ignore(len) => {
                        self.r.read_bytes(len)?;
                    }
                    Parameter::Member(header) => self.mutable_member(plugin, header, at)?,
                }
            },
            (DataRepresentation::Xcdr2, Extensibility::Mutable) => {
                self.delimited(|dec, end| {
                    while dec.r.position() < end {
                        let header = read_emheader(&mut dec.r)?;
                        dec.mutable_member(plugin, header, at)?;
                    }
                    Ok(())
                })
            }
        }
    }

    fn mutable_member(&mut self, plugin: &TypePlugin, header: MemberHeader, at: Place) -> Result<()> {
        let start = self.r.position();
        let end = start.checked_add(header.len).ok_or(WireError::Truncated { offset: start })?;
        match plugin.layout.members.iter().find(|m| m.id == header.id) {
            Some(member) => {
                let outer = self.r.enter(end)?;
                self.member_present(member, at)
                    .map_err(|e| e.in_field(&member.name))?;
                self.r.leave(outer);
                Ok(())
            }
            None if header.must_understand => Err(WireError::MustUnderstand {
                member_id: header.id,
            }
            .into()),
            None => {
                log::warn!(
                    "[codec] skipping unknown member id {} of '{}' ({} bytes)",
                    header.id,
                    plugin.name(),
                    header.len
                );
                self.r.seek(end)?;
                Ok(())
            }
        }
    }

    fn member_present(&mut self, member: &MemberLayout, at: Place) -> Result<()> {
        let slot = at.at(member.offset);
        match &member.repr {
            NativeRepr::Optional(inner) => self.optional_body(inner, slot),
            repr => self.value(repr, slot),
        }
    }

    fn member_plain(&mut self, member: &MemberLayout, at: Place) -> Result<()> {
        let slot = at.at(member.offset);
        let NativeRepr::Optional(inner) = &member.repr else {
            return self.value(&member.repr, slot);
        };
        match self.representation {
            DataRepresentation::Xcdr2 => match self.r.read_u8()? {
                0 => {
                    self.sample.write_pointer(slot, None)?;
                    Ok(())
                }
                1 => self.optional_body(inner, slot),
                other => Err(FieldFault::Malformed(format!("presence flag {}", other)).into()),
            },
            DataRepresentation::Xcdr1 => match read_parameter(&mut self.r)? {
                Parameter::Member(header) if header.len == 0 => {
                    self.sample.write_pointer(slot, None)?;
                    Ok(())
                }
                Parameter::Member(header) => {
                    let start = self.r.position();
                    let end = start
                        .checked_add(header.len)
                        .ok_or(WireError::Truncated { offset: start })?;
                    let outer = self.r.enter(end)?;
                    self.optional_body(inner, slot)?;
                    self.r.leave(outer);
                    Ok(())
                }
                _ => Err(FieldFault::Malformed("expected an optional member header".into()).into()),
            },
        }
    }

    fn optional_body(&mut self, inner: &NativeRepr, slot: Place) -> Result<()> {
        let block = self.sample.allocate_from(&inner.template()?);
        self.sample.write_pointer(slot, Some(block))?;
        self.value(inner, block)
    }

    fn union(&mut self, plugin: &TypePlugin, union: &UnionLayout, at: Place) -> Result<()> {
        let body = |dec: &mut Self| -> Result<()> {
            let label = dec
                .discriminator(union, at)
                .map_err(|e| e.in_field("discriminator"))?;
            if let Some(case) = union.case_for(label) {
                let member = &plugin.layout.members[case.member];
                let value_at = at.at(union.value_offset);
                let template = member.repr.template()?;
                dec.sample
                    .bytes_mut(value_at, template.len())?
                    .copy_from_slice(&template);
                dec.value(&member.repr, value_at)
                    .map_err(|e| e.in_field(&member.name))?;
            }
            Ok(())
        };
        match (self.representation, plugin.descriptor.extensibility()) {
            (DataRepresentation::Xcdr2, Extensibility::Extensible) => {
                self.delimited(|dec, _| body(dec))
            }
            _ => body(self),
        }
    }

    fn discriminator(&mut self, union: &UnionLayout, at: Place) -> Result<i64> {
        self.scalar(&union.discriminator, at)?;
        let width = union.discriminator.size();
        Ok(union.discriminator.load_label(self.sample.bytes(at, width)?)?)
    }

    /// One primitive or enum, validated.
    fn scalar(&mut self, kind: &ScalarKind, place: Place) -> Result<()> {
        let width = kind.size();
        self.r.align(width)?;
        let out = self.sample.bytes_mut(place, width)?;
        self.r.read_native(out, width)?;
        normalize(kind, out)
    }

    fn value(&mut self, repr: &NativeRepr, place: Place) -> Result<()> {
        match repr {
            NativeRepr::Primitive(p) => self.scalar(&ScalarKind::Primitive(*p), place),
            NativeRepr::Enum(e) => self.scalar(&ScalarKind::Enum(e.clone()), place),
            NativeRepr::StringRef { encoding, bound } => self.string(*encoding, *bound, place),
            NativeRepr::Aggregate(plugin) => self.aggregate(plugin.get()?, place),
            NativeRepr::Sequence { element, bound } => {
                let body = |dec: &mut Self| -> Result<()> {
                    dec.r.align(4)?;
                    let length = dec.r.read_u32()? as usize;
                    check_bound(length, *bound)?;
                    let block = dec.allocate_elements(element, length)?;
                    dec.elements(element, block, length)?;
                    let header = SequenceHeader {
                        maximum: bound.unwrap_or(length) as u32,
                        length: length as u32,
                        buffer: block.map_or(0, NativeSample::handle_of),
                    };
                    dec.sample.write_header(place, &header)?;
                    Ok(())
                };
                if self.delimits(element) {
                    self.delimited(|dec, _| body(dec))
                } else {
                    body(self)
                }
            }
            NativeRepr::Array { element, count, .. } => {
                if self.delimits(element) {
                    self.delimited(|dec, _| dec.elements(element, Some(place), *count))
                } else {
                    self.elements(element, Some(place), *count)
                }
            }
            NativeRepr::Optional(_) => {
                Err(WireError::Malformed("optional outside a member".into()).into())
            }
        }
    }

    fn delimits(&self, element: &NativeRepr) -> bool {
        self.representation == DataRepresentation::Xcdr2 && element.scalar().is_none()
    }

    /// Fewest payload bytes one value of `repr` can occupy, padding aside.
    fn min_wire_size(&self, repr: &NativeRepr) -> Result<usize> {
        Ok(match repr {
            NativeRepr::Primitive(p) => p.size(),
            NativeRepr::Enum(_) | NativeRepr::StringRef { .. } | NativeRepr::Sequence { .. } => 4,
            NativeRepr::Optional(_) => 0,
            NativeRepr::Array { element, count, .. } => {
                if self.delimits(element) {
                    4
                } else {
                    self.min_wire_size(element)?.saturating_mul(*count)
                }
            }
            NativeRepr::Aggregate(plugin) => {
                let plugin = plugin.get()?;
                match (self.representation, plugin.descriptor.extensibility()) {
                    (_, Extensibility::Final)
                    | (DataRepresentation::Xcdr1, Extensibility::Extensible) => {
                        match &plugin.layout.union {
                            Some(union) => union.discriminator.size(),
                            None => {
                                let mut total = 0usize;
                                for member in &plugin.layout.members {
                                    total = total.saturating_add(self.min_wire_size(&member.repr)?);
                                }
                                total
                            }
                        }
                    }
                    // DHEADER, or the XCDR1 list terminator.
                    _ => 4,
                }
            }
        })
    }

    /// Element block for `length` elements, seeded with element defaults.
    fn allocate_elements(&mut self, element: &NativeRepr, length: usize) -> Result<Option<Place>> {
        if length == 0 {
            return Ok(None);
        }
        let min_wire = self.min_wire_size(element)?;
        if min_wire == 0 {
            if length > MAX_EMPTY_ELEMENTS {
                return Err(WireError::Malformed(format!(
                    "{} elements without wire content",
                    length
                ))
                .into());
            }
        } else if checked_size(length, min_wire, "sequence")? > self.r.remaining() {
            return Err(WireError::Truncated {
                offset: self.r.position(),
            }
            .into());
        }
        let width = element.size()?;
        let block = self.sample.allocate(checked_size(length, width, "sequence")?);
        if element.scalar().is_none() {
            let template = element.template()?;
            for i in 0..length {
                self.sample
                    .bytes_mut(block.at(i * width), width)?
                    .copy_from_slice(&template);
            }
        }
        Ok(Some(block))
    }

    fn elements(&mut self, element: &NativeRepr, block: Option<Place>, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let block = block.ok_or(FieldFault::CorruptSample { offset: 0, len: 0 })?;
        if let Some(scalar) = element.scalar() {
            let width = scalar.size();
            self.r.align(width)?;
            let out = self
                .sample
                .bytes_mut(block, checked_size(count, width, "array")?)?;
            self.r.read_native(out, width)?;
            for (i, chunk) in out.chunks_exact_mut(width).enumerate() {
                normalize(&scalar, chunk).map_err(|e| indexed(e, i))?;
            }
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
        self.r.align(4)?;
        let length = self.r.read_u32()? as usize;
        let stored = match encoding {
            CharEncoding::Utf8 => {
                let bytes = self.r.read_bytes(length)?;
                let text = match bytes.split_last() {
                    None => &[][..],
                    Some((&0, text)) => text,
                    Some(_) => {
                        return Err(FieldFault::Malformed("string is not NUL-terminated".into()).into())
                    }
                };
                if text.contains(&0) {
                    return Err(FieldFault::Malformed("embedded NUL in string".into()).into());
                }
                check_bound(text.len(), bound)?;
                let mut stored = Vec::with_capacity(text.len() + 1);
                stored.extend_from_slice(text);
                stored.push(0);
                stored
            }
            CharEncoding::Utf16 => {
                let units = match self.representation {
                    DataRepresentation::Xcdr2 if length % 2 != 0 => {
                        return Err(FieldFault::Malformed(format!(
                            "odd wide string length {}",
                            length
                        ))
                        .into())
                    }
                    DataRepresentation::Xcdr2 => length / 2,
                    DataRepresentation::Xcdr1 => length.saturating_sub(1),
                };
                check_bound(units, bound)?;
                let width = checked_size(units, 2, "wide string")?;
                if width > self.r.remaining() {
                    return Err(WireError::Truncated {
                        offset: self.r.position(),
                    }
                    .into());
                }
                let mut stored = vec![0u8; width + 2];
                self.r.read_native(&mut stored[..width], 2)?;
                if self.representation == DataRepresentation::Xcdr1
                    && length > 0
                    && self.r.read_u16()? != 0
                {
                    return Err(FieldFault::Malformed("wide string is not terminated".into()).into());
                }
                if stored[..width].chunks_exact(2).any(|unit| unit == [0, 0]) {
                    return Err(FieldFault::Malformed("embedded NUL in wide string".into()).into());
                }
                stored
            }
        };
        // A lone terminator is the empty string.
        let empty = stored.iter().all(|b| *b == 0);
        let target = (!empty).then(|| self.sample.allocate_from(&stored));
        self.sample.write_pointer(slot, target)?;
        Ok(())
    }
}

/// Canonicalise booleans and reject unknown enumerators.
fn normalize(kind: &ScalarKind, bytes: &mut [u8]) -> Result<()> {
    match kind {
        ScalarKind::Primitive(PrimitiveKind::Bool) => {
            bytes[0] = u8::from(bytes[0] != 0);
        }
        ScalarKind::Enum(repr) => {
            let value = i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            if repr.name_of(value).is_none() {
                return Err(FieldFault::InvalidEnumerator(i64::from(value)).into());
            }
        }
        ScalarKind::Primitive(_) => {}
    }
    Ok(())
}
