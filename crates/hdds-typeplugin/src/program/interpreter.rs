// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Program interpreter.
//!
//! Walks a [`SampleProgram`] against one dynamic value and one native
//! sample. Primitive copies are handled inline in the step loop; every other
//! instruction dispatches through [`CopyOp`]. Failures are attributed to the
//! step's field on the way out, so nested failures carry the full path.

use super::{
    ArrayElement, CopyOp, ElementOp, Indirection, ProgramBody, SampleProgram, SequenceContainer,
    Step, UnionProgram,
};
use crate::dynamic::{DynamicValue, PrimitiveBuffer};
use crate::error::{Error, FieldFault, Result};
use crate::native::{NativeSample, Place, ScalarKind, SequenceHeader};
use std::collections::HashMap;

fn mismatch(expected: &'static str, found: &DynamicValue) -> FieldFault {
    FieldFault::TypeMismatch {
        expected,
        found: found.kind_name().to_string(),
    }
}

fn indexed(err: Error, index: usize) -> Error {
    err.in_field(&format!("[{}]", index))
}

fn check_bound(length: usize, bound: Option<usize>) -> Result<()> {
    let limit = bound.unwrap_or(u32::MAX as usize);
    if length > limit {
        return Err(FieldFault::BoundExceeded {
            length,
            bound: limit,
        }
        .into());
    }
    Ok(())
}

/// Elements of a collection value; buffers of another kind are widened to a list.
enum Items<'v> {
    List(&'v [DynamicValue]),
    Owned(Vec<DynamicValue>),
}

impl Items<'_> {
    fn as_slice(&self) -> &[DynamicValue] {
        match self {
            Items::List(items) => items,
            Items::Owned(items) => items,
        }
    }
}

fn items_of<'v>(value: &'v DynamicValue, expected: &'static str) -> Result<Items<'v>> {
    match value {
        DynamicValue::Sequence(items) | DynamicValue::Array(items) => Ok(Items::List(items)),
        DynamicValue::Buffer(buffer) => Ok(Items::Owned(buffer.to_values())),
        other => Err(mismatch(expected, other).into()),
    }
}

/// Same-kind buffer for a single-copy transfer.
fn bulk_source<'v>(value: &'v DynamicValue, element: &ScalarKind) -> Option<&'v PrimitiveBuffer> {
    match (value, element) {
        (DynamicValue::Buffer(buffer), ScalarKind::Primitive(kind)) if buffer.kind() == *kind => {
            Some(buffer)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// dynamic -> native
// ---------------------------------------------------------------------------

/// Copy `value` into `dst` at `at` following a to-native program.
pub fn execute_to_native(
    program: &SampleProgram,
    value: &DynamicValue,
    dst: &mut NativeSample,
    at: Place,
) -> Result<()> {
    match &program.body {
        ProgramBody::Struct(steps) => {
            let fields = value.fields().ok_or_else(|| mismatch("struct", value))?;
            for step in steps {
                step_to_native(step, fields.get(&*step.field), dst, at)
                    .map_err(|e| e.in_field(&step.field))?;
            }
            Ok(())
        }
        ProgramBody::Union(union) => union_to_native(union, value, dst, at),
    }
}

fn union_to_native(
    union: &UnionProgram,
    value: &DynamicValue,
    dst: &mut NativeSample,
    at: Place,
) -> Result<()> {
    let (label, inner) = match value {
        DynamicValue::Union(label, _, inner) => (*label, inner.as_ref()),
        other => return Err(mismatch("union", other).into()),
    };
    let width = union.discriminator.size();
    union
        .discriminator
        .store_label(label, dst.bytes_mut(at, width)?)
        .map_err(|fault| Error::from(fault).in_field("discriminator"))?;

    let Some(arm) = union.arm_for(label) else {
        return Ok(());
    };
    let value_at = at.at(union.value_offset);
    let template = arm.value.template()?;
    dst.bytes_mut(value_at, template.len())?
        .copy_from_slice(&template);
    step_to_native(&arm.step, Some(inner), dst, at).map_err(|e| e.in_field(&arm.step.field))
}

fn step_to_native(
    step: &Step,
    value: Option<&DynamicValue>,
    dst: &mut NativeSample,
    base: Place,
) -> Result<()> {
    let slot = base.at(step.offset);
    match &step.indirection {
        Indirection::Inline => {
            let value = value.ok_or(FieldFault::MissingField)?;
            if let CopyOp::PrimitiveCopy(kind) = &step.op {
                kind.store(value, dst.bytes_mut(slot, kind.size())?)?;
                return Ok(());
            }
            step.op.apply_to_native(value, dst, slot)
        }
        Indirection::Optional(inner) => match value {
            None | Some(DynamicValue::Null) => {
                dst.write_pointer(slot, None)?;
                Ok(())
            }
            Some(value) => {
                let block = dst.allocate_from(&inner.template()?);
                dst.write_pointer(slot, Some(block))?;
                step.op.apply_to_native(value, dst, block)
            }
        },
    }
}

fn string_to_native(
    value: &DynamicValue,
    wide: bool,
    bound: Option<usize>,
    dst: &mut NativeSample,
    slot: Place,
) -> Result<()> {
    let text = value.as_str().ok_or_else(|| mismatch("string", value))?;
    if text.contains('\0') {
        return Err(FieldFault::Transcoding("embedded NUL character".into()).into());
    }
    let bytes = if wide {
        let units: Vec<u16> = text.encode_utf16().collect();
        check_bound(units.len(), bound)?;
        let mut bytes = Vec::with_capacity((units.len() + 1) * 2);
        for unit in units.iter().chain(std::iter::once(&0u16)) {
            bytes.extend_from_slice(&unit.to_ne_bytes());
        }
        bytes
    } else {
        check_bound(text.len(), bound)?;
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        bytes
    };
    // The empty string is a null pointer.
    let target = (!text.is_empty()).then(|| dst.allocate_from(&bytes));
    dst.write_pointer(slot, target)?;
    Ok(())
}

fn primitive_sequence_to_native(
    value: &DynamicValue,
    element: &ScalarKind,
    bound: Option<usize>,
    dst: &mut NativeSample,
    slot: Place,
) -> Result<()> {
    let width = element.size();
    let (length, block) = match bulk_source(value, element) {
        Some(buffer) => {
            check_bound(buffer.len(), bound)?;
            let block = (!buffer.is_empty()).then(|| dst.allocate_from(buffer.as_bytes()));
            (buffer.len(), block)
        }
        None => {
            let items = items_of(value, "sequence")?;
            let items = items.as_slice();
            check_bound(items.len(), bound)?;
            let block = (!items.is_empty()).then(|| dst.allocate(items.len() * width));
            if let Some(block) = block {
                for (i, item) in items.iter().enumerate() {
                    element
                        .store(item, dst.bytes_mut(block.at(i * width), width)?)
                        .map_err(|fault| indexed(fault.into(), i))?;
                }
            }
            (items.len(), block)
        }
    };
    write_sequence_header(dst, slot, length, bound, block)
}

fn write_sequence_header(
    dst: &mut NativeSample,
    slot: Place,
    length: usize,
    bound: Option<usize>,
    block: Option<Place>,
) -> Result<()> {
    // Lengths are bounded by u32::MAX before they get here.
    let header = SequenceHeader {
        maximum: bound.unwrap_or(length) as u32,
        length: length as u32,
        buffer: block.map_or(0, NativeSample::handle_of),
    };
    dst.write_header(slot, &header)?;
    Ok(())
}

impl ElementOp {
    fn apply_to_native(&self, value: &DynamicValue, dst: &mut NativeSample, at: Place) -> Result<()> {
        match self {
            Self::String { wide, bound } => string_to_native(value, *wide, *bound, dst, at),
            Self::Aggregate(plugin) => {
                execute_to_native(&plugin.get()?.programs.to_native, value, dst, at)
            }
            Self::Collection { op, .. } => op.apply_to_native(value, dst, at),
        }
    }

    fn apply_to_dynamic(&self, src: &NativeSample, at: Place) -> Result<DynamicValue> {
        match self {
            Self::String { wide, .. } => string_to_dynamic(src, at, *wide),
            Self::Aggregate(plugin) => {
                execute_to_dynamic(&plugin.get()?.programs.to_dynamic, src, at)
            }
            Self::Collection { op, .. } => op.apply_to_dynamic(src, at),
        }
    }
}

impl CopyOp {
    fn apply_to_native(&self, value: &DynamicValue, dst: &mut NativeSample, at: Place) -> Result<()> {
        match self {
            Self::PrimitiveCopy(kind) => {
                kind.store(value, dst.bytes_mut(at, kind.size())?)?;
                Ok(())
            }
            Self::StringConvert { wide, bound } => string_to_native(value, *wide, *bound, dst, at),
            Self::AggregateRecurse(plugin) => {
                execute_to_native(&plugin.get()?.programs.to_native, value, dst, at)
            }
            Self::PrimitiveSequenceCopy { element, bound, .. } => {
                primitive_sequence_to_native(value, element, *bound, dst, at)
            }
            Self::AggregateSequenceCopy { element, bound } => {
                let items = value
                    .as_sequence()
                    .ok_or_else(|| mismatch("sequence", value))?;
                check_bound(items.len(), *bound)?;
                let width = element.size()?;
                let block = if items.is_empty() {
                    None
                } else {
                    let template = element.template()?;
                    let block = dst.allocate(items.len() * width);
                    for i in 0..items.len() {
                        dst.bytes_mut(block.at(i * width), width)?
                            .copy_from_slice(&template);
                    }
                    Some(block)
                };
                if let Some(block) = block {
                    for (i, item) in items.iter().enumerate() {
                        element
                            .apply_to_native(item, dst, block.at(i * width))
                            .map_err(|e| indexed(e, i))?;
                    }
                }
                write_sequence_header(dst, at, items.len(), *bound, block)
            }
            Self::FixedArrayCopy { element, count, .. } => match element {
                ArrayElement::Scalar(scalar) => {
                    let width = scalar.size();
                    if let Some(buffer) = bulk_source(value, scalar) {
                        if buffer.len() != *count {
                            return Err(FieldFault::ArrayLength {
                                expected: *count,
                                found: buffer.len(),
                            }
                            .into());
                        }
                        dst.bytes_mut(at, count * width)?
                            .copy_from_slice(buffer.as_bytes());
                        return Ok(());
                    }
                    let items = items_of(value, "array")?;
                    let items = items.as_slice();
                    expect_count(items.len(), *count)?;
                    for (i, item) in items.iter().enumerate() {
                        scalar
                            .store(item, dst.bytes_mut(at.at(i * width), width)?)
                            .map_err(|fault| indexed(fault.into(), i))?;
                    }
                    Ok(())
                }
                ArrayElement::Nested(op) => {
                    let items = value.as_sequence().ok_or_else(|| mismatch("array", value))?;
                    expect_count(items.len(), *count)?;
                    let width = op.size()?;
                    for (i, item) in items.iter().enumerate() {
                        op.apply_to_native(item, dst, at.at(i * width))
                            .map_err(|e| indexed(e, i))?;
                    }
                    Ok(())
                }
            },
        }
    }

    fn apply_to_dynamic(&self, src: &NativeSample, at: Place) -> Result<DynamicValue> {
        match self {
            Self::PrimitiveCopy(kind) => Ok(kind.load(src.bytes(at, kind.size())?)?),
            Self::StringConvert { wide, .. } => string_to_dynamic(src, at, *wide),
            Self::AggregateRecurse(plugin) => {
                execute_to_dynamic(&plugin.get()?.programs.to_dynamic, src, at)
            }
            Self::PrimitiveSequenceCopy {
                element, container, ..
            } => {
                let (length, block) = sequence_block(src, at)?;
                let width = element.size();
                let bytes = match block {
                    Some(block) => src.bytes(block, length * width)?,
                    None => &[][..],
                };
                Ok(scalars_to_dynamic(element, bytes, *container, DynamicValue::Sequence)?)
            }
            Self::AggregateSequenceCopy { element, .. } => {
                let (length, block) = sequence_block(src, at)?;
                let mut items = Vec::with_capacity(length);
                if let Some(block) = block {
                    let width = element.size()?;
                    for i in 0..length {
                        items.push(
                            element
                                .apply_to_dynamic(src, block.at(i * width))
                                .map_err(|e| indexed(e, i))?,
                        );
                    }
                }
                Ok(DynamicValue::Sequence(items))
            }
            Self::FixedArrayCopy {
                element,
                count,
                container,
            } => match element {
                ArrayElement::Scalar(scalar) => {
                    let bytes = src.bytes(at, count * scalar.size())?;
                    Ok(scalars_to_dynamic(scalar, bytes, *container, DynamicValue::Array)?)
                }
                ArrayElement::Nested(op) => {
                    let width = op.size()?;
                    let mut items = Vec::with_capacity(*count);
                    for i in 0..*count {
                        items.push(
                            op.apply_to_dynamic(src, at.at(i * width))
                                .map_err(|e| indexed(e, i))?,
                        );
                    }
                    Ok(DynamicValue::Array(items))
                }
            },
        }
    }
}

fn expect_count(found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(FieldFault::ArrayLength { expected, found }.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// native -> dynamic
// ---------------------------------------------------------------------------

/// Build a dynamic value from the native data at `at` following a
/// to-dynamic program.
pub fn execute_to_dynamic(
    program: &SampleProgram,
    src: &NativeSample,
    at: Place,
) -> Result<DynamicValue> {
    match &program.body {
        ProgramBody::Struct(steps) => {
            let mut fields = HashMap::with_capacity(steps.len());
            for step in steps {
                let value = step_to_dynamic(step, src, at).map_err(|e| e.in_field(&step.field))?;
                fields.insert(step.field.to_string(), value);
            }
            Ok(DynamicValue::Struct(fields))
        }
        ProgramBody::Union(union) => {
            let width = union.discriminator.size();
            let label = union
                .discriminator
                .load_label(src.bytes(at, width)?)
                .map_err(|fault| Error::from(fault).in_field("discriminator"))?;
            match union.arm_for(label) {
                Some(arm) => {
                    let value = step_to_dynamic(&arm.step, src, at)
                        .map_err(|e| e.in_field(&arm.step.field))?;
                    Ok(DynamicValue::union(label, arm.step.field.as_ref(), value))
                }
                None => Ok(DynamicValue::union(label, "", DynamicValue::Null)),
            }
        }
    }
}

fn step_to_dynamic(step: &Step, src: &NativeSample, base: Place) -> Result<DynamicValue> {
    let slot = base.at(step.offset);
    match &step.indirection {
        Indirection::Inline => {
            if let CopyOp::PrimitiveCopy(kind) = &step.op {
                return Ok(kind.load(src.bytes(slot, kind.size())?)?);
            }
            step.op.apply_to_dynamic(src, slot)
        }
        Indirection::Optional(_) => match src.read_pointer(slot)? {
            None => Ok(DynamicValue::Null),
            Some(block) => step.op.apply_to_dynamic(src, block),
        },
    }
}

fn string_to_dynamic(src: &NativeSample, slot: Place, wide: bool) -> Result<DynamicValue> {
    let Some(block) = src.read_pointer(slot)? else {
        return Ok(DynamicValue::String(String::new()));
    };
    let bytes = src.bytes(block, src.block_len(block))?;
    let text = if wide {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .take_while(|unit| *unit != 0)
            .collect();
        String::from_utf16(&units).map_err(|e| FieldFault::Transcoding(e.to_string()))?
    } else {
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end])
            .map_err(|e| FieldFault::Transcoding(e.to_string()))?
            .to_owned()
    };
    Ok(DynamicValue::String(text))
}

fn sequence_block(src: &NativeSample, slot: Place) -> Result<(usize, Option<Place>)> {
    let header = src.read_header(slot)?;
    let length = header.length as usize;
    let block = src.sequence_buffer(&header, slot)?;
    if length > 0 && block.is_none() {
        return Err(FieldFault::CorruptSample {
            offset: slot.offset,
            len: SequenceHeader::SIZE,
        }
        .into());
    }
    Ok((length, block))
}

fn scalars_to_dynamic(
    element: &ScalarKind,
    bytes: &[u8],
    container: SequenceContainer,
    list: fn(Vec<DynamicValue>) -> DynamicValue,
) -> Result<DynamicValue> {
    if container == SequenceContainer::Buffer {
        if let ScalarKind::Primitive(kind) = element {
            if let Some(buffer) = PrimitiveBuffer::from_native_bytes(*kind, bytes.to_vec()) {
                return Ok(DynamicValue::Buffer(buffer));
            }
        }
    }
    let width = element.size();
    let mut items = Vec::with_capacity(bytes.len() / width.max(1));
    for (i, chunk) in bytes.chunks_exact(width).enumerate() {
        items.push(
            element
                .load(chunk)
                .map_err(|fault| indexed(fault.into(), i))?,
        );
    }
    Ok(list(items))
}
