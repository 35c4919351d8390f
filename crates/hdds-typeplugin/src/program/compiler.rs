// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Program compiler: one pass over the layout, type-directed only.

use super::{
    ArrayElement, CopyOp, Direction, ElementOp, Indirection, ProgramBody, ProgramPair,
    SampleProgram, SequenceContainer, Step, UnionArm, UnionProgram,
};
use crate::error::{DefinitionFault, Result, TypeDefinitionError};
use crate::layout::{LayoutDescriptor, MemberLayout, NativeRepr};
use crate::types::{CharEncoding, TypeDescriptor};
use std::sync::Arc;

struct Compiler<'a> {
    type_name: &'a str,
    direction: Direction,
}

impl Compiler<'_> {
    fn unsupported(&self, member: &str, what: &'static str) -> TypeDefinitionError {
        TypeDefinitionError::for_member(
            self.type_name,
            member,
            DefinitionFault::UnsupportedElement(what),
        )
    }

    fn container(&self, buffer: bool) -> SequenceContainer {
        match (self.direction, buffer) {
            (Direction::ToNative, _) => SequenceContainer::Any,
            (Direction::ToDynamic, true) => SequenceContainer::Buffer,
            (Direction::ToDynamic, false) => SequenceContainer::List,
        }
    }

    fn element_op(&self, member: &str, repr: &NativeRepr) -> Result<ElementOp> {
        match repr {
            NativeRepr::StringRef { encoding, bound } => Ok(ElementOp::String {
                wide: *encoding == CharEncoding::Utf16,
                bound: *bound,
            }),
            NativeRepr::Aggregate(plugin) => Ok(ElementOp::Aggregate(plugin.clone())),
            NativeRepr::Sequence { .. } | NativeRepr::Array { .. } => Ok(ElementOp::Collection {
                repr: Box::new(repr.clone()),
                op: Box::new(self.op(member, false, repr)?),
            }),
            _ => Err(self
                .unsupported(member, "collection element must be a scalar, string or aggregate")
                .into()),
        }
    }

    fn op(&self, member: &str, buffer: bool, repr: &NativeRepr) -> Result<CopyOp> {
        if let Some(scalar) = repr.scalar() {
            return Ok(CopyOp::PrimitiveCopy(scalar));
        }
        Ok(match repr {
            NativeRepr::StringRef { encoding, bound } => CopyOp::StringConvert {
                wide: *encoding == CharEncoding::Utf16,
                bound: *bound,
            },
            NativeRepr::Aggregate(plugin) => CopyOp::AggregateRecurse(plugin.clone()),
            NativeRepr::Sequence { element, bound } => match element.scalar() {
                Some(scalar) => CopyOp::PrimitiveSequenceCopy {
                    element: scalar,
                    bound: *bound,
                    container: self.container(buffer),
                },
                None => CopyOp::AggregateSequenceCopy {
                    element: self.element_op(member, element)?,
                    bound: *bound,
                },
            },
            NativeRepr::Array { element, count, .. } => CopyOp::FixedArrayCopy {
                element: match element.scalar() {
                    Some(scalar) => ArrayElement::Scalar(scalar),
                    None => ArrayElement::Nested(self.element_op(member, element)?),
                },
                count: *count,
                container: self.container(buffer),
            },
            NativeRepr::Optional(_) => {
                return Err(self.unsupported(member, "nested optional").into())
            }
            NativeRepr::Primitive(_) | NativeRepr::Enum(_) => {
                return Err(self.unsupported(member, "scalar without scalar view").into())
            }
        })
    }

    fn step(&self, member: &MemberLayout) -> Result<Step> {
        let (indirection, repr) = match &member.repr {
            NativeRepr::Optional(inner) => (Indirection::Optional(inner.clone()), &**inner),
            repr => (Indirection::Inline, repr),
        };
        Ok(Step {
            field: Arc::clone(&member.name),
            offset: member.offset,
            indirection,
            op: self.op(&member.name, member.buffer, repr)?,
        })
    }

    fn program(&self, layout: &LayoutDescriptor) -> Result<SampleProgram> {
        let body = match &layout.union {
            None => ProgramBody::Struct(
                layout
                    .members
                    .iter()
                    .map(|m| self.step(m))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(union) => {
                let mut arms = Vec::with_capacity(union.cases.len());
                for case in &union.cases {
                    let member = &layout.members[case.member];
                    arms.push(UnionArm {
                        labels: case.labels.clone(),
                        is_default: case.is_default,
                        value: member.repr.clone(),
                        step: self.step(member)?,
                    });
                }
                ProgramBody::Union(UnionProgram {
                    discriminator: union.discriminator.clone(),
                    value_offset: union.value_offset,
                    arms,
                })
            }
        };
        Ok(SampleProgram {
            type_name: Arc::from(self.type_name),
            direction: self.direction,
            body,
        })
    }
}

/// Compile both programs of a struct or union from its derived layout.
pub(crate) fn compile_programs(
    desc: &TypeDescriptor,
    layout: &LayoutDescriptor,
) -> Result<ProgramPair> {
    let compile = |direction| {
        Compiler {
            type_name: desc.name(),
            direction,
        }
        .program(layout)
    };
    let pair = ProgramPair {
        to_native: compile(Direction::ToNative)?,
        to_dynamic: compile(Direction::ToDynamic)?,
    };
    log::trace!(
        "[typeplugin] compiled programs for '{}' ({} steps)",
        desc.name(),
        pair.to_native.steps().len()
    );
    Ok(pair)
}
