// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! IDL-like annotations and their resolution into an [`ElementKind`].
//!
//! A member is declared with a base [`IdlType`] plus a list of
//! [`Annotation`]s. Resolution validates the combination and yields the
//! element kind the rest of the crate works with:
//!
//! ```ignore
//! use hdds_typeplugin::types::{annotations::*, IdlType, PrimitiveKind};
//!
//! // sequence<string<16>, 4>
//! let ty = IdlType::sequence(IdlType::String);
//! let ann = vec![bound(4), element(vec![bound(16)])];
//!
//! // int32 values[2][3]
//! let ty = IdlType::sequence(PrimitiveKind::I32);
//! let ann = vec![array(vec![2, 3])];
//! ```

use super::{
    Bound, CharEncoding, ElementKind, ForwardDecl, PrimitiveKind, TypeDescriptor, TypeRef,
};
use crate::error::{DefinitionFault, TypeDefinitionError};
use std::sync::Arc;

/// Base type of a member before annotations are applied.
#[derive(Debug, Clone)]
pub enum IdlType {
    Primitive(PrimitiveKind),
    /// A string; UTF-8 unless annotated `utf16`.
    String,
    /// Struct, union, enum or alias, possibly forward-declared.
    Type(TypeRef),
    /// A sequence, or an array when annotated with `array(dims)`.
    Sequence(Box<IdlType>),
}

impl IdlType {
    pub fn sequence(element: impl Into<IdlType>) -> Self {
        Self::Sequence(Box::new(element.into()))
    }
}

impl From<PrimitiveKind> for IdlType {
    fn from(value: PrimitiveKind) -> Self {
        Self::Primitive(value)
    }
}

impl From<TypeRef> for IdlType {
    fn from(value: TypeRef) -> Self {
        Self::Type(value)
    }
}

impl From<&Arc<TypeDescriptor>> for IdlType {
    fn from(value: &Arc<TypeDescriptor>) -> Self {
        Self::Type(TypeRef::from(value))
    }
}

impl From<&Arc<ForwardDecl>> for IdlType {
    fn from(value: &Arc<ForwardDecl>) -> Self {
        Self::Type(TypeRef::from(value))
    }
}

/// Member annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Key,
    Id(u32),
    /// Maximum length of a string or sequence.
    Bound(u32),
    /// Turns a sequence declaration into a fixed array of these dimensions.
    Array(Vec<u32>),
    Utf8,
    Utf16,
    Optional,
    /// Expose a numeric primitive collection as a contiguous buffer.
    Buffer,
    /// Annotations applied to the element of a sequence or array.
    Element(Vec<Annotation>),
}

pub fn key() -> Annotation {
    Annotation::Key
}

pub fn id(value: u32) -> Annotation {
    Annotation::Id(value)
}

pub fn bound(value: u32) -> Annotation {
    Annotation::Bound(value)
}

pub fn array(dims: impl Into<Vec<u32>>) -> Annotation {
    Annotation::Array(dims.into())
}

pub fn utf8() -> Annotation {
    Annotation::Utf8
}

pub fn utf16() -> Annotation {
    Annotation::Utf16
}

pub fn optional() -> Annotation {
    Annotation::Optional
}

pub fn buffer() -> Annotation {
    Annotation::Buffer
}

pub fn element(annotations: impl Into<Vec<Annotation>>) -> Annotation {
    Annotation::Element(annotations.into())
}

/// Type-level annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeAnnotation {
    Final,
    /// Also known as appendable.
    Extensible,
    Mutable,
    AllowedDataRepresentation { xcdr1: bool, xcdr2: bool },
}

/// A member after annotation resolution.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedMember {
    pub element: ElementKind,
    pub key: bool,
    pub optional: bool,
    pub id: Option<u32>,
    pub buffer: bool,
}

#[derive(Debug, Default)]
struct AnnotationSet {
    key: bool,
    id: Option<u32>,
    bound: Option<u32>,
    dims: Option<Vec<u32>>,
    encoding: Option<CharEncoding>,
    optional: bool,
    buffer: bool,
    element: Option<Vec<Annotation>>,
}

struct Ctx<'a> {
    type_name: &'a str,
    member: &'a str,
}

impl Ctx<'_> {
    fn err(&self, fault: DefinitionFault) -> TypeDefinitionError {
        TypeDefinitionError::for_member(self.type_name, self.member, fault)
    }
}

const REPEATED: DefinitionFault =
    DefinitionFault::ConflictingAnnotations("annotation given more than once");

fn collect(ctx: &Ctx<'_>, annotations: &[Annotation]) -> Result<AnnotationSet, TypeDefinitionError> {
    let mut set = AnnotationSet::default();
    for annotation in annotations {
        match annotation {
            Annotation::Key => {
                if set.key {
                    return Err(ctx.err(REPEATED));
                }
                set.key = true;
            }
            Annotation::Id(value) => {
                if set.id.replace(*value).is_some() {
                    return Err(ctx.err(REPEATED));
                }
            }
            Annotation::Bound(value) => {
                if *value == 0 {
                    return Err(ctx.err(DefinitionFault::InvalidBound));
                }
                if set.bound.replace(*value).is_some() {
                    return Err(ctx.err(REPEATED));
                }
            }
            Annotation::Array(dims) => {
                let product = dims
                    .iter()
                    .try_fold(1u32, |acc, d| if *d == 0 { None } else { acc.checked_mul(*d) });
                if dims.is_empty() || product.is_none() {
                    return Err(ctx.err(DefinitionFault::InvalidArrayDimensions));
                }
                if set.dims.replace(dims.clone()).is_some() {
                    return Err(ctx.err(REPEATED));
                }
            }
            Annotation::Utf8 | Annotation::Utf16 => {
                let encoding = if *annotation == Annotation::Utf8 {
                    CharEncoding::Utf8
                } else {
                    CharEncoding::Utf16
                };
                if let Some(previous) = set.encoding.replace(encoding) {
                    return Err(ctx.err(if previous == encoding {
                        REPEATED
                    } else {
                        DefinitionFault::ConflictingAnnotations("utf8 and utf16")
                    }));
                }
            }
            Annotation::Optional => {
                if set.optional {
                    return Err(ctx.err(REPEATED));
                }
                set.optional = true;
            }
            Annotation::Buffer => {
                if set.buffer {
                    return Err(ctx.err(REPEATED));
                }
                set.buffer = true;
            }
            Annotation::Element(inner) => {
                if set.element.replace(inner.clone()).is_some() {
                    return Err(ctx.err(REPEATED));
                }
            }
        }
    }
    if set.bound.is_some() && set.dims.is_some() {
        return Err(ctx.err(DefinitionFault::ConflictingAnnotations(
            "bound and array on the same member",
        )));
    }
    Ok(set)
}

fn resolve_element(
    ctx: &Ctx<'_>,
    ty: &IdlType,
    set: &AnnotationSet,
) -> Result<ElementKind, TypeDefinitionError> {
    let misplaced = |what| Err(ctx.err(DefinitionFault::MisplacedAnnotation(what)));
    let is_sequence = matches!(ty, IdlType::Sequence(_));
    if set.dims.is_some() && !is_sequence {
        return misplaced("array applies to sequence declarations");
    }
    if set.element.is_some() && !is_sequence {
        return misplaced("element applies to sequences and arrays");
    }
    if set.encoding.is_some() && !matches!(ty, IdlType::String) {
        return misplaced("utf8/utf16 apply to strings (use element(...) for collections)");
    }
    if set.bound.is_some() && !matches!(ty, IdlType::String | IdlType::Sequence(_)) {
        return misplaced("bound applies to strings and sequences");
    }

    match ty {
        IdlType::Primitive(kind) => Ok(ElementKind::Primitive(*kind)),
        IdlType::String => Ok(ElementKind::String {
            encoding: set.encoding.unwrap_or(CharEncoding::Utf8),
            bound: set.bound.map_or(Bound::Unbounded, Bound::Max),
        }),
        IdlType::Type(reference) => Ok(ElementKind::Type(reference.clone())),
        IdlType::Sequence(inner) => {
            let element_set = collect(ctx, set.element.as_deref().unwrap_or(&[]))?;
            if element_set.key || element_set.id.is_some() || element_set.optional {
                return misplaced("key, id and optional apply to members, not elements");
            }
            if element_set.buffer {
                return misplaced("buffer applies to the member, not its elements");
            }
            let element = Box::new(resolve_element(ctx, inner, &element_set)?);
            Ok(match &set.dims {
                Some(dims) => ElementKind::Array {
                    element,
                    dims: dims.clone(),
                },
                None => ElementKind::Sequence {
                    element,
                    bound: set.bound.map_or(Bound::Unbounded, Bound::Max),
                },
            })
        }
    }
}

/// Apply `annotations` to `ty` for member `member` of type `type_name`.
pub(crate) fn resolve_member(
    type_name: &str,
    member: &str,
    ty: &IdlType,
    annotations: &[Annotation],
) -> Result<ResolvedMember, TypeDefinitionError> {
    let ctx = Ctx { type_name, member };
    let set = collect(&ctx, annotations)?;
    if set.key && set.optional {
        return Err(ctx.err(DefinitionFault::ConflictingAnnotations(
            "key members cannot be optional",
        )));
    }

    let element = resolve_element(&ctx, ty, &set)?;
    if set.optional && matches!(element, ElementKind::Array { .. }) {
        return Err(ctx.err(DefinitionFault::OptionalArray));
    }
    if set.buffer {
        let numeric = match &element {
            ElementKind::Sequence { element, .. } | ElementKind::Array { element, .. } => {
                matches!(**element, ElementKind::Primitive(p) if p.is_numeric())
            }
            _ => false,
        };
        if !numeric {
            return Err(ctx.err(DefinitionFault::MisplacedAnnotation(
                "buffer applies to collections of numeric primitives",
            )));
        }
    }

    Ok(ResolvedMember {
        element,
        key: set.key,
        optional: set.optional,
        id: set.id,
        buffer: set.buffer,
    })
}
