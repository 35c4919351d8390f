// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type declaration model.
//!
//! Types are declared through the builders in [`builder`], annotated with
//! the IDL-like [`annotations`], and end up as immutable, shareable
//! [`TypeDescriptor`]s. Recursive types go through a [`ForwardDecl`].

pub mod annotations;
pub mod builder;
mod descriptor;
mod primitive;

pub use annotations::{Annotation, IdlType, TypeAnnotation};
pub use builder::{AliasBuilder, EnumBuilder, StructBuilder, UnionBuilder};
pub use descriptor::{
    AllowedRepresentations, Bound, CharEncoding, DataRepresentation, ElementKind, Enumerator,
    Extensibility, ForwardDecl, MemberDescriptor, TypeDescriptor, TypeIdentity, TypeKind,
    TypeRef, UnionCase, UnionDescriptor,
};
pub use primitive::PrimitiveKind;
