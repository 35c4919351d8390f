// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: the immutable result of a declaration.

use super::PrimitiveKind;
use crate::error::{DefinitionFault, TypeDefinitionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a declared type.
///
/// Two declarations with the same name are still distinct types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity(u64);

impl TypeIdentity {
    pub(crate) fn next() -> Self {
        Self(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Declared type category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Union,
    Enum,
    Alias,
}

/// XTypes extensibility kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extensibility {
    Final,
    #[serde(alias = "appendable")]
    Extensible,
    Mutable,
}

/// Wire data representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRepresentation {
    Xcdr1,
    Xcdr2,
}

impl DataRepresentation {
    /// Largest alignment applied on the wire.
    pub const fn max_alignment(self) -> usize {
        match self {
            Self::Xcdr1 => 8,
            Self::Xcdr2 => 4,
        }
    }
}

/// Set of representations a type may be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedRepresentations {
    pub xcdr1: bool,
    pub xcdr2: bool,
}

impl AllowedRepresentations {
    pub const ALL: Self = Self {
        xcdr1: true,
        xcdr2: true,
    };

    pub fn allows(self, representation: DataRepresentation) -> bool {
        match representation {
            DataRepresentation::Xcdr1 => self.xcdr1,
            DataRepresentation::Xcdr2 => self.xcdr2,
        }
    }

    pub fn intersect(self, other: Self) -> Self {
        Self {
            xcdr1: self.xcdr1 && other.xcdr1,
            xcdr2: self.xcdr2 && other.xcdr2,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.xcdr1 && !self.xcdr2
    }

    /// `preferred` when allowed, otherwise the other representation.
    pub fn select(self, preferred: DataRepresentation) -> Option<DataRepresentation> {
        if self.allows(preferred) {
            return Some(preferred);
        }
        [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2]
            .into_iter()
            .find(|r| self.allows(*r))
    }
}

impl Default for AllowedRepresentations {
    fn default() -> Self {
        Self::ALL
    }
}

/// Character encoding of a string member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharEncoding {
    Utf8,
    Utf16,
}

/// Collection or string bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bound {
    #[default]
    Unbounded,
    Max(u32),
}

impl Bound {
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Max(n) => Some(n as usize),
        }
    }
}

/// Resolved element kind of a member, after annotations were applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Primitive(PrimitiveKind),
    String {
        encoding: CharEncoding,
        bound: Bound,
    },
    Type(TypeRef),
    Sequence {
        element: Box<ElementKind>,
        bound: Bound,
    },
    Array {
        element: Box<ElementKind>,
        dims: Vec<u32>,
    },
}

impl ElementKind {
    /// Short human-readable category, for error messages.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::String { .. } => "string",
            Self::Type(_) => "type",
            Self::Sequence { .. } => "sequence",
            Self::Array { .. } => "array",
        }
    }
}

/// One member of a struct, union case or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub(crate) name: String,
    pub(crate) element: ElementKind,
    pub(crate) id: u32,
    pub(crate) key: bool,
    pub(crate) optional: bool,
    pub(crate) buffer: bool,
}

impl MemberDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &ElementKind {
        &self.element
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Primitive collection exposed as a contiguous buffer on the dynamic side.
    pub fn is_buffer(&self) -> bool {
        self.buffer
    }
}

/// A union case: the member it selects and the labels selecting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCase {
    pub(crate) member: usize,
    pub(crate) labels: Vec<i64>,
    pub(crate) is_default: bool,
}

impl UnionCase {
    /// Index into [`TypeDescriptor::members`].
    pub fn member_index(&self) -> usize {
        self.member
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionDescriptor {
    pub(crate) discriminator: ElementKind,
    pub(crate) cases: Vec<UnionCase>,
}

impl UnionDescriptor {
    pub fn discriminator(&self) -> &ElementKind {
        &self.discriminator
    }

    pub fn cases(&self) -> &[UnionCase] {
        &self.cases
    }

    /// Case selected by `discriminator`: an explicit label, else the default.
    pub fn case_for(&self, discriminator: i64) -> Option<&UnionCase> {
        self.cases
            .iter()
            .find(|c| c.labels.contains(&discriminator))
            .or_else(|| self.cases.iter().find(|c| c.is_default))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub value: i32,
}

/// A declared struct, union, enum or alias. Immutable once built.
#[derive(Debug)]
pub struct TypeDescriptor {
    pub(crate) identity: TypeIdentity,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) extensibility: Extensibility,
    pub(crate) representations: AllowedRepresentations,
    pub(crate) members: Vec<MemberDescriptor>,
    pub(crate) parent: Option<Arc<TypeDescriptor>>,
    pub(crate) union: Option<UnionDescriptor>,
    pub(crate) enumerators: Vec<Enumerator>,
}

impl TypeDescriptor {
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn extensibility(&self) -> Extensibility {
        self.extensibility
    }

    pub fn representations(&self) -> AllowedRepresentations {
        self.representations
    }

    /// All members; for a derived struct the parent's members come first.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn parent(&self) -> Option<&Arc<TypeDescriptor>> {
        self.parent.as_ref()
    }

    /// Number of leading members inherited from the parent.
    pub fn inherited_count(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.members.len())
    }

    pub fn union(&self) -> Option<&UnionDescriptor> {
        self.union.as_ref()
    }

    pub fn enumerators(&self) -> &[Enumerator] {
        &self.enumerators
    }

    /// The enumerator a default-initialised value holds (the first one).
    pub fn default_enumerator(&self) -> Option<&Enumerator> {
        self.enumerators.first()
    }

    /// The aliased member, for alias types.
    pub fn alias_target(&self) -> Option<&MemberDescriptor> {
        match self.kind {
            TypeKind::Alias => self.members.first(),
            _ => None,
        }
    }

    /// Structs and unions have a layout and programs; enums and aliases don't.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Union)
    }

    pub fn has_keys(&self) -> bool {
        self.members.iter().any(|m| m.key)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for TypeDescriptor {}

/// Placeholder for a type defined later; the only way to express recursion.
///
/// A defined forward declaration that is part of a cycle keeps its target
/// alive for the life of the process.
pub struct ForwardDecl {
    name: String,
    target: OnceLock<Arc<TypeDescriptor>>,
}

impl ForwardDecl {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            target: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the placeholder to its definition. Can only happen once.
    pub fn define(&self, target: &Arc<TypeDescriptor>) -> Result<(), TypeDefinitionError> {
        self.target
            .set(Arc::clone(target))
            .map_err(|_| TypeDefinitionError::new(&self.name, DefinitionFault::ForwardRedefinition))
    }

    pub fn resolved(&self) -> Option<&Arc<TypeDescriptor>> {
        self.target.get()
    }
}

impl fmt::Debug for ForwardDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardDecl")
            .field("name", &self.name)
            .field("defined", &self.target.get().is_some())
            .finish()
    }
}

/// Reference from a member to a declared type.
#[derive(Clone)]
pub enum TypeRef {
    Defined(Arc<TypeDescriptor>),
    Forward(Arc<ForwardDecl>),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Defined(desc) => desc.name(),
            Self::Forward(decl) => decl.name(),
        }
    }

    /// The referenced descriptor, or an error for an undefined forward.
    pub fn resolve(&self) -> Result<&Arc<TypeDescriptor>, TypeDefinitionError> {
        match self {
            Self::Defined(desc) => Ok(desc),
            Self::Forward(decl) => decl.resolved().ok_or_else(|| {
                TypeDefinitionError::new(
                    decl.name(),
                    DefinitionFault::UnresolvedForward(decl.name().to_string()),
                )
            }),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(desc) => write!(f, "Type({})", desc.name()),
            Self::Forward(decl) => write!(f, "Forward({})", decl.name()),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolve(), other.resolve()) {
            (Ok(a), Ok(b)) => a.identity == b.identity,
            _ => match (self, other) {
                (Self::Forward(a), Self::Forward(b)) => Arc::ptr_eq(a, b),
                _ => false,
            },
        }
    }
}

impl From<Arc<TypeDescriptor>> for TypeRef {
    fn from(value: Arc<TypeDescriptor>) -> Self {
        Self::Defined(value)
    }
}

impl From<&Arc<TypeDescriptor>> for TypeRef {
    fn from(value: &Arc<TypeDescriptor>) -> Self {
        Self::Defined(Arc::clone(value))
    }
}

impl From<&Arc<ForwardDecl>> for TypeRef {
    fn from(value: &Arc<ForwardDecl>) -> Self {
        Self::Forward(Arc::clone(value))
    }
}
