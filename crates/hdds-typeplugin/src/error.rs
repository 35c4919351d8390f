// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the type plugin.
//!
//! - [`TypeDefinitionError`]: a declaration is invalid (raised at build or
//!   type support construction, never at serialize time).
//! - [`FieldSerializationError`]: a per-call failure attributable to a field.
//! - [`IllegalOperationError`]: an operation that has no meaning for the
//!   type's kind (e.g. serializing a bare alias).
//! - [`WireError`]: a malformed buffer outside of any field (header,
//!   representation, nesting).

use crate::types::PrimitiveKind;
use std::fmt;

/// Reason a type declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionFault {
    DuplicateMember,
    DuplicateMemberId(u32),
    MemberIdOutOfRange(u32),
    InvalidBound,
    InvalidArrayDimensions,
    ConflictingAnnotations(&'static str),
    MisplacedAnnotation(&'static str),
    UnsupportedElement(&'static str),
    CyclicAggregation(String),
    OptionalArray,
    NestedSequence,
    AliasMemberCount(usize),
    AliasOfPrimitive,
    InvalidUnion(String),
    InvalidEnum(String),
    InvalidParent(&'static str),
    UnresolvedForward(String),
    ForwardRedefinition,
    NoDataRepresentation,
}

impl fmt::Display for DefinitionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateMember => write!(f, "duplicate member name"),
            Self::DuplicateMemberId(id) => write!(f, "duplicate member id {}", id),
            Self::MemberIdOutOfRange(id) => write!(f, "member id {} exceeds 0x0FFFFFFF", id),
            Self::InvalidBound => write!(f, "bound must be a positive integer"),
            Self::InvalidArrayDimensions => {
                write!(f, "array dimensions must be non-empty and each >= 1")
            }
            Self::ConflictingAnnotations(what) => write!(f, "conflicting annotations: {}", what),
            Self::MisplacedAnnotation(what) => write!(f, "misplaced annotation: {}", what),
            Self::UnsupportedElement(what) => write!(f, "unsupported element kind: {}", what),
            Self::CyclicAggregation(path) => write!(f, "cyclic aggregation: {}", path),
            Self::OptionalArray => write!(f, "arrays cannot be optional"),
            Self::NestedSequence => {
                write!(f, "sequence of sequence requires an alias or struct wrapper")
            }
            Self::AliasMemberCount(n) => {
                write!(f, "alias must have exactly one member, found {}", n)
            }
            Self::AliasOfPrimitive => write!(f, "alias of a primitive type is not supported"),
            Self::InvalidUnion(reason) => write!(f, "invalid union: {}", reason),
            Self::InvalidEnum(reason) => write!(f, "invalid enum: {}", reason),
            Self::InvalidParent(reason) => write!(f, "invalid parent type: {}", reason),
            Self::UnresolvedForward(name) => {
                write!(f, "forward declaration '{}' was never defined", name)
            }
            Self::ForwardRedefinition => write!(f, "forward declaration already defined"),
            Self::NoDataRepresentation => write!(f, "no allowed data representation"),
        }
    }
}

/// Construction-time failure of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinitionError {
    type_name: String,
    member: Option<String>,
    fault: DefinitionFault,
}

impl TypeDefinitionError {
    pub fn new(type_name: impl Into<String>, fault: DefinitionFault) -> Self {
        Self {
            type_name: type_name.into(),
            member: None,
            fault,
        }
    }

    pub fn for_member(
        type_name: impl Into<String>,
        member: impl Into<String>,
        fault: DefinitionFault,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            member: Some(member.into()),
            fault,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn fault(&self) -> &DefinitionFault {
        &self.fault
    }
}

impl fmt::Display for TypeDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(
                f,
                "invalid type '{}', member '{}': {}",
                self.type_name, member, self.fault
            ),
            None => write!(f, "invalid type '{}': {}", self.type_name, self.fault),
        }
    }
}

impl std::error::Error for TypeDefinitionError {}

/// Reason a single field failed to convert or encode.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFault {
    BoundExceeded { length: usize, bound: usize },
    TypeMismatch { expected: &'static str, found: String },
    OutOfRange { value: String, target: PrimitiveKind },
    InvalidEnumerator(i64),
    InvalidDiscriminator(i64),
    ArrayLength { expected: usize, found: usize },
    MissingField,
    Transcoding(String),
    Truncated { offset: usize },
    Malformed(String),
    CorruptSample { offset: usize, len: usize },
    Wire(WireError),
}

impl fmt::Display for FieldFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundExceeded { length, bound } => {
                write!(f, "length {} exceeds bound {}", length, bound)
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::OutOfRange { value, target } => {
                write!(f, "value {} out of range for {}", value, target.name())
            }
            Self::InvalidEnumerator(v) => write!(f, "{} is not a valid enumerator", v),
            Self::InvalidDiscriminator(v) => write!(f, "invalid discriminator {}", v),
            Self::ArrayLength { expected, found } => {
                write!(f, "array length mismatch: expected {}, found {}", expected, found)
            }
            Self::MissingField => write!(f, "missing field"),
            Self::Transcoding(reason) => write!(f, "transcoding failed: {}", reason),
            Self::Truncated { offset } => write!(f, "unexpected end of buffer at offset {}", offset),
            Self::Malformed(reason) => write!(f, "malformed data: {}", reason),
            Self::CorruptSample { offset, len } => write!(
                f,
                "native sample access out of range ({} bytes at offset {})",
                len, offset
            ),
            Self::Wire(err) => write!(f, "{}", err),
        }
    }
}

/// Per-field runtime failure. The path is outermost first; the last segment
/// is the field where the failure happened.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSerializationError {
    path: Vec<String>,
    fault: FieldFault,
}

impl FieldSerializationError {
    pub fn new(field: impl Into<String>, fault: FieldFault) -> Self {
        Self {
            path: vec![field.into()],
            fault,
        }
    }

    pub(crate) fn unnamed(fault: FieldFault) -> Self {
        Self {
            path: Vec::new(),
            fault,
        }
    }

    /// Name of the field where the failure happened.
    pub fn field(&self) -> &str {
        self.path
            .iter()
            .rev()
            .find(|segment| !segment.starts_with('['))
            .map_or("", String::as_str)
    }

    /// Dotted path from the top-level type down to the failing field.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    pub fn fault(&self) -> &FieldFault {
        &self.fault
    }

    pub(crate) fn within(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

impl fmt::Display for FieldSerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.path(), self.fault)
    }
}

impl std::error::Error for FieldSerializationError {}

/// Operation not meaningful for the type support's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalOperationError {
    type_name: String,
    operation: &'static str,
    reason: &'static str,
}

impl IllegalOperationError {
    pub fn new(type_name: impl Into<String>, operation: &'static str, reason: &'static str) -> Self {
        Self {
            type_name: type_name.into(),
            operation,
            reason,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Display for IllegalOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal operation '{}' on type '{}': {}",
            self.operation, self.type_name, self.reason
        )
    }
}

impl std::error::Error for IllegalOperationError {}

/// Buffer-level decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    HeaderTooShort { have: usize },
    UnknownEncapsulation(u16),
    RepresentationNotAllowed { type_name: String, encapsulation: u16 },
    ExtensibilityMismatch { type_name: String, encapsulation: u16 },
    Truncated { offset: usize },
    MustUnderstand { member_id: u32 },
    NestingTooDeep { limit: usize },
    Malformed(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooShort { have } => {
                write!(f, "encapsulation header needs 4 bytes, have {}", have)
            }
            Self::UnknownEncapsulation(id) => write!(f, "unknown encapsulation id {:#06x}", id),
            Self::RepresentationNotAllowed {
                type_name,
                encapsulation,
            } => write!(
                f,
                "encapsulation {:#06x} not allowed for type '{}'",
                encapsulation, type_name
            ),
            Self::ExtensibilityMismatch {
                type_name,
                encapsulation,
            } => write!(
                f,
                "encapsulation {:#06x} does not match extensibility of type '{}'",
                encapsulation, type_name
            ),
            Self::Truncated { offset } => write!(f, "unexpected end of buffer at offset {}", offset),
            Self::MustUnderstand { member_id } => {
                write!(f, "unknown must-understand member id {}", member_id)
            }
            Self::NestingTooDeep { limit } => write!(f, "nesting deeper than {}", limit),
            Self::Malformed(reason) => write!(f, "malformed buffer: {}", reason),
        }
    }
}

impl std::error::Error for WireError {}

/// Umbrella error for every public operation of the crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    TypeDefinition(TypeDefinitionError),
    FieldSerialization(FieldSerializationError),
    IllegalOperation(IllegalOperationError),
    Wire(WireError),
}

impl Error {
    /// Attribute this error to `field`, extending the path outward.
    ///
    /// Wire errors raised while a field was being processed become field
    /// errors; definition and illegal-operation errors pass through.
    pub(crate) fn in_field(self, field: &str) -> Self {
        match self {
            Self::FieldSerialization(err) => Self::FieldSerialization(err.within(field)),
            Self::Wire(err) => {
                Self::FieldSerialization(FieldSerializationError::new(field, FieldFault::Wire(err)))
            }
            other => other,
        }
    }

    pub fn as_field_error(&self) -> Option<&FieldSerializationError> {
        match self {
            Self::FieldSerialization(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_definition_error(&self) -> Option<&TypeDefinitionError> {
        match self {
            Self::TypeDefinition(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeDefinition(err) => write!(f, "{}", err),
            Self::FieldSerialization(err) => write!(f, "{}", err),
            Self::IllegalOperation(err) => write!(f, "{}", err),
            Self::Wire(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TypeDefinition(err) => Some(err),
            Self::FieldSerialization(err) => Some(err),
            Self::IllegalOperation(err) => Some(err),
            Self::Wire(err) => Some(err),
        }
    }
}

impl From<TypeDefinitionError> for Error {
    fn from(value: TypeDefinitionError) -> Self {
        Self::TypeDefinition(value)
    }
}

impl From<FieldSerializationError> for Error {
    fn from(value: FieldSerializationError) -> Self {
        Self::FieldSerialization(value)
    }
}

impl From<IllegalOperationError> for Error {
    fn from(value: IllegalOperationError) -> Self {
        Self::IllegalOperation(value)
    }
}

impl From<WireError> for Error {
    fn from(value: WireError) -> Self {
        Self::Wire(value)
    }
}

impl From<FieldFault> for Error {
    fn from(value: FieldFault) -> Self {
        Self::FieldSerialization(FieldSerializationError::unnamed(value))
    }
}

pub type Result<T> = core::result::Result<T, Error>;
