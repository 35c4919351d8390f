// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders producing validated [`TypeDescriptor`]s.
//!
//! ```ignore
//! use hdds_typeplugin::types::{annotations::*, PrimitiveKind as P, StructBuilder, IdlType};
//!
//! let point = StructBuilder::new("Point")
//!     .field("x", P::I32)
//!     .field("y", P::I32)
//!     .build()?;
//! let line = StructBuilder::new("Line")
//!     .field_with("points", IdlType::sequence(&point), [bound(8)])
//!     .build()?;
//! ```

use super::annotations::{resolve_member, Annotation, IdlType, ResolvedMember, TypeAnnotation};
use super::{
    AllowedRepresentations, ElementKind, Enumerator, Extensibility, MemberDescriptor,
    TypeDescriptor, TypeIdentity, TypeKind, UnionCase, UnionDescriptor,
};
use crate::config::{self, MAX_MEMBER_ID};
use crate::error::{DefinitionFault, TypeDefinitionError};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
struct PendingMember {
    name: String,
    ty: IdlType,
    annotations: Vec<Annotation>,
}

impl PendingMember {
    fn new(name: impl Into<String>, ty: impl Into<IdlType>, annotations: Vec<Annotation>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            annotations,
        }
    }
}

/// Extensibility and allowed representations from type annotations.
fn resolve_type_annotations(
    type_name: &str,
    annotations: &[TypeAnnotation],
) -> Result<(Option<Extensibility>, AllowedRepresentations), TypeDefinitionError> {
    let mut extensibility = None;
    let mut representations: Option<AllowedRepresentations> = None;
    for annotation in annotations {
        let kind = match annotation {
            TypeAnnotation::Final => Extensibility::Final,
            TypeAnnotation::Extensible => Extensibility::Extensible,
            TypeAnnotation::Mutable => Extensibility::Mutable,
            TypeAnnotation::AllowedDataRepresentation { xcdr1, xcdr2 } => {
                let allowed = AllowedRepresentations {
                    xcdr1: *xcdr1,
                    xcdr2: *xcdr2,
                };
                if representations.replace(allowed).is_some() {
                    return Err(TypeDefinitionError::new(
                        type_name,
                        DefinitionFault::ConflictingAnnotations(
                            "allowed_data_representation given more than once",
                        ),
                    ));
                }
                continue;
            }
        };
        if extensibility.replace(kind).is_some_and(|previous| previous != kind) {
            return Err(TypeDefinitionError::new(
                type_name,
                DefinitionFault::ConflictingAnnotations("more than one extensibility kind"),
            ));
        }
    }
    let representations = representations.unwrap_or_default();
    if representations.is_empty() {
        return Err(TypeDefinitionError::new(
            type_name,
            DefinitionFault::NoDataRepresentation,
        ));
    }
    Ok((extensibility, representations))
}

/// Assigns member ids: explicit ids are honoured, others continue after the
/// last id handed out.
struct IdAllocator {
    next: u32,
    used: HashSet<u32>,
    names: HashSet<String>,
}

impl IdAllocator {
    fn new(first: u32) -> Self {
        Self {
            next: first,
            used: HashSet::new(),
            names: HashSet::new(),
        }
    }

    fn seed(&mut self, member: &MemberDescriptor) {
        self.used.insert(member.id);
        self.names.insert(member.name.clone());
        self.next = self.next.max(member.id.saturating_add(1));
    }

    fn assign(
        &mut self,
        type_name: &str,
        name: &str,
        explicit: Option<u32>,
    ) -> Result<u32, TypeDefinitionError> {
        let err = |fault| TypeDefinitionError::for_member(type_name, name, fault);
        if !self.names.insert(name.to_string()) {
            return Err(err(DefinitionFault::DuplicateMember));
        }
        let id = explicit.unwrap_or(self.next);
        if id > MAX_MEMBER_ID {
            return Err(err(DefinitionFault::MemberIdOutOfRange(id)));
        }
        if !self.used.insert(id) {
            return Err(err(DefinitionFault::DuplicateMemberId(id)));
        }
        self.next = id.saturating_add(1);
        Ok(id)
    }
}

fn member_from(resolved: ResolvedMember, name: String, id: u32) -> MemberDescriptor {
    MemberDescriptor {
        name,
        element: resolved.element,
        id,
        key: resolved.key,
        optional: resolved.optional,
        buffer: resolved.buffer,
    }
}

// ============================================================================
// Struct
// ============================================================================

/// Builder for struct types, optionally deriving from a parent struct.
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    parent: Option<Arc<TypeDescriptor>>,
    members: Vec<PendingMember>,
    annotations: Vec<TypeAnnotation>,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            members: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Inherit from `parent`; its members come first.
    pub fn parent(mut self, parent: &Arc<TypeDescriptor>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Add an unannotated member.
    pub fn field(self, name: impl Into<String>, ty: impl Into<IdlType>) -> Self {
        self.field_with(name, ty, Vec::new())
    }

    /// Add a member with annotations.
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        ty: impl Into<IdlType>,
        annotations: impl Into<Vec<Annotation>>,
    ) -> Self {
        self.members
            .push(PendingMember::new(name, ty, annotations.into()));
        self
    }

    pub fn key_field(self, name: impl Into<String>, ty: impl Into<IdlType>) -> Self {
        self.field_with(name, ty, [Annotation::Key])
    }

    pub fn optional_field(self, name: impl Into<String>, ty: impl Into<IdlType>) -> Self {
        self.field_with(name, ty, [Annotation::Optional])
    }

    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, IdlType::String)
    }

    pub fn bounded_string_field(self, name: impl Into<String>, bound: u32) -> Self {
        self.field_with(name, IdlType::String, [Annotation::Bound(bound)])
    }

    pub fn sequence_field(self, name: impl Into<String>, element: impl Into<IdlType>) -> Self {
        self.field(name, IdlType::sequence(element))
    }

    pub fn bounded_sequence_field(
        self,
        name: impl Into<String>,
        element: impl Into<IdlType>,
        bound: u32,
    ) -> Self {
        self.field_with(name, IdlType::sequence(element), [Annotation::Bound(bound)])
    }

    pub fn array_field(
        self,
        name: impl Into<String>,
        element: impl Into<IdlType>,
        dims: impl Into<Vec<u32>>,
    ) -> Self {
        self.field_with(
            name,
            IdlType::sequence(element),
            [Annotation::Array(dims.into())],
        )
    }

    pub fn annotate(mut self, annotation: TypeAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn extensibility(self, kind: Extensibility) -> Self {
        self.annotate(match kind {
            Extensibility::Final => TypeAnnotation::Final,
            Extensibility::Extensible => TypeAnnotation::Extensible,
            Extensibility::Mutable => TypeAnnotation::Mutable,
        })
    }

    pub fn build(self) -> Result<Arc<TypeDescriptor>, TypeDefinitionError> {
        let (explicit, mut representations) =
            resolve_type_annotations(&self.name, &self.annotations)?;

        let mut members = Vec::new();
        let mut ids = IdAllocator::new(0);
        let extensibility = match &self.parent {
            Some(parent) => {
                if parent.kind != TypeKind::Struct {
                    return Err(TypeDefinitionError::new(
                        &self.name,
                        DefinitionFault::InvalidParent("parent must be a struct"),
                    ));
                }
                if explicit.is_some_and(|e| e != parent.extensibility) {
                    return Err(TypeDefinitionError::new(
                        &self.name,
                        DefinitionFault::InvalidParent("extensibility must match the parent"),
                    ));
                }
                representations = representations.intersect(parent.representations);
                if representations.is_empty() {
                    return Err(TypeDefinitionError::new(
                        &self.name,
                        DefinitionFault::NoDataRepresentation,
                    ));
                }
                for inherited in &parent.members {
                    ids.seed(inherited);
                    members.push(inherited.clone());
                }
                parent.extensibility
            }
            None => explicit.unwrap_or_else(|| config::current().default_extensibility),
        };

        for pending in self.members {
            let resolved =
                resolve_member(&self.name, &pending.name, &pending.ty, &pending.annotations)?;
            let id = ids.assign(&self.name, &pending.name, resolved.id)?;
            members.push(member_from(resolved, pending.name, id));
        }

        log::debug!(
            "[typeplugin] declared struct '{}' ({:?}, {} members)",
            self.name,
            extensibility,
            members.len()
        );
        Ok(Arc::new(TypeDescriptor {
            identity: TypeIdentity::next(),
            name: self.name,
            kind: TypeKind::Struct,
            extensibility,
            representations,
            members,
            parent: self.parent,
            union: None,
            enumerators: Vec::new(),
        }))
    }
}

// ============================================================================
// Union
// ============================================================================

#[derive(Debug)]
struct PendingCase {
    member: PendingMember,
    labels: Vec<i64>,
    is_default: bool,
}

/// Builder for discriminated unions.
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    discriminator: IdlType,
    cases: Vec<PendingCase>,
    annotations: Vec<TypeAnnotation>,
}

impl UnionBuilder {
    /// `discriminator` is an integer, boolean or char primitive, or an enum.
    pub fn new(name: impl Into<String>, discriminator: impl Into<IdlType>) -> Self {
        Self {
            name: name.into(),
            discriminator: discriminator.into(),
            cases: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn case(
        self,
        name: impl Into<String>,
        labels: impl Into<Vec<i64>>,
        ty: impl Into<IdlType>,
    ) -> Self {
        self.case_with(name, labels, ty, Vec::new())
    }

    pub fn case_with(
        mut self,
        name: impl Into<String>,
        labels: impl Into<Vec<i64>>,
        ty: impl Into<IdlType>,
        annotations: impl Into<Vec<Annotation>>,
    ) -> Self {
        self.cases.push(PendingCase {
            member: PendingMember::new(name, ty, annotations.into()),
            labels: labels.into(),
            is_default: false,
        });
        self
    }

    /// The case selected when no label matches. It may also carry labels.
    pub fn default_case(self, name: impl Into<String>, ty: impl Into<IdlType>) -> Self {
        self.default_case_with(name, Vec::new(), ty, Vec::new())
    }

    pub fn default_case_with(
        mut self,
        name: impl Into<String>,
        labels: impl Into<Vec<i64>>,
        ty: impl Into<IdlType>,
        annotations: impl Into<Vec<Annotation>>,
    ) -> Self {
        self.cases.push(PendingCase {
            member: PendingMember::new(name, ty, annotations.into()),
            labels: labels.into(),
            is_default: true,
        });
        self
    }

    pub fn annotate(mut self, annotation: TypeAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn extensibility(self, kind: Extensibility) -> Self {
        self.annotate(match kind {
            Extensibility::Final => TypeAnnotation::Final,
            Extensibility::Extensible => TypeAnnotation::Extensible,
            Extensibility::Mutable => TypeAnnotation::Mutable,
        })
    }

    fn invalid(&self, reason: impl Into<String>) -> TypeDefinitionError {
        TypeDefinitionError::new(&self.name, DefinitionFault::InvalidUnion(reason.into()))
    }

    /// Accepted label values for the discriminator, as a predicate.
    fn label_check(&self, discriminator: &ElementKind) -> Result<LabelCheck, TypeDefinitionError> {
        match discriminator {
            ElementKind::Primitive(p) if p.is_discriminator() => {
                let (min, max) = p.integer_range().unwrap_or((0, 0));
                Ok(LabelCheck::Range(min, max))
            }
            ElementKind::Type(reference) => {
                let desc = reference.resolve()?;
                if desc.kind != TypeKind::Enum {
                    return Err(self.invalid("discriminator type must be an enum"));
                }
                Ok(LabelCheck::Values(
                    desc.enumerators.iter().map(|e| i64::from(e.value)).collect(),
                ))
            }
            other => Err(self.invalid(format!(
                "discriminator cannot be a {}",
                other.category()
            ))),
        }
    }

    pub fn build(self) -> Result<Arc<TypeDescriptor>, TypeDefinitionError> {
        let (explicit, representations) = resolve_type_annotations(&self.name, &self.annotations)?;
        let extensibility =
            explicit.unwrap_or_else(|| config::current().default_extensibility);
        if extensibility == Extensibility::Mutable {
            return Err(self.invalid("mutable unions are not supported"));
        }
        if self.cases.is_empty() {
            return Err(self.invalid("a union needs at least one case"));
        }

        let discriminator =
            resolve_member(&self.name, "discriminator", &self.discriminator, &[])?.element;
        let check = self.label_check(&discriminator)?;

        let mut seen_labels = HashSet::new();
        let mut has_default = false;
        let mut ids = IdAllocator::new(1);
        let mut members = Vec::with_capacity(self.cases.len());
        let mut cases = Vec::with_capacity(self.cases.len());

        for (index, case) in self.cases.iter().enumerate() {
            if case.is_default {
                if has_default {
                    return Err(self.invalid("more than one default case"));
                }
                has_default = true;
            } else if case.labels.is_empty() {
                return Err(self.invalid(format!("case '{}' has no label", case.member.name)));
            }
            for label in &case.labels {
                if !check.accepts(*label) {
                    return Err(self.invalid(format!(
                        "label {} is not a valid discriminator value",
                        label
                    )));
                }
                if !seen_labels.insert(*label) {
                    return Err(self.invalid(format!("label {} used more than once", label)));
                }
            }

            let pending = &case.member;
            let resolved =
                resolve_member(&self.name, &pending.name, &pending.ty, &pending.annotations)?;
            if resolved.key || resolved.optional {
                return Err(TypeDefinitionError::for_member(
                    &self.name,
                    &pending.name,
                    DefinitionFault::MisplacedAnnotation(
                        "key and optional do not apply to union cases",
                    ),
                ));
            }
            let id = ids.assign(&self.name, &pending.name, resolved.id)?;
            members.push(member_from(resolved, pending.name.clone(), id));
            cases.push(UnionCase {
                member: index,
                labels: case.labels.clone(),
                is_default: case.is_default,
            });
        }

        log::debug!(
            "[typeplugin] declared union '{}' ({} cases)",
            self.name,
            cases.len()
        );
        Ok(Arc::new(TypeDescriptor {
            identity: TypeIdentity::next(),
            name: self.name,
            kind: TypeKind::Union,
            extensibility,
            representations,
            members,
            parent: None,
            union: Some(UnionDescriptor {
                discriminator,
                cases,
            }),
            enumerators: Vec::new(),
        }))
    }
}

enum LabelCheck {
    Range(i128, i128),
    Values(HashSet<i64>),
}

impl LabelCheck {
    fn accepts(&self, label: i64) -> bool {
        match self {
            Self::Range(min, max) => (*min..=*max).contains(&i128::from(label)),
            Self::Values(values) => values.contains(&label),
        }
    }
}

// ============================================================================
// Enum
// ============================================================================

/// Builder for enumerations. The first enumerator is the default value.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    enumerators: Vec<(String, Option<i32>)>,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enumerators: Vec::new(),
        }
    }

    /// Add an enumerator valued one past the previous one (0 first).
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.enumerators.push((name.into(), None));
        self
    }

    pub fn variant_value(mut self, name: impl Into<String>, value: i32) -> Self {
        self.enumerators.push((name.into(), Some(value)));
        self
    }

    pub fn build(self) -> Result<Arc<TypeDescriptor>, TypeDefinitionError> {
        let invalid = |reason: String| {
            TypeDefinitionError::new(&self.name, DefinitionFault::InvalidEnum(reason))
        };
        if self.enumerators.is_empty() {
            return Err(invalid("an enum needs at least one enumerator".into()));
        }

        let mut names = HashSet::new();
        let mut values = HashSet::new();
        let mut next: i64 = 0;
        let mut enumerators = Vec::with_capacity(self.enumerators.len());
        for (name, explicit) in &self.enumerators {
            let value = match explicit {
                Some(v) => *v,
                None => i32::try_from(next)
                    .map_err(|_| invalid(format!("value of '{}' overflows int32", name)))?,
            };
            if !names.insert(name.as_str()) {
                return Err(invalid(format!("duplicate enumerator '{}'", name)));
            }
            if !values.insert(value) {
                return Err(invalid(format!("duplicate enumerator value {}", value)));
            }
            next = i64::from(value) + 1;
            enumerators.push(Enumerator {
                name: name.clone(),
                value,
            });
        }

        Ok(Arc::new(TypeDescriptor {
            identity: TypeIdentity::next(),
            name: self.name,
            kind: TypeKind::Enum,
            extensibility: Extensibility::Final,
            representations: AllowedRepresentations::ALL,
            members: Vec::new(),
            parent: None,
            union: None,
            enumerators,
        }))
    }
}

// ============================================================================
// Alias
// ============================================================================

/// Builder for aliases (typedefs). Exactly one member is required.
#[derive(Debug)]
pub struct AliasBuilder {
    name: String,
    members: Vec<PendingMember>,
}

impl AliasBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Shorthand for an alias with a single `value` member.
    pub fn of(
        name: impl Into<String>,
        ty: impl Into<IdlType>,
        annotations: impl Into<Vec<Annotation>>,
    ) -> Self {
        Self::new(name).member_with("value", ty, annotations)
    }

    pub fn member(self, name: impl Into<String>, ty: impl Into<IdlType>) -> Self {
        self.member_with(name, ty, Vec::new())
    }

    pub fn member_with(
        mut self,
        name: impl Into<String>,
        ty: impl Into<IdlType>,
        annotations: impl Into<Vec<Annotation>>,
    ) -> Self {
        self.members
            .push(PendingMember::new(name, ty, annotations.into()));
        self
    }

    pub fn build(mut self) -> Result<Arc<TypeDescriptor>, TypeDefinitionError> {
        if self.members.len() != 1 {
            return Err(TypeDefinitionError::new(
                &self.name,
                DefinitionFault::AliasMemberCount(self.members.len()),
            ));
        }
        let pending = self.members.remove(0);
        let resolved =
            resolve_member(&self.name, &pending.name, &pending.ty, &pending.annotations)?;
        let err = |fault| TypeDefinitionError::for_member(&self.name, &pending.name, fault);
        if matches!(resolved.element, ElementKind::Primitive(_)) {
            return Err(err(DefinitionFault::AliasOfPrimitive));
        }
        if resolved.key || resolved.optional || resolved.id.is_some() {
            return Err(err(DefinitionFault::MisplacedAnnotation(
                "key, id and optional do not apply to an alias",
            )));
        }
        let member = member_from(resolved, pending.name.clone(), 0);

        Ok(Arc::new(TypeDescriptor {
            identity: TypeIdentity::next(),
            name: self.name,
            kind: TypeKind::Alias,
            extensibility: Extensibility::Final,
            representations: AllowedRepresentations::ALL,
            members: vec![member],
            parent: None,
            union: None,
            enumerators: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::annotations::{bound, id, key};
    use crate::types::PrimitiveKind as P;

    #[test]
    fn test_struct_auto_ids_continue_after_explicit() {
        let desc = StructBuilder::new("S")
            .field("a", P::I32)
            .field_with("b", P::I32, [id(10)])
            .field("c", P::I32)
            .build()
            .expect("build");
        let ids: Vec<u32> = desc.members().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![0, 10, 11]);
    }

    #[test]
    fn test_duplicate_member_and_id() {
        let err = StructBuilder::new("S")
            .field("a", P::I32)
            .field("a", P::I64)
            .build()
            .expect_err("duplicate name");
        assert_eq!(err.fault(), &DefinitionFault::DuplicateMember);

        let err = StructBuilder::new("S")
            .field_with("a", P::I32, [id(3)])
            .field_with("b", P::I32, [id(3)])
            .build()
            .expect_err("duplicate id");
        assert_eq!(err.fault(), &DefinitionFault::DuplicateMemberId(3));
    }

    #[test]
    fn test_derived_struct_inherits_members_and_ids() {
        let base = StructBuilder::new("Base")
            .key_field("id", P::U32)
            .field_with("name", IdlType::String, [bound(8)])
            .build()
            .expect("base");
        let derived = StructBuilder::new("Derived")
            .parent(&base)
            .field("extra", P::F64)
            .build()
            .expect("derived");
        assert_eq!(derived.inherited_count(), 2);
        assert_eq!(derived.members()[2].name(), "extra");
        assert_eq!(derived.members()[2].id(), 2);
        assert!(derived.members()[0].is_key());
        assert_eq!(derived.extensibility(), base.extensibility());
    }

    #[test]
    fn test_parent_extensibility_must_match() {
        let base = StructBuilder::new("Base")
            .extensibility(Extensibility::Final)
            .field("a", P::U8)
            .build()
            .expect("base");
        let err = StructBuilder::new("Derived")
            .parent(&base)
            .extensibility(Extensibility::Mutable)
            .build()
            .expect_err("mismatch");
        assert!(matches!(err.fault(), DefinitionFault::InvalidParent(_)));
    }

    #[test]
    fn test_conflicting_extensibility() {
        let err = StructBuilder::new("S")
            .annotate(TypeAnnotation::Final)
            .annotate(TypeAnnotation::Mutable)
            .build()
            .expect_err("conflict");
        assert!(matches!(
            err.fault(),
            DefinitionFault::ConflictingAnnotations(_)
        ));
        let err = StructBuilder::new("S")
            .annotate(TypeAnnotation::AllowedDataRepresentation {
                xcdr1: false,
                xcdr2: false,
            })
            .build()
            .expect_err("no representation");
        assert_eq!(err.fault(), &DefinitionFault::NoDataRepresentation);
    }

    #[test]
    fn test_union_validation() {
        let ok = UnionBuilder::new("U", P::I32)
            .case("a", [1, 2], P::I32)
            .case("b", [3], IdlType::String)
            .default_case("c", P::F64)
            .build()
            .expect("union");
        let u = ok.union().expect("union descriptor");
        assert_eq!(u.case_for(2).map(|c| c.member_index()), Some(0));
        assert_eq!(u.case_for(99).map(|c| c.member_index()), Some(2));

        let dup = UnionBuilder::new("U", P::I32)
            .case("a", [1], P::I32)
            .case("b", [1], P::I32)
            .build();
        assert!(matches!(
            dup.map_err(|e| e.fault().clone()),
            Err(DefinitionFault::InvalidUnion(_))
        ));

        let float_disc = UnionBuilder::new("U", P::F32).case("a", [1], P::I32).build();
        assert!(float_disc.is_err());

        let mutable = UnionBuilder::new("U", P::I16)
            .extensibility(Extensibility::Mutable)
            .case("a", [1], P::I32)
            .build();
        assert!(mutable.is_err());

        let out_of_range = UnionBuilder::new("U", P::U8).case("a", [300], P::I32).build();
        assert!(out_of_range.is_err());
    }

    #[test]
    fn test_union_with_enum_discriminator() {
        let color = EnumBuilder::new("Color")
            .variant("Red")
            .variant_value("Green", 5)
            .variant("Blue")
            .build()
            .expect("enum");
        assert_eq!(color.enumerators()[2].value, 6);

        let u = UnionBuilder::new("Paint", &color)
            .case("red", [0], P::U8)
            .case("green", [5], P::U16)
            .build()
            .expect("union");
        assert_eq!(u.members().len(), 2);

        let bad = UnionBuilder::new("Paint", &color).case("x", [1], P::U8).build();
        assert!(bad.is_err());
    }

    #[test]
    fn test_enum_validation() {
        assert!(EnumBuilder::new("E").build().is_err());
        assert!(EnumBuilder::new("E")
            .variant("A")
            .variant("A")
            .build()
            .is_err());
        assert!(EnumBuilder::new("E")
            .variant_value("A", 1)
            .variant_value("B", 1)
            .build()
            .is_err());
    }

    #[test]
    fn test_alias_rules() {
        let err = AliasBuilder::of("MyInt", P::I32, Vec::new())
            .build()
            .expect_err("alias of primitive");
        assert_eq!(err.fault(), &DefinitionFault::AliasOfPrimitive);

        let err = AliasBuilder::new("Empty").build().expect_err("no member");
        assert_eq!(err.fault(), &DefinitionFault::AliasMemberCount(0));

        let err = AliasBuilder::new("Two")
            .member("a", IdlType::String)
            .member("b", IdlType::String)
            .build()
            .expect_err("two members");
        assert_eq!(err.fault(), &DefinitionFault::AliasMemberCount(2));

        let err = AliasBuilder::of("K", IdlType::String, [key()])
            .build()
            .expect_err("key on alias");
        assert!(matches!(err.fault(), DefinitionFault::MisplacedAnnotation(_)));

        let names = AliasBuilder::of("Names", IdlType::sequence(IdlType::String), [bound(3)])
            .build()
            .expect("alias");
        assert_eq!(names.kind(), TypeKind::Alias);
        assert!(names.alias_target().is_some());
    }
}
