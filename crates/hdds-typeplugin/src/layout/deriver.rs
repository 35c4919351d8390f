// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout derivation: C layout rules applied to a type descriptor.

use super::{align_up, CaseLayout, LayoutDescriptor, MemberLayout, NativeRepr, UnionLayout};
use crate::error::{DefinitionFault, Error, IllegalOperationError, Result, TypeDefinitionError};
use crate::native::{EnumRepr, ScalarKind};
use crate::plugin::PluginRef;
use crate::types::{ElementKind, MemberDescriptor, TypeDescriptor, TypeIdentity, TypeKind, TypeRef};
use std::collections::HashSet;
use std::sync::Arc;

/// Supplies plugins for nested struct and union types.
pub(crate) trait PluginResolver {
    /// `inline` is true when the nested type is stored by value, in which
    /// case reaching a type still under construction is a cycle.
    fn resolve(&mut self, target: &Arc<TypeDescriptor>, inline: bool) -> Result<PluginRef>;
}

struct Deriver<'a, R: ?Sized> {
    type_name: &'a str,
    resolver: &'a mut R,
    aliases: Vec<(TypeIdentity, String)>,
}

impl<R: PluginResolver + ?Sized> Deriver<'_, R> {
    fn fault(&self, member: &str, fault: DefinitionFault) -> Error {
        TypeDefinitionError::for_member(self.type_name, member, fault).into()
    }

    fn member_repr(&mut self, member: &MemberDescriptor) -> Result<NativeRepr> {
        let repr = self.element(member.name(), member.element(), !member.is_optional())?;
        Ok(if member.is_optional() {
            NativeRepr::Optional(Box::new(repr))
        } else {
            repr
        })
    }

    fn element(&mut self, member: &str, element: &ElementKind, inline: bool) -> Result<NativeRepr> {
        Ok(match element {
            ElementKind::Primitive(p) => NativeRepr::Primitive(*p),
            ElementKind::String { encoding, bound } => NativeRepr::StringRef {
                encoding: *encoding,
                bound: bound.limit(),
            },
            ElementKind::Type(reference) => self.named(member, reference, inline)?,
            ElementKind::Sequence { element, bound } => {
                if matches!(**element, ElementKind::Sequence { .. } | ElementKind::Array { .. }) {
                    return Err(self.fault(member, DefinitionFault::NestedSequence));
                }
                NativeRepr::Sequence {
                    element: Box::new(self.element(member, element, false)?),
                    bound: bound.limit(),
                }
            }
            ElementKind::Array { element, dims } => {
                if matches!(**element, ElementKind::Sequence { .. }) {
                    return Err(self.fault(member, DefinitionFault::NestedSequence));
                }
                let count = dims.iter().map(|d| *d as usize).product();
                NativeRepr::Array {
                    element: Box::new(self.element(member, element, inline)?),
                    dims: dims.clone(),
                    count,
                }
            }
        })
    }

    fn named(&mut self, member: &str, reference: &TypeRef, inline: bool) -> Result<NativeRepr> {
        let desc = reference.resolve().map_err(|_| {
            self.fault(
                member,
                DefinitionFault::UnresolvedForward(reference.name().to_string()),
            )
        })?;
        match desc.kind() {
            TypeKind::Enum => Ok(NativeRepr::Enum(Arc::new(EnumRepr::from_descriptor(desc)))),
            TypeKind::Struct | TypeKind::Union => {
                Ok(NativeRepr::Aggregate(self.resolver.resolve(desc, inline)?))
            }
            TypeKind::Alias => {
                if self.aliases.iter().any(|(id, _)| *id == desc.identity()) {
                    let mut path: Vec<&str> = self.aliases.iter().map(|(_, n)| n.as_str()).collect();
                    path.push(desc.name());
                    let path = path.join(" -> ");
                    return Err(self.fault(member, DefinitionFault::CyclicAggregation(path)));
                }
                let target = desc.alias_target().ok_or_else(|| {
                    self.fault(member, DefinitionFault::AliasMemberCount(0))
                })?;
                self.aliases.push((desc.identity(), desc.name().to_string()));
                let repr = self.element(member, target.element(), inline);
                self.aliases.pop();
                repr
            }
        }
    }
}

/// Derive the layout of a struct or union.
pub(crate) fn derive_layout(
    desc: &Arc<TypeDescriptor>,
    resolver: &mut dyn PluginResolver,
) -> Result<LayoutDescriptor> {
    match desc.kind() {
        TypeKind::Struct => derive_struct(desc, resolver),
        TypeKind::Union => derive_union(desc, resolver),
        TypeKind::Enum | TypeKind::Alias => Err(IllegalOperationError::new(
            desc.name(),
            "derive_layout",
            "only structs and unions have a layout",
        )
        .into()),
    }
}

/// Check that an alias expands to a valid representation, constructing the
/// nested types it references.
pub(crate) fn validate_alias(
    desc: &Arc<TypeDescriptor>,
    resolver: &mut dyn PluginResolver,
) -> Result<()> {
    let mut deriver = Deriver {
        type_name: desc.name(),
        resolver,
        aliases: vec![(desc.identity(), desc.name().to_string())],
    };
    if let Some(target) = desc.alias_target() {
        deriver.element(target.name(), target.element(), true)?;
    }
    Ok(())
}

fn build_template(size: usize, members: &[MemberLayout]) -> Result<Vec<u8>> {
    let mut template = vec![0u8; size];
    for member in members {
        let width = member.repr.size()?;
        member
            .repr
            .write_template(&mut template[member.offset..member.offset + width])?;
    }
    Ok(template)
}

fn derive_struct(
    desc: &Arc<TypeDescriptor>,
    resolver: &mut dyn PluginResolver,
) -> Result<LayoutDescriptor> {
    // The parent's layout is inlined at offset 0.
    let (mut members, mut offset, mut alignment) = match desc.parent() {
        Some(parent) => {
            let parent_ref = resolver.resolve(parent, true)?;
            let parent_layout = &parent_ref.get()?.layout;
            (
                parent_layout.members.clone(),
                parent_layout.size,
                parent_layout.alignment,
            )
        }
        None => (Vec::new(), 0, 1),
    };

    let mut deriver = Deriver {
        type_name: desc.name(),
        resolver,
        aliases: Vec::new(),
    };
    for member in &desc.members()[desc.inherited_count()..] {
        let repr = deriver.member_repr(member)?;
        let member_align = repr.alignment()?;
        offset = align_up(offset, member_align);
        let size = repr.size()?;
        members.push(MemberLayout {
            name: Arc::from(member.name()),
            id: member.id(),
            key: member.is_key(),
            buffer: member.is_buffer(),
            offset,
            repr,
        });
        offset += size;
        alignment = alignment.max(member_align);
    }

    let size = align_up(offset.max(1), alignment);
    let template = build_template(size, &members)?;
    log::trace!(
        "[typeplugin] layout '{}': size={} align={} members={}",
        desc.name(),
        size,
        alignment,
        members.len()
    );
    Ok(LayoutDescriptor {
        size,
        alignment,
        members,
        union: None,
        template: Arc::from(template),
    })
}

/// Discriminator value of a default-initialised union: the first label of
/// the first case, or a value no explicit label uses when the first case is
/// the default.
fn default_label(desc: &TypeDescriptor, discriminator: &ScalarKind) -> i64 {
    let Some(union) = desc.union() else {
        return 0;
    };
    if let Some(label) = union.cases().first().and_then(|c| c.labels().first()) {
        return *label;
    }
    let used: HashSet<i64> = union
        .cases()
        .iter()
        .flat_map(|c| c.labels().iter().copied())
        .collect();
    match discriminator {
        ScalarKind::Enum(repr) => repr
            .values()
            .map(i64::from)
            .find(|v| !used.contains(v))
            .unwrap_or(0),
        ScalarKind::Primitive(kind) => {
            let (_, max) = kind.integer_range().unwrap_or((0, 0));
            (0..=i64::try_from(max).unwrap_or(i64::MAX))
                .find(|v| !used.contains(v))
                .unwrap_or(0)
        }
    }
}

fn derive_union(
    desc: &Arc<TypeDescriptor>,
    resolver: &mut dyn PluginResolver,
) -> Result<LayoutDescriptor> {
    let mut deriver = Deriver {
        type_name: desc.name(),
        resolver,
        aliases: Vec::new(),
    };
    let union = desc.union().ok_or_else(|| {
        deriver.fault(
            "discriminator",
            DefinitionFault::InvalidUnion("missing union cases".into()),
        )
    })?;

    let discriminator = match deriver.element("discriminator", union.discriminator(), true)? {
        NativeRepr::Primitive(p) => ScalarKind::Primitive(p),
        NativeRepr::Enum(e) => ScalarKind::Enum(e),
        _ => {
            return Err(deriver.fault(
                "discriminator",
                DefinitionFault::InvalidUnion("discriminator must be a scalar".into()),
            ))
        }
    };
    let disc_size = discriminator.size();

    let mut reprs = Vec::with_capacity(desc.members().len());
    let mut value_align = 1;
    let mut value_size = 0;
    for member in desc.members() {
        let repr = deriver.member_repr(member)?;
        value_align = value_align.max(repr.alignment()?);
        value_size = value_size.max(repr.size()?);
        reprs.push(repr);
    }

    let value_offset = align_up(disc_size, value_align);
    let alignment = disc_size.max(value_align);
    let size = align_up(value_offset + value_size, alignment);

    let members: Vec<MemberLayout> = desc
        .members()
        .iter()
        .zip(reprs)
        .map(|(member, repr)| MemberLayout {
            name: Arc::from(member.name()),
            id: member.id(),
            key: false,
            buffer: member.is_buffer(),
            offset: value_offset,
            repr,
        })
        .collect();
    let cases: Vec<CaseLayout> = union
        .cases()
        .iter()
        .map(|c| CaseLayout {
            member: c.member_index(),
            labels: c.labels().to_vec(),
            is_default: c.is_default(),
        })
        .collect();

    let layout = UnionLayout {
        default_label: default_label(desc, &discriminator),
        discriminator,
        value_offset,
        cases,
    };

    let mut template = vec![0u8; size];
    layout
        .discriminator
        .store_label(layout.default_label, &mut template[..disc_size])
        .map_err(Error::from)?;
    if let Some(case) = layout.case_for(layout.default_label) {
        let repr = &members[case.member].repr;
        let width = repr.size()?;
        repr.write_template(&mut template[value_offset..value_offset + width])?;
    }

    Ok(LayoutDescriptor {
        size,
        alignment,
        members,
        union: Some(layout),
        template: Arc::from(template),
    })
}
