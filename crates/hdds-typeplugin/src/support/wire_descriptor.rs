// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializable type description handed to discovery.
//!
//! A [`WireTypeDescriptor`] carries the shape of a type and, flattened next
//! to it, every type it references. Two peers compare shapes through the
//! [`TypeHash`]: MD5 over the canonical JSON form, truncated to 14 bytes
//! like an XTypes equivalence hash.

use crate::types::{
    Bound, CharEncoding, DataRepresentation, ElementKind, Extensibility, PrimitiveKind,
    TypeDescriptor, TypeKind, TypeRef,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Element kind as it appears in a wire descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireElement {
    Primitive {
        primitive: PrimitiveKind,
    },
    String {
        wide: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bound: Option<u32>,
    },
    Type {
        name: String,
    },
    Sequence {
        element: Box<WireElement>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bound: Option<u32>,
    },
    Array {
        element: Box<WireElement>,
        dims: Vec<u32>,
    },
}

fn bound_of(bound: Bound) -> Option<u32> {
    match bound {
        Bound::Unbounded => None,
        Bound::Max(n) => Some(n),
    }
}

impl From<&ElementKind> for WireElement {
    fn from(element: &ElementKind) -> Self {
        match element {
            ElementKind::Primitive(p) => Self::Primitive { primitive: *p },
            ElementKind::String { encoding, bound } => Self::String {
                wide: *encoding == CharEncoding::Utf16,
                bound: bound_of(*bound),
            },
            ElementKind::Type(reference) => Self::Type {
                name: reference.name().to_string(),
            },
            ElementKind::Sequence { element, bound } => Self::Sequence {
                element: Box::new(Self::from(&**element)),
                bound: bound_of(*bound),
            },
            ElementKind::Array { element, dims } => Self::Array {
                element: Box::new(Self::from(&**element)),
                dims: dims.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMember {
    pub name: String,
    pub id: u32,
    pub element: WireElement,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub optional: bool,
    /// Union case labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<i64>,
    #[serde(default)]
    pub default_case: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnumerator {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    pub extensibility: Extensibility,
    pub representations: Vec<DataRepresentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Own members only; inherited ones live in the base's entry.
    #[serde(default)]
    pub members: Vec<WireMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<WireElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enumerators: Vec<WireEnumerator>,
    /// Every referenced type, flat, each with empty `dependencies`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<WireTypeDescriptor>,
}

impl WireTypeDescriptor {
    /// Describe `desc` and everything it references.
    pub fn from_descriptor(desc: &Arc<TypeDescriptor>) -> Self {
        let mut root = Self::shallow(desc);
        let mut seen = HashSet::from([desc.identity()]);
        let mut pending = references(desc);
        while let Some(next) = pending.pop() {
            if !seen.insert(next.identity()) {
                continue;
            }
            pending.extend(references(&next));
            root.dependencies.push(Self::shallow(&next));
        }
        root.dependencies.sort_by(|a, b| a.name.cmp(&b.name));
        root
    }

    fn shallow(desc: &TypeDescriptor) -> Self {
        let mut representations = Vec::with_capacity(2);
        for representation in [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2] {
            if desc.representations().allows(representation) {
                representations.push(representation);
            }
        }
        let own = &desc.members()[desc.inherited_count()..];
        let mut members: Vec<WireMember> = own
            .iter()
            .map(|m| WireMember {
                name: m.name().to_string(),
                id: m.id(),
                element: WireElement::from(m.element()),
                key: m.is_key(),
                optional: m.is_optional(),
                labels: Vec::new(),
                default_case: false,
            })
            .collect();
        if let Some(union) = desc.union() {
            for case in union.cases() {
                if let Some(member) = members.get_mut(case.member_index()) {
                    member.labels = case.labels().to_vec();
                    member.default_case = case.is_default();
                }
            }
        }
        Self {
            name: desc.name().to_string(),
            kind: desc.kind(),
            extensibility: desc.extensibility(),
            representations,
            base: desc.parent().map(|p| p.name().to_string()),
            members,
            discriminator: desc.union().map(|u| WireElement::from(u.discriminator())),
            enumerators: desc
                .enumerators()
                .iter()
                .map(|e| WireEnumerator {
                    name: e.name.clone(),
                    value: e.value,
                })
                .collect(),
            dependencies: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Shape hash of the whole descriptor, dependencies included.
    pub fn type_hash(&self) -> TypeHash {
        // Serializing plain data structures to JSON cannot fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        TypeHash::compute(&canonical)
    }
}

/// Types directly referenced by `desc`: parent, member element types and
/// the discriminator.
fn references(desc: &TypeDescriptor) -> Vec<Arc<TypeDescriptor>> {
    fn walk(element: &ElementKind, out: &mut Vec<Arc<TypeDescriptor>>) {
        match element {
            ElementKind::Type(reference) => {
                if let Ok(target) = TypeRef::resolve(reference) {
                    out.push(Arc::clone(target));
                }
            }
            ElementKind::Sequence { element, .. } | ElementKind::Array { element, .. } => {
                walk(element, out)
            }
            ElementKind::Primitive(_) | ElementKind::String { .. } => {}
        }
    }
    let mut out = Vec::new();
    if let Some(parent) = desc.parent() {
        out.push(Arc::clone(parent));
    }
    for member in &desc.members()[desc.inherited_count()..] {
        walk(member.element(), &mut out);
    }
    if let Some(union) = desc.union() {
        walk(union.discriminator(), &mut out);
    }
    out
}

/// 14-byte MD5 prefix identifying a type shape.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHash([u8; 14]);

impl TypeHash {
    pub const fn from_bytes(bytes: [u8; 14]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 14] {
        &self.0
    }

    /// MD5 of `data`, truncated to 14 bytes.
    pub fn compute(data: &[u8]) -> Self {
        use md5::{Digest, Md5};

        let digest = Md5::digest(data);
        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&digest[..14]);
        Self(bytes)
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({})", self)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl AsRef<[u8]> for TypeHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumBuilder, IdlType, PrimitiveKind as P, StructBuilder, UnionBuilder};

    #[test]
    fn test_dependencies_are_flat_and_unique() {
        let point = StructBuilder::new("Point")
            .field("x", P::I32)
            .field("y", P::I32)
            .build()
            .unwrap();
        let line = StructBuilder::new("Line")
            .field("a", &point)
            .field("b", &point)
            .sequence_field("extra", &point)
            .build()
            .unwrap();

        let wire = WireTypeDescriptor::from_descriptor(&line);
        assert_eq!(wire.name, "Line");
        assert_eq!(wire.members.len(), 3);
        assert_eq!(wire.dependencies.len(), 1);
        assert_eq!(wire.dependencies[0].name, "Point");
        assert!(wire.dependencies[0].dependencies.is_empty());
        assert_eq!(
            wire.members[2].element,
            WireElement::Sequence {
                element: Box::new(WireElement::Type {
                    name: "Point".into()
                }),
                bound: None
            }
        );
    }

    #[test]
    fn test_json_round_trip_keeps_hash() {
        let color = EnumBuilder::new("Color")
            .variant("Red")
            .variant("Green")
            .build()
            .unwrap();
        let shape = UnionBuilder::new("Shape", &color)
            .case("radius", vec![0], P::F64)
            .default_case("label", IdlType::String)
            .build()
            .unwrap();

        let wire = WireTypeDescriptor::from_descriptor(&shape);
        let json = wire.to_json().unwrap();
        let back = WireTypeDescriptor::from_json(&json).unwrap();
        assert_eq!(back, wire);
        assert_eq!(back.type_hash(), wire.type_hash());
        assert!(wire.members[1].default_case);
        assert_eq!(wire.dependencies[0].enumerators.len(), 2);
    }

    #[test]
    fn test_hash_changes_with_shape() {
        let v1 = StructBuilder::new("Sensor").field("id", P::U32).build().unwrap();
        let v2 = StructBuilder::new("Sensor")
            .field("id", P::U32)
            .field("value", P::F32)
            .build()
            .unwrap();
        let h1 = WireTypeDescriptor::from_descriptor(&v1).type_hash();
        let h2 = WireTypeDescriptor::from_descriptor(&v2).type_hash();
        assert_ne!(h1, h2);
        assert_eq!(h1.as_bytes().len(), 14);
        assert_eq!(format!("{}", h1).len(), 28);
    }

    #[test]
    fn test_parent_members_stay_with_the_base() {
        let base = StructBuilder::new("Base").field("id", P::U32).build().unwrap();
        let derived = StructBuilder::new("Derived")
            .parent(&base)
            .field("extra", P::U8)
            .build()
            .unwrap();
        let wire = WireTypeDescriptor::from_descriptor(&derived);
        assert_eq!(wire.base.as_deref(), Some("Base"));
        assert_eq!(wire.members.len(), 1);
        assert_eq!(wire.dependencies[0].members[0].name, "id");
    }
}
