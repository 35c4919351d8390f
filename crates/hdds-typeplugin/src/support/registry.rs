// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide cache of type supports.
//!
//! Lookups go through a `DashMap` keyed by [`TypeIdentity`]. Construction is
//! serialised by one mutex and double-checked, so a race never yields two
//! supports for the same type. Building a type also builds every struct,
//! union, enum and alias it references; the whole graph is registered at
//! once, after everything compiled.

use super::type_support::TypeSupport;
use crate::config;
use crate::error::{DefinitionFault, Error, Result, TypeDefinitionError};
use crate::layout::{derive_layout, validate_alias, PluginResolver};
use crate::plugin::{PluginRef, TypePlugin};
use crate::program::compile_programs;
use crate::types::{TypeDescriptor, TypeIdentity, TypeKind};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Registry hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    /// Type supports constructed, nested types included.
    pub built: u64,
    pub last_build_ns: u64,
}

/// Cache of [`TypeSupport`]s keyed by type identity.
pub struct TypeSupportRegistry {
    supports: DashMap<TypeIdentity, Arc<TypeSupport>>,
    build_lock: Mutex<()>,
    stats: RwLock<LookupStats>,
    generation: Arc<AtomicU64>,
}

impl Default for TypeSupportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSupportRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            supports: DashMap::new(),
            build_lock: Mutex::new(()),
            stats: RwLock::new(LookupStats::default()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The registry behind [`type_support`] and [`finalize`].
    pub fn global() -> &'static TypeSupportRegistry {
        static GLOBAL: OnceLock<TypeSupportRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TypeSupportRegistry::new)
    }

    /// Cached support for `desc`, constructing it and everything it
    /// references on first use.
    pub fn get_or_create(&self, desc: &Arc<TypeDescriptor>) -> Result<Arc<TypeSupport>> {
        if let Some(hit) = self.get(desc) {
            self.record_hit();
            return Ok(hit);
        }

        let _guard = self.build_lock.lock();
        if let Some(hit) = self.get(desc) {
            self.record_hit();
            return Ok(hit);
        }

        let start = Instant::now();
        let mut graph = GraphBuilder::new(self);
        graph.build_all(desc)?;
        let supports = graph.into_supports(&self.generation)?;

        let built = supports.len() as u64;
        let mut root = None;
        for support in supports {
            let identity = support.descriptor().identity();
            if identity == desc.identity() {
                root = Some(Arc::clone(&support));
            }
            log::debug!(
                "[registry] registered '{}' ({:?})",
                support.name(),
                support.descriptor().kind()
            );
            self.supports.insert(identity, support);
        }
        self.record_miss(start, built);

        root.ok_or_else(|| {
            Error::from(TypeDefinitionError::new(
                desc.name(),
                DefinitionFault::UnresolvedForward(desc.name().to_string()),
            ))
        })
    }

    /// Cached support for `desc`, without constructing it.
    pub fn get(&self, desc: &TypeDescriptor) -> Option<Arc<TypeSupport>> {
        self.supports
            .get(&desc.identity())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.supports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    /// Bumped by every [`finalize`](Self::finalize).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Drop every cached support. Supports obtained before this call must
    /// not be used afterwards.
    pub fn finalize(&self) {
        let _guard = self.build_lock.lock();
        let dropped = self.supports.len();
        self.supports.clear();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!(
            "[registry] finalized: {} type supports dropped, generation {}",
            dropped,
            generation
        );
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self, start: Instant, built: u64) {
        let mut stats = self.stats.write();
        stats.misses = stats.misses.saturating_add(1);
        stats.built = stats.built.saturating_add(built);
        stats.last_build_ns = start.elapsed().as_nanos() as u64;
    }
}

/// Support for `desc` from the global registry.
pub fn type_support(desc: &Arc<TypeDescriptor>) -> Result<Arc<TypeSupport>> {
    TypeSupportRegistry::global().get_or_create(desc)
}

/// Clear the global registry.
pub fn finalize() {
    TypeSupportRegistry::global().finalize();
}

enum Built {
    Aggregate(Arc<TypePlugin>),
    Descriptive(Arc<TypeDescriptor>),
}

/// Construction of one declaration graph.
///
/// Types stored inline are built depth-first. Types behind a sequence or an
/// optional are deferred until the referencing type is bound, since its
/// layout only needs their header or pointer.
struct GraphBuilder<'r> {
    registry: &'r TypeSupportRegistry,
    pending: HashMap<TypeIdentity, PluginRef>,
    in_progress: Vec<(TypeIdentity, String)>,
    done: HashSet<TypeIdentity>,
    deferred: Vec<Arc<TypeDescriptor>>,
    order: Vec<Built>,
}

impl<'r> GraphBuilder<'r> {
    fn new(registry: &'r TypeSupportRegistry) -> Self {
        Self {
            registry,
            pending: HashMap::new(),
            in_progress: Vec::new(),
            done: HashSet::new(),
            deferred: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Build `root` and everything reachable from it.
    fn build_all(&mut self, root: &Arc<TypeDescriptor>) -> Result<()> {
        self.build(root)?;
        while let Some(next) = self.deferred.pop() {
            self.build(&next)?;
        }
        Ok(())
    }

    fn build(&mut self, desc: &Arc<TypeDescriptor>) -> Result<()> {
        let identity = desc.identity();
        if self.done.contains(&identity) || self.registry.get(desc).is_some() {
            return Ok(());
        }
        self.in_progress.push((identity, desc.name().to_string()));
        let result = self.build_one(desc);
        self.in_progress.pop();
        result?;
        self.done.insert(identity);
        Ok(())
    }

    fn build_one(&mut self, desc: &Arc<TypeDescriptor>) -> Result<()> {
        match desc.kind() {
            TypeKind::Struct | TypeKind::Union => {
                let slot = self
                    .pending
                    .entry(desc.identity())
                    .or_insert_with(|| PluginRef::new(desc.name()))
                    .clone();
                let layout = derive_layout(desc, self)?;
                let programs = compile_programs(desc, &layout)?;
                let plugin = Arc::new(TypePlugin {
                    descriptor: Arc::clone(desc),
                    layout,
                    programs,
                });
                slot.bind(Arc::clone(&plugin));
                log::debug!(
                    "[typeplugin] compiled '{}': {} bytes, align {}",
                    desc.name(),
                    plugin.layout.size,
                    plugin.layout.alignment
                );
                self.order.push(Built::Aggregate(plugin));
            }
            TypeKind::Alias => {
                validate_alias(desc, self)?;
                self.order.push(Built::Descriptive(Arc::clone(desc)));
            }
            TypeKind::Enum => self.order.push(Built::Descriptive(Arc::clone(desc))),
        }
        Ok(())
    }

    fn cycle(&self, target: &TypeDescriptor) -> Error {
        let mut path: Vec<&str> = self.in_progress.iter().map(|(_, n)| n.as_str()).collect();
        path.push(target.name());
        TypeDefinitionError::new(
            target.name(),
            DefinitionFault::CyclicAggregation(path.join(" -> ")),
        )
        .into()
    }

    fn into_supports(self, generation: &Arc<AtomicU64>) -> Result<Vec<Arc<TypeSupport>>> {
        let cfg = config::current();
        let mut supports = Vec::with_capacity(self.order.len());
        for built in self.order {
            let descriptor = match &built {
                Built::Aggregate(plugin) => Arc::clone(&plugin.descriptor),
                Built::Descriptive(desc) => Arc::clone(desc),
            };
            let representation = descriptor
                .representations()
                .select(cfg.preferred_representation)
                .ok_or_else(|| {
                    TypeDefinitionError::new(descriptor.name(), DefinitionFault::NoDataRepresentation)
                })?;
            let support = match built {
                Built::Aggregate(plugin) => TypeSupport::for_aggregate(
                    plugin,
                    representation,
                    cfg.scratch_pool_capacity,
                    Arc::clone(generation),
                )?,
                Built::Descriptive(desc) => {
                    TypeSupport::descriptive(desc, representation, Arc::clone(generation))
                }
            };
            supports.push(Arc::new(support));
        }
        Ok(supports)
    }
}

impl PluginResolver for GraphBuilder<'_> {
    fn resolve(&mut self, target: &Arc<TypeDescriptor>, inline: bool) -> Result<PluginRef> {
        let identity = target.identity();
        if let Some(plugin) = self.registry.get(target).and_then(|s| s.plugin().cloned()) {
            let reference = PluginRef::new(target.name());
            reference.bind(plugin);
            return Ok(reference);
        }
        if inline && self.in_progress.iter().any(|(id, _)| *id == identity) {
            return Err(self.cycle(target));
        }
        if !inline {
            if !self.done.contains(&identity) && !self.pending.contains_key(&identity) {
                self.deferred.push(Arc::clone(target));
            }
            return Ok(self
                .pending
                .entry(identity)
                .or_insert_with(|| PluginRef::new(target.name()))
                .clone());
        }
        self.build(target)?;
        self.pending.get(&identity).cloned().ok_or_else(|| {
            TypeDefinitionError::new(
                target.name(),
                DefinitionFault::UnresolvedForward(target.name().to_string()),
            )
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForwardDecl, IdlType, PrimitiveKind as P, StructBuilder};

    #[test]
    fn test_get_or_create_is_idempotent() {
        let point = StructBuilder::new("Point")
            .field("x", P::I32)
            .build()
            .unwrap();
        let registry = TypeSupportRegistry::new();
        let a = registry.get_or_create(&point).unwrap();
        let b = registry.get_or_create(&point).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let stats = registry.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_nested_types_registered_together() {
        let point = StructBuilder::new("Point").field("x", P::I32).build().unwrap();
        let line = StructBuilder::new("Line")
            .field("a", &point)
            .field("b", &point)
            .build()
            .unwrap();
        let registry = TypeSupportRegistry::new();
        registry.get_or_create(&line).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&point).is_some());
        assert_eq!(registry.stats().built, 2);
    }

    #[test]
    fn test_recursion_through_sequence_is_allowed() {
        let node = ForwardDecl::new("Node");
        let desc = StructBuilder::new("Node")
            .field("value", P::I32)
            .sequence_field("children", &node)
            .build()
            .unwrap();
        node.define(&desc).unwrap();
        let registry = TypeSupportRegistry::new();
        let support = registry.get_or_create(&desc).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!support.max_size().unwrap().is_bounded());
    }

    #[test]
    fn test_inline_cycle_is_rejected() {
        let a_decl = ForwardDecl::new("A");
        let b = StructBuilder::new("B").field("a", &a_decl).build().unwrap();
        let a = StructBuilder::new("A").field("b", &b).build().unwrap();
        a_decl.define(&a).unwrap();

        let registry = TypeSupportRegistry::new();
        let err = registry.get_or_create(&a).unwrap_err();
        let def = err.as_definition_error().expect("definition error");
        assert!(matches!(def.fault(), DefinitionFault::CyclicAggregation(path) if path == "A -> B -> A"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_finalize_clears_and_bumps_generation() {
        let desc = StructBuilder::new("Gone")
            .field("v", IdlType::String)
            .build()
            .unwrap();
        let registry = TypeSupportRegistry::new();
        registry.get_or_create(&desc).unwrap();
        assert_eq!(registry.generation(), 0);
        registry.finalize();
        assert!(registry.is_empty());
        assert_eq!(registry.generation(), 1);
        let again = registry.get_or_create(&desc).unwrap();
        assert_eq!(again.name(), "Gone");
    }
}
