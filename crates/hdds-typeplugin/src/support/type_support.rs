// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type facade over the layout, the sample programs and the codec.

use super::wire_descriptor::WireTypeDescriptor;
use crate::codec::{self, Encapsulation, WireSize};
use crate::config::ENCAPSULATION_HEADER_LEN;
use crate::dynamic::DynamicValue;
use crate::error::{Error, IllegalOperationError, Result, WireError};
use crate::native::{NativeSample, Place, PoolStats, SamplePool};
use crate::plugin::TypePlugin;
use crate::program::{execute_to_dynamic, execute_to_native};
use crate::types::{DataRepresentation, TypeDescriptor, TypeKind};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Length of a DDS instance key hash.
pub const KEY_HASH_LEN: usize = 16;

/// Serialization entry point for one declared type.
///
/// Struct and union supports own a compiled [`TypePlugin`] and a scratch
/// pool. Enum and alias supports only describe their type: every
/// sample-level operation on them fails with [`IllegalOperationError`].
pub struct TypeSupport {
    descriptor: Arc<TypeDescriptor>,
    plugin: Option<Arc<TypePlugin>>,
    pool: Option<SamplePool>,
    representation: DataRepresentation,
    max_sizes: Vec<(DataRepresentation, WireSize)>,
    max_key_size: WireSize,
    generation: u64,
    registry_generation: Arc<AtomicU64>,
}

impl TypeSupport {
    pub(crate) fn for_aggregate(
        plugin: Arc<TypePlugin>,
        representation: DataRepresentation,
        pool_capacity: usize,
        registry_generation: Arc<AtomicU64>,
    ) -> Result<Self> {
        let mut max_sizes = Vec::with_capacity(2);
        for candidate in [DataRepresentation::Xcdr1, DataRepresentation::Xcdr2] {
            if plugin.descriptor.representations().allows(candidate) {
                max_sizes.push((candidate, codec::max_size(&plugin, candidate)?));
            }
        }
        let max_key_size = codec::max_key_size(&plugin)?;
        Ok(Self {
            descriptor: Arc::clone(&plugin.descriptor),
            pool: Some(SamplePool::new(
                Arc::clone(&plugin.layout.template),
                pool_capacity,
            )),
            plugin: Some(plugin),
            representation,
            max_sizes,
            max_key_size,
            generation: registry_generation.load(Ordering::Acquire),
            registry_generation,
        })
    }

    pub(crate) fn descriptive(
        descriptor: Arc<TypeDescriptor>,
        representation: DataRepresentation,
        registry_generation: Arc<AtomicU64>,
    ) -> Self {
        Self {
            descriptor,
            plugin: None,
            pool: None,
            representation,
            max_sizes: Vec::new(),
            max_key_size: WireSize::Bounded(0),
            generation: registry_generation.load(Ordering::Acquire),
            registry_generation,
        }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Compiled plugin; `None` for enums and aliases.
    pub fn plugin(&self) -> Option<&Arc<TypePlugin>> {
        self.plugin.as_ref()
    }

    /// Representation [`serialize`](Self::serialize) writes.
    pub fn representation(&self) -> DataRepresentation {
        self.representation
    }

    fn aggregate(&self, operation: &'static str) -> Result<(&TypePlugin, &SamplePool)> {
        debug_assert_eq!(
            self.generation,
            self.registry_generation.load(Ordering::Acquire),
            "type support for '{}' used after finalize()",
            self.descriptor.name()
        );
        match (&self.plugin, &self.pool) {
            (Some(plugin), Some(pool)) => Ok((plugin.as_ref(), pool)),
            _ => Err(IllegalOperationError::new(
                self.descriptor.name(),
                operation,
                match self.descriptor.kind() {
                    TypeKind::Enum => "enum types have no samples of their own",
                    _ => "alias types have no samples of their own",
                },
            )
            .into()),
        }
    }

    /// Serialize with the default representation.
    pub fn serialize(&self, value: &DynamicValue) -> Result<Vec<u8>> {
        self.serialize_with(value, self.representation)
    }

    pub fn serialize_with(
        &self,
        value: &DynamicValue,
        representation: DataRepresentation,
    ) -> Result<Vec<u8>> {
        let (plugin, pool) = self.aggregate("serialize")?;
        if !self.descriptor.representations().allows(representation) {
            return Err(WireError::RepresentationNotAllowed {
                type_name: self.descriptor.name().to_string(),
                encapsulation: Encapsulation::for_type(
                    representation,
                    self.descriptor.extensibility(),
                )
                .id(),
            }
            .into());
        }
        let mut scratch = pool.acquire();
        execute_to_native(plugin.programs.to_native(), value, &mut scratch, Place::ROOT)?;
        codec::encode(plugin, &scratch, representation)
    }

    /// Decode a buffer that starts with its encapsulation header.
    pub fn deserialize(&self, data: &[u8]) -> Result<DynamicValue> {
        self.aggregate("deserialize")?;
        let (encapsulation, padding) = Encapsulation::parse(data)?;
        let payload = &data[ENCAPSULATION_HEADER_LEN..];
        // A pad count larger than the payload is ignored rather than trusted.
        let payload = &payload[..payload.len() - padding.min(payload.len())];
        self.deserialize_payload(payload, encapsulation)
    }

    /// Decode a payload whose header was already stripped by the engine.
    pub fn deserialize_payload(
        &self,
        payload: &[u8],
        encapsulation: Encapsulation,
    ) -> Result<DynamicValue> {
        let (plugin, pool) = self.aggregate("deserialize")?;
        let mut scratch = pool.acquire();
        codec::decode(plugin, payload, encapsulation, &mut scratch)?;
        execute_to_dynamic(plugin.programs.to_dynamic(), &scratch, Place::ROOT)
    }

    /// Worst-case buffer length for the default representation, header
    /// and trailing pad included.
    pub fn max_size(&self) -> Result<WireSize> {
        self.max_size_for(self.representation)
    }

    pub fn max_size_for(&self, representation: DataRepresentation) -> Result<WireSize> {
        self.aggregate("max_size")?;
        self.max_sizes
            .iter()
            .find(|(r, _)| *r == representation)
            .map(|(_, size)| *size)
            .ok_or_else(|| {
                Error::from(WireError::RepresentationNotAllowed {
                    type_name: self.descriptor.name().to_string(),
                    encapsulation: Encapsulation::for_type(
                        representation,
                        self.descriptor.extensibility(),
                    )
                    .id(),
                })
            })
    }

    /// Description handed to discovery. Valid for every kind.
    pub fn to_wire_descriptor(&self) -> WireTypeDescriptor {
        WireTypeDescriptor::from_descriptor(&self.descriptor)
    }

    /// Dynamic value of a default-initialised sample.
    pub fn create_default(&self) -> Result<DynamicValue> {
        let (plugin, pool) = self.aggregate("create_default")?;
        let scratch = pool.acquire();
        execute_to_dynamic(plugin.programs.to_dynamic(), &scratch, Place::ROOT)
    }

    /// Convert to a native sample owned by the caller.
    pub fn to_native(&self, value: &DynamicValue) -> Result<NativeSample> {
        let (plugin, _) = self.aggregate("to_native")?;
        let mut sample = NativeSample::new(&plugin.layout.template);
        execute_to_native(plugin.programs.to_native(), value, &mut sample, Place::ROOT)?;
        Ok(sample)
    }

    pub fn from_native(&self, sample: &NativeSample) -> Result<DynamicValue> {
        let (plugin, _) = self.aggregate("from_native")?;
        execute_to_dynamic(plugin.programs.to_dynamic(), sample, Place::ROOT)
    }

    /// Key members serialized as big-endian final XCDR2, no header. Empty
    /// for keyless types.
    pub fn serialize_key(&self, value: &DynamicValue) -> Result<Vec<u8>> {
        let (plugin, pool) = self.aggregate("serialize_key")?;
        let mut scratch = pool.acquire();
        execute_to_native(plugin.programs.to_native(), value, &mut scratch, Place::ROOT)?;
        codec::encode_key(plugin, &scratch)
    }

    /// Worst-case length of [`serialize_key`](Self::serialize_key) output.
    pub fn max_key_size(&self) -> Result<WireSize> {
        self.aggregate("max_key_size")?;
        Ok(self.max_key_size)
    }

    /// Instance key hash: the key bytes zero-padded when the type's largest
    /// possible key fits in 16 bytes, their MD5 digest otherwise.
    pub fn key_hash(&self, value: &DynamicValue) -> Result<[u8; KEY_HASH_LEN]> {
        let key = self.serialize_key(value)?;
        let mut hash = [0u8; KEY_HASH_LEN];
        let fits = key.len() <= KEY_HASH_LEN
            && matches!(self.max_key_size, WireSize::Bounded(n) if n <= KEY_HASH_LEN);
        if fits {
            hash[..key.len()].copy_from_slice(&key);
        } else {
            use md5::{Digest, Md5};
            hash.copy_from_slice(&Md5::digest(&key));
        }
        Ok(hash)
    }

    /// Scratch pool counters; `None` for enums and aliases.
    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.pool.as_ref().map(SamplePool::stats)
    }
}

impl fmt::Debug for TypeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSupport")
            .field("name", &self.descriptor.name())
            .field("kind", &self.descriptor.kind())
            .field("representation", &self.representation)
            .field("generation", &self.generation)
            .finish()
    }
}
