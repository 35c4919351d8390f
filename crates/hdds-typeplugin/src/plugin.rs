// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled per-type artefacts: descriptor, layout and program pair.

use crate::error::{Error, IllegalOperationError};
use crate::layout::LayoutDescriptor;
use crate::program::ProgramPair;
use crate::types::TypeDescriptor;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Everything needed to convert and encode samples of one struct or union.
#[derive(Debug)]
pub struct TypePlugin {
    pub(crate) descriptor: Arc<TypeDescriptor>,
    pub(crate) layout: LayoutDescriptor,
    pub(crate) programs: ProgramPair,
}

impl TypePlugin {
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn layout(&self) -> &LayoutDescriptor {
        &self.layout
    }

    pub fn programs(&self) -> &ProgramPair {
        &self.programs
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

/// Late-bound reference to a nested type's plugin.
///
/// The slot is filled once the nested type finished compiling, which lets a
/// type reach itself through a sequence or an optional member. A recursive
/// type therefore holds a reference cycle and lives until process exit.
#[derive(Clone)]
pub struct PluginRef {
    name: Arc<str>,
    slot: Arc<OnceLock<Arc<TypePlugin>>>,
}

impl PluginRef {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            slot: Arc::new(OnceLock::new()),
        }
    }

    pub(crate) fn bind(&self, plugin: Arc<TypePlugin>) {
        if self.slot.set(plugin).is_err() {
            log::warn!("[typeplugin] plugin for '{}' bound twice", self.name);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound plugin; an error while its construction is still pending.
    #[inline]
    pub fn get(&self) -> Result<&Arc<TypePlugin>, Error> {
        self.slot.get().ok_or_else(|| {
            IllegalOperationError::new(
                &*self.name,
                "resolve",
                "type support construction has not completed",
            )
            .into()
        })
    }
}

impl fmt::Debug for PluginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginRef({})", self.name)
    }
}
