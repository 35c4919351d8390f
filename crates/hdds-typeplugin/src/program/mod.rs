// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample programs: precompiled copy instructions between a
//! [`DynamicValue`](crate::DynamicValue) and a
//! [`NativeSample`](crate::native::NativeSample).
//!
//! Every struct or union compiles into a [`ProgramPair`] once, when its type
//! support is constructed. A program is an ordered list of [`Step`]s in
//! member declaration order; union programs carry a discriminator step and
//! one arm per case.
//!
//! # Architecture
//!
//! ```text
//! DynamicValue --to_native program--> NativeSample --codec--> bytes
//! DynamicValue <-to_dynamic program-- NativeSample <-codec--- bytes
//! ```

mod compiler;
mod interpreter;

pub(crate) use compiler::compile_programs;
pub use interpreter::{execute_to_dynamic, execute_to_native};

use crate::error::Result;
use crate::layout::NativeRepr;
use crate::native::{ScalarKind, POINTER_SIZE};
use crate::plugin::PluginRef;
use std::sync::Arc;

/// Which way a program copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToNative,
    ToDynamic,
}

/// Dynamic-side container of a primitive collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceContainer {
    /// `DynamicValue::Sequence` / `DynamicValue::Array` of scalars.
    List,
    /// `DynamicValue::Buffer`, filled with a single copy.
    Buffer,
    /// Accept either (dynamic to native only).
    Any,
}

/// Non-scalar element of a collection.
#[derive(Debug, Clone)]
pub enum ElementOp {
    String { wide: bool, bound: Option<usize> },
    Aggregate(PluginRef),
    /// Sequence or array reached through an alias.
    Collection {
        repr: Box<NativeRepr>,
        op: Box<CopyOp>,
    },
}

impl ElementOp {
    pub(crate) fn size(&self) -> Result<usize> {
        Ok(match self {
            Self::String { .. } => POINTER_SIZE,
            Self::Aggregate(plugin) => plugin.get()?.layout.size,
            Self::Collection { repr, .. } => repr.size()?,
        })
    }

    pub(crate) fn template(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Self::String { .. } => vec![0u8; POINTER_SIZE],
            Self::Aggregate(plugin) => plugin.get()?.layout.template.to_vec(),
            Self::Collection { repr, .. } => repr.template()?,
        })
    }
}

/// Element of a fixed array.
#[derive(Debug, Clone)]
pub enum ArrayElement {
    Scalar(ScalarKind),
    Nested(ElementOp),
}

/// The instruction set.
#[derive(Debug, Clone)]
pub enum CopyOp {
    PrimitiveCopy(ScalarKind),
    StringConvert {
        wide: bool,
        bound: Option<usize>,
    },
    AggregateRecurse(PluginRef),
    PrimitiveSequenceCopy {
        element: ScalarKind,
        bound: Option<usize>,
        container: SequenceContainer,
    },
    AggregateSequenceCopy {
        element: ElementOp,
        bound: Option<usize>,
    },
    FixedArrayCopy {
        element: ArrayElement,
        count: usize,
        container: SequenceContainer,
    },
}

/// How a step reaches its storage.
#[derive(Debug, Clone)]
pub enum Indirection {
    Inline,
    /// Pointer slot to a block of the inner representation.
    Optional(Box<NativeRepr>),
}

/// One member copy.
#[derive(Debug, Clone)]
pub struct Step {
    pub field: Arc<str>,
    pub offset: usize,
    pub indirection: Indirection,
    pub op: CopyOp,
}

/// One union case.
#[derive(Debug, Clone)]
pub struct UnionArm {
    pub labels: Vec<i64>,
    pub is_default: bool,
    /// Representation of the case value, for re-initialising the value area.
    pub value: NativeRepr,
    pub step: Step,
}

#[derive(Debug, Clone)]
pub struct UnionProgram {
    pub discriminator: ScalarKind,
    pub value_offset: usize,
    pub arms: Vec<UnionArm>,
}

impl UnionProgram {
    pub fn arm_for(&self, label: i64) -> Option<&UnionArm> {
        self.arms
            .iter()
            .find(|a| a.labels.contains(&label))
            .or_else(|| self.arms.iter().find(|a| a.is_default))
    }
}

#[derive(Debug, Clone)]
pub enum ProgramBody {
    Struct(Vec<Step>),
    Union(UnionProgram),
}

/// Compiled instructions for one type and one direction.
#[derive(Debug, Clone)]
pub struct SampleProgram {
    pub(crate) type_name: Arc<str>,
    pub(crate) direction: Direction,
    pub(crate) body: ProgramBody,
}

impl SampleProgram {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn body(&self) -> &ProgramBody {
        &self.body
    }

    /// Member steps of a struct program; empty for unions.
    pub fn steps(&self) -> &[Step] {
        match &self.body {
            ProgramBody::Struct(steps) => steps,
            ProgramBody::Union(_) => &[],
        }
    }
}

/// The two programs of a type, shared read-only by every call.
#[derive(Debug, Clone)]
pub struct ProgramPair {
    pub(crate) to_native: SampleProgram,
    pub(crate) to_dynamic: SampleProgram,
}

impl ProgramPair {
    pub fn to_native(&self) -> &SampleProgram {
        &self.to_native
    }

    pub fn to_dynamic(&self) -> &SampleProgram {
        &self.to_dynamic
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        let empty = |direction| SampleProgram {
            type_name: Arc::from(""),
            direction,
            body: ProgramBody::Struct(Vec::new()),
        };
        Self {
            to_native: empty(Direction::ToNative),
            to_dynamic: empty(Direction::ToDynamic),
        }
    }
}
