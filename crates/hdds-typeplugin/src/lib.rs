// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-typeplugin
//!
//! IDL type plugin for HDDS: declare record, union, enum and alias types
//! through builders, derive their fixed native layout, and move samples
//! between a dynamic object graph and XCDR1 / XCDR2 wire buffers.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_typeplugin::types::{PrimitiveKind, StructBuilder};
//! use hdds_typeplugin::{type_support, DynamicValue, Result};
//!
//! fn main() -> Result<()> {
//!     let point = StructBuilder::new("Point")
//!         .field("x", PrimitiveKind::I32)
//!         .field("y", PrimitiveKind::I32)
//!         .build()?;
//!
//!     let support = type_support(&point)?;
//!     let value = DynamicValue::structure([
//!         ("x", DynamicValue::I32(1)),
//!         ("y", DynamicValue::I32(2)),
//!     ]);
//!     let bytes = support.serialize(&value)?;
//!     assert_eq!(support.deserialize(&bytes)?, value);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  types     builders + annotations -> TypeDescriptor           |
//! +---------------------------------------------------------------+
//! |  layout    TypeDescriptor -> LayoutDescriptor (C layout)      |
//! |  program   LayoutDescriptor -> SampleProgram pair             |
//! +---------------------------------------------------------------+
//! |  DynamicValue <-> NativeSample <-> codec (XCDR1 / XCDR2)      |
//! +---------------------------------------------------------------+
//! |  support   TypeSupport facade, TypeSupportRegistry            |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Logging
//!
//! The crate logs through the `log` facade with `[typeplugin]`,
//! `[registry]` and `[codec]` prefixes. No logger is installed.

/// XCDR1 / XCDR2 encapsulation, encoder, decoder and size computation.
pub mod codec;
/// Wire constants and the process-wide [`config::TypePluginConfig`].
pub mod config;
/// Dynamic object graph exchanged with applications.
pub mod dynamic;
/// Error types shared by every module.
pub mod error;
/// Native layout derivation.
pub mod layout;
/// Native samples, scalar access and the scratch pool.
pub mod native;
/// Compiled per-type artefacts.
pub mod plugin;
/// Sample programs copying between dynamic values and native samples.
pub mod program;
/// Type support facade and registry.
pub mod support;
/// Type declaration model.
pub mod types;

pub use codec::{Encapsulation, WireSize};
pub use dynamic::{DynamicValue, PrimitiveBuffer};
pub use error::{
    Error, FieldSerializationError, IllegalOperationError, Result, TypeDefinitionError, WireError,
};
pub use support::{
    finalize, type_support, TypeSupport, TypeSupportRegistry, WireTypeDescriptor,
};
pub use types::{DataRepresentation, Extensibility, TypeDescriptor};
