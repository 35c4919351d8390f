// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type support facade and the registry that caches it.

mod registry;
mod type_support;
mod wire_descriptor;

pub use registry::{finalize, type_support, LookupStats, TypeSupportRegistry};
pub use type_support::{TypeSupport, KEY_HASH_LEN};
pub use wire_descriptor::{
    TypeHash, WireElement, WireEnumerator, WireMember, WireTypeDescriptor,
};
