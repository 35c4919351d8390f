// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic object graph exchanged with the caller.

mod buffer;
mod value;

pub use buffer::{BufferElement, PrimitiveBuffer};
pub use value::DynamicValue;
