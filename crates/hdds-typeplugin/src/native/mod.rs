// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native fixed-layout samples and their scratch pool.

mod pool;
mod sample;
mod scalar;

pub use pool::{PoolStats, SamplePool, ScratchSample};
pub use sample::{NativeSample, Place, SequenceHeader, POINTER_SIZE};
pub use scalar::{EnumRepr, ScalarKind, ENUM_SIZE};
