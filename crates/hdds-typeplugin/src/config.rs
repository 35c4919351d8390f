// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type plugin configuration - wire constants and runtime defaults.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (encapsulation ids, XCDR1
//!   parameter ids, XCDR2 member header fields).
//! - **Level 2 (Dynamic)**: [`TypePluginConfig`], the defaults applied when
//!   types are declared and type supports are constructed. The process-wide
//!   value sits behind an `ArcSwap`, so reads are a single atomic load.
//!
//! # Example
//!
//! ```ignore
//! use hdds_typeplugin::config::{self, TypePluginConfig};
//!
//! let cfg = TypePluginConfig::from_yaml_str("preferred_representation: xcdr2\n")?;
//! config::install(cfg)?;
//! assert_eq!(config::current().scratch_pool_capacity, 16);
//! ```

use crate::types::{DataRepresentation, Extensibility};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

// =======================================================================
// Encapsulation identifiers (big-endian u16 at the start of every buffer)
// =======================================================================

/// Encapsulation header length: representation id (2) + options (2).
pub const ENCAPSULATION_HEADER_LEN: usize = 4;

pub const CDR_BE: u16 = 0x0000;
pub const CDR_LE: u16 = 0x0001;
pub const PL_CDR_BE: u16 = 0x0002;
pub const PL_CDR_LE: u16 = 0x0003;
pub const CDR2_BE: u16 = 0x0006;
pub const CDR2_LE: u16 = 0x0007;
pub const D_CDR2_BE: u16 = 0x0008;
pub const D_CDR2_LE: u16 = 0x0009;
pub const PL_CDR2_BE: u16 = 0x000a;
pub const PL_CDR2_LE: u16 = 0x000b;

/// Options field: low two bits hold the count of trailing pad bytes.
pub const OPTIONS_PADDING_MASK: u16 = 0x0003;

// =======================================================================
// XCDR1 parameter list (mutable types)
// =======================================================================

pub const PID_EXTENDED: u16 = 0x3F01;
pub const PID_LIST_END: u16 = 0x3F02;
pub const PID_IGNORE: u16 = 0x3F03;
pub const PID_FLAG_IMPL_EXTENSION: u16 = 0x8000;
pub const PID_FLAG_MUST_UNDERSTAND: u16 = 0x4000;
pub const PID_ID_MASK: u16 = 0x3FFF;

/// Largest member id that fits a short parameter header.
pub const PID_SHORT_MAX_ID: u32 = 0x3F00;

/// Must-understand bit inside the extended parameter's u32 member id.
pub const PID_EXTENDED_MUST_UNDERSTAND: u32 = 0x4000_0000;
pub const PID_EXTENDED_ID_MASK: u32 = 0x0FFF_FFFF;

// =======================================================================
// XCDR2 EMHEADER1 (mutable types)
// =======================================================================

pub const EMHEADER_MUST_UNDERSTAND: u32 = 0x8000_0000;
pub const EMHEADER_LC_SHIFT: u32 = 28;
pub const EMHEADER_LC_MASK: u32 = 0x7;
pub const EMHEADER_ID_MASK: u32 = 0x0FFF_FFFF;

/// Largest member id representable in EMHEADER1.
pub const MAX_MEMBER_ID: u32 = EMHEADER_ID_MASK;

// =======================================================================
// Runtime defaults
// =======================================================================

/// Scratch samples kept per type support.
pub const DEFAULT_SCRATCH_POOL_CAPACITY: usize = 16;

/// Aggregate nesting accepted while decoding (recursive types).
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Bounded collections up to this many elements are sized element by element
/// in `max_size`; larger ones use a per-element padding estimate.
pub const MAX_SIZE_UNROLL_LIMIT: usize = 4096;

/// Defaults applied by the builders and the type support registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypePluginConfig {
    /// Extensibility of types declared without a type annotation.
    pub default_extensibility: Extensibility,
    /// Representation used by `serialize` when the type allows it.
    pub preferred_representation: DataRepresentation,
    /// Scratch samples retained per type support.
    pub scratch_pool_capacity: usize,
    /// Nesting limit enforced while decoding.
    pub max_nesting_depth: usize,
}

impl Default for TypePluginConfig {
    fn default() -> Self {
        Self {
            default_extensibility: Extensibility::Extensible,
            preferred_representation: DataRepresentation::Xcdr1,
            scratch_pool_capacity: DEFAULT_SCRATCH_POOL_CAPACITY,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl TypePluginConfig {
    /// Parse a YAML document.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a YAML file.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse JSON: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scratch_pool_capacity == 0 {
            return Err(ConfigError::Invalid("scratch_pool_capacity must be >= 1"));
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid("max_nesting_depth must be >= 1"));
        }
        Ok(())
    }
}

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read config: {}", e),
            Self::Parse(msg) => write!(f, "{}", msg),
            Self::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

fn slot() -> &'static ArcSwap<TypePluginConfig> {
    static CURRENT: OnceLock<ArcSwap<TypePluginConfig>> = OnceLock::new();
    CURRENT.get_or_init(|| ArcSwap::from_pointee(TypePluginConfig::default()))
}

/// Process-wide configuration snapshot.
#[inline]
pub fn current() -> Arc<TypePluginConfig> {
    slot().load_full()
}

/// Replace the process-wide configuration.
///
/// Only types declared and type supports constructed afterwards see the new
/// values.
pub fn install(cfg: TypePluginConfig) -> Result<(), ConfigError> {
    cfg.validate()?;
    log::debug!("[typeplugin] installing config {:?}", cfg);
    slot().store(Arc::new(cfg));
    Ok(())
}
