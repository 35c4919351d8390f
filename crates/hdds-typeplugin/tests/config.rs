// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loading and installing the process-wide configuration.
//!
//! The installed configuration is global to this test binary, so everything
//! that depends on it lives in a single test.

use hdds_typeplugin::config::{self, ConfigError, TypePluginConfig};
use hdds_typeplugin::types::{PrimitiveKind as P, StructBuilder};
use hdds_typeplugin::{DataRepresentation, DynamicValue, Extensibility, TypeSupportRegistry};
use std::io::Write;

#[test]
fn json_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"preferred_representation": "xcdr2", "scratch_pool_capacity": 2}}"#
    )
    .unwrap();
    let cfg = TypePluginConfig::from_json_file(file.path()).unwrap();
    assert_eq!(cfg.preferred_representation, DataRepresentation::Xcdr2);
    assert_eq!(cfg.scratch_pool_capacity, 2);
    assert_eq!(
        cfg.default_extensibility,
        TypePluginConfig::default().default_extensibility
    );
}

#[cfg(feature = "config-loaders")]
#[test]
fn yaml_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typeplugin.yaml");
    std::fs::write(
        &path,
        "default_extensibility: final\nmax_nesting_depth: 12\n",
    )
    .unwrap();
    let cfg = TypePluginConfig::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.default_extensibility, Extensibility::Final);
    assert_eq!(cfg.max_nesting_depth, 12);
}

#[test]
fn bad_documents_are_reported() {
    assert!(matches!(
        TypePluginConfig::from_json_str("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        TypePluginConfig::from_json_str(r#"{"max_nesting_depth": 0}"#),
        Err(ConfigError::Invalid(_))
    ));
    let missing = tempfile::tempdir().unwrap().path().join("absent.json");
    assert!(matches!(
        TypePluginConfig::from_json_file(missing),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn installed_config_drives_new_declarations() {
    let previous = (*config::current()).clone();
    config::install(TypePluginConfig {
        default_extensibility: Extensibility::Mutable,
        preferred_representation: DataRepresentation::Xcdr2,
        scratch_pool_capacity: 1,
        max_nesting_depth: 2,
    })
    .unwrap();

    let inner = StructBuilder::new("Inner").field("v", P::U8).build().unwrap();
    assert_eq!(inner.extensibility(), Extensibility::Mutable);
    let registry = TypeSupportRegistry::new();
    let support = registry.get_or_create(&inner).unwrap();
    assert_eq!(support.representation(), DataRepresentation::Xcdr2);
    let bytes = support
        .serialize(&DynamicValue::structure([("v", DynamicValue::U8(1))]))
        .unwrap();
    // PL_CDR2_LE
    assert_eq!(&bytes[..2], &[0x00, 0x0b]);

    // Three levels exceed a nesting limit of two.
    let middle = StructBuilder::new("Middle")
        .field("inner", &inner)
        .build()
        .unwrap();
    let outer = StructBuilder::new("Outer")
        .field("middle", &middle)
        .build()
        .unwrap();
    let outer_support = registry.get_or_create(&outer).unwrap();
    let value = DynamicValue::structure([(
        "middle",
        DynamicValue::structure([(
            "inner",
            DynamicValue::structure([("v", DynamicValue::U8(1))]),
        )]),
    )]);
    let err = outer_support.serialize(&value).unwrap_err();
    assert!(err.to_string().contains("nesting deeper than 2"), "{}", err);

    assert!(matches!(
        config::install(TypePluginConfig {
            scratch_pool_capacity: 0,
            ..TypePluginConfig::default()
        }),
        Err(ConfigError::Invalid(_))
    ));

    config::install(previous).unwrap();
}
