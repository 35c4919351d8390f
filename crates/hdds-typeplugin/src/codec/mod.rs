// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XCDR1 / XCDR2 codec between native samples and wire bytes.
//!
//! Output is always little-endian; input may be either byte order. Every
//! serialized buffer starts with a 4-byte encapsulation header and its
//! payload is padded to a multiple of 4, the pad count going into the
//! header options.

mod cursor;
mod decoder;
mod encapsulation;
mod encoder;
mod max_size;
mod parameter;

pub use encapsulation::{Encapsulation, EncapsulationKind};
pub use max_size::WireSize;
pub(crate) use max_size::{max_key_size, max_size};

use crate::config;
use crate::error::{Result, WireError};
use crate::native::{NativeSample, Place};
use crate::plugin::TypePlugin;
use crate::types::{DataRepresentation, TypeDescriptor};
use cursor::{WireReader, WireWriter};
use decoder::Decoder;
use encoder::Encoder;

/// Serialize the sample rooted at [`Place::ROOT`], header included.
pub(crate) fn encode(
    plugin: &TypePlugin,
    sample: &NativeSample,
    representation: DataRepresentation,
) -> Result<Vec<u8>> {
    let encapsulation = Encapsulation::for_type(representation, plugin.descriptor.extensibility());
    let writer = WireWriter::with_prefix(
        &encapsulation.header(0),
        representation.max_alignment(),
        encapsulation.big_endian,
    );
    let mut encoder = Encoder::new(
        sample,
        writer,
        representation,
        config::current().max_nesting_depth,
    );
    encoder.aggregate(plugin, Place::ROOT)?;
    let mut writer = encoder.finish();
    let padding = writer.finish_padded();
    let mut bytes = writer.into_inner();
    bytes[..config::ENCAPSULATION_HEADER_LEN].copy_from_slice(&encapsulation.header(padding));
    log::trace!(
        "[codec] encoded '{}' as {:#06x}: {} bytes",
        plugin.name(),
        encapsulation.id(),
        bytes.len()
    );
    Ok(bytes)
}

/// Key members as big-endian final XCDR2, without header.
pub(crate) fn encode_key(plugin: &TypePlugin, sample: &NativeSample) -> Result<Vec<u8>> {
    let representation = DataRepresentation::Xcdr2;
    let writer = WireWriter::with_prefix(&[], representation.max_alignment(), true);
    let mut encoder = Encoder::new(
        sample,
        writer,
        representation,
        config::current().max_nesting_depth,
    );
    encoder.key(plugin, Place::ROOT)?;
    Ok(encoder.finish().into_inner())
}

/// Reject headers a type cannot be read from.
pub(crate) fn check_encapsulation(
    desc: &TypeDescriptor,
    encapsulation: &Encapsulation,
) -> std::result::Result<(), WireError> {
    if !desc.representations().allows(encapsulation.representation) {
        return Err(WireError::RepresentationNotAllowed {
            type_name: desc.name().to_string(),
            encapsulation: encapsulation.id(),
        });
    }
    if !encapsulation.matches(desc.extensibility()) {
        return Err(WireError::ExtensibilityMismatch {
            type_name: desc.name().to_string(),
            encapsulation: encapsulation.id(),
        });
    }
    Ok(())
}

/// Decode a payload (header already stripped) into `sample`, which must
/// hold the type's template.
pub(crate) fn decode(
    plugin: &TypePlugin,
    payload: &[u8],
    encapsulation: Encapsulation,
    sample: &mut NativeSample,
) -> Result<()> {
    check_encapsulation(&plugin.descriptor, &encapsulation)?;
    let reader = WireReader::new(
        payload,
        encapsulation.representation.max_alignment(),
        encapsulation.big_endian,
    );
    log::trace!(
        "[codec] decoding '{}' from {:#06x}: {} bytes",
        plugin.name(),
        encapsulation.id(),
        payload.len()
    );
    Decoder::new(
        reader,
        sample,
        encapsulation.representation,
        config::current().max_nesting_depth,
    )
    .aggregate(plugin, Place::ROOT)
}
