// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encapsulation header: representation identifier plus options.

use crate::config::{
    CDR2_BE, CDR2_LE, CDR_BE, CDR_LE, D_CDR2_BE, D_CDR2_LE, ENCAPSULATION_HEADER_LEN,
    OPTIONS_PADDING_MASK, PL_CDR2_BE, PL_CDR2_LE, PL_CDR_BE, PL_CDR_LE,
};
use crate::error::WireError;
use crate::types::{DataRepresentation, Extensibility};

/// Body framing announced by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncapsulationKind {
    Plain,
    /// XCDR2 DHEADER-delimited body.
    Delimited,
    ParameterList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encapsulation {
    pub representation: DataRepresentation,
    pub kind: EncapsulationKind,
    pub big_endian: bool,
}

impl Encapsulation {
    /// Little-endian encapsulation a type of `extensibility` is written with.
    pub fn for_type(representation: DataRepresentation, extensibility: Extensibility) -> Self {
        let kind = match (representation, extensibility) {
            (_, Extensibility::Mutable) => EncapsulationKind::ParameterList,
            (DataRepresentation::Xcdr1, _) => EncapsulationKind::Plain,
            (DataRepresentation::Xcdr2, Extensibility::Final) => EncapsulationKind::Plain,
            (DataRepresentation::Xcdr2, Extensibility::Extensible) => EncapsulationKind::Delimited,
        };
        Self {
            representation,
            kind,
            big_endian: false,
        }
    }

    pub fn id(&self) -> u16 {
        use DataRepresentation::*;
        use EncapsulationKind::*;
        match (self.representation, self.kind, self.big_endian) {
            (Xcdr1, ParameterList, true) => PL_CDR_BE,
            (Xcdr1, ParameterList, false) => PL_CDR_LE,
            (Xcdr1, _, true) => CDR_BE,
            (Xcdr1, _, false) => CDR_LE,
            (Xcdr2, Plain, true) => CDR2_BE,
            (Xcdr2, Plain, false) => CDR2_LE,
            (Xcdr2, Delimited, true) => D_CDR2_BE,
            (Xcdr2, Delimited, false) => D_CDR2_LE,
            (Xcdr2, ParameterList, true) => PL_CDR2_BE,
            (Xcdr2, ParameterList, false) => PL_CDR2_LE,
        }
    }

    pub fn from_id(id: u16) -> Result<Self, WireError> {
        use DataRepresentation::*;
        use EncapsulationKind::*;
        let (representation, kind, big_endian) = match id {
            CDR_BE => (Xcdr1, Plain, true),
            CDR_LE => (Xcdr1, Plain, false),
            PL_CDR_BE => (Xcdr1, ParameterList, true),
            PL_CDR_LE => (Xcdr1, ParameterList, false),
            CDR2_BE => (Xcdr2, Plain, true),
            CDR2_LE => (Xcdr2, Plain, false),
            D_CDR2_BE => (Xcdr2, Delimited, true),
            D_CDR2_LE => (Xcdr2, Delimited, false),
            PL_CDR2_BE => (Xcdr2, ParameterList, true),
            PL_CDR2_LE => (Xcdr2, ParameterList, false),
            other => return Err(WireError::UnknownEncapsulation(other)),
        };
        Ok(Self {
            representation,
            kind,
            big_endian,
        })
    }

    /// Four header bytes; `padding` is the trailing pad count.
    pub fn header(&self, padding: usize) -> [u8; ENCAPSULATION_HEADER_LEN] {
        let id = self.id().to_be_bytes();
        let options = (padding as u16 & OPTIONS_PADDING_MASK).to_be_bytes();
        [id[0], id[1], options[0], options[1]]
    }

    /// Parse a header; returns the encapsulation and the trailing pad count.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), WireError> {
        if data.len() < ENCAPSULATION_HEADER_LEN {
            return Err(WireError::HeaderTooShort { have: data.len() });
        }
        let encapsulation = Self::from_id(u16::from_be_bytes([data[0], data[1]]))?;
        let options = u16::from_be_bytes([data[2], data[3]]);
        Ok((encapsulation, usize::from(options & OPTIONS_PADDING_MASK)))
    }

    /// Whether this framing is what a type of `extensibility` uses.
    pub fn matches(&self, extensibility: Extensibility) -> bool {
        Self::for_type(self.representation, extensibility).kind == self.kind
    }
}
