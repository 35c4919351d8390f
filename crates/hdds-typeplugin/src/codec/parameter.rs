// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member headers of mutable types.
//!
//! - XCDR1 parameter list: short header `pid:u16, len:u16`, extended header
//!   `PID_EXTENDED` followed by `id:u32, len:u32`, closed by `PID_LIST_END`.
//! - XCDR2 EMHEADER1: `M | LC << 28 | id`, with a NEXTINT length for LC 4.

use super::cursor::{WireReader, WireWriter};
use crate::config::{
    EMHEADER_ID_MASK, EMHEADER_LC_MASK, EMHEADER_LC_SHIFT, EMHEADER_MUST_UNDERSTAND,
    PID_EXTENDED, PID_EXTENDED_ID_MASK, PID_EXTENDED_MUST_UNDERSTAND, PID_FLAG_IMPL_EXTENSION,
    PID_FLAG_MUST_UNDERSTAND, PID_ID_MASK, PID_IGNORE, PID_LIST_END, PID_SHORT_MAX_ID,
};
use crate::error::{Result, WireError};

/// Length code of an EMHEADER1 (XTypes 1.3, 7.4.3.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LengthCode {
    Lc1 = 0,
    Lc2 = 1,
    Lc4 = 2,
    Lc8 = 3,
    NextInt = 4,
}

impl LengthCode {
    /// Fixed length code for a scalar of `size` bytes.
    pub fn for_scalar(size: usize) -> Option<Self> {
        match size {
            1 => Some(Self::Lc1),
            2 => Some(Self::Lc2),
            4 => Some(Self::Lc4),
            8 => Some(Self::Lc8),
            _ => None,
        }
    }
}

/// A member header read from either representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemberHeader {
    pub id: u32,
    pub must_understand: bool,
    /// Body length in bytes, starting at the reader position.
    pub len: usize,
}

/// What the next XCDR1 parameter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parameter {
    Member(MemberHeader),
    Ignore(usize),
    ListEnd,
}

/// Positions of a parameter being written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParameterMark {
    header_at: usize,
    body_at: usize,
}

/// Start an XCDR1 parameter: a short header placeholder.
pub(crate) fn begin_parameter(w: &mut WireWriter) -> ParameterMark {
    w.align(4);
    let header_at = w.position();
    w.write_u16(0);
    w.write_u16(0);
    ParameterMark {
        header_at,
        body_at: w.position(),
    }
}

/// Close a parameter opened by [`begin_parameter`].
///
/// The short header is converted to the extended form in place when the id
/// or the body length does not fit.
pub(crate) fn end_parameter(
    w: &mut WireWriter,
    mark: ParameterMark,
    id: u32,
    must_understand: bool,
    pad_body: bool,
) -> Result<()> {
    if pad_body {
        w.align(4);
    }
    let ParameterMark { header_at, body_at } = mark;
    let len = w.position() - body_at;

    if id > PID_SHORT_MAX_ID || len > usize::from(u16::MAX) {
        let len = u32::try_from(len)
            .map_err(|_| WireError::Malformed(format!("parameter {} too long", id)))?;
        // Eight bytes keep the body's 8-byte alignment.
        w.insert_zeroed(body_at, 8);
        w.patch_u16(header_at, PID_EXTENDED | PID_FLAG_MUST_UNDERSTAND);
        w.patch_u16(header_at + 2, 8);
        let mut ext_id = id & PID_EXTENDED_ID_MASK;
        if must_understand {
            ext_id |= PID_EXTENDED_MUST_UNDERSTAND;
        }
        w.patch_u32(body_at, ext_id);
        w.patch_u32(body_at + 4, len);
    } else {
        let mut pid = id as u16;
        if must_understand {
            pid |= PID_FLAG_MUST_UNDERSTAND;
        }
        w.patch_u16(header_at, pid);
        w.patch_u16(header_at + 2, len as u16);
    }
    Ok(())
}

pub(crate) fn write_list_end(w: &mut WireWriter) {
    w.align(4);
    w.write_u16(PID_LIST_END);
    w.write_u16(0);
}

pub(crate) fn read_parameter(r: &mut WireReader<'_>) -> Result<Parameter> {
    r.align(4)?;
    let pid = r.read_u16()?;
    let len = usize::from(r.read_u16()?);
    let must_understand = pid & PID_FLAG_MUST_UNDERSTAND != 0;
    match pid & PID_ID_MASK {
        PID_LIST_END => Ok(Parameter::ListEnd),
        PID_IGNORE => Ok(Parameter::Ignore(len)),
        PID_EXTENDED => {
            if len < 8 {
                return Err(WireError::Malformed(format!(
                    "extended parameter header of length {}",
                    len
                ))
                .into());
            }
            let id = r.read_u32()?;
            let body = r.read_u32()? as usize;
            // Anything beyond the two words in the short length is skipped.
            r.read_bytes(len - 8)?;
            Ok(Parameter::Member(MemberHeader {
                id: id & PID_EXTENDED_ID_MASK,
                must_understand: id & PID_EXTENDED_MUST_UNDERSTAND != 0,
                len: body,
            }))
        }
        _ if pid & PID_FLAG_IMPL_EXTENSION != 0 => Ok(Parameter::Ignore(len)),
        id => Ok(Parameter::Member(MemberHeader {
            id: u32::from(id),
            must_understand,
            len,
        })),
    }
}

/// EMHEADER1 with the given length code; returns the NEXTINT position for
/// [`LengthCode::NextInt`].
pub(crate) fn write_emheader(
    w: &mut WireWriter,
    id: u32,
    must_understand: bool,
    lc: LengthCode,
) -> Option<usize> {
    w.align(4);
    let mut header = ((lc as u32) << EMHEADER_LC_SHIFT) | (id & EMHEADER_ID_MASK);
    if must_understand {
        header |= EMHEADER_MUST_UNDERSTAND;
    }
    w.write_u32(header);
    (lc == LengthCode::NextInt).then(|| w.reserve_u32())
}

pub(crate) fn read_emheader(r: &mut WireReader<'_>) -> Result<MemberHeader> {
    r.align(4)?;
    let header = r.read_u32()?;
    let lc = (header >> EMHEADER_LC_SHIFT) & EMHEADER_LC_MASK;
    let len = match lc {
        0 => 1,
        1 => 2,
        2 => 4,
        3 => 8,
        4 => r.read_u32()? as usize,
        // LC 5..=7 reuse the body's own leading length word.
        n => {
            let next = r.peek_u32()? as usize;
            let scaled = match n {
                5 => Some(next),
                6 => next.checked_mul(4),
                _ => next.checked_mul(8),
            };
            scaled
                .and_then(|body| body.checked_add(4))
                .ok_or_else(|| WireError::Malformed("member length overflows".into()))?
        }
    };
    Ok(MemberHeader {
        id: header & EMHEADER_ID_MASK,
        must_understand: header & EMHEADER_MUST_UNDERSTAND != 0,
        len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> WireWriter {
        WireWriter::with_prefix(&[], 8, false)
    }

    #[test]
    fn test_short_parameter() {
        let mut w = writer();
        let mark = begin_parameter(&mut w);
        w.write_u8(0xAA);
        end_parameter(&mut w, mark, 3, true, true).unwrap();
        write_list_end(&mut w);
        let bytes = w.into_inner();
        assert_eq!(
            bytes,
            vec![0x03, 0x40, 4, 0, 0xAA, 0, 0, 0, 0x02, 0x3F, 0, 0]
        );

        let mut r = WireReader::new(&bytes, 8, false);
        assert_eq!(
            read_parameter(&mut r).unwrap(),
            Parameter::Member(MemberHeader {
                id: 3,
                must_understand: true,
                len: 4
            })
        );
        r.read_bytes(4).unwrap();
        assert_eq!(read_parameter(&mut r).unwrap(), Parameter::ListEnd);
    }

    #[test]
    fn test_large_id_uses_extended_header() {
        let mut w = writer();
        let mark = begin_parameter(&mut w);
        w.write_u32(7);
        end_parameter(&mut w, mark, 0x5000, false, true).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &[0x01, 0x7F, 8, 0]);

        let mut r = WireReader::new(&bytes, 8, false);
        assert_eq!(
            read_parameter(&mut r).unwrap(),
            Parameter::Member(MemberHeader {
                id: 0x5000,
                must_understand: false,
                len: 4
            })
        );
        assert_eq!(r.read_u32().unwrap(), 7);
    }

    #[test]
    fn test_emheader_length_codes() {
        let mut w = WireWriter::with_prefix(&[], 4, false);
        assert_eq!(write_emheader(&mut w, 1, true, LengthCode::Lc4), None);
        w.write_u32(9);
        let next = write_emheader(&mut w, 2, false, LengthCode::NextInt).unwrap();
        w.write_bytes(&[1, 2, 3]);
        w.patch_u32(next, 3);
        let bytes = w.into_inner();

        let mut r = WireReader::new(&bytes, 4, false);
        let first = read_emheader(&mut r).unwrap();
        assert_eq!((first.id, first.must_understand, first.len), (1, true, 4));
        r.read_bytes(4).unwrap();
        let second = read_emheader(&mut r).unwrap();
        assert_eq!((second.id, second.must_understand, second.len), (2, false, 3));
    }

    #[test]
    fn test_emheader_reused_length_word() {
        // LC 6: sequence of 4-byte elements, the count is the body's first word.
        let header: u32 = (6 << 28) | 5;
        let mut bytes = header.to_le_bytes().to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        let mut r = WireReader::new(&bytes, 4, false);
        let h = read_emheader(&mut r).unwrap();
        assert_eq!((h.id, h.len), (5, 12));
        assert_eq!(r.position(), 4);
    }
}
