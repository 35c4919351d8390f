// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors over XCDR payloads.
//!
//! Offsets used for alignment are relative to the start of the payload (the
//! byte after the encapsulation header). Alignment is capped by the data
//! representation: 8 for XCDR1, 4 for XCDR2.

use crate::error::WireError;

type WireResult<T> = Result<T, WireError>;

/// Generate fixed-width write methods honouring the writer's byte order.
macro_rules! impl_write {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            let bytes = if self.big_endian {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            };
            self.buf.extend_from_slice(&bytes);
        }
    };
}

/// Generate fixed-width read methods honouring the reader's byte order.
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> WireResult<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(if self.big_endian {
                <$type>::from_be_bytes(bytes)
            } else {
                <$type>::from_le_bytes(bytes)
            })
        }
    };
}

/// Copy native-order elements of `width` bytes, reversing each element when
/// the wire order differs from the host order.
fn copy_elements(src: &[u8], dst: &mut [u8], width: usize, swap: bool) {
    if !swap || width <= 1 {
        dst.copy_from_slice(src);
        return;
    }
    for (out, chunk) in dst.chunks_exact_mut(width).zip(src.chunks_exact(width)) {
        for (o, b) in out.iter_mut().zip(chunk.iter().rev()) {
            *o = *b;
        }
    }
}

/// Growable payload writer.
pub(crate) struct WireWriter {
    buf: Vec<u8>,
    origin: usize,
    max_align: usize,
    big_endian: bool,
}

impl WireWriter {
    /// Writer continuing after `prefix` (typically the encapsulation header).
    pub fn with_prefix(prefix: &[u8], max_align: usize, big_endian: bool) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(prefix);
        Self {
            buf,
            origin: prefix.len(),
            max_align,
            big_endian,
        }
    }

    /// Payload-relative position.
    pub fn position(&self) -> usize {
        self.buf.len() - self.origin
    }

    pub fn align(&mut self, alignment: usize) {
        let alignment = alignment.min(self.max_align);
        if alignment <= 1 {
            return;
        }
        let pad = (alignment - self.position() % alignment) % alignment;
        self.buf.resize(self.buf.len() + pad, 0);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    impl_write!(write_u16, u16);
    impl_write!(write_u32, u32);

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write native-order elements in the writer's byte order.
    pub fn write_native(&mut self, bytes: &[u8], width: usize) {
        let swap = self.swaps();
        let start = self.buf.len();
        self.buf.resize(start + bytes.len(), 0);
        copy_elements(bytes, &mut self.buf[start..], width, swap);
    }

    /// Placeholder `u32`, patched later; returns its payload position.
    pub fn reserve_u32(&mut self) -> usize {
        self.align(4);
        let at = self.position();
        self.write_u32(0);
        at
    }

    pub fn patch_u32(&mut self, at: usize, value: u32) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        let at = self.origin + at;
        self.buf[at..at + 4].copy_from_slice(&bytes);
    }

    pub fn patch_u16(&mut self, at: usize, value: u16) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        let at = self.origin + at;
        self.buf[at..at + 2].copy_from_slice(&bytes);
    }

    /// Insert zeroed bytes at a payload position, shifting what follows.
    pub fn insert_zeroed(&mut self, at: usize, len: usize) {
        let at = self.origin + at;
        self.buf.splice(at..at, std::iter::repeat(0u8).take(len));
    }

    fn swaps(&self) -> bool {
        self.big_endian != cfg!(target_endian = "big")
    }

    /// Pad the payload to a multiple of 4; returns the pad count.
    pub fn finish_padded(&mut self) -> usize {
        let before = self.position();
        let pad = (4 - before % 4) % 4;
        self.buf.resize(self.buf.len() + pad, 0);
        pad
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked payload reader.
///
/// `limit` is the end of the innermost delimited scope; reads past it fail
/// as truncated.
pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: usize,
    max_align: usize,
    big_endian: bool,
}

impl<'a> WireReader<'a> {
    pub fn new(payload: &'a [u8], max_align: usize, big_endian: bool) -> Self {
        Self {
            buf: payload,
            pos: 0,
            limit: payload.len(),
            max_align,
            big_endian,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    /// Narrow the readable range to `end`; returns the previous limit.
    pub fn enter(&mut self, end: usize) -> WireResult<usize> {
        if end > self.limit {
            return Err(WireError::Truncated { offset: self.pos });
        }
        Ok(std::mem::replace(&mut self.limit, end))
    }

    /// Leave a scope entered with [`enter`](Self::enter), skipping to its end.
    pub fn leave(&mut self, previous: usize) {
        self.pos = self.pos.max(self.limit);
        self.limit = previous;
    }

    pub fn seek(&mut self, pos: usize) -> WireResult<()> {
        if pos > self.limit {
            return Err(WireError::Truncated { offset: self.pos });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn align(&mut self, alignment: usize) -> WireResult<()> {
        let alignment = alignment.min(self.max_align);
        if alignment <= 1 {
            return Ok(());
        }
        let aligned = self.pos.div_ceil(alignment) * alignment;
        if aligned > self.limit {
            return Err(WireError::Truncated { offset: self.pos });
        }
        self.pos = aligned;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> WireResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.limit)
            .ok_or(WireError::Truncated { offset: self.pos })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> WireResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    impl_read!(read_u16, u16, 2);
    impl_read!(read_u32, u32, 4);

    /// The next `u32` without consuming it.
    pub fn peek_u32(&self) -> WireResult<u32> {
        let mut ahead = WireReader {
            buf: self.buf,
            pos: self.pos,
            limit: self.limit,
            max_align: self.max_align,
            big_endian: self.big_endian,
        };
        ahead.read_u32()
    }

    /// Read elements of `width` bytes into native order.
    pub fn read_native(&mut self, out: &mut [u8], width: usize) -> WireResult<()> {
        let src = self.read_bytes(out.len())?;
        let swap = self.big_endian != cfg!(target_endian = "big");
        copy_elements(src, out, width, swap);
        Ok(())
    }
}
