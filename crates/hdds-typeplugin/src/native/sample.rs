// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native samples: a fixed root block plus an arena of indirect blocks.
//!
//! Pointer slots (strings, optionals, sequence buffers) hold a `u64` handle
//! in native byte order: `0` is null, `n` designates arena block `n - 1`.
//! Values are stored in native byte order, the way a C struct would hold
//! them.

use crate::error::FieldFault;

/// Size of a pointer slot.
pub const POINTER_SIZE: usize = 8;

/// Native header of a sequence member.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceHeader {
    /// Bound for bounded sequences, otherwise the allocated length.
    pub maximum: u32,
    pub length: u32,
    /// Handle of the element block, `0` when empty.
    pub buffer: u64,
}

const _: () = assert!(std::mem::size_of::<SequenceHeader>() == 16);
const _: () = assert!(std::mem::align_of::<SequenceHeader>() == 8);
const _: () = assert!(std::mem::offset_of!(SequenceHeader, maximum) == 0);
const _: () = assert!(std::mem::offset_of!(SequenceHeader, length) == 4);
const _: () = assert!(std::mem::offset_of!(SequenceHeader, buffer) == 8);

impl SequenceHeader {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const ALIGN: usize = std::mem::align_of::<Self>();

    fn decode(bytes: &[u8]) -> Self {
        Self {
            maximum: read_u32(bytes, std::mem::offset_of!(Self, maximum)),
            length: read_u32(bytes, std::mem::offset_of!(Self, length)),
            buffer: read_u64(bytes, std::mem::offset_of!(Self, buffer)),
        }
    }

    fn encode(&self, out: &mut [u8]) {
        let maximum = std::mem::offset_of!(Self, maximum);
        let length = std::mem::offset_of!(Self, length);
        let buffer = std::mem::offset_of!(Self, buffer);
        out[maximum..maximum + 4].copy_from_slice(&self.maximum.to_ne_bytes());
        out[length..length + 4].copy_from_slice(&self.length.to_ne_bytes());
        out[buffer..buffer + 8].copy_from_slice(&self.buffer.to_ne_bytes());
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(raw)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_ne_bytes(raw)
}

/// Address inside a sample: a block (`0` = root) and an offset in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Place {
    pub(crate) block: usize,
    pub(crate) offset: usize,
}

impl Place {
    pub const ROOT: Self = Self {
        block: 0,
        offset: 0,
    };

    #[inline]
    pub(crate) fn at(self, delta: usize) -> Self {
        Self {
            block: self.block,
            offset: self.offset + delta,
        }
    }

    fn handle(self) -> u64 {
        self.block as u64
    }
}

/// One sample in native layout.
#[derive(Debug, Clone, Default)]
pub struct NativeSample {
    root: Vec<u8>,
    arena: Vec<Vec<u8>>,
    spare: Vec<Vec<u8>>,
}

impl NativeSample {
    /// A sample initialised from a layout's default template.
    pub fn new(template: &[u8]) -> Self {
        Self {
            root: template.to_vec(),
            arena: Vec::new(),
            spare: Vec::new(),
        }
    }

    /// Restore the default state, keeping arena allocations for reuse.
    pub(crate) fn reset(&mut self, template: &[u8]) {
        self.root.clear();
        self.root.extend_from_slice(template);
        for mut block in self.arena.drain(..) {
            block.clear();
            self.spare.push(block);
        }
    }

    pub fn root_bytes(&self) -> &[u8] {
        &self.root
    }

    /// Number of indirect blocks currently in use.
    pub fn arena_blocks(&self) -> usize {
        self.arena.len()
    }

    fn block(&self, block: usize) -> Option<&Vec<u8>> {
        match block {
            0 => Some(&self.root),
            n => self.arena.get(n - 1),
        }
    }

    fn block_mut(&mut self, block: usize) -> Option<&mut Vec<u8>> {
        match block {
            0 => Some(&mut self.root),
            n => self.arena.get_mut(n - 1),
        }
    }

    pub(crate) fn bytes(&self, at: Place, len: usize) -> Result<&[u8], FieldFault> {
        self.block(at.block)
            .and_then(|b| b.get(at.offset..at.offset + len))
            .ok_or(FieldFault::CorruptSample {
                offset: at.offset,
                len,
            })
    }

    pub(crate) fn bytes_mut(&mut self, at: Place, len: usize) -> Result<&mut [u8], FieldFault> {
        self.block_mut(at.block)
            .and_then(|b| b.get_mut(at.offset..at.offset + len))
            .ok_or(FieldFault::CorruptSample {
                offset: at.offset,
                len,
            })
    }

    /// Length of the block `at` lives in.
    pub(crate) fn block_len(&self, at: Place) -> usize {
        self.block(at.block).map_or(0, Vec::len)
    }

    /// New zero-filled arena block.
    pub(crate) fn allocate(&mut self, len: usize) -> Place {
        let mut block = self.spare.pop().unwrap_or_default();
        block.resize(len, 0);
        self.arena.push(block);
        Place {
            block: self.arena.len(),
            offset: 0,
        }
    }

    /// New arena block holding a copy of `content`.
    pub(crate) fn allocate_from(&mut self, content: &[u8]) -> Place {
        let mut block = self.spare.pop().unwrap_or_default();
        block.extend_from_slice(content);
        self.arena.push(block);
        Place {
            block: self.arena.len(),
            offset: 0,
        }
    }

    pub(crate) fn read_pointer(&self, at: Place) -> Result<Option<Place>, FieldFault> {
        let handle = read_u64(self.bytes(at, POINTER_SIZE)?, 0);
        self.place_of(handle, at)
    }

    pub(crate) fn write_pointer(&mut self, at: Place, target: Option<Place>) -> Result<(), FieldFault> {
        let handle = target.map_or(0, Place::handle);
        self.bytes_mut(at, POINTER_SIZE)?
            .copy_from_slice(&handle.to_ne_bytes());
        Ok(())
    }

    pub(crate) fn read_header(&self, at: Place) -> Result<SequenceHeader, FieldFault> {
        Ok(SequenceHeader::decode(self.bytes(at, SequenceHeader::SIZE)?))
    }

    pub(crate) fn write_header(&mut self, at: Place, header: &SequenceHeader) -> Result<(), FieldFault> {
        header.encode(self.bytes_mut(at, SequenceHeader::SIZE)?);
        Ok(())
    }

    /// Element block of a sequence header, `None` when empty.
    pub(crate) fn sequence_buffer(
        &self,
        header: &SequenceHeader,
        at: Place,
    ) -> Result<Option<Place>, FieldFault> {
        self.place_of(header.buffer, at)
    }

    pub(crate) fn handle_of(place: Place) -> u64 {
        place.handle()
    }

    fn place_of(&self, handle: u64, at: Place) -> Result<Option<Place>, FieldFault> {
        match handle {
            0 => Ok(None),
            h if (h as usize) <= self.arena.len() => Ok(Some(Place {
                block: h as usize,
                offset: 0,
            })),
            _ => Err(FieldFault::CorruptSample {
                offset: at.offset,
                len: POINTER_SIZE,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let mut sample = NativeSample::new(&[0u8; 24]);
        let header = SequenceHeader {
            maximum: 4,
            length: 3,
            buffer: 1,
        };
        let at = Place::ROOT.at(8);
        let _ = sample.allocate(12);
        sample.write_header(at, &header).expect("write header");
        let back = sample.read_header(at).expect("read header");
        assert_eq!(back, header);
        assert_eq!(
            sample.sequence_buffer(&back, at).expect("buffer"),
            Some(Place {
                block: 1,
                offset: 0
            })
        );
    }

    #[test]
    fn test_pointer_slots() {
        let mut sample = NativeSample::new(&[0u8; 8]);
        assert_eq!(sample.read_pointer(Place::ROOT).expect("null"), None);

        let block = sample.allocate_from(b"hi\0");
        sample
            .write_pointer(Place::ROOT, Some(block))
            .expect("write pointer");
        let target = sample
            .read_pointer(Place::ROOT)
            .expect("read pointer")
            .expect("non-null");
        assert_eq!(sample.bytes(target, 3).expect("bytes"), b"hi\0");
    }

    #[test]
    fn test_dangling_handle_is_an_error() {
        let mut sample = NativeSample::new(&[0u8; 8]);
        sample.root[0..8].copy_from_slice(&7u64.to_ne_bytes());
        assert!(sample.read_pointer(Place::ROOT).is_err());
        assert!(sample.bytes(Place::ROOT.at(4), 8).is_err());
    }

    #[test]
    fn test_reset_recycles_blocks() {
        let template = [1u8, 2, 3, 4];
        let mut sample = NativeSample::new(&template);
        let _ = sample.allocate(64);
        sample.bytes_mut(Place::ROOT, 1).expect("root")[0] = 9;
        sample.reset(&template);
        assert_eq!(sample.root_bytes(), &template);
        assert_eq!(sample.arena_blocks(), 0);
        let place = sample.allocate(16);
        assert_eq!(sample.block_len(place), 16);
        assert!(sample.bytes(place, 16).expect("zeroed").iter().all(|b| *b == 0));
    }
}
