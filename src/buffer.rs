//! A buffer is used for decoding raw bytes
//!
//! It wraps the full source slice together with a read position, so that
//! decoded records can remember where each of their fields lives.
//!
//! This is normally imported as buffer::* such that the
//! pub's can be considered to be in the global namespace

use std::marker;
use std::mem;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::OutOfRange;

#[derive(Clone, Copy, Debug)]
pub struct Buffer<'a> {
    inner: &'a [u8],
    pos:   usize,
}

/// Trait implemented for types that can read itself from a Buffer
///
/// Should be implemented with zero-copying
pub trait Parse<'a>
    where Self: marker::Sized
{
    fn parse(buf: &mut Buffer<'a>) -> Result<Self, OutOfRange>;
}

impl<'a> Buffer<'a> {

    /// Constructs a buffer positioned at the start of `slice`
    pub fn new(slice: &'a [u8]) -> Self {
        Buffer {
            inner: slice,
            pos:   0,
        }
    }

    /// Constructs a buffer over `slice` positioned at `pos`
    pub fn at(slice: &'a [u8], pos: usize) -> Self {
        Buffer {
            inner: slice,
            pos:   pos.min(slice.len()),
        }
    }

    /// Total length of the source
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.inner.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.inner.len()
    }

    /// The whole source this buffer reads from, regardless of position
    pub fn source(&self) -> &'a [u8] {
        self.inner
    }

    /// The unread part of the source
    pub fn rest(&self) -> &'a [u8] {
        &self.inner[self.pos..]
    }

    /// Moves the read position; positions past the end are clamped
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.inner.len());
    }

    /// Returns whatever is consumed since position `start`
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.inner[start.min(self.pos)..self.pos]
    }

    fn check(&self, count: usize) -> Result<(), OutOfRange> {
        if self.remaining() < count {
            return Err(OutOfRange {
                position:  self.pos,
                requested: count,
                len:       self.inner.len(),
            });
        }
        Ok(())
    }

    /// Reads the next `count` bytes and advances past them
    pub fn read_next(&mut self, count: usize) -> Result<&'a [u8], OutOfRange> {
        self.check(count)?;

        let result = &self.inner[self.pos..self.pos + count];
        self.pos += count;

        Ok(result)
    }

    /// Reads the next `count` bytes in reverse order
    ///
    /// Used for fields of which the stored order is the reverse of the
    /// display order; this copies.
    pub fn read_next_reversed(&mut self, count: usize) -> Result<Vec<u8>, OutOfRange> {
        let mut result = self.read_next(count)?.to_vec();
        result.reverse();
        Ok(result)
    }

    /// Skips `count` bytes without looking at them
    pub fn skip(&mut self, count: usize) -> Result<(), OutOfRange> {
        self.check(count)?;
        self.pos += count;
        Ok(())
    }

    /// Returns the next byte without advancing
    pub fn peek_byte(&self) -> Result<u8, OutOfRange> {
        self.check(1)?;
        Ok(self.inner[self.pos])
    }
}


fn first_byte(bytes: &[u8]) -> u8 {
    bytes[0]
}

macro_rules! impl_parse_primitive {
    ($prim_type: ty, $read: expr) =>

    (
        impl<'a> Parse<'a> for $prim_type {
            fn parse(buffer: &mut Buffer<'a>) -> Result<$prim_type, OutOfRange> {
                let sz = mem::size_of::<$prim_type>();
                let bytes = buffer.read_next(sz)?;

                Ok($read(bytes))
            }
        }
    )
}

impl_parse_primitive!(u8,  first_byte);
impl_parse_primitive!(u16, LittleEndian::read_u16);
impl_parse_primitive!(u32, LittleEndian::read_u32);
impl_parse_primitive!(u64, LittleEndian::read_u64);
impl_parse_primitive!(i32, LittleEndian::read_i32);
impl_parse_primitive!(i64, LittleEndian::read_i64);
