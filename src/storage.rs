//! Storage strategies for decoded fields
//!
//! Records are generic over a `Storage`. `Eager` copies every field into
//! owned memory as it is decoded. `Lazy` only remembers where each field
//! lives and reads the bytes again from the borrowed source whenever the
//! field is accessed.

use std::fmt::Debug;
use std::ops::Range;

/// Strategy used by records to keep the bytes of their fields
pub trait Storage: Clone + Debug {
    type Field: Clone + Debug + PartialEq;

    /// Keeps the field `bytes`, which were read from the source at `start`
    fn keep(&self, start: usize, bytes: &[u8]) -> Self::Field;

    /// Returns the bytes of a kept field
    fn get<'s>(&'s self, field: &'s Self::Field) -> &'s [u8];

    /// Returns true if fields kept by this storage can be taken from `source`
    fn accepts(&self, source: &[u8]) -> bool;
}


/// Owns a copy of every field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Eager;

impl Storage for Eager {
    type Field = Box<[u8]>;

    fn keep(&self, _start: usize, bytes: &[u8]) -> Box<[u8]> {
        bytes.into()
    }

    fn get<'s>(&'s self, field: &'s Box<[u8]>) -> &'s [u8] {
        field
    }

    fn accepts(&self, _source: &[u8]) -> bool {
        true
    }
}


/// Byte range of a field within its source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end:   usize,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Keeps only spans; the source must outlive the records
#[derive(Clone, Copy, Debug)]
pub struct Lazy<'a> {
    source: &'a [u8],
}

impl<'a> Lazy<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Lazy { source: source }
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }
}

impl<'a> Storage for Lazy<'a> {
    type Field = Span;

    fn keep(&self, start: usize, bytes: &[u8]) -> Span {
        Span { start: start, end: start + bytes.len() }
    }

    fn get<'s>(&'s self, field: &'s Span) -> &'s [u8] {
        &self.source[field.range()]
    }

    fn accepts(&self, source: &[u8]) -> bool {
        self.source.as_ptr() == source.as_ptr() && self.source.len() == source.len()
    }
}
