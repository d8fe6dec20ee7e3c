//! Errors produced while decoding archives
//!
//! Cursor-level failures are reported as `OutOfRange`; the archive reader
//! turns those into `TruncatedRecord` when they happen inside a record.

use std::io;

use thiserror::Error;

/// A read would go past the end of the underlying bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("read of {requested} bytes at offset {position} exceeds buffer of {len} bytes")]
pub struct OutOfRange {
    pub position:  usize,
    pub requested: usize,
    pub len:       usize,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),

    /// A record started at `offset` but the buffer ended before it was complete
    #[error("truncated record at offset {offset} after {decoded} complete records ({available} bytes left)")]
    TruncatedRecord {
        offset:    usize,
        decoded:   usize,
        available: usize,
    },

    /// The bytes consumed by a block differ from its declared size
    #[error("block at offset {offset} declares {declared} bytes but spans {actual}")]
    SizeMismatch {
        offset:   usize,
        declared: u32,
        actual:   usize,
    },

    #[error("unexpected magic {found:02x?} at offset {offset}")]
    BadMagic {
        offset: usize,
        found:  [u8; 4],
    },

    /// A lazy decoder was handed a cursor over a different byte source
    #[error("cursor does not read from the decoder's source")]
    ForeignSource,

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = ::std::result::Result<T, Error>;
