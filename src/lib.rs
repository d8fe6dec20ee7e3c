//! Decoding of bitcoin-core style blk archives
//!
//! Blocks are read from a byte buffer, normally a mapped blk file, either
//! eagerly (fields copied out) or lazily (fields re-read from the buffer
//! on access). Both kinds of records offer the same accessors.
//!
//! ```no_run
//! use bitcrust_blk::ArchiveFile;
//!
//! let file = ArchiveFile::open("blocks/blk00000.dat").unwrap();
//! for block in file.lazy_blocks() {
//!     let block = block.unwrap();
//!     println!("{} {}", block.hash(), block.time());
//! }
//! ```

#[macro_use]
pub extern crate slog;

#[macro_use]
extern crate serde_derive;


pub mod buffer;
pub mod compact_size;
pub mod layout;
pub mod storage;
pub mod decoder;

pub mod block;
pub mod transaction;
pub mod script;
pub mod hash;

pub mod archive;
pub mod chain;
pub mod flat;
pub mod validate;

pub mod config;
pub mod error;
pub mod util;


pub use crate::archive::{ArchiveFile, ArchiveReader, ReaderState, ScanReport, Strictness};
pub use crate::block::Block;
pub use crate::chain::{Chain, FileReport};
pub use crate::compact_size::CompactSize;
pub use crate::config::Config;
pub use crate::decoder::{Decoder, EagerDecoder, LazyDecoder, Sequence};
pub use crate::error::{Error, OutOfRange, Result};
pub use crate::flat::{FieldValue, FlatExport, FlatRecord};
pub use crate::hash::Hash;
pub use crate::storage::{Eager, Lazy, Span, Storage};
pub use crate::transaction::{Transaction, TxInput, TxOutput};
pub use crate::validate::{RateLimiter, RatePolicy, RemoteBlock, RemoteSource, RemoteTransaction, Validator};
