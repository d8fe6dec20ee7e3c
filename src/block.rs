//!
//! Bitcoin block
//!
//! A block record as stored in a blk archive: magic, size, the 80 byte
//! header and the transactions. Accessors interpret the stored bytes on
//! each call, so eager and lazy blocks answer identically.

use std::fmt;
use std::time::{Duration, UNIX_EPOCH};

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};

use crate::compact_size;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::layout::{self, block::*};
use crate::storage::Storage;
use crate::transaction::Transaction;
use crate::util;


/// Decoded block
///
/// Fields are kept in the order of `layout::block::FIELDS`.
#[derive(Clone, Debug)]
pub struct Block<S: Storage> {
    fields: Vec<S::Field>,
    txs:    Vec<Transaction<S>>,

    start:  usize,
    end:    usize,
    index:  usize,

    store:  S,
}

impl<S: Storage> Block<S> {

    pub(crate) fn new(fields: Vec<S::Field>, txs: Vec<Transaction<S>>,
                      start: usize, end: usize, index: usize, store: S) -> Self {
        debug_assert_eq!(fields.len(), FIELDS.len());
        Block {
            fields: fields,
            txs:    txs,
            start:  start,
            end:    end,
            index:  index,
            store:  store,
        }
    }

    /// Stored bytes of the field at `index` in `layout::block::FIELDS`
    pub(crate) fn field(&self, index: usize) -> &[u8] {
        self.store.get(&self.fields[index])
    }

    pub fn magic(&self) -> &[u8] {
        self.field(MAGIC)
    }

    pub fn magic_hex(&self) -> String {
        util::to_hex(self.magic())
    }

    /// Size of the block after the magic and size fields, as stored
    pub fn declared_size(&self) -> u32 {
        LittleEndian::read_u32(self.field(BLOCK_SIZE))
    }

    pub fn version(&self) -> u32 {
        LittleEndian::read_u32(self.field(VERSION))
    }

    pub fn prev_hash(&self) -> Hash {
        Hash::from_slice(self.field(PREV_HASH))
    }

    pub fn merkle_root(&self) -> Hash {
        Hash::from_slice(self.field(MERKLE_ROOT))
    }

    /// Unix time as stored in the header
    pub fn timestamp(&self) -> u32 {
        LittleEndian::read_u32(self.field(TIMESTAMP))
    }

    pub fn time(&self) -> DateTime<Utc> {
        DateTime::from(UNIX_EPOCH + Duration::from_secs(u64::from(self.timestamp())))
    }

    pub fn bits(&self) -> u32 {
        LittleEndian::read_u32(self.field(BITS))
    }

    pub fn nonce(&self) -> u32 {
        LittleEndian::read_u32(self.field(NONCE))
    }

    pub fn tx_count(&self) -> u64 {
        compact_size::field_value(self.field(TX_COUNT))
    }

    pub fn transactions(&self) -> &[Transaction<S>] {
        &self.txs
    }

    /// The 80 bytes of the header that make up the block hash
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(layout::HEADER_LEN);
        for n in HASHED {
            result.extend_from_slice(self.field(n));
        }
        result
    }

    pub fn hash(&self) -> Hash {
        Hash::double_sha256(&self.header_bytes())
    }

    /// Offset of the magic number in the source
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset just past the last transaction
    pub fn end(&self) -> usize {
        self.end
    }

    /// Label assigned by the decoder
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes spanned after the magic and size fields
    pub fn actual_size(&self) -> usize {
        (self.end - self.start).saturating_sub(layout::RECORD_PREFIX_LEN)
    }

    pub fn is_size_consistent(&self) -> bool {
        self.actual_size() == self.declared_size() as usize
    }

    /// Fails with `SizeMismatch` if the decoded span differs from the
    /// declared size
    pub fn verify_size(&self) -> Result<()> {
        if self.is_size_consistent() {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                offset:   self.start,
                declared: self.declared_size(),
                actual:   self.actual_size(),
            })
        }
    }
}

impl<S: Storage> fmt::Display for Block<S> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Block #{} {} time={} txs={} size={}",
            self.index,
            self.hash(),
            self.time().format("%Y-%m-%d %H:%M:%S"),
            self.tx_count(),
            self.declared_size())
    }
}
