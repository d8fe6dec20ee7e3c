//! Decoding of blocks and their transactions
//!
//! A decoder walks the field tables of `layout` over a buffer. What is kept
//! of each field depends on the storage: an `EagerDecoder` copies the
//! bytes, a `LazyDecoder` only records where they are.
//!
//! Decoding is all-or-nothing: when a record cannot be completed the buffer
//! and the sequence labels are left as they were.

use std::convert::TryFrom;

use crate::block::Block;
use crate::buffer::*;
use crate::compact_size::CompactSize;
use crate::error::{Error, Result};
use crate::layout::{self, FieldSpec, Width};
use crate::storage::{Eager, Lazy, Storage};
use crate::transaction::{Transaction, TxInput, TxOutput};


/// Labels handed to the next decoded block and transaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    pub block:       usize,
    pub transaction: usize,
}

#[derive(Clone, Debug)]
pub struct Decoder<S: Storage> {
    store:    S,
    sequence: Sequence,
}

pub type EagerDecoder = Decoder<Eager>;
pub type LazyDecoder<'a> = Decoder<Lazy<'a>>;

impl Decoder<Eager> {
    pub fn eager() -> EagerDecoder {
        Decoder::new(Eager)
    }
}

impl<'a> Decoder<Lazy<'a>> {
    /// A decoder whose records will borrow `source`
    pub fn lazy(source: &'a [u8]) -> LazyDecoder<'a> {
        Decoder::new(Lazy::new(source))
    }
}

impl<S: Storage> Decoder<S> {

    pub fn new(store: S) -> Self {
        Decoder {
            store:    store,
            sequence: Sequence::default(),
        }
    }

    /// Starts labelling at `sequence` instead of zero
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = sequence;
        self
    }

    /// Labels the next records will receive
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }

    pub fn storage(&self) -> &S {
        &self.store
    }

    /// Decodes the block record at the buffer's position, including the
    /// magic and size prefix and all its transactions
    pub fn decode_block(&mut self, buf: &mut Buffer) -> Result<Block<S>> {
        self.atomically(buf, Self::read_block)
    }

    pub fn decode_transaction(&mut self, buf: &mut Buffer) -> Result<Transaction<S>> {
        self.atomically(buf, Self::read_transaction)
    }

    pub fn decode_input(&mut self, buf: &mut Buffer) -> Result<TxInput<S>> {
        self.atomically(buf, Self::read_input)
    }

    pub fn decode_output(&mut self, buf: &mut Buffer) -> Result<TxOutput<S>> {
        self.atomically(buf, Self::read_output)
    }


    /// Runs `read`; on failure restores the buffer and the labels
    fn atomically<'b, T, F>(&mut self, buf: &mut Buffer<'b>, read: F) -> Result<T>
        where F: FnOnce(&mut Self, &mut Buffer<'b>) -> Result<T>
    {
        if !self.store.accepts(buf.source()) {
            return Err(Error::ForeignSource);
        }

        let mark = *buf;
        let sequence = self.sequence;

        let result = read(self, buf);
        if result.is_err() {
            *buf = mark;
            self.sequence = sequence;
        }
        result
    }

    fn read_block(&mut self, buf: &mut Buffer) -> Result<Block<S>> {
        let start = buf.position();

        let mut fields = Vec::with_capacity(layout::block::FIELDS.len());
        let tx_count = self.read_fields(buf, &layout::block::FIELDS, &mut fields)?;

        let mut txs = Vec::with_capacity(capacity(tx_count, MIN_TRANSACTION_LEN, buf));
        for _ in 0..tx_count {
            txs.push(self.read_transaction(buf)?);
        }

        let index = self.sequence.block;
        self.sequence.block += 1;

        Ok(Block::new(fields, txs, start, buf.position(), index, self.store.clone()))
    }

    fn read_transaction(&mut self, buf: &mut Buffer) -> Result<Transaction<S>> {
        use crate::layout::transaction::*;

        let start = buf.position();
        let mut fields = Vec::with_capacity(FIELDS.len());

        let input_count = self.read_fields(buf, &FIELDS[..=INPUT_COUNT], &mut fields)?;
        let mut inputs = Vec::with_capacity(capacity(input_count, MIN_INPUT_LEN, buf));
        for _ in 0..input_count {
            inputs.push(self.read_input(buf)?);
        }

        let output_count = self.read_fields(buf, &FIELDS[OUTPUT_COUNT..=OUTPUT_COUNT], &mut fields)?;
        let mut outputs = Vec::with_capacity(capacity(output_count, MIN_OUTPUT_LEN, buf));
        for _ in 0..output_count {
            outputs.push(self.read_output(buf)?);
        }

        self.read_fields(buf, &FIELDS[LOCK_TIME..], &mut fields)?;

        let index = self.sequence.transaction;
        self.sequence.transaction += 1;

        Ok(Transaction::new(fields, inputs, outputs, start, buf.position(), index, self.store.clone()))
    }

    fn read_input(&mut self, buf: &mut Buffer) -> Result<TxInput<S>> {
        let start = buf.position();
        let mut fields = Vec::with_capacity(layout::input::FIELDS.len());
        self.read_fields(buf, &layout::input::FIELDS, &mut fields)?;

        Ok(TxInput::new(fields, start, buf.position(), self.store.clone()))
    }

    fn read_output(&mut self, buf: &mut Buffer) -> Result<TxOutput<S>> {
        let start = buf.position();
        let mut fields = Vec::with_capacity(layout::output::FIELDS.len());
        self.read_fields(buf, &layout::output::FIELDS, &mut fields)?;

        Ok(TxOutput::new(fields, start, buf.position(), self.store.clone()))
    }

    /// Reads the fields of `table` in order and keeps them in `fields`
    ///
    /// Returns the value of the last compact size read, which is the count
    /// for whatever follows the table.
    fn read_fields(&self, buf: &mut Buffer, table: &[FieldSpec], fields: &mut Vec<S::Field>)
        -> Result<u64>
    {
        let mut count = 0;

        for spec in table {
            let start = buf.position();
            let bytes = match spec.width {
                Width::Fixed(len) => buf.read_next(len)?,
                Width::CompactSize => {
                    count = CompactSize::parse(buf)?.value;
                    buf.consumed_since(start)
                },
                Width::Counted => {
                    let len = usize::try_from(count).unwrap_or(usize::max_value());
                    buf.read_next(len)?
                },
            };
            fields.push(self.store.keep(start, bytes));
        }
        Ok(count)
    }
}

/// Smallest encodings: no inputs or outputs, and empty scripts
const MIN_TRANSACTION_LEN: usize = 4 + 1 + 1 + 4;
const MIN_INPUT_LEN: usize = layout::HASH_LEN + 4 + 1 + 4;
const MIN_OUTPUT_LEN: usize = 8 + 1;

/// Upper bound on the records reserved up front; larger counts grow the
/// vector as records are actually decoded
const MAX_RESERVED: usize = 4096;

/// Room to reserve for `count` records of at least `min_len` bytes each
///
/// A corrupt count must not cause a huge allocation before decoding fails.
fn capacity(count: u64, min_len: usize, buf: &Buffer) -> usize {
    let fit = (buf.remaining() / min_len) as u64;
    count.min(fit).min(MAX_RESERVED as u64) as usize
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutOfRange;

    // one input with a 2 byte script, one output with a 1 byte script
    const TX: &'static [u8] = &[
        1, 0, 0, 0,
        1,
        0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
        0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
        0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
        0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
        3, 0, 0, 0,
        2, 0x51, 0x52,
        0xff, 0xff, 0xff, 0xff,
        1,
        0x00, 0xe1, 0xf5, 0x05, 0, 0, 0, 0,
        1, 0x6a,
        0, 0, 0, 0,
    ];

    #[test]
    fn test_decode_transaction() {
        let mut buf = Buffer::new(TX);
        let mut decoder = Decoder::eager();

        let tx = decoder.decode_transaction(&mut buf).unwrap();
        assert_eq!(tx.version(), 1);
        assert_eq!(tx.inputs().len(), 1);
        assert_eq!(tx.inputs()[0].prev_output_index(), 3);
        assert_eq!(tx.inputs()[0].script(), &[0x51, 0x52]);
        assert_eq!(tx.outputs()[0].value(), 100_000_000);
        assert_eq!(tx.outputs()[0].script(), &[0x6a]);
        assert_eq!((tx.start(), tx.end()), (0, TX.len()));
        assert!(buf.is_at_end());

        assert_eq!(decoder.sequence(), Sequence { block: 0, transaction: 1 });
    }

    #[test]
    fn test_lazy_spans() {
        let mut buf = Buffer::new(TX);
        let mut decoder = Decoder::lazy(TX);

        let tx = decoder.decode_transaction(&mut buf).unwrap();
        let input = &tx.inputs()[0];
        assert_eq!((input.start(), input.end()), (5, 5 + 32 + 4 + 1 + 2 + 4));
        assert_eq!(input.script(), &[0x51, 0x52]);
    }

    #[test]
    fn test_truncated_is_atomic() {
        let short = &TX[..TX.len() - 1];
        let mut buf = Buffer::new(short);
        let mut decoder = Decoder::eager().with_sequence(Sequence { block: 7, transaction: 9 });

        match decoder.decode_transaction(&mut buf) {
            Err(Error::OutOfRange(OutOfRange { position, requested, .. })) => {
                assert_eq!(position, TX.len() - 4);
                assert_eq!(requested, 4);
            },
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(buf.position(), 0);
        assert_eq!(decoder.sequence(), Sequence { block: 7, transaction: 9 });
    }

    #[test]
    fn test_foreign_source() {
        let copy = TX.to_vec();
        let mut buf = Buffer::new(&copy);
        let mut decoder = Decoder::lazy(TX);

        match decoder.decode_transaction(&mut buf) {
            Err(Error::ForeignSource) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_capacity_is_bounded() {
        let bytes = vec![0u8; 1000];
        let buf = Buffer::new(&bytes);

        assert_eq!(capacity(3, MIN_TRANSACTION_LEN, &buf), 3);
        assert_eq!(capacity(u64::max_value(), MIN_TRANSACTION_LEN, &buf), 100);
        assert_eq!(capacity(u64::max_value(), MIN_INPUT_LEN, &buf), 1000 / 41);
        assert_eq!(capacity(u64::max_value(), MIN_OUTPUT_LEN, &Buffer::at(&bytes, 1000)), 0);

        let large = vec![0u8; 1 << 20];
        assert_eq!(capacity(u64::max_value(), MIN_OUTPUT_LEN, &Buffer::new(&large)), MAX_RESERVED);
    }

    #[test]
    fn test_inputs_and_outputs_alone() {
        let mut decoder = Decoder::eager();

        let mut buf = Buffer::at(TX, 5);
        let input = decoder.decode_input(&mut buf).unwrap();
        assert_eq!(input.sequence(), 0xffff_ffff);

        buf.skip(1).unwrap();
        let output = decoder.decode_output(&mut buf).unwrap();
        assert_eq!(output.script_len(), 1);
        assert_eq!(buf.remaining(), 4);
    }
}
