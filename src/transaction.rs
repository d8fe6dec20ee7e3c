//! Transactions and their inputs and outputs
//!
//! Like blocks, these keep their fields through a `Storage` and interpret
//! the stored bytes on access.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::compact_size;
use crate::hash::Hash;
use crate::layout;
use crate::script::{address, Script};
use crate::storage::Storage;

const SATOSHIS_PER_BTC: f64 = 100_000_000.0;

/// Decoded transaction
///
/// Fields are kept in the order of `layout::transaction::FIELDS`; the
/// inputs and outputs are stored separately.
#[derive(Clone, Debug)]
pub struct Transaction<S: Storage> {
    fields:  Vec<S::Field>,
    inputs:  Vec<TxInput<S>>,
    outputs: Vec<TxOutput<S>>,

    start:   usize,
    end:     usize,
    index:   usize,

    store:   S,
}

#[derive(Clone, Debug)]
pub struct TxInput<S: Storage> {
    fields: Vec<S::Field>,
    start:  usize,
    end:    usize,
    store:  S,
}

#[derive(Clone, Debug)]
pub struct TxOutput<S: Storage> {
    fields: Vec<S::Field>,
    start:  usize,
    end:    usize,
    store:  S,
}

/// Concatenation of the stored bytes of `fields`
fn concat<S: Storage>(store: &S, fields: &[S::Field], out: &mut Vec<u8>) {
    for field in fields {
        out.extend_from_slice(store.get(field));
    }
}


impl<S: Storage> Transaction<S> {

    pub(crate) fn new(fields: Vec<S::Field>, inputs: Vec<TxInput<S>>, outputs: Vec<TxOutput<S>>,
                      start: usize, end: usize, index: usize, store: S) -> Self {
        Transaction {
            fields:  fields,
            inputs:  inputs,
            outputs: outputs,
            start:   start,
            end:     end,
            index:   index,
            store:   store,
        }
    }

    pub(crate) fn field(&self, index: usize) -> &[u8] {
        self.store.get(&self.fields[index])
    }

    pub fn version(&self) -> u32 {
        LittleEndian::read_u32(self.field(layout::transaction::VERSION))
    }

    pub fn input_count(&self) -> u64 {
        compact_size::field_value(self.field(layout::transaction::INPUT_COUNT))
    }

    pub fn inputs(&self) -> &[TxInput<S>] {
        &self.inputs
    }

    pub fn output_count(&self) -> u64 {
        compact_size::field_value(self.field(layout::transaction::OUTPUT_COUNT))
    }

    pub fn outputs(&self) -> &[TxOutput<S>] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        LittleEndian::read_u32(self.field(layout::transaction::LOCK_TIME))
    }

    /// The serialized transaction, rebuilt from its fields in stored order
    pub fn raw_bytes(&self) -> Vec<u8> {
        use crate::layout::transaction::*;

        let mut result = Vec::with_capacity(self.end - self.start);
        concat(&self.store, &self.fields[..=INPUT_COUNT], &mut result);
        for input in &self.inputs {
            concat(&input.store, &input.fields, &mut result);
        }
        concat(&self.store, &self.fields[OUTPUT_COUNT..=OUTPUT_COUNT], &mut result);
        for output in &self.outputs {
            concat(&output.store, &output.fields, &mut result);
        }
        concat(&self.store, &self.fields[LOCK_TIME..], &mut result);
        result
    }

    pub fn hash(&self) -> Hash {
        Hash::double_sha256(&self.raw_bytes())
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Label assigned by the decoder
    pub fn index(&self) -> usize {
        self.index
    }
}


impl<S: Storage> TxInput<S> {

    pub(crate) fn new(fields: Vec<S::Field>, start: usize, end: usize, store: S) -> Self {
        TxInput { fields: fields, start: start, end: end, store: store }
    }

    pub(crate) fn field(&self, index: usize) -> &[u8] {
        self.store.get(&self.fields[index])
    }

    pub fn prev_output_hash(&self) -> Hash {
        Hash::from_slice(self.field(layout::input::PREV_OUTPUT_HASH))
    }

    pub fn prev_output_index(&self) -> u32 {
        LittleEndian::read_u32(self.field(layout::input::PREV_OUTPUT_INDEX))
    }

    pub fn script_len(&self) -> u64 {
        compact_size::field_value(self.field(layout::input::SCRIPT_LEN))
    }

    /// The signature script
    pub fn script(&self) -> &[u8] {
        self.field(layout::input::SCRIPT)
    }

    pub fn sequence(&self) -> u32 {
        LittleEndian::read_u32(self.field(layout::input::SEQUENCE))
    }

    /// True for the input of a coinbase, which spends nothing
    pub fn is_coinbase(&self) -> bool {
        self.prev_output_hash().is_null() && self.prev_output_index() == 0xffff_ffff
    }

    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.end - self.start);
        concat(&self.store, &self.fields, &mut result);
        result
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

impl<S: Storage> TxOutput<S> {

    pub(crate) fn new(fields: Vec<S::Field>, start: usize, end: usize, store: S) -> Self {
        TxOutput { fields: fields, start: start, end: end, store: store }
    }

    pub(crate) fn field(&self, index: usize) -> &[u8] {
        self.store.get(&self.fields[index])
    }

    /// Value in satoshis
    pub fn value(&self) -> u64 {
        LittleEndian::read_u64(self.field(layout::output::VALUE))
    }

    pub fn value_btc(&self) -> f64 {
        self.value() as f64 / SATOSHIS_PER_BTC
    }

    pub fn script_len(&self) -> u64 {
        compact_size::field_value(self.field(layout::output::SCRIPT_LEN))
    }

    /// The locking script
    pub fn script(&self) -> &[u8] {
        self.field(layout::output::SCRIPT)
    }

    /// Address paid to, for pay-to-pubkey and pay-to-pubkey-hash scripts
    pub fn output_address(&self) -> Option<String> {
        address::output_address(self.script())
    }

    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.end - self.start);
        concat(&self.store, &self.fields, &mut result);
        result
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}


impl<S: Storage> fmt::Display for TxInput<S> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Prev-TX:{}, idx={}, seq={} script={}",
            self.prev_output_hash(),
            self.prev_output_index(),
            self.sequence(),
            Script(self.script()))
    }
}

impl<S: Storage> fmt::Display for TxOutput<S> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "v:{} {}", self.value(), Script(self.script()))
    }
}

impl<S: Storage> fmt::Display for Transaction<S> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        writeln!(fmt, "Transaction {} (version {}, lock time {})",
            self.hash(), self.version(), self.lock_time())?;
        for input in &self.inputs {
            writeln!(fmt, "  in  {}", input)?;
        }
        for output in &self.outputs {
            writeln!(fmt, "  out {}", output)?;
        }
        Ok(())
    }
}
