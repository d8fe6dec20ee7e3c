//! Flat export of records
//!
//! Turns any record into an ordered list of named values, for writing rows
//! of csv or json. Stored fields are named as in `layout`; some derived
//! values (`hash`, `time`, offsets, ...) can be asked for as well.

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::block::Block;
use crate::compact_size;
use crate::error::{Error, Result};
use crate::layout::{self, FieldSpec, Transform, Width};
use crate::script::Script;
use crate::storage::Storage;
use crate::transaction::{Transaction, TxInput, TxOutput};
use crate::util;


#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(u64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
}

/// Named values in the order they were asked for
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatRecord {
    entries: Vec<(String, FieldValue)>,
}

impl FlatRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter()
            .find(|&&(ref n, _)| n == name)
            .map(|&(_, ref v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|&(ref n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.entries.iter()
    }
}

impl Serialize for FlatRecord {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> ::std::result::Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for &(ref name, ref value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}


/// Interprets the stored bytes of a field according to its layout entry
pub(crate) fn stored_value(spec: &FieldSpec, bytes: &[u8]) -> FieldValue {
    match (spec.transform, spec.width) {
        (Transform::Integer, Width::CompactSize) =>
            FieldValue::Int(compact_size::field_value(bytes)),
        (Transform::Integer, _) if bytes.is_empty() =>
            FieldValue::Int(0),
        (Transform::Integer, _) =>
            FieldValue::Int(LittleEndian::read_uint(bytes, bytes.len().min(8))),
        (Transform::ReversedHex, _) =>
            FieldValue::Text(util::to_hex_rev(bytes)),
        (Transform::Hex, _) =>
            FieldValue::Text(util::to_hex(bytes)),
        (Transform::Script, _) =>
            FieldValue::Text(Script(bytes).to_string()),
    }
}

/// Records that can be exported as a `FlatRecord`
pub trait FlatExport {

    /// Layout of the stored fields
    const TABLE: &'static [FieldSpec];

    /// Names of values computed from the stored fields
    const DERIVED: &'static [&'static str];

    /// Stored bytes of the field at `index` in `TABLE`
    fn stored(&self, index: usize) -> &[u8];

    /// Value of a derived name, or None if the name is not derived
    fn derived(&self, name: &str) -> Option<FieldValue>;

    /// All names `to_flat_record` accepts, stored fields first
    fn field_names() -> Vec<&'static str> {
        Self::TABLE.iter().map(|f| f.name)
            .chain(Self::DERIVED.iter().cloned())
            .collect()
    }

    fn flat_value(&self, name: &str) -> Option<FieldValue> {
        match layout::index_of(Self::TABLE, name) {
            Some(index) => Some(stored_value(&Self::TABLE[index], self.stored(index))),
            None        => self.derived(name),
        }
    }

    /// Exports the values called `names`, in that order
    ///
    /// Fails with `UnknownField` on the first name that is neither stored
    /// nor derived.
    fn to_flat_record(&self, names: &[&str]) -> Result<FlatRecord> {
        let mut entries = Vec::with_capacity(names.len());
        for &name in names {
            let value = self.flat_value(name)
                .ok_or_else(|| Error::UnknownField(name.to_string()))?;
            entries.push((name.to_string(), value));
        }
        Ok(FlatRecord { entries: entries })
    }
}


impl<S: Storage> FlatExport for Block<S> {
    const TABLE: &'static [FieldSpec] = &layout::block::FIELDS;
    const DERIVED: &'static [&'static str] = &["hash", "time", "start", "end", "index"];

    fn stored(&self, index: usize) -> &[u8] {
        self.field(index)
    }

    fn derived(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "hash"  => FieldValue::Text(self.hash().to_hex()),
            "time"  => FieldValue::Time(self.time()),
            "start" => FieldValue::Int(self.start() as u64),
            "end"   => FieldValue::Int(self.end() as u64),
            "index" => FieldValue::Int(self.index() as u64),
            _       => return None,
        })
    }
}

impl<S: Storage> FlatExport for Transaction<S> {
    const TABLE: &'static [FieldSpec] = &layout::transaction::FIELDS;
    const DERIVED: &'static [&'static str] = &["hash", "start", "end", "index"];

    fn stored(&self, index: usize) -> &[u8] {
        self.field(index)
    }

    fn derived(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "hash"  => FieldValue::Text(self.hash().to_hex()),
            "start" => FieldValue::Int(self.start() as u64),
            "end"   => FieldValue::Int(self.end() as u64),
            "index" => FieldValue::Int(self.index() as u64),
            _       => return None,
        })
    }
}

impl<S: Storage> FlatExport for TxInput<S> {
    const TABLE: &'static [FieldSpec] = &layout::input::FIELDS;
    const DERIVED: &'static [&'static str] = &["start", "end"];

    fn stored(&self, index: usize) -> &[u8] {
        self.field(index)
    }

    fn derived(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "start" => FieldValue::Int(self.start() as u64),
            "end"   => FieldValue::Int(self.end() as u64),
            _       => return None,
        })
    }
}

impl<S: Storage> FlatExport for TxOutput<S> {
    const TABLE: &'static [FieldSpec] = &layout::output::FIELDS;
    const DERIVED: &'static [&'static str] = &["value_btc", "output_address", "start", "end"];

    fn stored(&self, index: usize) -> &[u8] {
        self.field(index)
    }

    /// Scripts without an address export an empty `output_address`
    fn derived(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "value_btc"      => FieldValue::Float(self.value_btc()),
            "output_address" => FieldValue::Text(self.output_address().unwrap_or_default()),
            "start"          => FieldValue::Int(self.start() as u64),
            "end"            => FieldValue::Int(self.end() as u64),
            _                => return None,
        })
    }
}
