//! Byte layout of the records in a blk archive
//!
//! Each record kind is described by a table of fields in stored order. The
//! decoder walks these tables, and the flat export uses them to name and
//! interpret fields. Records keep their fields in the same order, so the
//! index of a field in its table is also its index in the record.

/// How many bytes a field occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Fixed(usize),

    /// A compact size prefix (1, 3, 5 or 9 bytes)
    CompactSize,

    /// As many bytes as the value of the preceding compact size field
    Counted,
}

/// How the stored bytes of a field are interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// Little-endian unsigned integer; compact sizes are decoded
    Integer,

    /// Reversed and hex encoded; hashes are displayed this way
    ReversedHex,

    /// Hex encoded as stored
    Hex,

    /// Script, rendered as opcodes and pushes
    Script,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name:      &'static str,
    pub width:     Width,
    pub transform: Transform,
}

impl FieldSpec {
    const fn fixed(name: &'static str, len: usize, transform: Transform) -> FieldSpec {
        FieldSpec { name: name, width: Width::Fixed(len), transform: transform }
    }

    const fn compact(name: &'static str) -> FieldSpec {
        FieldSpec { name: name, width: Width::CompactSize, transform: Transform::Integer }
    }

    const fn counted(name: &'static str) -> FieldSpec {
        FieldSpec { name: name, width: Width::Counted, transform: Transform::Script }
    }
}

/// Position of the field called `name` in `table`
pub fn index_of(table: &[FieldSpec], name: &str) -> Option<usize> {
    table.iter().position(|f| f.name == name)
}


/// Length of the magic number and of the size field that precede each block
pub const MAGIC_LEN: usize = 4;
pub const SIZE_LEN: usize = 4;
pub const RECORD_PREFIX_LEN: usize = MAGIC_LEN + SIZE_LEN;

/// Length of the hashed block header (version up to and including nonce)
pub const HEADER_LEN: usize = 80;

pub const HASH_LEN: usize = 32;


pub mod block {
    use super::*;

    pub const MAGIC:       usize = 0;
    pub const BLOCK_SIZE:  usize = 1;
    pub const VERSION:     usize = 2;
    pub const PREV_HASH:   usize = 3;
    pub const MERKLE_ROOT: usize = 4;
    pub const TIMESTAMP:   usize = 5;
    pub const BITS:        usize = 6;
    pub const NONCE:       usize = 7;
    pub const TX_COUNT:    usize = 8;

    /// Header fields that are hashed into the block hash
    pub const HASHED: ::std::ops::Range<usize> = VERSION..TX_COUNT;

    pub const FIELDS: [FieldSpec; 9] = [
        FieldSpec::fixed("magic",       MAGIC_LEN, Transform::Hex),
        FieldSpec::fixed("block_size",  SIZE_LEN,  Transform::Integer),
        FieldSpec::fixed("version",     4,         Transform::Integer),
        FieldSpec::fixed("prev_hash",   HASH_LEN,  Transform::ReversedHex),
        FieldSpec::fixed("merkle_root", HASH_LEN,  Transform::ReversedHex),
        FieldSpec::fixed("timestamp",   4,         Transform::Integer),
        FieldSpec::fixed("bits",        4,         Transform::Integer),
        FieldSpec::fixed("nonce",       4,         Transform::Integer),
        FieldSpec::compact("tx_count"),
    ];
}

/// Transaction fields; inputs follow `input_count` and outputs follow
/// `output_count`
pub mod transaction {
    use super::*;

    pub const VERSION:      usize = 0;
    pub const INPUT_COUNT:  usize = 1;
    pub const OUTPUT_COUNT: usize = 2;
    pub const LOCK_TIME:    usize = 3;

    pub const FIELDS: [FieldSpec; 4] = [
        FieldSpec::fixed("version",   4, Transform::Integer),
        FieldSpec::compact("input_count"),
        FieldSpec::compact("output_count"),
        FieldSpec::fixed("lock_time", 4, Transform::Integer),
    ];
}

pub mod input {
    use super::*;

    pub const PREV_OUTPUT_HASH:  usize = 0;
    pub const PREV_OUTPUT_INDEX: usize = 1;
    pub const SCRIPT_LEN:        usize = 2;
    pub const SCRIPT:            usize = 3;
    pub const SEQUENCE:          usize = 4;

    pub const FIELDS: [FieldSpec; 5] = [
        FieldSpec::fixed("prev_output_hash",  HASH_LEN, Transform::ReversedHex),
        FieldSpec::fixed("prev_output_index", 4,        Transform::Integer),
        FieldSpec::compact("script_len"),
        FieldSpec::counted("signature_script"),
        FieldSpec::fixed("sequence",          4,        Transform::Integer),
    ];
}

pub mod output {
    use super::*;

    pub const VALUE:      usize = 0;
    pub const SCRIPT_LEN: usize = 1;
    pub const SCRIPT:     usize = 2;

    pub const FIELDS: [FieldSpec; 3] = [
        FieldSpec::fixed("value", 8, Transform::Integer),
        FieldSpec::compact("script_len"),
        FieldSpec::counted("locking_script"),
    ];
}
