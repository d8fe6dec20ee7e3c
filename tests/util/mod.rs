//! Fixtures shared by the integration tests
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

use bitcrust_blk::compact_size::CompactSize;
use bitcrust_blk::util::from_hex;

pub const GENESIS_HASH: &'static str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
pub const GENESIS_ADDRESS: &'static str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

/// Length of the genesis record including magic and size
pub const GENESIS_RECORD_LEN: usize = 293;

const GENESIS_HEX: &'static str = "f9beb4d9 1d010000
    0100000000000000000000000000000000000000000000000000000000000000
    000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa
    4b1e5e4a29ab5f49ffff001d1dac2b7c01010000000100000000000000000000
    00000000000000000000000000000000000000000000ffffffff4d04ffff001d
    0104455468652054696d65732030332f4a616e2f32303039204368616e63656c
    6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f75742066
    6f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe554827
    1967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4
    f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

/// The mainnet genesis block record, as stored in blk00000.dat
pub fn genesis() -> Vec<u8> {
    from_hex(GENESIS_HEX).expect("genesis hex is valid")
}

pub const MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

pub fn input(prev: [u8; 32], index: u32, script: &[u8], sequence: u32) -> Vec<u8> {
    let mut result = prev.to_vec();
    result.write_u32::<LittleEndian>(index).unwrap();
    CompactSize::encode(script.len() as u64, &mut result);
    result.extend_from_slice(script);
    result.write_u32::<LittleEndian>(sequence).unwrap();
    result
}

pub fn output(value: u64, script: &[u8]) -> Vec<u8> {
    let mut result = vec![];
    result.write_u64::<LittleEndian>(value).unwrap();
    CompactSize::encode(script.len() as u64, &mut result);
    result.extend_from_slice(script);
    result
}

pub fn transaction(version: u32, inputs: &[Vec<u8>], outputs: &[Vec<u8>], lock_time: u32) -> Vec<u8> {
    let mut result = vec![];
    result.write_u32::<LittleEndian>(version).unwrap();
    CompactSize::encode(inputs.len() as u64, &mut result);
    for i in inputs {
        result.extend_from_slice(i);
    }
    CompactSize::encode(outputs.len() as u64, &mut result);
    for o in outputs {
        result.extend_from_slice(o);
    }
    result.write_u32::<LittleEndian>(lock_time).unwrap();
    result
}

/// Pay-to-pubkey-hash locking script
pub fn p2pkh_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = vec![0x76, 0xa9, 20];
    script.extend_from_slice(hash);
    script.extend_from_slice(&[0x88, 0xac]);
    script
}

pub fn coinbase(height: u8, value: u64) -> Vec<u8> {
    transaction(1,
        &[input([0; 32], 0xffff_ffff, &[0x01, height], 0xffff_ffff)],
        &[output(value, &p2pkh_script(&[height; 20]))],
        0)
}

/// Block record with magic and a correct size
pub fn block(prev: [u8; 32], timestamp: u32, nonce: u32, txs: &[Vec<u8>]) -> Vec<u8> {
    let mut body = vec![];
    body.write_u32::<LittleEndian>(1).unwrap();
    body.extend_from_slice(&prev);
    body.extend_from_slice(&[nonce as u8; 32]);
    body.write_u32::<LittleEndian>(timestamp).unwrap();
    body.write_u32::<LittleEndian>(0x1d00ffff).unwrap();
    body.write_u32::<LittleEndian>(nonce).unwrap();
    CompactSize::encode(txs.len() as u64, &mut body);
    for tx in txs {
        body.extend_from_slice(tx);
    }

    let mut record = MAGIC.to_vec();
    record.write_u32::<LittleEndian>(body.len() as u32).unwrap();
    record.extend_from_slice(&body);
    record
}

/// Genesis followed by `count` small blocks with two transactions each
pub fn small_chain(count: u8) -> Vec<u8> {
    let mut archive = genesis();
    for n in 1..=count {
        let spend = transaction(2,
            &[input([n; 32], 1, &[0x47; 0x48], 0xffff_fffe)],
            &[output(1_000, &p2pkh_script(&[0xab; 20])), output(2_000, &[0x6a, 0x01, n])],
            n as u32);
        archive.extend(block([n; 32], 1_300_000_000 + n as u32, n as u32, &[coinbase(n, 5_000_000_000), spend]));
    }
    archive
}

/// Offset of the byte after the `n` first records of `archive`
pub fn record_end(archive: &[u8], n: usize) -> usize {
    let mut pos = 0;
    for _ in 0..n {
        let size = (&archive[pos + 4..pos + 8]).iter().rev().fold(0usize, |acc, &b| acc * 256 + b as usize);
        pos += 8 + size;
    }
    pos
}
