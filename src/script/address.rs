//! Addresses of output scripts
//!
//! Only pay-to-pubkey and pay-to-pubkey-hash scripts have an address here;
//! both are shown as the base58check encoded pubkey hash with version 0.

use crate::hash::{double_sha256, hash160};

use super::opcode::*;
use super::{Instructions, Op};

const ADDRESS_VERSION: u8 = 0x00;

/// What an output script pays to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    /// `<pubkey> OP_CHECKSIG`
    PubKey(&'a [u8]),

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash(&'a [u8]),
}

impl<'a> Destination<'a> {
    /// The 20 byte hash that is encoded in the address
    pub fn pubkey_hash(&self) -> [u8; 20] {
        match *self {
            Destination::PubKey(key) => hash160(key),
            Destination::PubKeyHash(hash) => {
                let mut result = [0; 20];
                result.copy_from_slice(hash);
                result
            }
        }
    }
}

/// Recognizes the standard script forms that have an address
pub fn destination(script: &[u8]) -> Option<Destination> {
    let ops: Vec<Op> = Instructions::new(script).collect::<Result<_, _>>().ok()?;

    match ops.as_slice() {
        [Op::Push(key), Op::Code(OP_CHECKSIG)]
            if key.len() == 33 || key.len() == 65 =>
            Some(Destination::PubKey(*key)),

        [Op::Code(OP_DUP), Op::Code(OP_HASH160), Op::Push(hash),
         Op::Code(OP_EQUALVERIFY), Op::Code(OP_CHECKSIG)]
            if hash.len() == 20 =>
            Some(Destination::PubKeyHash(*hash)),

        _ => None,
    }
}

/// Base58check encoding of a version 0 pubkey hash
pub fn p2pkh_address(pubkey_hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(25);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(pubkey_hash);

    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[0..4]);

    bs58::encode(payload).into_string()
}

/// Address of an output script, or None for scripts without one
pub fn output_address(script: &[u8]) -> Option<String> {
    destination(script).map(|dest| p2pkh_address(&dest.pubkey_hash()))
}
