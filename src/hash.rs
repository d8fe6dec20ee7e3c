//! Hashing functions
//!
//! Hashes are kept in stored (internal) byte order. Only formatting reverses
//! them into the usual display order.

use std::fmt::{self, Debug, Display, Formatter};

use ripemd::{Digest, Ripemd160};

use crate::buffer::*;
use crate::error::OutOfRange;
use crate::util;


/// Owned, 32-byte hash value in stored byte order
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Hash([u8; 32]);

impl Hash {

    /// Copies a 32-byte slice into an owned hash
    pub fn from_slice(slice: &[u8]) -> Hash {
        let mut result = Hash([0; 32]);
        result.0.copy_from_slice(&slice[0..32]);
        result
    }

    /// Parses a hash from its display (reversed) hex form
    pub fn from_hex(hex: &str) -> Option<Hash> {
        let bytes = util::from_hex_rev(hex)?;
        if bytes.len() != 32 {
            return None;
        }
        Some(Hash::from_slice(&bytes))
    }

    /// Hashes the input twice with SHA256
    pub fn double_sha256(input: &[u8]) -> Hash {
        Hash(double_sha256(input))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this hash consists only of zeros
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|x| *x == 0)
    }

    /// Display form: byte-reversed hex
    pub fn to_hex(&self) -> String {
        util::to_hex_rev(&self.0)
    }
}

impl<'a> Parse<'a> for Hash {
    fn parse(buffer: &mut Buffer<'a>) -> Result<Hash, OutOfRange> {
        Ok(Hash::from_slice(buffer.read_next(32)?))
    }
}

impl Display for Hash {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(&self.to_hex())
    }
}

impl Debug for Hash {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(&self.to_hex())
    }
}


/// Hashes the input twice with SHA256
pub fn double_sha256(input: &[u8]) -> [u8; 32] {
    let digest1 = ring::digest::digest(&ring::digest::SHA256, input);
    let digest2 = ring::digest::digest(&ring::digest::SHA256, digest1.as_ref());

    let mut result = [0; 32];
    result.copy_from_slice(digest2.as_ref());
    result
}

/// RIPEMD160 of the SHA256 of the input; used for addresses
pub fn hash160(input: &[u8]) -> [u8; 20] {
    let sha = ring::digest::digest(&ring::digest::SHA256, input);

    let mut hasher = Ripemd160::new();
    hasher.update(sha.as_ref());

    let mut result = [0; 20];
    result.copy_from_slice(&hasher.finalize());
    result
}
