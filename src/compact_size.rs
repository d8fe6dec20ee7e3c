//! Variable length integers
//!
//! A compact size is a 1, 3, 5 or 9 byte little-endian unsigned integer with
//! a one byte prefix selecting the width.

use byteorder::{ByteOrder, LittleEndian};

use crate::buffer::*;
use crate::error::OutOfRange;

/// A decoded compact size together with the number of bytes it occupied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactSize {
    pub value: u64,
    pub size:  u32,
}

impl<'a> Parse<'a> for CompactSize {

    /// Parse a compact size
    fn parse(buf: &mut Buffer<'a>) -> Result<CompactSize, OutOfRange> {
        let byte1 = u8::parse(buf)?;
        Ok(match byte1 {
            0xff => CompactSize { value: u64::parse(buf)?,        size: 9 },
            0xfe => CompactSize { value: u32::parse(buf)? as u64, size: 5 },
            0xfd => CompactSize { value: u16::parse(buf)? as u64, size: 3 },
            _    => CompactSize { value: byte1 as u64,            size: 1 },
        })
    }
}

impl CompactSize {

    /// Reinterprets the bytes of a compact size field that was already
    /// consumed by `parse`; None if they are incomplete
    pub fn from_field(bytes: &[u8]) -> Option<CompactSize> {
        CompactSize::parse(&mut Buffer::new(bytes)).ok()
    }

    /// Appends the shortest encoding of `value`
    pub fn encode(value: u64, buffer: &mut Vec<u8>) {
        let mut tmp = [0u8; 8];
        if value < 0xFD {
            buffer.push(value as u8);
        }
        else if value <= 0xFFFF {
            buffer.push(0xFD);
            LittleEndian::write_u16(&mut tmp, value as u16);
            buffer.extend_from_slice(&tmp[..2]);
        }
        else if value <= 0xFFFF_FFFF {
            buffer.push(0xFE);
            LittleEndian::write_u32(&mut tmp, value as u32);
            buffer.extend_from_slice(&tmp[..4]);
        }
        else {
            buffer.push(0xFF);
            LittleEndian::write_u64(&mut tmp, value);
            buffer.extend_from_slice(&tmp);
        }
    }

    /// Number of bytes `encode` uses for `value`
    pub fn encoded_len(value: u64) -> u32 {
        match value {
            0..=0xFC              => 1,
            0xFD..=0xFFFF         => 3,
            0x1_0000..=0xFFFF_FFFF => 5,
            _                     => 9,
        }
    }
}

/// Value of a decoded compact size field
///
/// Decoded records only hold complete fields; a short one counts as zero.
pub(crate) fn field_value(bytes: &[u8]) -> u64 {
    CompactSize::from_field(bytes).map_or(0, |cs| cs.value)
}


#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(value: u64) -> (CompactSize, Vec<u8>) {
        let mut bytes = vec![];
        CompactSize::encode(value, &mut bytes);
        let mut buf = Buffer::new(&bytes);
        let cs = CompactSize::parse(&mut buf).unwrap();
        assert_eq!(buf.position(), cs.size as usize);
        (cs, bytes)
    }

    #[test]
    fn test_fixture_fd() {
        let bytes = [0xFD, 0x40, 0x01, 0x04, 0xE3, 0x76, 0x40];
        let mut buf = Buffer::new(&bytes);

        let cs = CompactSize::parse(&mut buf).unwrap();
        assert_eq!(cs, CompactSize { value: 0x0140, size: 3 });
        assert_eq!(cs.value, 320);
        assert_eq!(buf.position(), 3);
        assert_eq!(buf.rest(), &[0x04, 0xE3, 0x76, 0x40]);
    }

    #[test]
    fn test_boundaries() {
        for &(value, size, prefix) in &[
            (0u64,               1u32, 0u8),
            (252,                1,    252),
            (253,                3,    0xFD),
            (0xFFFF,             3,    0xFD),
            (0x1_0000,           5,    0xFE),
            (0xFFFF_FFFF,        5,    0xFE),
            (0x1_0000_0000,      9,    0xFF),
            (u64::max_value(),   9,    0xFF),
        ] {
            let (cs, bytes) = round_trip(value);
            assert_eq!(cs, CompactSize { value: value, size: size });
            assert_eq!(bytes[0], prefix);
            assert_eq!(CompactSize::encoded_len(value), size);
            assert_eq!(CompactSize::from_field(&bytes), Some(cs));
        }
    }

    #[test]
    fn test_from_short_field() {
        assert_eq!(CompactSize::from_field(&[]), None);
        assert_eq!(CompactSize::from_field(&[0xfd]), None);
        assert_eq!(CompactSize::from_field(&[0xff, 1, 2, 3]), None);
        assert_eq!(CompactSize::from_field(&[0x2a]), Some(CompactSize { value: 42, size: 1 }));
    }

    #[test]
    fn test_truncated() {
        let mut buf = Buffer::new(&[0xFE, 0x01, 0x02]);
        let err = CompactSize::parse(&mut buf).unwrap_err();
        assert_eq!(err.position, 1);
        assert_eq!(err.requested, 4);
    }

    proptest! {
        #[test]
        fn prop_single_byte(v in 0u64..=252) {
            let (cs, bytes) = round_trip(v);
            prop_assert_eq!(cs, CompactSize { value: v, size: 1 });
            prop_assert_eq!(bytes.len(), 1);
        }

        #[test]
        fn prop_three_bytes(v in 253u64..=0xFFFF) {
            let (cs, bytes) = round_trip(v);
            prop_assert_eq!(cs, CompactSize { value: v, size: 3 });
            prop_assert_eq!(bytes[0], 0xFD);
        }

        #[test]
        fn prop_five_bytes(v in 0x1_0000u64..=0xFFFF_FFFF) {
            let (cs, bytes) = round_trip(v);
            prop_assert_eq!(cs, CompactSize { value: v, size: 5 });
            prop_assert_eq!(bytes[0], 0xFE);
        }

        #[test]
        fn prop_nine_bytes(v in 0x1_0000_0000u64..) {
            let (cs, bytes) = round_trip(v);
            prop_assert_eq!(cs, CompactSize { value: v, size: 9 });
            prop_assert_eq!(bytes[0], 0xFF);
        }
    }
}
