//! General utility functions


pub fn to_hex(buf: &[u8]) -> String {
    buf
        .iter()
        .map(|n| format!("{:02x}", n))
        .collect::<Vec<_>>()
        .concat()
}

pub fn to_hex_rev(buf: &[u8]) -> String {
    buf
        .iter()
        .rev()
        .map(|n| format!("{:02x}", n))
        .collect::<Vec<_>>()
        .concat()
}


/// Decodes hex; whitespace is skipped. Returns None on any other non-hex
/// character or an odd number of digits
pub fn from_hex(str: &str) -> Option<Vec<u8>> {

    // This may be an overestimate if there is any whitespace
    let mut b = Vec::with_capacity(str.len() / 2);
    let mut modulus = 0;
    let mut buf = 0u8;

    for byte in str.bytes() {
        buf <<= 4;

        match byte {
            b'A'..=b'F' => buf |= byte - b'A' + 10,
            b'a'..=b'f' => buf |= byte - b'a' + 10,
            b'0'..=b'9' => buf |= byte - b'0',
            b' '|b'\r'|b'\n'|b'\t' => {
                buf >>= 4;
                continue
            }
            _ => return None
        }

        modulus += 1;
        if modulus == 2 {
            modulus = 0;
            b.push(buf);
        }
    }

    if modulus != 0 {
        return None;
    }
    Some(b)
}

/// Useful to keep hashes in the same format as usually printed
pub fn from_hex_rev(str: &str) -> Option<Vec<u8>> {
    let mut v = from_hex(str)?;
    v.reverse();
    Some(v)
}


/// Mainnet genesis block record, including magic and size
#[cfg(test)]
pub(crate) const GENESIS_BLOCK_HEX: &'static str = "f9beb4d91d010000\
    0100000000000000000000000000000000000000000000000000000000000000\
    000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa\
    4b1e5e4a29ab5f49ffff001d1dac2b7c01010000000100000000000000000000\
    00000000000000000000000000000000000000000000ffffffff4d04ffff001d\
    0104455468652054696d65732030332f4a616e2f32303039204368616e63656c\
    6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f75742066\
    6f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe554827\
    1967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4\
    f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(from_hex("00ff 1A\n"), Some(vec![0x00, 0xff, 0x1a]));
        assert_eq!(from_hex("0g"), None);
        assert_eq!(from_hex("abc"), None);
        assert_eq!(to_hex(&[0x00, 0xff, 0x1a]), "00ff1a");
        assert_eq!(to_hex_rev(&[0x00, 0xff, 0x1a]), "1aff00");
        assert_eq!(from_hex_rev("00ff1a"), Some(vec![0x1a, 0xff, 0x00]));
    }
}
