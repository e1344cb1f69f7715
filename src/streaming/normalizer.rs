//! Byte Normalizer
//!
//! Maps every raw byte to either "discard" or a canonical byte:
//! - NUL is discarded, so UTF-16LE text reads like ASCII
//! - ASCII punctuation is discarded
//! - `a`..=`z` fold to uppercase
//! - everything else passes through unchanged
//!
//! The mapping is a 256-entry table built at compile time, so the hot path
//! is a single indexed load per byte.

/// Marks a discarded byte in [`CANONICAL`]. NUL is itself discarded, so it
/// can double as the sentinel.
const DISCARD: u8 = 0;

/// Punctuation removed from the stream before windowing
pub const DISCARDED_PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let byte = i as u8;
        table[i] = if byte.is_ascii_lowercase() {
            byte & !0x20
        } else {
            byte
        };
        i += 1;
    }

    let mut j = 0;
    while j < DISCARDED_PUNCTUATION.len() {
        table[DISCARDED_PUNCTUATION[j] as usize] = DISCARD;
        j += 1;
    }
    table[0] = DISCARD;
    table
}

static CANONICAL: [u8; 256] = build_table();

/// Canonical form of `byte`, or `None` if the byte is discarded
#[inline(always)]
pub fn canonicalize(byte: u8) -> Option<u8> {
    match CANONICAL[byte as usize] {
        DISCARD => None,
        canonical => Some(canonical),
    }
}

/// Whether `byte` can ever appear in a window
///
/// Dictionary entries containing a byte for which this is false can be
/// stored but never match.
#[inline]
pub fn is_canonical(byte: u8) -> bool {
    canonicalize(byte) == Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nul_discarded() {
        assert_eq!(canonicalize(0), None);
    }

    #[test]
    fn test_punctuation_discarded() {
        for &b in DISCARDED_PUNCTUATION {
            assert_eq!(canonicalize(b), None, "byte {:#04x} should be discarded", b);
        }
        assert_eq!(DISCARDED_PUNCTUATION.len(), 32);
    }

    #[test]
    fn test_lowercase_folded() {
        for b in b'a'..=b'z' {
            assert_eq!(canonicalize(b), Some(b.to_ascii_uppercase()));
        }
    }

    #[test]
    fn test_passthrough() {
        for &b in b"AZ09 \t\n\r" {
            assert_eq!(canonicalize(b), Some(b));
        }
        assert_eq!(canonicalize(0x7f), Some(0x7f));
        // High bytes are not case folded
        assert_eq!(canonicalize(0xe1), Some(0xe1));
        assert_eq!(canonicalize(0xff), Some(0xff));
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical(b'A'));
        assert!(is_canonical(b'7'));
        assert!(!is_canonical(b'a'));
        assert!(!is_canonical(b'-'));
        assert!(!is_canonical(0));
    }
}
