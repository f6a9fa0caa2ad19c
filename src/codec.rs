//! Binary transport codec.
//!
//! Raw bytes are carried through storage as standard-alphabet, padded
//! base64. Decoding is strict: non-canonical trailing bits and foreign
//! characters are rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::VaultError;

/// Encode bytes as standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 back into bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, VaultError> {
    Ok(STANDARD.decode(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(encode(b"hello vault"), "aGVsbG8gdmF1bHQ=");
        assert_eq!(decode("aGVsbG8gdmF1bHQ=").unwrap(), b"hello vault");
    }

    #[test]
    fn empty_input() {
        assert_eq!(encode(b""), "");
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_characters() {
        let err = decode("not*base64").unwrap_err();
        assert!(matches!(err, VaultError::MalformedEncoding(_)));
    }

    #[test]
    fn rejects_url_safe_alphabet() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet.
        assert_eq!(encode(&[0xfb, 0xff]), "+/8=");
        assert!(decode("-_8=").is_err());
    }
}
