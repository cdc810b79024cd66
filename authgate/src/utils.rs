use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;

pub(crate) fn base64url_encode(input: Vec<u8>) -> Result<String, UtilError> {
    Ok(URL_SAFE_NO_PAD.encode(input))
}

/// Random base64url string from `len` bytes of system entropy. Used for PKCE
/// verifier material.
pub(crate) fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
    let encoded = base64url_encode(buf)
        .map_err(|_| UtilError::Crypto("Failed to encode random string".to_string()))?;
    Ok(encoded)
}

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_random_string_length() {
        // 32 bytes encode to 43 base64url chars without padding
        let s = gen_random_string(32).unwrap();
        assert_eq!(s.len(), 43);
        assert!(!s.contains('='));
        assert!(!s.contains('+'));
        assert!(!s.contains('/'));
    }

    #[test]
    fn test_gen_random_string_unique() {
        let a = gen_random_string(16).unwrap();
        let b = gen_random_string(16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_base64url_encode_known_value() {
        let encoded = base64url_encode(b"hello".to_vec()).unwrap();
        assert_eq!(encoded, "aGVsbG8");
    }
}
