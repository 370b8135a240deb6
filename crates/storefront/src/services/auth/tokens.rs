//! Opaque token generation and hashing.
//!
//! Tokens are high-entropy random strings, so a fast unsalted SHA-256 digest
//! is enough to store them; passwords go through [`super::password`].

use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Number of random bytes appended to the UUID.
const RANDOM_BYTES: usize = 32;

/// Generate a new opaque token: a UUID v4 and 32 random bytes (hex), joined
/// by `-`.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}-{}", Uuid::new_v4(), hex::encode(bytes))
}

/// SHA-256 digest of a token, hex encoded.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Check a plain token against a stored digest in constant time.
#[must_use]
pub fn verify_token(hash: &str, token: &str) -> bool {
    constant_time_eq(hash, &hash_token(token))
}

/// Compare two strings without short-circuiting on the first difference.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        // 36-char UUID, a dash, then 64 hex chars
        assert_eq!(token.len(), 36 + 1 + 64);
        assert!(Uuid::parse_str(&token[..36]).is_ok());
        assert!(token[37..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_is_deterministic_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("token"), hash_token("token"));
        assert_ne!(hash_token("token"), hash_token("token2"));
    }

    #[test]
    fn test_verify_token() {
        let token = generate_token();
        let hash = hash_token(&token);
        assert!(verify_token(&hash, &token));
        assert!(!verify_token(&hash, "other"));
        assert!(!verify_token("short", &token));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hell"));
    }
}
