//! Password hashing with Argon2id.
//!
//! Parameters: 64 MiB memory, 3 iterations, 4 lanes. The PHC string embeds
//! the parameters and salt, so verification needs nothing else.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Memory cost in KiB (64 MiB).
const MEMORY_COST_KIB: u32 = 65_536;
/// Number of passes over memory.
const TIME_COST: u32 = 3;
/// Degree of parallelism.
const PARALLELISM: u32 = 4;

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC verifier string.
///
/// # Errors
///
/// Returns `AuthError::EmptyPassword` if the password is empty or only
/// whitespace.
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.trim().is_empty() {
        return Err(AuthError::EmptyPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Check a password against a stored verifier.
///
/// Any failure (blank input, malformed hash, mismatch) is `false`.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    if password.trim().is_empty() || hash.trim().is_empty() {
        return false;
    }

    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("Correct-Horse1!").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
        assert!(verify_password(&hash, "Correct-Horse1!"));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("Correct-Horse1!").unwrap();
        assert!(!verify_password(&hash, "Correct-Horse2!"));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("Repeat-Me1!").unwrap();
        let b = hash_password("Repeat-Me1!").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "Repeat-Me1!"));
        assert!(verify_password(&b, "Repeat-Me1!"));
    }

    #[test]
    fn test_blank_password_cannot_be_hashed() {
        assert!(matches!(hash_password(""), Err(AuthError::EmptyPassword)));
        assert!(matches!(hash_password("   "), Err(AuthError::EmptyPassword)));
    }

    #[test]
    fn test_verify_rejects_blank_or_malformed_input() {
        assert!(!verify_password("", "Password1!"));
        assert!(!verify_password("not-a-phc-string", "Password1!"));
        assert!(!verify_password("$argon2id$v=19$m=65536,t=3,p=4$abc$def", ""));
    }
}
