//! Password hashing and verification.
//!
//! New passwords are always hashed with Argon2id. Stored credentials written by earlier versions
//! of the platform may be bcrypt hashes or, for some creator accounts, plaintext; both are still
//! accepted when verifying.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::prelude::RngExt;
use rand::rng;

use crate::{config::PasswordConfig, errors::Error};

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Create Argon2 instance with these parameters.
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// How a stored credential is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredFormat {
    Argon2,
    Bcrypt,
    Plaintext,
}

impl StoredFormat {
    /// Detect the format from the PHC / modular-crypt prefix.
    pub fn detect(stored: &str) -> Self {
        if stored.starts_with("$argon2") {
            Self::Argon2
        } else if ["$2a$", "$2b$", "$2x$", "$2y$"].iter().any(|p| stored.starts_with(p)) {
            Self::Bcrypt
        } else {
            Self::Plaintext
        }
    }
}

/// Hash a password using Argon2id.
///
/// Uses the provided parameters or secure defaults if None.
pub fn hash_string_with_params(input: &str, params: Option<Argon2Params>) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.unwrap_or_default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Hash a password using Argon2id with default secure parameters.
pub fn hash_string(input: &str) -> Result<String, Error> {
    hash_string_with_params(input, None)
}

/// Verify a password against whatever is stored for the account.
///
/// Argon2 verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, stored: &str) -> Result<bool, Error> {
    match StoredFormat::detect(stored) {
        StoredFormat::Argon2 => {
            let parsed_hash = PasswordHash::new(stored).map_err(|e| Error::Internal {
                operation: format!("parse hash: {e}"),
            })?;
            Ok(Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok())
        }
        StoredFormat::Bcrypt => bcrypt::verify(input, stored).map_err(|e| Error::Internal {
            operation: format!("verify bcrypt hash: {e}"),
        }),
        StoredFormat::Plaintext => Ok(constant_time_eq(input.as_bytes(), stored.as_bytes())),
    }
}

/// Hash on a blocking thread so Argon2 does not stall the async runtime.
pub async fn hash_blocking(password: String, params: Argon2Params) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Verify on a blocking thread so Argon2 and bcrypt do not stall the async runtime.
pub async fn verify_blocking(password: String, stored: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify_string(&password, &stored))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Check a candidate password against the configured length rules.
pub fn validate_length(password: &str, config: &PasswordConfig) -> Result<(), Error> {
    let len = password.chars().count();
    if len < config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters long", config.min_length),
        });
    }
    if len > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters long", config.max_length),
        });
    }
    Ok(())
}

/// Generate a short lowercase alphanumeric token (used for share-link suffixes).
pub fn generate_suffix(len: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> Option<Argon2Params> {
        Some(Argon2Params {
            memory_kib: 128,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn test_string_hashing() {
        let input = "test_password_123";
        let hash = hash_string_with_params(input, fast_params()).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_string(input, &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let input = "same_password";

        let hash1 = hash_string_with_params(input, fast_params()).unwrap();
        let hash2 = hash_string_with_params(input, fast_params()).unwrap();

        // Salted
        assert_ne!(hash1, hash2);
        assert!(verify_string(input, &hash1).unwrap());
        assert!(verify_string(input, &hash2).unwrap());
    }

    #[test]
    fn test_bcrypt_hashes_still_verify() {
        let hash = bcrypt::hash("legacy-password", 4).unwrap();

        assert_eq!(StoredFormat::detect(&hash), StoredFormat::Bcrypt);
        assert!(verify_string("legacy-password", &hash).unwrap());
        assert!(!verify_string("not-it", &hash).unwrap());
    }

    #[test]
    fn test_plaintext_passwords_still_verify() {
        assert_eq!(StoredFormat::detect("hunter22"), StoredFormat::Plaintext);
        assert!(verify_string("hunter22", "hunter22").unwrap());
        assert!(!verify_string("hunter2", "hunter22").unwrap());
        assert!(!verify_string("", "hunter22").unwrap());
    }

    #[test]
    fn test_validate_length() {
        let config = PasswordConfig::default();

        assert!(validate_length("short", &config).is_err());
        assert!(validate_length("long enough", &config).is_ok());
        assert!(validate_length(&"x".repeat(65), &config).is_err());
    }

    #[test]
    fn test_generate_suffix() {
        let a = generate_suffix(6);
        let b = generate_suffix(6);

        assert_eq!(a.len(), 6);
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(a, b);
    }
}
