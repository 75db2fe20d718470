//! Credential handling: random password generation, Argon2id hashing and verification.
//!
//! Stored credentials are PHC strings (`$argon2id$v=19$...`). Verification goes through
//! `argon2`'s `PasswordVerifier`, which compares digests in constant time.

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};
use std::sync::OnceLock;
use tracing::warn;

use crate::config::Config;

pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("entropy source failed: {0}")]
    Entropy(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
}

/// Capability used by the resolver (verify) and the sync engine (generate + hash).
pub trait CredentialProvider: Send + Sync {
    /// Produce a fresh random plaintext password.
    fn generate(&self) -> Result<String, CredentialError>;

    /// One-way hash of `plaintext` suitable for storage on a `User`.
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;

    /// Check `supplied` against `stored_hash`. Malformed hashes never verify.
    fn verify(&self, stored_hash: &str, supplied: &str) -> bool;

    /// A well-formed hash at this provider's cost that no caller holds a password for.
    /// Verifying against it for unknown users keeps their rejection as slow as a wrong
    /// password.
    fn decoy_hash(&self) -> &str { "" }
}

const DECOY_PASSWORD: &[u8] = b"coursegate-decoy-credential";
const DECOY_SALT: &[u8] = b"coursegate-decoy";

#[derive(Debug, Clone)]
pub struct Argon2Credentials {
    params: Params,
    password_length: usize,
    decoy: OnceLock<String>,
}

impl Default for Argon2Credentials {
    fn default() -> Self {
        Self { params: Params::default(), password_length: DEFAULT_PASSWORD_LENGTH, decoy: OnceLock::new() }
    }
}

impl Argon2Credentials {
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, CredentialError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| CredentialError::Params(e.to_string()))?;
        Ok(Self { params, password_length: DEFAULT_PASSWORD_LENGTH, decoy: OnceLock::new() })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, CredentialError> {
        let c = Self::with_params(cfg.argon2_memory_kib, cfg.argon2_iterations, cfg.argon2_parallelism)?;
        Ok(c.with_password_length(cfg.password_length))
    }

    /// Zero is ignored.
    pub fn with_password_length(mut self, len: usize) -> Self {
        if len > 0 { self.password_length = len; }
        self
    }

    pub fn password_length(&self) -> usize { self.password_length }

    fn argon2(&self) -> Argon2<'static> { Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone()) }

    // Fixed salt: the decoy needs the right cost, not uniqueness, and must not depend on entropy.
    fn build_decoy(&self) -> String {
        let phc = SaltString::encode_b64(DECOY_SALT)
            .and_then(|salt| self.argon2().hash_password(DECOY_PASSWORD, &salt).map(|h| h.to_string()));
        match phc {
            Ok(h) => h,
            Err(e) => {
                warn!(target: "coursegate::security", "decoy hash unavailable, unknown-user rejections will be fast: {}", e);
                String::new()
            }
        }
    }
}

fn fill_random(buf: &mut [u8]) -> Result<(), CredentialError> {
    getrandom::getrandom(buf).map_err(|e| CredentialError::Entropy(e.to_string()))
}

/// Draw `len` characters uniformly from the password alphabet.
///
/// Bytes at or above the largest multiple of the alphabet size are discarded so that
/// every character is equally likely.
pub fn random_password(len: usize) -> Result<String, CredentialError> {
    let n = PASSWORD_ALPHABET.len();
    let limit = (256 / n) * n;
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        fill_random(&mut buf)?;
        for b in buf.iter().map(|b| *b as usize).filter(|b| *b < limit) {
            if out.len() == len { break; }
            out.push(PASSWORD_ALPHABET[b % n] as char);
        }
    }
    Ok(out)
}

impl CredentialProvider for Argon2Credentials {
    fn generate(&self) -> Result<String, CredentialError> { random_password(self.password_length) }

    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let mut salt_bytes = [0u8; 16];
        fill_random(&mut salt_bytes)?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hashing(e.to_string()))?;
        let phc = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    fn verify(&self, stored_hash: &str, supplied: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(stored_hash) {
            self.argon2().verify_password(supplied.as_bytes(), &parsed).is_ok()
        } else { false }
    }

    fn decoy_hash(&self) -> &str { self.decoy.get_or_init(|| self.build_decoy()) }
}
