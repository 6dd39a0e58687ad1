//! Cryptographically secure random generation.
//!
//! Randomness is an injected capability: handlers receive a
//! [`SecureRandom`] instead of reaching for a global generator, so tests can
//! swap in [`SeededRandom`] and get reproducible identifiers.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

/// Source of random bytes.
pub trait SecureRandom: Send + Sync + fmt::Debug {
    /// Fills `dest` with random bytes.
    fn fill(&self, dest: &mut [u8]);

    /// Returns `len` random bytes.
    fn bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.fill(&mut bytes);
        bytes
    }

    /// Returns `len` random bytes, hex encoded.
    fn hex(&self, len: usize) -> String {
        hex::encode(self.bytes(len))
    }
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Deterministic generator for tests.
///
/// NOT cryptographically secure.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Creates a generator from a 32-byte seed.
    #[must_use]
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_seed(seed)),
        }
    }
}

impl fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRandom").finish_non_exhaustive()
    }
}

impl SecureRandom for SeededRandom {
    fn fill(&self, dest: &mut [u8]) {
        self.rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .fill_bytes(dest);
    }
}

/// Generates a JWT ID (`jti`): 8 random bytes, hex encoded.
#[must_use]
pub fn generate_token_id(random: &dyn SecureRandom) -> String {
    random.hex(8)
}

/// Generates an authorization code: 16 random bytes, hex encoded.
#[must_use]
pub fn generate_auth_code(random: &dyn SecureRandom) -> String {
    random.hex(16)
}

/// Generates a refresh token: 16 random bytes, hex encoded.
#[must_use]
pub fn generate_refresh_token(random: &dyn SecureRandom) -> String {
    random.hex(16)
}

/// Generates a client identifier: 16 random bytes, hex encoded.
#[must_use]
pub fn generate_client_id(random: &dyn SecureRandom) -> String {
    random.hex(16)
}

/// Generates a client secret: 16 random bytes, hex encoded.
#[must_use]
pub fn generate_client_secret(random: &dyn SecureRandom) -> String {
    random.hex(16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bytes_have_requested_length() {
        assert_eq!(OsRandom.bytes(16).len(), 16);
        assert_eq!(OsRandom.bytes(64).len(), 64);
    }

    #[test]
    fn token_id_format() {
        let jti = generate_token_id(&OsRandom);
        assert_eq!(jti.len(), 16);
        assert!(jti.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn auth_code_format() {
        let code = generate_auth_code(&OsRandom);
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn auth_code_uniqueness() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_auth_code(&OsRandom)).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn client_secret_uniqueness() {
        let secrets: HashSet<String> =
            (0..1000).map(|_| generate_client_secret(&OsRandom)).collect();
        assert_eq!(secrets.len(), 1000);
    }

    #[test]
    fn seeded_random_is_deterministic() {
        let a = SeededRandom::new([42u8; 32]);
        let b = SeededRandom::new([42u8; 32]);
        assert_eq!(a.hex(32), b.hex(32));
    }

    #[test]
    fn different_seeds_produce_different_values() {
        let a = SeededRandom::new([1u8; 32]);
        let b = SeededRandom::new([2u8; 32]);
        assert_ne!(a.bytes(32), b.bytes(32));
    }
}
