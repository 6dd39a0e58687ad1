//! # op-crypto
//!
//! Cryptographic building blocks for the OpenID provider.
//!
//! ## Modules
//!
//! - [`algorithm`] - JWA signature and hash algorithm identifiers
//! - [`hash`] - SHA-2 digests and the `at_hash` / `c_hash` claim computation
//! - [`jose`] - Compact JWT decoding and verification helpers
//! - [`jwk`] - JSON Web Key Set types published by the provider
//! - [`keys`] - Per-purpose, per-algorithm signing key set
//! - [`random`] - Injectable secure random capability

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod error;
pub mod hash;
pub mod jose;
pub mod jwk;
pub mod keys;
pub mod random;

pub use algorithm::{AlgorithmError, HashAlgorithm, SignatureAlgorithm};
pub use error::{CryptoError, CryptoResult};
pub use hash::{constant_time_eq, hash_claim, sha256, sha384, sha512};
pub use jose::DecodedJwt;
pub use jwk::{JsonWebKey, JsonWebKeySet};
pub use keys::{KeyPurpose, KeySet, SigningKey};
pub use random::{OsRandom, SecureRandom, SeededRandom};
