//! Crypto error types.

use thiserror::Error;

use crate::algorithm::AlgorithmError;

/// Errors raised by key handling and JOSE operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The algorithm is unknown or not usable for the operation.
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    /// Key material could not be parsed or imported.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// RSA key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The input is not a compact JWS serialization.
    #[error("Invalid JWT compact serialization")]
    MalformedJwt,

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    Verification(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
