//! Hash functions and OIDC hash claims.

use aws_lc_rs::{constant_time, digest};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::algorithm::HashAlgorithm;

/// Computes a hash of the input data.
#[must_use]
pub fn hash(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        HashAlgorithm::Sha256 => &digest::SHA256,
        HashAlgorithm::Sha384 => &digest::SHA384,
        HashAlgorithm::Sha512 => &digest::SHA512,
    };

    digest::digest(alg, data).as_ref().to_vec()
}

/// Computes a SHA-256 hash of the input data.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    hash(HashAlgorithm::Sha256, data)
}

/// Computes a SHA-384 hash of the input data.
#[must_use]
pub fn sha384(data: &[u8]) -> Vec<u8> {
    hash(HashAlgorithm::Sha384, data)
}

/// Computes a SHA-512 hash of the input data.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    hash(HashAlgorithm::Sha512, data)
}

/// Computes an `at_hash` or `c_hash` value.
///
/// Hashes the ASCII bytes of `value` with SHA-`bits`, keeps the left-most
/// half of the digest and base64url-encodes it without padding. Returns
/// `None` when `value` is empty or `bits` is not 256, 384 or 512, in which
/// case the claim is omitted.
#[must_use]
pub fn hash_claim(value: &str, bits: u16) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    let algorithm = HashAlgorithm::from_bits(bits).ok()?;
    let digest = hash(algorithm, value.as_bytes());
    let half = &digest[..algorithm.output_len() / 2];

    Some(URL_SAFE_NO_PAD.encode(half))
}

/// Compares two byte slices in constant time.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    constant_time::verify_slices_are_equal(a, b).is_ok()
}
