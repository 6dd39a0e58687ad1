//! JSON Web Key Set (JWKS) types.
//!
//! Implements the public half of:
//! - [RFC 7517](https://tools.ietf.org/html/rfc7517) (JSON Web Key)
//! - [RFC 7518](https://tools.ietf.org/html/rfc7518) (JSON Web Algorithms)

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::algorithm::SignatureAlgorithm;

/// JSON Web Key Set, as served from the provider's `jwks` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Array of JSON Web Keys.
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Creates a JWKS with the given keys.
    #[must_use]
    pub const fn with_keys(keys: Vec<JsonWebKey>) -> Self {
        Self { keys }
    }

    /// Finds a key by its ID.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// Public RSA signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type, always `RSA`.
    pub kty: String,

    /// Public key use, always `sig`.
    #[serde(rename = "use")]
    pub key_use: String,

    /// Algorithm intended for use with the key.
    pub alg: String,

    /// Key ID.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    pub n: String,

    /// RSA exponent (base64url encoded).
    pub e: String,
}

impl JsonWebKey {
    /// Creates an RSA public key from big-endian modulus and exponent bytes.
    #[must_use]
    pub fn rsa_public(
        kid: impl Into<String>,
        algorithm: SignatureAlgorithm,
        modulus: &[u8],
        exponent: &[u8],
    ) -> Self {
        Self {
            kty: "RSA".to_string(),
            key_use: "sig".to_string(),
            alg: algorithm.jwa_name().to_string(),
            kid: kid.into(),
            n: URL_SAFE_NO_PAD.encode(modulus),
            e: URL_SAFE_NO_PAD.encode(exponent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_use_field() {
        let key = JsonWebKey::rsa_public("k1", SignatureAlgorithm::Rs256, &[1, 2, 3], &[1, 0, 1]);
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["use"], "sig");
        assert_eq!(json["alg"], "RS256");
        assert_eq!(json["e"], "AQAB");
    }

    #[test]
    fn finds_key_by_kid() {
        let set = JsonWebKeySet::with_keys(vec![
            JsonWebKey::rsa_public("a", SignatureAlgorithm::Rs256, &[1], &[1]),
            JsonWebKey::rsa_public("b", SignatureAlgorithm::Rs384, &[2], &[1]),
        ]);
        assert_eq!(set.find_key("b").map(|k| k.alg.as_str()), Some("RS384"));
        assert!(set.find_key("c").is_none());
    }
}
