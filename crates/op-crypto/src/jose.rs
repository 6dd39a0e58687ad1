//! Compact JWT helpers.
//!
//! `jsonwebtoken` refuses tokens with `alg: none` and only exposes claims
//! after verification. Request objects and client assertions need to be
//! inspected first (to find the client whose key verifies them), so this
//! module decodes the compact form without trusting it and offers
//! verification against a client secret or a client JWK.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde_json::{Map, Value};

use crate::algorithm::SignatureAlgorithm;
use crate::error::{CryptoError, CryptoResult};

/// JSON object type used for JOSE headers and claim sets.
pub type JsonObject = Map<String, Value>;

/// An unverified compact JWT.
#[derive(Debug, Clone)]
pub struct DecodedJwt {
    /// JOSE header.
    pub header: JsonObject,

    /// Claim set.
    pub payload: JsonObject,

    /// Base64url signature segment (empty for unsecured JWTs).
    pub signature: String,
}

impl DecodedJwt {
    /// Decodes `header.payload.signature` without verifying anything.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedJwt`] unless the input has exactly
    /// three segments whose first two are base64url JSON objects.
    pub fn decode(compact: &str) -> CryptoResult<Self> {
        let mut parts = compact.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedJwt);
        };

        Ok(Self {
            header: decode_segment(header)?,
            payload: decode_segment(payload)?,
            signature: signature.to_string(),
        })
    }

    /// Returns the `alg` header.
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// Returns the `kid` header.
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// Returns a string claim.
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }

    /// Returns whether the token carries a signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty() && self.alg().is_some_and(|alg| alg != "none")
    }
}

fn decode_segment(segment: &str) -> CryptoResult<JsonObject> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CryptoError::MalformedJwt)?;
    serde_json::from_slice(&bytes).map_err(|_| CryptoError::MalformedJwt)
}

/// Validation that checks the signature and algorithm only.
///
/// Callers check `iss`, `aud` and `exp` themselves against the injected
/// clock.
#[must_use]
pub fn signature_only(algorithm: SignatureAlgorithm) -> Validation {
    let mut validation = Validation::new(algorithm.jwt_algorithm());
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Verifies an HMAC-signed JWT with a shared secret and returns its claims.
///
/// # Errors
///
/// Returns an error if the algorithm is not HMAC or the signature is wrong.
pub fn verify_with_secret(
    compact: &str,
    algorithm: SignatureAlgorithm,
    secret: &[u8],
) -> CryptoResult<JsonObject> {
    if !algorithm.is_hmac() {
        return Err(CryptoError::Verification(format!(
            "{algorithm} cannot be verified with a shared secret"
        )));
    }

    decode::<JsonObject>(compact, &DecodingKey::from_secret(secret), &signature_only(algorithm))
        .map(|data| data.claims)
        .map_err(|e| CryptoError::Verification(e.to_string()))
}

/// Verifies a JWT with a public JWK and returns its claims.
///
/// # Errors
///
/// Returns an error if the JWK cannot be used or the signature is wrong.
pub fn verify_with_jwk(
    compact: &str,
    algorithm: SignatureAlgorithm,
    jwk: &Jwk,
) -> CryptoResult<JsonObject> {
    let key = DecodingKey::from_jwk(jwk).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    decode::<JsonObject>(compact, &key, &signature_only(algorithm))
        .map(|data| data.claims)
        .map_err(|e| CryptoError::Verification(e.to_string()))
}

/// Imports a JWK from its JSON form.
///
/// # Errors
///
/// Returns an error if the value is not a JWK.
pub fn import_jwk(value: &Value) -> CryptoResult<Jwk> {
    serde_json::from_value(value.clone()).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Imports every key of a JWK set, skipping entries that fail to parse.
#[must_use]
pub fn import_jwk_set(value: &Value) -> Vec<Jwk> {
    value
        .get("keys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(|key| match import_jwk(key) {
                    Ok(jwk) => Some(jwk),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unusable client key");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Encodes an unsecured (`alg: none`) JWT.
///
/// # Errors
///
/// Returns an error if the claims cannot be serialized.
pub fn encode_unsecured(claims: &Value) -> CryptoResult<String> {
    let header = serde_json::to_vec(&serde_json::json!({"alg": "none"}))
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    let payload = serde_json::to_vec(claims).map_err(|e| CryptoError::Signing(e.to_string()))?;

    Ok(format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    #[test]
    fn rejects_non_compact_input() {
        assert!(matches!(
            DecodedJwt::decode("invalid jwt"),
            Err(CryptoError::MalformedJwt)
        ));
        assert!(DecodedJwt::decode("a.b.c.d").is_err());
        assert_eq!(
            CryptoError::MalformedJwt.to_string(),
            "Invalid JWT compact serialization"
        );
    }

    #[test]
    fn decodes_unsecured_jwt() {
        let compact = encode_unsecured(&json!({"client_id": "app"})).unwrap();
        let jwt = DecodedJwt::decode(&compact).unwrap();
        assert_eq!(jwt.alg(), Some("none"));
        assert_eq!(jwt.claim_str("client_id"), Some("app"));
        assert!(!jwt.is_signed());
    }

    #[test]
    fn verifies_hmac_signature() {
        let compact = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &json!({"sub": "client"}),
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        let jwt = DecodedJwt::decode(&compact).unwrap();
        assert!(jwt.is_signed());

        let claims = verify_with_secret(&compact, SignatureAlgorithm::Hs256, b"s3cret").unwrap();
        assert_eq!(claims["sub"], "client");

        assert!(verify_with_secret(&compact, SignatureAlgorithm::Hs256, b"wrong").is_err());
        assert!(verify_with_secret(&compact, SignatureAlgorithm::Rs256, b"s3cret").is_err());
    }

    #[test]
    fn import_jwk_set_skips_garbage() {
        let set = json!({"keys": [
            {"kty": "RSA", "alg": "RS256", "n": "xykqKb0EPomxUR", "e": "AQAB"},
            {"nonsense": true}
        ]});
        assert_eq!(import_jwk_set(&set).len(), 1);
        assert!(import_jwk_set(&json!({})).is_empty());
    }
}
