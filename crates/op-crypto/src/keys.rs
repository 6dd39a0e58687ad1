//! Signing key management.
//!
//! A [`KeySet`] holds one RSA signing key per (purpose, algorithm) slot:
//!
//! | Purpose | Algorithms |
//! |---|---|
//! | `id_token` | RS256, RS384, RS512 |
//! | `token` | RS256, RS384, RS512 |
//! | `register` | RS256 |
//!
//! Keys are either generated with the `rsa` crate or imported from a
//! PKCS#8 PEM. Signing and verification go through `jsonwebtoken`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::algorithm::SignatureAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::hash::sha256;
use crate::jwk::{JsonWebKey, JsonWebKeySet};

/// RSA modulus size for generated keys.
const RSA_KEY_BITS: usize = 2048;

/// What a signing key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPurpose {
    /// ID token signatures.
    IdToken,

    /// Access token signatures.
    Token,

    /// Registration access token signatures.
    Register,
}

impl KeyPurpose {
    /// All purposes, in publication order.
    pub const ALL: [Self; 3] = [Self::IdToken, Self::Token, Self::Register];

    /// Returns the purpose name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdToken => "id_token",
            Self::Token => "token",
            Self::Register => "register",
        }
    }

    /// Algorithms a key set provisions for this purpose.
    #[must_use]
    pub const fn algorithms(self) -> &'static [SignatureAlgorithm] {
        match self {
            Self::IdToken | Self::Token => &SignatureAlgorithm::RSA,
            Self::Register => &[SignatureAlgorithm::Rs256],
        }
    }
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSA signing key bound to one algorithm.
pub struct SigningKey {
    kid: String,
    algorithm: SignatureAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    jwk: JsonWebKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("encoding_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Wraps an RSA private key for the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not RSA or the key cannot be
    /// converted for `jsonwebtoken`.
    pub fn from_rsa_private_key(
        key: &RsaPrivateKey,
        algorithm: SignatureAlgorithm,
    ) -> CryptoResult<Self> {
        if !algorithm.is_rsa() {
            return Err(CryptoError::InvalidKey(format!(
                "{algorithm} is not an RSA algorithm"
            )));
        }

        let pem = key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        let modulus = key.n().to_bytes_be();
        let exponent = key.e().to_bytes_be();
        let kid = key_id(&modulus, algorithm);
        let jwk = JsonWebKey::rsa_public(kid.clone(), algorithm, &modulus, &exponent);

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self {
            kid,
            algorithm,
            encoding_key,
            decoding_key,
            jwk,
        })
    }

    /// Imports a PKCS#8 PEM private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM is not an RSA PKCS#8 key.
    pub fn from_pem(pem: &str, algorithm: SignatureAlgorithm) -> CryptoResult<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_rsa_private_key(&key, algorithm)
    }

    /// Returns the key ID.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Returns the public JWK.
    #[must_use]
    pub const fn public_jwk(&self) -> &JsonWebKey {
        &self.jwk
    }

    /// Returns a JOSE header `{alg, kid}` for this key.
    #[must_use]
    pub fn header(&self) -> Header {
        let mut header = Header::new(self.algorithm.jwt_algorithm());
        header.kid = Some(self.kid.clone());
        header
    }

    /// Signs claims into a compact JWS.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign<T: Serialize>(&self, header: &Header, claims: &T) -> CryptoResult<String> {
        encode(header, claims, &self.encoding_key).map_err(|e| CryptoError::Signing(e.to_string()))
    }

    /// Verifies a compact JWS signed by this key.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature or a claim enforced by `validation`
    /// does not check out.
    pub fn verify<T: DeserializeOwned>(&self, token: &str, validation: &Validation) -> CryptoResult<T> {
        decode::<T>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(|e| CryptoError::Verification(e.to_string()))
    }
}

/// Derives a key ID from the modulus and algorithm.
fn key_id(modulus: &[u8], algorithm: SignatureAlgorithm) -> String {
    let mut input = modulus.to_vec();
    input.extend_from_slice(algorithm.jwa_name().as_bytes());
    URL_SAFE_NO_PAD.encode(&sha256(&input)[..8])
}

/// Signing keys indexed by purpose and algorithm.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: BTreeMap<(KeyPurpose, SignatureAlgorithm), Arc<SigningKey>>,
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys.iter().map(|((purpose, alg), key)| (purpose, alg, key.kid())))
            .finish()
    }
}

impl KeySet {
    /// Creates an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh 2048-bit RSA key for every slot.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn generate() -> CryptoResult<Self> {
        let mut set = Self::new();

        for purpose in KeyPurpose::ALL {
            for &alg in purpose.algorithms() {
                let key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
                    .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
                set.insert(purpose, SigningKey::from_rsa_private_key(&key, alg)?);
            }
        }

        tracing::info!(keys = set.keys.len(), "generated signing keys");
        Ok(set)
    }

    /// Imports one PKCS#8 PEM key into every slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM is not an RSA PKCS#8 key.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        let mut set = Self::new();
        for purpose in KeyPurpose::ALL {
            for &alg in purpose.algorithms() {
                set.insert(purpose, SigningKey::from_rsa_private_key(&key, alg)?);
            }
        }
        Ok(set)
    }

    /// Registers a key for a purpose under its own algorithm.
    pub fn insert(&mut self, purpose: KeyPurpose, key: SigningKey) {
        self.keys.insert((purpose, key.algorithm()), Arc::new(key));
    }

    /// Looks up the signing key for a purpose and algorithm.
    #[must_use]
    pub fn signing_key(
        &self,
        purpose: KeyPurpose,
        algorithm: SignatureAlgorithm,
    ) -> Option<&Arc<SigningKey>> {
        self.keys.get(&(purpose, algorithm))
    }

    /// Finds any key with the given ID.
    #[must_use]
    pub fn find_by_kid(&self, kid: &str) -> Option<&Arc<SigningKey>> {
        self.keys.values().find(|key| key.kid() == kid)
    }

    /// Returns the public JWK set, one entry per distinct key ID.
    #[must_use]
    pub fn jwk_set(&self) -> JsonWebKeySet {
        let unique: BTreeMap<&str, &JsonWebKey> = self
            .keys
            .values()
            .map(|key| (key.kid(), key.public_jwk()))
            .collect();

        JsonWebKeySet::with_keys(unique.into_values().cloned().collect())
    }

    /// Returns whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/rsa-2048.pem");

    fn permissive(alg: SignatureAlgorithm) -> Validation {
        let mut validation = Validation::new(alg.jwt_algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }

    #[test]
    fn from_pem_fills_every_slot() {
        let keys = KeySet::from_pem(TEST_KEY).unwrap();
        for purpose in KeyPurpose::ALL {
            for &alg in purpose.algorithms() {
                assert!(keys.signing_key(purpose, alg).is_some(), "{purpose}/{alg}");
            }
        }
        assert!(keys.signing_key(KeyPurpose::Register, SignatureAlgorithm::Rs384).is_none());
    }

    #[test]
    fn jwk_set_deduplicates_shared_keys() {
        let keys = KeySet::from_pem(TEST_KEY).unwrap();
        let jwks = keys.jwk_set();
        assert_eq!(jwks.keys.len(), 3);
        assert!(jwks.keys.iter().all(|k| k.kty == "RSA" && k.e == "AQAB"));
    }

    #[test]
    fn sign_and_verify() {
        let keys = KeySet::from_pem(TEST_KEY).unwrap();
        let key = keys
            .signing_key(KeyPurpose::Token, SignatureAlgorithm::Rs384)
            .unwrap();

        let token = key.sign(&key.header(), &json!({"sub": "user1"})).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(key.kid()));

        let claims: Value = key.verify(&token, &permissive(SignatureAlgorithm::Rs384)).unwrap();
        assert_eq!(claims["sub"], "user1");
    }

    #[test]
    fn find_by_kid() {
        let keys = KeySet::from_pem(TEST_KEY).unwrap();
        let key = keys
            .signing_key(KeyPurpose::IdToken, SignatureAlgorithm::Rs512)
            .unwrap();
        let found = keys.find_by_kid(key.kid()).unwrap();
        assert_eq!(found.algorithm(), SignatureAlgorithm::Rs512);
    }

    #[test]
    fn hmac_algorithm_is_rejected_for_rsa_keys() {
        assert!(SigningKey::from_pem(TEST_KEY, SignatureAlgorithm::Hs256).is_err());
    }

    #[test]
    fn debug_redacts_key_material() {
        let key = SigningKey::from_pem(TEST_KEY, SignatureAlgorithm::Rs256).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
    }
}
