//! Discovery and JWK set documents.

use crate::disposition::{Disposition, Step};
use crate::provider::Provider;

/// Serves the provider metadata.
///
/// # Errors
///
/// Fails only if the metadata cannot be serialized.
pub fn discovery(provider: &Provider) -> Step<Disposition> {
    let body = serde_json::to_value(provider.openid_configuration())?;
    Ok(Disposition::json(200, body))
}

/// Serves the public signing keys.
///
/// # Errors
///
/// Fails only if the key set cannot be serialized.
pub fn jwk_set(provider: &Provider) -> Step<Disposition> {
    let body = serde_json::to_value(provider.jwk_set())?;
    Ok(Disposition::json(200, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_provider;

    #[test]
    fn jwk_set_lists_public_keys() {
        let (provider, _clock) = test_provider();
        let disposition = jwk_set(&provider).unwrap();

        assert_eq!(disposition.status, 200);
        let keys = disposition.json_body().unwrap()["keys"].as_array().unwrap();
        assert!(!keys.is_empty());
        for key in keys {
            assert_eq!(key["kty"], "RSA");
            assert_eq!(key["use"], "sig");
            assert!(key["n"].is_string() && key["e"].is_string());
            assert!(key.get("d").is_none());
        }
    }

    #[test]
    fn discovery_document() {
        let (provider, _clock) = test_provider();
        let disposition = discovery(&provider).unwrap();

        let body = disposition.json_body().unwrap();
        assert_eq!(body["issuer"], provider.issuer());
        assert_eq!(body["token_endpoint"], format!("{}/token", provider.issuer()));
        assert_eq!(body["request_parameter_supported"], true);
    }
}
