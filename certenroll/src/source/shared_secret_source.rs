//! The shared_secret_source module provides [`SharedSecretSource`], a [`SharedSecretResolver`]
//! backed by a map from identification strings to secrets.

use std::collections::BTreeMap;

use zeroize::Zeroizing;

use crate::environment::enrollment_environment_traits::SharedSecretResolver;
use crate::util::error::*;

/// Map of identification string to shared secret, with an optional secret returned when a
/// submission carries no identification.
#[derive(Clone, Default)]
pub struct SharedSecretSource {
    secrets: BTreeMap<String, Zeroizing<Vec<u8>>>,
    default_secret: Option<Zeroizing<Vec<u8>>>,
}

impl SharedSecretSource {
    /// Adds or replaces the secret for an identification string
    pub fn add_secret(&mut self, identification: &str, secret: &[u8]) {
        self.secrets
            .insert(identification.to_string(), Zeroizing::new(secret.to_vec()));
    }

    /// Sets the secret returned when no identification is presented
    pub fn set_default_secret(&mut self, secret: &[u8]) {
        self.default_secret = Some(Zeroizing::new(secret.to_vec()));
    }

    /// Parses a JSON object mapping identification strings to UTF-8 secrets.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: BTreeMap<String, String> = serde_json::from_str(json)
            .map_err(|e| Error::InternalError(format!("failed to parse shared secrets: {}", e)))?;
        let mut source = SharedSecretSource::default();
        for (identification, secret) in map {
            source.add_secret(&identification, secret.as_bytes());
        }
        Ok(source)
    }
}

impl SharedSecretResolver for SharedSecretSource {
    fn get_shared_secret(
        &self,
        identification: Option<&str>,
        _pki_data: &[u8],
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        Ok(match identification {
            Some(identification) => self.secrets.get(identification).cloned(),
            None => self.default_secret.clone(),
        })
    }
}

#[test]
fn shared_secret_source_test() {
    let mut source = SharedSecretSource::from_json(r#"{"alice": "s3cret"}"#).unwrap();
    assert_eq!(
        b"s3cret".to_vec(),
        *source.get_shared_secret(Some("alice"), b"").unwrap().unwrap()
    );
    assert!(source.get_shared_secret(Some("bob"), b"").unwrap().is_none());
    assert!(source.get_shared_secret(None, b"").unwrap().is_none());
    source.set_default_secret(b"fallback");
    assert_eq!(
        b"fallback".to_vec(),
        *source.get_shared_secret(None, b"").unwrap().unwrap()
    );
    assert!(SharedSecretSource::from_json("[1]").is_err());
}
