//! The software_token module provides [`SoftwareToken`], a [`CryptoToken`] backed by an RSA key
//! pair held in memory.

use der::Decode;
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use spki::SubjectPublicKeyInfoOwned;
use zeroize::Zeroizing;

use crate::token::crypto_token::CryptoToken;
use crate::util::error::*;

/// RSA token implemented in software. Keys are wrapped using PKCS #1 v1.5 key transport.
pub struct SoftwareToken {
    name: String,
    private_key: RsaPrivateKey,
}

impl SoftwareToken {
    /// Generates a fresh RSA key pair of the given size.
    pub fn generate(name: &str, bits: usize) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| Error::InternalError(format!("RSA key generation failed: {}", e)))?;
        Ok(SoftwareToken {
            name: name.to_string(),
            private_key,
        })
    }

    /// Loads an RSA private key from a PKCS #8 PrivateKeyInfo.
    pub fn from_pkcs8_der(name: &str, enc_key: &[u8]) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_der(enc_key)
            .map_err(|e| Error::InternalError(format!("failed to parse token key: {}", e)))?;
        Ok(SoftwareToken {
            name: name.to_string(),
            private_key,
        })
    }
}

impl CryptoToken for SoftwareToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let doc = self
            .private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| Error::InternalError(format!("failed to encode token key: {}", e)))?;
        Ok(SubjectPublicKeyInfoOwned::from_der(doc.as_bytes())?)
    }

    fn wrap_key(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.private_key
            .to_public_key()
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, key)
            .map_err(|e| Error::InternalError(format!("key wrap failed: {}", e)))
    }

    fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.private_key
            .decrypt(Pkcs1v15Encrypt, wrapped_key)
            .map(Zeroizing::new)
            .map_err(|_| Error::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::crypto_token::SerializedToken;
    use crate::util::enroll_alg_oids::PKIXALG_RSA_ENCRYPTION;

    #[test]
    fn software_token_test() {
        let token = SoftwareToken::generate("internal", 1024).unwrap();
        assert_eq!("internal", token.name());
        assert_eq!(PKIXALG_RSA_ENCRYPTION, token.public_key().unwrap().algorithm.oid);

        let key = [7u8; 32];
        let wrapped = token.wrap_key(&key).unwrap();
        assert_eq!(128, wrapped.len());
        assert_eq!(key.to_vec(), *token.unwrap_key(&wrapped).unwrap());

        let mut tampered = wrapped.clone();
        tampered[5] ^= 0x01;
        let r = token.unwrap_key(&tampered);
        assert!(r.is_err() || *r.unwrap() != key.to_vec());

        let serialized = SerializedToken::new(Box::new(token));
        let unwrapped = serialized.with_token(|t| t.unwrap_key(&wrapped)).unwrap();
        assert_eq!(key.to_vec(), *unwrapped);
    }
}
