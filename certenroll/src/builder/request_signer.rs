//! The request_signer module provides [`RequestSigner`], a private key used to sign PKCS #10
//! requests and CRMF POPOSigningKey structures.

use der::asn1::Null;
use der::{Any, Decode};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::util::enroll_alg_oids::*;
use crate::util::error::*;

/// Private key used to sign requests
#[derive(Clone)]
pub enum RequestSigner {
    /// ECDSA P-256 key, signs with ecdsa-with-SHA256
    P256(p256::ecdsa::SigningKey),
    /// RSA key, signs with sha256WithRSAEncryption
    Rsa(RsaPrivateKey),
}

impl RequestSigner {
    /// Generates a new P-256 key
    pub fn generate_p256() -> Self {
        RequestSigner::P256(p256::ecdsa::SigningKey::random(&mut OsRng))
    }

    /// Generates a new RSA key of the given size
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| Error::InternalError(format!("RSA key generation failed: {}", e)))?;
        Ok(RequestSigner::Rsa(key))
    }

    /// Returns the SubjectPublicKeyInfo for the key
    pub fn spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let doc = match self {
            RequestSigner::P256(key) => key.verifying_key().to_public_key_der(),
            RequestSigner::Rsa(key) => key.to_public_key().to_public_key_der(),
        }
        .map_err(|e| Error::InternalError(format!("public key encoding failed: {}", e)))?;
        Ok(SubjectPublicKeyInfoOwned::from_der(doc.as_bytes())?)
    }

    /// Returns the signature algorithm used by [`RequestSigner::sign`]
    pub fn signature_algorithm(&self) -> Result<AlgorithmIdentifierOwned> {
        Ok(match self {
            RequestSigner::P256(_) => AlgorithmIdentifierOwned {
                oid: PKIXALG_ECDSA_WITH_SHA256,
                parameters: None,
            },
            RequestSigner::Rsa(_) => AlgorithmIdentifierOwned {
                oid: PKIXALG_SHA256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::encode_from(&Null)?),
            },
        })
    }

    /// Signs `message`, returning an encoded signature suitable for a BIT STRING
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            RequestSigner::P256(key) => {
                let sig: p256::ecdsa::Signature = key.sign(message);
                Ok(sig.to_der().as_bytes().to_vec())
            }
            RequestSigner::Rsa(key) => {
                let signer = rsa::pkcs1v15::SigningKey::<Sha256>::new(key.clone());
                Ok(signer.sign(message).to_vec())
            }
        }
    }

    /// Returns the RSA private key, if any
    pub fn rsa_key(&self) -> Option<&RsaPrivateKey> {
        match self {
            RequestSigner::Rsa(key) => Some(key),
            RequestSigner::P256(_) => None,
        }
    }
}
