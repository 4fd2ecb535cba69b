//! Provides implementations of crypto-related [`EnrollmentEnvironment`] interfaces using libraries
//! from the [Rust Crypto](https://github.com/RustCrypto) project for support.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use der::{asn1::ObjectIdentifier, Encode};
use hmac::{Hmac, Mac};
use p256::ecdsa::{
    signature::Verifier as Verifier256, Signature as Signature256, VerifyingKey as VerifyingKey256,
};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::util::error::{Error, Result};
use crate::{
    environment::enrollment_environment::*, log_message, util::enroll_alg_oids::*,
    util::enroll_utilities::get_hash_alg_from_sig_alg, EeLogLevels,
};

/// Length in bytes of the AES-GCM initialization vector used for challenge encryption.
pub const AES_GCM_IV_LEN: usize = 12;

/// Length in bytes of the AES-256 keys used for challenge encryption.
pub const AES_256_KEY_LEN: usize = 32;

/// get_padding_scheme takes an AlgorithmIdentifier containing a signature algorithm and returns
/// a corresponding Pkcs1v15Sign instance.
///
/// SHA-1 is only accepted when the `sha1_sig` feature is enabled.
pub fn get_padding_scheme(signature_alg: &AlgorithmIdentifierOwned) -> Result<Pkcs1v15Sign> {
    match signature_alg.oid {
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha256>()),
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha384>()),
        PKIXALG_SHA224_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha224>()),
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha512>()),
        PKIXALG_SHA1_WITH_RSA_ENCRYPTION => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "sha1_sig")] {
                    Ok(Pkcs1v15Sign::new::<Sha1>())
                } else {
                    log_message(
                        &EeLogLevels::EeError,
                        "SHA-1 signatures are not accepted without the sha1_sig feature",
                    );
                    Err(Error::Unrecognized)
                }
            }
        }
        _ => Err(Error::Unrecognized),
    }
}

/// is_rsa returns true is the presented OID is one of the RSA PKCS #1 v1.5 signature algorithms
/// and false otherwise.
pub(crate) fn is_rsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_SHA256_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA384_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA224_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA512_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA1_WITH_RSA_ENCRYPTION
}

/// is_ecdsa returns true is the presented OID is [`PKIXALG_ECDSA_WITH_SHA256`] and false otherwise.
pub(crate) fn is_ecdsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_ECDSA_WITH_SHA256
}

/// calculate_hash_rust_crypto implements the [`CalculateHash`](../environment/enrollment_environment_traits/type.CalculateHash.html)
/// interface for [`EnrollmentEnvironment`] using implementations from the Rust Crypto project.
///
/// It supports [`PKIXALG_SHA1`], [`PKIXALG_SHA224`], [`PKIXALG_SHA256`], [`PKIXALG_SHA384`] and
/// [`PKIXALG_SHA512`]. SHA-1 is retained because version 1 identity proofs and POP link witnesses
/// are defined in terms of it.
pub fn calculate_hash_rust_crypto(
    _ee: &EnrollmentEnvironment,
    hash_alg: &AlgorithmIdentifierOwned,
    buffer_to_hash: &[u8],
) -> Result<Vec<u8>> {
    match hash_alg.oid {
        PKIXALG_SHA1 => Ok(Sha1::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA224 => Ok(Sha224::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA256 => Ok(Sha256::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA384 => Ok(Sha384::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA512 => Ok(Sha512::digest(buffer_to_hash).to_vec()),
        _ => Err(Error::Unrecognized),
    }
}

fn hmac_with<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::InternalError("invalid HMAC key length".to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// calculate_mac_rust_crypto implements the [`CalculateMac`](../environment/enrollment_environment_traits/type.CalculateMac.html)
/// interface for [`EnrollmentEnvironment`] using the `hmac` crate.
///
/// Both the RFC 2104 and RFC 8018 identifiers for HMAC-SHA1 are accepted along with HMAC using
/// SHA-224, SHA-256, SHA-384 and SHA-512.
pub fn calculate_mac_rust_crypto(
    _ee: &EnrollmentEnvironment,
    mac_alg: &AlgorithmIdentifierOwned,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    match mac_alg.oid {
        PKIXALG_HMAC_SHA1 | PKIXALG_HMAC_WITH_SHA1 => hmac_with::<Hmac<Sha1>>(key, data),
        PKIXALG_HMAC_WITH_SHA224 => hmac_with::<Hmac<Sha224>>(key, data),
        PKIXALG_HMAC_WITH_SHA256 => hmac_with::<Hmac<Sha256>>(key, data),
        PKIXALG_HMAC_WITH_SHA384 => hmac_with::<Hmac<Sha384>>(key, data),
        PKIXALG_HMAC_WITH_SHA512 => hmac_with::<Hmac<Sha512>>(key, data),
        _ => Err(Error::Unrecognized),
    }
}

fn get_named_curve_parameter(alg_id: &AlgorithmIdentifierOwned) -> Result<ObjectIdentifier> {
    if let Some(params) = &alg_id.parameters {
        if let Ok(oid) = params.decode_as::<ObjectIdentifier>() {
            return Ok(oid);
        }
    }
    Err(Error::BadRequest(
        "EC public key does not name a curve".to_string(),
    ))
}

/// verify_signature_message_rust_crypto implements the [`VerifySignatureMessage`](../environment/enrollment_environment_traits/type.VerifySignatureMessage.html)
/// interface for [`EnrollmentEnvironment`] using implementations from the [Rust Crypto](https://github.com/RustCrypto) project.
///
/// RSA signatures and P256 signatures are supported at present.
pub fn verify_signature_message_rust_crypto(
    ee: &EnrollmentEnvironment,
    message_to_verify: &[u8],                 // buffer to verify
    signature: &[u8],                         // signature
    signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
    spki: &SubjectPublicKeyInfoOwned,         // public key
) -> Result<()> {
    if is_rsa(&signature_alg.oid) {
        let enc_spki = spki.to_der()?;
        let rsa = RsaPublicKey::from_public_key_der(&enc_spki)
            .map_err(|_| Error::BadRequest("malformed RSA public key".to_string()))?;
        let ps = get_padding_scheme(signature_alg)?;
        let hash_alg = get_hash_alg_from_sig_alg(&signature_alg.oid)?;
        let hash_to_verify = calculate_hash_rust_crypto(ee, &hash_alg, message_to_verify)?;
        return rsa
            .verify(ps, hash_to_verify.as_slice(), signature)
            .map_err(|_| Error::PopFailed("signature verification failed".to_string()));
    } else if is_ecdsa(&signature_alg.oid) {
        let named_curve = get_named_curve_parameter(&spki.algorithm)?;
        if named_curve != PKIXALG_SECP256R1 {
            return Err(Error::Unrecognized);
        }
        let key_bytes = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| Error::BadRequest("malformed EC public key".to_string()))?;
        let ecdsa = VerifyingKey256::from_sec1_bytes(key_bytes)
            .map_err(|_| Error::BadRequest("malformed EC public key".to_string()))?;
        let s = Signature256::from_der(signature)
            .map_err(|_| Error::PopFailed("malformed ECDSA signature".to_string()))?;
        return ecdsa
            .verify(message_to_verify, &s)
            .map_err(|_| Error::PopFailed("signature verification failed".to_string()));
    }
    Err(Error::Unrecognized)
}

fn check_aes_gcm_inputs(alg: &ObjectIdentifier, key: &[u8], iv: &[u8]) -> Result<Aes256Gcm> {
    if *alg != PKIXALG_AES256_GCM {
        return Err(Error::Unrecognized);
    }
    if iv.len() != AES_GCM_IV_LEN {
        return Err(Error::DecryptionFailed);
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| Error::DecryptionFailed)
}

/// encrypt_symmetric_rust_crypto implements the [`EncryptSymmetric`](../environment/enrollment_environment_traits/type.EncryptSymmetric.html)
/// interface using AES-256-GCM with a 12 byte IV.
pub fn encrypt_symmetric_rust_crypto(
    _ee: &EnrollmentEnvironment,
    alg: &ObjectIdentifier,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let cipher = check_aes_gcm_inputs(alg, key, iv)?;
    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| Error::InternalError("AES-GCM encryption failed".to_string()))
}

/// decrypt_symmetric_rust_crypto implements the [`DecryptSymmetric`](../environment/enrollment_environment_traits/type.DecryptSymmetric.html)
/// interface using AES-256-GCM with a 12 byte IV. Any authentication tag mismatch yields
/// [`Error::DecryptionFailed`].
pub fn decrypt_symmetric_rust_crypto(
    _ee: &EnrollmentEnvironment,
    alg: &ObjectIdentifier,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = check_aes_gcm_inputs(alg, key, iv)?;
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| Error::DecryptionFailed)
}

/// wrap_for_public_key_rust_crypto implements the [`WrapForPublicKey`](../environment/enrollment_environment_traits/type.WrapForPublicKey.html)
/// interface using RSA PKCS #1 v1.5 key transport. Keys other than RSA yield [`Error::Unrecognized`].
pub fn wrap_for_public_key_rust_crypto(
    _ee: &EnrollmentEnvironment,
    spki: &SubjectPublicKeyInfoOwned,
    key_to_wrap: &[u8],
) -> Result<Vec<u8>> {
    if spki.algorithm.oid != PKIXALG_RSA_ENCRYPTION {
        return Err(Error::Unrecognized);
    }
    let enc_spki = spki.to_der()?;
    let rsa = RsaPublicKey::from_public_key_der(&enc_spki)
        .map_err(|_| Error::BadRequest("malformed RSA public key".to_string()))?;
    rsa.encrypt(&mut OsRng, Pkcs1v15Encrypt, key_to_wrap)
        .map_err(|e| Error::InternalError(format!("RSA key wrap failed: {}", e)))
}

/// generate_random_rust_crypto implements the [`GenerateRandom`](../environment/enrollment_environment_traits/type.GenerateRandom.html)
/// interface using the operating system random number generator.
pub fn generate_random_rust_crypto(_ee: &EnrollmentEnvironment, buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::InternalError(format!("random generation failed: {}", e)))
}

/// witnesses_match compares a computed witness with a presented witness without exiting early on
/// the first differing byte. Values of different lengths do not match.
pub fn witnesses_match(computed: &[u8], presented: &[u8]) -> bool {
    computed.ct_eq(presented).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn alg(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid,
            parameters: None,
        }
    }

    #[test]
    fn hash_test() {
        let ee = EnrollmentEnvironment::default();
        let digest = calculate_hash_rust_crypto(&ee, &alg(PKIXALG_SHA256), b"abc").unwrap();
        assert_eq!(
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad").to_vec(),
            digest
        );
        let digest = calculate_hash_rust_crypto(&ee, &alg(PKIXALG_SHA1), b"abc").unwrap();
        assert_eq!(
            hex!("a9993e364706816aba3e25717850c26c9cd0d89d").to_vec(),
            digest
        );
        assert!(calculate_hash_rust_crypto(&ee, &alg(PKIXALG_RSA_ENCRYPTION), b"abc").is_err());
    }

    #[test]
    fn hmac_test() {
        // RFC 4231 test case 2
        let ee = EnrollmentEnvironment::default();
        let mac = calculate_mac_rust_crypto(
            &ee,
            &alg(PKIXALG_HMAC_WITH_SHA256),
            b"Jefe",
            b"what do ya want for nothing?",
        )
        .unwrap();
        assert_eq!(
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843").to_vec(),
            mac
        );

        // RFC 2202 test case 2
        let mac = calculate_mac_rust_crypto(
            &ee,
            &alg(PKIXALG_HMAC_SHA1),
            b"Jefe",
            b"what do ya want for nothing?",
        )
        .unwrap();
        assert_eq!(
            hex!("effcdf6ae5eb2fa2d27416d5f184df9c259a7c79").to_vec(),
            mac
        );
    }

    #[test]
    fn aes_gcm_test() {
        let ee = EnrollmentEnvironment::default();
        let key = [7u8; AES_256_KEY_LEN];
        let iv = [9u8; AES_GCM_IV_LEN];
        let ct =
            encrypt_symmetric_rust_crypto(&ee, &PKIXALG_AES256_GCM, &key, &iv, b"challenge")
                .unwrap();
        let pt = decrypt_symmetric_rust_crypto(&ee, &PKIXALG_AES256_GCM, &key, &iv, &ct).unwrap();
        assert_eq!(b"challenge".to_vec(), *pt);

        let mut tampered = ct.clone();
        tampered[0] ^= 0x01;
        assert_eq!(
            Err(Error::DecryptionFailed),
            decrypt_symmetric_rust_crypto(&ee, &PKIXALG_AES256_GCM, &key, &iv, &tampered)
        );
        let mut bad_iv = iv;
        bad_iv[11] ^= 0x80;
        assert!(
            decrypt_symmetric_rust_crypto(&ee, &PKIXALG_AES256_GCM, &key, &bad_iv, &ct).is_err()
        );
        assert!(
            decrypt_symmetric_rust_crypto(&ee, &PKIXALG_AES256_GCM, &key, &iv[..8], &ct).is_err()
        );
    }

    #[test]
    fn random_test() {
        let ee = EnrollmentEnvironment::default();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        generate_random_rust_crypto(&ee, &mut a).unwrap();
        generate_random_rust_crypto(&ee, &mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn witnesses_match_test() {
        assert!(witnesses_match(&[1, 2, 3], &[1, 2, 3]));
        assert!(!witnesses_match(&[1, 2, 3], &[1, 2, 4]));
        assert!(!witnesses_match(&[1, 2, 3], &[1, 2]));
        assert!(!witnesses_match(&[], &[0]));
    }
}
