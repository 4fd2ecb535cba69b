//! The pop module establishes proof of possession for individual requests.
//!
//! Requests bearing a signature POP (a PKCS #10 signature or a CRMF POPOSigningKey) are verified
//! directly. Requests without one are challenged:
//!
//! 1. A random challenge is encrypted with a fresh AES-256-GCM key. The key is wrapped for the
//!    issuance-protection token and for the requester's public key. The encrypted challenge, both
//!    wrapped keys, the IV and the SHA-256 digest of the challenge are stored on the request and
//!    the request becomes PENDING.
//! 2. The requester returns a decryptedPOP control naming the request. The challenge is recovered
//!    using the issuance-protection token, checked against the stored digest, and used as the key
//!    for the algorithm named in the control over the request as originally received. The result
//!    must equal the value in the control.

use der::Encode;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use zeroize::Zeroizing;

use crate::asn1::*;
use crate::decoder::{RequestPayload, SubRequest};
use crate::environment::*;
use crate::profile::ProfileSettings;
use crate::request::*;
use crate::util::crypto::*;
use crate::util::enroll_alg_oids::*;
use crate::util::error::*;
use crate::util::logging::*;
use crate::verifier::identity_proof::alg_id;

/// Length in bytes of POP challenges
pub const POP_CHALLENGE_LEN: usize = 32;

/// Result of proof of possession processing for a request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PopStatus {
    /// A signature POP verified, or an raVerified POP was accepted
    Verified,
    /// No POP verification was performed, i.e., PKCS #10 signature verification is disabled or an
    /// lraPOPWitness control names the request
    Exempt,
    /// The request must be challenged
    ChallengeRequired,
}

fn signature_failure(e: Error) -> Error {
    match e {
        Error::Unrecognized => {
            Error::PopFailed("unsupported POP signature algorithm".to_string())
        }
        Error::BadRequest(m) => Error::BadRequest(m),
        Error::PopFailed(m) => Error::PopFailed(m),
        other => Error::PopFailed(format!("POP signature does not verify: {}", other)),
    }
}

/// Returns true if the request carries a signature-based POP.
pub fn has_signature_pop(sub: &SubRequest) -> bool {
    match &sub.payload {
        RequestPayload::Pkcs10 { .. } => true,
        RequestPayload::Crmf { message, .. } => {
            matches!(message.popo, Some(ProofOfPossession::Signature(_)))
        }
    }
}

/// verify_pop establishes proof of possession for a request. Signature failures are
/// [`Error::PopFailed`]. When no verifiable POP is present and challenges are enabled,
/// [`PopStatus::ChallengeRequired`] is returned.
pub fn verify_pop(
    ee: &EnrollmentEnvironment,
    settings: &ProfileSettings,
    sub: &SubRequest,
    auth_token: Option<&AuthToken>,
    lra_exempt: bool,
) -> Result<PopStatus> {
    if lra_exempt {
        log_message(
            &EeLogLevels::EeInfo,
            format!(
                "POP verification for body part {} waived by lraPOPWitness",
                sub.body_part_id
            )
            .as_str(),
        );
        return Ok(PopStatus::Exempt);
    }

    match &sub.payload {
        RequestPayload::Pkcs10 { request, info } => {
            if !settings.get_verify_pkcs10_signature() {
                return Ok(PopStatus::Exempt);
            }
            ee.verify_signature_message(
                info,
                request.signature.raw_bytes(),
                &request.algorithm,
                &request.info.public_key,
            )
            .map_err(signature_failure)?;
            Ok(PopStatus::Verified)
        }
        RequestPayload::Crmf {
            message,
            cert_request,
        } => match &message.popo {
            Some(ProofOfPossession::Signature(pk)) => {
                let spki = match &message.cert_req.cert_template.public_key {
                    Some(spki) => spki,
                    None => {
                        return Err(Error::BadRequest(
                            "certificate template does not include a public key".to_string(),
                        ))
                    }
                };
                let signed = match &pk.poposk_input {
                    Some(input) => {
                        if input.public_key != *spki {
                            return Err(Error::PopFailed(
                                "POPOSigningKeyInput names a different public key".to_string(),
                            ));
                        }
                        encode_value_for_pop(input)?
                    }
                    None => cert_request.clone(),
                };
                ee.verify_signature_message(
                    &signed,
                    pk.signature.raw_bytes(),
                    &pk.algorithm_identifier,
                    spki,
                )
                .map_err(signature_failure)?;
                Ok(PopStatus::Verified)
            }
            Some(ProofOfPossession::RaVerified(_)) => match auth_token {
                Some(token) if token.strong_identity => Ok(PopStatus::Verified),
                _ => Err(Error::PopFailed(
                    "raVerified POP requires an authenticated registration authority".to_string(),
                )),
            },
            _ => {
                if settings.get_pop_challenge_enabled() {
                    Ok(PopStatus::ChallengeRequired)
                } else {
                    Err(Error::PopFailed(
                        "request does not include a verifiable POP".to_string(),
                    ))
                }
            }
        },
    }
}

fn encode_value_for_pop(input: &PopoSigningKeyInput) -> Result<Vec<u8>> {
    input
        .to_der()
        .map_err(|e| Error::BadRequest(format!("malformed POPOSigningKeyInput: {}", e)))
}

/// issue_pop_challenge performs the first round of the challenge protocol for `request`, whose
/// public key is `spki`. Artifacts are stored on the request, which is marked PENDING. The caller
/// persists the request.
pub fn issue_pop_challenge(
    ee: &EnrollmentEnvironment,
    settings: &ProfileSettings,
    request: &mut Request,
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<PopChallenge> {
    if spki.algorithm.oid != PKIXALG_RSA_ENCRYPTION {
        return Err(Error::BadRequest(
            "proof of possession challenges require an RSA key".to_string(),
        ));
    }
    let enc_spki = spki
        .to_der()
        .map_err(|e| Error::BadRequest(format!("malformed public key: {}", e)))?;
    RsaPublicKey::from_public_key_der(&enc_spki)
        .map_err(|_| Error::BadRequest("malformed RSA public key".to_string()))?;

    let mut challenge = Zeroizing::new(vec![0u8; POP_CHALLENGE_LEN]);
    let mut key = Zeroizing::new(vec![0u8; AES_256_KEY_LEN]);
    let mut iv = vec![0u8; AES_GCM_IV_LEN];
    ee.generate_random(&mut challenge)?;
    ee.generate_random(&mut key)?;
    ee.generate_random(&mut iv)?;

    let encrypted_challenge = ee.encrypt_symmetric(&PKIXALG_AES256_GCM, &key, &iv, &challenge)?;
    let token = settings.get_issuance_protection_token();
    let sys_wrapped_key = ee.wrap_with_token(&token, &key)?;
    let user_wrapped_key = ee.wrap_for_public_key(spki, &key).map_err(|e| match e {
        Error::Unrecognized => Error::BadRequest("unable to wrap key for requester".to_string()),
        other => other,
    })?;
    let witness_alg_id = alg_id(PKIXALG_SHA256);
    let witness = ee.calculate_hash(&witness_alg_id, &challenge)?;

    let artifacts = ProofArtifacts {
        encrypted_challenge,
        sys_wrapped_key,
        user_wrapped_key,
        iv,
        witness,
    };
    artifacts.store(&mut request.attributes);
    request.attributes.set_pop_challenged(true);
    request.set_status(RequestStatus::Pending)?;

    log_message(
        &EeLogLevels::EeInfo,
        format!("Issued proof of possession challenge for request {}", request.id()).as_str(),
    );
    Ok(PopChallenge {
        request_id: request.id(),
        body_part_id: request.attributes.get_body_part_id().unwrap_or(0),
        encrypted_challenge: artifacts.encrypted_challenge,
        wrapped_key: artifacts.user_wrapped_key,
        iv: artifacts.iv,
        witness_alg_id,
        witness: artifacts.witness,
        pop_alg_id: alg_id(PKIXALG_HMAC_WITH_SHA256),
    })
}

/// Computes the value of a decryptedPOP control, i.e., the keyed digest of the request as
/// originally received using the recovered challenge as the key.
pub fn compute_decrypted_pop(
    ee: &EnrollmentEnvironment,
    pop_alg: &AlgorithmIdentifierOwned,
    challenge: &[u8],
    encoded_request: &[u8],
) -> Result<Vec<u8>> {
    ee.calculate_mac(pop_alg, challenge, encoded_request)
}

/// verify_decrypted_pop performs the second round of the challenge protocol. On success the
/// challenge artifacts are removed from the request and it is marked as having proven possession.
/// Any verification failure is [`Error::PopFailed`]. The caller persists the request.
pub fn verify_decrypted_pop(
    ee: &EnrollmentEnvironment,
    settings: &ProfileSettings,
    request: &mut Request,
    decrypted_pop: &DecryptedPop,
) -> Result<()> {
    if request.status() != RequestStatus::Pending || !request.attributes.get_pop_challenged() {
        return Err(Error::BadRequest(format!(
            "request {} is not awaiting a proof of possession response",
            request.id()
        )));
    }
    let artifacts = match ProofArtifacts::load(&request.attributes)? {
        Some(a) => a,
        None => {
            return Err(Error::BadRequest(
                "proof of possession challenge artifacts are missing".to_string(),
            ))
        }
    };
    let encoded_request = match request.attributes.get_cert_request() {
        Some(r) => r,
        None => {
            return Err(Error::InternalError(format!(
                "request {} does not retain the original request",
                request.id()
            )))
        }
    };

    let token = settings.get_issuance_protection_token();
    let key = ee
        .unwrap_with_token(&token, &artifacts.sys_wrapped_key)
        .map_err(|_| Error::PopFailed("unable to recover challenge key".to_string()))?;
    let challenge = ee
        .decrypt_symmetric(
            &PKIXALG_AES256_GCM,
            &key,
            &artifacts.iv,
            &artifacts.encrypted_challenge,
        )
        .map_err(|_| Error::PopFailed("unable to recover challenge".to_string()))?;
    let digest = ee.calculate_hash(&alg_id(PKIXALG_SHA256), &challenge)?;
    if !witnesses_match(&digest, &artifacts.witness) {
        return Err(Error::PopFailed(
            "recovered challenge does not match witness".to_string(),
        ));
    }

    let expected = compute_decrypted_pop(
        ee,
        &decrypted_pop.the_pop_alg_id,
        &challenge,
        &encoded_request,
    )
    .map_err(|e| match e {
        Error::Unrecognized => Error::PopFailed("unsupported decryptedPOP algorithm".to_string()),
        other => other,
    })?;
    if !witnesses_match(&expected, decrypted_pop.the_pop.as_bytes()) {
        return Err(Error::PopFailed(
            "decryptedPOP does not verify".to_string(),
        ));
    }

    ProofArtifacts::clear(&mut request.attributes);
    request.attributes.set_pop_challenged(false);
    request.attributes.set_pop_verified(true);
    Ok(())
}
