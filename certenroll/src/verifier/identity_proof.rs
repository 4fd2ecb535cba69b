//! The identity_proof module verifies the identityProof (RFC 5272 section 6.2.2) and
//! identityProofV2 (section 6.2.1) controls. Both are keyed digests over the encoded reqSequence
//! computed with a secret shared out of band.
//!
//! Version 1 uses HMAC-SHA1 keyed with the SHA-1 hash of the shared secret. Version 2 names the
//! algorithms and keys the MAC with the hash of the shared secret concatenated with the
//! identification string, so a witness computed for one identification fails for any other.

use spki::AlgorithmIdentifierOwned;
use zeroize::Zeroizing;

use crate::asn1::IdentifyProofV2;
use crate::decoder::{CmcEnvelope, ControlKind};
use crate::environment::EnrollmentEnvironment;
use crate::util::crypto::witnesses_match;
use crate::util::enroll_alg_oids::*;
use crate::util::error::*;
use crate::util::logging::*;

pub(crate) fn alg_id(oid: der::asn1::ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    }
}

pub(crate) fn unsupported_alg(e: Error, what: &str) -> Error {
    match e {
        Error::Unrecognized => Error::BadRequest(format!("unsupported {} algorithm", what)),
        other => other,
    }
}

/// Derives the key for version 2 witnesses, i.e., hash(secret || identification).
pub(crate) fn derive_v2_key(
    ee: &EnrollmentEnvironment,
    hash_alg: &AlgorithmIdentifierOwned,
    secret: &[u8],
    identification: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut keying = Zeroizing::new(secret.to_vec());
    keying.extend_from_slice(identification.as_bytes());
    ee.calculate_hash(hash_alg, &keying)
        .map(Zeroizing::new)
        .map_err(|e| unsupported_alg(e, "key derivation"))
}

/// Computes a version 1 identity proof witness over the encoded reqSequence.
pub fn compute_identity_proof_v1(
    ee: &EnrollmentEnvironment,
    secret: &[u8],
    req_sequence: &[u8],
) -> Result<Vec<u8>> {
    let key = Zeroizing::new(ee.calculate_hash(&alg_id(PKIXALG_SHA1), secret)?);
    ee.calculate_mac(&alg_id(PKIXALG_HMAC_SHA1), &key, req_sequence)
}

/// Computes a version 2 identity proof witness over the encoded reqSequence.
pub fn compute_identity_proof_v2(
    ee: &EnrollmentEnvironment,
    proof_alg: &AlgorithmIdentifierOwned,
    mac_alg: &AlgorithmIdentifierOwned,
    secret: &[u8],
    identification: &str,
    req_sequence: &[u8],
) -> Result<Vec<u8>> {
    let key = derive_v2_key(ee, proof_alg, secret, identification)?;
    ee.calculate_mac(mac_alg, &key, req_sequence)
        .map_err(|e| unsupported_alg(e, "identity proof MAC"))
}

/// Verifies a version 1 identity proof witness.
pub fn verify_identity_proof_v1(
    ee: &EnrollmentEnvironment,
    secret: &[u8],
    req_sequence: &[u8],
    witness: &[u8],
) -> Result<()> {
    let computed = compute_identity_proof_v1(ee, secret, req_sequence)?;
    if !witnesses_match(&computed, witness) {
        return Err(Error::BadIdentity(
            "identity proof witness does not verify".to_string(),
        ));
    }
    Ok(())
}

/// Verifies a version 2 identity proof witness.
pub fn verify_identity_proof_v2(
    ee: &EnrollmentEnvironment,
    proof: &IdentifyProofV2,
    secret: &[u8],
    identification: &str,
    req_sequence: &[u8],
) -> Result<()> {
    let computed = compute_identity_proof_v2(
        ee,
        &proof.proof_alg_id,
        &proof.mac_alg_id,
        secret,
        identification,
        req_sequence,
    )?;
    if !witnesses_match(&computed, proof.witness.as_bytes()) {
        return Err(Error::BadIdentity(
            "identity proof V2 witness does not verify".to_string(),
        ));
    }
    Ok(())
}

/// Version of a verified identity proof
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentityProofVersion {
    /// identityProof
    V1,
    /// identityProofV2
    V2,
}

/// Result of verifying the identity proof controls of a CMC submission
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdentityProofOutcome {
    /// Versions of the proofs that verified, in control order
    pub verified: Vec<IdentityProofVersion>,
    /// Identification proven by a version 2 proof
    pub proven_identity: Option<String>,
}

/// Verifies every identity proof control in the envelope using the given secret and
/// identification. Any failure is [`Error::BadIdentity`].
///
/// Only version 2 proofs establish `proven_identity`. A version 1 proof is verified but leaves the
/// authenticated subject unchanged.
pub fn verify_identity_proofs(
    ee: &EnrollmentEnvironment,
    envelope: &CmcEnvelope,
    secret: &[u8],
    identification: &str,
) -> Result<IdentityProofOutcome> {
    let mut outcome = IdentityProofOutcome::default();
    for control in &envelope.controls {
        match &control.kind {
            ControlKind::IdentityProof(witness) => {
                verify_identity_proof_v1(ee, secret, &envelope.req_sequence, witness)?;
                log_message(
                    &EeLogLevels::EeInfo,
                    "Identity proof verified; authenticated subject is not updated by version 1 proofs",
                );
                outcome.verified.push(IdentityProofVersion::V1);
            }
            ControlKind::IdentityProofV2(proof) => {
                verify_identity_proof_v2(
                    ee,
                    proof,
                    secret,
                    identification,
                    &envelope.req_sequence,
                )?;
                outcome.verified.push(IdentityProofVersion::V2);
                outcome.proven_identity = Some(identification.to_string());
            }
            _ => {}
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::populate_rust_crypto_environment;
    use der::asn1::OctetString;

    fn ee() -> EnrollmentEnvironment {
        let mut ee = EnrollmentEnvironment::default();
        populate_rust_crypto_environment(&mut ee);
        ee
    }

    #[test]
    fn identity_proof_v1_test() {
        let ee = ee();
        let req_sequence = [0x30, 0x00];
        let witness = compute_identity_proof_v1(&ee, b"secret", &req_sequence).unwrap();
        assert_eq!(20, witness.len());
        assert!(verify_identity_proof_v1(&ee, b"secret", &req_sequence, &witness).is_ok());
        assert!(matches!(
            verify_identity_proof_v1(&ee, b"Secret", &req_sequence, &witness),
            Err(Error::BadIdentity(_))
        ));
        assert!(matches!(
            verify_identity_proof_v1(&ee, b"secret", &[0x30, 0x01, 0x00], &witness),
            Err(Error::BadIdentity(_))
        ));
    }

    #[test]
    fn identity_proof_v2_test() {
        let ee = ee();
        let req_sequence = [0x30, 0x00];
        let witness = compute_identity_proof_v2(
            &ee,
            &alg_id(PKIXALG_SHA256),
            &alg_id(PKIXALG_HMAC_WITH_SHA256),
            b"secret",
            "alice",
            &req_sequence,
        )
        .unwrap();
        let proof = IdentifyProofV2 {
            proof_alg_id: alg_id(PKIXALG_SHA256),
            mac_alg_id: alg_id(PKIXALG_HMAC_WITH_SHA256),
            witness: OctetString::new(witness).unwrap(),
        };
        assert!(verify_identity_proof_v2(&ee, &proof, b"secret", "alice", &req_sequence).is_ok());
        // the witness is bound to the identification
        assert!(matches!(
            verify_identity_proof_v2(&ee, &proof, b"secret", "mallory", &req_sequence),
            Err(Error::BadIdentity(_))
        ));

        let unsupported = IdentifyProofV2 {
            proof_alg_id: alg_id(PKIXALG_SHA256),
            mac_alg_id: alg_id(PKIXALG_AES256_GCM),
            witness: proof.witness.clone(),
        };
        assert!(matches!(
            verify_identity_proof_v2(&ee, &unsupported, b"secret", "alice", &req_sequence),
            Err(Error::BadRequest(_))
        ));
    }
}
