//! The cmc_builder module assembles CMC PKIData, the controls it carries and the responses a
//! requester returns to a proof-of-possession challenge.

use cms::content_info::ContentInfo;
use der::asn1::{ObjectIdentifier, OctetString, SetOfVec};
use der::{Any, Encode, EncodeValue, Tagged};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use spki::AlgorithmIdentifierOwned;
use zeroize::Zeroizing;

use crate::asn1::*;
use crate::environment::EnrollmentEnvironment;
use crate::request::PopChallenge;
use crate::util::crypto::witnesses_match;
use crate::util::enroll_alg_oids::*;
use crate::util::error::*;
use crate::verifier::*;

/// Returns a TaggedAttribute with a single value
pub fn control<T: Tagged + EncodeValue>(
    body_part_id: BodyPartId,
    attr_type: ObjectIdentifier,
    value: &T,
) -> Result<TaggedAttribute> {
    Ok(TaggedAttribute {
        body_part_id,
        attr_type,
        attr_values: SetOfVec::try_from(vec![Any::encode_from(value)?])?,
    })
}

/// Returns an identification control
pub fn identification_control(body_part_id: BodyPartId, identification: &str) -> Result<TaggedAttribute> {
    control(body_part_id, ID_CMC_IDENTIFICATION, &identification.to_string())
}

/// Returns a control whose value is an OCTET STRING, e.g., popLinkRandom or regInfo
pub fn octet_string_control(
    body_part_id: BodyPartId,
    attr_type: ObjectIdentifier,
    value: &[u8],
) -> Result<TaggedAttribute> {
    control(body_part_id, attr_type, &OctetString::new(value.to_vec())?)
}

/// Returns PKIData with the given controls and requests and empty cmsSequence and
/// otherMsgSequence
pub fn build_pki_data(controls: Vec<TaggedAttribute>, requests: Vec<TaggedRequest>) -> PkiData {
    PkiData {
        control_sequence: controls,
        req_sequence: requests,
        cms_sequence: vec![],
        other_msg_sequence: vec![],
    }
}

/// Returns the encoded reqSequence of `pki_data`, i.e., the value identity proofs are computed
/// over
pub fn encode_req_sequence(pki_data: &PkiData) -> Result<Vec<u8>> {
    Ok(pki_data.req_sequence.to_der()?)
}

/// Returns an identityProof control for the requests currently in `pki_data`
pub fn identity_proof_control(
    ee: &EnrollmentEnvironment,
    body_part_id: BodyPartId,
    secret: &[u8],
    pki_data: &PkiData,
) -> Result<TaggedAttribute> {
    let witness = compute_identity_proof_v1(ee, secret, &encode_req_sequence(pki_data)?)?;
    octet_string_control(body_part_id, ID_CMC_IDENTITY_PROOF, &witness)
}

/// Returns an identityProofV2 control for the requests currently in `pki_data`
pub fn identity_proof_v2_control(
    ee: &EnrollmentEnvironment,
    body_part_id: BodyPartId,
    proof_alg_id: AlgorithmIdentifierOwned,
    mac_alg_id: AlgorithmIdentifierOwned,
    secret: &[u8],
    identification: &str,
    pki_data: &PkiData,
) -> Result<TaggedAttribute> {
    let witness = compute_identity_proof_v2(
        ee,
        &proof_alg_id,
        &mac_alg_id,
        secret,
        identification,
        &encode_req_sequence(pki_data)?,
    )?;
    control(
        body_part_id,
        ID_CMC_IDENTITY_PROOF_V2,
        &IdentifyProofV2 {
            proof_alg_id,
            mac_alg_id,
            witness: OctetString::new(witness)?,
        },
    )
}

/// Encodes `pki_data` in a ContentInfo of type id-cct-PKIData
pub fn wrap_pki_data(pki_data: &PkiData) -> Result<Vec<u8>> {
    let ci = ContentInfo {
        content_type: ID_CCT_PKI_DATA,
        content: Any::encode_from(pki_data)?,
    };
    Ok(ci.to_der()?)
}

/// Recovers the challenge from a [`PopChallenge`] using the requester's RSA private key. The
/// recovered challenge is checked against the witness in the challenge.
pub fn decrypt_pop_challenge(
    ee: &EnrollmentEnvironment,
    challenge: &PopChallenge,
    private_key: &RsaPrivateKey,
) -> Result<Zeroizing<Vec<u8>>> {
    let key = Zeroizing::new(
        private_key
            .decrypt(Pkcs1v15Encrypt, &challenge.wrapped_key)
            .map_err(|_| Error::DecryptionFailed)?,
    );
    let plaintext = ee.decrypt_symmetric(
        &PKIXALG_AES256_GCM,
        &key,
        &challenge.iv,
        &challenge.encrypted_challenge,
    )?;
    let digest = ee.calculate_hash(&challenge.witness_alg_id, &plaintext)?;
    if !witnesses_match(&digest, &challenge.witness) {
        return Err(Error::DecryptionFailed);
    }
    Ok(plaintext)
}

/// Returns a decryptedPOP control answering `challenge`. `encoded_request` is the request as
/// originally submitted, e.g., the encoded TaggedRequest for CMC.
pub fn decrypted_pop_control(
    ee: &EnrollmentEnvironment,
    body_part_id: BodyPartId,
    challenge: &PopChallenge,
    recovered_challenge: &[u8],
    encoded_request: &[u8],
) -> Result<TaggedAttribute> {
    let request_id = u32::try_from(challenge.request_id.0).map_err(|_| {
        Error::BadRequest("request ID can not be expressed as a body part ID".to_string())
    })?;
    let the_pop = compute_decrypted_pop(
        ee,
        &challenge.pop_alg_id,
        recovered_challenge,
        encoded_request,
    )?;
    control(
        body_part_id,
        ID_CMC_DECRYPTED_POP,
        &DecryptedPop {
            body_part_id: request_id,
            the_pop_alg_id: challenge.pop_alg_id.clone(),
            the_pop: OctetString::new(the_pop)?,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::decoder::*;
    use crate::environment::populate_rust_crypto_environment;
    use core::str::FromStr;
    use x509_cert::name::Name;

    #[test]
    fn build_cmc_test() {
        let mut ee = EnrollmentEnvironment::default();
        populate_rust_crypto_environment(&mut ee);
        let signer = RequestSigner::generate_p256();
        let req = build_pkcs10(&signer, &Name::from_str("CN=cmc").unwrap(), &[], vec![]).unwrap();
        let mut pki_data = build_pki_data(
            vec![identification_control(1, "alice").unwrap()],
            vec![TaggedRequest::Tcr(TaggedCertificationRequest {
                body_part_id: 2,
                certification_request: req,
            })],
        );
        let proof = identity_proof_control(&ee, 3, b"secret", &pki_data).unwrap();
        pki_data.control_sequence.push(proof);

        let decoded = decode_submission(
            crate::RequestKind::Unspecified,
            &wrap_pki_data(&pki_data).unwrap(),
        )
        .unwrap();
        assert_eq!(crate::RequestKind::Cmc, decoded.kind);
        let envelope = decoded.cmc.unwrap();
        assert!(!envelope.pre_signed);
        assert_eq!(Some("alice"), envelope.identification());
        assert_eq!(vec![1, 3, 2], envelope.body_part_ids);
        assert_eq!(encode_req_sequence(&pki_data).unwrap(), envelope.req_sequence);
        let outcome = verify_identity_proofs(&ee, &envelope, b"secret", "alice").unwrap();
        assert_eq!(vec![IdentityProofVersion::V1], outcome.verified);
        assert_eq!(None, outcome.proven_identity);
    }
}
