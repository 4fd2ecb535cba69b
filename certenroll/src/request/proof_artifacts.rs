//! The proof_artifacts module provides the transient values of the proof-of-possession challenge
//! protocol that are persisted on a [`Request`](../enrollment_request/struct.Request.html) between
//! the two round trips, and the challenge returned to the requester after the first.

use spki::AlgorithmIdentifierOwned;

use crate::request::enrollment_request::RequestId;
use crate::request::request_attributes::*;
use crate::util::error::*;

/// Artifacts persisted after a challenge is issued. All five values are present together or the
/// request carries none of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofArtifacts {
    /// Challenge encrypted under the ephemeral symmetric key
    pub encrypted_challenge: Vec<u8>,
    /// Ephemeral key wrapped for the issuance-protection token
    pub sys_wrapped_key: Vec<u8>,
    /// Ephemeral key wrapped for the requester's public key
    pub user_wrapped_key: Vec<u8>,
    /// Initialization vector used with the ephemeral key
    pub iv: Vec<u8>,
    /// Digest of the challenge
    pub witness: Vec<u8>,
}

impl ProofArtifacts {
    /// Writes the artifacts to the given attributes.
    pub fn store(&self, attrs: &mut RequestAttributes) {
        attrs.set_pop_encrypted_challenge(self.encrypted_challenge.clone());
        attrs.set_pop_sys_wrapped_key(self.sys_wrapped_key.clone());
        attrs.set_pop_user_wrapped_key(self.user_wrapped_key.clone());
        attrs.set_pop_iv(self.iv.clone());
        attrs.set_pop_witness(self.witness.clone());
    }

    /// Reads artifacts from the given attributes. Returns `Ok(None)` when none are present and
    /// [`Error::BadRequest`] when only some are present.
    pub fn load(attrs: &RequestAttributes) -> Result<Option<ProofArtifacts>> {
        let values = (
            attrs.get_pop_encrypted_challenge(),
            attrs.get_pop_sys_wrapped_key(),
            attrs.get_pop_user_wrapped_key(),
            attrs.get_pop_iv(),
            attrs.get_pop_witness(),
        );
        match values {
            (None, None, None, None, None) => Ok(None),
            (
                Some(encrypted_challenge),
                Some(sys_wrapped_key),
                Some(user_wrapped_key),
                Some(iv),
                Some(witness),
            ) => Ok(Some(ProofArtifacts {
                encrypted_challenge,
                sys_wrapped_key,
                user_wrapped_key,
                iv,
                witness,
            })),
            _ => Err(Error::BadRequest(
                "incomplete proof-of-possession challenge artifacts".to_string(),
            )),
        }
    }

    /// Removes all artifacts from the given attributes.
    pub fn clear(attrs: &mut RequestAttributes) {
        for key in [
            RA_POP_ENCRYPTED_CHALLENGE,
            RA_POP_SYS_WRAPPED_KEY,
            RA_POP_USER_WRAPPED_KEY,
            RA_POP_IV,
            RA_POP_WITNESS,
        ] {
            attrs.remove(key);
        }
    }
}

/// Challenge returned to the requester when proof-of-possession must be established with a second
/// round trip. The requester unwraps `wrapped_key` with its private key, decrypts
/// `encrypted_challenge` and returns a decryptedPOP control computed with `pop_alg_id` over the
/// original request, referencing `request_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopChallenge {
    /// Request that must be referenced by the decryptedPOP control
    pub request_id: RequestId,
    /// Body part ID of the sub-request that was challenged
    pub body_part_id: u32,
    /// Challenge encrypted under the ephemeral symmetric key
    pub encrypted_challenge: Vec<u8>,
    /// Ephemeral key wrapped for the requester's public key
    pub wrapped_key: Vec<u8>,
    /// Initialization vector used with the ephemeral key
    pub iv: Vec<u8>,
    /// Algorithm used to compute the witness over the challenge
    pub witness_alg_id: AlgorithmIdentifierOwned,
    /// Digest of the challenge
    pub witness: Vec<u8>,
    /// Keyed digest algorithm the requester must use to compute the decrypted POP
    pub pop_alg_id: AlgorithmIdentifierOwned,
}

#[test]
fn proof_artifacts_test() {
    let artifacts = ProofArtifacts {
        encrypted_challenge: vec![1; 48],
        sys_wrapped_key: vec![2; 256],
        user_wrapped_key: vec![3; 256],
        iv: vec![4; 12],
        witness: vec![5; 32],
    };
    let mut attrs = RequestAttributes::new();
    assert_eq!(None, ProofArtifacts::load(&attrs).unwrap());

    artifacts.store(&mut attrs);
    assert_eq!(Some(artifacts.clone()), ProofArtifacts::load(&attrs).unwrap());

    attrs.remove(RA_POP_IV);
    assert!(matches!(
        ProofArtifacts::load(&attrs),
        Err(Error::BadRequest(_))
    ));

    ProofArtifacts::clear(&mut attrs);
    assert_eq!(None, ProofArtifacts::load(&attrs).unwrap());
    assert!(attrs.0.is_empty());
}
