//! The pop_link_witness module verifies the witnesses that bind an individual request to the
//! identity proven for a CMC submission (RFC 5272 section 6.3). The witness is a keyed digest over
//! the popLinkRandom control value. Because the witness travels inside the signed request, a
//! proven identity can not be spliced onto a request signed with an unrelated key.

use spki::AlgorithmIdentifierOwned;
use zeroize::Zeroizing;

use crate::decoder::PopLinkWitness;
use crate::environment::EnrollmentEnvironment;
use crate::util::crypto::witnesses_match;
use crate::util::enroll_alg_oids::*;
use crate::util::error::*;
use crate::verifier::identity_proof::{alg_id, derive_v2_key, unsupported_alg};

/// Computes a version 1 POP link witness, i.e., HMAC-SHA1 keyed with SHA-1(secret) over the
/// popLinkRandom value.
pub fn compute_pop_link_witness_v1(
    ee: &EnrollmentEnvironment,
    secret: &[u8],
    random: &[u8],
) -> Result<Vec<u8>> {
    let key = Zeroizing::new(ee.calculate_hash(&alg_id(PKIXALG_SHA1), secret)?);
    ee.calculate_mac(&alg_id(PKIXALG_HMAC_SHA1), &key, random)
}

/// Computes a version 2 POP link witness keyed with hash(secret || identification).
pub fn compute_pop_link_witness_v2(
    ee: &EnrollmentEnvironment,
    key_gen_alg: &AlgorithmIdentifierOwned,
    mac_alg: &AlgorithmIdentifierOwned,
    secret: &[u8],
    identification: &str,
    random: &[u8],
) -> Result<Vec<u8>> {
    let key = derive_v2_key(ee, key_gen_alg, secret, identification)?;
    ee.calculate_mac(mac_alg, &key, random)
        .map_err(|e| unsupported_alg(e, "POP link witness MAC"))
}

/// Verifies a POP link witness. A mismatch is [`Error::PopFailed`]. A version 2 witness requires
/// an identification string; its absence is [`Error::BadIdentity`].
pub fn verify_pop_link_witness(
    ee: &EnrollmentEnvironment,
    witness: &PopLinkWitness,
    secret: &[u8],
    identification: Option<&str>,
    random: &[u8],
) -> Result<()> {
    let (computed, presented) = match witness {
        PopLinkWitness::V1(presented) => (
            compute_pop_link_witness_v1(ee, secret, random)?,
            presented.as_slice(),
        ),
        PopLinkWitness::V2(w) => {
            let identification = match identification {
                Some(i) => i,
                None => {
                    return Err(Error::BadIdentity(
                        "POP link witness V2 requires identification".to_string(),
                    ))
                }
            };
            (
                compute_pop_link_witness_v2(
                    ee,
                    &w.key_gen_algorithm,
                    &w.mac_algorithm,
                    secret,
                    identification,
                    random,
                )?,
                w.witness.as_bytes(),
            )
        }
    };
    if !witnesses_match(&computed, presented) {
        return Err(Error::PopFailed(
            "POP link witness does not verify".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::PopLinkWitnessV2;
    use crate::environment::populate_rust_crypto_environment;
    use der::asn1::OctetString;

    #[test]
    fn pop_link_witness_test() {
        let mut ee = EnrollmentEnvironment::default();
        populate_rust_crypto_environment(&mut ee);
        let random = [5u8; 20];

        let v1 = compute_pop_link_witness_v1(&ee, b"secret", &random).unwrap();
        let w = PopLinkWitness::V1(v1.clone());
        assert!(verify_pop_link_witness(&ee, &w, b"secret", None, &random).is_ok());
        assert!(matches!(
            verify_pop_link_witness(&ee, &w, b"secret", None, &[6u8; 20]),
            Err(Error::PopFailed(_))
        ));

        let v2 = compute_pop_link_witness_v2(
            &ee,
            &alg_id(PKIXALG_SHA256),
            &alg_id(PKIXALG_HMAC_WITH_SHA256),
            b"secret",
            "alice",
            &random,
        )
        .unwrap();
        let w = PopLinkWitness::V2(PopLinkWitnessV2 {
            key_gen_algorithm: alg_id(PKIXALG_SHA256),
            mac_algorithm: alg_id(PKIXALG_HMAC_WITH_SHA256),
            witness: OctetString::new(v2).unwrap(),
        });
        assert!(verify_pop_link_witness(&ee, &w, b"secret", Some("alice"), &random).is_ok());
        assert!(matches!(
            verify_pop_link_witness(&ee, &w, b"secret", Some("bob"), &random),
            Err(Error::PopFailed(_))
        ));
        assert!(matches!(
            verify_pop_link_witness(&ee, &w, b"secret", None, &random),
            Err(Error::BadIdentity(_))
        ));
    }
}
