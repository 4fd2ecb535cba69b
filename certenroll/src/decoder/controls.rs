//! The controls module classifies CMC control attributes and the per-request controls carried in
//! PKCS #10 attributes and CRMF certificate request controls.

use der::asn1::{ObjectIdentifier, OctetString};
use der::Any;

use crate::asn1::*;
use crate::util::enroll_utilities::*;
use crate::util::error::*;

/// The closed set of CMC controls acted upon during enrollment. Controls with other types are
/// retained verbatim as [`ControlKind::Unknown`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ControlKind {
    /// id-cmc-identification: UTF8String naming the requester
    Identification(String),
    /// id-cmc-identityProof: HMAC-SHA1 witness over the request sequence
    IdentityProof(Vec<u8>),
    /// id-cmc-identityProofV2
    IdentityProofV2(IdentifyProofV2),
    /// id-cmc-decryptedPOP: response to a POP challenge
    DecryptedPop(DecryptedPop),
    /// id-cmc-regInfo
    RegInfo(Vec<u8>),
    /// id-cmc-popLinkRandom: seed for POP link witnesses
    PopLinkRandom(Vec<u8>),
    /// id-cmc-revokeRequest, with the encoded value preserved for the revocation workflow
    RevokeRequest {
        /// RevokeRequest as received
        encoded: Vec<u8>,
        /// Decoded RevokeRequest
        request: RevokeRequest,
    },
    /// id-cmc-lraPOPWitness
    LraPopWitness(LraPopWitness),
    /// Any other control
    Unknown {
        /// Control type
        oid: ObjectIdentifier,
        /// Encoded attribute value
        value: Vec<u8>,
    },
}

/// A single control value along with the body part ID of the TaggedAttribute that carried it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Control {
    /// Body part ID of the carrying TaggedAttribute
    pub body_part_id: BodyPartId,
    /// Classified control value
    pub kind: ControlKind,
}

fn octets(value: &Any, what: &str) -> Result<Vec<u8>> {
    value
        .decode_as::<OctetString>()
        .map(|os| os.as_bytes().to_vec())
        .map_err(|e| Error::BadRequest(format!("malformed {} control: {}", what, e)))
}

fn typed<'a, T: der::Choice<'a> + der::DecodeValue<'a>>(value: &'a Any, what: &str) -> Result<T> {
    value
        .decode_as::<T>()
        .map_err(|e| Error::BadRequest(format!("malformed {} control: {}", what, e)))
}

/// Classifies one value of a control attribute. Malformed values of known controls are
/// [`Error::BadRequest`].
pub fn parse_control(attr_type: &ObjectIdentifier, value: &Any) -> Result<ControlKind> {
    Ok(match *attr_type {
        ID_CMC_IDENTIFICATION => {
            ControlKind::Identification(typed::<String>(value, "identification")?)
        }
        ID_CMC_IDENTITY_PROOF => ControlKind::IdentityProof(octets(value, "identityProof")?),
        ID_CMC_IDENTITY_PROOF_V2 => {
            ControlKind::IdentityProofV2(typed(value, "identityProofV2")?)
        }
        ID_CMC_DECRYPTED_POP => ControlKind::DecryptedPop(typed(value, "decryptedPOP")?),
        ID_CMC_REG_INFO => ControlKind::RegInfo(octets(value, "regInfo")?),
        ID_CMC_POP_LINK_RANDOM => ControlKind::PopLinkRandom(octets(value, "popLinkRandom")?),
        ID_CMC_REVOKE_REQUEST => ControlKind::RevokeRequest {
            encoded: encode_value(value, "revokeRequest")?,
            request: typed(value, "revokeRequest")?,
        },
        ID_CMC_LRA_POP_WITNESS => ControlKind::LraPopWitness(typed(value, "lraPOPWitness")?),
        _ => ControlKind::Unknown {
            oid: *attr_type,
            value: encode_value(value, "control")?,
        },
    })
}

/// Classifies every value of every control attribute in order.
pub fn parse_controls(control_sequence: &[TaggedAttribute]) -> Result<Vec<Control>> {
    let mut controls = vec![];
    for attr in control_sequence {
        for value in attr.attr_values.iter() {
            controls.push(Control {
                body_part_id: attr.body_part_id,
                kind: parse_control(&attr.attr_type, value)?,
            });
        }
    }
    Ok(controls)
}

/// POP link witness carried by an individual request
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PopLinkWitness {
    /// id-cmc-popLinkWitness: HMAC-SHA1 witness over the popLinkRandom value
    V1(Vec<u8>),
    /// id-cmc-popLinkWitnessV2
    V2(PopLinkWitnessV2),
}

/// Classifies a per-request control as a POP link witness. Returns `Ok(None)` for other types.
pub fn parse_pop_link_witness(
    attr_type: &ObjectIdentifier,
    value: &Any,
) -> Result<Option<PopLinkWitness>> {
    match *attr_type {
        ID_CMC_POP_LINK_WITNESS => Ok(Some(PopLinkWitness::V1(octets(value, "popLinkWitness")?))),
        ID_CMC_POP_LINK_WITNESS_V2 => Ok(Some(PopLinkWitness::V2(typed(
            value,
            "popLinkWitnessV2",
        )?))),
        _ => Ok(None),
    }
}
