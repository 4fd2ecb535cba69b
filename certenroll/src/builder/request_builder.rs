//! The request_builder module assembles PKCS #10 requests and CRMF CertReqMessages.

use der::asn1::{BitString, OctetString, SetOfVec};
use der::{Any, Encode, EncodeValue, Tagged};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::attr::{Attribute, AttributeTypeAndValue};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::asn1::*;
use crate::builder::request_signer::RequestSigner;
use crate::decoder::PopLinkWitness;
use crate::util::error::*;

/// Returns an attribute with a single value
pub fn single_valued_attribute<T: Tagged + EncodeValue>(
    oid: der::asn1::ObjectIdentifier,
    value: &T,
) -> Result<Attribute> {
    Ok(Attribute {
        oid,
        values: SetOfVec::try_from(vec![Any::encode_from(value)?])?,
    })
}

/// Returns an extensionRequest attribute carrying `extensions`
pub fn extension_request_attribute(extensions: &[Extension]) -> Result<Attribute> {
    single_valued_attribute(PKCS9_EXTENSION_REQUEST, &extensions.to_vec())
}

/// Returns the OID and value used to carry a POP link witness in a PKCS #10 attribute or CRMF
/// control
pub fn pop_link_witness_value(witness: &PopLinkWitness) -> Result<(der::asn1::ObjectIdentifier, Any)> {
    Ok(match witness {
        PopLinkWitness::V1(w) => (
            ID_CMC_POP_LINK_WITNESS,
            Any::encode_from(&OctetString::new(w.clone())?)?,
        ),
        PopLinkWitness::V2(w) => (ID_CMC_POP_LINK_WITNESS_V2, Any::encode_from(w)?),
    })
}

/// build_pkcs10 returns a PKCS #10 request for `subject` signed by `signer`. When `extensions`
/// is not empty an extensionRequest attribute is included ahead of `attributes`.
pub fn build_pkcs10(
    signer: &RequestSigner,
    subject: &Name,
    extensions: &[Extension],
    attributes: Vec<Attribute>,
) -> Result<CertReq> {
    let mut attrs = vec![];
    if !extensions.is_empty() {
        attrs.push(extension_request_attribute(extensions)?);
    }
    attrs.extend(attributes);
    let info = CertReqInfo {
        version: Version::V1,
        subject: subject.clone(),
        public_key: signer.spki()?,
        attributes: SetOfVec::try_from(attrs)?,
    };
    let signature = signer.sign(&info.to_der()?)?;
    Ok(CertReq {
        info,
        algorithm: signer.signature_algorithm()?,
        signature: BitString::from_bytes(&signature)?,
    })
}

/// build_cert_request returns a CRMF CertRequest. Fields of `template` other than the public key
/// are used as given.
pub fn build_cert_request(
    cert_req_id: u32,
    mut template: CertTemplate,
    public_key: SubjectPublicKeyInfoOwned,
    controls: Vec<AttributeTypeAndValue>,
) -> CertRequest {
    template.public_key = Some(public_key);
    CertRequest {
        cert_req_id,
        cert_template: template,
        controls: if controls.is_empty() {
            None
        } else {
            Some(controls)
        },
    }
}

/// Returns a signature POP over the encoded `cert_request`. The template must include the
/// signer's public key and a subject, so no POPOSigningKeyInput is included.
pub fn signature_pop(
    signer: &RequestSigner,
    cert_request: &CertRequest,
) -> Result<ProofOfPossession> {
    let signature = signer.sign(&cert_request.to_der()?)?;
    Ok(ProofOfPossession::Signature(PopoSigningKey {
        poposk_input: None,
        algorithm_identifier: signer.signature_algorithm()?,
        signature: BitString::from_bytes(&signature)?,
    }))
}

/// Returns a CertReqMsg for `cert_request` with the given POP
pub fn build_cert_req_msg(
    cert_request: CertRequest,
    popo: Option<ProofOfPossession>,
) -> CertReqMsg {
    CertReqMsg {
        cert_req: cert_request,
        popo,
        reg_info: None,
    }
}

/// Encodes `messages` as CertReqMessages
pub fn build_crmf(messages: &[CertReqMsg]) -> Result<Vec<u8>> {
    Ok(messages.to_vec().to_der()?)
}
