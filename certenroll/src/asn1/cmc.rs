//! Selected structures from RFC 5272 (Certificate Management over CMS) needed to decode PKIData
//! and the control attributes consumed during enrollment.

use cms::content_info::ContentInfo;
use der::asn1::{GeneralizedTime, OctetString, SetOfVec};
use der::{Any, Choice, Sequence};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier};
use x509_cert::ext::pkix::CrlReason;
use x509_cert::name::Name;
use x509_cert::request::CertReq;
use x509_cert::serial_number::SerialNumber;

use crate::asn1::crmf::CertReqMsg;

/// BodyPartID as defined in [RFC 5272 Section 3.2.1].
///
/// ```text
/// BodyPartID ::= INTEGER(0..4294967295)
/// ```
///
/// [RFC 5272 Section 3.2.1]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1
pub type BodyPartId = u32;

/// PKIData structure as defined in [RFC 5272 Section 3.2.1].
///
/// ```text
/// PKIData ::= SEQUENCE {
///     controlSequence    SEQUENCE SIZE(0..MAX) OF TaggedAttribute,
///     reqSequence        SEQUENCE SIZE(0..MAX) OF TaggedRequest,
///     cmsSequence        SEQUENCE SIZE(0..MAX) OF TaggedContentInfo,
///     otherMsgSequence   SEQUENCE SIZE(0..MAX) OF OtherMsg
/// }
/// ```
///
/// [RFC 5272 Section 3.2.1]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1
#[derive(Clone, Debug, Default, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct PkiData {
    pub control_sequence: Vec<TaggedAttribute>,
    pub req_sequence: Vec<TaggedRequest>,
    pub cms_sequence: Vec<TaggedContentInfo>,
    pub other_msg_sequence: Vec<OtherMsg>,
}

/// TaggedAttribute structure as defined in [RFC 5272 Section 3.2.1.1].
///
/// ```text
/// TaggedAttribute ::= SEQUENCE {
///     bodyPartID         BodyPartID,
///     attrType           OBJECT IDENTIFIER,
///     attrValues         SET OF AttributeValue
/// }
/// ```
///
/// [RFC 5272 Section 3.2.1.1]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct TaggedAttribute {
    pub body_part_id: BodyPartId,
    pub attr_type: ObjectIdentifier,
    pub attr_values: SetOfVec<Any>,
}

/// TaggedRequest structure as defined in [RFC 5272 Section 3.2.1.2].
///
/// ```text
/// TaggedRequest ::= CHOICE {
///     tcr               [0] TaggedCertificationRequest,
///     crm               [1] CertReqMsg,
///     orm               [2] SEQUENCE {
///         bodyPartID            BodyPartID,
///         requestMessageType    OBJECT IDENTIFIER,
///         requestMessageValue   ANY DEFINED BY requestMessageType
///     }
/// }
/// ```
///
/// [RFC 5272 Section 3.2.1.2]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1.2
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
#[allow(missing_docs)]
pub enum TaggedRequest {
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true")]
    Tcr(TaggedCertificationRequest),
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    Crm(CertReqMsg),
    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", constructed = "true")]
    Orm(OtherRequestMessage),
}

/// TaggedCertificationRequest structure as defined in [RFC 5272 Section 3.2.1.2.1].
///
/// ```text
/// TaggedCertificationRequest ::= SEQUENCE {
///     bodyPartID            BodyPartID,
///     certificationRequest  CertificationRequest
/// }
/// ```
///
/// [RFC 5272 Section 3.2.1.2.1]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct TaggedCertificationRequest {
    pub body_part_id: BodyPartId,
    pub certification_request: CertReq,
}

/// The orm alternative of TaggedRequest.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct OtherRequestMessage {
    pub body_part_id: BodyPartId,
    pub request_message_type: ObjectIdentifier,
    pub request_message_value: Any,
}

/// TaggedContentInfo structure as defined in [RFC 5272 Section 3.2.1.3].
///
/// ```text
/// TaggedContentInfo ::= SEQUENCE {
///     bodyPartID              BodyPartID,
///     contentInfo             ContentInfo
/// }
/// ```
///
/// [RFC 5272 Section 3.2.1.3]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1.3
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct TaggedContentInfo {
    pub body_part_id: BodyPartId,
    pub content_info: ContentInfo,
}

/// OtherMsg structure as defined in [RFC 5272 Section 3.2.1.4].
///
/// ```text
/// OtherMsg ::= SEQUENCE {
///     bodyPartID        BodyPartID,
///     otherMsgType      OBJECT IDENTIFIER,
///     otherMsgValue     ANY DEFINED BY otherMsgType }
/// ```
///
/// [RFC 5272 Section 3.2.1.4]: https://datatracker.ietf.org/doc/html/rfc5272#section-3.2.1.4
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct OtherMsg {
    pub body_part_id: BodyPartId,
    pub other_msg_type: ObjectIdentifier,
    pub other_msg_value: Any,
}

/// IdentifyProofV2 structure as defined in [RFC 5272 Section 6.2.1]. The spelling of the type
/// name follows the RFC.
///
/// ```text
/// IdentifyProofV2 ::= SEQUENCE {
///     proofAlgID       AlgorithmIdentifier,
///     macAlgId         AlgorithmIdentifier,
///     witness          OCTET STRING
/// }
/// ```
///
/// [RFC 5272 Section 6.2.1]: https://datatracker.ietf.org/doc/html/rfc5272#section-6.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct IdentifyProofV2 {
    pub proof_alg_id: AlgorithmIdentifierOwned,
    pub mac_alg_id: AlgorithmIdentifierOwned,
    pub witness: OctetString,
}

/// PopLinkWitnessV2 structure as defined in [RFC 5272 Section 6.3.1.1].
///
/// ```text
/// PopLinkWitnessV2 ::= SEQUENCE {
///     keyGenAlgorithm   AlgorithmIdentifier,
///     macAlgorithm      AlgorithmIdentifier,
///     witness           OCTET STRING
/// }
/// ```
///
/// [RFC 5272 Section 6.3.1.1]: https://datatracker.ietf.org/doc/html/rfc5272#section-6.3.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct PopLinkWitnessV2 {
    pub key_gen_algorithm: AlgorithmIdentifierOwned,
    pub mac_algorithm: AlgorithmIdentifierOwned,
    pub witness: OctetString,
}

/// DecryptedPOP structure as defined in [RFC 5272 Section 6.7].
///
/// ```text
/// DecryptedPOP ::= SEQUENCE {
///     bodyPartID      BodyPartID,
///     thePOPAlgID     AlgorithmIdentifier,
///     thePOP          OCTET STRING
/// }
/// ```
///
/// When answering a challenge issued by this implementation, bodyPartID carries the identifier
/// of the pending request.
///
/// [RFC 5272 Section 6.7]: https://datatracker.ietf.org/doc/html/rfc5272#section-6.7
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct DecryptedPop {
    pub body_part_id: BodyPartId,
    pub the_pop_alg_id: AlgorithmIdentifierOwned,
    pub the_pop: OctetString,
}

/// LraPopWitness structure as defined in [RFC 5272 Section 6.8].
///
/// ```text
/// LraPopWitness ::= SEQUENCE {
///     pkiDataBodyid   BodyPartID,
///     bodyIds         SEQUENCE OF BodyPartID
/// }
/// ```
///
/// [RFC 5272 Section 6.8]: https://datatracker.ietf.org/doc/html/rfc5272#section-6.8
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct LraPopWitness {
    pub pki_data_bodyid: BodyPartId,
    pub body_ids: Vec<BodyPartId>,
}

/// RevokeRequest structure as defined in [RFC 5272 Section 6.11].
///
/// ```text
/// RevokeRequest ::= SEQUENCE {
///     issuerName            Name,
///     serialNumber          INTEGER,
///     reason                CRLReason,
///     invalidityDate         GeneralizedTime OPTIONAL,
///     passphrase            OCTET STRING OPTIONAL,
///     comment               UTF8String OPTIONAL }
/// ```
///
/// [RFC 5272 Section 6.11]: https://datatracker.ietf.org/doc/html/rfc5272#section-6.11
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct RevokeRequest {
    pub issuer_name: Name,
    pub serial_number: SerialNumber,
    pub reason: CrlReason,
    #[asn1(optional = "true")]
    pub invalidity_date: Option<GeneralizedTime>,
    #[asn1(optional = "true")]
    pub passphrase: Option<OctetString>,
    #[asn1(optional = "true")]
    pub comment: Option<String>,
}
