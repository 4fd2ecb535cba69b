//! Selected structures from RFC 4211 (Certificate Request Message Format) needed to decode CRMF
//! requests and requests carried in CMC PKIData.

use der::asn1::{BitString, Null};
use der::{Any, Choice, Sequence};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::Extensions;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;

/// CertReqMessages structure as defined in [RFC 4211 Section 3].
///
/// ```text
/// CertReqMessages ::= SEQUENCE SIZE (1..MAX) OF CertReqMsg
/// ```
///
/// [RFC 4211 Section 3]: https://datatracker.ietf.org/doc/html/rfc4211#section-3
pub type CertReqMessages = Vec<CertReqMsg>;

/// CertReqMsg structure as defined in [RFC 4211 Section 3].
///
/// ```text
/// CertReqMsg ::= SEQUENCE {
///     certReq   CertRequest,
///     popo       ProofOfPossession  OPTIONAL,
///     -- content depends upon key type
///     regInfo   SEQUENCE SIZE(1..MAX) OF
///         SingleAttribute{{RegInfoSet}} OPTIONAL }
/// ```
///
/// [RFC 4211 Section 3]: https://datatracker.ietf.org/doc/html/rfc4211#section-3
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CertReqMsg {
    pub cert_req: CertRequest,
    #[asn1(optional = "true")]
    pub popo: Option<ProofOfPossession>,
    #[asn1(optional = "true")]
    pub reg_info: Option<Vec<AttributeTypeAndValue>>,
}

/// [`DeferDecodeCertReqMsg`] is used to parse a CertReqMsg while retaining the encoded CertRequest
/// exactly as received. Signature-based proof of possession without a POPOSigningKeyInput is
/// computed over the DER encoding of the CertRequest, so verification uses the received bytes
/// rather than a re-encoding.
pub struct DeferDecodeCertReqMsg {
    /// certReq   CertRequest,
    pub cert_req: Vec<u8>,
    /// popo       ProofOfPossession  OPTIONAL,
    pub popo: Option<ProofOfPossession>,
    /// regInfo   SEQUENCE SIZE(1..MAX) OF AttributeTypeAndValue OPTIONAL
    pub reg_info: Option<Vec<AttributeTypeAndValue>>,
}

impl ::der::FixedTag for DeferDecodeCertReqMsg {
    const TAG: ::der::Tag = ::der::Tag::Sequence;
}

impl<'a> ::der::DecodeValue<'a> for DeferDecodeCertReqMsg {
    fn decode_value<R: ::der::Reader<'a>>(
        reader: &mut R,
        header: ::der::Header,
    ) -> ::der::Result<Self> {
        use ::der::Reader as _;
        reader.read_nested(header.length, |reader| {
            let cert_req = reader.tlv_bytes()?;
            let popo = reader.decode()?;
            let reg_info = reader.decode()?;
            Ok(Self {
                cert_req: cert_req.to_vec(),
                popo,
                reg_info,
            })
        })
    }
}

/// CertRequest structure as defined in [RFC 4211 Section 5].
///
/// ```text
/// CertRequest ::= SEQUENCE {
///     certReqId     INTEGER,
///     -- ID for matching request and reply
///     certTemplate  CertTemplate,
///     -- Selected fields of cert to be issued
///     controls      Controls OPTIONAL }
///     -- Attributes affecting issuance
///
/// Controls  ::= SEQUENCE SIZE(1..MAX) OF SingleAttribute
///                   {{RegControlSet}}
/// ```
///
/// [RFC 4211 Section 5]: https://datatracker.ietf.org/doc/html/rfc4211#section-5
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CertRequest {
    pub cert_req_id: u32,
    pub cert_template: CertTemplate,
    #[asn1(optional = "true")]
    pub controls: Option<Vec<AttributeTypeAndValue>>,
}

/// CertTemplate structure as defined in [RFC 4211 Section 5].
///
/// ```text
/// CertTemplate ::= SEQUENCE {
///     version      [0] Version               OPTIONAL,
///     serialNumber [1] INTEGER               OPTIONAL,
///     signingAlg   [2] AlgorithmIdentifier{SIGNATURE-ALGORITHM,
///                          {SignatureAlgorithms}}   OPTIONAL,
///     issuer       [3] Name                  OPTIONAL,
///     validity     [4] OptionalValidity      OPTIONAL,
///     subject      [5] Name                  OPTIONAL,
///     publicKey    [6] SubjectPublicKeyInfo  OPTIONAL,
///     issuerUID    [7] UniqueIdentifier      OPTIONAL,
///     subjectUID   [8] UniqueIdentifier      OPTIONAL,
///     extensions   [9] Extensions{{CertExtensions}}  OPTIONAL }
/// ```
///
/// The module uses IMPLICIT tags, except that Name is a CHOICE and is therefore explicitly tagged.
///
/// [RFC 4211 Section 5]: https://datatracker.ietf.org/doc/html/rfc4211#section-5
#[derive(Clone, Debug, Default, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CertTemplate {
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub version: Option<u8>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub serial_number: Option<SerialNumber>,
    #[asn1(
        context_specific = "2",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub signing_alg: Option<AlgorithmIdentifierOwned>,
    #[asn1(
        context_specific = "3",
        tag_mode = "EXPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub issuer: Option<Name>,
    #[asn1(
        context_specific = "4",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub validity: Option<OptionalValidity>,
    #[asn1(
        context_specific = "5",
        tag_mode = "EXPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub subject: Option<Name>,
    #[asn1(
        context_specific = "6",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub public_key: Option<SubjectPublicKeyInfoOwned>,
    #[asn1(context_specific = "7", tag_mode = "IMPLICIT", optional = "true")]
    pub issuer_uid: Option<BitString>,
    #[asn1(context_specific = "8", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_uid: Option<BitString>,
    #[asn1(
        context_specific = "9",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub extensions: Option<Extensions>,
}

/// OptionalValidity structure as defined in [RFC 4211 Section 5].
///
/// ```text
/// OptionalValidity ::= SEQUENCE {
///     notBefore  [0] Time OPTIONAL,
///     notAfter   [1] Time OPTIONAL } -- at least one MUST be present
/// ```
///
/// [RFC 4211 Section 5]: https://datatracker.ietf.org/doc/html/rfc4211#section-5
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct OptionalValidity {
    #[asn1(
        context_specific = "0",
        tag_mode = "EXPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub not_before: Option<Time>,
    #[asn1(
        context_specific = "1",
        tag_mode = "EXPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub not_after: Option<Time>,
}

/// ProofOfPossession structure as defined in [RFC 4211 Section 4].
///
/// ```text
/// ProofOfPossession ::= CHOICE {
///     raVerified        [0] NULL,
///     -- used if the RA has already verified that the requester is in
///     -- possession of the private key
///     signature         [1] POPOSigningKey,
///     keyEncipherment   [2] POPOPrivKey,
///     keyAgreement      [3] POPOPrivKey }
/// ```
///
/// POPOPrivKey is itself a CHOICE and is retained as an explicitly tagged [`Any`].
///
/// [RFC 4211 Section 4]: https://datatracker.ietf.org/doc/html/rfc4211#section-4
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
#[allow(missing_docs)]
pub enum ProofOfPossession {
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    RaVerified(Null),
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    Signature(PopoSigningKey),
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", constructed = "true")]
    KeyEncipherment(Any),
    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", constructed = "true")]
    KeyAgreement(Any),
}

/// POPOSigningKey structure as defined in [RFC 4211 Section 4.1].
///
/// ```text
/// POPOSigningKey ::= SEQUENCE {
///     poposkInput           [0] POPOSigningKeyInput OPTIONAL,
///     algorithmIdentifier   AlgorithmIdentifier{SIGNATURE-ALGORITHM,
///                               {SignatureAlgorithms}},
///     signature             BIT STRING }
/// ```
///
/// [RFC 4211 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc4211#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct PopoSigningKey {
    #[asn1(
        context_specific = "0",
        tag_mode = "IMPLICIT",
        constructed = "true",
        optional = "true"
    )]
    pub poposk_input: Option<PopoSigningKeyInput>,
    pub algorithm_identifier: AlgorithmIdentifierOwned,
    pub signature: BitString,
}

/// POPOSigningKeyInput structure as defined in [RFC 4211 Section 4.1].
///
/// ```text
/// POPOSigningKeyInput ::= SEQUENCE {
///     authInfo            CHOICE {
///      sender              [0] GeneralName,
///      -- used only if an authenticated identity has been
///      -- established for the sender (e.g., a DN from a
///      -- previously-issued and currently-valid certificate)
///      publicKeyMAC        PKMACValue },
///      -- used if no authenticated GeneralName currently exists for
///      -- the sender; publicKeyMAC contains a password-based MAC
///      -- on the DER-encoded value of publicKey
///     publicKey           SubjectPublicKeyInfo }  -- from CertTemplate
/// ```
///
/// [RFC 4211 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc4211#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct PopoSigningKeyInput {
    pub auth_info: Any,
    pub public_key: SubjectPublicKeyInfoOwned,
}
