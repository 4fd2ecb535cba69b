//! The request_attributes module provides the string-keyed variant map carried by each
//! [`Request`](../enrollment_request/struct.Request.html) along with typed accessors for the keys
//! used by this crate. Keys not defined here may be used by collaborators via the map directly.

use std::collections::BTreeMap;

use pkiprocmacros::*;

use crate::request::certificate_template::CertificateTemplate;

/// Buffer is a typedef for a vector of bytes.
pub type Buffer = Vec<u8>;

/// Buffers is a typedef for a vector of Vec<u8>.
pub type Buffers = Vec<Vec<u8>>;

/// Strings is a typedef for a vector of String.
pub type Strings = Vec<String>;

/// `RequestAttributeTypes` is used to define a variant map with types associated with requests
/// as they move through the enrollment lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestAttributeTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents u32 values
    U32(u32),
    /// Represents u64 values
    U64(u64),
    /// Represents String values
    String(String),
    /// Represents vectors of Strings
    Strings(Strings),
    /// Represents vectors of u8 values
    Buffer(Buffer),
    /// Represents vectors of buffers
    Buffers(Buffers),
    /// Represents a certificate template
    CertificateTemplate(CertificateTemplate),
}

/// `RequestAttributes` is a map of values keyed by the static strings below. The map is the only
/// state persisted for a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestAttributes(pub BTreeMap<String, RequestAttributeTypes>);

impl RequestAttributes {
    /// Creates a new empty [`RequestAttributes`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the value associated with the given key, if any.
    pub fn remove(&mut self, key: &str) -> Option<RequestAttributeTypes> {
        self.0.remove(key)
    }

    /// Returns true if a value is associated with the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

//-----------------------------------------------------------------------------------------------
// Request attribute keys
//-----------------------------------------------------------------------------------------------
/// `RA_CERT_TEMPLATE` holds the [`CertificateTemplate`] produced by the normalizer.
pub static RA_CERT_TEMPLATE: &str = "raCertTemplate";
/// `RA_REQUEST_TYPE` holds the request kind the request was decoded from, i.e., pkcs10, crmf or cmc.
pub static RA_REQUEST_TYPE: &str = "raRequestType";
/// `RA_CERT_REQUEST` holds the encoded sub-request exactly as received. For CMC this is the
/// TaggedRequest, for CRMF the CertReqMsg and for PKCS #10 the CertificationRequest.
pub static RA_CERT_REQUEST: &str = "raCertRequest";
/// `RA_SEQ_NUM` holds the 0-based position of the request within its submission.
pub static RA_SEQ_NUM: &str = "raSeqNum";
/// `RA_BODY_PART_ID` holds the CMC body part ID (or CRMF certReqId) of the request.
pub static RA_BODY_PART_ID: &str = "raBodyPartId";
/// `RA_PROFILE_ID` holds the ID of the profile that processed the request.
pub static RA_PROFILE_ID: &str = "raProfileId";
/// `RA_POLICY_SET_ID` holds the ID of the policy set assigned to the request.
pub static RA_POLICY_SET_ID: &str = "raPolicySetId";
/// `RA_SUBJECT_NAME` holds the string form of the requested subject name.
pub static RA_SUBJECT_NAME: &str = "raSubjectName";
/// `RA_SUBJECT_CN` holds the common name from the requested subject name, possibly empty.
pub static RA_SUBJECT_CN: &str = "raSubjectCn";
/// `RA_SUBJECT_UID` holds the user ID from the requested subject name, possibly empty.
pub static RA_SUBJECT_UID: &str = "raSubjectUid";
/// `RA_PUBLIC_KEY` holds the DER-encoded SubjectPublicKeyInfo being certified.
pub static RA_PUBLIC_KEY: &str = "raPublicKey";
/// `RA_REQUESTED_NOT_BEFORE` holds the notBefore value requested via CRMF, in seconds since the epoch.
pub static RA_REQUESTED_NOT_BEFORE: &str = "raRequestedNotBefore";
/// `RA_REQUESTED_NOT_AFTER` holds the notAfter value requested via CRMF, in seconds since the epoch.
pub static RA_REQUESTED_NOT_AFTER: &str = "raRequestedNotAfter";
/// `RA_PKI_ARCHIVE_OPTIONS` holds the encoded PKIArchiveOptions control value.
pub static RA_PKI_ARCHIVE_OPTIONS: &str = "raPkiArchiveOptions";
/// `RA_ARCHIVAL_REQUIRED` indicates the request must be relayed to the key archival connector.
pub static RA_ARCHIVAL_REQUIRED: &str = "raArchivalRequired";
/// `RA_POP_CHALLENGED` indicates a proof-of-possession challenge is outstanding.
pub static RA_POP_CHALLENGED: &str = "raPopChallenged";
/// `RA_POP_ENCRYPTED_CHALLENGE` holds the encrypted challenge.
pub static RA_POP_ENCRYPTED_CHALLENGE: &str = "raPopEncryptedChallenge";
/// `RA_POP_SYS_WRAPPED_KEY` holds the challenge key wrapped for the issuance protection key.
pub static RA_POP_SYS_WRAPPED_KEY: &str = "raPopSysWrappedKey";
/// `RA_POP_USER_WRAPPED_KEY` holds the challenge key wrapped for the requester's public key.
pub static RA_POP_USER_WRAPPED_KEY: &str = "raPopUserWrappedKey";
/// `RA_POP_IV` holds the IV used to encrypt the challenge.
pub static RA_POP_IV: &str = "raPopIv";
/// `RA_POP_WITNESS` holds the digest of the challenge.
pub static RA_POP_WITNESS: &str = "raPopWitness";
/// `RA_POP_VERIFIED` indicates proof of possession has been established for the request.
pub static RA_POP_VERIFIED: &str = "raPopVerified";
/// `RA_AUTH_SUBJECT` holds the authenticated subject, i.e., the identification proven via identity proofing.
pub static RA_AUTH_SUBJECT: &str = "raAuthSubject";
/// `RA_AUTH_MANAGER` holds the ID of the authenticator that authenticated the submission.
pub static RA_AUTH_MANAGER: &str = "raAuthManager";
/// `RA_IDENTIFICATION` holds the value of the CMC identification control.
pub static RA_IDENTIFICATION: &str = "raIdentification";
/// `RA_REG_INFO` holds the value of the CMC regInfo control.
pub static RA_REG_INFO: &str = "raRegInfo";
/// `RA_REVOKE_REQUESTS` holds encoded revokeRequest control values for the revocation workflow.
pub static RA_REVOKE_REQUESTS: &str = "raRevokeRequests";
/// `RA_UNKNOWN_CONTROLS` holds the encoded values of controls that were not recognized.
pub static RA_UNKNOWN_CONTROLS: &str = "raUnknownControls";
/// `RA_ERROR` holds a description of the error that caused the request to fail.
pub static RA_ERROR: &str = "raError";
/// `RA_LOCALE` holds the locale of the submitter.
pub static RA_LOCALE: &str = "raLocale";
/// `RA_ISSUED_CERT` holds the certificate issued for the request.
pub static RA_ISSUED_CERT: &str = "raIssuedCert";
/// `RA_RENEWAL` indicates the request renews a prior request.
pub static RA_RENEWAL: &str = "raRenewal";
/// `RA_RENEWAL_OF` holds the ID of the request being renewed.
pub static RA_RENEWAL_OF: &str = "raRenewalOf";

//-----------------------------------------------------------------------------------------------
// Getters/setters for request attributes
//-----------------------------------------------------------------------------------------------
ra_gets_and_sets!(RA_CERT_TEMPLATE, CertificateTemplate);
ra_gets_and_sets!(RA_REQUEST_TYPE, String);
ra_gets_and_sets!(RA_CERT_REQUEST, Buffer);
ra_gets_and_sets!(RA_SEQ_NUM, u32);
ra_gets_and_sets!(RA_BODY_PART_ID, u32);
ra_gets_and_sets!(RA_PROFILE_ID, String);
ra_gets_and_sets!(RA_POLICY_SET_ID, String);
ra_gets_and_sets!(RA_SUBJECT_NAME, String);
ra_gets_and_sets_with_default!(RA_SUBJECT_CN, String, String::new());
ra_gets_and_sets_with_default!(RA_SUBJECT_UID, String, String::new());
ra_gets_and_sets!(RA_PUBLIC_KEY, Buffer);
ra_gets_and_sets!(RA_REQUESTED_NOT_BEFORE, u64);
ra_gets_and_sets!(RA_REQUESTED_NOT_AFTER, u64);
ra_gets_and_sets!(RA_PKI_ARCHIVE_OPTIONS, Buffer);
ra_gets_and_sets_with_default!(RA_ARCHIVAL_REQUIRED, bool, false);
ra_gets_and_sets_with_default!(RA_POP_CHALLENGED, bool, false);
ra_gets_and_sets!(RA_POP_ENCRYPTED_CHALLENGE, Buffer);
ra_gets_and_sets!(RA_POP_SYS_WRAPPED_KEY, Buffer);
ra_gets_and_sets!(RA_POP_USER_WRAPPED_KEY, Buffer);
ra_gets_and_sets!(RA_POP_IV, Buffer);
ra_gets_and_sets!(RA_POP_WITNESS, Buffer);
ra_gets_and_sets_with_default!(RA_POP_VERIFIED, bool, false);
ra_gets_and_sets!(RA_AUTH_SUBJECT, String);
ra_gets_and_sets!(RA_AUTH_MANAGER, String);
ra_gets_and_sets!(RA_IDENTIFICATION, String);
ra_gets_and_sets!(RA_REG_INFO, Buffer);
ra_gets_and_sets!(RA_REVOKE_REQUESTS, Buffers);
ra_gets_and_sets!(RA_UNKNOWN_CONTROLS, Buffers);
ra_gets_and_sets!(RA_ERROR, String);
ra_gets_and_sets!(RA_LOCALE, String);
ra_gets_and_sets!(RA_ISSUED_CERT, Buffer);
ra_gets_and_sets_with_default!(RA_RENEWAL, bool, false);
ra_gets_and_sets!(RA_RENEWAL_OF, u64);

#[test]
fn request_attributes_test() {
    let mut ra = RequestAttributes::new();
    assert_eq!(None, ra.get_seq_num());
    assert_eq!("", ra.get_subject_cn());
    assert!(!ra.get_pop_challenged());

    ra.set_seq_num(2);
    ra.set_subject_cn("test".to_string());
    ra.set_pop_challenged(true);
    ra.set_pop_iv(vec![1, 2, 3]);
    assert_eq!(Some(2), ra.get_seq_num());
    assert_eq!("test", ra.get_subject_cn());
    assert!(ra.get_pop_challenged());
    assert_eq!(Some(vec![1, 2, 3]), ra.get_pop_iv());

    // a value of the wrong type reads as absent
    ra.0.insert(
        RA_SEQ_NUM.to_string(),
        RequestAttributeTypes::String("x".to_string()),
    );
    assert_eq!(None, ra.get_seq_num());

    assert!(ra.contains(RA_POP_IV));
    ra.remove(RA_POP_IV);
    assert!(!ra.contains(RA_POP_IV));
    assert_eq!(None, ra.get_pop_iv());
}
