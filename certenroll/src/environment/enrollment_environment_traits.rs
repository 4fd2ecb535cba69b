//! The enrollment_environment_traits module features trait definitions and type definitions that
//! are used by [`EnrollmentEnvironment`] to provide cryptographic functionality and access to the
//! collaborators an enrollment depends upon, i.e., the request queue, shared secret store,
//! authentication managers, issuing authority, key archival service, policy engine and audit log.

use std::collections::BTreeMap;

use der::asn1::ObjectIdentifier;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use zeroize::Zeroizing;

use crate::request::{CertificateTemplate, Request, RequestId, RequestKind};
use crate::util::error::*;
use crate::EnrollmentEnvironment;

/// `CalculateHash` provides a function signature for implementations that perform hashing
pub type CalculateHash = fn(
    &EnrollmentEnvironment,
    &AlgorithmIdentifierOwned, // hash alg
    &[u8],                     // buffer to hash
) -> Result<Vec<u8>>;

/// `CalculateMac` provides a function signature for implementations that compute keyed digests
pub type CalculateMac = fn(
    &EnrollmentEnvironment,
    &AlgorithmIdentifierOwned, // MAC alg
    &[u8],                     // key
    &[u8],                     // buffer to MAC
) -> Result<Vec<u8>>;

/// `VerifySignatureMessage` provides a function signature for implementations that perform
/// signature verification over a message.
pub type VerifySignatureMessage = fn(
    &EnrollmentEnvironment,
    &[u8],                      // message to hash and verify
    &[u8],                      // signature
    &AlgorithmIdentifierOwned,  // signature algorithm
    &SubjectPublicKeyInfoOwned, // public key
) -> Result<()>;

/// `EncryptSymmetric` provides a function signature for implementations that encrypt using a
/// symmetric key.
pub type EncryptSymmetric = fn(
    &EnrollmentEnvironment,
    &ObjectIdentifier, // encryption algorithm
    &[u8],             // key
    &[u8],             // IV
    &[u8],             // plaintext
) -> Result<Vec<u8>>;

/// `DecryptSymmetric` provides a function signature for implementations that decrypt using a
/// symmetric key.
pub type DecryptSymmetric = fn(
    &EnrollmentEnvironment,
    &ObjectIdentifier, // encryption algorithm
    &[u8],             // key
    &[u8],             // IV
    &[u8],             // ciphertext
) -> Result<Zeroizing<Vec<u8>>>;

/// `WrapForPublicKey` provides a function signature for implementations that encrypt a symmetric
/// key for the holder of the private key corresponding to the given public key.
pub type WrapForPublicKey = fn(
    &EnrollmentEnvironment,
    &SubjectPublicKeyInfoOwned, // recipient public key
    &[u8],                      // key to wrap
) -> Result<Vec<u8>>;

/// `GenerateRandom` provides a function signature for implementations that fill a buffer with
/// random bytes.
pub type GenerateRandom = fn(&EnrollmentEnvironment, &mut [u8]) -> Result<()>;

/// Credentials presented alongside a submission, keyed by credential name, e.g., "uid" or "pwd".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials(pub BTreeMap<String, Vec<u8>>);

impl Credentials {
    /// Creates an empty set of credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a credential value
    pub fn insert(&mut self, name: &str, value: &[u8]) {
        self.0.insert(name.to_string(), value.to_vec());
    }

    /// Returns the credential value with the given name, if present
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.0.get(name).map(|v| v.as_slice())
    }
}

/// Result of a successful authentication
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthToken {
    /// Name of the authentication manager that produced the token
    pub auth_manager_id: String,
    /// Authenticated subject, if the manager establishes one
    pub subject: Option<String>,
    /// True when the manager establishes strong identity, e.g., an agent-approved or pre-signed
    /// submission. Strong identity satisfies identity proofing and accepts raVerified POP.
    pub strong_identity: bool,
    /// Additional values asserted by the authentication manager
    pub attributes: BTreeMap<String, String>,
}

/// Certificate returned by an issuing authority
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedCertificate {
    /// Encoded certificate
    pub encoded: Vec<u8>,
}

/// Result reported by a key archival connector
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchivalResult {
    /// True when the archival service accepted the request
    pub success: bool,
    /// Error message reported on failure
    pub error_message: Option<String>,
}

/// Kinds of events reported to [`AuditSink`] implementations
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuditEventKind {
    /// Outcome of authenticating a submission
    Authentication,
    /// Outcome of verifying an identity proof control
    IdentityProof,
    /// Outcome of verifying a POP link witness
    PopLinkWitness,
    /// Outcome of verifying proof of possession
    ProofOfPossession,
    /// A proof of possession challenge was issued
    PopChallenge,
    /// A request was deferred for manual approval
    Deferral,
    /// A request was rejected
    Rejection,
    /// A certificate was issued
    Issuance,
}

/// Outcome associated with an [`AuditEvent`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuditOutcome {
    /// The audited action succeeded
    Success,
    /// The audited action failed
    Failure,
}

/// Structured audit event. The core decides what occurred; formatting and persistence belong to
/// the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEvent {
    /// What occurred
    pub kind: AuditEventKind,
    /// Whether it succeeded
    pub outcome: AuditOutcome,
    /// Request the event pertains to, if any
    pub request_id: Option<RequestId>,
    /// Subject the event pertains to, if known
    pub subject: Option<String>,
    /// Free-form detail
    pub info: String,
}

impl AuditEvent {
    /// Creates an event with no request or subject
    pub fn new(kind: AuditEventKind, outcome: AuditOutcome, info: &str) -> Self {
        AuditEvent {
            kind,
            outcome,
            request_id: None,
            subject: None,
            info: info.to_string(),
        }
    }

    /// Associates the event with a request
    pub fn with_request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Associates the event with a subject
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }
}

/// The [`RequestQueue`] trait enables trait objects to provide persistent storage of requests.
/// Implementations must make create and update operations atomic per request ID and must
/// serialize concurrent updates to the same request.
pub trait RequestQueue {
    /// new_request creates and persists a request in the New status with a fresh ID.
    fn new_request(&self, kind: RequestKind) -> Result<Request>;

    /// find_request returns a copy of the request with the given ID, if any.
    fn find_request(&self, id: RequestId) -> Result<Option<Request>>;

    /// update_request persists the given request.
    fn update_request(&self, request: &Request) -> Result<()>;

    /// replace_request persists `request` only if the stored copy still equals `expected`, i.e.,
    /// no other update landed since `expected` was read. Otherwise fails with
    /// [`Error::BadRequest`](crate::Error::BadRequest) and leaves the stored copy unchanged.
    fn replace_request(&self, expected: &Request, request: &Request) -> Result<()>;

    /// mark_serviced records that the request reached a terminal status and requires no further
    /// attention.
    fn mark_serviced(&self, request: &Request) -> Result<()>;
}

/// The [`SharedSecretResolver`] trait enables trait objects to provide shared secrets used for
/// identity proofing and POP link witnesses.
pub trait SharedSecretResolver {
    /// get_shared_secret returns the secret associated with the identification string or, when no
    /// identification is available, with the encoded PKIData. `Ok(None)` indicates no secret is
    /// known.
    fn get_shared_secret(
        &self,
        identification: Option<&str>,
        pki_data: &[u8],
    ) -> Result<Option<Zeroizing<Vec<u8>>>>;
}

/// The [`Authenticator`] trait enables trait objects to authenticate a submission.
pub trait Authenticator {
    /// authenticate returns a token when the credentials authenticate the requester, `Ok(None)`
    /// when no determination can be made, i.e., the request requires manual approval, and an
    /// error when the credentials are rejected.
    fn authenticate(&self, credentials: &Credentials, payload: &[u8]) -> Result<Option<AuthToken>>;
}

/// The [`Authority`] trait enables trait objects to sign certificates.
pub trait Authority {
    /// issue_certificate issues a certificate from the given template. Errors are reported to the
    /// requester as rejections.
    fn issue_certificate(
        &self,
        authority_id: &str,
        template: &CertificateTemplate,
        profile_id: &str,
        request_id: RequestId,
    ) -> Result<IssuedCertificate>;
}

/// The [`KeyArchivalConnector`] trait enables trait objects to relay requests bearing
/// PKIArchiveOptions to a key archival service.
pub trait KeyArchivalConnector {
    /// send relays the request and reports whether the archival service accepted it.
    fn send(&self, request: &Request) -> ArchivalResult;
}

/// The [`PolicyValidator`] trait enables trait objects to evaluate constraint policies for a request.
pub trait PolicyValidator {
    /// validate returns an error when the request does not satisfy the named policy set.
    fn validate(&self, policy_set_id: &str, request: &Request) -> Result<()>;
}

/// The [`AuditSink`] trait enables trait objects to receive audit events.
pub trait AuditSink {
    /// emit delivers an event to the sink.
    fn emit(&self, event: &AuditEvent);
}
