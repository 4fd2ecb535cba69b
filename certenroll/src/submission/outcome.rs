//! The outcome module provides the input to and results of a submission. Deferral and proof of
//! possession challenges are outcomes rather than errors.

use der::asn1::ObjectIdentifier;

use crate::asn1::BodyPartId;
use crate::environment::{Credentials, IssuedCertificate};
use crate::request::{PopChallenge, RequestId, RequestKind};
use crate::submission::submission_state::SubmissionState;
use crate::util::error::Error;

/// Why a request is pending
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PendingReason {
    /// No authentication token was available, the request awaits manual approval
    Deferred,
    /// Proof of possession must be established by responding to the challenge
    PopRequired(PopChallenge),
}

/// Outcome of processing one request
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// A certificate was issued
    Completed(IssuedCertificate),
    /// The request was persisted and awaits further action
    Pending(PendingReason),
    /// The request was rejected. The value is safe to return to an end caller.
    Rejected(String),
    /// Processing failed. Use [`Error::caller_message`] for text returned to an end caller.
    Error(Error),
}

/// Outcome of one request within a submission
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestOutcome {
    /// Request record created or resumed, if one was
    pub request_id: Option<RequestId>,
    /// Body part ID (or certReqId) of the request
    pub body_part_id: BodyPartId,
    /// State in which processing of the request ended
    pub state: SubmissionState,
    /// Outcome
    pub outcome: Outcome,
}

/// Result of a submission
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubmissionResult {
    /// Per-request outcomes in request order
    pub outcomes: Vec<RequestOutcome>,
    /// revokeRequest controls, as received, for the revocation workflow
    pub revoke_requests: Vec<Vec<u8>>,
    /// Controls that were not recognized, with their encoded values
    pub unknown_controls: Vec<(ObjectIdentifier, Vec<u8>)>,
}

/// A request submitted for enrollment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Declared request type. [`RequestKind::Unspecified`] causes the type to be detected.
    pub request_type: RequestKind,
    /// Request in DER, PEM or base64
    pub payload: Vec<u8>,
    /// Credentials presented with the request
    pub credentials: Credentials,
    /// Locale of the requester
    pub locale: Option<String>,
    /// Prior request being renewed, if any
    pub renewal_of: Option<RequestId>,
}

impl Submission {
    /// Creates a submission with no credentials
    pub fn new(request_type: RequestKind, payload: &[u8]) -> Self {
        Submission {
            request_type,
            payload: payload.to_vec(),
            credentials: Credentials::default(),
            locale: None,
            renewal_of: None,
        }
    }

    /// Sets the credentials presented with the request
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the locale of the requester
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    /// Marks the submission as a renewal of a completed request
    pub fn with_renewal_of(mut self, request_id: RequestId) -> Self {
        self.renewal_of = Some(request_id);
        self
    }
}
