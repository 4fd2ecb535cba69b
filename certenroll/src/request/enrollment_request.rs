//! The enrollment_request module provides the [`Request`] record that is created at intake,
//! persisted by a [`RequestQueue`](../../environment/enrollment_environment_traits/trait.RequestQueue.html)
//! and carried through the enrollment lifecycle.

use core::fmt;
use core::str::FromStr;

use crate::request::request_attributes::RequestAttributes;
use crate::util::error::*;

/// Unique, identity-stable request identifier assigned by a request queue.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a [`Request`]. Transitions are monotonic:
///
/// ```text
/// New     -> Pending | Rejected | Complete
/// Pending -> Complete | Rejected
/// ```
///
/// Complete and Rejected are terminal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RequestStatus {
    /// Newly created, not yet processed
    New,
    /// Awaiting a second round trip or manual approval
    Pending,
    /// Terminally rejected
    Rejected,
    /// Terminally completed, i.e., a certificate was issued
    Complete,
}

impl RequestStatus {
    /// Returns true for Complete and Rejected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Complete | RequestStatus::Rejected)
    }

    /// Returns true if moving from this status to `to` is permitted. Remaining in Pending is
    /// permitted so that a pending request can be updated between round trips.
    pub fn can_transition_to(&self, to: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, to),
            (New, New) | (New, Pending) | (New, Rejected) | (New, Complete)
                | (Pending, Pending)
                | (Pending, Complete)
                | (Pending, Rejected)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::New => "NEW",
            RequestStatus::Pending => "PENDING",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Complete => "COMPLETE",
        };
        write!(f, "{}", s)
    }
}

/// Wire encoding of a submission
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RequestKind {
    /// PKCS #10 CertificationRequest
    Pkcs10,
    /// CRMF CertReqMessages
    Crmf,
    /// CMC ContentInfo wrapping PKIData
    Cmc,
    /// No request type was given
    Unspecified,
}

impl RequestKind {
    /// Returns the name of the request kind as used in request attributes and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Pkcs10 => "pkcs10",
            RequestKind::Crmf => "crmf",
            RequestKind::Cmc => "cmc",
            RequestKind::Unspecified => "",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pkcs10" => Ok(RequestKind::Pkcs10),
            "crmf" => Ok(RequestKind::Crmf),
            "cmc" => Ok(RequestKind::Cmc),
            "" => Ok(RequestKind::Unspecified),
            other => Err(Error::BadRequest(format!(
                "unsupported request type: {}",
                other
            ))),
        }
    }
}

/// Internal request record. The attribute map is the only state persisted for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    id: RequestId,
    kind: RequestKind,
    status: RequestStatus,
    /// Extended data associated with the request
    pub attributes: RequestAttributes,
}

impl Request {
    /// Creates a new request in the New status
    pub fn new(id: RequestId, kind: RequestKind) -> Self {
        Request {
            id,
            kind,
            status: RequestStatus::New,
            attributes: RequestAttributes::new(),
        }
    }

    /// Reassembles a request from persisted parts, for use by request queue implementations.
    pub fn from_parts(
        id: RequestId,
        kind: RequestKind,
        status: RequestStatus,
        attributes: RequestAttributes,
    ) -> Self {
        Request {
            id,
            kind,
            status,
            attributes,
        }
    }

    /// Returns the request identifier
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the kind of request this record was created for
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the current status
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Changes the status of the request, failing with [`Error::InvalidStatusTransition`] if the
    /// change would not be monotonic.
    pub fn set_status(&mut self, to: RequestStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Marks the request rejected and records the reason in the request's attributes.
    pub fn reject(&mut self, reason: &str) -> Result<()> {
        self.set_status(RequestStatus::Rejected)?;
        self.attributes.set_error(reason.to_string());
        Ok(())
    }
}

#[test]
fn status_transition_test() {
    use RequestStatus::*;
    let mut r = Request::new(RequestId(1), RequestKind::Crmf);
    assert_eq!(New, r.status());
    assert!(r.set_status(Pending).is_ok());
    assert!(r.set_status(Pending).is_ok());
    assert_eq!(
        Err(Error::InvalidStatusTransition {
            from: Pending,
            to: New
        }),
        r.set_status(New)
    );
    assert!(r.set_status(Complete).is_ok());
    for s in [New, Pending, Rejected, Complete] {
        assert!(r.set_status(s).is_err());
    }
    assert_eq!(Complete, r.status());

    let mut r = Request::new(RequestId(2), RequestKind::Pkcs10);
    assert!(r.reject("bad").is_ok());
    assert_eq!(Some("bad".to_string()), r.attributes.get_error());
    assert!(r.reject("again").is_err());
    assert!(Rejected.is_terminal());
    assert!(!Pending.is_terminal());
}

#[test]
fn request_kind_test() {
    assert_eq!(RequestKind::Pkcs10, RequestKind::from_str("PKCS10").unwrap());
    assert_eq!(RequestKind::Crmf, RequestKind::from_str("crmf").unwrap());
    assert_eq!(RequestKind::Cmc, RequestKind::from_str(" cmc ").unwrap());
    assert_eq!(RequestKind::Unspecified, RequestKind::from_str("").unwrap());
    assert!(matches!(
        RequestKind::from_str("scep"),
        Err(Error::BadRequest(_))
    ));
    assert_eq!("crmf", RequestKind::Crmf.to_string());
    assert_eq!("PENDING", RequestStatus::Pending.to_string());
}
