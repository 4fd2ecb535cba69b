//! Error types

use core::fmt;

use der::asn1::ObjectIdentifier;

use crate::request::RequestStatus;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Error type
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// BadRequest occurs when a request is malformed, lacks a mandatory control or is of an
    /// unsupported type.
    BadRequest(String),
    /// BadIdentity occurs when an identity proofing witness does not verify or when an identity
    /// proof is presented without the identification it must be paired with.
    BadIdentity(String),
    /// PopFailed occurs when a proof-of-possession signature or a challenge response witness does
    /// not verify.
    PopFailed(String),
    /// UnsupportedExtension occurs when a requested extension cannot be interpreted for inclusion
    /// in a certificate template.
    UnsupportedExtension(ObjectIdentifier),
    /// Rejected occurs when a policy, authority or archival collaborator rejects a request.
    Rejected(String),
    /// InternalError occurs when a collaborator (queue, crypto provider, connector) fails. The
    /// detail is for logs and audit only, see [`Error::caller_message`].
    InternalError(String),
    /// AuthenticationFailed occurs when an authenticator rejects the presented credentials.
    AuthenticationFailed,
    /// NoPolicySet occurs when a request's sequence number exceeds the number of configured
    /// policy sets. The value is the sequence number.
    NoPolicySet(u32),
    /// InvalidStatusTransition occurs when a request status change would not be monotonic.
    InvalidStatusTransition {
        /// current status
        from: RequestStatus,
        /// rejected target status
        to: RequestStatus,
    },
    /// DecryptionFailed occurs when a wrapped key or ciphertext cannot be recovered.
    DecryptionFailed,
    /// NotFound occurs when an action failed because a necessary artifact was not found.
    NotFound,
    /// Unrecognized occurs when an error conditions does not match anything else here.
    Unrecognized,
    /// Asn1Error is used to propagate error information from the der crate.
    Asn1Error(der::Error),
    /// Error encapsulates an error derived from [std::io::ErrorKind]
    StdIoError(std::io::ErrorKind),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.kind())
    }
}

impl Error {
    /// Returns the text that may be returned to an end caller. Collaborator failure detail is
    /// replaced with a generic message.
    pub fn caller_message(&self) -> String {
        match self {
            Error::InternalError(_) | Error::StdIoError(_) => "Internal error".to_string(),
            Error::Asn1Error(_) => "Malformed request".to_string(),
            _ => format!("{}", self),
        }
    }

    /// Returns true for errors that terminate a request as rejected, as opposed to leaving it in
    /// an inspectable failed state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::BadIdentity(_)
                | Error::PopFailed(_)
                | Error::Rejected(_)
                | Error::UnsupportedExtension(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadRequest(s) => write!(f, "BadRequest: {}", s),
            Error::BadIdentity(s) => write!(f, "BadIdentity: {}", s),
            Error::PopFailed(s) => write!(f, "PopFailed: {}", s),
            Error::UnsupportedExtension(oid) => write!(f, "UnsupportedExtension: {}", oid),
            Error::Rejected(s) => write!(f, "Rejected: {}", s),
            Error::InternalError(s) => write!(f, "InternalError: {}", s),
            Error::AuthenticationFailed => write!(f, "AuthenticationFailed"),
            Error::NoPolicySet(n) => write!(f, "NoPolicySet: no policy set for request {}", n),
            Error::InvalidStatusTransition { from, to } => {
                write!(f, "InvalidStatusTransition: {} to {}", from, to)
            }
            Error::DecryptionFailed => write!(f, "DecryptionFailed"),
            Error::NotFound => write!(f, "NotFound"),
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            Error::StdIoError(err) => write!(f, "StdError: {:?}", err),
        }
    }
}

impl std::error::Error for Error {}

#[test]
fn error_test() {
    let _s = format!("{}", Error::BadRequest("x".to_string()));
    let _s = format!("{}", Error::BadIdentity("x".to_string()));
    let _s = format!("{}", Error::PopFailed("x".to_string()));
    let _s = format!(
        "{}",
        Error::UnsupportedExtension(ObjectIdentifier::new_unwrap("2.5.29.15"))
    );
    let _s = format!("{}", Error::Rejected("x".to_string()));
    let _s = format!("{}", Error::AuthenticationFailed);
    let _s = format!("{}", Error::NoPolicySet(3));
    let _s = format!(
        "{}",
        Error::InvalidStatusTransition {
            from: RequestStatus::Complete,
            to: RequestStatus::Pending
        }
    );
    let _s = format!("{}", Error::DecryptionFailed);
    let _s = format!("{}", Error::NotFound);
    let _s = format!("{}", Error::Unrecognized);
    let _s = format!("{}", Error::StdIoError(std::io::ErrorKind::NotFound));

    let internal = Error::InternalError("token slot 3 unavailable".to_string());
    assert_eq!("Internal error", internal.caller_message());
    assert!(!internal.caller_message().contains("slot"));
    assert!(Error::PopFailed("x".to_string()).is_rejection());
    assert!(!Error::BadRequest("x".to_string()).is_rejection());
}
