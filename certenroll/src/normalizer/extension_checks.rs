//! The extension_checks module confirms that requested extensions can be interpreted before they
//! are placed in a certificate template.

use const_oid::db::rfc5912::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::asn1::ObjectIdentifier;
use der::Decode;
use x509_cert::ext::pkix::{
    BasicConstraints, CertificatePolicies, ExtendedKeyUsage, KeyUsage, SubjectAltName,
};
use x509_cert::ext::Extension;

use crate::util::error::*;
use crate::util::logging::*;

/// [`RequestedExtension`] provides a wrapper for the requested extension types that are
/// interpreted during normalization. Other extensions are carried without interpretation.
#[derive(PartialEq, Clone, Debug, Eq)]
pub enum RequestedExtension {
    /// Parsed KeyUsage extension
    KeyUsage(KeyUsage),
    /// Parsed BasicConstraints extension
    BasicConstraints(BasicConstraints),
    /// Parsed SubjectAltName extension
    SubjectAltName(SubjectAltName),
    /// Parsed ExtendedKeyUsage extension
    ExtendedKeyUsage(ExtendedKeyUsage),
    /// Parsed CertificatePolicies extension
    CertificatePolicies(CertificatePolicies),
    /// SubjectKeyIdentifier extension value, retained as received
    SubjectKeyIdentifier(Vec<u8>),
    /// Extension that is carried without interpretation
    Uninterpreted(ObjectIdentifier),
}

/// check_extension decodes the value of a requested extension of a type that is interpreted
/// during normalization. Failure to decode is [`Error::UnsupportedExtension`].
pub fn check_extension(ext: &Extension) -> Result<RequestedExtension> {
    macro_rules! parse_or_fail {
        ($t:ident) => {
            match $t::from_der(ext.extn_value.as_bytes()) {
                Ok(v) => Ok(RequestedExtension::$t(v)),
                Err(e) => {
                    log_message(
                        &EeLogLevels::EeError,
                        format!(
                            "Failed to parse requested {} extension: {}",
                            stringify!($t),
                            e
                        )
                        .as_str(),
                    );
                    Err(Error::UnsupportedExtension(ext.extn_id))
                }
            }
        };
    }

    match ext.extn_id {
        ID_CE_KEY_USAGE => parse_or_fail!(KeyUsage),
        ID_CE_BASIC_CONSTRAINTS => parse_or_fail!(BasicConstraints),
        ID_CE_SUBJECT_ALT_NAME => parse_or_fail!(SubjectAltName),
        ID_CE_EXT_KEY_USAGE => parse_or_fail!(ExtendedKeyUsage),
        ID_CE_CERTIFICATE_POLICIES => parse_or_fail!(CertificatePolicies),
        ID_CE_SUBJECT_KEY_IDENTIFIER => Ok(RequestedExtension::SubjectKeyIdentifier(
            ext.extn_value.as_bytes().to_vec(),
        )),
        other => Ok(RequestedExtension::Uninterpreted(other)),
    }
}
