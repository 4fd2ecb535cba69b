//! The certificate_template module provides [`CertificateTemplate`], the canonical pre-issuance
//! form of a certificate, and [`ExtensionSet`], the ordered extension container it carries.

use der::asn1::ObjectIdentifier;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;

/// [`ExtensionSet`] is an ordered list of extensions keyed by extension OID. Setting an extension
/// whose OID is already present replaces the existing entry in place, so the position of the
/// first occurrence is retained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionSet(Vec<Extension>);

impl ExtensionSet {
    /// Creates a new empty [`ExtensionSet`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extension or replaces the existing extension with the same OID, returning the
    /// replaced value.
    pub fn set(&mut self, ext: Extension) -> Option<Extension> {
        match self.0.iter_mut().find(|e| e.extn_id == ext.extn_id) {
            Some(existing) => Some(core::mem::replace(existing, ext)),
            None => {
                self.0.push(ext);
                None
            }
        }
    }

    /// Returns the extension with the given OID, if present.
    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.0.iter().find(|e| e.extn_id == *oid)
    }

    /// Removes the extension with the given OID, if present.
    pub fn remove(&mut self, oid: &ObjectIdentifier) -> Option<Extension> {
        let index = self.0.iter().position(|e| e.extn_id == *oid)?;
        Some(self.0.remove(index))
    }

    /// Returns an iterator over the extensions in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Extension> {
        self.0.iter()
    }

    /// Returns the number of extensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no extensions are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy of the extensions in order.
    pub fn to_vec(&self) -> Vec<Extension> {
        self.0.clone()
    }
}

impl From<Vec<Extension>> for ExtensionSet {
    fn from(exts: Vec<Extension>) -> Self {
        let mut set = ExtensionSet::new();
        for ext in exts {
            set.set(ext);
        }
        set
    }
}

/// [`CertificateTemplate`] holds the fields of a certificate to be issued. The serial number,
/// issuer and validity are typically left empty by the normalizer and supplied by policy or by
/// the authority at issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateTemplate {
    /// Certificate version, V3 unless set otherwise
    pub version: Version,
    /// Serial number placeholder
    pub serial_number: Option<SerialNumber>,
    /// Issuer name, if already known
    pub issuer: Option<Name>,
    /// Subject name
    pub subject: Name,
    /// Validity, if determined
    pub validity: Option<Validity>,
    /// Public key being certified
    pub public_key: SubjectPublicKeyInfoOwned,
    /// Extensions to include
    pub extensions: ExtensionSet,
}

impl CertificateTemplate {
    /// Creates a V3 template for the given subject name and public key.
    pub fn new(subject: Name, public_key: SubjectPublicKeyInfoOwned) -> Self {
        CertificateTemplate {
            version: Version::V3,
            serial_number: None,
            issuer: None,
            subject,
            validity: None,
            public_key,
            extensions: ExtensionSet::new(),
        }
    }

    /// Produces a TBSCertificate from the template using the given serial number, issuer, validity
    /// and signature algorithm. Values already present in the template take precedence over the
    /// issuer and validity arguments.
    pub fn to_tbs_certificate(
        &self,
        serial_number: SerialNumber,
        issuer: &Name,
        validity: Validity,
        signature: AlgorithmIdentifierOwned,
    ) -> TbsCertificate {
        let extensions = if self.extensions.is_empty() {
            None
        } else {
            Some(self.extensions.to_vec())
        };
        TbsCertificate {
            version: self.version,
            serial_number: self.serial_number.clone().unwrap_or(serial_number),
            signature,
            issuer: self.issuer.clone().unwrap_or_else(|| issuer.clone()),
            validity: self.validity.unwrap_or(validity),
            subject: self.subject.clone(),
            subject_public_key_info: self.public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions,
        }
    }
}
