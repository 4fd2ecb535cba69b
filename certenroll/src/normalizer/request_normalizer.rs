//! The request_normalizer module populates a [`CertificateTemplate`] and the request attributes
//! derived from a decoded request.

use der::asn1::ObjectIdentifier;
use der::Encode;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::name::Name;

use crate::decoder::{RequestPayload, SubRequest};
use crate::normalizer::extension_checks::*;
use crate::profile::ProfileSettings;
use crate::request::*;
use crate::util::enroll_alg_oids::*;
use crate::util::enroll_utilities::*;
use crate::util::error::*;
use crate::util::logging::*;

/// check_public_key confirms the public key is an RSA or P-256 key that decodes. Other keys are
/// [`Error::BadRequest`].
pub fn check_public_key(spki: &SubjectPublicKeyInfoOwned) -> Result<()> {
    let enc_spki = spki
        .to_der()
        .map_err(|e| Error::BadRequest(format!("malformed public key: {}", e)))?;
    match spki.algorithm.oid {
        PKIXALG_RSA_ENCRYPTION => {
            RsaPublicKey::from_public_key_der(&enc_spki)
                .map_err(|_| Error::BadRequest("malformed RSA public key".to_string()))?;
        }
        PKIXALG_EC_PUBLIC_KEY => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.decode_as::<ObjectIdentifier>().ok());
            if curve != Some(PKIXALG_SECP256R1) {
                return Err(Error::BadRequest("unsupported elliptic curve".to_string()));
            }
            p256::PublicKey::from_public_key_der(&enc_spki)
                .map_err(|_| Error::BadRequest("malformed EC public key".to_string()))?;
        }
        other => {
            return Err(Error::BadRequest(format!(
                "unsupported public key algorithm: {}",
                other
            )))
        }
    }
    Ok(())
}

/// Builds the extension set for a request, starting from the profile defaults and applying each
/// requested extension in order. A requested extension replaces a default with the same OID.
pub fn merge_extensions(settings: &ProfileSettings, sub: &SubRequest) -> Result<ExtensionSet> {
    let mut extensions = settings.get_default_extension_set()?;
    for ext in sub.requested_extensions()? {
        check_extension(&ext)?;
        if extensions.set(ext).is_some() {
            log_message(
                &EeLogLevels::EeDebug,
                "Requested extension replaces profile default",
            );
        }
    }
    Ok(extensions)
}

fn record_subject(request: &mut Request, subject: &Name) {
    request.attributes.set_subject_name(name_to_string(subject));
    request.attributes.set_subject_cn(get_subject_cn(subject));
    request.attributes.set_subject_uid(get_subject_uid(subject));
}

/// Records the identifying attributes of a sub-request on `request`, i.e., its type, position,
/// body part ID and encoding as received.
pub fn record_sub_request(request: &mut Request, sub: &SubRequest) {
    request
        .attributes
        .set_request_type(sub.kind().as_str().to_string());
    request.attributes.set_seq_num(sub.seq_num);
    request.attributes.set_body_part_id(sub.body_part_id);
    request.attributes.set_cert_request(sub.encoded.clone());
}

/// normalize_request builds the certificate template for `sub` and records it, along with the
/// values derived from it, on `request`.
///
/// PKIArchiveOptions are recorded, and archival marked as required, unless `renewal` is set.
/// Requested validity is recorded for CRMF requests but not placed in the template.
pub fn normalize_request(
    settings: &ProfileSettings,
    sub: &SubRequest,
    request: &mut Request,
    renewal: bool,
) -> Result<CertificateTemplate> {
    let spki = match sub.public_key() {
        Some(spki) => spki,
        None => {
            return Err(Error::BadRequest(
                "request does not include a public key".to_string(),
            ))
        }
    };
    check_public_key(spki)?;
    let subject = sub.subject().cloned().unwrap_or_default();

    let mut template = CertificateTemplate::new(subject.clone(), spki.clone());
    template.extensions = merge_extensions(settings, sub)?;

    record_sub_request(request, sub);
    record_subject(request, &subject);
    request.attributes.set_public_key(
        spki.to_der()
            .map_err(|e| Error::BadRequest(format!("malformed public key: {}", e)))?,
    );

    if let RequestPayload::Crmf { message, .. } = &sub.payload {
        if let Some(validity) = &message.cert_req.cert_template.validity {
            if let Some(nb) = &validity.not_before {
                request
                    .attributes
                    .set_requested_not_before(nb.to_unix_duration().as_secs());
            }
            if let Some(na) = &validity.not_after {
                request
                    .attributes
                    .set_requested_not_after(na.to_unix_duration().as_secs());
            }
        }
    }

    if let Some(options) = sub.archive_options()? {
        if renewal {
            log_message(
                &EeLogLevels::EeInfo,
                "Ignoring PKIArchiveOptions in renewal request",
            );
        } else {
            request.attributes.set_pki_archive_options(options);
            request.attributes.set_archival_required(true);
        }
    }

    request.attributes.set_cert_template(template.clone());
    Ok(template)
}
