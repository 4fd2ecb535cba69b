//! Actions performed by enrolltool, driven by [`EnrollToolArgs`].
//!
//! ```text
//! $ ./target/release/enrolltool -h
//! Certificate request inspection and enrollment preview utility
//!
//! Usage: enrolltool [OPTIONS]
//!
//! Options:
//!   -h, --help     Print help
//!   -V, --version  Print version
//!
//! COMMON OPTIONS:
//!   -r, --request-file <REQUEST_FILE>      Full path and filename of a certificate request
//!   -t, --request-type <REQUEST_TYPE>      Type of the request, i.e., pkcs10, crmf or cmc
//!   -s, --settings <SETTINGS>              Full path and filename of JSON-formatted enrollment profile settings
//!   -l, --logging-config <LOGGING_CONFIG>  Full path and filename of YAML-formatted configuration file for log4rs
//!
//! DIAGNOSTICS:
//!   -i, --inspect    Outputs the decoded structure of the request
//!   -n, --normalize  Outputs the certificate template and policy set for each request
//!
//! SETTINGS:
//!       --generate-settings <GENERATE_SETTINGS>  Full path and filename to receive default settings
//!
//! IDENTITY PROOFING:
//!       --verify-identity                          Verifies identityProof and identityProofV2 controls
//!       --identification <IDENTIFICATION>          Identification string used to locate the shared secret
//!       --shared-secret-file <SHARED_SECRET_FILE>  JSON object mapping identification strings to secrets
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use const_oid::db::DB;
use der::asn1::ObjectIdentifier;
use log::{error, info};

use certenroll::*;

use crate::args::EnrollToolArgs;

fn oid_name(oid: &ObjectIdentifier) -> String {
    match DB.by_oid(oid) {
        Some(name) => name.to_string(),
        None => cmc_oid_lookup(oid),
    }
}

fn pop_description(sub: &SubRequest) -> &'static str {
    match &sub.payload {
        RequestPayload::Pkcs10 { .. } => "signature (PKCS #10)",
        RequestPayload::Crmf { message, .. } => match &message.popo {
            None => "none",
            Some(ProofOfPossession::RaVerified(_)) => "raVerified",
            Some(ProofOfPossession::Signature(_)) => "signature",
            Some(ProofOfPossession::KeyEncipherment(_)) => "keyEncipherment",
            Some(ProofOfPossession::KeyAgreement(_)) => "keyAgreement",
        },
    }
}

fn control_description(kind: &ControlKind) -> String {
    match kind {
        ControlKind::Identification(i) => format!("identification: {}", i),
        ControlKind::IdentityProof(_) => "identityProof".to_string(),
        ControlKind::IdentityProofV2(p) => format!(
            "identityProofV2: {} / {}",
            oid_name(&p.proof_alg_id.oid),
            oid_name(&p.mac_alg_id.oid)
        ),
        ControlKind::DecryptedPop(dp) => format!("decryptedPOP for request {}", dp.body_part_id),
        ControlKind::RegInfo(r) => format!("regInfo ({} bytes)", r.len()),
        ControlKind::PopLinkRandom(r) => format!("popLinkRandom ({} bytes)", r.len()),
        ControlKind::RevokeRequest { request, .. } => format!(
            "revokeRequest: serial number {} issued by {}",
            buffer_to_hex(request.serial_number.as_bytes()),
            request.issuer_name
        ),
        ControlKind::LraPopWitness(w) => format!("lraPOPWitness for {:?}", w.body_ids),
        ControlKind::Unknown { oid, .. } => format!("unrecognized: {}", oid_name(oid)),
    }
}

/// Logs the decoded structure of a submission along with the outcome of proof-of-possession
/// verification for each request.
fn inspect(ee: &EnrollmentEnvironment, settings: &ProfileSettings, decoded: &DecodedSubmission) {
    if let Some(envelope) = &decoded.cmc {
        info!("CMC PKIData");
        info!("\t * Pre-signed: {}", envelope.pre_signed);
        info!("\t * Body part IDs: {:?}", envelope.body_part_ids);
        info!("\t * Controls: {}", envelope.controls.len());
        for control in &envelope.controls {
            info!(
                "\t\t - [{}] {}",
                control.body_part_id,
                control_description(&control.kind)
            );
        }
        if !envelope.cms_sequence.is_empty() || !envelope.other_msgs.is_empty() {
            info!(
                "\t * Content infos: {}, other messages: {}",
                envelope.cms_sequence.len(),
                envelope.other_msgs.len()
            );
        }
    }
    for sub in &decoded.requests {
        info!("Request {} (body part {})", sub.seq_num, sub.body_part_id);
        info!("\t * Type: {}", sub.kind());
        match sub.subject() {
            Some(subject) => info!("\t * Subject: {}", subject),
            None => info!("\t * Subject: (absent)"),
        }
        match sub.public_key() {
            Some(spki) => info!("\t * Public key: {}", oid_name(&spki.algorithm.oid)),
            None => info!("\t * Public key: (absent)"),
        }
        match sub.requested_extensions() {
            Ok(exts) => {
                for ext in exts {
                    info!(
                        "\t * Requested extension: {}{}",
                        oid_name(&ext.extn_id),
                        if ext.critical { " (critical)" } else { "" }
                    );
                }
            }
            Err(e) => error!("\t * Requested extensions: {}", e),
        }
        info!("\t * Proof of possession: {}", pop_description(sub));
        match verify_pop(ee, settings, sub, None, false) {
            Ok(status) => info!("\t * POP status: {:?}", status),
            Err(e) => info!("\t * POP status: {}", e),
        }
        match sub.pop_link_witness() {
            Ok(Some(PopLinkWitness::V1(_))) => info!("\t * POP link witness: V1"),
            Ok(Some(PopLinkWitness::V2(_))) => info!("\t * POP link witness: V2"),
            Ok(None) => {}
            Err(e) => error!("\t * POP link witness: {}", e),
        }
    }
}

/// Logs the template and policy set the profile would produce for each request. Nothing is
/// persisted.
fn normalize(settings: &ProfileSettings, decoded: &DecodedSubmission) {
    for sub in &decoded.requests {
        let mut request = Request::new(RequestId(u64::from(sub.seq_num) + 1), sub.kind());
        info!("Template for request {} (body part {})", sub.seq_num, sub.body_part_id);
        match normalize_request(settings, sub, &mut request, false) {
            Ok(template) => {
                info!("\t * Subject: {}", template.subject);
                info!(
                    "\t * Public key: {}",
                    oid_name(&template.public_key.algorithm.oid)
                );
                for ext in template.extensions.iter() {
                    info!("\t * Extension: {}", oid_name(&ext.extn_id));
                }
                if request.attributes.get_archival_required() {
                    info!("\t * Key archival: required");
                }
                match assign_policy_set(settings, &mut request) {
                    Ok(id) => info!("\t * Policy set: {}", id),
                    Err(e) => error!("\t * Policy set: {}", e),
                }
            }
            Err(e) => error!("\t * Rejected: {}", e),
        }
    }
}

/// Verifies the identity proof controls of a CMC submission
fn verify_identity(
    ee: &EnrollmentEnvironment,
    args: &EnrollToolArgs,
    decoded: &DecodedSubmission,
) -> Result<()> {
    let envelope = match &decoded.cmc {
        Some(envelope) => envelope,
        None => {
            return Err(Error::BadRequest(
                "identity proofs are only carried in CMC requests".to_string(),
            ))
        }
    };
    if !envelope.has_identity_proof() {
        return Err(Error::BadRequest(
            "request does not include an identity proof".to_string(),
        ));
    }
    let identification = match (&args.identification, envelope.identification()) {
        (Some(i), _) => i.clone(),
        (None, Some(i)) => i.to_string(),
        (None, None) => {
            return Err(Error::BadIdentity(
                "no identification was provided".to_string(),
            ))
        }
    };
    let secrets = match &args.shared_secret_file {
        Some(f) => {
            let json = get_file_as_byte_vec(Path::new(f))?;
            let json = String::from_utf8(json).map_err(|_| {
                Error::InternalError(format!("{} does not contain UTF-8 text", f))
            })?;
            SharedSecretSource::from_json(&json)?
        }
        None => {
            return Err(Error::BadIdentity(
                "a shared secret file is required".to_string(),
            ))
        }
    };
    let secret = match secrets.get_shared_secret(Some(&identification), &envelope.pki_data)? {
        Some(s) => s,
        None => {
            return Err(Error::BadIdentity(format!(
                "no shared secret for {}",
                identification
            )))
        }
    };
    let outcome = verify_identity_proofs(ee, envelope, &secret, &identification)?;
    info!("Identity proof verified: {:?}", outcome.verified);
    if let Some(identity) = outcome.proven_identity {
        info!("Proven identity: {}", identity);
    }
    Ok(())
}

/// Writes default settings, with every setting given explicitly, to `path`
fn generate_settings(path: &str) -> Result<()> {
    let defaults = ProfileSettings::default();
    let mut settings = ProfileSettings::default();
    settings.set_profile_id(defaults.get_profile_id());
    settings.set_authority_id(defaults.get_authority_id());
    settings.set_policy_set_ids(defaults.get_policy_set_ids());
    settings.set_verify_pkcs10_signature(defaults.get_verify_pkcs10_signature());
    settings.set_pop_link_witness_required(defaults.get_pop_link_witness_required());
    settings.set_allow_lra_pop_witness(defaults.get_allow_lra_pop_witness());
    settings.set_pop_challenge_enabled(defaults.get_pop_challenge_enabled());
    settings.set_is_ca_profile(defaults.get_is_ca_profile());
    settings.set_issuance_protection_token(defaults.get_issuance_protection_token());
    settings.set_default_extensions(defaults.get_default_extensions());

    let json = serde_json::to_string(&settings)
        .map_err(|e| Error::InternalError(format!("failed to serialize settings: {}", e)))?;
    fs::write(path, json)?;
    info!("Wrote default settings to {}", path);
    Ok(())
}

/// The `options` function performs the actions requested by `args`.
pub fn options(args: &EnrollToolArgs) -> Result<()> {
    if let Some(path) = &args.generate_settings {
        return generate_settings(path);
    }

    let settings = read_settings(&args.settings)?;
    let request_file = match &args.request_file {
        Some(f) => f,
        None => {
            return Err(Error::BadRequest(
                "a request file must be provided".to_string(),
            ))
        }
    };
    let kind = match &args.request_type {
        Some(t) => RequestKind::from_str(t)?,
        None => RequestKind::Unspecified,
    };
    let payload = get_file_as_byte_vec(Path::new(request_file))?;
    let decoded = decode_submission(kind, &payload)?;
    info!(
        "Decoded {} request with {} request(s)",
        decoded.kind,
        decoded.requests.len()
    );

    let mut ee = EnrollmentEnvironment::default();
    populate_rust_crypto_environment(&mut ee);

    if args.inspect {
        inspect(&ee, &settings, &decoded);
    }
    if args.normalize {
        normalize(&settings, &decoded);
    }
    if args.verify_identity {
        verify_identity(&ee, args, &decoded)?;
    }
    Ok(())
}
