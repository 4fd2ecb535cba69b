//! The enrollment_profile module drives submissions through the submission state machine.
//!
//! A submission is decoded, authenticated and its batch-level CMC controls processed (identity
//! proofing, identification, revocation and unrecognized controls). Each request is then recorded
//! in the request queue, checked for a POP link witness, normalized, assigned a policy set and
//! checked for proof of possession. Requests that pass are validated against policy and issued,
//! or deferred when the submission was not authenticated. Requests without a verifiable POP are
//! challenged and left PENDING until a second submission carries a decryptedPOP control naming
//! them.
//!
//! Failures that apply to the whole batch, e.g., malformed input, failed authentication or a
//! failed identity proof, are returned as errors. Failures of an individual request mark that
//! request REJECTED and are reported in its [`RequestOutcome`] without affecting its siblings.

use std::collections::BTreeSet;

use spki::SubjectPublicKeyInfoOwned;

use crate::asn1::*;
use crate::decoder::*;
use crate::environment::*;
use crate::normalizer::*;
use crate::profile::*;
use crate::request::*;
use crate::submission::outcome::*;
use crate::submission::session_context::*;
use crate::submission::submission_state::*;
use crate::util::enroll_utilities::{buffer_to_hex, encode_value};
use crate::util::error::*;
use crate::util::logging::*;
use crate::verifier::*;

/// An enrollment profile: the environment supplying crypto and collaborators along with the
/// settings that govern how requests are processed
pub struct EnrollmentProfile<'a> {
    ee: &'a EnrollmentEnvironment,
    settings: &'a ProfileSettings,
}

impl<'a> EnrollmentProfile<'a> {
    /// Creates a profile that uses the given environment and settings
    pub fn new(ee: &'a EnrollmentEnvironment, settings: &'a ProfileSettings) -> Self {
        EnrollmentProfile { ee, settings }
    }

    /// submit processes a submission. Batch-level failures are returned as errors; per-request
    /// results, including deferrals and POP challenges, are returned in the [`SubmissionResult`].
    pub fn submit(&self, submission: &Submission) -> Result<SubmissionResult> {
        let mut session = SessionContext::new(submission.locale.clone());
        let mut machine = StateMachine::new("submission");

        let decoded = decode_submission(submission.request_type, &submission.payload)?;

        machine.advance(SubmissionState::Authenticating)?;
        let auth_token = match self
            .ee
            .authenticate(&submission.credentials, &submission.payload)
        {
            Ok(t) => t,
            Err(e) => {
                self.ee.audit(AuditEvent::new(
                    AuditEventKind::Authentication,
                    AuditOutcome::Failure,
                    &e.to_string(),
                ));
                return Err(e);
            }
        };
        if let Some(t) = &auth_token {
            self.ee.audit(
                AuditEvent::new(
                    AuditEventKind::Authentication,
                    AuditOutcome::Success,
                    &t.auth_manager_id,
                )
                .with_subject(t.subject.clone()),
            );
        }
        session.set_auth_token(auth_token);

        machine.advance(SubmissionState::ControlProcessing)?;
        let mut result = SubmissionResult::default();
        self.process_controls(&mut session, &decoded, &mut result)?;

        let responses: Vec<&DecryptedPop> = match &decoded.cmc {
            Some(envelope) => envelope
                .controls
                .iter()
                .filter_map(|c| match &c.kind {
                    ControlKind::DecryptedPop(dp) => Some(dp),
                    _ => None,
                })
                .collect(),
            None => vec![],
        };
        if !responses.is_empty() {
            if !decoded.requests.is_empty() {
                log_message(
                    &EeLogLevels::EeWarn,
                    "Ignoring reqSequence of a submission carrying decryptedPOP controls",
                );
            }
            for dp in responses {
                let outcome = self.complete_challenge(&mut session, dp);
                result.outcomes.push(outcome);
            }
            return Ok(result);
        }

        let prior = match submission.renewal_of {
            Some(id) => Some(self.load_renewal(&session, id)?),
            None => None,
        };
        let lra_exempt = self.lra_exemptions(&session, &decoded);
        for sub in &decoded.requests {
            let outcome =
                self.process_request(&mut session, &decoded, sub, prior.as_ref(), &lra_exempt, &result);
            result.outcomes.push(outcome);
        }
        Ok(result)
    }

    /// Processes the batch-level CMC controls once per session. Identity proofs are verified
    /// unless authentication established strong identity or the batch carries a revokeRequest.
    pub(crate) fn process_controls(
        &self,
        session: &mut SessionContext,
        decoded: &DecodedSubmission,
        result: &mut SubmissionResult,
    ) -> Result<()> {
        if session.is_marked(SessionMarkers::ControlsProcessed) {
            log_message(
                &EeLogLevels::EeDebug,
                "Controls already processed for this submission",
            );
            return Ok(());
        }
        let envelope = match &decoded.cmc {
            Some(envelope) => envelope,
            None => {
                session.mark(SessionMarkers::ControlsProcessed);
                return Ok(());
            }
        };

        for control in &envelope.controls {
            match &control.kind {
                ControlKind::Identification(ident) => {
                    if session.identification().is_none() {
                        session.set_identification(ident);
                    }
                }
                ControlKind::RegInfo(reg_info) => session.set_reg_info(reg_info.clone()),
                ControlKind::RevokeRequest { encoded, request } => {
                    log_message(
                        &EeLogLevels::EeInfo,
                        format!(
                            "Retaining revokeRequest for serial number {} for the revocation workflow",
                            buffer_to_hex(request.serial_number.as_bytes())
                        )
                        .as_str(),
                    );
                    result.revoke_requests.push(encoded.clone());
                }
                ControlKind::Unknown { oid, value } => {
                    log_message(
                        &EeLogLevels::EeInfo,
                        format!("Retaining unrecognized control {}", cmc_oid_lookup(oid)).as_str(),
                    );
                    result.unknown_controls.push((*oid, value.clone()));
                }
                _ => {}
            }
        }

        if envelope.has_identity_proof() {
            if envelope.identification().is_none() {
                let e = Error::BadIdentity(
                    "identity proof requires an identification control".to_string(),
                );
                self.ee.audit(AuditEvent::new(
                    AuditEventKind::IdentityProof,
                    AuditOutcome::Failure,
                    &e.to_string(),
                ));
                return Err(e);
            }
            if envelope.has_revoke_request() {
                log_message(
                    &EeLogLevels::EeInfo,
                    "Skipping identity proof verification for revocation request",
                );
            } else if session.strong_identity() {
                log_message(
                    &EeLogLevels::EeInfo,
                    "Skipping identity proof verification for strongly authenticated submission",
                );
            } else {
                self.verify_identity(session, envelope)?;
            }
        }
        session.mark(SessionMarkers::ControlsProcessed);
        Ok(())
    }

    fn verify_identity(&self, session: &mut SessionContext, envelope: &CmcEnvelope) -> Result<()> {
        let fail = |e: Error| {
            self.ee.audit(AuditEvent::new(
                AuditEventKind::IdentityProof,
                AuditOutcome::Failure,
                &e.to_string(),
            ));
            e
        };
        let identification = match envelope.identification() {
            Some(i) => i.to_string(),
            None => {
                return Err(fail(Error::BadIdentity(
                    "identity proof requires an identification control".to_string(),
                )))
            }
        };
        let secret = match session
            .shared_secret(self.ee, Some(&identification), &envelope.pki_data)
            .map_err(fail)?
        {
            Some(s) => s,
            None => {
                return Err(fail(Error::BadIdentity(format!(
                    "no shared secret available for {}",
                    identification
                ))))
            }
        };
        let outcome = verify_identity_proofs(self.ee, envelope, &secret, &identification)
            .map_err(fail)?;
        if let Some(identity) = outcome.proven_identity {
            session.set_proven_identity(identity);
        }
        session.mark(SessionMarkers::IdentityVerified);
        self.ee.audit(
            AuditEvent::new(
                AuditEventKind::IdentityProof,
                AuditOutcome::Success,
                &format!("{:?}", outcome.verified),
            )
            .with_subject(Some(identification)),
        );
        Ok(())
    }

    /// Returns the body part IDs named by lraPOPWitness controls when the profile permits the
    /// exemption and the submission is strongly authenticated.
    fn lra_exemptions(
        &self,
        session: &SessionContext,
        decoded: &DecodedSubmission,
    ) -> BTreeSet<BodyPartId> {
        let mut exempt = BTreeSet::new();
        let envelope = match &decoded.cmc {
            Some(envelope) => envelope,
            None => return exempt,
        };
        for control in &envelope.controls {
            if let ControlKind::LraPopWitness(w) = &control.kind {
                if self.settings.get_allow_lra_pop_witness() && session.strong_identity() {
                    exempt.extend(w.body_ids.iter());
                } else {
                    log_message(
                        &EeLogLevels::EeWarn,
                        "Ignoring lraPOPWitness control",
                    );
                }
            }
        }
        exempt
    }

    /// Loads the completed request named for renewal. Only the subject that authenticated the
    /// prior request, or a submitter with strong identity, may renew it.
    fn load_renewal(&self, session: &SessionContext, id: RequestId) -> Result<Request> {
        let prior = match self.ee.request_queue()?.find_request(id)? {
            Some(prior) => prior,
            None => {
                return Err(Error::BadRequest(format!(
                    "request {} named for renewal was not found",
                    id
                )))
            }
        };
        if prior.status() != RequestStatus::Complete || prior.attributes.get_cert_template().is_none()
        {
            return Err(Error::BadRequest(format!(
                "request {} named for renewal is not complete",
                id
            )));
        }
        let owner = prior.attributes.get_auth_subject();
        let authorized = session.strong_identity()
            || (owner.is_some() && owner == session.authenticated_subject());
        if !authorized {
            let e = Error::BadIdentity(format!(
                "submitter may not renew request {}",
                id
            ));
            self.ee.audit(
                AuditEvent::new(AuditEventKind::Authentication, AuditOutcome::Failure, &e.to_string())
                    .with_request(id)
                    .with_subject(session.authenticated_subject()),
            );
            return Err(e);
        }
        Ok(prior)
    }

    fn process_request(
        &self,
        session: &mut SessionContext,
        decoded: &DecodedSubmission,
        sub: &SubRequest,
        prior: Option<&Request>,
        lra_exempt: &BTreeSet<BodyPartId>,
        result: &SubmissionResult,
    ) -> RequestOutcome {
        let label = format!("body part {}", sub.body_part_id);
        let mut machine = StateMachine::resume(&label, SubmissionState::ControlProcessing);
        let created = self
            .ee
            .request_queue()
            .and_then(|q| q.new_request(sub.kind()));
        let mut request = match created {
            Ok(r) => r,
            Err(e) => {
                log_message(
                    &EeLogLevels::EeError,
                    format!("Failed to create request for {}: {}", label, e).as_str(),
                );
                machine.reject();
                return RequestOutcome {
                    request_id: None,
                    body_part_id: sub.body_part_id,
                    state: machine.state(),
                    outcome: Outcome::Error(e),
                };
            }
        };

        let outcome = match self.run_request(
            session,
            decoded,
            sub,
            prior,
            lra_exempt,
            result,
            &mut request,
            &mut machine,
        ) {
            Ok(o) => o,
            Err(e) => self.fail_request(&mut request, &mut machine, e),
        };
        RequestOutcome {
            request_id: Some(request.id()),
            body_part_id: sub.body_part_id,
            state: machine.state(),
            outcome,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_request(
        &self,
        session: &mut SessionContext,
        decoded: &DecodedSubmission,
        sub: &SubRequest,
        prior: Option<&Request>,
        lra_exempt: &BTreeSet<BodyPartId>,
        result: &SubmissionResult,
        request: &mut Request,
        machine: &mut StateMachine,
    ) -> Result<Outcome> {
        self.record_session(session, result, request);
        self.check_pop_link_witness(session, decoded, sub)?;

        let template = match prior {
            Some(prior) => self.renew(prior, sub, request)?,
            None => normalize_request(self.settings, sub, request, false)?,
        };
        assign_policy_set(self.settings, request)?;

        let exempt = lra_exempt.contains(&sub.body_part_id);
        let status = match verify_pop(self.ee, self.settings, sub, session.auth_token(), exempt) {
            Ok(status) => status,
            Err(e) => {
                self.ee.audit(
                    AuditEvent::new(
                        AuditEventKind::ProofOfPossession,
                        AuditOutcome::Failure,
                        &e.to_string(),
                    )
                    .with_request(request.id()),
                );
                return Err(e);
            }
        };
        match status {
            PopStatus::Verified => {
                request.attributes.set_pop_verified(true);
                self.ee.audit(
                    AuditEvent::new(
                        AuditEventKind::ProofOfPossession,
                        AuditOutcome::Success,
                        "proof of possession verified",
                    )
                    .with_request(request.id()),
                );
            }
            PopStatus::Exempt => {
                log_message(
                    &EeLogLevels::EeWarn,
                    format!("Proof of possession not verified for request {}", request.id())
                        .as_str(),
                );
            }
            PopStatus::ChallengeRequired => {
                return self.challenge(request, machine, &template.public_key);
            }
        }
        self.finish_request(session, request, machine)
    }

    /// Records values established for the submission on a request
    fn record_session(
        &self,
        session: &SessionContext,
        result: &SubmissionResult,
        request: &mut Request,
    ) {
        request
            .attributes
            .set_profile_id(self.settings.get_profile_id());
        if let Some(locale) = session.locale() {
            request.attributes.set_locale(locale.to_string());
        }
        if let Some(token) = session.auth_token() {
            request
                .attributes
                .set_auth_manager(token.auth_manager_id.clone());
        }
        if let Some(subject) = session.authenticated_subject() {
            request.attributes.set_auth_subject(subject);
        }
        if let Some(identification) = session.identification() {
            request
                .attributes
                .set_identification(identification.to_string());
        }
        if let Some(reg_info) = session.reg_info() {
            request.attributes.set_reg_info(reg_info.to_vec());
        }
        if !result.revoke_requests.is_empty() {
            request
                .attributes
                .set_revoke_requests(result.revoke_requests.clone());
        }
        if !result.unknown_controls.is_empty() {
            request.attributes.set_unknown_controls(
                result
                    .unknown_controls
                    .iter()
                    .map(|(_, v)| v.clone())
                    .collect(),
            );
        }
    }

    /// Verifies the POP link witness of a request bearing a signature POP when the profile
    /// requires one. Each request is verified at most once per session.
    fn check_pop_link_witness(
        &self,
        session: &mut SessionContext,
        decoded: &DecodedSubmission,
        sub: &SubRequest,
    ) -> Result<()> {
        if !self.settings.get_pop_link_witness_required() || !has_signature_pop(sub) {
            return Ok(());
        }
        if session.is_pop_link_verified(sub.body_part_id) {
            return Ok(());
        }
        let envelope = match &decoded.cmc {
            Some(envelope) => envelope,
            None => {
                return Err(Error::BadRequest(
                    "POP link witness requires a CMC submission".to_string(),
                ))
            }
        };
        let random = match envelope.pop_link_random() {
            Some(r) => r,
            None => {
                return Err(Error::BadRequest(
                    "popLinkRandom control is missing".to_string(),
                ))
            }
        };
        let witness = match sub.pop_link_witness()? {
            Some(w) => w,
            None => {
                return Err(Error::BadRequest(format!(
                    "request in body part {} does not include a POP link witness",
                    sub.body_part_id
                )))
            }
        };
        let identification = envelope.identification();
        let secret = match session.shared_secret(self.ee, identification, &envelope.pki_data)? {
            Some(s) => s,
            None => {
                return Err(Error::BadIdentity(
                    "no shared secret available for POP link witness".to_string(),
                ))
            }
        };
        let verified = verify_pop_link_witness(self.ee, &witness, &secret, identification, random);
        let outcome = match verified {
            Ok(()) => AuditOutcome::Success,
            Err(_) => AuditOutcome::Failure,
        };
        self.ee.audit(
            AuditEvent::new(
                AuditEventKind::PopLinkWitness,
                outcome,
                &format!("body part {}", sub.body_part_id),
            )
            .with_subject(identification.map(|i| i.to_string())),
        );
        verified?;
        session.record_pop_link_verified(sub.body_part_id);
        Ok(())
    }

    /// Builds the template for a renewal from the prior request, using the public key from the
    /// new request. PKIArchiveOptions are not honored for renewals.
    fn renew(
        &self,
        prior: &Request,
        sub: &SubRequest,
        request: &mut Request,
    ) -> Result<CertificateTemplate> {
        let mut template = match prior.attributes.get_cert_template() {
            Some(t) => t,
            None => {
                return Err(Error::BadRequest(format!(
                    "request {} named for renewal has no template",
                    prior.id()
                )))
            }
        };
        let spki: &SubjectPublicKeyInfoOwned = match sub.public_key() {
            Some(spki) => spki,
            None => {
                return Err(Error::BadRequest(
                    "request does not include a public key".to_string(),
                ))
            }
        };
        check_public_key(spki)?;
        template.public_key = spki.clone();

        record_sub_request(request, sub);
        if let Some(seq_num) = prior.attributes.get_seq_num() {
            request.attributes.set_seq_num(seq_num);
        }
        request.attributes.set_renewal(true);
        request.attributes.set_renewal_of(prior.id().0);
        request
            .attributes
            .set_public_key(encode_value(spki, "public key")?);
        request
            .attributes
            .set_subject_name(prior.attributes.get_subject_name().unwrap_or_default());
        request
            .attributes
            .set_subject_cn(prior.attributes.get_subject_cn());
        request
            .attributes
            .set_subject_uid(prior.attributes.get_subject_uid());
        request.attributes.set_cert_template(template.clone());
        Ok(template)
    }

    /// Issues a POP challenge for the request and persists it as PENDING
    fn challenge(
        &self,
        request: &mut Request,
        machine: &mut StateMachine,
        spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<Outcome> {
        let challenge = issue_pop_challenge(self.ee, self.settings, request, spki)?;
        self.ee.request_queue()?.update_request(request)?;
        machine.advance(SubmissionState::Pending)?;
        self.ee.audit(
            AuditEvent::new(
                AuditEventKind::PopChallenge,
                AuditOutcome::Success,
                "proof of possession challenge issued",
            )
            .with_request(request.id()),
        );
        Ok(Outcome::Pending(PendingReason::PopRequired(challenge)))
    }

    /// Handles a decryptedPOP control, resuming the request it names
    fn complete_challenge(&self, session: &mut SessionContext, dp: &DecryptedPop) -> RequestOutcome {
        let id = RequestId(u64::from(dp.body_part_id));
        let label = format!("request {}", id);
        let mut machine = StateMachine::resume(&label, SubmissionState::ControlProcessing);
        let found = self
            .ee
            .request_queue()
            .and_then(|q| q.find_request(id));
        let mut request = match found {
            Ok(Some(r)) => r,
            Ok(None) => {
                machine.reject();
                return RequestOutcome {
                    request_id: None,
                    body_part_id: dp.body_part_id,
                    state: machine.state(),
                    outcome: Outcome::Error(Error::BadRequest(format!(
                        "decryptedPOP names unknown request {}",
                        id
                    ))),
                };
            }
            Err(e) => {
                machine.reject();
                return RequestOutcome {
                    request_id: None,
                    body_part_id: dp.body_part_id,
                    state: machine.state(),
                    outcome: Outcome::Error(e),
                };
            }
        };
        let body_part_id = request.attributes.get_body_part_id().unwrap_or(0);
        let read = request.clone();

        // the verified (or rejected) state is claimed against the copy read above, so that of two
        // concurrent responses only one proceeds
        let verified = verify_decrypted_pop(self.ee, self.settings, &mut request, dp);
        let claimed = match &verified {
            Ok(()) => self.claim(&read, &request),
            Err(e) if e.is_rejection() => request
                .reject(&e.to_string())
                .and_then(|_| self.claim(&read, &request)),
            Err(_) => Ok(()),
        };

        let outcome = match (verified, claimed) {
            (_, Err(e)) => {
                log_message(
                    &EeLogLevels::EeError,
                    format!("Discarding decryptedPOP for request {}: {}", id, e).as_str(),
                );
                machine.reject();
                Outcome::Error(e)
            }
            (Ok(()), Ok(())) => {
                self.ee.audit(
                    AuditEvent::new(
                        AuditEventKind::ProofOfPossession,
                        AuditOutcome::Success,
                        "decryptedPOP verified",
                    )
                    .with_request(id),
                );
                match self.finish_request(session, &mut request, &mut machine) {
                    Ok(o) => o,
                    Err(e) => self.fail_request(&mut request, &mut machine, e),
                }
            }
            (Err(e), Ok(())) => {
                self.ee.audit(
                    AuditEvent::new(
                        AuditEventKind::ProofOfPossession,
                        AuditOutcome::Failure,
                        &e.to_string(),
                    )
                    .with_request(id),
                );
                if e.is_rejection() {
                    // already persisted as rejected
                    self.fail_request(&mut request, &mut machine, e)
                } else {
                    // the request is left as persisted
                    machine.reject();
                    Outcome::Error(e)
                }
            }
        };
        RequestOutcome {
            request_id: Some(id),
            body_part_id,
            state: machine.state(),
            outcome,
        }
    }

    /// Persists `request` provided the stored copy is still the one read as `read`
    fn claim(&self, read: &Request, request: &Request) -> Result<()> {
        self.ee.request_queue()?.replace_request(read, request)
    }

    /// Completes a request whose proof of possession is established: defers it when the
    /// submission was not authenticated, otherwise validates, archives and issues.
    fn finish_request(
        &self,
        session: &SessionContext,
        request: &mut Request,
        machine: &mut StateMachine,
    ) -> Result<Outcome> {
        let queue = self.ee.request_queue()?;
        if session.auth_token().is_none() {
            request.set_status(RequestStatus::Pending)?;
            queue.update_request(request)?;
            machine.advance(SubmissionState::Pending)?;
            self.ee.audit(
                AuditEvent::new(
                    AuditEventKind::Deferral,
                    AuditOutcome::Success,
                    "request awaits manual approval",
                )
                .with_request(request.id()),
            );
            return Ok(Outcome::Pending(PendingReason::Deferred));
        }

        machine.advance(SubmissionState::Validating)?;
        let policy_set_id = request.attributes.get_policy_set_id().unwrap_or_default();
        self.ee.validate_policy(&policy_set_id, request)?;

        machine.advance(SubmissionState::Executing)?;
        if self.settings.get_is_ca_profile() && request.attributes.get_archival_required() {
            self.ee.archive_key(request)?;
        }
        let template = match request.attributes.get_cert_template() {
            Some(t) => t,
            None => {
                return Err(Error::InternalError(format!(
                    "request {} has no certificate template",
                    request.id()
                )))
            }
        };
        let issued = self.ee.issue_certificate(
            &self.settings.get_authority_id(),
            &template,
            &self.settings.get_profile_id(),
            request.id(),
        )?;
        request.attributes.set_issued_cert(issued.encoded.clone());
        request.set_status(RequestStatus::Complete)?;
        queue.update_request(request)?;
        queue.mark_serviced(request)?;
        machine.advance(SubmissionState::Complete)?;
        self.ee.audit(
            AuditEvent::new(
                AuditEventKind::Issuance,
                AuditOutcome::Success,
                "certificate issued",
            )
            .with_request(request.id())
            .with_subject(request.attributes.get_subject_name()),
        );
        Ok(Outcome::Completed(issued))
    }

    /// Marks the request REJECTED, recording the error, and returns the corresponding outcome
    fn fail_request(&self, request: &mut Request, machine: &mut StateMachine, e: Error) -> Outcome {
        log_message(
            &EeLogLevels::EeError,
            format!("Request {} failed: {}", request.id(), e).as_str(),
        );
        let message = e.caller_message();
        if !request.status().is_terminal() {
            if let Err(re) = request.reject(&e.to_string()) {
                log_message(
                    &EeLogLevels::EeError,
                    format!("Failed to reject request {}: {}", request.id(), re).as_str(),
                );
            } else if let Err(ue) = self
                .ee
                .request_queue()
                .and_then(|q| q.update_request(request))
            {
                log_message(
                    &EeLogLevels::EeError,
                    format!("Failed to persist rejection of request {}: {}", request.id(), ue)
                        .as_str(),
                );
            }
        }
        machine.reject();
        self.ee.audit(
            AuditEvent::new(AuditEventKind::Rejection, AuditOutcome::Failure, &message)
                .with_request(request.id()),
        );
        if e.is_rejection() {
            Outcome::Rejected(message)
        } else {
            Outcome::Error(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::environment::populate_rust_crypto_environment;
    use crate::source::*;
    use core::str::FromStr;
    use der::Encode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use x509_cert::name::Name;
    use zeroize::Zeroizing;

    struct CountingResolver {
        calls: Arc<AtomicUsize>,
    }
    impl SharedSecretResolver for CountingResolver {
        fn get_shared_secret(
            &self,
            _identification: Option<&str>,
            _pki_data: &[u8],
        ) -> Result<Option<Zeroizing<Vec<u8>>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Zeroizing::new(b"secret".to_vec())))
        }
    }

    fn cmc_submission(ee: &EnrollmentEnvironment) -> DecodedSubmission {
        let signer = RequestSigner::generate_p256();
        let req = build_pkcs10(&signer, &Name::from_str("CN=cmc").unwrap(), &[], vec![]).unwrap();
        let mut pki_data = build_pki_data(
            vec![identification_control(1, "alice").unwrap()],
            vec![TaggedRequest::Tcr(TaggedCertificationRequest {
                body_part_id: 2,
                certification_request: req,
            })],
        );
        let proof = identity_proof_control(ee, 3, b"secret", &pki_data).unwrap();
        pki_data.control_sequence.push(proof);
        decode_submission(RequestKind::Cmc, &wrap_pki_data(&pki_data).unwrap()).unwrap()
    }

    #[test]
    fn process_controls_once_test() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut ee = EnrollmentEnvironment::default();
        populate_rust_crypto_environment(&mut ee);
        ee.add_shared_secret_resolver(Box::new(CountingResolver {
            calls: calls.clone(),
        }));
        let settings = ProfileSettings::default();
        let profile = EnrollmentProfile::new(&ee, &settings);
        let decoded = cmc_submission(&ee);

        let mut session = SessionContext::new(None);
        let mut result = SubmissionResult::default();
        profile
            .process_controls(&mut session, &decoded, &mut result)
            .unwrap();
        assert!(session.is_marked(SessionMarkers::IdentityVerified));
        assert_eq!(Some("alice"), session.identification());
        assert_eq!(1, calls.load(Ordering::SeqCst));

        profile
            .process_controls(&mut session, &decoded, &mut result)
            .unwrap();
        assert_eq!(1, calls.load(Ordering::SeqCst));
        assert!(result.revoke_requests.is_empty());
        assert!(result.unknown_controls.is_empty());
    }

    #[test]
    fn identity_proof_requires_secret_test() {
        let mut ee = EnrollmentEnvironment::default();
        populate_rust_crypto_environment(&mut ee);
        let settings = ProfileSettings::default();
        let profile = EnrollmentProfile::new(&ee, &settings);
        let decoded = cmc_submission(&ee);

        let mut session = SessionContext::new(None);
        let mut result = SubmissionResult::default();
        let r = profile.process_controls(&mut session, &decoded, &mut result);
        assert!(matches!(r, Err(Error::BadIdentity(_))));
        assert!(!session.is_marked(SessionMarkers::ControlsProcessed));

        // strong identity skips identity proofing altogether
        let mut session = SessionContext::new(None);
        session.set_auth_token(Some(AuthToken {
            auth_manager_id: "agent".to_string(),
            strong_identity: true,
            ..Default::default()
        }));
        profile
            .process_controls(&mut session, &decoded, &mut result)
            .unwrap();
        assert!(!session.is_marked(SessionMarkers::IdentityVerified));
    }

    #[test]
    fn unauthenticated_pkcs10_is_deferred_test() {
        let mut ee = EnrollmentEnvironment::default();
        populate_rust_crypto_environment(&mut ee);
        ee.set_request_queue(Box::new(InMemoryRequestQueue::default()));
        let mut settings = ProfileSettings::default();
        settings.set_policy_set_ids(vec!["userCertSet".to_string()]);
        let profile = EnrollmentProfile::new(&ee, &settings);

        let signer = RequestSigner::generate_p256();
        let req = build_pkcs10(&signer, &Name::from_str("CN=deferred").unwrap(), &[], vec![])
            .unwrap();
        let submission = Submission::new(RequestKind::Pkcs10, &req.to_der().unwrap());
        let result = profile.submit(&submission).unwrap();
        assert_eq!(1, result.outcomes.len());
        let outcome = &result.outcomes[0];
        assert_eq!(SubmissionState::Pending, outcome.state);
        assert_eq!(Outcome::Pending(PendingReason::Deferred), outcome.outcome);

        let id = outcome.request_id.unwrap();
        let stored = ee.request_queue().unwrap().find_request(id).unwrap().unwrap();
        assert_eq!(RequestStatus::Pending, stored.status());
        assert!(stored.attributes.get_pop_verified());
        assert_eq!(Some("userCertSet".to_string()), stored.attributes.get_policy_set_id());
        assert_eq!("deferred", stored.attributes.get_subject_cn());
    }
}
