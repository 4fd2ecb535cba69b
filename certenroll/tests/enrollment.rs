//! End-to-end submissions through an enrollment profile using fake collaborators.

mod common;

use core::str::FromStr;

use certenroll::*;
use der::asn1::OctetString;
use der::{Any, Encode};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::pkix::CrlReason;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use common::*;

fn pkcs10(signer: &RequestSigner, subject: &str) -> Vec<u8> {
    build_pkcs10(signer, &Name::from_str(subject).unwrap(), &[], vec![])
        .unwrap()
        .to_der()
        .unwrap()
}

fn tcr(signer: &RequestSigner, body_part_id: BodyPartId, subject: &str) -> TaggedRequest {
    TaggedRequest::Tcr(TaggedCertificationRequest {
        body_part_id,
        certification_request: build_pkcs10(
            signer,
            &Name::from_str(subject).unwrap(),
            &[],
            vec![],
        )
        .unwrap(),
    })
}

fn only_outcome(result: &SubmissionResult) -> &RequestOutcome {
    assert_eq!(1, result.outcomes.len());
    &result.outcomes[0]
}

#[test]
fn signed_pkcs10_is_issued() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let submission = Submission::new(RequestKind::Pkcs10, &pkcs10(&signer, "CN=test"))
        .with_locale("en-US");
    let result = profile.submit(&submission).unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(SubmissionState::Complete, outcome.state);
    assert!(matches!(outcome.outcome, Outcome::Completed(_)));

    let id = outcome.request_id.unwrap();
    assert_eq!(
        vec![("set0".to_string(), id)],
        *fakes.validator.validated.lock().unwrap()
    );
    let issued = fakes.authority.issued.lock().unwrap();
    assert_eq!(1, issued.len());
    assert_eq!("CN=test", issued[0].1.subject.to_string());
    assert_eq!(signer.spki().unwrap(), issued[0].1.public_key);

    let request = stored(&ee, id);
    assert_eq!(RequestStatus::Complete, request.status());
    assert_eq!("test", request.attributes.get_subject_cn());
    assert!(request.attributes.get_pop_verified());
    assert_eq!(Some("en-US".to_string()), request.attributes.get_locale());
    assert_eq!(Some("agent".to_string()), request.attributes.get_auth_manager());
    assert_eq!(Some("agent-1".to_string()), request.attributes.get_auth_subject());
    assert!(request.attributes.get_issued_cert().is_some());

    assert_eq!(1, fakes.audit.count(AuditEventKind::Issuance, AuditOutcome::Success));
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::Authentication, AuditOutcome::Success)
    );
}

#[test]
fn pem_pkcs10_is_accepted() {
    let (ee, _fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let pem = pem_rfc7468::encode_string(
        "CERTIFICATE REQUEST",
        pem_rfc7468::LineEnding::LF,
        &pkcs10(&signer, "CN=pem"),
    )
    .unwrap();
    let result = profile
        .submit(&Submission::new(RequestKind::Unspecified, pem.as_bytes()))
        .unwrap();
    assert!(matches!(
        only_outcome(&result).outcome,
        Outcome::Completed(_)
    ));
}

#[test]
fn bad_pkcs10_signature_is_rejected() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let mut req =
        build_pkcs10(&signer, &Name::from_str("CN=forged").unwrap(), &[], vec![]).unwrap();
    let other = signer.sign(b"something else").unwrap();
    req.signature = der::asn1::BitString::from_bytes(&other).unwrap();

    let result = profile
        .submit(&Submission::new(RequestKind::Pkcs10, &req.to_der().unwrap()))
        .unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(SubmissionState::Rejected, outcome.state);
    assert!(matches!(outcome.outcome, Outcome::Rejected(_)));
    let request = stored(&ee, outcome.request_id.unwrap());
    assert_eq!(RequestStatus::Rejected, request.status());
    assert!(request.attributes.get_error().is_some());
    assert!(fakes.authority.issued.lock().unwrap().is_empty());

    // with signature verification disabled the request is accepted without POP
    let mut settings = common::settings();
    settings.set_verify_pkcs10_signature(false);
    let profile = EnrollmentProfile::new(&ee, &settings);
    let result = profile
        .submit(&Submission::new(RequestKind::Pkcs10, &req.to_der().unwrap()))
        .unwrap();
    let outcome = only_outcome(&result);
    assert!(matches!(outcome.outcome, Outcome::Completed(_)));
    assert!(!stored(&ee, outcome.request_id.unwrap())
        .attributes
        .get_pop_verified());
}

#[test]
fn crmf_without_pop_is_challenged() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let template = CertTemplate {
        subject: Some(Name::from_str("CN=challenged").unwrap()),
        ..Default::default()
    };
    let cr = build_cert_request(9, template, RSA_SIGNER.spki().unwrap(), vec![]);
    let msg = build_cert_req_msg(cr, None);
    let encoded_request = msg.to_der().unwrap();
    let crmf = build_crmf(&[msg]).unwrap();

    let result = profile
        .submit(&Submission::new(RequestKind::Crmf, &crmf))
        .unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(SubmissionState::Pending, outcome.state);
    let challenge = match &outcome.outcome {
        Outcome::Pending(PendingReason::PopRequired(c)) => c.clone(),
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(9, challenge.body_part_id);
    assert_eq!(outcome.request_id, Some(challenge.request_id));

    let request = stored(&ee, challenge.request_id);
    assert_eq!(RequestStatus::Pending, request.status());
    assert!(request.attributes.get_pop_challenged());
    assert!(request.attributes.get_pop_encrypted_challenge().is_some());
    assert!(request.attributes.get_pop_sys_wrapped_key().is_some());
    assert!(fakes.authority.issued.lock().unwrap().is_empty());
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::PopChallenge, AuditOutcome::Success)
    );

    // second round
    let recovered =
        decrypt_pop_challenge(&ee, &challenge, RSA_SIGNER.rsa_key().unwrap()).unwrap();
    let control =
        decrypted_pop_control(&ee, 1, &challenge, &recovered, &encoded_request).unwrap();
    let response = wrap_pki_data(&build_pki_data(vec![control], vec![])).unwrap();
    let result = profile
        .submit(&Submission::new(RequestKind::Cmc, &response))
        .unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(SubmissionState::Complete, outcome.state);
    assert_eq!(9, outcome.body_part_id);
    assert!(matches!(outcome.outcome, Outcome::Completed(_)));

    let request = stored(&ee, challenge.request_id);
    assert_eq!(RequestStatus::Complete, request.status());
    assert!(request.attributes.get_pop_verified());
    assert!(!request.attributes.get_pop_challenged());
    assert_eq!(None, request.attributes.get_pop_witness());
    assert_eq!(
        "CN=challenged",
        fakes.authority.issued.lock().unwrap()[0].1.subject.to_string()
    );

    // the challenge can not be answered twice
    let result = profile
        .submit(&Submission::new(RequestKind::Cmc, &response))
        .unwrap();
    assert!(matches!(
        only_outcome(&result).outcome,
        Outcome::Error(Error::BadRequest(_))
    ));
    assert_eq!(
        RequestStatus::Complete,
        stored(&ee, challenge.request_id).status()
    );
}

#[test]
fn wrong_decrypted_pop_is_final() {
    let (ee, _fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let cr = build_cert_request(2, CertTemplate::default(), RSA_SIGNER.spki().unwrap(), vec![]);
    let msg = build_cert_req_msg(cr, None);
    let encoded_request = msg.to_der().unwrap();
    let result = profile
        .submit(&Submission::new(
            RequestKind::Crmf,
            &build_crmf(&[msg]).unwrap(),
        ))
        .unwrap();
    let challenge = match &only_outcome(&result).outcome {
        Outcome::Pending(PendingReason::PopRequired(c)) => c.clone(),
        other => panic!("unexpected outcome: {:?}", other),
    };
    let recovered =
        decrypt_pop_challenge(&ee, &challenge, RSA_SIGNER.rsa_key().unwrap()).unwrap();

    // computed over the wrong request
    let wrong = decrypted_pop_control(&ee, 1, &challenge, &recovered, b"other").unwrap();
    let result = profile
        .submit(&Submission::new(
            RequestKind::Cmc,
            &wrap_pki_data(&build_pki_data(vec![wrong], vec![])).unwrap(),
        ))
        .unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(SubmissionState::Rejected, outcome.state);
    assert!(matches!(outcome.outcome, Outcome::Rejected(_)));
    assert_eq!(
        RequestStatus::Rejected,
        stored(&ee, challenge.request_id).status()
    );

    // a correct answer after a failure is not accepted
    let right =
        decrypted_pop_control(&ee, 1, &challenge, &recovered, &encoded_request).unwrap();
    let result = profile
        .submit(&Submission::new(
            RequestKind::Cmc,
            &wrap_pki_data(&build_pki_data(vec![right], vec![])).unwrap(),
        ))
        .unwrap();
    assert!(matches!(
        only_outcome(&result).outcome,
        Outcome::Error(Error::BadRequest(_))
    ));
    assert_eq!(
        RequestStatus::Rejected,
        stored(&ee, challenge.request_id).status()
    );
}

#[test]
fn identity_proof_without_identification_fails_batch() {
    let (ee, fakes) = environment(None);
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let mut pki_data = build_pki_data(
        vec![],
        vec![
            tcr(&signer, 1, "CN=one"),
            tcr(&signer, 2, "CN=two"),
            tcr(&signer, 3, "CN=three"),
        ],
    );
    let proof = identity_proof_v2_control(
        &ee,
        4,
        sha256(),
        hmac_sha256(),
        b"secret",
        "alice",
        &pki_data,
    )
    .unwrap();
    pki_data.control_sequence.push(proof);

    let r = profile.submit(&Submission::new(
        RequestKind::Cmc,
        &wrap_pki_data(&pki_data).unwrap(),
    ));
    assert!(matches!(r, Err(Error::BadIdentity(_))));
    // no request reached the queue
    assert!(ee
        .request_queue()
        .unwrap()
        .find_request(RequestId(1))
        .unwrap()
        .is_none());
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::IdentityProof, AuditOutcome::Failure)
    );
}

#[test]
fn revoke_request_skips_identity_proof() {
    let (ee, _fakes) = environment(None);
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let revoke = RevokeRequest {
        issuer_name: Name::from_str("CN=issuer").unwrap(),
        serial_number: SerialNumber::new(&[1, 2, 3]).unwrap(),
        reason: CrlReason::KeyCompromise,
        invalidity_date: None,
        passphrase: None,
        comment: None,
    };
    let signer = RequestSigner::generate_p256();
    let mut pki_data = build_pki_data(
        vec![
            control(1, ID_CMC_REVOKE_REQUEST, &revoke).unwrap(),
            control(2, ID_CMC_TRANSACTION_ID, &7u32).unwrap(),
            identification_control(5, "nobody").unwrap(),
        ],
        vec![tcr(&signer, 3, "CN=revoking")],
    );
    // no secret is known for this identification
    let proof = identity_proof_control(&ee, 4, b"unknown", &pki_data).unwrap();
    pki_data.control_sequence.push(proof);

    let result = profile
        .submit(&Submission::new(
            RequestKind::Cmc,
            &wrap_pki_data(&pki_data).unwrap(),
        ))
        .unwrap();
    assert_eq!(vec![revoke.to_der().unwrap()], result.revoke_requests);
    assert_eq!(1, result.unknown_controls.len());
    assert_eq!(ID_CMC_TRANSACTION_ID, result.unknown_controls[0].0);

    let outcome = only_outcome(&result);
    assert_eq!(Outcome::Pending(PendingReason::Deferred), outcome.outcome);
    let request = stored(&ee, outcome.request_id.unwrap());
    assert_eq!(
        Some(vec![revoke.to_der().unwrap()]),
        request.attributes.get_revoke_requests()
    );
    assert_eq!(None, request.attributes.get_auth_subject());
}

fn archive_options_control() -> AttributeTypeAndValue {
    AttributeTypeAndValue {
        oid: ID_REG_CTRL_PKI_ARCHIVE_OPTIONS,
        value: Any::encode_from(&OctetString::new(vec![0x55; 16]).unwrap()).unwrap(),
    }
}

fn crmf_with_archive_options(signer: &RequestSigner) -> Vec<u8> {
    let template = CertTemplate {
        subject: Some(Name::from_str("CN=archived").unwrap()),
        ..Default::default()
    };
    let cr = build_cert_request(
        1,
        template,
        signer.spki().unwrap(),
        vec![archive_options_control()],
    );
    let popo = signature_pop(signer, &cr).unwrap();
    build_crmf(&[build_cert_req_msg(cr, Some(popo))]).unwrap()
}

#[test]
fn archive_options_without_connector_is_rejected() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let result = profile
        .submit(&Submission::new(
            RequestKind::Crmf,
            &crmf_with_archive_options(&signer),
        ))
        .unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(SubmissionState::Rejected, outcome.state);
    assert_eq!(
        Outcome::Error(Error::InternalError("no archival connector".to_string())),
        outcome.outcome
    );
    let request = stored(&ee, outcome.request_id.unwrap());
    assert_eq!(RequestStatus::Rejected, request.status());
    assert!(request.attributes.get_archival_required());
    assert!(fakes.authority.issued.lock().unwrap().is_empty());
}

#[test]
fn archive_options_are_relayed() {
    let signer = RequestSigner::generate_p256();

    let (mut ee, fakes) = environment(Some(agent_token(false)));
    let archival = FakeArchival {
        success: true,
        ..Default::default()
    };
    ee.set_archival_connector(Box::new(archival.clone()));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);
    let result = profile
        .submit(&Submission::new(
            RequestKind::Crmf,
            &crmf_with_archive_options(&signer),
        ))
        .unwrap();
    let outcome = only_outcome(&result);
    assert!(matches!(outcome.outcome, Outcome::Completed(_)));
    assert_eq!(vec![outcome.request_id.unwrap()], *archival.sent.lock().unwrap());
    assert_eq!(1, fakes.authority.issued.lock().unwrap().len());

    let (mut ee, _fakes) = environment(Some(agent_token(false)));
    ee.set_archival_connector(Box::new(FakeArchival::default()));
    let profile = EnrollmentProfile::new(&ee, &settings);
    let result = profile
        .submit(&Submission::new(
            RequestKind::Crmf,
            &crmf_with_archive_options(&signer),
        ))
        .unwrap();
    let outcome = only_outcome(&result);
    assert!(matches!(outcome.outcome, Outcome::Rejected(_)));
    assert_eq!(
        RequestStatus::Rejected,
        stored(&ee, outcome.request_id.unwrap()).status()
    );
}

#[test]
fn bad_crmf_signature_pop_is_rejected() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let template = CertTemplate {
        subject: Some(Name::from_str("CN=forged").unwrap()),
        ..Default::default()
    };
    let cr = build_cert_request(6, template, signer.spki().unwrap(), vec![]);
    let mut msg = build_cert_req_msg(cr.clone(), Some(signature_pop(&signer, &cr).unwrap()));
    if let Some(ProofOfPossession::Signature(pk)) = &mut msg.popo {
        pk.signature =
            der::asn1::BitString::from_bytes(&signer.sign(b"something else").unwrap()).unwrap();
    }

    let result = profile
        .submit(&Submission::new(
            RequestKind::Crmf,
            &build_crmf(&[msg]).unwrap(),
        ))
        .unwrap();
    let outcome = only_outcome(&result);
    assert_eq!(6, outcome.body_part_id);
    assert_eq!(SubmissionState::Rejected, outcome.state);
    assert!(matches!(outcome.outcome, Outcome::Rejected(_)));
    let request = stored(&ee, outcome.request_id.unwrap());
    assert_eq!(RequestStatus::Rejected, request.status());
    assert!(!request.attributes.get_pop_verified());
    assert!(fakes.authority.issued.lock().unwrap().is_empty());
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::ProofOfPossession, AuditOutcome::Failure)
    );
}

#[test]
fn renewal_reuses_prior_template() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let result = profile
        .submit(&Submission::new(
            RequestKind::Pkcs10,
            &pkcs10(&signer, "CN=test"),
        ))
        .unwrap();
    let prior = only_outcome(&result).request_id.unwrap();

    let renewed = RequestSigner::generate_p256();
    let result = profile
        .submit(
            &Submission::new(RequestKind::Pkcs10, &pkcs10(&renewed, "CN=ignored"))
                .with_renewal_of(prior),
        )
        .unwrap();
    let outcome = only_outcome(&result);
    assert!(matches!(outcome.outcome, Outcome::Completed(_)));

    let issued = fakes.authority.issued.lock().unwrap();
    assert_eq!(2, issued.len());
    assert_eq!("CN=test", issued[1].1.subject.to_string());
    assert_eq!(renewed.spki().unwrap(), issued[1].1.public_key);
    let request = stored(&ee, outcome.request_id.unwrap());
    assert!(request.attributes.get_renewal());
    assert_eq!(Some(prior.0), request.attributes.get_renewal_of());
    drop(issued);

    // a renewal must name a completed request
    let r = profile.submit(
        &Submission::new(RequestKind::Pkcs10, &pkcs10(&renewed, "CN=x"))
            .with_renewal_of(RequestId(1000)),
    );
    assert!(matches!(r, Err(Error::BadRequest(_))));
}

#[test]
fn renewal_requires_prior_owner() {
    let (mut ee, fakes) = environment(None);
    ee.add_authenticator(Box::new(UidAuthenticator));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let alice = RequestSigner::generate_p256();
    let result = profile
        .submit(
            &Submission::new(RequestKind::Pkcs10, &pkcs10(&alice, "CN=alice"))
                .with_credentials(uid_credentials("alice")),
        )
        .unwrap();
    let prior = only_outcome(&result).request_id.unwrap();
    assert_eq!(
        Some("alice".to_string()),
        stored(&ee, prior).attributes.get_auth_subject()
    );

    let mallory = RequestSigner::generate_p256();
    let r = profile.submit(
        &Submission::new(RequestKind::Pkcs10, &pkcs10(&mallory, "CN=mallory"))
            .with_credentials(uid_credentials("mallory"))
            .with_renewal_of(prior),
    );
    assert!(matches!(r, Err(Error::BadIdentity(_))));
    assert_eq!(1, fakes.authority.issued.lock().unwrap().len());

    // an unauthenticated submitter cannot renew either
    let r = profile.submit(
        &Submission::new(RequestKind::Pkcs10, &pkcs10(&mallory, "CN=mallory"))
            .with_renewal_of(prior),
    );
    assert!(matches!(r, Err(Error::BadIdentity(_))));

    let renewed = RequestSigner::generate_p256();
    let result = profile
        .submit(
            &Submission::new(RequestKind::Pkcs10, &pkcs10(&renewed, "CN=ignored"))
                .with_credentials(uid_credentials("alice"))
                .with_renewal_of(prior),
        )
        .unwrap();
    assert!(matches!(
        only_outcome(&result).outcome,
        Outcome::Completed(_)
    ));
    let issued = fakes.authority.issued.lock().unwrap();
    assert_eq!(2, issued.len());
    assert_eq!("CN=alice", issued[1].1.subject.to_string());
}

#[test]
fn agent_may_renew_for_subscriber() {
    let (mut ee, fakes) = environment(None);
    ee.add_authenticator(Box::new(UidAuthenticator));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let alice = RequestSigner::generate_p256();
    let result = profile
        .submit(
            &Submission::new(RequestKind::Pkcs10, &pkcs10(&alice, "CN=alice"))
                .with_credentials(uid_credentials("alice")),
        )
        .unwrap();
    let prior = only_outcome(&result).request_id.unwrap();

    let renewed = RequestSigner::generate_p256();
    let result = profile
        .submit(
            &Submission::new(RequestKind::Pkcs10, &pkcs10(&renewed, "CN=ignored"))
                .with_credentials(uid_credentials("ra-agent"))
                .with_renewal_of(prior),
        )
        .unwrap();
    assert!(matches!(
        only_outcome(&result).outcome,
        Outcome::Completed(_)
    ));
    let issued = fakes.authority.issued.lock().unwrap();
    assert_eq!(2, issued.len());
    assert_eq!("CN=alice", issued[1].1.subject.to_string());
    assert_eq!(renewed.spki().unwrap(), issued[1].1.public_key);
}

#[test]
fn rejected_credentials_fail_batch() {
    struct Refusing;
    impl Authenticator for Refusing {
        fn authenticate(&self, _c: &Credentials, _p: &[u8]) -> Result<Option<AuthToken>> {
            Err(Error::AuthenticationFailed)
        }
    }
    let (mut ee, fakes) = environment(None);
    ee.add_authenticator(Box::new(Refusing));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let r = profile.submit(&Submission::new(
        RequestKind::Pkcs10,
        &pkcs10(&signer, "CN=refused"),
    ));
    assert_eq!(Err(Error::AuthenticationFailed), r.map(|_| ()));
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::Authentication, AuditOutcome::Failure)
    );
}

#[test]
fn malformed_submission_fails_batch() {
    let (ee, _fakes) = environment(None);
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);
    for payload in [&b""[..], &[0x30, 0x03, 0x02, 0x01][..], &b"@@@@"[..]] {
        let r = profile.submit(&Submission::new(RequestKind::Unspecified, payload));
        assert!(matches!(r, Err(Error::BadRequest(_))));
    }
}
