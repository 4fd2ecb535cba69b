//! Identity binding, exemption, status and concurrency properties of submission processing.

mod common;

use core::str::FromStr;
use std::collections::BTreeSet;

use certenroll::*;
use der::asn1::OctetString;
use der::Encode;
use x509_cert::name::Name;

use common::*;

fn tcr(signer: &RequestSigner, body_part_id: BodyPartId, attributes: Vec<x509_cert::attr::Attribute>) -> TaggedRequest {
    TaggedRequest::Tcr(TaggedCertificationRequest {
        body_part_id,
        certification_request: build_pkcs10(
            signer,
            &Name::from_str("CN=property").unwrap(),
            &[],
            attributes,
        )
        .unwrap(),
    })
}

fn submit_cmc(profile: &EnrollmentProfile<'_>, pki_data: &PkiData) -> Result<SubmissionResult> {
    profile.submit(&Submission::new(
        RequestKind::Cmc,
        &wrap_pki_data(pki_data).unwrap(),
    ))
}

fn v2_submission(ee: &EnrollmentEnvironment, presented: &str, proven: &str) -> PkiData {
    let signer = RequestSigner::generate_p256();
    let mut pki_data = build_pki_data(
        vec![identification_control(1, presented).unwrap()],
        vec![tcr(&signer, 2, vec![])],
    );
    let proof = identity_proof_v2_control(
        ee,
        3,
        sha256(),
        hmac_sha256(),
        b"secret",
        proven,
        &pki_data,
    )
    .unwrap();
    pki_data.control_sequence.push(proof);
    pki_data
}

#[test]
fn identity_proof_v2_binds_identification() {
    let (ee, _fakes) = environment(None);
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let result = submit_cmc(&profile, &v2_submission(&ee, "alice", "alice")).unwrap();
    let outcome = &result.outcomes[0];
    assert_eq!(Outcome::Pending(PendingReason::Deferred), outcome.outcome);
    let request = stored(&ee, outcome.request_id.unwrap());
    assert_eq!(Some("alice".to_string()), request.attributes.get_auth_subject());
    assert_eq!(Some("alice".to_string()), request.attributes.get_identification());

    // mallory shares alice's secret but the witness names alice
    let r = submit_cmc(&profile, &v2_submission(&ee, "mallory", "alice"));
    assert!(matches!(r, Err(Error::BadIdentity(_))));
}

#[test]
fn identity_proof_v1_leaves_subject_unset() {
    let (ee, fakes) = environment(None);
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let mut pki_data = build_pki_data(
        vec![identification_control(1, "alice").unwrap()],
        vec![tcr(&signer, 2, vec![])],
    );
    let proof = identity_proof_control(&ee, 3, b"secret", &pki_data).unwrap();
    pki_data.control_sequence.push(proof);

    let result = submit_cmc(&profile, &pki_data).unwrap();
    let request = stored(&ee, result.outcomes[0].request_id.unwrap());
    assert_eq!(None, request.attributes.get_auth_subject());
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::IdentityProof, AuditOutcome::Success)
    );

    // wrong secret
    let mut pki_data = build_pki_data(
        vec![identification_control(1, "alice").unwrap()],
        vec![tcr(&signer, 2, vec![])],
    );
    let proof = identity_proof_control(&ee, 3, b"guess", &pki_data).unwrap();
    pki_data.control_sequence.push(proof);
    assert!(matches!(
        submit_cmc(&profile, &pki_data),
        Err(Error::BadIdentity(_))
    ));
}

fn crmf_without_pop(cert_req_id: u32) -> TaggedRequest {
    let cr = build_cert_request(
        cert_req_id,
        CertTemplate::default(),
        RSA_SIGNER.spki().unwrap(),
        vec![],
    );
    TaggedRequest::Crm(build_cert_req_msg(cr, None))
}

fn lra_submission() -> PkiData {
    build_pki_data(
        vec![control(
            1,
            ID_CMC_LRA_POP_WITNESS,
            &LraPopWitness {
                pki_data_bodyid: 0,
                body_ids: vec![4],
            },
        )
        .unwrap()],
        vec![crmf_without_pop(4), crmf_without_pop(5)],
    )
}

#[test]
fn lra_pop_witness_exemption_is_configurable() {
    let (ee, _fakes) = environment(Some(agent_token(true)));
    let mut settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    // disabled by default
    let result = submit_cmc(&profile, &lra_submission()).unwrap();
    assert_eq!(2, result.outcomes.len());
    for outcome in &result.outcomes {
        assert!(matches!(
            outcome.outcome,
            Outcome::Pending(PendingReason::PopRequired(_))
        ));
    }

    settings.set_allow_lra_pop_witness(true);
    let profile = EnrollmentProfile::new(&ee, &settings);
    let result = submit_cmc(&profile, &lra_submission()).unwrap();
    assert_eq!(4, result.outcomes[0].body_part_id);
    assert!(matches!(result.outcomes[0].outcome, Outcome::Completed(_)));
    assert!(!stored(&ee, result.outcomes[0].request_id.unwrap())
        .attributes
        .get_pop_verified());
    assert_eq!(5, result.outcomes[1].body_part_id);
    assert!(matches!(
        result.outcomes[1].outcome,
        Outcome::Pending(PendingReason::PopRequired(_))
    ));

    // the exemption requires strong identity
    let (ee, _fakes) = environment(Some(agent_token(false)));
    let profile = EnrollmentProfile::new(&ee, &settings);
    let result = submit_cmc(&profile, &lra_submission()).unwrap();
    assert!(matches!(
        result.outcomes[0].outcome,
        Outcome::Pending(PendingReason::PopRequired(_))
    ));
}

fn pop_link_submission(ee: &EnrollmentEnvironment, secret: &[u8]) -> PkiData {
    let random = vec![7; 16];
    let witness = compute_pop_link_witness_v1(ee, secret, &random).unwrap();
    let (oid, value) = pop_link_witness_value(&PopLinkWitness::V1(witness)).unwrap();
    let attribute = single_valued_attribute(oid, &value).unwrap();
    let signer = RequestSigner::generate_p256();
    build_pki_data(
        vec![
            identification_control(1, "alice").unwrap(),
            control(2, ID_CMC_POP_LINK_RANDOM, &OctetString::new(random).unwrap()).unwrap(),
        ],
        vec![tcr(&signer, 3, vec![attribute])],
    )
}

#[test]
fn pop_link_witness_is_verified_when_required() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let mut settings = settings();
    settings.set_pop_link_witness_required(true);
    let profile = EnrollmentProfile::new(&ee, &settings);

    let result = submit_cmc(&profile, &pop_link_submission(&ee, b"secret")).unwrap();
    assert!(matches!(result.outcomes[0].outcome, Outcome::Completed(_)));
    assert_eq!(
        1,
        fakes
            .audit
            .count(AuditEventKind::PopLinkWitness, AuditOutcome::Success)
    );

    let result = submit_cmc(&profile, &pop_link_submission(&ee, b"guess")).unwrap();
    let outcome = &result.outcomes[0];
    assert!(matches!(outcome.outcome, Outcome::Rejected(_)));
    assert_eq!(
        RequestStatus::Rejected,
        stored(&ee, outcome.request_id.unwrap()).status()
    );

    // a request without a witness is not accepted
    let signer = RequestSigner::generate_p256();
    let pki_data = build_pki_data(
        vec![
            identification_control(1, "alice").unwrap(),
            control(2, ID_CMC_POP_LINK_RANDOM, &OctetString::new(vec![7; 16]).unwrap())
                .unwrap(),
        ],
        vec![tcr(&signer, 3, vec![])],
    );
    let result = submit_cmc(&profile, &pki_data).unwrap();
    assert!(matches!(
        result.outcomes[0].outcome,
        Outcome::Error(Error::BadRequest(_))
    ));
}

#[test]
fn sibling_failures_are_independent() {
    let (ee, _fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let mut forged = build_pkcs10(&signer, &Name::from_str("CN=forged").unwrap(), &[], vec![])
        .unwrap();
    forged.signature =
        der::asn1::BitString::from_bytes(&signer.sign(b"forged").unwrap()).unwrap();
    let pki_data = build_pki_data(
        vec![],
        vec![
            tcr(&signer, 1, vec![]),
            TaggedRequest::Tcr(TaggedCertificationRequest {
                body_part_id: 2,
                certification_request: forged,
            }),
            tcr(&signer, 3, vec![]),
        ],
    );
    let result = submit_cmc(&profile, &pki_data).unwrap();
    assert_eq!(3, result.outcomes.len());
    assert!(matches!(result.outcomes[0].outcome, Outcome::Completed(_)));
    assert!(matches!(result.outcomes[1].outcome, Outcome::Rejected(_)));
    assert!(matches!(result.outcomes[2].outcome, Outcome::Completed(_)));

    // policy sets follow position within the batch
    let sets: Vec<Option<String>> = result
        .outcomes
        .iter()
        .map(|o| stored(&ee, o.request_id.unwrap()).attributes.get_policy_set_id())
        .collect();
    assert_eq!(
        vec![
            Some("set0".to_string()),
            Some("set1".to_string()),
            Some("set2".to_string())
        ],
        sets
    );

    // a fourth request has no policy set
    let pki_data = build_pki_data(
        vec![],
        (1..=4).map(|i| tcr(&signer, i, vec![])).collect(),
    );
    let result = submit_cmc(&profile, &pki_data).unwrap();
    assert!(matches!(
        result.outcomes[3].outcome,
        Outcome::Error(Error::NoPolicySet(3))
    ));
}

#[test]
fn terminal_status_is_final() {
    let (ee, _fakes) = environment(Some(agent_token(false)));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let signer = RequestSigner::generate_p256();
    let req = build_pkcs10(&signer, &Name::from_str("CN=final").unwrap(), &[], vec![]).unwrap();
    let result = profile
        .submit(&Submission::new(RequestKind::Pkcs10, &req.to_der().unwrap()))
        .unwrap();
    let id = result.outcomes[0].request_id.unwrap();
    let complete = stored(&ee, id);
    assert_eq!(RequestStatus::Complete, complete.status());

    let mut request = complete.clone();
    assert!(request.set_status(RequestStatus::Rejected).is_err());
    let forged = Request::from_parts(
        id,
        request.kind(),
        RequestStatus::Rejected,
        request.attributes.clone(),
    );
    assert!(ee.request_queue().unwrap().update_request(&forged).is_err());
    let mut changed = complete.clone();
    changed.attributes.set_error("late".to_string());
    assert!(ee.request_queue().unwrap().update_request(&changed).is_err());
    assert_eq!(complete, stored(&ee, id));
}

#[test]
fn concurrent_submissions() {
    let (ee, fakes) = environment(Some(agent_token(false)));
    let settings = settings();

    let ids: Vec<RequestId> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ee = &ee;
                let settings = &settings;
                s.spawn(move || {
                    let signer = RequestSigner::generate_p256();
                    let req = build_pkcs10(
                        &signer,
                        &Name::from_str(&format!("CN=thread{}", i)).unwrap(),
                        &[],
                        vec![],
                    )
                    .unwrap();
                    let result = EnrollmentProfile::new(ee, settings)
                        .submit(&Submission::new(RequestKind::Pkcs10, &req.to_der().unwrap()))
                        .unwrap();
                    assert!(matches!(result.outcomes[0].outcome, Outcome::Completed(_)));
                    result.outcomes[0].request_id.unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: BTreeSet<RequestId> = ids.iter().copied().collect();
    assert_eq!(8, unique.len());
    for id in ids {
        assert_eq!(RequestStatus::Complete, stored(&ee, id).status());
    }
    assert_eq!(8, fakes.authority.issued.lock().unwrap().len());
}

#[test]
fn concurrent_challenge_responses_issue_once() {
    let (mut ee, _fakes) = environment(Some(agent_token(false)));
    let authority = FakeAuthority {
        delay_ms: 200,
        ..Default::default()
    };
    ee.set_authority(Box::new(authority.clone()));
    let settings = settings();
    let profile = EnrollmentProfile::new(&ee, &settings);

    let cr = build_cert_request(4, CertTemplate::default(), RSA_SIGNER.spki().unwrap(), vec![]);
    let msg = build_cert_req_msg(cr, None);
    let encoded_request = msg.to_der().unwrap();
    let result = profile
        .submit(&Submission::new(
            RequestKind::Crmf,
            &build_crmf(&[msg]).unwrap(),
        ))
        .unwrap();
    let challenge = match &result.outcomes[0].outcome {
        Outcome::Pending(PendingReason::PopRequired(c)) => c.clone(),
        other => panic!("unexpected outcome: {:?}", other),
    };
    let recovered =
        decrypt_pop_challenge(&ee, &challenge, RSA_SIGNER.rsa_key().unwrap()).unwrap();
    let control =
        decrypted_pop_control(&ee, 1, &challenge, &recovered, &encoded_request).unwrap();
    let response = wrap_pki_data(&build_pki_data(vec![control], vec![])).unwrap();

    let barrier = std::sync::Barrier::new(2);
    let outcomes: Vec<Outcome> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let result = profile
                        .submit(&Submission::new(RequestKind::Cmc, &response))
                        .unwrap();
                    result.outcomes[0].outcome.clone()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(
        1,
        outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Completed(_)))
            .count()
    );
    assert_eq!(
        1,
        outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Error(Error::BadRequest(_))))
            .count()
    );
    assert_eq!(1, authority.issued.lock().unwrap().len());
    assert_eq!(
        RequestStatus::Complete,
        stored(&ee, challenge.request_id).status()
    );
}
