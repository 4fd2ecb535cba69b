//! Fake collaborators and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use certenroll::*;
use der::Encode;
use lazy_static::lazy_static;

lazy_static! {
    /// RSA requester key, generated once since RSA key generation is slow in debug builds
    pub static ref RSA_SIGNER: RequestSigner = RequestSigner::generate_rsa(1024).unwrap();
}

/// Authority that issues a "certificate" consisting of the encoded template subject
#[derive(Clone, Default)]
pub struct FakeAuthority {
    pub issued: Arc<Mutex<Vec<(RequestId, CertificateTemplate)>>>,
    pub reject: bool,
    pub delay_ms: u64,
}

impl Authority for FakeAuthority {
    fn issue_certificate(
        &self,
        _authority_id: &str,
        template: &CertificateTemplate,
        _profile_id: &str,
        request_id: RequestId,
    ) -> Result<IssuedCertificate> {
        if self.reject {
            return Err(Error::Rejected("authority declined".to_string()));
        }
        if self.delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
        }
        self.issued
            .lock()
            .unwrap()
            .push((request_id, template.clone()));
        Ok(IssuedCertificate {
            encoded: template.subject.to_der().unwrap(),
        })
    }
}

/// Archival connector reporting a fixed result
#[derive(Clone, Default)]
pub struct FakeArchival {
    pub success: bool,
    pub sent: Arc<Mutex<Vec<RequestId>>>,
}

impl KeyArchivalConnector for FakeArchival {
    fn send(&self, request: &Request) -> ArchivalResult {
        self.sent.lock().unwrap().push(request.id());
        ArchivalResult {
            success: self.success,
            error_message: if self.success {
                None
            } else {
                Some("archive unavailable".to_string())
            },
        }
    }
}

/// Policy validator that records what it was asked to validate
#[derive(Clone, Default)]
pub struct RecordingValidator {
    pub validated: Arc<Mutex<Vec<(String, RequestId)>>>,
}

impl PolicyValidator for RecordingValidator {
    fn validate(&self, policy_set_id: &str, request: &Request) -> Result<()> {
        self.validated
            .lock()
            .unwrap()
            .push((policy_set_id.to_string(), request.id()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingAuditSink {
    pub events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl AuditSink for RecordingAuditSink {
    fn emit(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl RecordingAuditSink {
    pub fn count(&self, kind: AuditEventKind, outcome: AuditOutcome) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind && e.outcome == outcome)
            .count()
    }
}

/// Authenticator returning a fixed result
pub struct FixedAuthenticator(pub Option<AuthToken>);

impl Authenticator for FixedAuthenticator {
    fn authenticate(&self, _credentials: &Credentials, _payload: &[u8]) -> Result<Option<AuthToken>> {
        Ok(self.0.clone())
    }
}

/// Authenticator naming the subject after the "uid" credential. The "ra-agent" uid has strong
/// identity.
pub struct UidAuthenticator;

impl Authenticator for UidAuthenticator {
    fn authenticate(&self, credentials: &Credentials, _payload: &[u8]) -> Result<Option<AuthToken>> {
        Ok(credentials.0.get("uid").map(|uid| AuthToken {
            auth_manager_id: "uid".to_string(),
            subject: Some(String::from_utf8_lossy(uid).to_string()),
            strong_identity: uid.as_slice() == b"ra-agent",
            ..Default::default()
        }))
    }
}

pub fn uid_credentials(uid: &str) -> Credentials {
    let mut credentials = Credentials::new();
    credentials.insert("uid", uid.as_bytes());
    credentials
}

pub fn agent_token(strong_identity: bool) -> AuthToken {
    AuthToken {
        auth_manager_id: "agent".to_string(),
        subject: Some("agent-1".to_string()),
        strong_identity,
        ..Default::default()
    }
}

/// Handles to the fakes installed in an environment
pub struct Fakes {
    pub authority: FakeAuthority,
    pub validator: RecordingValidator,
    pub audit: RecordingAuditSink,
}

/// Returns an environment with RustCrypto, an in-memory queue, an issuance protection token, the
/// fakes and, when given, an authenticator returning `token`. Shared secrets map "alice" and
/// "mallory" to "secret".
pub fn environment(token: Option<AuthToken>) -> (EnrollmentEnvironment, Fakes) {
    let mut ee = EnrollmentEnvironment::default();
    populate_rust_crypto_environment(&mut ee);
    ee.set_request_queue(Box::new(InMemoryRequestQueue::default()));
    ee.add_token(Box::new(SoftwareToken::generate("internal", 1024).unwrap()));

    let mut secrets = SharedSecretSource::default();
    secrets.add_secret("alice", b"secret");
    secrets.add_secret("mallory", b"secret");
    ee.add_shared_secret_resolver(Box::new(secrets));

    if token.is_some() {
        ee.add_authenticator(Box::new(FixedAuthenticator(token)));
    }

    let fakes = Fakes {
        authority: FakeAuthority::default(),
        validator: RecordingValidator::default(),
        audit: RecordingAuditSink::default(),
    };
    ee.set_authority(Box::new(fakes.authority.clone()));
    ee.add_policy_validator(Box::new(fakes.validator.clone()));
    ee.add_audit_sink(Box::new(fakes.audit.clone()));
    (ee, fakes)
}

pub fn settings() -> ProfileSettings {
    let mut settings = ProfileSettings::default();
    settings.set_policy_set_ids(vec![
        "set0".to_string(),
        "set1".to_string(),
        "set2".to_string(),
    ]);
    settings
}

pub fn stored(ee: &EnrollmentEnvironment, id: RequestId) -> Request {
    ee.request_queue()
        .unwrap()
        .find_request(id)
        .unwrap()
        .unwrap()
}

pub fn sha256() -> spki::AlgorithmIdentifierOwned {
    spki::AlgorithmIdentifierOwned {
        oid: PKIXALG_SHA256,
        parameters: None,
    }
}

pub fn hmac_sha256() -> spki::AlgorithmIdentifierOwned {
    spki::AlgorithmIdentifierOwned {
        oid: PKIXALG_HMAC_WITH_SHA256,
        parameters: None,
    }
}
