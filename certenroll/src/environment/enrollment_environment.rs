//! EnrollmentEnvironment aggregates a set of function pointers and trait objects that supply the
//! cryptographic functionality and collaborators used when processing certificate requests.
//!
//! The sample below illustrates preparation of an EnrollmentEnvironment object.
//! ```
//! use certenroll::*;
//!
//! let mut ee = EnrollmentEnvironment::default();
//!
//! // add hashing, keyed hashing, signature verification, encryption and random generation
//! populate_rust_crypto_environment(&mut ee);
//!
//! // requests are persisted via a request queue and identity proofs are verified using secrets
//! // obtained from a shared secret resolver
//! ee.set_request_queue(Box::new(InMemoryRequestQueue::default()));
//! let mut secrets = SharedSecretSource::default();
//! secrets.add_secret("alice", b"secret");
//! ee.add_shared_secret_resolver(Box::new(secrets));
//! ```
//!
//! The aggregation of function pointers and trait objects allows crypto implementations and
//! collaborators to vary. Tests, for example, install fakes for the authority and archival
//! connector.

use std::collections::BTreeMap;

use der::asn1::ObjectIdentifier;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use zeroize::Zeroizing;

use crate::{
    environment::enrollment_environment_traits::*, request::*, token::*, util::crypto::*,
    util::error::*, util::logging::*,
};

/// Tries each callback in order. The first success wins; `Unrecognized` means a callback does not
/// support the inputs. Otherwise the first error observed is returned.
fn first_success<F, T>(callbacks: &[F], mut call: impl FnMut(&F) -> Result<T>) -> Result<T> {
    let mut err = None;
    for f in callbacks {
        match call(f) {
            Ok(r) => return Ok(r),
            Err(Error::Unrecognized) => {}
            Err(e) => {
                if err.is_none() {
                    err = Some(e);
                }
            }
        }
    }
    Err(err.unwrap_or(Error::Unrecognized))
}

/// [`EnrollmentEnvironment`] provides a switchboard of callback functions and collaborator trait
/// objects that allow support to vary on different platforms or to be tailored for testing.
#[derive(Default)]
pub struct EnrollmentEnvironment {
    //--------------------------------------------------------------------------
    //Crypto interfaces
    //--------------------------------------------------------------------------
    /// List of functions that provide message digest functionality
    calculate_hash_callbacks: Vec<CalculateHash>,

    /// List of functions that provide keyed digest functionality
    calculate_mac_callbacks: Vec<CalculateMac>,

    /// List of functions that provide signature verification functionality given a message
    verify_signature_message_callbacks: Vec<VerifySignatureMessage>,

    /// List of functions that provide symmetric encryption
    encrypt_symmetric_callbacks: Vec<EncryptSymmetric>,

    /// List of functions that provide symmetric decryption
    decrypt_symmetric_callbacks: Vec<DecryptSymmetric>,

    /// List of functions that wrap keys for a recipient public key
    wrap_for_public_key_callbacks: Vec<WrapForPublicKey>,

    /// List of functions that generate random bytes
    generate_random_callbacks: Vec<GenerateRandom>,

    /// Named tokens
    tokens: BTreeMap<String, SerializedToken>,

    //--------------------------------------------------------------------------
    //Collaborators
    //--------------------------------------------------------------------------
    request_queue: Option<Box<dyn RequestQueue + Send + Sync>>,
    shared_secret_resolvers: Vec<Box<dyn SharedSecretResolver + Send + Sync>>,
    authenticators: Vec<Box<dyn Authenticator + Send + Sync>>,
    authority: Option<Box<dyn Authority + Send + Sync>>,
    archival_connector: Option<Box<dyn KeyArchivalConnector + Send + Sync>>,
    policy_validators: Vec<Box<dyn PolicyValidator + Send + Sync>>,
    audit_sinks: Vec<Box<dyn AuditSink + Send + Sync>>,
}

impl EnrollmentEnvironment {
    /// EnrollmentEnvironment::new returns a new [`EnrollmentEnvironment`] with no callbacks,
    /// tokens or collaborators.
    pub fn new() -> EnrollmentEnvironment {
        EnrollmentEnvironment::default()
    }

    /// clear_all_callbacks clears the contents of all function pointer vectors associated with an
    /// instance of [`EnrollmentEnvironment`].
    pub fn clear_all_callbacks(&mut self) {
        self.calculate_hash_callbacks.clear();
        self.calculate_mac_callbacks.clear();
        self.verify_signature_message_callbacks.clear();
        self.encrypt_symmetric_callbacks.clear();
        self.decrypt_symmetric_callbacks.clear();
        self.wrap_for_public_key_callbacks.clear();
        self.generate_random_callbacks.clear();
    }

    /// add_calculate_hash_callback adds a [`CalculateHash`] callback to the list used by calculate_hash.
    pub fn add_calculate_hash_callback(&mut self, c: CalculateHash) {
        self.calculate_hash_callbacks.push(c);
    }

    /// calculate_hash iterates over calculate_hash_callbacks until an authoritative answer is found
    /// or all options have been exhausted
    pub fn calculate_hash(
        &self,
        hash_alg: &AlgorithmIdentifierOwned,
        buffer_to_hash: &[u8],
    ) -> Result<Vec<u8>> {
        first_success(&self.calculate_hash_callbacks, |f| {
            f(self, hash_alg, buffer_to_hash)
        })
    }

    /// add_calculate_mac_callback adds a [`CalculateMac`] callback to the list used by calculate_mac.
    pub fn add_calculate_mac_callback(&mut self, c: CalculateMac) {
        self.calculate_mac_callbacks.push(c);
    }

    /// calculate_mac iterates over calculate_mac_callbacks until an authoritative answer is found
    /// or all options have been exhausted
    pub fn calculate_mac(
        &self,
        mac_alg: &AlgorithmIdentifierOwned,
        key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>> {
        first_success(&self.calculate_mac_callbacks, |f| f(self, mac_alg, key, data))
    }

    /// add_verify_signature_message_callback adds a [`VerifySignatureMessage`] callback to the list
    /// used by verify_signature_message.
    pub fn add_verify_signature_message_callback(&mut self, c: VerifySignatureMessage) {
        self.verify_signature_message_callbacks.push(c);
    }

    /// verify_signature_message iterates over verify_signature_message_callbacks until an
    /// authoritative answer is found or all options have been exhausted
    pub fn verify_signature_message(
        &self,
        message_to_verify: &[u8],
        signature: &[u8],
        signature_alg: &AlgorithmIdentifierOwned,
        spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()> {
        first_success(&self.verify_signature_message_callbacks, |f| {
            f(self, message_to_verify, signature, signature_alg, spki)
        })
    }

    /// add_encrypt_symmetric_callback adds an [`EncryptSymmetric`] callback to the list used by
    /// encrypt_symmetric.
    pub fn add_encrypt_symmetric_callback(&mut self, c: EncryptSymmetric) {
        self.encrypt_symmetric_callbacks.push(c);
    }

    /// encrypt_symmetric iterates over encrypt_symmetric_callbacks until an authoritative answer
    /// is found or all options have been exhausted
    pub fn encrypt_symmetric(
        &self,
        alg: &ObjectIdentifier,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        first_success(&self.encrypt_symmetric_callbacks, |f| {
            f(self, alg, key, iv, plaintext)
        })
    }

    /// add_decrypt_symmetric_callback adds a [`DecryptSymmetric`] callback to the list used by
    /// decrypt_symmetric.
    pub fn add_decrypt_symmetric_callback(&mut self, c: DecryptSymmetric) {
        self.decrypt_symmetric_callbacks.push(c);
    }

    /// decrypt_symmetric iterates over decrypt_symmetric_callbacks until an authoritative answer
    /// is found or all options have been exhausted
    pub fn decrypt_symmetric(
        &self,
        alg: &ObjectIdentifier,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        first_success(&self.decrypt_symmetric_callbacks, |f| {
            f(self, alg, key, iv, ciphertext)
        })
    }

    /// add_wrap_for_public_key_callback adds a [`WrapForPublicKey`] callback to the list used by
    /// wrap_for_public_key.
    pub fn add_wrap_for_public_key_callback(&mut self, c: WrapForPublicKey) {
        self.wrap_for_public_key_callbacks.push(c);
    }

    /// wrap_for_public_key iterates over wrap_for_public_key_callbacks until an authoritative
    /// answer is found or all options have been exhausted
    pub fn wrap_for_public_key(
        &self,
        spki: &SubjectPublicKeyInfoOwned,
        key_to_wrap: &[u8],
    ) -> Result<Vec<u8>> {
        first_success(&self.wrap_for_public_key_callbacks, |f| {
            f(self, spki, key_to_wrap)
        })
    }

    /// add_generate_random_callback adds a [`GenerateRandom`] callback to the list used by
    /// generate_random.
    pub fn add_generate_random_callback(&mut self, c: GenerateRandom) {
        self.generate_random_callbacks.push(c);
    }

    /// generate_random fills `buf` using the first generate_random callback that succeeds
    pub fn generate_random(&self, buf: &mut [u8]) -> Result<()> {
        first_success(&self.generate_random_callbacks, |f| f(self, &mut *buf))
    }

    //--------------------------------------------------------------------------
    //Tokens
    //--------------------------------------------------------------------------
    /// add_token adds a token, replacing any token with the same name.
    pub fn add_token(&mut self, token: Box<dyn CryptoToken + Send>) {
        let name = token.name().to_string();
        self.tokens.insert(name, SerializedToken::new(token));
    }

    /// with_token runs `f` with exclusive access to the named token.
    pub fn with_token<T>(
        &self,
        name: &str,
        f: impl FnOnce(&dyn CryptoToken) -> Result<T>,
    ) -> Result<T> {
        match self.tokens.get(name) {
            Some(token) => token.with_token(f),
            None => Err(Error::InternalError(format!("no token named {}", name))),
        }
    }

    /// wrap_with_token encrypts a key for the named token.
    pub fn wrap_with_token(&self, name: &str, key: &[u8]) -> Result<Vec<u8>> {
        self.with_token(name, |t| t.wrap_key(key))
    }

    /// unwrap_with_token decrypts a key using the named token.
    pub fn unwrap_with_token(&self, name: &str, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.with_token(name, |t| t.unwrap_key(wrapped_key))
    }

    //--------------------------------------------------------------------------
    //Collaborators
    //--------------------------------------------------------------------------
    /// set_request_queue sets the [`RequestQueue`] used to persist requests.
    pub fn set_request_queue(&mut self, q: Box<dyn RequestQueue + Send + Sync>) {
        self.request_queue = Some(q);
    }

    /// request_queue returns the configured [`RequestQueue`] or an error if none is configured.
    pub fn request_queue(&self) -> Result<&(dyn RequestQueue + Send + Sync)> {
        match &self.request_queue {
            Some(q) => Ok(q.as_ref()),
            None => Err(Error::InternalError("no request queue".to_string())),
        }
    }

    /// add_shared_secret_resolver adds a [`SharedSecretResolver`] to the list used by get_shared_secret.
    pub fn add_shared_secret_resolver(&mut self, r: Box<dyn SharedSecretResolver + Send + Sync>) {
        self.shared_secret_resolvers.push(r);
    }

    /// get_shared_secret returns the first secret found by the configured resolvers.
    pub fn get_shared_secret(
        &self,
        identification: Option<&str>,
        pki_data: &[u8],
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        for r in &self.shared_secret_resolvers {
            if let Some(secret) = r.get_shared_secret(identification, pki_data)? {
                return Ok(Some(secret));
            }
        }
        Ok(None)
    }

    /// add_authenticator adds an [`Authenticator`] to the list used by authenticate.
    pub fn add_authenticator(&mut self, a: Box<dyn Authenticator + Send + Sync>) {
        self.authenticators.push(a);
    }

    /// authenticate returns the first token produced by the configured authenticators. When no
    /// authenticator produces a token and at least one rejected the credentials,
    /// [`Error::AuthenticationFailed`] is returned.
    pub fn authenticate(
        &self,
        credentials: &Credentials,
        payload: &[u8],
    ) -> Result<Option<AuthToken>> {
        let mut failed = false;
        for a in &self.authenticators {
            match a.authenticate(credentials, payload) {
                Ok(Some(token)) => return Ok(Some(token)),
                Ok(None) => {}
                Err(e) => {
                    log_message(
                        &EeLogLevels::EeError,
                        format!("Authentication failed: {}", e).as_str(),
                    );
                    failed = true;
                }
            }
        }
        if failed {
            return Err(Error::AuthenticationFailed);
        }
        Ok(None)
    }

    /// set_authority sets the [`Authority`] used to issue certificates.
    pub fn set_authority(&mut self, a: Box<dyn Authority + Send + Sync>) {
        self.authority = Some(a);
    }

    /// issue_certificate passes the template to the configured [`Authority`]. An explicit
    /// [`Error::Rejected`] from the authority is returned as is. Other authority errors are logged
    /// and reported as a generic [`Error::Rejected`].
    pub fn issue_certificate(
        &self,
        authority_id: &str,
        template: &CertificateTemplate,
        profile_id: &str,
        request_id: RequestId,
    ) -> Result<IssuedCertificate> {
        let authority = match &self.authority {
            Some(a) => a,
            None => return Err(Error::InternalError("no authority".to_string())),
        };
        authority
            .issue_certificate(authority_id, template, profile_id, request_id)
            .map_err(|e| match e {
                Error::Rejected(m) => Error::Rejected(m),
                other => {
                    log_message(
                        &EeLogLevels::EeError,
                        format!(
                            "Authority {} failed to issue request {}: {}",
                            authority_id, request_id, other
                        )
                        .as_str(),
                    );
                    Error::Rejected("certificate issuance failed".to_string())
                }
            })
    }

    /// set_archival_connector sets the [`KeyArchivalConnector`] used for requests bearing
    /// PKIArchiveOptions.
    pub fn set_archival_connector(&mut self, c: Box<dyn KeyArchivalConnector + Send + Sync>) {
        self.archival_connector = Some(c);
    }

    /// archive_key relays the request to the configured [`KeyArchivalConnector`].
    pub fn archive_key(&self, request: &Request) -> Result<()> {
        let connector = match &self.archival_connector {
            Some(c) => c,
            None => return Err(Error::InternalError("no archival connector".to_string())),
        };
        let result = connector.send(request);
        if result.success {
            Ok(())
        } else {
            log_message(
                &EeLogLevels::EeError,
                format!(
                    "Key archival for request {} failed: {}",
                    request.id(),
                    result.error_message.unwrap_or_default()
                )
                .as_str(),
            );
            Err(Error::Rejected("key archival failed".to_string()))
        }
    }

    /// add_policy_validator adds a [`PolicyValidator`] to the list used by validate_policy.
    pub fn add_policy_validator(&mut self, v: Box<dyn PolicyValidator + Send + Sync>) {
        self.policy_validators.push(v);
    }

    /// validate_policy requires every configured [`PolicyValidator`] to accept the request.
    pub fn validate_policy(&self, policy_set_id: &str, request: &Request) -> Result<()> {
        for v in &self.policy_validators {
            v.validate(policy_set_id, request)?;
        }
        Ok(())
    }

    /// add_audit_sink adds an [`AuditSink`] to the list used by audit.
    pub fn add_audit_sink(&mut self, s: Box<dyn AuditSink + Send + Sync>) {
        self.audit_sinks.push(s);
    }

    /// audit logs the event and delivers it to every configured [`AuditSink`].
    pub fn audit(&self, event: AuditEvent) {
        let level = match event.outcome {
            AuditOutcome::Success => EeLogLevels::EeInfo,
            AuditOutcome::Failure => EeLogLevels::EeWarn,
        };
        let request = match event.request_id {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        log_message(
            &level,
            format!(
                "audit: {:?} {:?} request {}: {}",
                event.kind, event.outcome, request, event.info
            )
            .as_str(),
        );
        for s in &self.audit_sinks {
            s.emit(&event);
        }
    }
}

/// populate_rust_crypto_environment installs the RustCrypto-based implementations of each crypto
/// interface.
pub fn populate_rust_crypto_environment(ee: &mut EnrollmentEnvironment) {
    ee.add_calculate_hash_callback(calculate_hash_rust_crypto);
    ee.add_calculate_mac_callback(calculate_mac_rust_crypto);
    ee.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
    ee.add_encrypt_symmetric_callback(encrypt_symmetric_rust_crypto);
    ee.add_decrypt_symmetric_callback(decrypt_symmetric_rust_crypto);
    ee.add_wrap_for_public_key_callback(wrap_for_public_key_rust_crypto);
    ee.add_generate_random_callback(generate_random_rust_crypto);
}
