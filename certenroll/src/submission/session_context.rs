//! The session_context module provides [`SessionContext`], the per-submission scratch space that
//! carries values between verification steps. A context is never shared between submissions and
//! is cleared when dropped.

use std::collections::BTreeSet;

use flagset::{flags, FlagSet};
use zeroize::Zeroizing;

use crate::asn1::BodyPartId;
use crate::environment::{AuthToken, EnrollmentEnvironment};
use crate::util::error::*;

flags! {
    /// Markers recording which steps have completed within a submission
    pub enum SessionMarkers: u8 {
        /// Batch-level CMC controls have been processed
        ControlsProcessed,
        /// Identity proof controls verified
        IdentityVerified,
        /// The shared secret has been looked up, whether or not one was found
        SecretResolved,
    }
}

/// Per-submission state
#[derive(Default)]
pub struct SessionContext {
    markers: FlagSet<SessionMarkers>,
    auth_token: Option<AuthToken>,
    identification: Option<String>,
    proven_identity: Option<String>,
    reg_info: Option<Vec<u8>>,
    locale: Option<String>,
    shared_secret: Option<Zeroizing<Vec<u8>>>,
    pop_link_verified: BTreeSet<BodyPartId>,
}

impl SessionContext {
    /// Creates an empty context for a submission in the given locale
    pub fn new(locale: Option<String>) -> Self {
        let mut session = SessionContext::default();
        session.locale = locale;
        session
    }

    /// Sets a marker
    pub fn mark(&mut self, marker: SessionMarkers) {
        self.markers |= marker;
    }

    /// Returns true if the marker is set
    pub fn is_marked(&self, marker: SessionMarkers) -> bool {
        self.markers.contains(marker)
    }

    /// Saves the token produced by authentication
    pub fn set_auth_token(&mut self, token: Option<AuthToken>) {
        self.auth_token = token;
    }

    /// Returns the token produced by authentication, if any
    pub fn auth_token(&self) -> Option<&AuthToken> {
        self.auth_token.as_ref()
    }

    /// Returns true when authentication established strong identity
    pub fn strong_identity(&self) -> bool {
        self.auth_token
            .as_ref()
            .map(|t| t.strong_identity)
            .unwrap_or(false)
    }

    /// Saves the identification control value
    pub fn set_identification(&mut self, identification: &str) {
        self.identification = Some(identification.to_string());
    }

    /// Returns the identification control value, if any
    pub fn identification(&self) -> Option<&str> {
        self.identification.as_deref()
    }

    /// Saves the identity proven by an identity proof
    pub fn set_proven_identity(&mut self, identity: String) {
        self.proven_identity = Some(identity);
    }

    /// Returns the identity proven by an identity proof, if any
    pub fn proven_identity(&self) -> Option<&str> {
        self.proven_identity.as_deref()
    }

    /// Returns the subject to associate with requests: a proven identity takes precedence over
    /// the subject asserted by authentication.
    pub fn authenticated_subject(&self) -> Option<String> {
        match &self.proven_identity {
            Some(p) => Some(p.clone()),
            None => self.auth_token.as_ref().and_then(|t| t.subject.clone()),
        }
    }

    /// Saves the regInfo control value
    pub fn set_reg_info(&mut self, reg_info: Vec<u8>) {
        self.reg_info = Some(reg_info);
    }

    /// Returns the regInfo control value, if any
    pub fn reg_info(&self) -> Option<&[u8]> {
        self.reg_info.as_deref()
    }

    /// Returns the locale of the submission, if any
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Returns the shared secret for the submission, consulting the resolvers configured in `ee`
    /// on first use only.
    pub fn shared_secret(
        &mut self,
        ee: &EnrollmentEnvironment,
        identification: Option<&str>,
        pki_data: &[u8],
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        if !self.is_marked(SessionMarkers::SecretResolved) {
            self.shared_secret = ee.get_shared_secret(identification, pki_data)?;
            self.mark(SessionMarkers::SecretResolved);
        }
        Ok(self.shared_secret.clone())
    }

    /// Records that the POP link witness of a request verified
    pub fn record_pop_link_verified(&mut self, body_part_id: BodyPartId) {
        self.pop_link_verified.insert(body_part_id);
    }

    /// Returns true if the POP link witness of a request already verified
    pub fn is_pop_link_verified(&self, body_part_id: BodyPartId) -> bool {
        self.pop_link_verified.contains(&body_part_id)
    }

    /// Discards all state, including credential material
    pub fn clear(&mut self) {
        self.markers = FlagSet::default();
        self.auth_token = None;
        self.identification = None;
        self.proven_identity = None;
        self.reg_info = None;
        self.shared_secret = None;
        self.pop_link_verified.clear();
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SharedSecretSource;

    #[test]
    fn session_context_test() {
        let mut ee = EnrollmentEnvironment::default();
        let mut secrets = SharedSecretSource::default();
        secrets.add_secret("alice", b"secret");
        ee.add_shared_secret_resolver(Box::new(secrets));

        let mut session = SessionContext::new(Some("en-US".to_string()));
        assert!(!session.is_marked(SessionMarkers::ControlsProcessed));
        session.mark(SessionMarkers::ControlsProcessed);
        assert!(session.is_marked(SessionMarkers::ControlsProcessed));
        assert!(!session.is_marked(SessionMarkers::IdentityVerified));

        assert_eq!(None, session.authenticated_subject());
        session.set_auth_token(Some(AuthToken {
            subject: Some("agent".to_string()),
            ..Default::default()
        }));
        assert_eq!(Some("agent".to_string()), session.authenticated_subject());
        session.set_proven_identity("alice".to_string());
        assert_eq!(Some("alice".to_string()), session.authenticated_subject());
        assert!(!session.strong_identity());

        let secret = session.shared_secret(&ee, Some("alice"), &[]).unwrap();
        assert_eq!(Some(b"secret".to_vec()), secret.map(|s| s.to_vec()));
        // resolved once per session
        let secret = session.shared_secret(&ee, Some("bob"), &[]).unwrap();
        assert_eq!(Some(b"secret".to_vec()), secret.map(|s| s.to_vec()));

        session.record_pop_link_verified(4);
        assert!(session.is_pop_link_verified(4));
        session.clear();
        assert!(!session.is_pop_link_verified(4));
        assert!(session.auth_token().is_none());
        assert!(!session.is_marked(SessionMarkers::ControlsProcessed));
        assert_eq!(Some("en-US"), session.locale());
    }
}
