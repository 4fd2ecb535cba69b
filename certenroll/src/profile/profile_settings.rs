//! Structures and functions related to configuring an enrollment profile

use std::collections::BTreeMap;
use std::path::Path;

use der::{Decode, Encode};
use serde::{Deserialize, Serialize};
use x509_cert::ext::Extension;

use pkiprocmacros::*;

use crate::request::{Buffers, ExtensionSet, Strings};
use crate::util::error::*;
use crate::util::file_utils::get_file_as_byte_vec;

/// `ProfileSettingsTypes` is used to define a variant map with types associated with configuring
/// an enrollment profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileSettingsTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents String values
    String(String),
    /// Represents vectors of Strings
    Strings(Strings),
    /// Represents vectors of buffers
    Buffers(Buffers),
}

/// `ProfileSettings` is a map of values keyed by the static strings below. Absent values yield
/// the documented defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings(pub BTreeMap<String, ProfileSettingsTypes>);

impl ProfileSettings {
    /// Creates a new empty [`ProfileSettings`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes [`PS_DEFAULT_EXTENSIONS`] into an [`ExtensionSet`]. A malformed entry is a
    /// configuration error.
    pub fn get_default_extension_set(&self) -> Result<ExtensionSet> {
        let mut set = ExtensionSet::new();
        for enc in self.get_default_extensions() {
            let ext = Extension::from_der(&enc).map_err(|e| {
                Error::InternalError(format!("malformed default extension in profile: {}", e))
            })?;
            set.set(ext);
        }
        Ok(set)
    }

    /// Encodes the given extensions and saves them as [`PS_DEFAULT_EXTENSIONS`].
    pub fn set_default_extension_set(&mut self, exts: &ExtensionSet) -> Result<()> {
        let mut encoded = vec![];
        for ext in exts.iter() {
            encoded.push(ext.to_der()?);
        }
        self.set_default_extensions(encoded);
        Ok(())
    }
}

//-----------------------------------------------------------------------------------------------
// Profile setting keys
//-----------------------------------------------------------------------------------------------
/// `PS_PROFILE_ID` names the profile. Defaults to "cmcUserCert".
pub static PS_PROFILE_ID: &str = "psProfileId";
/// `PS_AUTHORITY_ID` names the authority that issues certificates for the profile. Defaults to "ca".
pub static PS_AUTHORITY_ID: &str = "psAuthorityId";
/// `PS_POLICY_SET_IDS` lists the policy sets of the profile in order. A request is assigned the
/// set at the position of its sequence number.
pub static PS_POLICY_SET_IDS: &str = "psPolicySetIds";
/// `PS_VERIFY_PKCS10_SIGNATURE` governs whether PKCS #10 signatures are verified. Defaults to true.
pub static PS_VERIFY_PKCS10_SIGNATURE: &str = "psVerifyPkcs10Signature";
/// `PS_POP_LINK_WITNESS_REQUIRED` governs whether requests bearing POP must carry a POP link
/// witness. Defaults to false.
pub static PS_POP_LINK_WITNESS_REQUIRED: &str = "psPopLinkWitnessRequired";
/// `PS_ALLOW_LRA_POP_WITNESS` governs whether an lraPOPWitness control may exempt named requests
/// from POP verification. Defaults to false.
pub static PS_ALLOW_LRA_POP_WITNESS: &str = "psAllowLraPopWitness";
/// `PS_POP_CHALLENGE_ENABLED` governs whether requests without a verifiable POP are challenged.
/// When false such requests fail. Defaults to true.
pub static PS_POP_CHALLENGE_ENABLED: &str = "psPopChallengeEnabled";
/// `PS_IS_CA_PROFILE` indicates the profile is served by a CA and may relay requests bearing
/// PKIArchiveOptions to a key archival service. Defaults to true.
pub static PS_IS_CA_PROFILE: &str = "psIsCaProfile";
/// `PS_ISSUANCE_PROTECTION_TOKEN` names the token used to protect challenge keys. Defaults to "internal".
pub static PS_ISSUANCE_PROTECTION_TOKEN: &str = "psIssuanceProtectionToken";
/// `PS_DEFAULT_EXTENSIONS` holds DER-encoded extensions included in every template unless the
/// request supplies an extension with the same OID. Defaults to empty.
pub static PS_DEFAULT_EXTENSIONS: &str = "psDefaultExtensions";

ps_gets_and_sets_with_default!(PS_PROFILE_ID, String, "cmcUserCert".to_string());
ps_gets_and_sets_with_default!(PS_AUTHORITY_ID, String, "ca".to_string());
ps_gets_and_sets_with_default!(PS_POLICY_SET_IDS, Strings, vec![]);
ps_gets_and_sets_with_default!(PS_VERIFY_PKCS10_SIGNATURE, bool, true);
ps_gets_and_sets_with_default!(PS_POP_LINK_WITNESS_REQUIRED, bool, false);
ps_gets_and_sets_with_default!(PS_ALLOW_LRA_POP_WITNESS, bool, false);
ps_gets_and_sets_with_default!(PS_POP_CHALLENGE_ENABLED, bool, true);
ps_gets_and_sets_with_default!(PS_IS_CA_PROFILE, bool, true);
ps_gets_and_sets_with_default!(PS_ISSUANCE_PROTECTION_TOKEN, String, "internal".to_string());
ps_gets_and_sets_with_default!(PS_DEFAULT_EXTENSIONS, Buffers, vec![]);

/// `read_settings` accepts a string containing the name of a file that notionally contains JSON
/// data that represents [`ProfileSettings`]. When no file name is given or the file does not exist,
/// default settings are returned.
pub fn read_settings(fname: &Option<String>) -> Result<ProfileSettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        if Path::exists(p) {
            let json = get_file_as_byte_vec(p)?;
            return serde_json::from_slice(&json).map_err(|e| {
                Error::InternalError(format!("failed to parse settings from {}: {}", fname, e))
            });
        }
    }
    Ok(ProfileSettings::new())
}
