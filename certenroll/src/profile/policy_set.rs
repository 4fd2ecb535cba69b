//! The policy_set module assigns requests to the policy sets configured for a profile. The set at
//! position `n` of [`PS_POLICY_SET_IDS`] applies to the request with sequence number `n`.

use crate::profile::profile_settings::*;
use crate::request::Request;
use crate::util::error::*;
use crate::util::logging::*;

/// Returns the policy set ID at the given 0-based position, or [`Error::NoPolicySet`] when the
/// profile configures fewer sets.
pub fn select_policy_set(settings: &ProfileSettings, seq_num: u32) -> Result<String> {
    let ids = settings.get_policy_set_ids();
    match ids.get(seq_num as usize) {
        Some(id) => Ok(id.clone()),
        None => {
            log_message(
                &EeLogLevels::EeError,
                format!(
                    "No policy set configured at position {} of profile {} ({} configured)",
                    seq_num,
                    settings.get_profile_id(),
                    ids.len()
                )
                .as_str(),
            );
            Err(Error::NoPolicySet(seq_num))
        }
    }
}

/// Selects a policy set for the request using its recorded sequence number and saves the result
/// on the request.
pub fn assign_policy_set(settings: &ProfileSettings, request: &mut Request) -> Result<String> {
    let seq_num = request.attributes.get_seq_num().unwrap_or(0);
    let id = select_policy_set(settings, seq_num)?;
    request.attributes.set_policy_set_id(id.clone());
    Ok(id)
}

#[test]
fn select_policy_set_test() {
    use crate::request::*;

    let mut ps = ProfileSettings::default();
    assert_eq!(Err(Error::NoPolicySet(0)), select_policy_set(&ps, 0));
    ps.set_policy_set_ids(vec!["encryptionCertSet".to_string(), "signingCertSet".to_string()]);
    assert_eq!("encryptionCertSet", select_policy_set(&ps, 0).unwrap());
    assert_eq!("signingCertSet", select_policy_set(&ps, 1).unwrap());
    assert_eq!(Err(Error::NoPolicySet(2)), select_policy_set(&ps, 2));

    let mut r = Request::new(RequestId(1), RequestKind::Crmf);
    r.attributes.set_seq_num(1);
    assert_eq!("signingCertSet", assign_policy_set(&ps, &mut r).unwrap());
    assert_eq!(Some("signingCertSet".to_string()), r.attributes.get_policy_set_id());
}
