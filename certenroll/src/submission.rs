//! Processing of submissions: the per-submission session context, the submission state machine
//! and the enrollment profile that drives decoded requests from receipt to issuance, deferral or
//! rejection.

pub mod enrollment_profile;
pub mod outcome;
pub mod session_context;
pub mod submission_state;

pub use crate::{
    submission::enrollment_profile::*, submission::outcome::*, submission::session_context::*,
    submission::submission_state::*,
};
