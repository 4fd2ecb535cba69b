//! Profile configuration and policy set selection

pub mod policy_set;
pub mod profile_settings;

pub use crate::{profile::policy_set::*, profile::profile_settings::*};
