//! Basic utility functionality supporting certificate enrollment

pub mod crypto;
pub mod enroll_alg_oids;
pub mod enroll_utilities;
pub mod error;
pub mod file_utils;
pub mod logging;

pub use crate::{
    util::crypto::*, util::enroll_alg_oids::*, util::enroll_utilities::*, util::error::*,
    util::file_utils::*, util::logging::*,
};
