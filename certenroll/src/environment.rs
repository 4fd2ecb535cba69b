//! Callback and trait object switchboard supporting certificate enrollment

pub mod enrollment_environment;
pub mod enrollment_environment_traits;

pub use crate::{
    environment::enrollment_environment::*, environment::enrollment_environment_traits::*,
};
