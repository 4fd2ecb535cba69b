//! Named cryptographic tokens holding key pairs used to protect enrollment artifacts

pub mod crypto_token;
pub mod software_token;

pub use crate::{token::crypto_token::*, token::software_token::*};
