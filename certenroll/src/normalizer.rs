//! Normalization of decoded requests into the certificate template and request attributes used
//! by policy evaluation and issuance.

pub mod extension_checks;
pub mod request_normalizer;

pub use crate::{normalizer::extension_checks::*, normalizer::request_normalizer::*};
