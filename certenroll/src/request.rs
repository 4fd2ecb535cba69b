//! The request module provides the internal Request record, its attribute map, the certificate
//! template built by the normalizer and the transient artifacts of the proof-of-possession
//! challenge protocol.

pub mod certificate_template;
pub mod enrollment_request;
pub mod proof_artifacts;
pub mod request_attributes;

pub use crate::{
    request::certificate_template::*, request::enrollment_request::*,
    request::proof_artifacts::*, request::request_attributes::*,
};
