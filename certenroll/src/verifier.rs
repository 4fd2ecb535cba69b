//! Verification of identity proofs, POP link witnesses and proof of possession, including the
//! encrypted challenge used when proof of possession can not be verified synchronously.

pub mod identity_proof;
pub mod pop;
pub mod pop_link_witness;

pub use crate::{verifier::identity_proof::*, verifier::pop::*, verifier::pop_link_witness::*};
