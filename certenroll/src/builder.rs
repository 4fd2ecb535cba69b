//! Client-side assembly of PKCS #10, CRMF and CMC requests, including the witnesses and
//! decryptedPOP responses a requester computes. Used by clients and tools that submit requests
//! and to generate test fixtures.

pub mod cmc_builder;
pub mod request_builder;
pub mod request_signer;

pub use crate::{
    builder::cmc_builder::*, builder::request_builder::*, builder::request_signer::*,
};
