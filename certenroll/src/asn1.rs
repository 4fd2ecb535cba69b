//! ASN.1 structures defined in RFC 4211 (CRMF) and RFC 5272 (CMC) that are needed to process
//! enrollment requests, along with the object identifiers used to dispatch CMC controls.

pub mod cmc;
pub mod cmc_oids;
pub mod crmf;

pub use crate::{asn1::cmc::*, asn1::cmc_oids::*, asn1::crmf::*};
