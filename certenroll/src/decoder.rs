//! Decoding of PKCS #10, CRMF and CMC submissions into typed structures, including extraction and
//! classification of CMC controls. Decoding never mutates shared state and reports malformed input
//! as [`Error::BadRequest`](../util/error/enum.Error.html).

pub mod controls;
pub mod payload;
pub mod wire_decoder;

pub use crate::{decoder::controls::*, decoder::payload::*, decoder::wire_decoder::*};
