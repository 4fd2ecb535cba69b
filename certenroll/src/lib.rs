#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod asn1;
pub mod builder;
pub mod decoder;
pub mod environment;
pub mod normalizer;
pub mod profile;
pub mod request;
pub mod source;
pub mod submission;
pub mod token;
pub mod util;
pub mod verifier;

// order of pub use statements below is intended to assure the list emitted by cargo doc on the main
// index.html page is in alphabetical order.
pub use crate::asn1::*;
pub use crate::builder::*;
pub use crate::decoder::*;
pub use crate::environment::*;
pub use crate::normalizer::*;
pub use crate::profile::*;
pub use crate::request::*;
pub use crate::{source::*, submission::*, token::*, util::*, verifier::*};
