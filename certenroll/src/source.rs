//! Reference implementations of the request queue and shared secret collaborators

pub mod request_queue;
pub mod shared_secret_source;

pub use crate::{source::request_queue::*, source::shared_secret_source::*};
