//! Ephemeral signing keys and the RFC 9101 request objects they sign.

pub mod key;
pub mod request_object;

pub use key::*;
pub use request_object::*;

/// JOSE algorithm used for every request object.
pub const SIGNING_ALG: &str = "RS256";
