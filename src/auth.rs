//! Client identifiers, scope sets, and the per-flow secrets minted for each invocation.

pub mod id;
pub mod pkce;
pub mod scope;
pub mod secret;

pub use id::*;
pub use pkce::*;
pub use scope::*;
pub use secret::*;

// crates.io
use rand::{Rng, distr::Alphanumeric};

/// Returns `len` characters drawn from the thread-local CSPRNG.
pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
