//! RFC 7636 proof key carried inside every request object.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Secret};

const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Verifier/challenge pair minted for a single flow.
#[derive(Clone, Debug)]
pub struct PkcePair {
	/// Secret verifier redeemed later at the token endpoint.
	pub verifier: Secret,
	/// Derived challenge sent inside the request object.
	pub challenge: String,
	/// Challenge method (always `S256`).
	pub method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Generates a fresh verifier and its S256 challenge.
	pub fn generate() -> Self {
		let verifier = super::random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier: Secret::new(verifier), challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
