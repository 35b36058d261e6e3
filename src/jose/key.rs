//! Ephemeral RSA signing keys minted per flow invocation.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand_core::OsRng;
use rsa::{RsaPrivateKey, pkcs1::EncodeRsaPrivateKey, traits::PublicKeyParts};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::KeyId, error::KeyError, jose::SIGNING_ALG};

/// Single-use RSA key pair that signs exactly one request object.
///
/// The flow drops the key as soon as the request object is signed. Only the
/// [`RsaPrivateKey`] half zeroizes on drop; the DER copy held by the [`EncodingKey`] is
/// released without being cleared.
pub struct EphemeralKey {
	kid: KeyId,
	private_key: RsaPrivateKey,
	encoding_key: EncodingKey,
}
impl EphemeralKey {
	/// Generates a fresh key of `bits` bits with a random key identifier.
	pub fn generate(bits: usize) -> Result<Self, KeyError> {
		let private_key = RsaPrivateKey::new(&mut OsRng, bits)?;
		let der = private_key.to_pkcs1_der()?;
		let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

		Ok(Self { kid: KeyId::generate(), private_key, encoding_key })
	}

	/// Key identifier placed in the JOSE header.
	pub fn kid(&self) -> &KeyId {
		&self.kid
	}

	/// Modulus size in bits.
	pub fn bits(&self) -> usize {
		self.private_key.size() * 8
	}

	/// Public half rendered as a JWK.
	pub fn public_jwk(&self) -> PublicJwk {
		PublicJwk {
			kty: "RSA",
			kid: self.kid.clone(),
			alg: SIGNING_ALG,
			key_use: "sig",
			n: URL_SAFE_NO_PAD.encode(self.private_key.n().to_bytes_be()),
			e: URL_SAFE_NO_PAD.encode(self.private_key.e().to_bytes_be()),
		}
	}

	/// RFC 7638 SHA-256 thumbprint of the public key.
	pub fn thumbprint(&self) -> Result<String, KeyError> {
		let jwk = self.public_jwk();

		rsa_thumbprint(&jwk.n, &jwk.e)
	}

	/// Verification key for the public half.
	pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
		let jwk = self.public_jwk();

		Ok(DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?)
	}

	pub(crate) fn encoding_key(&self) -> &EncodingKey {
		&self.encoding_key
	}
}
impl Debug for EphemeralKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EphemeralKey")
			.field("kid", &self.kid)
			.field("bits", &self.bits())
			.finish_non_exhaustive()
	}
}

/// Public RSA key in JWK form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicJwk {
	/// Key type (`RSA`).
	pub kty: &'static str,
	/// Key identifier.
	pub kid: KeyId,
	/// Intended algorithm.
	pub alg: &'static str,
	/// Intended use (`sig`).
	#[serde(rename = "use")]
	pub key_use: &'static str,
	/// Base64url modulus.
	pub n: String,
	/// Base64url public exponent.
	pub e: String,
}

// Required members only, in lexicographic order.
#[derive(Serialize)]
struct ThumbprintMembers<'a> {
	e: &'a str,
	kty: &'static str,
	n: &'a str,
}

fn rsa_thumbprint(n: &str, e: &str) -> Result<String, KeyError> {
	let canonical = serde_json::to_vec(&ThumbprintMembers { e, kty: "RSA", n })?;

	Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(canonical)))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_keys_are_distinct_and_sized() {
		let lhs = EphemeralKey::generate(2048).expect("Key generation should succeed.");
		let rhs = EphemeralKey::generate(2048).expect("Key generation should succeed.");

		assert_eq!(lhs.bits(), 2048);
		assert_ne!(lhs.kid(), rhs.kid());
		assert_ne!(lhs.public_jwk().n, rhs.public_jwk().n);
		assert_ne!(
			lhs.thumbprint().expect("Thumbprint should serialize."),
			rhs.thumbprint().expect("Thumbprint should serialize.")
		);
	}

	#[test]
	fn thumbprint_hashes_canonical_members() {
		let expected =
			URL_SAFE_NO_PAD.encode(Sha256::digest(br#"{"e":"AQAB","kty":"RSA","n":"0vx7ag-_"}"#));

		assert_eq!(
			rsa_thumbprint("0vx7ag-_", "AQAB").expect("Thumbprint should serialize."),
			expected
		);
	}

	#[test]
	fn public_jwk_exposes_only_public_members() {
		let key = EphemeralKey::generate(2048).expect("Key generation should succeed.");
		let jwk = serde_json::to_value(key.public_jwk()).expect("JWK should serialize.");

		assert_eq!(jwk["kty"], "RSA");
		assert_eq!(jwk["use"], "sig");
		assert_eq!(jwk["alg"], "RS256");
		assert_eq!(jwk["e"], "AQAB");
		assert_eq!(jwk["kid"], key.kid().as_ref());
		assert!(jwk.get("d").is_none());
		assert!(format!("{key:?}").contains("bits: 2048"));
	}
}
