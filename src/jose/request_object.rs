//! Signed RFC 9101 request objects and their claims.

// crates.io
use jsonwebtoken::{Algorithm, Header};
// self
use crate::{
	_prelude::*,
	auth::{PkcePair, Secret},
	config::ClientConfiguration,
	error::KeyError,
	jose::EphemeralKey,
};

/// JOSE `typ` for authorization request objects (RFC 9101 §10.8).
pub const REQUEST_OBJECT_TYP: &str = "oauth-authz-req+jwt";

const JTI_LEN: usize = 32;

/// Claim set embedded in a request object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestObjectClaims {
	/// Issuer of the assertion (the client).
	pub iss: String,
	/// Subject of the assertion (the client).
	pub sub: String,
	/// Intended audience.
	pub aud: String,
	/// Issued-at, seconds since the epoch.
	pub iat: i64,
	/// Not-before, seconds since the epoch.
	pub nbf: i64,
	/// Expiry, seconds since the epoch.
	pub exp: i64,
	/// Unique assertion identifier.
	pub jti: String,
	/// Always `code`.
	pub response_type: String,
	/// Registered client identifier.
	pub client_id: String,
	/// Registered redirect URI.
	pub redirect_uri: String,
	/// Space-delimited scopes.
	pub scope: String,
	/// Anti-CSRF value echoed back on the redirect.
	pub state: String,
	/// Replay-protection value bound into the ID token.
	pub nonce: String,
	/// PKCE challenge.
	pub code_challenge: String,
	/// PKCE challenge method.
	pub code_challenge_method: String,
}
impl RequestObjectClaims {
	/// Assembles the claim set for one authorization request.
	pub fn new(
		config: &ClientConfiguration,
		audience: &str,
		state: &str,
		nonce: &str,
		pkce: &PkcePair,
		issued_at: OffsetDateTime,
	) -> Self {
		let iat = issued_at.unix_timestamp();
		let client_id = config.client_id.to_string();

		Self {
			iss: client_id.clone(),
			sub: client_id.clone(),
			aud: audience.to_owned(),
			iat,
			nbf: iat,
			exp: (issued_at + config.request_object_lifetime).unix_timestamp(),
			jti: crate::auth::random_string(JTI_LEN),
			response_type: "code".into(),
			client_id,
			redirect_uri: config.redirect_uri.to_string(),
			scope: config.scope.normalized(),
			state: state.to_owned(),
			nonce: nonce.to_owned(),
			code_challenge: pkce.challenge.clone(),
			code_challenge_method: pkce.method.as_str().into(),
		}
	}
}

/// Compact RS256 JWS carrying [`RequestObjectClaims`].
#[derive(Clone, Debug)]
pub struct RequestObject(Secret);
impl RequestObject {
	/// Signs `claims` with `key`, stamping the key id and request object `typ`.
	pub fn sign(claims: &RequestObjectClaims, key: &EphemeralKey) -> Result<Self, KeyError> {
		let mut header = Header::new(Algorithm::RS256);

		header.typ = Some(REQUEST_OBJECT_TYP.into());
		header.kid = Some(key.kid().to_string());

		let token = jsonwebtoken::encode(&header, claims, key.encoding_key())?;

		Ok(Self(Secret::new(token)))
	}

	/// Compact serialization sent as the `request` parameter.
	pub fn as_str(&self) -> &str {
		self.0.expose()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{Validation, decode, decode_header};
	// self
	use super::*;
	use crate::auth::{ClientId, ScopeSet};

	const AUDIENCE: &str = "https://idp.airline.com/authorize";

	fn config() -> ClientConfiguration {
		ClientConfiguration::builder()
			.client_id(ClientId::new("travel-agency-app").expect("Client fixture should be valid."))
			.redirect_uri(
				Url::parse("https://app.travelagency.com/callback")
					.expect("Redirect fixture should parse."),
			)
			.issuer(Url::parse("https://idp.airline.com").expect("Issuer fixture should parse."))
			.scope(
				ScopeSet::new(["openid", "profile", "airline_api"])
					.expect("Scope fixture should be valid."),
			)
			.build()
			.expect("Configuration fixture should build.")
	}

	fn validation() -> Validation {
		let mut validation = Validation::new(Algorithm::RS256);

		validation.set_audience(&[AUDIENCE]);
		validation.set_issuer(&["travel-agency-app"]);

		validation
	}

	#[test]
	fn claims_follow_configuration() {
		let pkce = PkcePair::generate();
		let now = OffsetDateTime::now_utc();
		let claims = RequestObjectClaims::new(&config(), AUDIENCE, "state-1", "nonce-1", &pkce, now);

		assert_eq!(claims.iss, "travel-agency-app");
		assert_eq!(claims.sub, "travel-agency-app");
		assert_eq!(claims.client_id, "travel-agency-app");
		assert_eq!(claims.aud, AUDIENCE);
		assert_eq!(claims.response_type, "code");
		assert_eq!(claims.redirect_uri, "https://app.travelagency.com/callback");
		assert_eq!(claims.scope, "airline_api openid profile");
		assert_eq!(claims.exp - claims.iat, 300);
		assert_eq!(claims.nbf, claims.iat);
		assert_eq!(claims.code_challenge, pkce.challenge);
		assert_eq!(claims.code_challenge_method, "S256");
		assert_eq!(claims.jti.len(), JTI_LEN);
	}

	#[test]
	fn signature_verifies_with_ephemeral_public_key() {
		let key = EphemeralKey::generate(2048).expect("Key generation should succeed.");
		let claims = RequestObjectClaims::new(
			&config(),
			AUDIENCE,
			"state-2",
			"nonce-2",
			&PkcePair::generate(),
			OffsetDateTime::now_utc(),
		);
		let request = RequestObject::sign(&claims, &key).expect("Signing should succeed.");
		let header = decode_header(request.as_str()).expect("Header should decode.");

		assert_eq!(header.alg, Algorithm::RS256);
		assert_eq!(header.typ.as_deref(), Some(REQUEST_OBJECT_TYP));
		assert_eq!(header.kid.as_deref(), Some(key.kid().as_ref()));

		let decoded = decode::<RequestObjectClaims>(
			request.as_str(),
			&key.decoding_key().expect("Decoding key should build."),
			&validation(),
		)
		.expect("Signature should verify with the ephemeral public key.");

		assert_eq!(decoded.claims, claims);
	}

	#[test]
	fn signature_rejects_foreign_keys() {
		let key = EphemeralKey::generate(2048).expect("Key generation should succeed.");
		let other = EphemeralKey::generate(2048).expect("Key generation should succeed.");
		let claims = RequestObjectClaims::new(
			&config(),
			AUDIENCE,
			"state-3",
			"nonce-3",
			&PkcePair::generate(),
			OffsetDateTime::now_utc(),
		);
		let request = RequestObject::sign(&claims, &key).expect("Signing should succeed.");

		assert!(
			decode::<RequestObjectClaims>(
				request.as_str(),
				&other.decoding_key().expect("Decoding key should build."),
				&validation(),
			)
			.is_err()
		);
		assert_eq!(format!("{request:?}"), "RequestObject(Secret(\"<redacted>\"))");
	}
}
