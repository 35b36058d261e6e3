//! Redirect returned to callers once the pushed authorization request succeeds.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{
	_prelude::*,
	auth::{KeyId, Secret},
};

/// Sub-delims and gen-delims that may appear unescaped inside a query value.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'.')
	.remove(b'_')
	.remove(b'~')
	.remove(b':')
	.remove(b'/')
	.remove(b'@')
	.remove(b'!')
	.remove(b'$')
	.remove(b'(')
	.remove(b')')
	.remove(b'*')
	.remove(b',')
	.remove(b';');

/// Result of a successful flow: where to send the browser, plus what the callback needs.
#[derive(Clone, Debug)]
pub struct AuthorizationRedirect {
	/// `{authorization_endpoint}?request_uri={request_uri}`.
	pub authorization_url: Url,
	/// Reference returned by the PAR endpoint.
	pub request_uri: String,
	/// Lifetime of `request_uri` as reported by the provider.
	pub expires_in: Duration,
	/// Instant after which the redirect is no longer honored.
	pub expires_at: OffsetDateTime,
	/// `state` embedded in the request object; must round-trip via the callback.
	pub state: String,
	/// `nonce` embedded in the request object; must appear in the ID token.
	pub nonce: String,
	/// PKCE verifier to present when redeeming the authorization code.
	pub code_verifier: Secret,
	/// Key identifier of the discarded signing key.
	pub key_id: KeyId,
}
impl AuthorizationRedirect {
	/// Validates the `state` parameter returned on the authorization callback.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}

	/// Whether `request_uri` has lapsed at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}

	/// Consumes the redirect, keeping only the URL.
	pub fn into_url(self) -> Url {
		self.authorization_url
	}
}
impl Display for AuthorizationRedirect {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.authorization_url.as_str())
	}
}

/// Appends `request_uri` to `authorization_endpoint`, keeping any query the endpoint
/// already carries.
///
/// Characters that are legal inside a query component stay verbatim, so a URN reference
/// such as `urn:ietf:params:oauth:request_uri:abc123` is emitted unescaped.
pub fn build_authorization_url(authorization_endpoint: &Url, request_uri: &str) -> Url {
	let mut url = authorization_endpoint.clone();
	let pair = format!("request_uri={}", utf8_percent_encode(request_uri, QUERY_VALUE));
	let query = match url.query() {
		Some(existing) if !existing.is_empty() => format!("{existing}&{pair}"),
		_ => pair,
	};

	url.set_query(Some(&query));

	url
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn endpoint(raw: &str) -> Url {
		Url::parse(raw).expect("Endpoint fixture should parse.")
	}

	fn redirect() -> AuthorizationRedirect {
		AuthorizationRedirect {
			authorization_url: endpoint(
				"https://idp.airline.com/authorize?request_uri=urn:ietf:params:oauth:request_uri:abc123",
			),
			request_uri: "urn:ietf:params:oauth:request_uri:abc123".into(),
			expires_in: Duration::seconds(90),
			expires_at: datetime!(2025-01-01 00:01:30 UTC),
			state: "expected".into(),
			nonce: "nonce".into(),
			code_verifier: Secret::new("pkce-verifier-value"),
			key_id: KeyId::new("kid-1").expect("Key id fixture should be valid."),
		}
	}

	#[test]
	fn urn_references_stay_readable() {
		let url = build_authorization_url(
			&endpoint("https://idp.airline.com/authorize"),
			"urn:ietf:params:oauth:request_uri:abc123",
		);

		assert_eq!(
			url.as_str(),
			"https://idp.airline.com/authorize?request_uri=urn:ietf:params:oauth:request_uri:abc123"
		);
	}

	#[test]
	fn existing_queries_are_preserved() {
		let url = build_authorization_url(
			&endpoint("https://idp.airline.com/authorize?tenant=eu"),
			"urn:example:1",
		);

		assert_eq!(
			url.as_str(),
			"https://idp.airline.com/authorize?tenant=eu&request_uri=urn:example:1"
		);
		assert_eq!(
			url.query_pairs()
				.find(|(key, _)| key == "request_uri")
				.map(|(_, value)| value.into_owned()),
			Some("urn:example:1".into())
		);
	}

	#[test]
	fn reserved_characters_are_escaped() {
		let url = build_authorization_url(
			&endpoint("https://idp.airline.com/authorize"),
			"urn:x:a&b=c d+e#f%",
		);

		assert_eq!(
			url.as_str(),
			"https://idp.airline.com/authorize?request_uri=urn:x:a%26b%3Dc%20d%2Be%23f%25"
		);
		assert_eq!(
			url.query_pairs().next().map(|(_, value)| value.into_owned()),
			Some("urn:x:a&b=c d+e#f%".into())
		);
	}

	#[test]
	fn non_ascii_references_are_utf8_escaped() {
		let url = build_authorization_url(
			&endpoint("https://idp.airline.com/authorize"),
			"urn:x:caf\u{e9}~ok",
		);

		assert_eq!(
			url.as_str(),
			"https://idp.airline.com/authorize?request_uri=urn:x:caf%C3%A9~ok"
		);
	}

	#[test]
	fn state_validation_errors_on_mismatch() {
		let redirect = redirect();

		assert!(redirect.validate_state("expected").is_ok());
		assert!(matches!(redirect.validate_state("other"), Err(Error::StateMismatch)));
	}

	#[test]
	fn expiry_and_display_follow_the_pushed_reference() {
		let redirect = redirect();

		assert!(!redirect.is_expired_at(datetime!(2025-01-01 00:01:00 UTC)));
		assert!(redirect.is_expired_at(datetime!(2025-01-01 00:01:30 UTC)));
		assert_eq!(redirect.to_string(), redirect.authorization_url.as_str());
		assert!(!format!("{redirect:?}").contains("pkce-verifier-value"));
	}
}
