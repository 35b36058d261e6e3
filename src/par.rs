//! Pushed authorization request submission (RFC 9126).

// self
use crate::{
	_prelude::*,
	auth::ClientId,
	error::ParError,
	http::{ProviderEndpoint, ProviderHttpClient},
	jose::RequestObject,
	transport::{self, ProviderResponse, TransportErrorMapper},
};

/// Successful PAR answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushedAuthorizationResponse {
	/// Reference the browser presents to the authorization endpoint.
	pub request_uri: String,
	/// Lifetime of `request_uri` as reported by the provider.
	pub expires_in: Duration,
	/// Instant at which `request_uri` stops being accepted.
	pub expires_at: OffsetDateTime,
}
impl PushedAuthorizationResponse {
	/// Parses a success body received at `received_at`.
	pub fn parse(
		body: &[u8],
		status: u16,
		received_at: OffsetDateTime,
	) -> Result<Self, ParError> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let raw: RawParResponse = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ParError::Parse { source, status })?;

		if raw.request_uri.trim().is_empty() {
			return Err(ParError::EmptyRequestUri);
		}
		if raw.expires_in <= 0 {
			return Err(ParError::NonPositiveExpiresIn);
		}

		let expires_in = Duration::seconds(raw.expires_in);
		let expires_at =
			received_at.checked_add(expires_in).ok_or(ParError::ExpiresInOutOfRange)?;

		Ok(Self { request_uri: raw.request_uri, expires_in, expires_at })
	}
}

#[derive(Deserialize)]
struct RawParResponse {
	request_uri: String,
	expires_in: i64,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: String,
	error_description: Option<String>,
}

/// Pushes `request` to the PAR endpoint on behalf of `client_id`.
///
/// Any 2xx status with a well-formed body counts as success. Error statuses carrying an
/// OAuth error object surface as [`ParError::Rejected`]; everything else keeps the status
/// and a body preview.
pub async fn push<C, M>(
	http_client: &C,
	mapper: &M,
	endpoint: &Url,
	client_id: &ClientId,
	request: &RequestObject,
) -> Result<PushedAuthorizationResponse, ParError>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let form = transport::form_post(
		endpoint,
		[("client_id", client_id.as_ref()), ("request", request.as_str())],
	)?;
	let response =
		transport::execute(http_client, mapper, ProviderEndpoint::PushedAuthorization, form)
			.await?;

	if !response.is_success() {
		return Err(classify_failure(response));
	}

	PushedAuthorizationResponse::parse(&response.body, response.status, OffsetDateTime::now_utc())
}

fn classify_failure(response: ProviderResponse) -> ParError {
	match serde_json::from_slice::<OAuthErrorBody>(&response.body) {
		Ok(body) if !body.error.is_empty() => ParError::Rejected {
			error: body.error,
			description: body.error_description,
			status: response.status,
			retry_after: response.retry_after,
		},
		_ => ParError::Status { status: response.status, body_preview: response.body_preview() },
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const RECEIVED_AT: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);

	fn failure(status: u16, body: &str) -> ParError {
		classify_failure(ProviderResponse {
			status,
			retry_after: Some(Duration::seconds(30)),
			body: body.as_bytes().to_vec(),
		})
	}

	#[test]
	fn parse_accepts_created_responses() {
		let response = PushedAuthorizationResponse::parse(
			br#"{"request_uri":"urn:ietf:params:oauth:request_uri:abc123","expires_in":90}"#,
			201,
			RECEIVED_AT,
		)
		.expect("PAR response should parse.");

		assert_eq!(response.request_uri, "urn:ietf:params:oauth:request_uri:abc123");
		assert_eq!(response.expires_in, Duration::seconds(90));
		assert_eq!(response.expires_at, datetime!(2025-01-01 00:01:30 UTC));
	}

	#[test]
	fn parse_rejects_unusable_references() {
		assert!(matches!(
			PushedAuthorizationResponse::parse(
				br#"{"request_uri":"  ","expires_in":90}"#,
				201,
				RECEIVED_AT
			),
			Err(ParError::EmptyRequestUri)
		));
		assert!(matches!(
			PushedAuthorizationResponse::parse(
				br#"{"request_uri":"urn:x","expires_in":0}"#,
				201,
				RECEIVED_AT
			),
			Err(ParError::NonPositiveExpiresIn)
		));
		assert!(matches!(
			PushedAuthorizationResponse::parse(
				br#"{"request_uri":"urn:x","expires_in":9223372036854775807}"#,
				201,
				RECEIVED_AT
			),
			Err(ParError::ExpiresInOutOfRange)
		));
	}

	#[test]
	fn parse_reports_missing_fields_with_status() {
		let err = PushedAuthorizationResponse::parse(br#"{"request_uri":"urn:x"}"#, 200, RECEIVED_AT)
			.expect_err("Missing expires_in must fail.");

		assert!(matches!(err, ParError::Parse { status: 200, .. }));
	}

	#[test]
	fn oauth_error_bodies_become_rejections() {
		let err = failure(
			400,
			r#"{"error":"invalid_request_object","error_description":"signature invalid"}"#,
		);

		match err {
			ParError::Rejected { error, description, status, retry_after } => {
				assert_eq!(error, "invalid_request_object");
				assert_eq!(description.as_deref(), Some("signature invalid"));
				assert_eq!(status, 400);
				assert_eq!(retry_after, Some(Duration::seconds(30)));
			},
			other => panic!("Unexpected PAR error: {other:?}."),
		}
	}

	#[test]
	fn opaque_error_bodies_keep_status_and_preview() {
		assert!(matches!(
			failure(503, "upstream unavailable"),
			ParError::Status { status: 503, ref body_preview } if body_preview == "upstream unavailable"
		));
		assert!(matches!(failure(400, r#"{"error":""}"#), ParError::Status { status: 400, .. }));
	}
}
