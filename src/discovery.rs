//! Authorization-server metadata discovery.
//!
//! The flow fetches the issuer's well-known document once, validates that it was issued
//! for the configured issuer and advertises HTTPS authorization and PAR endpoints, and then
//! hands the resulting [`DiscoveryDocument`] to the later stages. Nothing is cached.

// self
use crate::{
	_prelude::*,
	auth::PkceCodeChallengeMethod,
	config::{ClientConfiguration, WellKnown},
	error::DiscoveryError,
	http::{ProviderEndpoint, ProviderHttpClient},
	jose::SIGNING_ALG,
	transport::{self, TransportErrorMapper},
};

/// Validated authorization-server metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryDocument {
	/// Issuer identifier reported by the server.
	pub issuer: String,
	/// Browser-facing authorization endpoint.
	pub authorization_endpoint: Url,
	/// RFC 9126 pushed authorization request endpoint.
	pub pushed_authorization_request_endpoint: Url,
	/// Token endpoint, when advertised.
	pub token_endpoint: Option<Url>,
	/// JWK set of the server, when advertised.
	pub jwks_uri: Option<Url>,
	/// Whether the server refuses authorization requests that bypass PAR.
	pub require_pushed_authorization_requests: bool,
	/// Request object signing algorithms, when advertised.
	pub request_object_signing_alg_values_supported: Option<Vec<String>>,
	/// PKCE methods, when advertised.
	pub code_challenge_methods_supported: Option<Vec<String>>,
}
impl DiscoveryDocument {
	/// Parses a metadata document and validates it against `config`.
	pub fn parse(body: &[u8], config: &ClientConfiguration) -> Result<Self, DiscoveryError> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let raw: RawMetadata = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| DiscoveryError::Parse { source })?;

		raw.validate(config)
	}
}

#[derive(Deserialize)]
struct RawMetadata {
	issuer: String,
	authorization_endpoint: Option<Url>,
	pushed_authorization_request_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	jwks_uri: Option<Url>,
	#[serde(default)]
	require_pushed_authorization_requests: bool,
	request_object_signing_alg_values_supported: Option<Vec<String>>,
	code_challenge_methods_supported: Option<Vec<String>>,
}
impl RawMetadata {
	fn validate(self, config: &ClientConfiguration) -> Result<DiscoveryDocument, DiscoveryError> {
		let expected = config.issuer_identifier();

		if self.issuer.trim_end_matches('/') != expected {
			return Err(DiscoveryError::IssuerMismatch {
				expected: expected.to_owned(),
				actual: self.issuer,
			});
		}

		let authorization_endpoint =
			required_https("authorization_endpoint", self.authorization_endpoint)?;
		let pushed_authorization_request_endpoint = required_https(
			"pushed_authorization_request_endpoint",
			self.pushed_authorization_request_endpoint,
		)?;

		if let Some(token) = self.token_endpoint.as_ref() {
			ensure_https("token_endpoint", token)?;
		}
		if self
			.request_object_signing_alg_values_supported
			.as_ref()
			.is_some_and(|algs| !algs.iter().any(|alg| alg == SIGNING_ALG))
		{
			return Err(DiscoveryError::UnsupportedSigningAlg { alg: SIGNING_ALG });
		}

		let pkce = PkceCodeChallengeMethod::S256.as_str();

		if self
			.code_challenge_methods_supported
			.as_ref()
			.is_some_and(|methods| !methods.iter().any(|method| method == pkce))
		{
			return Err(DiscoveryError::UnsupportedPkceMethod { method: pkce });
		}

		Ok(DiscoveryDocument {
			issuer: self.issuer,
			authorization_endpoint,
			pushed_authorization_request_endpoint,
			token_endpoint: self.token_endpoint,
			jwks_uri: self.jwks_uri,
			require_pushed_authorization_requests: self.require_pushed_authorization_requests,
			request_object_signing_alg_values_supported: self
				.request_object_signing_alg_values_supported,
			code_challenge_methods_supported: self.code_challenge_methods_supported,
		})
	}
}

/// Derives the metadata URL for `issuer`.
///
/// OpenID configuration appends the well-known suffix to the issuer path; RFC 8414
/// metadata inserts it between the host and the issuer path.
pub fn well_known_url(issuer: &Url, well_known: WellKnown) -> Url {
	let path = issuer.path().trim_end_matches('/');
	let suffix = well_known.as_str();
	let discovery_path = match well_known {
		WellKnown::OpenIdConfiguration => format!("{path}/.well-known/{suffix}"),
		WellKnown::OAuthAuthorizationServer => format!("/.well-known/{suffix}{path}"),
	};
	let mut url = issuer.clone();

	url.set_path(&discovery_path);
	url.set_query(None);
	url.set_fragment(None);

	url
}

/// Fetches and validates the issuer's metadata document.
pub async fn fetch<C, M>(
	http_client: &C,
	mapper: &M,
	config: &ClientConfiguration,
) -> Result<DiscoveryDocument, DiscoveryError>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let url = well_known_url(&config.issuer, config.well_known);
	let request = transport::json_get(&url)?;
	let response =
		transport::execute(http_client, mapper, ProviderEndpoint::Discovery, request).await?;

	if !response.is_success() {
		return Err(DiscoveryError::Status {
			status: response.status,
			body_preview: response.body_preview(),
		});
	}

	DiscoveryDocument::parse(&response.body, config)
}

fn required_https(field: &'static str, url: Option<Url>) -> Result<Url, DiscoveryError> {
	let url = url.ok_or(DiscoveryError::MissingEndpoint { field })?;

	ensure_https(field, &url)?;

	Ok(url)
}

fn ensure_https(field: &'static str, url: &Url) -> Result<(), DiscoveryError> {
	if url.scheme() == "https" {
		Ok(())
	} else {
		Err(DiscoveryError::InsecureEndpoint { field, url: url.to_string() })
	}
}
