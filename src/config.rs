//! Immutable client configuration consumed by the authorization flow.
//!
//! Values are fixed at construction and validated once: the issuer must be HTTPS, the
//! redirect URI must be absolute and fragment-free, and the key/lifetime knobs must stay
//! within the ranges FAPI 2.0 tolerates. Configurations can be assembled in code via
//! [`ClientConfigurationBuilder`] or loaded from JSON with
//! [`ClientConfiguration::from_json_str`]; both paths run the same validation.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	error::ConfigError,
};

/// Well-known metadata document the issuer publishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnown {
	#[default]
	/// OpenID Connect Discovery (`openid-configuration`).
	OpenIdConfiguration,
	/// RFC 8414 authorization server metadata (`oauth-authorization-server`).
	OAuthAuthorizationServer,
}
impl WellKnown {
	/// Path segment appended after `/.well-known/`.
	pub fn as_str(self) -> &'static str {
		match self {
			WellKnown::OpenIdConfiguration => "openid-configuration",
			WellKnown::OAuthAuthorizationServer => "oauth-authorization-server",
		}
	}
}

/// Value placed in the request object's `aud` claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestObjectAudience {
	#[default]
	/// The discovered authorization endpoint.
	AuthorizationEndpoint,
	/// The issuer identifier (RFC 9101 recommendation).
	Issuer,
}

/// Client settings shared by every flow invocation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ClientConfigurationBuilder")]
pub struct ClientConfiguration {
	/// Registered client identifier.
	pub client_id: ClientId,
	/// Redirect URI registered for the client.
	pub redirect_uri: Url,
	/// Issuer identifier used for discovery.
	pub issuer: Url,
	/// Scopes requested in every authorization request.
	pub scope: ScopeSet,
	/// Metadata document flavor fetched during discovery.
	pub well_known: WellKnown,
	/// Audience placed in the request object.
	pub audience: RequestObjectAudience,
	/// Validity window of each request object.
	pub request_object_lifetime: Duration,
	/// RSA modulus size of the ephemeral signing key.
	pub key_bits: usize,
}
impl ClientConfiguration {
	/// Default request object lifetime.
	pub const DEFAULT_REQUEST_OBJECT_LIFETIME: Duration = Duration::minutes(5);
	/// Default ephemeral RSA modulus size.
	pub const DEFAULT_KEY_BITS: usize = 2048;

	/// Creates a new builder.
	pub fn builder() -> ClientConfigurationBuilder {
		ClientConfigurationBuilder::default()
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json_str(json: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::MalformedConfiguration { source }.into())
	}

	/// Issuer rendered without a trailing slash, as it appears in metadata documents.
	pub fn issuer_identifier(&self) -> &str {
		self.issuer.as_str().trim_end_matches('/')
	}
}
