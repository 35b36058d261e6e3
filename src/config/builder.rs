// crates.io
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	config::{ClientConfiguration, RequestObjectAudience, WellKnown},
};

const MIN_KEY_BITS: usize = 2048;
const MAX_KEY_BITS: usize = 4096;
const MAX_REQUEST_OBJECT_LIFETIME: Duration = Duration::minutes(60);

/// Errors raised while constructing or validating client configurations.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigurationError {
	/// Client identifier is mandatory.
	#[error("Missing client identifier.")]
	MissingClientId,
	/// Redirect URI is mandatory.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Issuer is mandatory.
	#[error("Missing issuer.")]
	MissingIssuer,
	/// At least one scope must be requested.
	#[error("At least one scope must be requested.")]
	EmptyScope,
	/// Issuer must use HTTPS.
	#[error("The issuer must use HTTPS: {url}.")]
	InsecureIssuer {
		/// Issuer URL that failed validation.
		url: String,
	},
	/// Issuer identifiers carry neither query nor fragment.
	#[error("The issuer must not carry a query or fragment: {url}.")]
	IssuerHasQueryOrFragment {
		/// Issuer URL that failed validation.
		url: String,
	},
	/// Redirect URI must use HTTPS unless it targets the loopback interface.
	#[error("The redirect URI must use HTTPS: {url}.")]
	InsecureRedirectUri {
		/// Redirect URI that failed validation.
		url: String,
	},
	/// Redirect URIs must not contain a fragment.
	#[error("The redirect URI must not carry a fragment: {url}.")]
	RedirectUriHasFragment {
		/// Redirect URI that failed validation.
		url: String,
	},
	/// RSA modulus size is outside the supported range.
	#[error("Key size of {bits} bits is outside 2048..=4096.")]
	KeyBitsOutOfRange {
		/// Requested modulus size.
		bits: usize,
	},
	/// Request object lifetime is non-positive or too long.
	#[error("Request object lifetime of {seconds}s is outside 1..=3600 seconds.")]
	LifetimeOutOfRange {
		/// Requested lifetime in seconds.
		seconds: i64,
	},
}

/// Builder for [`ClientConfiguration`] values.
///
/// The builder doubles as the serde representation of a configuration document, so
/// field names here are the JSON keys.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfigurationBuilder {
	/// Registered client identifier.
	pub client_id: Option<ClientId>,
	/// Redirect URI registered for the client.
	pub redirect_uri: Option<Url>,
	/// Issuer identifier used for discovery.
	pub issuer: Option<Url>,
	/// Scopes requested in every authorization request.
	pub scope: ScopeSet,
	/// Metadata document flavor.
	pub well_known: WellKnown,
	/// Audience placed in the request object.
	pub audience: RequestObjectAudience,
	/// Request object validity window; defaults to five minutes.
	#[serde(rename = "request_object_lifetime_secs", deserialize_with = "deserialize_lifetime")]
	pub request_object_lifetime: Option<Duration>,
	/// RSA modulus size; defaults to 2048 bits.
	pub key_bits: Option<usize>,
}
impl ClientConfigurationBuilder {
	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = Some(client_id);

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the issuer.
	pub fn issuer(mut self, url: Url) -> Self {
		self.issuer = Some(url);

		self
	}

	/// Sets the requested scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the metadata document flavor.
	pub fn well_known(mut self, well_known: WellKnown) -> Self {
		self.well_known = well_known;

		self
	}

	/// Overrides the request object audience.
	pub fn audience(mut self, audience: RequestObjectAudience) -> Self {
		self.audience = audience;

		self
	}

	/// Overrides the request object lifetime.
	pub fn request_object_lifetime(mut self, lifetime: Duration) -> Self {
		self.request_object_lifetime = Some(lifetime);

		self
	}

	/// Overrides the RSA modulus size.
	pub fn key_bits(mut self, bits: usize) -> Self {
		self.key_bits = Some(bits);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfiguration, ClientConfigurationError> {
		let client_id = self.client_id.ok_or(ClientConfigurationError::MissingClientId)?;
		let redirect_uri = self.redirect_uri.ok_or(ClientConfigurationError::MissingRedirectUri)?;
		let issuer = self.issuer.ok_or(ClientConfigurationError::MissingIssuer)?;
		let config = ClientConfiguration {
			client_id,
			redirect_uri,
			issuer,
			scope: self.scope,
			well_known: self.well_known,
			audience: self.audience,
			request_object_lifetime: self
				.request_object_lifetime
				.unwrap_or(ClientConfiguration::DEFAULT_REQUEST_OBJECT_LIFETIME),
			key_bits: self.key_bits.unwrap_or(ClientConfiguration::DEFAULT_KEY_BITS),
		};

		config.validate()?;

		Ok(config)
	}
}
impl TryFrom<ClientConfigurationBuilder> for ClientConfiguration {
	type Error = ClientConfigurationError;

	fn try_from(builder: ClientConfigurationBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

impl ClientConfiguration {
	fn validate(&self) -> Result<(), ClientConfigurationError> {
		if self.scope.is_empty() {
			return Err(ClientConfigurationError::EmptyScope);
		}
		if self.issuer.scheme() != "https" {
			return Err(ClientConfigurationError::InsecureIssuer { url: self.issuer.to_string() });
		}
		if self.issuer.query().is_some() || self.issuer.fragment().is_some() {
			return Err(ClientConfigurationError::IssuerHasQueryOrFragment {
				url: self.issuer.to_string(),
			});
		}

		validate_redirect_uri(&self.redirect_uri)?;

		if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&self.key_bits) {
			return Err(ClientConfigurationError::KeyBitsOutOfRange { bits: self.key_bits });
		}

		let lifetime = self.request_object_lifetime;

		if lifetime < Duration::SECOND || lifetime > MAX_REQUEST_OBJECT_LIFETIME {
			return Err(ClientConfigurationError::LifetimeOutOfRange {
				seconds: lifetime.whole_seconds(),
			});
		}

		Ok(())
	}
}

fn validate_redirect_uri(url: &Url) -> Result<(), ClientConfigurationError> {
	if url.fragment().is_some() {
		return Err(ClientConfigurationError::RedirectUriHasFragment { url: url.to_string() });
	}

	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ClientConfigurationError::InsecureRedirectUri { url: url.to_string() }),
	}
}

fn deserialize_lifetime<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(<Option<i64>>::deserialize(deserializer)?.map(Duration::seconds))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse configuration fixture URL.")
	}

	fn base() -> ClientConfigurationBuilder {
		ClientConfiguration::builder()
			.client_id(ClientId::new("travel-agency-app").expect("Client fixture should be valid."))
			.redirect_uri(url("https://app.travelagency.com/callback"))
			.issuer(url("https://idp.airline.com"))
			.scope(ScopeSet::new(["openid", "profile"]).expect("Scope fixture should be valid."))
	}

	#[test]
	fn builder_requires_mandatory_fields() {
		let err = ClientConfiguration::builder()
			.build()
			.expect_err("An empty builder must be rejected.");

		assert_eq!(err, ClientConfigurationError::MissingClientId);

		let err = base()
			.scope(ScopeSet::default())
			.build()
			.expect_err("Empty scopes must be rejected.");

		assert_eq!(err, ClientConfigurationError::EmptyScope);
	}

	#[test]
	fn builder_rejects_insecure_urls() {
		let err = base()
			.issuer(url("http://idp.airline.com"))
			.build()
			.expect_err("Plain HTTP issuers must be rejected.");

		assert!(matches!(err, ClientConfigurationError::InsecureIssuer { .. }));

		let err = base()
			.issuer(url("https://idp.airline.com/?tenant=1"))
			.build()
			.expect_err("Issuers with queries must be rejected.");

		assert!(matches!(err, ClientConfigurationError::IssuerHasQueryOrFragment { .. }));

		let err = base()
			.redirect_uri(url("http://app.travelagency.com/callback"))
			.build()
			.expect_err("Plain HTTP redirects must be rejected.");

		assert!(matches!(err, ClientConfigurationError::InsecureRedirectUri { .. }));

		let err = base()
			.redirect_uri(url("https://app.travelagency.com/callback#frag"))
			.build()
			.expect_err("Redirects with fragments must be rejected.");

		assert!(matches!(err, ClientConfigurationError::RedirectUriHasFragment { .. }));

		base()
			.redirect_uri(url("http://127.0.0.1:8080/callback"))
			.build()
			.expect("Loopback redirects may use plain HTTP.");
	}

	#[test]
	fn builder_bounds_key_and_lifetime() {
		assert_eq!(
			base().key_bits(1024).build(),
			Err(ClientConfigurationError::KeyBitsOutOfRange { bits: 1024 })
		);
		assert_eq!(
			base().request_object_lifetime(Duration::ZERO).build(),
			Err(ClientConfigurationError::LifetimeOutOfRange { seconds: 0 })
		);
		assert_eq!(
			base().request_object_lifetime(Duration::hours(2)).build(),
			Err(ClientConfigurationError::LifetimeOutOfRange { seconds: 7200 })
		);

		let config = base()
			.key_bits(4096)
			.request_object_lifetime(Duration::seconds(90))
			.build()
			.expect("In-range overrides should be accepted.");

		assert_eq!(config.key_bits, 4096);
		assert_eq!(config.request_object_lifetime, Duration::seconds(90));
	}
}
