//! Flow-level error types shared by discovery, key handling, and PAR submission.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::error::Error>;

/// Canonical flow error exposed by public APIs.
///
/// Every variant is terminal for the invocation that raised it; callers branch on the kind
/// instead of matching message text.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authorization-server metadata could not be fetched or validated.
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),
	/// Ephemeral key generation or request object signing failed.
	#[error(transparent)]
	Key(#[from] KeyError),
	/// The pushed authorization request was rejected or could not be delivered.
	#[error(transparent)]
	Par(#[from] ParError),
	/// The `state` returned on the authorization callback differs from the one issued.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}

/// Configuration and validation failures raised before any network traffic.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	InvalidConfiguration(#[from] crate::config::ClientConfigurationError),
	/// Client configuration document could not be parsed.
	#[error("Client configuration document is malformed.")]
	MalformedConfiguration {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Metadata discovery failures.
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
	/// The discovery endpoint was unreachable.
	#[error("Discovery endpoint is unreachable.")]
	Transport(#[from] TransportError),
	/// The discovery endpoint answered with a non-success status.
	#[error("Discovery endpoint returned HTTP {status}: {body_preview}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body_preview: String,
	},
	/// The discovery document is not valid JSON or has wrongly typed fields.
	#[error("Discovery document is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// A mandatory endpoint is missing from the document.
	#[error("Discovery document is missing `{field}`.")]
	MissingEndpoint {
		/// Name of the absent metadata field.
		field: &'static str,
	},
	/// An endpoint does not use HTTPS.
	#[error("Discovery document advertises a non-HTTPS `{field}`: {url}.")]
	InsecureEndpoint {
		/// Name of the offending metadata field.
		field: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The document was issued for a different issuer.
	#[error("Discovery document issuer `{actual}` does not match `{expected}`.")]
	IssuerMismatch {
		/// Issuer configured on the client.
		expected: String,
		/// Issuer reported by the document.
		actual: String,
	},
	/// The provider does not accept the request object signing algorithm.
	#[error("Provider does not accept {alg}-signed request objects.")]
	UnsupportedSigningAlg {
		/// Algorithm the client signs with.
		alg: &'static str,
	},
	/// The provider does not accept the PKCE challenge method.
	#[error("Provider does not accept the {method} PKCE method.")]
	UnsupportedPkceMethod {
		/// Challenge method the client uses.
		method: &'static str,
	},
}

/// Ephemeral key and request object failures.
#[derive(Debug, ThisError)]
pub enum KeyError {
	/// RSA key generation failed.
	#[error("Ephemeral key generation failed.")]
	Generation(#[from] rsa::Error),
	/// The generated key could not be serialized for the signer.
	#[error("Ephemeral key could not be encoded.")]
	Encoding(#[from] rsa::pkcs1::Error),
	/// Signing the request object failed.
	#[error("Request object could not be signed.")]
	Signing(#[from] jsonwebtoken::errors::Error),
	/// The public key could not be canonicalized for its thumbprint.
	#[error("Ephemeral key thumbprint could not be computed.")]
	Thumbprint(#[from] serde_json::Error),
}

/// Pushed authorization request failures.
#[derive(Debug, ThisError)]
pub enum ParError {
	/// The PAR endpoint was unreachable.
	#[error("Pushed authorization endpoint is unreachable.")]
	Transport(#[from] TransportError),
	/// Provider rejected the request with an OAuth error.
	#[error(
		"Pushed authorization request was rejected with {error} (HTTP {status}){}.",
		description_suffix(.description)
	)]
	Rejected {
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Provider answered with a non-success status and no OAuth error body.
	#[error("Pushed authorization endpoint returned HTTP {status}: {body_preview}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body_preview: String,
	},
	/// The success body could not be parsed.
	#[error("Pushed authorization response is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
		/// HTTP status code.
		status: u16,
	},
	/// The provider returned an empty `request_uri`.
	#[error("Pushed authorization response carries an empty request_uri.")]
	EmptyRequestUri,
	/// The provider returned a zero or negative lifetime.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// The provider returned a lifetime beyond the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Transport-level failures (network, IO, request construction).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request timed out.
	#[error("Request timed out while calling the {endpoint} endpoint.")]
	Timeout {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	Request(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// Transport reported an error the mapper has no dedicated variant for.
	#[error("HTTP client error occurred while calling the {endpoint} endpoint: {message}.")]
	Other {
		/// Endpoint label.
		endpoint: &'static str,
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

fn description_suffix(description: &Option<String>) -> String {
	match description.as_deref().map(|text| text.trim().trim_end_matches('.')) {
		Some(text) if !text.is_empty() => format!(": {text}"),
		_ => String::new(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejected_par_reports_provider_text() {
		let err = ParError::Rejected {
			error: "invalid_request_object".into(),
			description: Some("Request object signature is invalid.".into()),
			status: 400,
			retry_after: None,
		};

		assert_eq!(
			err.to_string(),
			"Pushed authorization request was rejected with invalid_request_object (HTTP 400): \
			 Request object signature is invalid."
		);

		let err = ParError::Rejected {
			error: "invalid_client".into(),
			description: None,
			status: 401,
			retry_after: None,
		};

		assert_eq!(
			err.to_string(),
			"Pushed authorization request was rejected with invalid_client (HTTP 401)."
		);
	}

	#[test]
	fn kinds_convert_into_flow_error() {
		let err: Error = DiscoveryError::MissingEndpoint { field: "authorization_endpoint" }.into();

		assert!(matches!(err, Error::Discovery(DiscoveryError::MissingEndpoint { .. })));

		let err: Error = ParError::EmptyRequestUri.into();

		assert!(matches!(err, Error::Par(ParError::EmptyRequestUri)));
	}
}
