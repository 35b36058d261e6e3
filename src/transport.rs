//! Request execution shared by discovery and PAR, plus the transport error seam.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{ProviderEndpoint, ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Maps HTTP transport failures into [`TransportError`] values.
///
/// The stage that issued the request wraps the result into its own error kind, so mappers
/// never need to know whether discovery or PAR failed.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(
		&self,
		endpoint: ProviderEndpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TransportError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: ProviderEndpoint,
		_: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TransportError {
		let label = endpoint.as_str();

		match err {
			HttpClientError::Reqwest(inner) if inner.is_timeout() =>
				TransportError::Timeout { endpoint: label },
			HttpClientError::Reqwest(inner) => TransportError::network(label, *inner),
			HttpClientError::Http(inner) => inner.into(),
			HttpClientError::Io(inner) => inner.into(),
			HttpClientError::Other(message) => TransportError::Other { endpoint: label, message },
			_ => TransportError::Other { endpoint: label, message: "unrecognized failure".into() },
		}
	}
}

/// Raw provider answer handed to the stage parsers.
#[derive(Clone, Debug)]
pub(crate) struct ProviderResponse {
	pub(crate) status: u16,
	pub(crate) retry_after: Option<Duration>,
	pub(crate) body: Vec<u8>,
}
impl ProviderResponse {
	pub(crate) fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Lossy, truncated rendering of the body for error messages.
	pub(crate) fn body_preview(&self) -> String {
		let text = String::from_utf8_lossy(&self.body);
		let trimmed = text.trim();

		match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
			Some((idx, _)) => format!("{}…", &trimmed[..idx]),
			None => trimmed.to_owned(),
		}
	}
}

/// Builds a `GET` request that asks for JSON.
pub(crate) fn json_get(url: &Url) -> Result<HttpRequest, TransportError> {
	Ok(Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(ACCEPT, "application/json")
		.body(Vec::new())?)
}

/// Builds a form-encoded `POST` request.
pub(crate) fn form_post<'a, I>(url: &Url, pairs: I) -> Result<HttpRequest, TransportError>
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let body = FormSerializer::new(String::new()).extend_pairs(pairs).finish();

	Ok(Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(ACCEPT, "application/json")
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(body.into_bytes())?)
}

/// Sends `request` through the transport, capturing response metadata along the way.
pub(crate) async fn execute<C, M>(
	http_client: &C,
	mapper: &M,
	endpoint: ProviderEndpoint,
	request: HttpRequest,
) -> Result<ProviderResponse, TransportError>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let slot = ResponseMetadataSlot::default();
	let handle = http_client.with_metadata(slot.clone());

	match handle.call(request).await {
		Ok(response) => {
			let meta = slot.take();

			Ok(ProviderResponse {
				status: response.status().as_u16(),
				retry_after: meta.and_then(|value| value.retry_after),
				body: response.into_body(),
			})
		},
		Err(err) => Err(mapper.map_transport_error(endpoint, slot.take().as_ref(), err)),
	}
}
