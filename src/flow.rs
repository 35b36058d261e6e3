//! One-shot FAPI 2.0 authorization kick-off.

pub mod redirect;

pub use redirect::*;

// self
use crate::{
	_prelude::*,
	auth::{self, PkcePair},
	config::{ClientConfiguration, RequestObjectAudience},
	discovery,
	http::ProviderHttpClient,
	jose::{EphemeralKey, RequestObject, RequestObjectClaims},
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	par,
	transport::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;

#[cfg(feature = "reqwest")]
/// Initiator specialized for the crate's default reqwest transport stack.
pub type ReqwestInitiator =
	AuthorizationRequestInitiator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Starts authorization requests for a single client against a single issuer.
///
/// Each [`run_flow`](Self::run_flow) call walks discovery, ephemeral key generation, request
/// object signing, and PAR submission strictly in order. Nothing carries over between calls:
/// metadata is fetched again, and every invocation mints its own key pair, `state`, `nonce`,
/// and PKCE verifier. The first failing stage ends the invocation; there is no retry.
#[derive(Clone)]
pub struct AuthorizationRequestInitiator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Client settings applied to every invocation.
	pub config: ClientConfiguration,
	/// HTTP client wrapper used for discovery and PAR.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
}
impl<C, M> AuthorizationRequestInitiator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an initiator that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ClientConfiguration,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { config, http_client: http_client.into(), transport_mapper: mapper.into() }
	}

	/// Runs the flow and returns the URL the end user's browser must be sent to.
	///
	/// Discovery failures surface as [`Error::Discovery`] before the PAR endpoint is ever
	/// contacted; PAR failures surface as [`Error::Par`] and produce no redirect.
	pub async fn run_flow(&self) -> Result<AuthorizationRedirect> {
		let config = &self.config;
		let http_client = self.http_client.as_ref();
		let mapper = self.transport_mapper.as_ref();
		let document = obs::observe_stage(
			FlowStage::Discovery,
			begin(FlowStage::Discovery)
				.instrument(discovery::fetch(http_client, mapper, config))
				.await,
		)?;
		let key = {
			let _guard = begin(FlowStage::KeyGeneration).entered();

			obs::observe_stage(FlowStage::KeyGeneration, EphemeralKey::generate(config.key_bits))?
		};
		let state = auth::random_string(STATE_LEN);
		let nonce = auth::random_string(NONCE_LEN);
		let pkce = PkcePair::generate();
		let request = {
			let _guard = begin(FlowStage::RequestObject).entered();
			let audience = match config.audience {
				RequestObjectAudience::AuthorizationEndpoint =>
					document.authorization_endpoint.as_str(),
				RequestObjectAudience::Issuer => document.issuer.as_str(),
			};
			let claims = RequestObjectClaims::new(
				config,
				audience,
				&state,
				&nonce,
				&pkce,
				OffsetDateTime::now_utc(),
			);

			obs::observe_stage(FlowStage::RequestObject, RequestObject::sign(&claims, &key))?
		};
		let key_id = key.kid().clone();

		// The key signs exactly one request object.
		drop(key);

		let pushed = obs::observe_stage(
			FlowStage::PushedAuthorization,
			begin(FlowStage::PushedAuthorization)
				.instrument(par::push(
					http_client,
					mapper,
					&document.pushed_authorization_request_endpoint,
					&config.client_id,
					&request,
				))
				.await,
		)?;
		let authorization_url =
			build_authorization_url(&document.authorization_endpoint, &pushed.request_uri);

		obs::record_redirect(&authorization_url, pushed.expires_at);

		Ok(AuthorizationRedirect {
			authorization_url,
			request_uri: pushed.request_uri,
			expires_in: pushed.expires_in,
			expires_at: pushed.expires_at,
			state,
			nonce,
			code_verifier: pkce.verifier,
			key_id,
		})
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizationRequestInitiator<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an initiator for `config` backed by its own reqwest transport.
	///
	/// Fails with [`Error::Config`] when the redirect-free client cannot be built.
	pub fn new(config: ClientConfiguration) -> Result<Self> {
		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::try_new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Debug for AuthorizationRequestInitiator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationRequestInitiator").field("config", &self.config).finish()
	}
}

fn begin(stage: FlowStage) -> FlowSpan {
	obs::record_stage_outcome(stage, FlowOutcome::Attempt);

	FlowSpan::new(stage)
}
