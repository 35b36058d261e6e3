//! Kicks off a FAPI 2.0 authorization request against the airline identity provider and
//! prints the URL the traveller's browser must visit.

// crates.io
use color_eyre::Result;
use url::Url;
// self
use fapi_par::{
	auth::{ClientId, ScopeSet},
	config::ClientConfiguration,
	flow::ReqwestInitiator,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfiguration::builder()
		.client_id(ClientId::new("travel-agency-app")?)
		.redirect_uri(Url::parse("https://app.travelagency.com/callback")?)
		.issuer(Url::parse("https://idp.airline.com")?)
		.scope(ScopeSet::new(["openid", "profile", "airline_api"])?)
		.build()?;
	let initiator = ReqwestInitiator::new(config)?;
	let redirect = initiator.run_flow().await?;

	println!("Redirect the user to: {}", redirect.authorization_url);
	println!(
		"Keep state `{}` and the PKCE verifier for the callback; the request expires at {}.",
		redirect.state, redirect.expires_at
	);

	Ok(())
}
