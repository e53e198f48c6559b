//! Walks one browser login end to end against a mocked identity provider: start the PKCE
//! redirect, complete the callback, read cached userinfo, then log out.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_rp::{
	business::BusinessQuery,
	config::{EndpointConfig, RelyingPartyConfig},
	flows::{CallbackParams, OAuthFlow},
	store::{KvStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let userinfo_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/userinfo");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"sub\":\"42\",\"nickname\":\"demo\",\"email\":\"demo@example.com\"}");
		})
		.await;
	let revoke_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/revoke");
			then.status(200);
		})
		.await;
	let config =
		RelyingPartyConfig::new("demo-client", Url::parse("https://app.example.com/callback")?)
			.with_client_secret("demo-secret")
			.with_endpoints(EndpointConfig {
				discovery: None,
				authorization: Some(Url::parse(&server.url("/authorize"))?),
				token: Some(Url::parse(&server.url("/token"))?),
				userinfo: Some(Url::parse(&server.url("/userinfo"))?),
				introspection: Some(Url::parse(&server.url("/introspect"))?),
				revocation: Some(Url::parse(&server.url("/revoke"))?),
			})
			.with_business_cache(true)
			.with_require_https(false);
	let store: Arc<dyn KvStore> = Arc::new(MemoryStore::default());
	let descriptor = config.descriptor_from_explicit()?;
	let flow = OAuthFlow::new(store.clone(), &config, descriptor.clone())?;
	let business = BusinessQuery::new(store, &config, descriptor)?;
	let redirect = flow.login().await?;

	println!("Send the browser to: {}.", redirect.authorize_url);

	// The provider redirects back with the code and the echoed state.
	let mut callback_url = config.redirect_uri.clone();

	callback_url
		.query_pairs_mut()
		.append_pair("code", "demo-code")
		.append_pair("state", &redirect.flow_state.state);

	let record = flow.callback(&CallbackParams::from_url(&callback_url)).await?;
	let access_token = record.access_token.expose();
	let userinfo = business.userinfo(access_token).await?;

	println!("Signed in as {} <{}>.", userinfo.nickname, userinfo.email);

	business.userinfo(access_token).await?;
	flow.logout("access_token", access_token).await?;

	println!("Session revoked; cached token present: {}.", flow.get_token(access_token).await?.is_some());

	token_mock.assert_async().await;
	userinfo_mock.assert_calls_async(1).await;
	revoke_mock.assert_async().await;

	Ok(())
}
