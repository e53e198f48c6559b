//! OAuth flow coordinator: login, callback, token lifecycle, and logout.

pub mod auth_code_pkce;
pub mod callback;
pub mod common;
pub mod logout;
pub mod refresh;

pub use auth_code_pkce::*;
pub use callback::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{Introspection, ScopeSet, TokenRecord, Userinfo},
	cache::{FlowState, RecordCache},
	config::RelyingPartyConfig,
	http::ReqwestHttpClient,
	oauth::BasicFacade,
	provider::ProviderDescriptor,
	store::KvStore,
};

/// Coordinates the authorization-code + PKCE flow against a single provider descriptor.
///
/// The coordinator owns the HTTP client, the provider descriptor, and the flow-state and
/// token caches. It also holds handles to the userinfo and introspection caches so logout can
/// drop business data tied to a revoked token. Cloning is cheap; every clone shares the same
/// store and metrics.
#[derive(Clone)]
pub struct OAuthFlow {
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: ReqwestHttpClient,
	/// Provider descriptor that defines OAuth endpoints.
	pub descriptor: ProviderDescriptor,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret for token, revocation, and introspection calls.
	pub client_secret: Option<String>,
	/// Registered redirect URI.
	pub redirect_uri: Url,
	/// Scopes requested at login.
	pub scope: ScopeSet,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	facade: BasicFacade,
	state_cache: RecordCache<FlowState>,
	token_cache: RecordCache<TokenRecord>,
	userinfo_cache: RecordCache<Userinfo>,
	introspection_cache: RecordCache<Introspection>,
}
impl OAuthFlow {
	/// Creates a coordinator with its own reqwest transport.
	pub fn new(
		store: Arc<dyn KvStore>,
		config: &RelyingPartyConfig,
		descriptor: ProviderDescriptor,
	) -> Result<Self> {
		Self::with_http_client(store, config, descriptor, ReqwestHttpClient::default())
	}

	/// Creates a coordinator that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn KvStore>,
		config: &RelyingPartyConfig,
		descriptor: ProviderDescriptor,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let client_id = config.require_client_id()?;
		let facade = BasicFacade::from_descriptor(
			&descriptor,
			client_id,
			config.client_secret.as_deref(),
			&config.redirect_uri,
			http_client.clone(),
		)?;
		let prefix: Arc<str> = config.key_prefix.as_str().into();

		Ok(Self {
			http_client,
			descriptor,
			client_id: client_id.to_owned(),
			client_secret: config.client_secret.clone(),
			redirect_uri: config.redirect_uri.clone(),
			scope: config.scopes.clone(),
			refresh_metrics: Default::default(),
			facade,
			state_cache: RecordCache::flow_state(store.clone(), prefix.clone()),
			token_cache: RecordCache::token(store.clone(), prefix.clone()),
			userinfo_cache: RecordCache::userinfo(store.clone(), prefix.clone()),
			introspection_cache: RecordCache::introspection(store, prefix),
		})
	}

	/// Token cache backing [`OAuthFlow::get_token`].
	pub fn token_cache(&self) -> &RecordCache<TokenRecord> {
		&self.token_cache
	}

	/// Flow-state cache backing [`OAuthFlow::create`] and [`OAuthFlow::verify`].
	pub fn state_cache(&self) -> &RecordCache<FlowState> {
		&self.state_cache
	}
}
impl Debug for OAuthFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthFlow")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("scope", &self.scope)
			.finish()
	}
}
