//! Business query coordinator: read-through userinfo and introspection lookups.
//!
//! Both lookups consult their cache first and fall back to the provider on a miss or on a
//! cache read failure. Successful fetches are written back best-effort. Caching is governed by
//! one runtime [`CacheToggle`] shared by both caches; while it is off every lookup goes to the
//! provider and nothing is written.

pub mod introspection;
pub mod userinfo;

// self
use crate::{
	_prelude::*,
	auth::{Introspection, Userinfo},
	cache::{CacheToggle, RecordCache},
	config::RelyingPartyConfig,
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
	store::KvStore,
};

/// Cache-or-fetch access to provider identity data.
#[derive(Clone)]
pub struct BusinessQuery {
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: ReqwestHttpClient,
	/// OAuth 2.0 client identifier used for introspection client authentication.
	pub client_id: String,
	userinfo_endpoint: Url,
	introspection_endpoint: Url,
	client_secret: String,
	toggle: CacheToggle,
	userinfo_cache: RecordCache<Userinfo>,
	introspection_cache: RecordCache<Introspection>,
}
impl BusinessQuery {
	/// Creates a coordinator with its own reqwest transport.
	///
	/// Requires the userinfo and introspection endpoints plus a client secret.
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
		let client_id = config.require_client_id()?.to_owned();
		let client_secret = config.require_client_secret()?.to_owned();
		let userinfo_endpoint = descriptor.userinfo_endpoint()?.clone();
		let introspection_endpoint = descriptor.introspection_endpoint()?.clone();
		let toggle = CacheToggle::new(config.business_cache);
		let prefix: Arc<str> = config.key_prefix.as_str().into();

		Ok(Self {
			http_client,
			client_id,
			userinfo_endpoint,
			introspection_endpoint,
			client_secret,
			userinfo_cache: RecordCache::userinfo(store.clone(), prefix.clone())
				.with_toggle(toggle.clone()),
			introspection_cache: RecordCache::introspection(store, prefix)
				.with_toggle(toggle.clone()),
			toggle,
		})
	}

	/// Returns whether the business caches are currently consulted.
	pub fn cache_enabled(&self) -> bool {
		self.toggle.is_enabled()
	}

	/// Turns the business caches on or off for every clone of this coordinator.
	pub fn set_cache_enabled(&self, enabled: bool) {
		self.toggle.set_enabled(enabled);
	}
}
impl Debug for BusinessQuery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BusinessQuery")
			.field("client_id", &self.client_id)
			.field("userinfo_endpoint", &self.userinfo_endpoint)
			.field("introspection_endpoint", &self.introspection_endpoint)
			.field("cache_enabled", &self.toggle.is_enabled())
			.finish()
	}
}
