//! Relying-party configuration.
//!
//! Configuration is injected explicitly; [`RelyingPartyConfig::from_env`] is a convenience for
//! hosts that follow the `SSO_*` environment convention.

// self
use crate::{
	_prelude::*,
	auth::{DEFAULT_SCOPES, ScopeSet},
	cache::DEFAULT_KEY_PREFIX,
	error::ConfigError,
	http::ReqwestHttpClient,
	provider::{self, ProviderDescriptor, ProviderDescriptorBuilder},
};

/// Environment variable names read by [`RelyingPartyConfig::from_env`].
pub mod env {
	/// OAuth client identifier.
	pub const CLIENT_ID: &str = "SSO_CLIENT_ID";
	/// OAuth client secret.
	pub const CLIENT_SECRET: &str = "SSO_CLIENT_SECRET";
	/// Registered redirect URI.
	pub const REDIRECT_URI: &str = "SSO_REDIRECT_URI";
	/// OpenID Connect discovery document URL.
	pub const WELL_KNOWN_URI: &str = "SSO_WELL_KNOWN_URI";
	/// Authorization endpoint override.
	pub const ENDPOINT_AUTH_URI: &str = "SSO_ENDPOINT_AUTH_URI";
	/// Token endpoint override.
	pub const ENDPOINT_TOKEN_URI: &str = "SSO_ENDPOINT_TOKEN_URI";
	/// Userinfo endpoint override.
	pub const ENDPOINT_USERINFO_URI: &str = "SSO_ENDPOINT_USERINFO_URI";
	/// Introspection endpoint override.
	pub const ENDPOINT_INTROSPECTION_URI: &str = "SSO_ENDPOINT_INTROSPECTION_URI";
	/// Revocation endpoint override.
	pub const ENDPOINT_REVOCATION_URI: &str = "SSO_ENDPOINT_REVOCATION_URI";
	/// Business cache switch (`true`/`false`/`1`/`0`).
	pub const BUSINESS_CACHE: &str = "SSO_BUSINESS_CACHE";
	/// Cache key prefix.
	pub const CACHE_PREFIX: &str = "SSO_CACHE_PREFIX";
	/// Space-delimited scopes.
	pub const SCOPES: &str = "SSO_SCOPES";
}

/// Endpoint sources: a discovery document, explicit URLs, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointConfig {
	/// OpenID Connect discovery document URL.
	pub discovery: Option<Url>,
	/// Authorization endpoint.
	pub authorization: Option<Url>,
	/// Token endpoint.
	pub token: Option<Url>,
	/// Userinfo endpoint.
	pub userinfo: Option<Url>,
	/// Introspection endpoint.
	pub introspection: Option<Url>,
	/// Revocation endpoint.
	pub revocation: Option<Url>,
}

/// Everything the flow and business coordinators need to talk to one identity provider.
#[derive(Clone)]
pub struct RelyingPartyConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret, required for introspection and revocation.
	pub client_secret: Option<String>,
	/// Registered redirect URI.
	pub redirect_uri: Url,
	/// Scopes requested during login.
	pub scopes: ScopeSet,
	/// Endpoint sources.
	pub endpoints: EndpointConfig,
	/// Initial state of the userinfo/introspection caches.
	pub business_cache: bool,
	/// Prefix prepended to every cache key.
	pub key_prefix: String,
	/// Rejects plain-HTTP provider endpoints.
	pub require_https: bool,
}
impl RelyingPartyConfig {
	/// Creates a configuration with default scopes, caching disabled, and HTTPS enforced.
	pub fn new(client_id: impl Into<String>, redirect_uri: Url) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scopes: default_scopes(),
			endpoints: EndpointConfig::default(),
			business_cache: false,
			key_prefix: DEFAULT_KEY_PREFIX.into(),
			require_https: true,
		}
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into()).filter(|secret| !secret.is_empty());

		self
	}

	/// Replaces the endpoint sources.
	pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Sets the initial business cache state.
	pub fn with_business_cache(mut self, enabled: bool) -> Self {
		self.business_cache = enabled;

		self
	}

	/// Overrides the cache key prefix.
	pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.key_prefix = prefix.into();

		self
	}

	/// Toggles HTTPS enforcement for provider endpoints.
	pub fn with_require_https(mut self, require: bool) -> Self {
		self.require_https = require;

		self
	}

	/// Loads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads the configuration through an arbitrary variable lookup.
	///
	/// Empty values are treated as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).map(|value| value.trim().to_owned()).filter(|v| !v.is_empty());
		let url = |name: &'static str| {
			get(name)
				.map(|value| Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { name, source }))
				.transpose()
		};
		let client_id = get(env::CLIENT_ID).ok_or(ConfigError::MissingEnv { name: env::CLIENT_ID })?;
		let redirect_uri =
			url(env::REDIRECT_URI)?.ok_or(ConfigError::MissingEnv { name: env::REDIRECT_URI })?;
		let endpoints = EndpointConfig {
			discovery: url(env::WELL_KNOWN_URI)?,
			authorization: url(env::ENDPOINT_AUTH_URI)?,
			token: url(env::ENDPOINT_TOKEN_URI)?,
			userinfo: url(env::ENDPOINT_USERINFO_URI)?,
			introspection: url(env::ENDPOINT_INTROSPECTION_URI)?,
			revocation: url(env::ENDPOINT_REVOCATION_URI)?,
		};
		let mut config = Self::new(client_id, redirect_uri).with_endpoints(endpoints);

		if let Some(secret) = get(env::CLIENT_SECRET) {
			config = config.with_client_secret(secret);
		}
		if let Some(flag) = get(env::BUSINESS_CACHE) {
			config.business_cache = parse_flag(env::BUSINESS_CACHE, &flag)?;
		}
		if let Some(prefix) = get(env::CACHE_PREFIX) {
			config.key_prefix = prefix;
		}
		if let Some(scopes) = get(env::SCOPES) {
			config.scopes = scopes.parse()?;
		}

		Ok(config)
	}

	/// Builds a descriptor from explicitly configured endpoints only.
	pub fn descriptor_from_explicit(&self) -> Result<ProviderDescriptor, ConfigError> {
		Ok(self.descriptor_builder().build()?)
	}

	/// Resolves the provider descriptor, consulting the discovery document when configured.
	///
	/// Explicit endpoints take precedence over discovered ones.
	pub async fn resolve_descriptor(&self, http: &ReqwestHttpClient) -> Result<ProviderDescriptor> {
		match &self.endpoints.discovery {
			Some(url) => provider::discover(http, url, self.descriptor_builder()).await,
			None => Ok(self.descriptor_from_explicit()?),
		}
	}

	/// Fails with [`ConfigError::MissingClientId`] when the identifier is empty.
	pub(crate) fn require_client_id(&self) -> Result<&str, ConfigError> {
		if self.client_id.is_empty() { Err(ConfigError::MissingClientId) } else { Ok(&self.client_id) }
	}

	/// Fails with [`ConfigError::MissingClientSecret`] when no secret is configured.
	pub(crate) fn require_client_secret(&self) -> Result<&str, ConfigError> {
		self.client_secret.as_deref().ok_or(ConfigError::MissingClientSecret)
	}

	fn descriptor_builder(&self) -> ProviderDescriptorBuilder {
		let endpoints = &self.endpoints;
		let mut builder = ProviderDescriptor::builder().require_https(self.require_https);

		builder.authorization_endpoint = endpoints.authorization.clone();
		builder.token_endpoint = endpoints.token.clone();
		builder.userinfo_endpoint = endpoints.userinfo.clone();
		builder.introspection_endpoint = endpoints.introspection.clone();
		builder.revocation_endpoint = endpoints.revocation.clone();

		builder
	}
}
impl Debug for RelyingPartyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RelyingPartyConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("scopes", &self.scopes)
			.field("endpoints", &self.endpoints)
			.field("business_cache", &self.business_cache)
			.field("key_prefix", &self.key_prefix)
			.field("require_https", &self.require_https)
			.finish()
	}
}

fn default_scopes() -> ScopeSet {
	ScopeSet::new(DEFAULT_SCOPES).unwrap_or_default()
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => Err(ConfigError::InvalidEnv { name, reason: format!("`{other}` is not a boolean") }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars = vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect::<HashMap<_, _>>();

		move |name| vars.get(name).cloned()
	}

	#[test]
	fn from_lookup_reads_the_sso_convention() {
		let config = RelyingPartyConfig::from_lookup(lookup(&[
			(env::CLIENT_ID, "client"),
			(env::CLIENT_SECRET, "secret"),
			(env::REDIRECT_URI, "https://app.example.com/callback"),
			(env::ENDPOINT_AUTH_URI, "https://idp.example.com/authorize"),
			(env::ENDPOINT_TOKEN_URI, "https://idp.example.com/token"),
			(env::BUSINESS_CACHE, "true"),
			(env::CACHE_PREFIX, "app:"),
			(env::SCOPES, "openid email"),
		]))
		.expect("Complete environment should load.");

		assert_eq!(config.client_id, "client");
		assert_eq!(config.client_secret.as_deref(), Some("secret"));
		assert!(config.business_cache);
		assert_eq!(config.key_prefix, "app:");
		assert_eq!(config.scopes.normalized(), "email openid");
		assert!(config.endpoints.discovery.is_none());
		assert!(!format!("{config:?}").contains("\"secret\""));

		let descriptor = config.descriptor_from_explicit().expect("Descriptor should build.");

		assert_eq!(descriptor.endpoints.token.as_str(), "https://idp.example.com/token");
	}

	#[test]
	fn defaults_apply_when_optional_values_are_absent() {
		let config = RelyingPartyConfig::from_lookup(lookup(&[
			(env::CLIENT_ID, "client"),
			(env::REDIRECT_URI, "https://app.example.com/callback"),
			(env::CLIENT_SECRET, ""),
		]))
		.expect("Minimal environment should load.");

		assert_eq!(config.client_secret, None);
		assert!(!config.business_cache);
		assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
		assert_eq!(config.scopes.normalized(), "email openid phone profile");
		assert!(config.require_https);
	}

	#[test]
	fn missing_and_invalid_values_are_reported() {
		let err = RelyingPartyConfig::from_lookup(lookup(&[]))
			.expect_err("Client id is required.");

		assert!(matches!(err, ConfigError::MissingEnv { name: env::CLIENT_ID }));

		let err = RelyingPartyConfig::from_lookup(lookup(&[
			(env::CLIENT_ID, "client"),
			(env::REDIRECT_URI, "not a url"),
		]))
		.expect_err("Malformed redirect URIs should be rejected.");

		assert!(matches!(err, ConfigError::InvalidUrl { name: env::REDIRECT_URI, .. }));

		let err = RelyingPartyConfig::from_lookup(lookup(&[
			(env::CLIENT_ID, "client"),
			(env::REDIRECT_URI, "https://app.example.com/callback"),
			(env::BUSINESS_CACHE, "sometimes"),
		]))
		.expect_err("Non-boolean flags should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEnv { name: env::BUSINESS_CACHE, .. }));
	}

	#[test]
	fn explicit_descriptor_requires_core_endpoints() {
		let config = RelyingPartyConfig::new(
			"client",
			Url::parse("https://app.example.com/callback").expect("Redirect fixture should parse."),
		);
		let err = config.descriptor_from_explicit().expect_err("Endpoints are required.");

		assert!(matches!(err, ConfigError::Descriptor(_)));
	}
}
