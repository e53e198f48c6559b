//! Provider descriptor data structures shared by all flows.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint used by the Authorization Code flow.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Optional userinfo endpoint.
	pub userinfo: Option<Url>,
	/// Optional RFC 7662 introspection endpoint.
	pub introspection: Option<Url>,
	/// Optional RFC 7009 revocation endpoint.
	pub revocation: Option<Url>,
}

/// Immutable provider descriptor consumed by flows and business queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Issuer identifier, when known from discovery.
	pub issuer: Option<String>,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
}
impl ProviderDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Userinfo endpoint or [`ConfigError::MissingEndpoint`].
	pub fn userinfo_endpoint(&self) -> Result<&Url, ConfigError> {
		self.endpoints.userinfo.as_ref().ok_or(ConfigError::MissingEndpoint { endpoint: "userinfo" })
	}

	/// Introspection endpoint or [`ConfigError::MissingEndpoint`].
	pub fn introspection_endpoint(&self) -> Result<&Url, ConfigError> {
		self.endpoints
			.introspection
			.as_ref()
			.ok_or(ConfigError::MissingEndpoint { endpoint: "introspection" })
	}

	/// Revocation endpoint or [`ConfigError::MissingEndpoint`].
	pub fn revocation_endpoint(&self) -> Result<&Url, ConfigError> {
		self.endpoints
			.revocation
			.as_ref()
			.ok_or(ConfigError::MissingEndpoint { endpoint: "revocation" })
	}
}
