//! OpenID Connect discovery (`/.well-known/openid-configuration`).

// self
use crate::{
	_prelude::*,
	error::{ConfigError, ResponseError},
	http::{ReqwestHttpClient, parse_json},
	obs::{self, FlowKind},
	provider::{ProviderDescriptor, ProviderDescriptorBuilder},
};

/// Subset of the discovery document the relying party consumes.
///
/// URLs stay as strings until [`DiscoveryDocument::apply`] so one malformed optional entry
/// reports which field was wrong.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
	/// Issuer identifier.
	#[serde(default)]
	pub issuer: Option<String>,
	/// Authorization endpoint.
	#[serde(default)]
	pub authorization_endpoint: Option<String>,
	/// Token endpoint.
	#[serde(default)]
	pub token_endpoint: Option<String>,
	/// Userinfo endpoint.
	#[serde(default)]
	pub userinfo_endpoint: Option<String>,
	/// RFC 7662 introspection endpoint.
	#[serde(default)]
	pub introspection_endpoint: Option<String>,
	/// RFC 7009 revocation endpoint.
	#[serde(default)]
	pub revocation_endpoint: Option<String>,
}
impl DiscoveryDocument {
	/// Seeds `builder` with every endpoint the document declares.
	///
	/// Endpoints already present on the builder are kept, so explicit configuration wins.
	pub fn apply(
		&self,
		mut builder: ProviderDescriptorBuilder,
	) -> Result<ProviderDescriptorBuilder, ConfigError> {
		fn fill(
			slot: &mut Option<Url>,
			name: &'static str,
			value: &Option<String>,
		) -> Result<(), ConfigError> {
			if slot.is_some() {
				return Ok(());
			}
			if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
				*slot = Some(
					Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })?,
				);
			}

			Ok(())
		}

		fill(&mut builder.authorization_endpoint, "authorization_endpoint", &self.authorization_endpoint)?;
		fill(&mut builder.token_endpoint, "token_endpoint", &self.token_endpoint)?;
		fill(&mut builder.userinfo_endpoint, "userinfo_endpoint", &self.userinfo_endpoint)?;
		fill(
			&mut builder.introspection_endpoint,
			"introspection_endpoint",
			&self.introspection_endpoint,
		)?;
		fill(&mut builder.revocation_endpoint, "revocation_endpoint", &self.revocation_endpoint)?;

		if builder.issuer.is_none() {
			builder.issuer = self.issuer.clone();
		}

		Ok(builder)
	}
}

/// Fetches and parses the discovery document at `url`.
pub async fn fetch_discovery(http: &ReqwestHttpClient, url: &Url) -> Result<DiscoveryDocument> {
	obs::observe(FlowKind::Discovery, "fetch_discovery", async {
		let response = http.send(http.get(url.clone())).await?;

		if !response.status_in(&[200]) {
			return Err(ResponseError::UnexpectedStatus {
				endpoint: "discovery",
				status: response.status,
			}
			.into());
		}

		parse_json("discovery", &response.body)
	})
	.await
}

/// Fetches discovery metadata and builds a descriptor, letting `builder` override endpoints.
pub async fn discover(
	http: &ReqwestHttpClient,
	url: &Url,
	builder: ProviderDescriptorBuilder,
) -> Result<ProviderDescriptor> {
	let document = fetch_discovery(http, url).await?;
	let descriptor = document.apply(builder)?.build().map_err(ConfigError::from)?;

	Ok(descriptor)
}
