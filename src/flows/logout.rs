//! RFC 7009 token revocation.

// self
use crate::{
	_prelude::*,
	cache::introspection_identifier,
	error::{ConfigError, ResponseError, require_non_empty},
	flows::OAuthFlow,
	obs::{self, FlowKind},
};

impl OAuthFlow {
	/// Revokes `token` at the provider and drops every cache entry keyed by it.
	///
	/// `token_type` is sent as the `token_type_hint`. Only `200` and `204` count as success;
	/// cache cleanup afterwards is best-effort.
	pub async fn logout(&self, token_type: &str, token: &str) -> Result<()> {
		obs::observe(FlowKind::Logout, "logout", async {
			require_non_empty("token_type", token_type)?;
			require_non_empty("token", token)?;

			let endpoint = self.descriptor.revocation_endpoint()?;
			let secret = self.client_secret.as_deref().ok_or(ConfigError::MissingClientSecret)?;
			let request = self.http_client.client_form_post(
				endpoint,
				&self.client_id,
				secret,
				&[("token", token), ("token_type_hint", token_type)],
			);
			let response = self.http_client.send(request).await?;

			if !response.status_in(&[200, 204]) {
				return Err(ResponseError::UnexpectedStatus {
					endpoint: "revocation",
					status: response.status,
				}
				.into());
			}

			obs::best_effort(FlowKind::Logout, "delete_token", self.token_cache.delete(token).await);
			obs::best_effort(
				FlowKind::Logout,
				"delete_userinfo",
				self.userinfo_cache.delete(token).await,
			);
			obs::best_effort(
				FlowKind::Logout,
				"delete_introspection",
				self.introspection_cache.delete(&introspection_identifier(token_type, token)).await,
			);

			Ok(())
		})
		.await
	}
}
