//! Read-through RFC 7662 token introspection.

// self
use crate::{
	_prelude::*,
	auth::{Introspection, RawClaims},
	business::BusinessQuery,
	cache::introspection_identifier,
	error::{ResponseError, require_non_empty},
	http::parse_json,
	obs::{self, FlowKind},
};

impl BusinessQuery {
	/// Introspects `token` (RFC 7662), fetching on a cache miss.
	///
	/// Cached results get `expires_in` and `is_expired` recomputed for the current instant.
	/// Non-200 responses and malformed bodies fail as operation failures.
	pub async fn introspection(&self, token_type: &str, token: &str) -> Result<Introspection> {
		obs::observe(FlowKind::Introspection, "introspection", async {
			require_non_empty("token_type", token_type)?;
			require_non_empty("token", token)?;

			let id = introspection_identifier(token_type, token);

			if let Some(Some(mut cached)) = obs::best_effort(
				FlowKind::Introspection,
				"read_introspection",
				self.introspection_cache.get_record(&id).await,
			) {
				cached.rebase(OffsetDateTime::now_utc());

				return Ok(cached);
			}

			let request = self.http_client.client_form_post(
				&self.introspection_endpoint,
				&self.client_id,
				&self.client_secret,
				&[("token", token), ("token_type_hint", token_type)],
			);
			let response = self.http_client.send(request).await?;

			if !response.status_in(&[200]) {
				return Err(ResponseError::UnexpectedStatus {
					endpoint: "introspection",
					status: response.status,
				}
				.into());
			}

			let raw: RawClaims = parse_json("introspection", &response.body)?;
			let introspection = Introspection::from_raw(raw, OffsetDateTime::now_utc());

			obs::best_effort(
				FlowKind::Introspection,
				"store_introspection",
				self.introspection_cache.set_record(&id, &introspection).await,
			);

			Ok(introspection)
		})
		.await
	}

	/// Drops the cached introspection result for `token`.
	pub async fn invalidate_introspection(&self, token_type: &str, token: &str) -> Result<()> {
		require_non_empty("token_type", token_type)?;
		require_non_empty("token", token)?;

		self.introspection_cache.delete(&introspection_identifier(token_type, token)).await
	}
}
