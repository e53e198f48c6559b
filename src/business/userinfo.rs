//! Read-through userinfo lookups.

// self
use crate::{
	_prelude::*,
	auth::{RawClaims, Userinfo},
	business::BusinessQuery,
	error::require_non_empty,
	http::parse_json,
	obs::{self, FlowKind},
};

impl BusinessQuery {
	/// Returns the userinfo claims for `access_token`, fetching them on a cache miss.
	///
	/// A non-200 response fails with [`Error::Unauthorized`]; a body that is not a JSON object
	/// fails with [`ResponseError::MalformedJson`](crate::error::ResponseError::MalformedJson).
	pub async fn userinfo(&self, access_token: &str) -> Result<Userinfo> {
		obs::observe(FlowKind::Userinfo, "userinfo", async {
			require_non_empty("access_token", access_token)?;

			if let Some(Some(cached)) = obs::best_effort(
				FlowKind::Userinfo,
				"read_userinfo",
				self.userinfo_cache.get_record(access_token).await,
			) {
				return Ok(cached);
			}

			let request = self.http_client.get(self.userinfo_endpoint.clone()).bearer_auth(access_token);
			let response = self.http_client.send(request).await?;

			if !response.status_in(&[200]) {
				return Err(Error::unauthorized(format!(
					"The userinfo endpoint returned status {}.",
					response.status
				)));
			}

			let raw: RawClaims = parse_json("userinfo", &response.body)?;
			let userinfo = Userinfo::from_raw(raw);

			obs::best_effort(
				FlowKind::Userinfo,
				"store_userinfo",
				self.userinfo_cache.set_record(access_token, &userinfo).await,
			);

			Ok(userinfo)
		})
		.await
	}

	/// Drops the cached userinfo for `access_token`.
	pub async fn invalidate_userinfo(&self, access_token: &str) -> Result<()> {
		self.userinfo_cache.delete(access_token).await
	}
}
