//! Token lookups and refresh-token rotation.
//!
//! [`OAuthFlow::token_source`] behaves like a token source: a cached token that is still valid
//! beyond a short leeway is returned as is, and only an expiring token is sent through the
//! `grant_type=refresh_token` call. Concurrent refreshes of the same session are not
//! serialized; the last writer wins in the cache and the provider arbitrates which refresh
//! token stays valid.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::require_non_empty,
	flows::{OAuthFlow, common},
	obs::{self, FlowKind},
};

/// Tokens expiring within this window are refreshed instead of reused.
pub const REFRESH_LEEWAY: Duration = Duration::seconds(10);

impl OAuthFlow {
	/// Looks up a cached token set by access token; `None` when nothing is cached.
	pub async fn get_token(&self, access_token: &str) -> Result<Option<TokenRecord>> {
		require_non_empty("access_token", access_token)?;

		self.token_cache.get_record(access_token).await
	}

	/// Returns a usable token for a cached session, refreshing it when needed.
	///
	/// A `refresh_token` that differs from the cached one invalidates the cached session and
	/// fails with [`Error::Unauthorized`]. Provider rejections of the refresh grant also map to
	/// [`Error::Unauthorized`]. When the provider omits a new refresh token the previous one is
	/// carried over.
	pub async fn token_source(
		&self,
		cached: &TokenRecord,
		refresh_token: &str,
	) -> Result<TokenRecord> {
		obs::observe(FlowKind::Refresh, "token_source", async {
			self.refresh_metrics.record_attempt();

			let result = self.rotate(cached, refresh_token).await;

			match &result {
				Ok(_) => self.refresh_metrics.record_success(),
				Err(_) => self.refresh_metrics.record_failure(),
			}

			result
		})
		.await
	}

	/// Reports whether the cached token is past its expiry.
	///
	/// Fails with [`Error::NotExist`] when nothing is cached; tokens without an expiry never
	/// expire.
	pub async fn verify_expiry(&self, access_token: &str) -> Result<bool> {
		let record = self.get_token(access_token).await?.ok_or(Error::NotExist { what: "token" })?;

		Ok(record.is_expired_at(OffsetDateTime::now_utc()))
	}

	/// Resolves a bearer access token to its cached session.
	///
	/// Unknown tokens fail with [`Error::Unauthorized`], expired ones with
	/// [`Error::TokenExpired`].
	pub async fn authenticate(&self, access_token: &str) -> Result<TokenRecord> {
		let record = self
			.get_token(access_token)
			.await?
			.ok_or_else(|| Error::unauthorized("No session is cached for the access token."))?;

		if record.is_expired_at(OffsetDateTime::now_utc()) {
			return Err(Error::TokenExpired);
		}

		Ok(record)
	}

	async fn rotate(&self, cached: &TokenRecord, refresh_token: &str) -> Result<TokenRecord> {
		require_non_empty("refresh_token", refresh_token)?;

		let matches = cached.refresh_token.as_ref().is_some_and(|secret| secret.matches(refresh_token));

		if !matches {
			self.refresh_metrics.record_mismatch();

			if !cached.access_token.is_empty() {
				obs::best_effort(
					FlowKind::Refresh,
					"delete_mismatched_token",
					self.token_cache.delete(cached.access_token.expose()).await,
				);
			}

			return Err(Error::unauthorized("Refresh token does not match the cached session."));
		}
		// Tokens without an expiry never fall inside the leeway and are reused.
		if !cached.expires_within(REFRESH_LEEWAY, OffsetDateTime::now_utc()) {
			return Ok(cached.clone());
		}

		let mut refreshed = self.facade.refresh_token(refresh_token).await?;

		if refreshed.refresh_token.is_none() {
			refreshed.refresh_token = cached.refresh_token.clone();
		}

		common::cache_token(&self.token_cache, FlowKind::Refresh, &refreshed).await;

		if refreshed.access_token != cached.access_token {
			obs::best_effort(
				FlowKind::Refresh,
				"delete_superseded_token",
				self.token_cache.delete(cached.access_token.expose()).await,
			);
		}

		Ok(refreshed)
	}
}
