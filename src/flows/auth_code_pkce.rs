//! Authorization Code + PKCE helpers: create, build the redirect, verify, and exchange.
//!
//! A login attempt moves through `created -> awaiting callback -> verified -> exchanged`.
//! The flow state is written with a fifteen minute lifetime and removed once verified, so a
//! `state` validates at most once under sequential use. Lookup and delete are two store calls;
//! concurrent callbacks racing on the same `state` may both pass.

mod session;

pub use session::{LoginRedirect, PkceCodeChallengeMethod};

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	cache::FlowState,
	error::require_non_empty,
	flows::{OAuthFlow, common},
	obs::{self, FlowKind, FlowSpan},
};

impl OAuthFlow {
	/// Generates and persists a new `state` + PKCE verifier pair.
	pub async fn create(&self) -> Result<FlowState> {
		obs::observe(FlowKind::Authorization, "create", async {
			let flow_state = session::generate_flow_state();

			self.state_cache.set_record(&flow_state.state, &flow_state).await?;

			Ok(flow_state)
		})
		.await
	}

	/// Builds the provider authorize URL carrying `state` and the S256 code challenge.
	pub fn build_url(&self, flow_state: &FlowState) -> Url {
		let _span = FlowSpan::new(FlowKind::Authorization, "build_url").entered();

		session::build_authorize_url(
			&self.descriptor,
			&self.client_id,
			&self.redirect_uri,
			&self.scope,
			flow_state,
		)
	}

	/// Starts a login: [`create`](Self::create) followed by [`build_url`](Self::build_url).
	pub async fn login(&self) -> Result<LoginRedirect> {
		let flow_state = self.create().await?;
		let authorize_url = self.build_url(&flow_state);

		Ok(LoginRedirect { flow_state, authorize_url })
	}

	/// Consumes a pending flow state.
	///
	/// Fails with [`Error::NotExist`] for unknown, expired, or already consumed states. The
	/// entry is deleted after a successful lookup; a failed delete is logged only.
	pub async fn verify(&self, state: &str) -> Result<FlowState> {
		obs::observe(FlowKind::Exchange, "verify", async {
			require_non_empty("state", state)?;

			let flow_state = self
				.state_cache
				.get_record(state)
				.await?
				.filter(|flow_state| !flow_state.verifier.is_empty())
				.ok_or(Error::NotExist { what: "flow state" })?;

			obs::best_effort(FlowKind::Exchange, "delete_state", self.state_cache.delete(state).await);

			Ok(flow_state)
		})
		.await
	}

	/// Redeems an authorization code and caches the issued token set.
	///
	/// Provider rejections surface as [`Error::Unauthorized`]; a failed cache write is logged
	/// and the tokens are still returned.
	pub async fn exchange(&self, code: &str, verifier: &str) -> Result<TokenRecord> {
		obs::observe(FlowKind::Exchange, "exchange", async {
			require_non_empty("code", code)?;
			require_non_empty("verifier", verifier)?;

			let record = self.facade.exchange_authorization_code(code, verifier).await?;

			common::cache_token(&self.token_cache, FlowKind::Exchange, &record).await;

			Ok(record)
		})
		.await
	}
}
