//! Redirect callback dispatch.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	flows::OAuthFlow,
	obs::{self, FlowKind},
};

/// Parameters received on the redirect callback, plus optional bearer credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Echoed `state`.
	pub state: Option<String>,
	/// Provider error code (`access_denied`, ...).
	pub error: Option<String>,
	/// Provider error description.
	pub error_description: Option<String>,
	/// Access token presented by an already signed-in client.
	pub access_token: Option<String>,
	/// Refresh token presented by an already signed-in client.
	pub refresh_token: Option<String>,
}
impl CallbackParams {
	/// Collects the recognized query parameters; unknown keys are ignored.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut params = Self::default();

		for (key, value) in pairs {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into());
		}

		params
	}

	/// Parses the query string of a callback URL.
	pub fn from_url(url: &Url) -> Self {
		Self::from_pairs(url.query_pairs())
	}

	/// Attaches bearer credentials for the refresh path.
	pub fn with_bearer(
		mut self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
	) -> Self {
		self.access_token = Some(access_token.into());
		self.refresh_token = Some(refresh_token.into());

		self
	}

	fn bearer(&self) -> Option<(&str, &str)> {
		let access = self.access_token.as_deref().filter(|value| !value.is_empty())?;
		let refresh = self.refresh_token.as_deref().filter(|value| !value.is_empty())?;

		Some((access, refresh))
	}
}
impl Debug for CallbackParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackParams")
			.field("code_set", &self.code.is_some())
			.field("state", &self.state)
			.field("error", &self.error)
			.field("error_description", &self.error_description)
			.field("bearer_set", &self.bearer().is_some())
			.finish()
	}
}

impl OAuthFlow {
	/// Completes a redirect callback.
	///
	/// Provider errors fail with [`Error::Unauthorized`]; `code` and `state` are always
	/// required. With bearer credentials attached the cached session is refreshed through
	/// [`token_source`](Self::token_source), otherwise the state is verified and the code
	/// exchanged.
	pub async fn callback(&self, params: &CallbackParams) -> Result<TokenRecord> {
		obs::observe(FlowKind::Callback, "callback", async {
			if let Some(error) = &params.error {
				return Err(Error::unauthorized(match error.as_str() {
					"access_denied" => "The user denied the authorization request.".to_owned(),
					other => format!("The identity provider reported `{other}`."),
				}));
			}

			let code = non_empty(&params.code).ok_or(Error::ParameterEmpty { parameter: "code" })?;
			let state =
				non_empty(&params.state).ok_or(Error::ParameterEmpty { parameter: "state" })?;

			if let Some((access_token, refresh_token)) = params.bearer() {
				let cached = self
					.get_token(access_token)
					.await?
					.ok_or(Error::NotExist { what: "cached token" })?;

				return self.token_source(&cached, refresh_token).await;
			}

			let flow_state = self.verify(state).await?;

			self.exchange(code, &flow_state.verifier).await
		})
		.await
	}
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|value| !value.is_empty())
}
