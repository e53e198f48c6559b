//! Token sets returned by authorization-code exchanges and refreshes.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Token set issued by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (usually `bearer`).
	pub token_type: String,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry instant; `None` when the provider did not report a lifetime.
	#[serde(with = "time::serde::rfc3339::option", default)]
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Returns a builder for assembling records from provider responses or cache entries.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Returns `true` if the record is past its expiry at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the record expires within `window` of `instant`.
	///
	/// Records without an expiry never fall inside the window.
	pub fn expires_within(&self, window: Duration, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| expires_at - instant <= window)
	}
}

/// Builder for [`TokenRecord`].
#[derive(Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	refresh_token: Option<TokenSecret>,
	expires_at: Option<OffsetDateTime>,
}
impl TokenRecordBuilder {
	/// Sets the access token value.
	pub fn access_token(mut self, value: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(value));

		self
	}

	/// Sets the token type; defaults to `Bearer`.
	pub fn token_type(mut self, value: impl Into<String>) -> Self {
		self.token_type = Some(value.into());

		self
	}

	/// Sets the refresh token value. Empty values are ignored.
	pub fn refresh_token(mut self, value: impl Into<String>) -> Self {
		let value = value.into();

		self.refresh_token = (!value.is_empty()).then(|| TokenSecret::new(value));

		self
	}

	/// Sets the absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the expiry relative to the current instant.
	pub fn expires_in(mut self, lifetime: Duration) -> Self {
		self.expires_at = Some(OffsetDateTime::now_utc() + lifetime);

		self
	}

	/// Consumes the builder and validates the record.
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_empty())
			.ok_or(TokenRecordBuilderError::MissingAccessToken)?;

		Ok(TokenRecord {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
			refresh_token: self.refresh_token,
			expires_at: self.expires_at,
		})
	}
}
