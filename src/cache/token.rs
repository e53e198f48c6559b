//! Token sets keyed by access token.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	cache::{CacheNamespace, CacheRecord, RecordCache, TtlPolicy, take_field},
	store::{KvStore, StoreError},
};

/// Lifetime of a cached token set.
pub const TOKEN_TTL: Duration = Duration::days(30);

impl CacheRecord for TokenRecord {
	fn to_fields(&self) -> Result<Vec<(String, String)>, StoreError> {
		let expiry = self
			.expires_at
			.map(|instant| instant.format(&Rfc3339))
			.transpose()
			.map_err(StoreError::serialization)?
			.unwrap_or_default();
		let mut fields = vec![
			("access_token".into(), self.access_token.expose().to_owned()),
			("token_type".into(), self.token_type.clone()),
			("expiry".into(), expiry),
		];

		if let Some(refresh) = &self.refresh_token {
			fields.push(("refresh_token".into(), refresh.expose().to_owned()));
		}

		Ok(fields)
	}

	fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, StoreError> {
		let expiry = take_field(&mut fields, "expiry");
		// An empty expiry marks a token that never expires.
		let expires_at = (!expiry.is_empty())
			.then(|| OffsetDateTime::parse(&expiry, &Rfc3339))
			.transpose()
			.map_err(|e| StoreError::serialization(format!("field `expiry`: {e}")))?;
		let refresh_token = take_field(&mut fields, "refresh_token");

		Ok(Self {
			access_token: TokenSecret::new(take_field(&mut fields, "access_token")),
			token_type: take_field(&mut fields, "token_type"),
			refresh_token: (!refresh_token.is_empty()).then(|| TokenSecret::new(refresh_token)),
			expires_at,
		})
	}

	fn is_empty(&self) -> bool {
		self.access_token.is_empty()
	}
}

impl RecordCache<TokenRecord> {
	/// Token cache with the fixed thirty day lifetime.
	pub fn token(store: Arc<dyn KvStore>, prefix: impl Into<Arc<str>>) -> Self {
		Self::new(store, CacheNamespace::Token, prefix, TtlPolicy::Fixed(TOKEN_TTL))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[tokio::test]
	async fn token_sets_round_trip_with_rfc3339_expiry() {
		let store = Arc::new(MemoryStore::default());
		let cache = RecordCache::token(store.clone(), "sso:");
		let record = TokenRecord::builder()
			.access_token("at-1")
			.token_type("bearer")
			.refresh_token("rt-1")
			.expires_at(datetime!(2030-01-01 00:00 UTC))
			.build()
			.expect("Token fixture should build.");

		cache.set_record("at-1", &record).await.expect("Token write should succeed.");

		assert_eq!(
			store.hget("sso:oauth:token:at-1", "expiry").await.expect("Raw read should succeed."),
			Some("2030-01-01T00:00:00Z".into())
		);
		assert_eq!(
			cache.get_record("at-1").await.expect("Token read should succeed."),
			Some(record)
		);
	}

	#[test]
	fn empty_expiry_means_no_expiry_and_garbage_fails() {
		let fields = HashMap::from([
			("access_token".to_owned(), "at".to_owned()),
			("token_type".to_owned(), "bearer".to_owned()),
			("expiry".to_owned(), String::new()),
		]);
		let record = TokenRecord::from_fields(fields).expect("Empty expiry should decode.");

		assert_eq!(record.expires_at, None);
		assert_eq!(record.refresh_token, None);

		let fields = HashMap::from([
			("access_token".to_owned(), "at".to_owned()),
			("expiry".to_owned(), "tomorrow".to_owned()),
		]);

		assert!(matches!(TokenRecord::from_fields(fields), Err(StoreError::Serialization { .. })));
	}
}
