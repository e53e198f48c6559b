//! Userinfo claims keyed by access token.

// self
use crate::{
	_prelude::*,
	auth::Userinfo,
	cache::{CacheNamespace, CacheRecord, RecordCache, TtlPolicy, decode_raw, encode_raw, take_field},
	store::{KvStore, StoreError},
};

/// Lifetime of cached userinfo.
pub const USERINFO_TTL: Duration = Duration::minutes(10);

const FIELDS: [&str; 5] = ["sub", "nickname", "preferred_username", "email", "phone"];

impl CacheRecord for Userinfo {
	fn to_fields(&self) -> Result<Vec<(String, String)>, StoreError> {
		let values = [&self.sub, &self.nickname, &self.preferred_username, &self.email, &self.phone];
		let mut fields = FIELDS
			.iter()
			.zip(values)
			.map(|(name, value)| ((*name).to_owned(), value.clone()))
			.collect::<Vec<_>>();

		fields.push(("raw".into(), encode_raw(&self.raw)?));

		Ok(fields)
	}

	fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, StoreError> {
		let raw = decode_raw(&take_field(&mut fields, "raw"))?;

		Ok(Self {
			sub: take_field(&mut fields, "sub"),
			nickname: take_field(&mut fields, "nickname"),
			preferred_username: take_field(&mut fields, "preferred_username"),
			email: take_field(&mut fields, "email"),
			phone: take_field(&mut fields, "phone"),
			raw,
		})
	}

	fn is_empty(&self) -> bool {
		self.sub.is_empty() && self.raw.is_empty()
	}
}

impl RecordCache<Userinfo> {
	/// Userinfo cache with the fixed ten minute lifetime.
	pub fn userinfo(store: Arc<dyn KvStore>, prefix: impl Into<Arc<str>>) -> Self {
		Self::new(store, CacheNamespace::Userinfo, prefix, TtlPolicy::Fixed(USERINFO_TTL))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[tokio::test]
	async fn userinfo_keeps_projected_and_raw_claims() {
		let store = Arc::new(MemoryStore::default());
		let cache = RecordCache::userinfo(store, "sso:");
		let raw = match json!({ "sub": "123", "email": "e@x.com", "tenant": "dev" }) {
			serde_json::Value::Object(map) => map,
			_ => unreachable!(),
		};
		let userinfo = Userinfo::from_raw(raw);

		cache.set_record("at-1", &userinfo).await.expect("Userinfo write should succeed.");

		let cached = cache
			.get_record("at-1")
			.await
			.expect("Userinfo read should succeed.")
			.expect("Userinfo should be cached.");

		assert_eq!(cached, userinfo);
		assert!(cached.raw.contains_key("tenant"));
	}
}
