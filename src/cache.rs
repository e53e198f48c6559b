//! Uniform cache adapters layered over a [`KvStore`].
//!
//! Every cache shares the same shape: records are stored as field maps under
//! `{prefix}{template}{identifier}`, every write re-applies the cache's [`TtlPolicy`], and
//! every operation rejects empty keys and fields before touching the store. Business caches
//! additionally honor a runtime [`CacheToggle`]; while disabled they read as misses and skip
//! writes, but invalidation still goes through.

pub mod flow_state;
pub mod introspection;
pub mod token;
pub mod userinfo;

pub use flow_state::*;
pub use introspection::*;
pub use token::*;
pub use userinfo::*;

// std
use std::{
	marker::PhantomData,
	sync::atomic::{AtomicBool, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::RawClaims,
	error::require_non_empty,
	store::{KvStore, StoreError},
};

/// Prefix applied to every cache key unless configured otherwise.
pub const DEFAULT_KEY_PREFIX: &str = "sso:";

/// Purpose-specific key templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
	/// In-flight authorization attempts keyed by `state`.
	FlowState,
	/// Token sets keyed by access token.
	Token,
	/// Userinfo claims keyed by access token.
	Userinfo,
	/// Introspection results keyed by `token_type:token`.
	Introspection,
}
impl CacheNamespace {
	/// Template segment placed between the prefix and the identifier.
	pub const fn template(self) -> &'static str {
		match self {
			CacheNamespace::FlowState => "oauth:state:",
			CacheNamespace::Token => "oauth:token:",
			CacheNamespace::Userinfo => "business:userinfo:",
			CacheNamespace::Introspection => "business:introspection:",
		}
	}

	/// Builds the full store key for an identifier.
	pub fn key(self, prefix: &str, identifier: &str) -> String {
		format!("{prefix}{}{identifier}", self.template())
	}
}

/// Lifetime applied on every write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtlPolicy {
	/// Same lifetime for every write.
	Fixed(Duration),
	/// Record-supplied lifetime, bounded by the ceiling.
	///
	/// Hints that are non-positive or at least the ceiling fall back to the ceiling.
	Capped(Duration),
}
impl TtlPolicy {
	/// Upper bound of the policy.
	pub fn ceiling(self) -> Duration {
		match self {
			TtlPolicy::Fixed(ttl) | TtlPolicy::Capped(ttl) => ttl,
		}
	}

	/// Lifetime to apply for a write carrying `hint`.
	pub fn resolve(self, hint: Option<Duration>) -> Duration {
		match (self, hint) {
			(TtlPolicy::Capped(cap), Some(hint)) if hint.is_positive() && hint < cap => hint,
			(policy, _) => policy.ceiling(),
		}
	}
}

/// Shared runtime switch for read-through caches.
#[derive(Clone, Debug)]
pub struct CacheToggle(Arc<AtomicBool>);
impl CacheToggle {
	/// Creates a toggle with the provided initial state.
	pub fn new(enabled: bool) -> Self {
		Self(Arc::new(AtomicBool::new(enabled)))
	}

	/// Returns whether lookups and writes currently go to the store.
	pub fn is_enabled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}

	/// Flips the toggle for every cache sharing it.
	pub fn set_enabled(&self, enabled: bool) {
		self.0.store(enabled, Ordering::Relaxed);
	}
}
impl Default for CacheToggle {
	fn default() -> Self {
		Self::new(true)
	}
}

/// Record persisted as a field map.
pub trait CacheRecord
where
	Self: Sized + Send + Sync,
{
	/// Encodes the record into `(field, value)` pairs.
	fn to_fields(&self) -> Result<Vec<(String, String)>, StoreError>;

	/// Decodes a record from a non-empty field map.
	fn from_fields(fields: HashMap<String, String>) -> Result<Self, StoreError>;

	/// Returns `true` when the record carries nothing worth persisting.
	fn is_empty(&self) -> bool;

	/// Preferred lifetime, consulted by [`TtlPolicy::Capped`].
	fn ttl_hint(&self) -> Option<Duration> {
		None
	}
}

/// Cache adapter for one namespace and one record type.
pub struct RecordCache<R> {
	store: Arc<dyn KvStore>,
	namespace: CacheNamespace,
	prefix: Arc<str>,
	ttl: TtlPolicy,
	toggle: CacheToggle,
	_record: PhantomData<fn() -> R>,
}
impl<R> RecordCache<R>
where
	R: CacheRecord,
{
	/// Creates an always-enabled cache.
	pub fn new(
		store: Arc<dyn KvStore>,
		namespace: CacheNamespace,
		prefix: impl Into<Arc<str>>,
		ttl: TtlPolicy,
	) -> Self {
		Self {
			store,
			namespace,
			prefix: prefix.into(),
			ttl,
			toggle: CacheToggle::default(),
			_record: PhantomData,
		}
	}

	/// Attaches a shared runtime toggle.
	pub fn with_toggle(mut self, toggle: CacheToggle) -> Self {
		self.toggle = toggle;

		self
	}

	/// Overrides the lifetime policy.
	pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
		self.ttl = ttl;

		self
	}

	/// Lifetime policy applied on writes.
	pub fn ttl_policy(&self) -> TtlPolicy {
		self.ttl
	}

	/// Runtime toggle consulted by reads and writes.
	pub fn toggle(&self) -> &CacheToggle {
		&self.toggle
	}

	/// Full store key for `identifier`.
	pub fn key(&self, identifier: &str) -> String {
		self.namespace.key(&self.prefix, identifier)
	}

	/// Reads one field.
	pub async fn get(&self, key: &str, field: &str) -> Result<Option<String>> {
		require_non_empty("key", key)?;
		require_non_empty("field", field)?;

		if !self.toggle.is_enabled() {
			return Ok(None);
		}

		Ok(self.store.hget(&self.key(key), field).await?)
	}

	/// Writes one field and resets the key lifetime.
	pub async fn set(&self, key: &str, field: &str, value: &str) -> Result<()> {
		require_non_empty("key", key)?;
		require_non_empty("field", field)?;
		require_non_empty("value", value)?;

		if !self.toggle.is_enabled() {
			return Ok(());
		}

		self.write(key, vec![(field.to_owned(), value.to_owned())], None).await
	}

	/// Reads and decodes the full record; `None` on a miss.
	pub async fn get_record(&self, key: &str) -> Result<Option<R>> {
		require_non_empty("key", key)?;

		if !self.toggle.is_enabled() {
			return Ok(None);
		}

		let fields = self.store.hgetall(&self.key(key)).await?;

		if fields.is_empty() {
			return Ok(None);
		}

		Ok(Some(R::from_fields(fields)?))
	}

	/// Encodes and writes the full record, applying the record's lifetime hint.
	pub async fn set_record(&self, key: &str, record: &R) -> Result<()> {
		require_non_empty("key", key)?;

		if record.is_empty() {
			return Err(Error::ParameterEmpty { parameter: "record" });
		}
		if !self.toggle.is_enabled() {
			return Ok(());
		}

		self.write(key, record.to_fields()?, record.ttl_hint()).await
	}

	/// Reads every field without decoding.
	pub async fn get_all(&self, key: &str) -> Result<HashMap<String, String>> {
		require_non_empty("key", key)?;

		if !self.toggle.is_enabled() {
			return Ok(HashMap::new());
		}

		Ok(self.store.hgetall(&self.key(key)).await?)
	}

	/// Writes a batch of fields; an empty batch is a no-op.
	pub async fn set_all<I, F, V>(&self, key: &str, fields: I) -> Result<()>
	where
		I: IntoIterator<Item = (F, V)>,
		F: Into<String>,
		V: Into<String>,
	{
		require_non_empty("key", key)?;

		let fields = fields
			.into_iter()
			.map(|(field, value)| {
				let (field, value) = (field.into(), value.into());

				require_non_empty("field", &field)?;
				require_non_empty("value", &value)?;

				Ok((field, value))
			})
			.collect::<Result<Vec<_>>>()?;

		if fields.is_empty() || !self.toggle.is_enabled() {
			return Ok(());
		}

		self.write(key, fields, None).await
	}

	/// Reports whether a field exists.
	pub async fn exists(&self, key: &str, field: &str) -> Result<bool> {
		require_non_empty("key", key)?;
		require_non_empty("field", field)?;

		if !self.toggle.is_enabled() {
			return Ok(false);
		}

		Ok(self.store.hexists(&self.key(key), field).await?)
	}

	/// Removes individual fields.
	pub async fn remove(&self, key: &str, fields: &[&str]) -> Result<()> {
		require_non_empty("key", key)?;

		for field in fields {
			require_non_empty("field", field)?;
		}

		Ok(self.store.hdel(&self.key(key), fields).await?)
	}

	/// Removes the whole record.
	pub async fn delete(&self, key: &str) -> Result<()> {
		require_non_empty("key", key)?;

		Ok(self.store.del(&self.key(key)).await?)
	}

	/// Remaining lifetime of the record, if any.
	pub async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
		require_non_empty("key", key)?;

		Ok(self.store.ttl(&self.key(key)).await?)
	}

	async fn write(
		&self,
		key: &str,
		fields: Vec<(String, String)>,
		hint: Option<Duration>,
	) -> Result<()> {
		let key = self.key(key);

		Ok(self.store.hset_expire(&key, &fields, self.ttl.resolve(hint)).await?)
	}
}
impl<R> Clone for RecordCache<R> {
	fn clone(&self) -> Self {
		Self {
			store: self.store.clone(),
			namespace: self.namespace,
			prefix: self.prefix.clone(),
			ttl: self.ttl,
			toggle: self.toggle.clone(),
			_record: PhantomData,
		}
	}
}
impl<R> Debug for RecordCache<R> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RecordCache")
			.field("namespace", &self.namespace)
			.field("prefix", &self.prefix)
			.field("ttl", &self.ttl)
			.field("enabled", &self.toggle.is_enabled())
			.finish()
	}
}

pub(crate) fn take_field(fields: &mut HashMap<String, String>, name: &str) -> String {
	fields.remove(name).unwrap_or_default()
}

pub(crate) fn encode_raw(raw: &RawClaims) -> Result<String, StoreError> {
	serde_json::to_string(raw).map_err(StoreError::serialization)
}

pub(crate) fn decode_raw(text: &str) -> Result<RawClaims, StoreError> {
	if text.is_empty() {
		return Ok(RawClaims::new());
	}

	let mut de = serde_json::Deserializer::from_str(text);

	serde_path_to_error::deserialize(&mut de).map_err(StoreError::serialization)
}

pub(crate) fn parse_field<T>(name: &str, value: &str) -> Result<T, StoreError>
where
	T: FromStr,
	T::Err: Display,
{
	value.parse().map_err(|e| StoreError::serialization(format!("field `{name}`: {e}")))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::{MemoryStore, StoreFuture};

	#[derive(Clone, Debug, PartialEq)]
	struct Note(String);
	impl CacheRecord for Note {
		fn to_fields(&self) -> Result<Vec<(String, String)>, StoreError> {
			Ok(vec![("body".into(), self.0.clone())])
		}

		fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, StoreError> {
			Ok(Self(take_field(&mut fields, "body")))
		}

		fn is_empty(&self) -> bool {
			self.0.is_empty()
		}

		fn ttl_hint(&self) -> Option<Duration> {
			Some(Duration::seconds(30))
		}
	}

	/// Accepts only the combined field-and-lifetime write.
	#[derive(Debug, Default)]
	struct CombinedWritesOnly(MemoryStore);
	impl KvStore for CombinedWritesOnly {
		fn hget<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
			self.0.hget(key, field)
		}

		fn hset<'a>(&'a self, _: &'a str, _: &'a [(String, String)]) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::backend("split write")) })
		}

		fn hgetall<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashMap<String, String>> {
			self.0.hgetall(key)
		}

		fn hexists<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, bool> {
			self.0.hexists(key, field)
		}

		fn hdel<'a>(&'a self, key: &'a str, fields: &'a [&'a str]) -> StoreFuture<'a, ()> {
			self.0.hdel(key, fields)
		}

		fn expire<'a>(&'a self, _: &'a str, _: Duration) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::backend("split write")) })
		}

		fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
			self.0.ttl(key)
		}

		fn del<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
			self.0.del(key)
		}

		fn hset_expire<'a>(
			&'a self,
			key: &'a str,
			fields: &'a [(String, String)],
			ttl: Duration,
		) -> StoreFuture<'a, ()> {
			self.0.hset_expire(key, fields, ttl)
		}
	}

	fn cache(policy: TtlPolicy) -> (RecordCache<Note>, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let cache = RecordCache::new(store.clone(), CacheNamespace::Token, "t:", policy);

		(cache, store)
	}

	#[test]
	fn namespaces_never_collide() {
		let keys = [
			CacheNamespace::FlowState.key("sso:", "abc"),
			CacheNamespace::Token.key("sso:", "abc"),
			CacheNamespace::Userinfo.key("sso:", "abc"),
			CacheNamespace::Introspection.key("sso:", "abc"),
		];

		assert_eq!(keys[0], "sso:oauth:state:abc");
		assert_eq!(keys[1], "sso:oauth:token:abc");
		assert_eq!(keys[2], "sso:business:userinfo:abc");
		assert_eq!(keys[3], "sso:business:introspection:abc");

		for (idx, key) in keys.iter().enumerate() {
			assert!(keys.iter().skip(idx + 1).all(|other| other != key));
		}
	}

	#[test]
	fn capped_policy_prefers_shorter_hints() {
		let policy = TtlPolicy::Capped(Duration::minutes(15));

		assert_eq!(policy.resolve(Some(Duration::seconds(300))), Duration::seconds(300));
		assert_eq!(policy.resolve(Some(Duration::hours(2))), Duration::minutes(15));
		assert_eq!(policy.resolve(Some(Duration::ZERO)), Duration::minutes(15));
		assert_eq!(policy.resolve(None), Duration::minutes(15));
		assert_eq!(
			TtlPolicy::Fixed(Duration::days(30)).resolve(Some(Duration::seconds(1))),
			Duration::days(30)
		);
	}

	#[tokio::test]
	async fn operations_reject_empty_arguments() {
		let (cache, _) = cache(TtlPolicy::Fixed(Duration::minutes(1)));
		let cases = [
			cache.get("", "f").await.map(drop),
			cache.get("k", "").await.map(drop),
			cache.set("k", "f", "").await,
			cache.set_record("k", &Note(String::new())).await,
			cache.set_all("k", [("", "v")]).await,
			cache.remove("k", &[""]).await,
			cache.delete("").await,
		];

		for result in cases {
			let err = result.expect_err("Empty arguments must be rejected.");

			assert_eq!(err.kind(), ErrorKind::ParameterEmpty);
		}
	}

	#[tokio::test]
	async fn writes_reset_the_lifetime() {
		let (cache, store) = cache(TtlPolicy::Fixed(Duration::minutes(10)));

		cache.set("k", "a", "1").await.expect("Single-field write should succeed.");
		store.expire("t:oauth:token:k", Duration::seconds(5)).await.expect("Expire should succeed.");
		cache.set_all("k", [("b", "2")]).await.expect("Bulk write should succeed.");

		let remaining = cache
			.ttl("k")
			.await
			.expect("TTL lookup should succeed.")
			.expect("Key should carry a lifetime.");

		assert!(remaining > Duration::minutes(9));
		assert_eq!(cache.get_all("k").await.expect("Bulk read should succeed.").len(), 2);
		assert!(cache.exists("k", "b").await.expect("Field lookup should succeed."));

		cache.remove("k", &["a"]).await.expect("Field removal should succeed.");

		assert_eq!(cache.get("k", "a").await.expect("Field read should succeed."), None);
	}

	#[tokio::test]
	async fn records_apply_capped_hints() {
		let (cache, _) = cache(TtlPolicy::Capped(Duration::minutes(15)));

		cache.set_record("k", &Note("hello".into())).await.expect("Record write should succeed.");

		let remaining = cache
			.ttl("k")
			.await
			.expect("TTL lookup should succeed.")
			.expect("Key should carry a lifetime.");

		assert!(remaining <= Duration::seconds(30));
		assert_eq!(
			cache.get_record("k").await.expect("Record read should succeed."),
			Some(Note("hello".into()))
		);

		cache.delete("k").await.expect("Delete should succeed.");

		assert_eq!(cache.get_record("k").await.expect("Record read should succeed."), None);
	}

	#[tokio::test]
	async fn disabled_toggle_misses_and_skips_writes_but_still_deletes() {
		let (cache, store) = cache(TtlPolicy::Fixed(Duration::minutes(1)));
		let toggle = CacheToggle::new(true);
		let cache = cache.with_toggle(toggle.clone());

		cache.set_record("k", &Note("kept".into())).await.expect("Record write should succeed.");
		toggle.set_enabled(false);

		assert_eq!(cache.get_record("k").await.expect("Disabled read should succeed."), None);
		assert!(!cache.exists("k", "body").await.expect("Disabled lookup should succeed."));

		cache.set("k", "body", "ignored").await.expect("Disabled write should be a no-op.");

		assert_eq!(
			store.hget("t:oauth:token:k", "body").await.expect("Raw read should succeed."),
			Some("kept".into())
		);

		cache.delete("k").await.expect("Delete should ignore the toggle.");

		assert!(store.hgetall("t:oauth:token:k").await.expect("Raw read should succeed.").is_empty());
	}

	#[tokio::test]
	async fn writes_set_fields_and_lifetime_in_one_store_call() {
		let store = Arc::new(CombinedWritesOnly::default());
		let cache = RecordCache::<Note>::new(
			store.clone(),
			CacheNamespace::Token,
			"t:",
			TtlPolicy::Fixed(Duration::minutes(1)),
		);

		cache.set_record("k", &Note("hello".into())).await.expect("Record write should succeed.");
		cache.set("k", "extra", "1").await.expect("Field write should succeed.");
		cache.set_all("k", [("more", "2")]).await.expect("Batch write should succeed.");

		assert_eq!(
			cache.get_all("k").await.expect("Reading all fields should succeed.").len(),
			3
		);
		assert!(
			cache
				.ttl("k")
				.await
				.expect("TTL lookup should succeed.")
				.is_some_and(|ttl| ttl > Duration::seconds(50))
		);
	}

	#[test]
	fn raw_codec_handles_empty_and_invalid_payloads() {
		assert!(decode_raw("").expect("Empty payload decodes to an empty map.").is_empty());
		assert!(matches!(decode_raw("[1]"), Err(StoreError::Serialization { .. })));
		assert!(matches!(parse_field::<i64>("exp", "soon"), Err(StoreError::Serialization { .. })));
	}
}
