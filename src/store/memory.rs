//! Thread-safe in-memory [`KvStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, Entry>>>;

#[derive(Clone, Debug, Default)]
struct Entry {
	fields: HashMap<String, String>,
	expires_at: Option<OffsetDateTime>,
}
impl Entry {
	fn is_live(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|expires_at| now < expires_at)
	}
}

/// Process-local store that honors key expiry lazily.
///
/// Expired keys are invisible to reads and purged by the next write that touches them.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn read_now<T>(map: &StoreMap, key: &str, read: impl FnOnce(&Entry) -> T) -> Option<T> {
		let now = OffsetDateTime::now_utc();

		map.read().get(key).filter(|entry| entry.is_live(now)).map(read)
	}

	fn write_now<T>(
		map: &StoreMap,
		key: &str,
		write: impl FnOnce(&mut HashMap<String, Entry>) -> T,
	) -> T {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.write();

		if guard.get(key).is_some_and(|entry| !entry.is_live(now)) {
			guard.remove(key);
		}

		write(&mut guard)
	}
}
impl KvStore for MemoryStore {
	fn hget<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			Ok(Self::read_now(&self.0, key, |entry| entry.fields.get(field).cloned()).flatten())
		})
	}

	fn hset<'a>(&'a self, key: &'a str, fields: &'a [(String, String)]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if fields.is_empty() {
				return Ok(());
			}

			Self::write_now(&self.0, key, |map| {
				let entry = map.entry(key.to_owned()).or_default();

				for (field, value) in fields {
					entry.fields.insert(field.clone(), value.clone());
				}
			});

			Ok(())
		})
	}

	fn hgetall<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashMap<String, String>> {
		Box::pin(async move {
			Ok(Self::read_now(&self.0, key, |entry| entry.fields.clone()).unwrap_or_default())
		})
	}

	fn hexists<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			Ok(Self::read_now(&self.0, key, |entry| entry.fields.contains_key(field))
				.unwrap_or_default())
		})
	}

	fn hdel<'a>(&'a self, key: &'a str, fields: &'a [&'a str]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::write_now(&self.0, key, |map| {
				let Some(entry) = map.get_mut(key) else {
					return;
				};

				for field in fields {
					entry.fields.remove(*field);
				}

				if entry.fields.is_empty() {
					map.remove(key);
				}
			});

			Ok(())
		})
	}

	fn expire<'a>(&'a self, key: &'a str, ttl: Duration) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if ttl <= Duration::ZERO {
				Self::write_now(&self.0, key, |map| map.remove(key));

				return Ok(());
			}

			let expires_at = OffsetDateTime::now_utc()
				.checked_add(ttl)
				.ok_or_else(|| StoreError::backend("Expiry overflows the supported range"))?;

			Self::write_now(&self.0, key, |map| {
				if let Some(entry) = map.get_mut(key) {
					entry.expires_at = Some(expires_at);
				}
			});

			Ok(())
		})
	}

	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			Ok(Self::read_now(&self.0, key, |entry| entry.expires_at.map(|at| at - now)).flatten())
		})
	}

	fn hset_expire<'a>(
		&'a self,
		key: &'a str,
		fields: &'a [(String, String)],
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if ttl <= Duration::ZERO {
				Self::write_now(&self.0, key, |map| map.remove(key));

				return Ok(());
			}

			let expires_at = OffsetDateTime::now_utc()
				.checked_add(ttl)
				.ok_or_else(|| StoreError::backend("Expiry overflows the supported range"))?;

			Self::write_now(&self.0, key, |map| {
				let entry = map.entry(key.to_owned()).or_default();

				for (field, value) in fields {
					entry.fields.insert(field.clone(), value.clone());
				}

				if entry.fields.is_empty() {
					map.remove(key);
				} else {
					entry.expires_at = Some(expires_at);
				}
			});

			Ok(())
		})
	}

	fn del<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::write_now(&self.0, key, |map| map.remove(key));

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
		values.iter().map(|(field, value)| ((*field).to_owned(), (*value).to_owned())).collect()
	}

	#[tokio::test]
	async fn hash_operations_round_trip() {
		let store = MemoryStore::default();

		store
			.hset("k", &pairs(&[("a", "1"), ("b", "2")]))
			.await
			.expect("Writing fields should succeed.");

		assert_eq!(
			store.hget("k", "a").await.expect("Reading a field should succeed."),
			Some("1".into())
		);
		assert!(store.hexists("k", "b").await.expect("Field lookup should succeed."));
		assert_eq!(store.hgetall("k").await.expect("Reading all fields should succeed.").len(), 2);

		store.hdel("k", &["a"]).await.expect("Removing a field should succeed.");

		assert!(!store.hexists("k", "a").await.expect("Field lookup should succeed."));

		store.hdel("k", &["b"]).await.expect("Removing the last field should succeed.");

		assert!(store.hgetall("k").await.expect("Reading all fields should succeed.").is_empty());
	}

	#[tokio::test]
	async fn expired_keys_are_invisible_and_purged() {
		let store = MemoryStore::default();

		store.hset("k", &pairs(&[("a", "1")])).await.expect("Writing fields should succeed.");
		store
			.expire("k", Duration::milliseconds(20))
			.await
			.expect("Setting an expiry should succeed.");

		let remaining = store
			.ttl("k")
			.await
			.expect("Reading the expiry should succeed.")
			.expect("Key should report a remaining lifetime.");

		assert!(remaining <= Duration::milliseconds(20));

		tokio::time::sleep(std::time::Duration::from_millis(40)).await;

		assert_eq!(store.hget("k", "a").await.expect("Reading a field should succeed."), None);
		assert_eq!(store.ttl("k").await.expect("Reading the expiry should succeed."), None);

		store.hset("k", &pairs(&[("b", "2")])).await.expect("Writing fields should succeed.");

		let fields = store.hgetall("k").await.expect("Reading all fields should succeed.");

		assert_eq!(fields.len(), 1, "Stale fields must not survive a purge.");
		assert_eq!(store.ttl("k").await.expect("Reading the expiry should succeed."), None);
	}

	#[tokio::test]
	async fn non_positive_expiry_deletes_the_key() {
		let store = MemoryStore::default();

		store.hset("k", &pairs(&[("a", "1")])).await.expect("Writing fields should succeed.");
		store.expire("k", Duration::ZERO).await.expect("Zero expiry should succeed.");

		assert!(store.hgetall("k").await.expect("Reading all fields should succeed.").is_empty());

		store.expire("missing", Duration::minutes(1)).await.expect("Expiring a missing key is a no-op.");
		store.del("missing").await.expect("Deleting a missing key is a no-op.");
	}

	#[tokio::test]
	async fn hset_expire_writes_fields_and_lifetime_together() {
		let store = MemoryStore::default();

		store
			.hset_expire("k", &pairs(&[("a", "1")]), Duration::minutes(5))
			.await
			.expect("Combined write should succeed.");

		assert_eq!(
			store.hget("k", "a").await.expect("Reading a field should succeed."),
			Some("1".into())
		);
		assert!(
			store
				.ttl("k")
				.await
				.expect("Reading the expiry should succeed.")
				.is_some_and(|ttl| ttl > Duration::minutes(4))
		);

		store
			.hset_expire("k", &pairs(&[("b", "2")]), Duration::ZERO)
			.await
			.expect("Zero lifetime should succeed.");

		assert!(store.hgetall("k").await.expect("Reading all fields should succeed.").is_empty());

		store
			.hset_expire("empty", &[], Duration::minutes(1))
			.await
			.expect("Empty batches should succeed.");

		assert_eq!(store.ttl("empty").await.expect("Reading the expiry should succeed."), None);
	}
}
