//! Key-value store contract and built-in backends for the cache layer.
//!
//! The contract is hash oriented: every cache entry is a field map stored under one key with
//! a key-level expiry. Single-key operations must be atomic in the backend; the crate never
//! coordinates across keys.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")] pub use self::redis::RedisStore;

// self
use crate::_prelude::*;

/// Boxed future returned by every [`KvStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by cache stores.
pub trait KvStore
where
	Self: Send + Sync,
{
	/// Reads a single field; `None` when the key or field is absent.
	fn hget<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes the provided fields, creating the key when needed.
	fn hset<'a>(&'a self, key: &'a str, fields: &'a [(String, String)]) -> StoreFuture<'a, ()>;

	/// Reads every field; an empty map when the key is absent.
	fn hgetall<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashMap<String, String>>;

	/// Reports whether a field exists under the key.
	fn hexists<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, bool>;

	/// Removes the provided fields; removing the last field removes the key.
	fn hdel<'a>(&'a self, key: &'a str, fields: &'a [&'a str]) -> StoreFuture<'a, ()>;

	/// Sets (or resets) the key-level expiry. Non-positive lifetimes delete the key.
	fn expire<'a>(&'a self, key: &'a str, ttl: Duration) -> StoreFuture<'a, ()>;

	/// Remaining lifetime; `None` when the key is absent or never expires.
	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>>;

	/// Removes the key and all of its fields.
	fn del<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Writes the fields and resets the key-level expiry as one operation.
	///
	/// Backends that can apply both atomically must override this; the default issues
	/// [`hset`](Self::hset) followed by [`expire`](Self::expire).
	fn hset_expire<'a>(
		&'a self,
		key: &'a str,
		fields: &'a [(String, String)],
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.hset(key, fields).await?;
			self.expire(key, ttl).await
		})
	}
}

/// Error type produced by [`KvStore`] implementations and cache record codecs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// A stored record could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	pub(crate) fn serialization(message: impl Display) -> Self {
		Self::Serialization { message: message.to_string() }
	}

	pub(crate) fn backend(message: impl Display) -> Self {
		Self::Backend { message: message.to_string() }
	}
}
