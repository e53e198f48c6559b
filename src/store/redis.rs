//! Redis-backed [`KvStore`] built on a shared, auto-reconnecting connection manager.

// crates.io
use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreError, StoreFuture},
};

/// Store that maps every operation onto the matching Redis hash command.
///
/// One multiplexed connection is opened up front and shared by every operation and clone.
#[derive(Clone)]
pub struct RedisStore {
	connection: ConnectionManager,
}
impl RedisStore {
	/// Wraps an existing connection manager.
	pub fn new(connection: ConnectionManager) -> Self {
		Self { connection }
	}

	/// Connects to `url` (`redis://host:port/db`) and keeps the connection for the store's
	/// lifetime.
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let client = Client::open(url).map_err(map_redis_error)?;
		let connection = ConnectionManager::new(client).await.map_err(map_redis_error)?;

		Ok(Self::new(connection))
	}

	fn connection(&self) -> ConnectionManager {
		self.connection.clone()
	}
}
impl Debug for RedisStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedisStore").finish_non_exhaustive()
	}
}
impl KvStore for RedisStore {
	fn hget<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			let mut conn = self.connection();

			conn.hget(key, field).await.map_err(map_redis_error)
		})
	}

	fn hset<'a>(&'a self, key: &'a str, fields: &'a [(String, String)]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if fields.is_empty() {
				return Ok(());
			}

			let mut conn = self.connection();
			let _: () = conn.hset_multiple(key, fields).await.map_err(map_redis_error)?;

			Ok(())
		})
	}

	fn hgetall<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashMap<String, String>> {
		Box::pin(async move {
			let mut conn = self.connection();

			conn.hgetall(key).await.map_err(map_redis_error)
		})
	}

	fn hexists<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let mut conn = self.connection();

			conn.hexists(key, field).await.map_err(map_redis_error)
		})
	}

	fn hdel<'a>(&'a self, key: &'a str, fields: &'a [&'a str]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if fields.is_empty() {
				return Ok(());
			}

			let mut conn = self.connection();
			let _: () = conn.hdel(key, fields.to_vec()).await.map_err(map_redis_error)?;

			Ok(())
		})
	}

	fn expire<'a>(&'a self, key: &'a str, ttl: Duration) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.connection();

			if ttl <= Duration::ZERO {
				let _: () = conn.del(key).await.map_err(map_redis_error)?;

				return Ok(());
			}

			let _: () = conn.expire(key, expiry_seconds(ttl)).await.map_err(map_redis_error)?;

			Ok(())
		})
	}

	fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
		Box::pin(async move {
			let mut conn = self.connection();
			let seconds: i64 = conn.ttl(key).await.map_err(map_redis_error)?;

			// -2: missing key, -1: no expiry.
			Ok((seconds >= 0).then(|| Duration::seconds(seconds)))
		})
	}

	fn del<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.connection();
			let _: () = conn.del(key).await.map_err(map_redis_error)?;

			Ok(())
		})
	}

	fn hset_expire<'a>(
		&'a self,
		key: &'a str,
		fields: &'a [(String, String)],
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.connection();
			let mut pipe = redis::pipe();

			pipe.atomic();

			if ttl <= Duration::ZERO {
				pipe.del(key).ignore();
			} else {
				if !fields.is_empty() {
					pipe.hset_multiple(key, fields).ignore();
				}

				pipe.expire(key, expiry_seconds(ttl)).ignore();
			}

			let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;

			Ok(())
		})
	}
}

// Redis expiries are whole seconds; round up so short TTLs never become zero.
fn expiry_seconds(ttl: Duration) -> i64 {
	ttl.whole_seconds() + i64::from(ttl.subsec_nanoseconds() > 0)
}

fn map_redis_error(err: RedisError) -> StoreError {
	StoreError::backend(err)
}
