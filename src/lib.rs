//! Rust's turnkey OAuth 2.0 relying party: PKCE login flows, token lifecycle caching, and
//! read-through userinfo/introspection lookups backed by a pluggable key-value store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod business;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use crate::{
		business::BusinessQuery,
		config::{EndpointConfig, RelyingPartyConfig},
		flows::OAuthFlow,
		provider::ProviderDescriptor,
		store::{KvStore, MemoryStore, StoreError, StoreFuture},
	};

	/// Client identifier shared by integration tests.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret shared by integration tests.
	pub const TEST_CLIENT_SECRET: &str = "secret-it";
	/// Redirect URI shared by integration tests.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/oauth/callback";

	/// Builds a configuration whose endpoints all live under `base` (usually an `httpmock`
	/// server URL).
	pub fn build_test_config(base: &str) -> RelyingPartyConfig {
		let endpoint = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Mock endpoint URL should parse.")
		};

		RelyingPartyConfig::new(
			TEST_CLIENT_ID,
			Url::parse(TEST_REDIRECT_URI).expect("Test redirect URI should parse."),
		)
		.with_client_secret(TEST_CLIENT_SECRET)
		.with_endpoints(EndpointConfig {
			discovery: None,
			authorization: Some(endpoint("/authorize")),
			token: Some(endpoint("/token")),
			userinfo: Some(endpoint("/userinfo")),
			introspection: Some(endpoint("/introspect")),
			revocation: Some(endpoint("/revoke")),
		})
		.with_require_https(false)
	}

	/// Builds the descriptor matching [`build_test_config`].
	pub fn build_test_descriptor(base: &str) -> ProviderDescriptor {
		build_test_config(base)
			.descriptor_from_explicit()
			.expect("Test descriptor should build from explicit endpoints.")
	}

	/// Constructs an [`OAuthFlow`] wired to the provided store.
	pub fn build_test_flow_with_store(base: &str, store: Arc<dyn KvStore>) -> OAuthFlow {
		let config = build_test_config(base);
		let descriptor = build_test_descriptor(base);

		OAuthFlow::new(store, &config, descriptor).expect("Test flow should construct.")
	}

	/// Constructs an [`OAuthFlow`] backed by a fresh [`MemoryStore`].
	pub fn build_test_flow(base: &str) -> (OAuthFlow, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let flow = build_test_flow_with_store(base, store.clone());

		(flow, store)
	}

	/// Constructs a [`BusinessQuery`] wired to the provided store.
	pub fn build_test_business_with_store(
		base: &str,
		store: Arc<dyn KvStore>,
		cache_enabled: bool,
	) -> BusinessQuery {
		let config = build_test_config(base).with_business_cache(cache_enabled);
		let descriptor = build_test_descriptor(base);

		BusinessQuery::new(store, &config, descriptor).expect("Test business query should construct.")
	}

	/// Constructs a [`BusinessQuery`] backed by a fresh [`MemoryStore`].
	pub fn build_test_business(base: &str, cache_enabled: bool) -> (BusinessQuery, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let business = build_test_business_with_store(base, store.clone(), cache_enabled);

		(business, store)
	}

	/// [`MemoryStore`] wrapper whose reads, writes, or deletes can be switched to fail.
	///
	/// Every key a write was attempted on is remembered, failed or not.
	#[derive(Debug, Default)]
	pub struct FailingStore {
		/// Backing store used while an operation class is healthy.
		pub inner: MemoryStore,
		fail_reads: AtomicBool,
		fail_writes: AtomicBool,
		fail_deletes: AtomicBool,
		written_keys: Mutex<Vec<String>>,
	}
	impl FailingStore {
		/// Keys passed to `hset` or `hset_expire`, in call order.
		pub fn written_keys(&self) -> Vec<String> {
			self.written_keys.lock().clone()
		}

		/// Makes `hget`, `hgetall`, `hexists`, and `ttl` fail.
		pub fn fail_reads(&self, fail: bool) {
			self.fail_reads.store(fail, Ordering::Relaxed);
		}

		/// Makes `hset`, `hset_expire`, and `expire` fail.
		pub fn fail_writes(&self, fail: bool) {
			self.fail_writes.store(fail, Ordering::Relaxed);
		}

		/// Makes `hdel` and `del` fail.
		pub fn fail_deletes(&self, fail: bool) {
			self.fail_deletes.store(fail, Ordering::Relaxed);
		}

		fn check(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
			if flag.load(Ordering::Relaxed) {
				Err(StoreError::Backend { message: format!("injected {op} failure") })
			} else {
				Ok(())
			}
		}
	}
	impl KvStore for FailingStore {
		fn hget<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
			Box::pin(async move {
				Self::check(&self.fail_reads, "read")?;

				self.inner.hget(key, field).await
			})
		}

		fn hset<'a>(&'a self, key: &'a str, fields: &'a [(String, String)]) -> StoreFuture<'a, ()> {
			Box::pin(async move {
				self.written_keys.lock().push(key.to_owned());
				Self::check(&self.fail_writes, "write")?;

				self.inner.hset(key, fields).await
			})
		}

		fn hgetall<'a>(&'a self, key: &'a str) -> StoreFuture<'a, HashMap<String, String>> {
			Box::pin(async move {
				Self::check(&self.fail_reads, "read")?;

				self.inner.hgetall(key).await
			})
		}

		fn hexists<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, bool> {
			Box::pin(async move {
				Self::check(&self.fail_reads, "read")?;

				self.inner.hexists(key, field).await
			})
		}

		fn hdel<'a>(&'a self, key: &'a str, fields: &'a [&'a str]) -> StoreFuture<'a, ()> {
			Box::pin(async move {
				Self::check(&self.fail_deletes, "delete")?;

				self.inner.hdel(key, fields).await
			})
		}

		fn expire<'a>(&'a self, key: &'a str, ttl: Duration) -> StoreFuture<'a, ()> {
			Box::pin(async move {
				Self::check(&self.fail_writes, "write")?;

				self.inner.expire(key, ttl).await
			})
		}

		fn ttl<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Duration>> {
			Box::pin(async move {
				Self::check(&self.fail_reads, "read")?;

				self.inner.ttl(key).await
			})
		}

		fn del<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
			Box::pin(async move {
				Self::check(&self.fail_deletes, "delete")?;

				self.inner.del(key).await
			})
		}

		fn hset_expire<'a>(
			&'a self,
			key: &'a str,
			fields: &'a [(String, String)],
			ttl: Duration,
		) -> StoreFuture<'a, ()> {
			Box::pin(async move {
				self.written_keys.lock().push(key.to_owned());
				Self::check(&self.fail_writes, "write")?;

				self.inner.hset_expire(key, fields, ttl).await
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, ErrorKind, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
