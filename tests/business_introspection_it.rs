#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_rp::{_preludet::*, store::KvStore};

const BASIC_AUTH: &str = "Basic Y2xpZW50LWl0OnNlY3JldC1pdA==";
const ENTRY: &str = "sso:business:introspection:access_token:token-1";

fn active_body(exp: i64) -> String {
	format!("{{\"active\":true,\"token_type\":\"access_token\",\"exp\":{exp},\"scope\":\"openid\"}}")
}

#[tokio::test]
async fn introspection_authenticates_and_bounds_the_cache_by_expiry() {
	let server = MockServer::start_async().await;
	let (business, store) = build_test_business(&server.base_url(), true);
	let exp = OffsetDateTime::now_utc().unix_timestamp() + 300;
	let body = active_body(exp);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/introspect")
				.header("authorization", BASIC_AUTH)
				.form_urlencoded_tuple("token", "token-1")
				.form_urlencoded_tuple("token_type_hint", "access_token");
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await;
	let result = business
		.introspection("access_token", "token-1")
		.await
		.expect("Introspection should succeed.");

	mock.assert_async().await;

	assert!(result.active);
	assert_eq!(result.exp, Some(exp));
	assert!(result.expiry.is_some());
	assert!(result.expires_in > 0 && result.expires_in <= 300);
	assert!(!result.is_expired);
	assert_eq!(result.raw.get("scope").and_then(|value| value.as_str()), Some("openid"));

	let ttl = store
		.ttl(ENTRY)
		.await
		.expect("TTL lookup should succeed.")
		.expect("Introspection entries should expire.");

	assert!(ttl <= Duration::seconds(300));

	let cached = business
		.introspection("access_token", "token-1")
		.await
		.expect("Repeat lookup should hit the cache.");

	mock.assert_calls_async(1).await;

	assert_eq!(cached.exp, result.exp);
	assert!(cached.expires_in <= result.expires_in);
}

#[tokio::test]
async fn long_lived_tokens_are_capped_at_fifteen_minutes() {
	let server = MockServer::start_async().await;
	let (business, store) = build_test_business(&server.base_url(), true);
	let body = active_body(OffsetDateTime::now_utc().unix_timestamp() + 86_400);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/introspect");
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await;

	business.introspection("access_token", "token-1").await.expect("Introspection should succeed.");

	mock.assert_async().await;

	let ttl = store
		.ttl(ENTRY)
		.await
		.expect("TTL lookup should succeed.")
		.expect("Introspection entries should expire.");

	assert!(ttl <= Duration::minutes(15));
	assert!(ttl > Duration::minutes(14));
}

#[tokio::test]
async fn past_expiry_is_reported_as_expired() {
	let server = MockServer::start_async().await;
	let (business, _) = build_test_business(&server.base_url(), false);
	let body = format!(
		"{{\"active\":false,\"exp\":{}}}",
		OffsetDateTime::now_utc().unix_timestamp() - 60
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/introspect");
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await;
	let result = business
		.introspection("refresh_token", "token-2")
		.await
		.expect("Introspection should succeed.");

	mock.assert_async().await;

	assert!(!result.active);
	assert!(result.is_expired);
	assert_eq!(result.expires_in, 0);
}

#[tokio::test]
async fn non_success_status_is_an_operation_failure() {
	let server = MockServer::start_async().await;
	let (business, _) = build_test_business(&server.base_url(), true);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/introspect");
			then.status(401);
		})
		.await;
	let err = business
		.introspection("access_token", "token-3")
		.await
		.expect_err("Non-200 must fail the lookup.");

	mock.assert_async().await;

	assert_eq!(err.kind(), ErrorKind::OperationFailed);
}

#[tokio::test]
async fn invalidation_forces_a_refetch() {
	let server = MockServer::start_async().await;
	let (business, _) = build_test_business(&server.base_url(), true);
	let body = active_body(OffsetDateTime::now_utc().unix_timestamp() + 600);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/introspect");
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await;

	business.introspection("access_token", "token-1").await.expect("Lookup should fetch.");
	business
		.invalidate_introspection("access_token", "token-1")
		.await
		.expect("Invalidation should succeed.");
	business.introspection("access_token", "token-1").await.expect("Lookup should refetch.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn empty_arguments_are_rejected_locally() {
	let server = MockServer::start_async().await;
	let (business, _) = build_test_business(&server.base_url(), true);

	for (token_type, token) in [("", "token"), ("access_token", "")] {
		let err =
			business.introspection(token_type, token).await.expect_err("Empty input must fail.");

		assert_eq!(err.kind(), ErrorKind::ParameterEmpty);
	}
}
