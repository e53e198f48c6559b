//! Shared helpers for flow implementations.

// self
use crate::{
	auth::{ScopeSet, TokenRecord},
	cache::RecordCache,
	obs::{self, FlowKind},
};

/// Joins normalized scopes for the `scope` request parameter.
pub(crate) fn format_scope(scope: &ScopeSet) -> Option<String> {
	if scope.is_empty() { None } else { Some(scope.normalized()) }
}

/// Caches a freshly issued token set keyed by its access token; failures are only logged.
pub(crate) async fn cache_token(
	cache: &RecordCache<TokenRecord>,
	kind: FlowKind,
	record: &TokenRecord,
) {
	obs::best_effort(kind, "store_token", cache.set_record(record.access_token.expose(), record).await);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_scope_sets_are_omitted() {
		let scope = ScopeSet::new(["profile", "openid"]).expect("Failed to build test scope.");

		assert_eq!(format_scope(&scope), Some("openid profile".into()));
		assert_eq!(format_scope(&ScopeSet::default()), None);
	}
}
