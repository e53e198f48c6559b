//! Introspection results keyed by `token_type:token`, bounded by the token's own expiry.

// self
use crate::{
	_prelude::*,
	auth::Introspection,
	cache::{
		CacheNamespace, CacheRecord, RecordCache, TtlPolicy, decode_raw, encode_raw, parse_field,
		take_field,
	},
	store::{KvStore, StoreError},
};

/// Ceiling on how long an introspection result may stay cached.
pub const INTROSPECTION_TTL_CAP: Duration = Duration::minutes(15);

/// Composite cache identifier for an introspected token.
pub fn introspection_identifier(token_type: &str, token: &str) -> String {
	format!("{token_type}:{token}")
}

impl CacheRecord for Introspection {
	fn to_fields(&self) -> Result<Vec<(String, String)>, StoreError> {
		let mut fields = vec![
			("active".into(), self.active.to_string()),
			("token_type".into(), self.token_type.clone()),
			("expires_in".into(), self.expires_in.to_string()),
			("is_expired".into(), self.is_expired.to_string()),
			("raw".into(), encode_raw(&self.raw)?),
		];

		if let Some(exp) = self.exp {
			fields.push(("exp".into(), exp.to_string()));
		}
		if let Some(expiry) = &self.expiry {
			fields.push(("expiry".into(), expiry.clone()));
		}

		Ok(fields)
	}

	fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, StoreError> {
		let optional = |value: String| (!value.is_empty()).then_some(value);
		let active = take_field(&mut fields, "active");
		let expires_in = take_field(&mut fields, "expires_in");
		let is_expired = take_field(&mut fields, "is_expired");

		Ok(Self {
			active: optional(active).map(|v| parse_field("active", &v)).transpose()?.unwrap_or_default(),
			token_type: take_field(&mut fields, "token_type"),
			exp: optional(take_field(&mut fields, "exp"))
				.map(|v| parse_field("exp", &v))
				.transpose()?,
			expiry: optional(take_field(&mut fields, "expiry")),
			expires_in: optional(expires_in)
				.map(|v| parse_field("expires_in", &v))
				.transpose()?
				.unwrap_or_default(),
			is_expired: optional(is_expired)
				.map(|v| parse_field("is_expired", &v))
				.transpose()?
				.unwrap_or_default(),
			raw: decode_raw(&take_field(&mut fields, "raw"))?,
		})
	}

	fn is_empty(&self) -> bool {
		// Inactive results are still worth caching; only a record with no payload is empty.
		!self.active && self.raw.is_empty()
	}

	fn ttl_hint(&self) -> Option<Duration> {
		self.exp.map(|_| Duration::seconds(self.expires_in))
	}
}

impl RecordCache<Introspection> {
	/// Introspection cache capped at fifteen minutes.
	pub fn introspection(store: Arc<dyn KvStore>, prefix: impl Into<Arc<str>>) -> Self {
		Self::new(
			store,
			CacheNamespace::Introspection,
			prefix,
			TtlPolicy::Capped(INTROSPECTION_TTL_CAP),
		)
	}
}
