//! Identity claims returned by the userinfo and introspection endpoints.
//!
//! Both records keep the full provider payload in `raw` and project a handful of well-known
//! fields out of it. Projection is type-checked: a field that is present but carries an
//! unexpected JSON type is left at its default instead of failing the record.

// crates.io
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// Opaque provider payload preserved alongside the projected fields.
pub type RawClaims = Map<String, Value>;

/// Normalized userinfo claims.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Userinfo {
	/// Subject identifier.
	pub sub: String,
	/// Casual display name.
	pub nickname: String,
	/// Preferred login name.
	pub preferred_username: String,
	/// Email address.
	pub email: String,
	/// Phone number.
	pub phone: String,
	/// Complete userinfo payload.
	#[serde(default)]
	pub raw: RawClaims,
}
impl Userinfo {
	/// Projects the well-known string claims out of a raw userinfo payload.
	pub fn from_raw(raw: RawClaims) -> Self {
		Self {
			sub: string_claim(&raw, "sub"),
			nickname: string_claim(&raw, "nickname"),
			preferred_username: string_claim(&raw, "preferred_username"),
			email: string_claim(&raw, "email"),
			phone: string_claim(&raw, "phone"),
			raw,
		}
	}
}

/// Normalized RFC 7662 introspection result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Introspection {
	/// Whether the token is currently active.
	pub active: bool,
	/// Token type reported by the provider.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub token_type: String,
	/// Expiry as unix seconds, when the provider reported one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	/// Expiry formatted as RFC 3339.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiry: Option<String>,
	/// Seconds until expiry at the time of the lookup, clamped at zero.
	#[serde(default)]
	pub expires_in: i64,
	/// `true` when `exp` was already in the past at lookup time.
	#[serde(default)]
	pub is_expired: bool,
	/// Complete introspection payload.
	#[serde(default)]
	pub raw: RawClaims,
}
impl Introspection {
	/// Projects an introspection payload, deriving expiry fields relative to `now`.
	pub fn from_raw(raw: RawClaims, now: OffsetDateTime) -> Self {
		let mut introspection = Self {
			active: raw.get("active").and_then(Value::as_bool).unwrap_or_default(),
			token_type: string_claim(&raw, "token_type"),
			..Default::default()
		};

		if let Some((exp, expiry)) = raw.get("exp").and_then(unix_seconds).and_then(|exp| {
			let expiry = OffsetDateTime::from_unix_timestamp(exp).ok()?.format(&Rfc3339).ok()?;

			Some((exp, expiry))
		}) {
			introspection.exp = Some(exp);
			introspection.expiry = Some(expiry);
		}

		introspection.raw = raw;
		introspection.rebase(now);

		introspection
	}

	/// Recomputes `expires_in` and `is_expired` relative to `now`.
	///
	/// Records without `exp` are left untouched.
	pub fn rebase(&mut self, now: OffsetDateTime) {
		let Some(exp) = self.exp else { return };
		let remaining = exp.saturating_sub(now.unix_timestamp());

		self.is_expired = remaining < 0;
		self.expires_in = remaining.max(0);
	}
}

fn string_claim(raw: &RawClaims, key: &str) -> String {
	raw.get(key).and_then(Value::as_str).map(ToOwned::to_owned).unwrap_or_default()
}

/// Accepts integers, integral floats, and numeric strings.
fn unix_seconds(value: &Value) -> Option<i64> {
	match value {
		Value::Number(number) => number.as_i64().or_else(|| {
			number.as_f64().filter(|float| float.is_finite() && float.fract() == 0.0).and_then(
				|float| {
					(float >= i64::MIN as f64 && float <= i64::MAX as f64).then_some(float as i64)
				},
			)
		}),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}
