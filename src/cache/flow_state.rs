//! In-flight authorization attempts keyed by `state`.

// self
use crate::{
	_prelude::*,
	cache::{CacheNamespace, CacheRecord, RecordCache, TtlPolicy, take_field},
	store::{KvStore, StoreError},
};

/// Lifetime of a pending authorization attempt.
pub const FLOW_STATE_TTL: Duration = Duration::minutes(15);

/// Pending authorization attempt: the `state` it was issued under and its PKCE verifier.
#[derive(Clone, PartialEq, Eq)]
pub struct FlowState {
	/// Anti-CSRF value echoed back by the identity provider.
	pub state: String,
	/// PKCE code verifier presented during the code exchange.
	pub verifier: String,
}
impl CacheRecord for FlowState {
	fn to_fields(&self) -> Result<Vec<(String, String)>, StoreError> {
		Ok(vec![("state".into(), self.state.clone()), ("verifier".into(), self.verifier.clone())])
	}

	fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, StoreError> {
		Ok(Self { state: take_field(&mut fields, "state"), verifier: take_field(&mut fields, "verifier") })
	}

	fn is_empty(&self) -> bool {
		self.state.is_empty() || self.verifier.is_empty()
	}
}
impl Debug for FlowState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FlowState").field("state", &self.state).field("verifier", &"<redacted>").finish()
	}
}

impl RecordCache<FlowState> {
	/// Flow-state cache with the fixed fifteen minute lifetime.
	pub fn flow_state(store: Arc<dyn KvStore>, prefix: impl Into<Arc<str>>) -> Self {
		Self::new(store, CacheNamespace::FlowState, prefix, TtlPolicy::Fixed(FLOW_STATE_TTL))
	}
}
