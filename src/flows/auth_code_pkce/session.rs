// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::ScopeSet, cache::FlowState, flows::common, provider::ProviderDescriptor};

const STATE_LEN: usize = 32;
// Uppercase letters and digits without the easily confused `I`, `O`, `0`, and `1`.
const STATE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Result of [`OAuthFlow::login`](crate::flows::OAuthFlow::login): the persisted attempt and
/// the URL the user agent should be redirected to.
#[derive(Clone, Debug)]
pub struct LoginRedirect {
	/// Persisted flow state.
	pub flow_state: FlowState,
	/// Fully-formed authorize URL.
	pub authorize_url: Url,
}

pub(super) fn generate_flow_state() -> FlowState {
	FlowState { state: random_state(STATE_LEN), verifier: random_string(PKCE_VERIFIER_LEN) }
}

pub(super) fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	flow_state: &FlowState,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope_value) = common::format_scope(scope) {
		pairs.append_pair("scope", &scope_value);
	}

	pairs.append_pair("state", &flow_state.state);
	pairs.append_pair("code_challenge", &compute_pkce_challenge(&flow_state.verifier));
	pairs.append_pair("code_challenge_method", PkceCodeChallengeMethod::S256.as_str());

	drop(pairs);

	url
}

pub(crate) fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(verifier.as_bytes());
	let digest = hasher.finalize();
	URL_SAFE_NO_PAD.encode(digest)
}

fn random_state(len: usize) -> String {
	let mut rng = rand::rng();

	(0..len).map(|_| char::from(STATE_CHARSET[rng.random_range(0..STATE_CHARSET.len())])).collect()
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
