//! Relying-party error types shared across flows, caches, providers, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport-independent classification of every [`Error`].
///
/// Host applications map these onto their own response codes; the crate never assumes an
/// HTTP status for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// A required input was missing or empty.
	ParameterEmpty,
	/// A referenced flow state or cache record was not found.
	NotExist,
	/// The identity provider rejected a credential-bearing call.
	Unauthorized,
	/// Configuration, transport, response, or storage failure.
	OperationFailed,
	/// A cached token's expiry has passed.
	TokenExpired,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs and response payloads.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::ParameterEmpty => "parameter_empty",
			ErrorKind::NotExist => "not_exist",
			ErrorKind::Unauthorized => "unauthorized",
			ErrorKind::OperationFailed => "operation_failed",
			ErrorKind::TokenExpired => "token_expired",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// A required argument was empty.
	#[error("Required parameter `{parameter}` is empty.")]
	ParameterEmpty {
		/// Name of the offending parameter.
		parameter: &'static str,
	},
	/// The referenced record does not exist (expired, consumed, or never created).
	#[error("The {what} does not exist.")]
	NotExist {
		/// Human-readable description of the missing record.
		what: &'static str,
	},
	/// The identity provider rejected the credential or the caller is not signed in.
	#[error("Unauthorized: {reason}")]
	Unauthorized {
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// The cached token is past its expiry instant.
	#[error("The access token has expired.")]
	TokenExpired,

	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Identity provider answered with an unexpected or malformed response.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Classifies the error into one of the transport-independent [`ErrorKind`]s.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::ParameterEmpty { .. } => ErrorKind::ParameterEmpty,
			Error::NotExist { .. } => ErrorKind::NotExist,
			Error::Unauthorized { .. } => ErrorKind::Unauthorized,
			Error::TokenExpired => ErrorKind::TokenExpired,
			Error::Storage(_) | Error::Config(_) | Error::Response(_) | Error::Transport(_) =>
				ErrorKind::OperationFailed,
		}
	}

	pub(crate) fn unauthorized(reason: impl Into<String>) -> Self {
		Self::Unauthorized { reason: reason.into() }
	}
}

/// Fails with [`Error::ParameterEmpty`] when `value` is empty.
pub(crate) fn require_non_empty(parameter: &'static str, value: &str) -> Result<()> {
	if value.is_empty() { Err(Error::ParameterEmpty { parameter }) } else { Ok(()) }
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// A configured URL cannot be parsed.
	#[error("The {name} value is not a valid URL.")]
	InvalidUrl {
		/// Setting or document field that carried the URL.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required environment variable is absent or empty.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Client identifier is empty.
	#[error("Client identifier is not configured.")]
	MissingClientId,
	/// Client secret is required for the requested operation.
	#[error("Client secret is not configured.")]
	MissingClientSecret,
	/// The identity provider endpoint is not configured.
	#[error("The {endpoint} endpoint is not configured.")]
	MissingEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// Requested scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Unexpected or malformed identity provider responses.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Endpoint returned a status outside its success set.
	#[error("The {endpoint} endpoint returned unexpected status {status}.")]
	UnexpectedStatus {
		/// Endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
	},
	/// Endpoint responded with JSON that could not be parsed.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	MalformedJson {
		/// Endpoint label.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint responded in a way the OAuth client could not interpret.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned an `expires_in` that does not fit the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint response could not be turned into a token record.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
