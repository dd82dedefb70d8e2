//! SDK-level error types shared by the context, credential manager, cache, and executor.

// self
use crate::_prelude::*;

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Missing or invalid local settings.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The remote API answered, but not with what the SDK expected.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Connection or timeout failure.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response cache failure.
	#[error("{0}")]
	Cache(#[from] crate::cache::CacheError),
}
impl Error {
	/// Returns `true` when the failure happened while talking to the network and another attempt
	/// may succeed.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Configuration and validation failures raised by the SDK.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A write-once setting already holds a value.
	#[error("{field} setting can not be changed.")]
	WriteOnce {
		/// Name of the protected setting.
		field: &'static str,
	},
	/// Client id or client secret is missing.
	#[error("client_id and client_secret must be set before requesting an access token.")]
	MissingClientCredentials,
	/// No refresh token is stored on the context.
	#[error("A refresh token is required to refresh the access token.")]
	MissingRefreshToken,
	/// The base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request URL cannot be resolved against the base URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Two caller headers differ only in case and would collapse into one HTTP header.
	#[error("Header `{name}` is set more than once.")]
	DuplicateHeader {
		/// Second spelling of the header name.
		name: String,
	},
	/// The payload cannot be encoded with the declared payload type.
	#[error("Payload cannot be encoded: {reason}.")]
	InvalidPayload {
		/// Why encoding failed.
		reason: String,
	},
	/// Proxy settings cannot be turned into a usable proxy.
	#[error("Proxy `{proxy}` is invalid.")]
	InvalidProxy {
		/// Proxy address.
		proxy: String,
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
	/// Structured configuration document could not be parsed.
	#[error("Configuration document is invalid.")]
	InvalidConfig {
		/// Parsing failure annotated with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
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
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// The remote API responded, but the exchange did not produce the expected data.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Token endpoint answered with a non-200 status.
	#[error("Can not retrieve the access token: token endpoint returned HTTP {status}.")]
	TokenStatus {
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint body is not JSON.
	#[error("Can not retrieve the access token: token endpoint returned a non-JSON body.")]
	MalformedTokenResponse {
		/// HTTP status code.
		status: u16,
	},
	/// A token field is missing, duplicated, or empty.
	#[error("Can not retrieve the {field}: found {matches} usable occurrences, expected exactly one.")]
	TokenField {
		/// Field name searched in the token response.
		field: &'static str,
		/// Number of usable occurrences found.
		matches: usize,
	},
	/// Non-2xx API response whose body cannot be parsed for diagnosis.
	#[error("API returned HTTP {status} with an unreadable body: {body_preview}")]
	UnexpectedResponse {
		/// HTTP status code.
		status: u16,
		/// Truncated raw body.
		body_preview: String,
	},
	/// Response body does not match the requested type.
	#[error("API response could not be decoded at `{path}`.", path = .source.path())]
	Decode {
		/// Path-aware decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, timeouts, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The attempt exceeded its timeout.
	#[error("Request timed out while calling the API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
	/// HTTP client failure described only by a message.
	#[error("HTTP client error occurred while calling the API: {message}.")]
	Other {
		/// Client-supplied description.
		message: String,
	},
	/// Every allowed attempt failed.
	#[error("Request failed after {attempts} attempts.")]
	Exhausted {
		/// Number of attempts performed.
		attempts: u32,
		/// Failure observed on the final attempt.
		#[source]
		last: Box<TransportError>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
