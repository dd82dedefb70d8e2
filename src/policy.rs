//! Per-call execution policy.
//!
//! A [`RequestOptions`] value is built for one call and consumed by it. Values taken from an
//! [`SdkContext`] are copied at construction time, so later changes to the context do not affect
//! options that already exist.

// self
use crate::{
	_prelude::*,
	context::{DEFAULT_REQUESTS_RETRIES, DEFAULT_REQUESTS_TIMEOUT, ProxyConfig, SdkContext},
	http::TransportOptions,
	secret::TokenSecret,
};

/// Header carrying the platform id.
pub const PLATFORM_ID_HEADER: &str = "x-platform-id";
/// Header carrying the corporation id.
pub const CORPORATION_ID_HEADER: &str = "x-corporation-id";
/// Header carrying the integrator id.
pub const INTEGRATOR_ID_HEADER: &str = "x-integrator-id";

/// Timeout, retry, proxy, and header settings for one call.
#[derive(Clone, Debug)]
pub struct RequestOptions {
	/// Token that overrides the context's access token for this call.
	pub access_token: Option<TokenSecret>,
	/// Per-attempt timeout.
	pub timeout: Duration,
	/// Retries after transport failures; total attempts are `retries + 1`.
	pub retries: u32,
	/// Proxy for this call.
	pub proxy: Option<ProxyConfig>,
	custom_headers: BTreeMap<String, String>,
	tracking_headers: TrackingHeaders,
}
impl RequestOptions {
	/// Snapshots timeout, retries, proxy, and tracking ids from `context`.
	pub fn from_context(context: &SdkContext) -> Self {
		let transport = context.transport_options();

		Self {
			access_token: None,
			timeout: transport.timeout,
			retries: context.requests_retries(),
			proxy: transport.proxy,
			custom_headers: BTreeMap::new(),
			tracking_headers: TrackingHeaders::from_context(context),
		}
	}

	/// Overrides the access token for this call.
	pub fn with_access_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.access_token = Some(token.into());

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the retry count.
	pub fn with_retries(mut self, retries: u32) -> Self {
		self.retries = retries;

		self
	}

	/// Overrides the proxy.
	pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
		self.proxy = proxy;

		self
	}

	/// Adds or replaces a caller header.
	///
	/// Caller `accept` and `user-agent` values replace the SDK defaults. `content-type`,
	/// `authorization`, `x-product-id`, `x-tracking-id`, and the tracking headers are always set by
	/// the SDK and override caller values. Names that differ only in case fail the call with
	/// [`ConfigError::DuplicateHeader`](crate::error::ConfigError::DuplicateHeader).
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.custom_headers.insert(name.into(), value.into());

		self
	}

	/// Caller headers.
	pub fn custom_headers(&self) -> &BTreeMap<String, String> {
		&self.custom_headers
	}

	/// Mutable access to the caller headers.
	pub fn custom_headers_mut(&mut self) -> &mut BTreeMap<String, String> {
		&mut self.custom_headers
	}

	/// Tracking headers captured at construction time.
	pub fn tracking_headers(&self) -> &TrackingHeaders {
		&self.tracking_headers
	}

	/// Total attempts allowed by the retry count.
	pub fn max_attempts(&self) -> u32 {
		self.retries.saturating_add(1)
	}

	/// Transport settings applied to each attempt.
	pub fn transport_options(&self) -> TransportOptions {
		TransportOptions { timeout: self.timeout, proxy: self.proxy.clone() }
	}
}
impl Default for RequestOptions {
	fn default() -> Self {
		Self {
			access_token: None,
			timeout: DEFAULT_REQUESTS_TIMEOUT,
			retries: DEFAULT_REQUESTS_RETRIES,
			proxy: None,
			custom_headers: BTreeMap::new(),
			tracking_headers: TrackingHeaders::default(),
		}
	}
}

/// The three attribution headers attached to every API call.
///
/// Values are always present; ids that were never configured are sent as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackingHeaders {
	platform_id: String,
	corporation_id: String,
	integrator_id: String,
}
impl TrackingHeaders {
	/// Reads the tracking ids from `context`.
	pub fn from_context(context: &SdkContext) -> Self {
		Self {
			platform_id: context.platform_id().unwrap_or_default(),
			corporation_id: context.corporation_id().unwrap_or_default(),
			integrator_id: context.integrator_id().unwrap_or_default(),
		}
	}

	/// Header name/value pairs in a fixed order.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		[
			(PLATFORM_ID_HEADER, self.platform_id.as_str()),
			(CORPORATION_ID_HEADER, self.corporation_id.as_str()),
			(INTEGRATOR_ID_HEADER, self.integrator_id.as_str()),
		]
		.into_iter()
	}

	/// Looks up a tracking header by name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.iter().find(|(key, _)| *key == name).map(|(_, value)| value)
	}
}
