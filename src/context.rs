//! Process-scoped SDK configuration shared by every client and request.
//!
//! [`SdkContext`] is meant to be created once, configured at startup, and shared behind an
//! [`Arc`]. Identity settings (client id/secret, app id, tracking ids) are write-once: the first
//! non-blank value wins and later writes fail with [`ConfigError::WriteOnce`]. The access and
//! refresh tokens stay mutable so the credential manager can rotate them while calls are in
//! flight. Getters never perform I/O.

pub mod config;
pub mod proxy;
pub mod write_once;

pub use config::*;
pub use proxy::*;
pub use write_once::*;

// self
use crate::{_prelude::*, error::ConfigError, http::TransportOptions, secret::TokenSecret};

/// Default per-attempt timeout.
pub const DEFAULT_REQUESTS_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Default number of retries after a transport failure.
pub const DEFAULT_REQUESTS_RETRIES: u32 = 3;
/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";
/// Product identifier reported to the API.
pub const PRODUCT_ID: &str = "BC32BHVTRPP001U8NHL0";
/// Client name reported to the API.
pub const CLIENT_NAME: &str = "MercadoPago-SDK-Rust";
/// Default scope for client-side insight metrics.
pub const DEFAULT_METRICS_SCOPE: &str = "prod";
/// SDK version reported to the API.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared SDK configuration.
#[derive(Debug)]
pub struct SdkContext {
	settings: RwLock<Settings>,
	tracking_id: String,
}
impl SdkContext {
	/// Creates a context populated with the SDK defaults.
	pub fn new() -> Self {
		Self {
			settings: RwLock::new(Settings::default()),
			tracking_id: format!("platform:rust,type:SDK{VERSION},so;"),
		}
	}

	/// OAuth client id, when set.
	pub fn client_id(&self) -> Option<String> {
		self.settings.read().client_id.get().cloned()
	}

	/// Sets the OAuth client id (write-once).
	pub fn set_client_id(&self, value: impl Into<String>) -> Result<()> {
		Ok(self.settings.write().set_client_id(value.into())?)
	}

	/// OAuth client secret, when set.
	pub fn client_secret(&self) -> Option<TokenSecret> {
		self.settings.read().client_secret.get().cloned()
	}

	/// Sets the OAuth client secret (write-once).
	pub fn set_client_secret(&self, value: impl Into<TokenSecret>) -> Result<()> {
		Ok(self.settings.write().set_client_secret(value.into())?)
	}

	/// Returns the client id and secret when both are non-empty.
	pub fn client_credentials(&self) -> Option<(String, TokenSecret)> {
		let settings = self.settings.read();

		Some((settings.client_id.get()?.clone(), settings.client_secret.get()?.clone()))
	}

	/// Application id, when set.
	pub fn app_id(&self) -> Option<String> {
		self.settings.read().app_id.get().cloned()
	}

	/// Sets the application id (write-once).
	pub fn set_app_id(&self, value: impl Into<String>) -> Result<()> {
		Ok(self.settings.write().set_app_id(value.into())?)
	}

	/// Platform id sent as `x-platform-id`.
	pub fn platform_id(&self) -> Option<String> {
		self.settings.read().platform_id.get().cloned()
	}

	/// Sets the platform id (write-once).
	pub fn set_platform_id(&self, value: impl Into<String>) -> Result<()> {
		Ok(self.settings.write().platform_id.set("platformId", value.into())?)
	}

	/// Corporation id sent as `x-corporation-id`.
	pub fn corporation_id(&self) -> Option<String> {
		self.settings.read().corporation_id.get().cloned()
	}

	/// Sets the corporation id (write-once).
	pub fn set_corporation_id(&self, value: impl Into<String>) -> Result<()> {
		Ok(self.settings.write().corporation_id.set("corporationId", value.into())?)
	}

	/// Integrator id sent as `x-integrator-id`.
	pub fn integrator_id(&self) -> Option<String> {
		self.settings.read().integrator_id.get().cloned()
	}

	/// Sets the integrator id (write-once).
	pub fn set_integrator_id(&self, value: impl Into<String>) -> Result<()> {
		Ok(self.settings.write().integrator_id.set("integratorId", value.into())?)
	}

	/// Current access token. Never triggers acquisition.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.settings.read().access_token.clone().filter(|token| !token.is_empty())
	}

	/// Replaces the access token.
	pub fn set_access_token(&self, value: impl Into<TokenSecret>) {
		self.settings.write().access_token = Some(value.into());
	}

	/// Drops the access token so the next authorized call acquires a new one.
	pub fn clear_access_token(&self) {
		self.settings.write().access_token = None;
	}

	/// Current refresh token.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.settings.read().refresh_token.clone().filter(|token| !token.is_empty())
	}

	/// Replaces the refresh token.
	pub fn set_refresh_token(&self, value: impl Into<TokenSecret>) {
		self.settings.write().refresh_token = Some(value.into());
	}

	/// API base URL without a trailing slash.
	pub fn base_url(&self) -> String {
		self.settings.read().base_url.clone()
	}

	/// Overrides the API base URL (sandboxes, mock servers).
	pub fn set_base_url(&self, value: impl AsRef<str>) -> Result<()> {
		let parsed = Url::parse(value.as_ref())
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		self.settings.write().base_url = parsed.as_str().trim_end_matches('/').to_owned();

		Ok(())
	}

	/// Default per-attempt timeout.
	pub fn requests_timeout(&self) -> Duration {
		self.settings.read().requests_timeout
	}

	/// Sets the default per-attempt timeout.
	pub fn set_requests_timeout(&self, timeout: Duration) {
		self.settings.write().requests_timeout = timeout;
	}

	/// Default retry count.
	pub fn requests_retries(&self) -> u32 {
		self.settings.read().requests_retries
	}

	/// Sets the default retry count.
	pub fn set_requests_retries(&self, retries: u32) {
		self.settings.write().requests_retries = retries;
	}

	/// Default proxy.
	pub fn proxy(&self) -> Option<ProxyConfig> {
		self.settings.read().proxy.clone()
	}

	/// Sets or clears the default proxy.
	pub fn set_proxy(&self, proxy: Option<ProxyConfig>) {
		self.settings.write().proxy = proxy;
	}

	/// Scope label for client-side insight metrics.
	pub fn metrics_scope(&self) -> String {
		self.settings.read().metrics_scope.clone()
	}

	/// Sets the insight metrics scope.
	pub fn set_metrics_scope(&self, scope: impl Into<String>) {
		self.settings.write().metrics_scope = scope.into();
	}

	/// SDK version.
	pub fn version(&self) -> &'static str {
		VERSION
	}

	/// Product identifier.
	pub fn product_id(&self) -> &'static str {
		PRODUCT_ID
	}

	/// Client name.
	pub fn client_name(&self) -> &'static str {
		CLIENT_NAME
	}

	/// Tracking identifier describing the SDK build.
	pub fn tracking_id(&self) -> &str {
		&self.tracking_id
	}

	/// Transport settings for calls that do not carry their own [`RequestOptions`].
	///
	/// [`RequestOptions`]: crate::policy::RequestOptions
	pub fn transport_options(&self) -> TransportOptions {
		let settings = self.settings.read();

		TransportOptions { timeout: settings.requests_timeout, proxy: settings.proxy.clone() }
	}
}
impl Default for SdkContext {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Clone, Debug)]
struct Settings {
	client_id: WriteOnce<String>,
	client_secret: WriteOnce<TokenSecret>,
	app_id: WriteOnce<String>,
	platform_id: WriteOnce<String>,
	corporation_id: WriteOnce<String>,
	integrator_id: WriteOnce<String>,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	base_url: String,
	requests_timeout: Duration,
	requests_retries: u32,
	proxy: Option<ProxyConfig>,
	metrics_scope: String,
}
impl Settings {
	fn set_client_id(&mut self, value: String) -> Result<(), ConfigError> {
		self.client_id.set("clientId", value)
	}

	fn set_client_secret(&mut self, value: TokenSecret) -> Result<(), ConfigError> {
		self.client_secret.set("clientSecret", value)
	}

	fn set_app_id(&mut self, value: String) -> Result<(), ConfigError> {
		self.app_id.set("appId", value)
	}
}
impl Default for Settings {
	fn default() -> Self {
		Self {
			client_id: WriteOnce::Unset,
			client_secret: WriteOnce::Unset,
			app_id: WriteOnce::Unset,
			platform_id: WriteOnce::Unset,
			corporation_id: WriteOnce::Unset,
			integrator_id: WriteOnce::Unset,
			access_token: None,
			refresh_token: None,
			base_url: DEFAULT_BASE_URL.to_owned(),
			requests_timeout: DEFAULT_REQUESTS_TIMEOUT,
			requests_retries: DEFAULT_REQUESTS_RETRIES,
			proxy: None,
			metrics_scope: DEFAULT_METRICS_SCOPE.to_owned(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_id_is_write_once() {
		let context = SdkContext::new();

		context.set_client_id("A").expect("Setting the client id from empty should succeed.");

		let err = context.set_client_id("B").expect_err("Overwriting the client id should fail.");

		assert!(matches!(err, Error::Config(ConfigError::WriteOnce { field: "clientId" })));
		assert_eq!(context.client_id().as_deref(), Some("A"));
	}

	#[test]
	fn client_credentials_require_both_values() {
		let context = SdkContext::new();

		context.set_client_id("A").expect("Client id fixture should be accepted.");

		assert!(context.client_credentials().is_none());

		context.set_client_secret("B").expect("Client secret fixture should be accepted.");

		let (id, secret) =
			context.client_credentials().expect("Both credentials should now be available.");

		assert_eq!(id, "A");
		assert_eq!(secret.expose(), "B");
	}

	#[test]
	fn access_token_is_mutable_and_empty_means_absent() {
		let context = SdkContext::new();

		context.set_access_token("");

		assert!(context.access_token().is_none());

		context.set_access_token("T1");
		context.set_access_token("T2");

		assert_eq!(context.access_token().map(|t| t.expose().to_owned()).as_deref(), Some("T2"));

		context.clear_access_token();

		assert!(context.access_token().is_none());
	}

	#[test]
	fn base_url_is_validated_and_trimmed() {
		let context = SdkContext::new();

		assert_eq!(context.base_url(), DEFAULT_BASE_URL);

		context.set_base_url("http://127.0.0.1:8080/").expect("Mock base URL should parse.");

		assert_eq!(context.base_url(), "http://127.0.0.1:8080");
		assert!(context.set_base_url("not a url").is_err());
	}

	#[test]
	fn defaults_match_sdk_constants() {
		let context = SdkContext::new();

		assert_eq!(context.requests_timeout(), Duration::from_millis(30_000));
		assert_eq!(context.requests_retries(), 3);
		assert!(context.proxy().is_none());
		assert!(context.tracking_id().contains(VERSION));
		assert_eq!(context.metrics_scope(), DEFAULT_METRICS_SCOPE);
	}

	#[test]
	fn metrics_scope_is_mutable() {
		let context = SdkContext::new();

		context.set_metrics_scope("sandbox");
		context.set_metrics_scope("test");

		assert_eq!(context.metrics_scope(), "test");
	}
}
