//! Dictionary and structured configuration sources for [`SdkContext`].

// crates.io
use serde::Deserializer;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	context::{ProxyConfig, SdkContext, Settings},
	error::ConfigError,
	secret::TokenSecret,
};

/// Settings recognized by [`SdkContext::apply_config`].
///
/// Every field is optional; absent fields leave the context untouched. Numeric settings are kept
/// as text so that malformed values can be ignored instead of rejected, matching the dictionary
/// source. Structured documents use PascalCase keys (`ClientId`, `RequestsTimeout`, ...) and may
/// provide numbers either as strings or as JSON numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContextConfig {
	/// OAuth client secret.
	#[serde(default, deserialize_with = "lenient_string")]
	pub client_secret: Option<String>,
	/// OAuth client id.
	#[serde(default, deserialize_with = "lenient_string")]
	pub client_id: Option<String>,
	/// Pre-issued access token.
	#[serde(default, deserialize_with = "lenient_string")]
	pub access_token: Option<String>,
	/// Application id.
	#[serde(default, deserialize_with = "lenient_string")]
	pub app_id: Option<String>,
	/// Per-attempt timeout in milliseconds.
	#[serde(default, deserialize_with = "lenient_string")]
	pub requests_timeout: Option<String>,
	/// Retry count.
	#[serde(default, deserialize_with = "lenient_string")]
	pub requests_retries: Option<String>,
	/// Proxy host.
	#[serde(default, deserialize_with = "lenient_string")]
	pub proxy_host_name: Option<String>,
	/// Proxy port.
	#[serde(default, deserialize_with = "lenient_string")]
	pub proxy_port: Option<String>,
	/// Proxy user.
	#[serde(default, deserialize_with = "lenient_string")]
	pub proxy_username: Option<String>,
	/// Proxy password.
	#[serde(default, deserialize_with = "lenient_string")]
	pub proxy_password: Option<String>,
}
impl ContextConfig {
	/// Reads the camelCase dictionary keys (`clientSecret`, `clientId`, `accessToken`, `appId`,
	/// `requestsTimeout`, `requestsRetries`, `proxyHostName`, `proxyPort`, `proxyUsername`,
	/// `proxyPassword`). Unrecognized keys are ignored.
	pub fn from_map(params: &HashMap<String, String>) -> Self {
		let read = |key: &str| params.get(key).cloned();

		Self {
			client_secret: read("clientSecret"),
			client_id: read("clientId"),
			access_token: read("accessToken"),
			app_id: read("appId"),
			requests_timeout: read("requestsTimeout"),
			requests_retries: read("requestsRetries"),
			proxy_host_name: read("proxyHostName"),
			proxy_port: read("proxyPort"),
			proxy_username: read("proxyUsername"),
			proxy_password: read("proxyPassword"),
		}
	}

	/// Parses a structured JSON document, reporting the path of the first invalid field.
	pub fn from_json_str(document: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(document);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::InvalidConfig { source }.into())
	}

	fn proxy(&self) -> Option<ProxyConfig> {
		let host = self.proxy_host_name.as_deref().filter(|host| !host.is_empty())?;
		let port = self.proxy_port.as_deref()?.trim().parse::<u16>().ok()?;
		let proxy = ProxyConfig::new(host, port);

		match (self.proxy_username.as_deref(), self.proxy_password.as_deref()) {
			(Some(user), Some(password)) if !user.is_empty() && !password.is_empty() =>
				Some(proxy.with_credentials(user, password)),
			_ => Some(proxy),
		}
	}
}

impl SdkContext {
	/// Applies dictionary-style settings. See [`ContextConfig::from_map`] for the keys.
	pub fn configure(&self, params: &HashMap<String, String>) -> Result<()> {
		self.apply_config(&ContextConfig::from_map(params))
	}

	/// Applies a [`ContextConfig`] atomically.
	///
	/// Write-once settings go through the same checks as their setters; if any of them fails the
	/// context is left unchanged. Malformed numbers keep the current value.
	pub fn apply_config(&self, config: &ContextConfig) -> Result<()> {
		let mut guard = self.settings.write();
		let mut next = guard.clone();

		apply(&mut next, config)?;

		*guard = next;

		Ok(())
	}
}

fn apply(settings: &mut Settings, config: &ContextConfig) -> Result<(), ConfigError> {
	if let Some(secret) = &config.client_secret {
		settings.set_client_secret(TokenSecret::new(secret.as_str()))?;
	}
	if let Some(id) = &config.client_id {
		settings.set_client_id(id.clone())?;
	}
	if let Some(token) = &config.access_token {
		settings.access_token = Some(TokenSecret::new(token.as_str()));
	}
	if let Some(app_id) = &config.app_id {
		settings.set_app_id(app_id.clone())?;
	}
	if let Some(millis) = config.requests_timeout.as_deref().and_then(parse_number::<u64>) {
		settings.requests_timeout = Duration::from_millis(millis);
	}
	if let Some(retries) = config.requests_retries.as_deref().and_then(parse_number::<u32>) {
		settings.requests_retries = retries;
	}
	if let Some(proxy) = config.proxy() {
		settings.proxy = Some(proxy);
	}

	Ok(())
}

fn parse_number<T>(raw: &str) -> Option<T>
where
	T: FromStr,
{
	raw.trim().parse().ok()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match <Option<Value>>::deserialize(deserializer)? {
		None | Some(Value::Null) => None,
		Some(Value::String(text)) => Some(text),
		Some(other) => Some(other.to_string()),
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
		entries.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn dictionary_keys_are_applied() {
		let context = SdkContext::new();

		context
			.configure(&map(&[
				("clientId", "A"),
				("clientSecret", "B"),
				("accessToken", "T0"),
				("appId", "app-1"),
				("requestsTimeout", "5000"),
				("requestsRetries", "1"),
				("proxyHostName", "proxy.local"),
				("proxyPort", "3128"),
				("proxyUsername", "ops"),
				("proxyPassword", "pw"),
				("somethingElse", "ignored"),
			]))
			.expect("Dictionary configuration should apply.");

		assert_eq!(context.client_id().as_deref(), Some("A"));
		assert_eq!(context.client_secret().map(|s| s.expose().to_owned()).as_deref(), Some("B"));
		assert_eq!(context.access_token().map(|s| s.expose().to_owned()).as_deref(), Some("T0"));
		assert_eq!(context.app_id().as_deref(), Some("app-1"));
		assert_eq!(context.requests_timeout(), Duration::from_millis(5000));
		assert_eq!(context.requests_retries(), 1);

		let proxy = context.proxy().expect("Proxy should be configured.");

		assert_eq!(proxy.url(), "http://proxy.local:3128");
		assert_eq!(proxy.credentials.map(|c| c.username).as_deref(), Some("ops"));
	}

	#[test]
	fn malformed_numbers_keep_current_values() {
		let context = SdkContext::new();

		context
			.configure(&map(&[
				("requestsTimeout", "soon"),
				("requestsRetries", "-2"),
				("proxyHostName", "proxy.local"),
				("proxyPort", "eighty"),
			]))
			.expect("Malformed numbers should be ignored.");

		assert_eq!(context.requests_timeout(), crate::context::DEFAULT_REQUESTS_TIMEOUT);
		assert_eq!(context.requests_retries(), crate::context::DEFAULT_REQUESTS_RETRIES);
		assert!(context.proxy().is_none());
	}

	#[test]
	fn failed_write_once_leaves_context_unchanged() {
		let context = SdkContext::new();

		context.set_client_id("A").expect("Client id fixture should be accepted.");

		let err = context
			.configure(&map(&[("clientSecret", "B"), ("clientId", "other")]))
			.expect_err("Conflicting client id should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::WriteOnce { field: "clientId" })));
		assert!(context.client_secret().is_none());
	}

	#[test]
	fn structured_document_accepts_strings_and_numbers() {
		let config = ContextConfig::from_json_str(
			r#"{"ClientId":"A","ClientSecret":"B","RequestsTimeout":2500,"RequestsRetries":"0"}"#,
		)
		.expect("Structured configuration should parse.");
		let context = SdkContext::new();

		context.apply_config(&config).expect("Structured configuration should apply.");

		assert_eq!(context.requests_timeout(), Duration::from_millis(2500));
		assert_eq!(context.requests_retries(), 0);
		assert!(context.client_credentials().is_some());
	}

	#[test]
	fn structured_document_rejects_invalid_json() {
		let err = ContextConfig::from_json_str(r#"{"ClientId":"A""#)
			.expect_err("Truncated documents should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidConfig { .. })));

		let err = ContextConfig::from_json_str(r#""ClientId=A""#)
			.expect_err("Documents must be objects.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidConfig { .. })));
	}
}
