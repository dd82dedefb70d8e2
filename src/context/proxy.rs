//! Outbound proxy settings.

// self
use crate::{_prelude::*, secret::TokenSecret};

/// HTTP proxy used for API and token calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyConfig {
	/// Proxy host name (optionally with a scheme).
	pub host: String,
	/// Proxy port.
	pub port: u16,
	/// Basic credentials presented to the proxy.
	pub credentials: Option<ProxyCredentials>,
}
impl ProxyConfig {
	/// Creates an unauthenticated proxy.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self { host: host.into(), port, credentials: None }
	}

	/// Attaches basic credentials.
	pub fn with_credentials(
		mut self,
		username: impl Into<String>,
		password: impl Into<TokenSecret>,
	) -> Self {
		self.credentials =
			Some(ProxyCredentials { username: username.into(), password: password.into() });

		self
	}

	/// Proxy address in `scheme://host:port` form; `http` is assumed when no scheme is given.
	pub fn url(&self) -> String {
		if self.host.contains("://") {
			format!("{}:{}", self.host, self.port)
		} else {
			format!("http://{}:{}", self.host, self.port)
		}
	}
}
impl Display for ProxyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.url())
	}
}

/// Username/password pair for proxy authentication.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyCredentials {
	/// Proxy user.
	pub username: String,
	/// Proxy password.
	pub password: TokenSecret,
}
