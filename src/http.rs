//! Transport primitives for API and token calls.
//!
//! [`ApiHttpClient`] is the SDK's only dependency on an HTTP stack. The executor asks it for a
//! short-lived [`AsyncHttpClient`] handle configured with the call's [`TransportOptions`]
//! (per-attempt timeout and proxy) and reuses that handle for every retry of the call. Transport
//! failures come back as [`HttpClientError`] values which a [`TransportErrorMapper`] turns into
//! SDK errors; only [`Error::Transport`] results are retried.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	context::ProxyConfig,
	error::{ConfigError, TransportError},
};

/// Settings applied to every attempt of one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportOptions {
	/// Per-attempt timeout; zero disables the timeout.
	pub timeout: Duration,
	/// Proxy used for the call.
	pub proxy: Option<ProxyConfig>,
}

/// Abstraction over HTTP transports able to execute SDK calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back many clients, and
/// the handles they return must own whatever state they need so request futures stay `Send`.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle configured for one call.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle that applies `options` to each request it sends.
	fn with_options(&self, options: &TransportOptions) -> Result<Self::Handle>;
}

/// Maps HTTP transport failures into SDK [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an SDK error.
	fn map_transport_error(&self, error: HttpClientError<E>) -> Error;
}

/// Mapper for transports without richer error classification: every transport error is a
/// network failure.
#[derive(Clone, Debug, Default)]
pub struct GenericTransportErrorMapper;
impl<E> TransportErrorMapper<E> for GenericTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, err: HttpClientError<E>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			other => map_non_transport_variant(other),
		}
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
			other => map_non_transport_variant(other),
		}
	}
}

fn map_non_transport_variant<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		_ => TransportError::Other { message: "unrecognized HTTP client failure".into() }.into(),
	}
}

/// Reqwest transport that keeps one client per proxy configuration.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	proxied: Arc<Mutex<HashMap<ProxyConfig, ReqwestClient>>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`] used for calls without a proxy.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, proxied: Default::default() }
	}

	fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<ReqwestClient> {
		let Some(proxy) = proxy else {
			return Ok(self.client.clone());
		};
		let mut proxied = self.proxied.lock();

		if let Some(client) = proxied.get(proxy) {
			return Ok(client.clone());
		}

		let invalid = |source: ReqwestError| ConfigError::InvalidProxy {
			proxy: proxy.url(),
			source: Box::new(source),
		};
		let mut upstream = reqwest::Proxy::all(proxy.url()).map_err(invalid)?;

		if let Some(credentials) = &proxy.credentials {
			upstream = upstream.basic_auth(&credentials.username, credentials.password.expose());
		}

		let client = ReqwestClient::builder().proxy(upstream).build().map_err(ConfigError::from)?;

		proxied.insert(proxy.clone(), client.clone());

		Ok(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn with_options(&self, options: &TransportOptions) -> Result<Self::Handle> {
		let client = self.client_for(options.proxy.as_ref())?;
		let timeout = Some(options.timeout).filter(|timeout| !timeout.is_zero());

		Ok(ReqwestHandle(Arc::new(ReqwestHandleInner { client, timeout })))
	}
}

#[cfg(feature = "reqwest")]
struct ReqwestHandleInner {
	client: ReqwestClient,
	timeout: Option<Duration>,
}

/// Handle returned by [`ReqwestHttpClient`]; applies the per-attempt timeout.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(Arc<ReqwestHandleInner>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			let mut request: reqwest::Request = request.try_into().map_err(Box::new)?;

			*request.timeout_mut() = inner.timeout;

			let response = inner.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
