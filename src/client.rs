//! Authenticated API client: credential management plus the request executor.

mod credentials;
mod execute;

pub use credentials::TOKEN_PATH;

// crates.io
use oauth2::{
	HttpRequest,
	http::{HeaderMap, HeaderName, HeaderValue, Request},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	cache::{CacheKey, MemoryResponseCache, ResponseCache},
	context::SdkContext,
	error::ConfigError,
	http::{ApiHttpClient, TransportErrorMapper},
	request::{ApiRequest, HttpMethod},
	response::ApiResponse,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestSdkClient = Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Executes authenticated calls against the API on behalf of one [`SdkContext`].
///
/// The client owns the transport, the transport error mapper, and the response cache. Credentials
/// and defaults are read from the shared context at call time, so several clients may share one
/// context. Clones share the cache and the single-flight guards.
pub struct Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Settings and credentials shared with the caller.
	pub context: Arc<SdkContext>,
	/// Transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Response cache consulted by cacheable calls.
	pub cache: Arc<dyn ResponseCache>,
	token_guard: Arc<AsyncMutex<()>>,
	cache_guards: CacheGuards,
}
impl<C, M> Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair and an in-memory
	/// response cache.
	pub fn with_http_client(
		context: Arc<SdkContext>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			context,
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			cache: Arc::new(MemoryResponseCache::new()),
			token_guard: Default::default(),
			cache_guards: Default::default(),
		}
	}

	/// Replaces the response cache.
	pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
		self.cache = cache;

		self
	}

	/// `GET {path}` with context defaults.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.execute(ApiRequest::get(path), None).await
	}

	/// `POST {path}` with a JSON payload and context defaults.
	pub async fn post(&self, path: impl Into<String>, payload: Value) -> Result<ApiResponse> {
		self.execute(ApiRequest::post(path, payload), None).await
	}

	/// `PUT {path}` with a JSON payload and context defaults.
	pub async fn put(&self, path: impl Into<String>, payload: Value) -> Result<ApiResponse> {
		self.execute(ApiRequest::put(path, payload), None).await
	}

	/// `DELETE {path}` with context defaults.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.execute(ApiRequest::delete(path), None).await
	}

	/// Resolves `path` against the context base URL; absolute URLs pass through.
	pub fn resolve_url(&self, path: &str) -> Result<Url> {
		let text = if path.starts_with("http://") || path.starts_with("https://") {
			path.to_owned()
		} else {
			format!("{}/{}", self.context.base_url(), path.trim_start_matches('/'))
		};

		Url::parse(&text).map_err(|source| ConfigError::InvalidUrl { url: text, source }.into())
	}

	/// Leases the single-flight guard for a cache key, creating it on demand.
	///
	/// The entry is dropped from the guard map when the last lease for the key goes away.
	fn cache_guard(&self, key: &CacheKey) -> CacheGuardLease {
		let guard = self
			.cache_guards
			.lock()
			.entry(key.clone())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone();

		CacheGuardLease { guards: self.cache_guards.clone(), key: key.clone(), guard }
	}

	/// Headers the SDK attaches to every outbound call. A caller-supplied `user-agent` is kept.
	fn identity_headers(&self, headers: &mut HeaderMap) -> Result<(), ConfigError> {
		if !headers.contains_key("user-agent") {
			let user_agent = format!("{}/{}", self.context.client_name(), self.context.version());

			insert_header(headers, "user-agent", &user_agent)?;
		}

		insert_header(headers, "x-product-id", self.context.product_id())?;
		insert_header(headers, "x-tracking-id", self.context.tracking_id())
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client that provisions its own reqwest-backed transport.
	pub fn new(context: Arc<SdkContext>) -> Self {
		Self::with_http_client(
			context,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Clone for Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			context: self.context.clone(),
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			cache: self.cache.clone(),
			token_guard: self.token_guard.clone(),
			cache_guards: self.cache_guards.clone(),
		}
	}
}
impl<C, M> Debug for Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("base_url", &self.context.base_url())
			.field("client_id", &self.context.client_id())
			.field("access_token_set", &self.context.access_token().is_some())
			.finish()
	}
}

type CacheGuards = Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>;

/// Shared handle on one cache key's single-flight guard.
pub(crate) struct CacheGuardLease {
	guards: CacheGuards,
	key: CacheKey,
	guard: Arc<AsyncMutex<()>>,
}
impl CacheGuardLease {
	pub(crate) async fn lock(&self) -> async_lock::MutexGuard<'_, ()> {
		self.guard.lock().await
	}
}
impl Drop for CacheGuardLease {
	fn drop(&mut self) {
		let mut guards = self.guards.lock();

		// Leases are only cloned out of the map while it is locked, so the count is stable here.
		if guards.get(&self.key).is_some_and(|guard| Arc::ptr_eq(guard, &self.guard))
			&& Arc::strong_count(&self.guard) == 2
		{
			guards.remove(&self.key);
		}
	}
}

/// Fully built request, replayed on every attempt.
#[derive(Clone, Debug)]
pub(crate) struct PreparedRequest {
	pub(crate) method: HttpMethod,
	pub(crate) url: Url,
	pub(crate) headers: HeaderMap,
	pub(crate) body: Vec<u8>,
}
impl PreparedRequest {
	pub(crate) fn to_http(&self) -> Result<HttpRequest> {
		let mut request = Request::builder()
			.method(self.method.to_http())
			.uri(self.url.as_str())
			.body(self.body.clone())
			.map_err(ConfigError::from)?;

		*request.headers_mut() = self.headers.clone();

		Ok(request)
	}
}

pub(crate) fn insert_header(
	headers: &mut HeaderMap,
	name: &str,
	value: &str,
) -> Result<(), ConfigError> {
	let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
	let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
	let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

	headers.insert(header_name, header_value);

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_insertion_validates_names_and_values() {
		let mut headers = HeaderMap::new();

		insert_header(&mut headers, "X-Idempotency-Key", "abc").expect("Valid header.");

		assert_eq!(headers.get("x-idempotency-key").map(HeaderValue::as_bytes), Some(&b"abc"[..]));
		assert!(matches!(
			insert_header(&mut headers, "bad header", "v"),
			Err(ConfigError::InvalidHeader { .. })
		));
		assert!(matches!(
			insert_header(&mut headers, "x-ok", "line\nbreak"),
			Err(ConfigError::InvalidHeader { .. })
		));
	}

	#[test]
	fn prepared_requests_replay_identically() {
		let prepared = PreparedRequest {
			method: HttpMethod::Put,
			url: Url::parse("https://api.mercadopago.com/v1/payments/1").expect("Valid URL."),
			headers: HeaderMap::new(),
			body: b"{}".to_vec(),
		};
		let first = prepared.to_http().expect("Request should build.");
		let second = prepared.to_http().expect("Request should build again.");

		assert_eq!(first.method(), second.method());
		assert_eq!(first.uri(), second.uri());
		assert_eq!(first.body(), second.body());
		assert_eq!(first.method().as_str(), "PUT");
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn cache_guards_are_released_by_the_last_lease() {
		let (client, _context) =
			crate::_preludet::build_reqwest_test_client("http://127.0.0.1:9", "id", "secret");
		let key = CacheKey::new("GET http://127.0.0.1:9/v1/payment_methods");
		let first = client.cache_guard(&key);
		let second = client.cache_guard(&key);

		assert_eq!(client.cache_guards.lock().len(), 1);

		{
			let _held = first.lock().await;
		}

		drop(first);

		assert_eq!(client.cache_guards.lock().len(), 1);

		drop(second);

		assert!(client.cache_guards.lock().is_empty());
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn distinct_cached_calls_leave_no_guards_behind() {
		// crates.io
		use httpmock::prelude::*;

		let server = MockServer::start_async().await;
		let (client, context) =
			crate::_preludet::build_reqwest_test_client(&server.base_url(), "id", "secret");
		let client = client.with_cache(Arc::new(MemoryResponseCache::with_sliding_expiration(
			Duration::from_millis(1),
		)));

		context.set_access_token("T1");

		let mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/v1/payments/search");
				then.status(200).header("content-type", "application/json").body("[]");
			})
			.await;

		for offset in 0..50 {
			client
				.execute(ApiRequest::get(format!("/v1/payments/search?offset={offset}")).cached(), None)
				.await
				.expect("Cached call should succeed.");
		}

		mock.assert_calls_async(50).await;

		assert!(client.cache_guards.lock().is_empty());
	}
}
