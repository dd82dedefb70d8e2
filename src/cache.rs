//! Response cache contract and the built-in in-memory implementation.

pub mod memory;

pub use memory::MemoryResponseCache;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde_json::Value;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, request::HttpMethod, response::ApiResponse};

/// Boxed future returned by [`ResponseCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract for cached API responses.
///
/// Entries expire after going unread for the backend's sliding window; every successful read
/// restarts that window.
pub trait ResponseCache
where
	Self: Send + Sync,
{
	/// Returns the live entry for `key`, refreshing its expiration.
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<ApiResponse>>;

	/// Get-or-create: stores `response` when `key` has no live entry and returns whichever
	/// entry is live afterwards.
	fn put<'a>(
		&'a self,
		key: &'a CacheKey,
		response: ApiResponse,
	) -> CacheFuture<'a, ApiResponse>;

	/// Evicts `key`. Removing an absent key succeeds.
	fn remove<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()>;
}

/// Cache operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOperation {
	/// Lookup.
	Get,
	/// Get-or-create insert.
	Add,
	/// Eviction.
	Remove,
}
impl CacheOperation {
	/// Upper-case label used in error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Add => "ADD",
			Self::Remove => "REMOVE",
		}
	}
}
impl Display for CacheOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`ResponseCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("An error has occurred in the cache structure ({operation}): {message}.")]
pub struct CacheError {
	/// Failed operation.
	pub operation: CacheOperation,
	/// Backend-supplied description.
	pub message: String,
}
impl CacheError {
	/// Creates a new cache error.
	pub fn new(operation: CacheOperation, message: impl Into<String>) -> Self {
		Self { operation, message: message.into() }
	}
}

/// Key identifying one cacheable request.
///
/// Built from the method, the normalized URL (fragment dropped, query pairs sorted) and, when
/// present, a fingerprint of the payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);
impl CacheKey {
	/// Wraps a precomputed key.
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	/// Derives the key for a request.
	pub fn for_request(method: HttpMethod, url: &Url, payload: Option<&Value>) -> Self {
		let mut key = format!("{method} {}", normalize_url(url));

		if let Some(payload) = payload {
			key.push('#');
			key.push_str(&payload_fingerprint(payload));
		}

		Self(key)
	}

	/// Returns the key text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn normalize_url(url: &Url) -> String {
	let mut normalized = url.clone();
	let mut pairs = url.query_pairs().into_owned().collect::<Vec<_>>();

	normalized.set_fragment(None);

	if pairs.is_empty() {
		normalized.set_query(None);
	} else {
		pairs.sort();
		normalized.query_pairs_mut().clear().extend_pairs(pairs);
	}

	normalized.into()
}

fn payload_fingerprint(payload: &Value) -> String {
	let digest = Sha256::digest(payload.to_string().as_bytes());

	STANDARD_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn url(text: &str) -> Url {
		Url::parse(text).expect("Test URL should parse.")
	}

	#[test]
	fn keys_ignore_query_order_and_fragments() {
		let a = CacheKey::for_request(
			HttpMethod::Get,
			&url("https://api.mercadopago.com/v1/payments/search?b=2&a=1#top"),
			None,
		);
		let b = CacheKey::for_request(
			HttpMethod::Get,
			&url("https://API.mercadopago.com:443/v1/payments/search?a=1&b=2"),
			None,
		);

		assert_eq!(a, b);
		assert_eq!(a.as_str(), "GET https://api.mercadopago.com/v1/payments/search?a=1&b=2");
	}

	#[test]
	fn keys_separate_methods_and_payloads() {
		let target = url("https://api.mercadopago.com/v1/payments");
		let get = CacheKey::for_request(HttpMethod::Get, &target, None);
		let post = CacheKey::for_request(HttpMethod::Post, &target, None);
		let first = CacheKey::for_request(HttpMethod::Post, &target, Some(&json!({"amount": 1})));
		let second = CacheKey::for_request(HttpMethod::Post, &target, Some(&json!({"amount": 2})));

		assert_ne!(get, post);
		assert_ne!(first, second);
		assert!(first.as_str().starts_with("POST https://api.mercadopago.com/v1/payments#"));
	}

	#[test]
	fn cache_error_names_operation() {
		let err = CacheError::new(CacheOperation::Remove, "locked");

		assert_eq!(err.to_string(), "An error has occurred in the cache structure (REMOVE): locked.");
	}
}
