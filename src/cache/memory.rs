//! In-process [`ResponseCache`] with sliding expiration.

// crates.io
use moka::future::Cache;
// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, CacheKey, ResponseCache},
	response::ApiResponse,
};

/// Idle window after which an unread entry expires.
pub const DEFAULT_SLIDING_EXPIRATION: Duration = Duration::from_secs(60);
/// Upper bound on live entries.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Thread-safe response cache backed by `moka`.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct MemoryResponseCache(Cache<CacheKey, ApiResponse>);
impl MemoryResponseCache {
	/// Creates a cache with the default sliding expiration.
	pub fn new() -> Self {
		Self::with_sliding_expiration(DEFAULT_SLIDING_EXPIRATION)
	}

	/// Creates a cache whose entries expire after `idle` without reads.
	pub fn with_sliding_expiration(idle: Duration) -> Self {
		Self::with_settings(idle, DEFAULT_MAX_CAPACITY)
	}

	/// Creates a cache with an explicit idle window and capacity.
	pub fn with_settings(idle: Duration, max_capacity: u64) -> Self {
		Self(Cache::builder().time_to_idle(idle).max_capacity(max_capacity).build())
	}

	/// Approximate number of live entries after pending maintenance runs.
	pub async fn entry_count(&self) -> u64 {
		self.0.run_pending_tasks().await;

		self.0.entry_count()
	}
}
impl Default for MemoryResponseCache {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for MemoryResponseCache {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("MemoryResponseCache")
			.field("entry_count", &self.0.entry_count())
			.field("time_to_idle", &self.0.policy().time_to_idle())
			.finish()
	}
}
impl ResponseCache for MemoryResponseCache {
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<ApiResponse>> {
		Box::pin(async move { Ok(self.0.get(key).await) })
	}

	fn put<'a>(
		&'a self,
		key: &'a CacheKey,
		response: ApiResponse,
	) -> CacheFuture<'a, ApiResponse> {
		Box::pin(async move { Ok(self.0.entry(key.to_owned()).or_insert(response).await.into_value()) })
	}

	fn remove<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.0.invalidate(key).await;

			Ok(())
		})
	}
}
