//! Request executor: token resolution, cache lookup, encoding, headers, and the retry loop.

// crates.io
use oauth2::{AsyncHttpClient, http::HeaderMap};
// self
use crate::{
	_prelude::*,
	cache::CacheKey,
	client::{Client, PreparedRequest, insert_header},
	error::{ConfigError, ProtocolError, TransportError},
	http::{ApiHttpClient, TransportErrorMapper, TransportOptions},
	obs::{self, CallKind, CallOutcome, CallSpan},
	policy::RequestOptions,
	request::ApiRequest,
	response::ApiResponse,
	secret::TokenSecret,
};

impl<C, M> Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Executes `request` with `options`, or with the context defaults when `options` is `None`.
	///
	/// Transport failures are retried up to `options.retries` times. Non-2xx responses are
	/// returned as-is when their body is JSON and rejected with
	/// [`ProtocolError::UnexpectedResponse`] otherwise. Cacheable requests are answered from the
	/// response cache when possible and successful replies are stored with get-or-create
	/// semantics, so the returned value is whichever entry the cache holds.
	pub async fn execute(
		&self,
		request: ApiRequest,
		options: Option<RequestOptions>,
	) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::ApiRequest;

		let span = CallSpan::new(KIND, "execute");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let options =
					options.unwrap_or_else(|| RequestOptions::from_context(&self.context));
				let token = self.ensure_access_token(&options).await?;
				let url = self.resolve_url(&request.path)?;

				if !request.cacheable {
					return self.fetch(&request, url, &options, &token).await;
				}

				let key = CacheKey::for_request(request.method, &url, request.payload.as_ref());
				let guard = self.cache_guard(&key);
				let _singleflight = guard.lock().await;

				if let Some(hit) = self.cache.get(&key).await? {
					obs::trace_cache_hit(key.as_str());
					obs::record_call_outcome(KIND, CallOutcome::CacheHit);

					return Ok(hit);
				}

				let response = self.fetch(&request, url, &options, &token).await?;

				if !response.is_success() {
					return Ok(response);
				}

				Ok(self.cache.put(&key, response).await?)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn fetch(
		&self,
		request: &ApiRequest,
		url: Url,
		options: &RequestOptions,
		token: &TokenSecret,
	) -> Result<ApiResponse> {
		let encoded = request.encode_body()?;
		let mut headers = HeaderMap::new();

		for (name, value) in options.custom_headers() {
			if headers.contains_key(name.to_ascii_lowercase().as_str()) {
				return Err(ConfigError::DuplicateHeader { name: name.to_owned() }.into());
			}

			insert_header(&mut headers, name, value)?;
		}

		if !headers.contains_key("accept") {
			insert_header(&mut headers, "accept", "application/json")?;
		}

		if let Some((_, content_type)) = &encoded {
			insert_header(&mut headers, "content-type", content_type)?;
		}

		self.identity_headers(&mut headers)?;
		insert_header(&mut headers, "authorization", &format!("Bearer {}", token.expose()))?;

		for (name, value) in options.tracking_headers().iter() {
			insert_header(&mut headers, name, value)?;
		}

		let prepared = PreparedRequest {
			method: request.method,
			url,
			headers,
			body: encoded.map(|(body, _)| body).unwrap_or_default(),
		};
		let response = self
			.dispatch(
				CallKind::ApiRequest,
				&prepared,
				options.max_attempts(),
				&options.transport_options(),
			)
			.await?;

		if !response.is_success() && response.json.is_none() {
			return Err(ProtocolError::UnexpectedResponse {
				status: response.status,
				body_preview: response.body_preview(),
			}
			.into());
		}

		Ok(response)
	}

	/// Sends `prepared` up to `max_attempts` times, retrying transport failures only.
	///
	/// When more than one attempt was made and all of them failed, the last failure is wrapped
	/// in [`TransportError::Exhausted`].
	pub(crate) async fn dispatch(
		&self,
		kind: CallKind,
		prepared: &PreparedRequest,
		max_attempts: u32,
		transport: &TransportOptions,
	) -> Result<ApiResponse> {
		let handle = self.http_client.with_options(transport)?;
		let max_attempts = max_attempts.max(1);
		let mut attempt = 0;

		loop {
			attempt += 1;

			let failure = match handle.call(prepared.to_http()?).await {
				Ok(response) => return Ok(ApiResponse::from_http(response)),
				Err(e) => match self.transport_mapper.map_transport_error(e) {
					Error::Transport(failure) => failure,
					other => return Err(other),
				},
			};

			if attempt >= max_attempts {
				return Err(if attempt == 1 {
					failure.into()
				} else {
					TransportError::Exhausted { attempts: attempt, last: Box::new(failure) }.into()
				});
			}

			obs::trace_retry(kind, attempt, max_attempts, &failure);
			obs::record_retry(kind);
		}
	}
}
