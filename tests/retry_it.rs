// std
use std::sync::atomic::{AtomicU32, Ordering};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::Response};
// self
use mercadopago_sdk::{
	_preludet::*,
	client::Client,
	context::SdkContext,
	error::TransportError,
	http::{ApiHttpClient, GenericTransportErrorMapper, TransportOptions},
	policy::RequestOptions,
	request::ApiRequest,
};

#[derive(Debug, ThisError)]
#[error("connection reset by peer")]
struct ConnectionReset;

/// Transport that fails a fixed number of times before answering `200 {}`.
#[derive(Clone, Default)]
struct FlakyTransport(Arc<FlakyState>);
#[derive(Default)]
struct FlakyState {
	failures: AtomicU32,
	calls: AtomicU32,
}
impl FlakyTransport {
	fn failing(failures: u32) -> Self {
		let transport = Self::default();

		transport.0.failures.store(failures, Ordering::SeqCst);

		transport
	}

	fn calls(&self) -> u32 {
		self.0.calls.load(Ordering::SeqCst)
	}
}
impl ApiHttpClient for FlakyTransport {
	type Handle = FlakyTransport;
	type TransportError = ConnectionReset;

	fn with_options(&self, _: &TransportOptions) -> Result<Self::Handle> {
		Ok(self.clone())
	}
}
impl<'c> AsyncHttpClient<'c> for FlakyTransport {
	type Error = HttpClientError<ConnectionReset>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, _: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.0.calls.fetch_add(1, Ordering::SeqCst);

			let remaining = self.0.failures.load(Ordering::SeqCst);

			if remaining > 0 {
				self.0.failures.store(remaining - 1, Ordering::SeqCst);

				return Err(HttpClientError::Reqwest(Box::new(ConnectionReset)));
			}

			Response::builder()
				.status(200)
				.body(b"{}".to_vec())
				.map_err(|e| HttpClientError::Other(e.to_string()))
		})
	}
}

type FlakyClient = Client<FlakyTransport, GenericTransportErrorMapper>;

fn build_client(transport: FlakyTransport) -> FlakyClient {
	let context = Arc::new(SdkContext::new());

	context.set_client_id("client-id").expect("A fresh context accepts a client id.");
	context.set_client_secret("client-secret").expect("A fresh context accepts a client secret.");

	Client::with_http_client(context, transport, GenericTransportErrorMapper)
}

fn options(client: &FlakyClient, retries: u32) -> RequestOptions {
	RequestOptions::from_context(&client.context).with_access_token("T1").with_retries(retries)
}

#[tokio::test]
async fn retries_transport_failures_until_success() {
	let transport = FlakyTransport::failing(2);
	let client = build_client(transport.clone());
	let response = client
		.execute(ApiRequest::get("/v1/payments/1"), Some(options(&client, 2)))
		.await
		.expect("Third attempt should succeed.");

	assert_eq!(response.status, 200);
	assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn exhausting_retries_reports_attempts() {
	let transport = FlakyTransport::failing(u32::MAX);
	let client = build_client(transport.clone());
	let err = client
		.execute(ApiRequest::get("/v1/payments/1"), Some(options(&client, 2)))
		.await
		.expect_err("Every attempt fails.");

	assert!(matches!(err, Error::Transport(TransportError::Exhausted { attempts: 3, .. })));
	assert!(err.is_transport());
	assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn zero_retries_makes_a_single_attempt() {
	let transport = FlakyTransport::failing(1);
	let client = build_client(transport.clone());
	let err = client
		.execute(ApiRequest::get("/v1/payments/1"), Some(options(&client, 0)))
		.await
		.expect_err("The only attempt fails.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn token_exchanges_are_not_retried() {
	let transport = FlakyTransport::failing(u32::MAX);
	let client = build_client(transport.clone());

	client.context.set_requests_retries(5);

	let err = client.get("/v1/payments/1").await.expect_err("Token exchange fails.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(transport.calls(), 1);
	assert!(client.context.access_token().is_none());
}
