//! Demonstrates configuring an SDK context from a settings dictionary, acquiring a token through
//! the client-credentials exchange, and serving a repeated lookup from the response cache.

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use mercadopago_sdk::{
	client::{Client, TOKEN_PATH},
	context::SdkContext,
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest,
	request::ApiRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expires_in\":21600}",
			);
		})
		.await;
	let methods_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/payment_methods").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":\"visa\",\"payment_type_id\":\"credit_card\"}]");
		})
		.await;
	let context = Arc::new(SdkContext::new());
	let settings = HashMap::from([
		("clientId".to_owned(), "demo-client".to_owned()),
		("clientSecret".to_owned(), "super-secret".to_owned()),
		("requestsTimeout".to_owned(), "5000".to_owned()),
		("requestsRetries".to_owned(), "1".to_owned()),
	]);

	context.configure(&settings)?;
	context.set_base_url(server.base_url())?;

	let http_client = ReqwestHttpClient::with_client(reqwest::Client::builder().build()?);
	let client = <Client<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		context.clone(),
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	);
	let request = ApiRequest::get("/v1/payment_methods").cached();
	let first = client.execute(request.clone(), None).await?;
	let second = client.execute(request, None).await?;

	println!("Payment methods (HTTP {}): {}.", first.status, first.body);
	println!("Served again from cache: {}.", first == second);
	println!("Refresh token stored: {}.", context.refresh_token().is_some());

	token_mock.assert_async().await;
	methods_mock.assert_async().await;

	Ok(())
}
