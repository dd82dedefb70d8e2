//! OAuth token exchanges against `{baseUrl}/oauth/token`.
//!
//! Both grants post a form body and scan the JSON reply for the token fields at any depth. A
//! field counts only when it occurs exactly once; the access token must also be non-empty.
//! Token calls use the context's timeout and proxy and are never retried.

// crates.io
use oauth2::http::HeaderMap;
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	client::{Client, PreparedRequest, insert_header},
	error::{ConfigError, ProtocolError},
	http::{ApiHttpClient, TransportErrorMapper},
	json::{field_text, find_unique_field},
	obs::{self, CallKind, CallOutcome, CallSpan},
	policy::RequestOptions,
	request::{HttpMethod, PayloadType},
	secret::TokenSecret,
};

/// Token endpoint path relative to the base URL.
pub const TOKEN_PATH: &str = "/oauth/token";

impl<C, M> Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs the `client_credentials` grant and stores the issued tokens on the context.
	///
	/// Fails with [`ConfigError::MissingClientCredentials`] before any network call when the
	/// client id or secret is unset.
	pub async fn acquire_token(&self) -> Result<TokenSecret> {
		const KIND: CallKind = CallKind::AccessToken;

		let span = CallSpan::new(KIND, "acquire_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (client_id, client_secret) = self
					.context
					.client_credentials()
					.ok_or(ConfigError::MissingClientCredentials)?;
				let form = json!({
					"grant_type": "client_credentials",
					"client_id": client_id,
					"client_secret": client_secret.expose(),
				});
				let document = self.exchange_token(KIND, &form).await?;
				let access_token = access_token_from(&document)?;

				self.context.set_access_token(access_token.clone());

				if let Some(refresh_token) = refresh_token_from(&document) {
					self.context.set_refresh_token(refresh_token);
				}

				Ok(access_token)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Performs the `refresh_token` grant with the stored refresh token.
	///
	/// The new access token replaces the context's; the stored refresh token is left unchanged
	/// even when the reply carries a new one.
	pub async fn refresh_token(&self) -> Result<TokenSecret> {
		const KIND: CallKind = CallKind::RefreshToken;

		let span = CallSpan::new(KIND, "refresh_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let refresh_token =
					self.context.refresh_token().ok_or(ConfigError::MissingRefreshToken)?;
				let client_secret = self.context.client_secret();
				let form = json!({
					"grant_type": "refresh_token",
					"client_secret": client_secret.as_ref().map(TokenSecret::expose).unwrap_or_default(),
					"refresh_token": refresh_token.expose(),
				});
				let document = self.exchange_token(KIND, &form).await?;
				let access_token = access_token_from(&document)?;

				self.context.set_access_token(access_token.clone());

				Ok(access_token)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Resolves the token for one call: the options override, then the context token, then a
	/// fresh `client_credentials` exchange.
	///
	/// Concurrent callers that all find the context empty share a single exchange.
	pub async fn ensure_access_token(&self, options: &RequestOptions) -> Result<TokenSecret> {
		if let Some(token) = options.access_token.as_ref().filter(|token| !token.is_empty()) {
			return Ok(token.clone());
		}
		if let Some(token) = self.context.access_token() {
			return Ok(token);
		}

		let _singleflight = self.token_guard.lock().await;

		if let Some(token) = self.context.access_token() {
			return Ok(token);
		}

		self.acquire_token().await
	}

	async fn exchange_token(&self, kind: CallKind, form: &Value) -> Result<Value> {
		let mut headers = HeaderMap::new();

		insert_header(&mut headers, "content-type", PayloadType::Form.content_type())?;
		insert_header(&mut headers, "accept", "application/json")?;
		self.identity_headers(&mut headers)?;

		let prepared = PreparedRequest {
			method: HttpMethod::Post,
			url: self.resolve_url(TOKEN_PATH)?,
			headers,
			body: PayloadType::Form.encode(form)?,
		};
		let response = self.dispatch(kind, &prepared, 1, &self.context.transport_options()).await?;

		if response.status != 200 {
			return Err(ProtocolError::TokenStatus { status: response.status }.into());
		}

		response
			.json
			.ok_or_else(|| ProtocolError::MalformedTokenResponse { status: response.status }.into())
	}
}

fn access_token_from(document: &Value) -> Result<TokenSecret> {
	let field = "access_token";
	let token = find_unique_field(document, field)
		.map(field_text)
		.map_err(|matches| ProtocolError::TokenField { field, matches })?;

	if token.is_empty() {
		return Err(ProtocolError::TokenField { field, matches: 0 }.into());
	}

	Ok(token.into())
}

fn refresh_token_from(document: &Value) -> Option<TokenSecret> {
	find_unique_field(document, "refresh_token")
		.ok()
		.map(field_text)
		.filter(|token| !token.is_empty())
		.map(TokenSecret::from)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn access_token_requires_exactly_one_non_empty_match() {
		let one = json!({ "access_token": "T1", "token_type": "bearer" });
		let none = json!({ "token_type": "bearer" });
		let two = json!({ "access_token": "T1", "data": { "access_token": "T2" } });
		let empty = json!({ "access_token": "" });

		assert_eq!(access_token_from(&one).expect("One match is valid.").expose(), "T1");

		for (document, expected) in [(none, 0), (two, 2), (empty, 0)] {
			let err = access_token_from(&document).expect_err("Ambiguous documents must fail.");

			assert!(matches!(
				err,
				Error::Protocol(ProtocolError::TokenField { field: "access_token", matches })
					if matches == expected
			));
		}
	}

	#[test]
	fn refresh_token_is_optional() {
		assert_eq!(
			refresh_token_from(&json!({ "refresh_token": "R1" })).map(|t| t.expose().to_owned()),
			Some("R1".into())
		);
		assert!(refresh_token_from(&json!({})).is_none());
		assert!(
			refresh_token_from(&json!({ "refresh_token": "R1", "x": { "refresh_token": "R2" } }))
				.is_none()
		);
	}
}
