//! API responses as returned to callers and stored in the response cache.

// crates.io
use oauth2::{HttpResponse, http::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{_prelude::*, error::ProtocolError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Status, headers, and body of one API response.
///
/// `json` holds the parsed body whenever the body is valid JSON; callers branch on `status`
/// themselves since non-2xx responses with a readable body are returned, not raised.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body decoded as UTF-8 (lossy).
	pub body: String,
	/// Parsed body, when the body is JSON.
	pub json: Option<Value>,
	/// Instant the response was received.
	pub received_at: OffsetDateTime,
}
impl ApiResponse {
	/// Builds a response from a status and raw body; headers start empty.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		let body = body.into();
		let json = parse_json(&body);

		Self { status, headers: HeaderMap::new(), body, json, received_at: OffsetDateTime::now_utc() }
	}

	/// Converts a transport response.
	pub fn from_http(response: HttpResponse) -> Self {
		let status = response.status().as_u16();
		let (parts, bytes) = response.into_parts();
		let mut this = Self::new(status, String::from_utf8_lossy(&bytes).into_owned());

		this.headers = parts.headers;

		this
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Parsed JSON body, if any.
	pub fn json(&self) -> Option<&Value> {
		self.json.as_ref()
	}

	/// Deserializes the body into `T`, reporting the failing path on mismatch.
	pub fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_str(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ProtocolError::Decode { source }.into())
	}

	/// Body truncated for diagnostics.
	pub fn body_preview(&self) -> String {
		let mut preview: String = self.body.chars().take(BODY_PREVIEW_LIMIT).collect();

		if self.body.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
			preview.push_str("...");
		}

		preview
	}
}

fn parse_json(body: &str) -> Option<Value> {
	if body.trim().is_empty() {
		return None;
	}

	serde_json::from_str(body).ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Payment {
		id: u64,
		status: String,
	}

	#[test]
	fn parses_json_bodies_only() {
		let ok = ApiResponse::new(201, r#"{"id":1}"#);

		assert!(ok.is_success());
		assert_eq!(ok.json().and_then(|json| json.get("id")).and_then(Value::as_u64), Some(1));
		assert!(ApiResponse::new(200, "").json.is_none());
		assert!(ApiResponse::new(502, "<html>bad gateway</html>").json.is_none());
		assert!(!ApiResponse::new(404, "{}").is_success());
	}

	#[test]
	fn decode_reports_failing_path() {
		let response = ApiResponse::new(200, r#"{"id":7,"status":"approved"}"#);
		let payment: Payment = response.decode().expect("Payment body should decode.");

		assert_eq!(payment.id, 7);
		assert_eq!(payment.status, "approved");

		let err = ApiResponse::new(200, r#"{"id":"seven","status":"approved"}"#)
			.decode::<Payment>()
			.expect_err("A string id should not decode as u64.");

		assert!(err.to_string().contains("id"));
	}

	#[test]
	fn body_preview_truncates_long_bodies() {
		let response = ApiResponse::new(500, "x".repeat(1_000));
		let preview = response.body_preview();

		assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
		assert!(preview.ends_with("..."));
		assert_eq!(ApiResponse::new(500, "short").body_preview(), "short");
	}
}
