//! Declarative description of one API call.

// crates.io
use oauth2::http::Method;
use serde_json::Value;
// self
use crate::{_prelude::*, error::ConfigError};

/// HTTP methods supported by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl HttpMethod {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}

	pub(crate) fn to_http(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Delete => Method::DELETE,
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a payload is written to the request body. Chosen per call, never inferred.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PayloadType {
	/// `application/json`
	#[default]
	Json,
	/// `application/x-www-form-urlencoded`; the payload must be a JSON object.
	Form,
}
impl PayloadType {
	/// `Content-Type` header value.
	pub const fn content_type(self) -> &'static str {
		match self {
			Self::Json => "application/json",
			Self::Form => "application/x-www-form-urlencoded",
		}
	}

	/// Encodes `payload` according to this payload type.
	///
	/// Form encoding writes string members verbatim, `null` as an empty value, and any other
	/// member as its JSON text.
	pub fn encode(self, payload: &Value) -> Result<Vec<u8>, ConfigError> {
		match self {
			Self::Json => serde_json::to_vec(payload)
				.map_err(|e| ConfigError::InvalidPayload { reason: e.to_string() }),
			Self::Form => {
				let Value::Object(members) = payload else {
					return Err(ConfigError::InvalidPayload {
						reason: "form payloads must be JSON objects".into(),
					});
				};
				let mut form = url::form_urlencoded::Serializer::new(String::new());

				for (name, value) in members {
					match value {
						Value::String(text) => form.append_pair(name, text),
						Value::Null => form.append_pair(name, ""),
						other => form.append_pair(name, &other.to_string()),
					};
				}

				Ok(form.finish().into_bytes())
			},
		}
	}
}

/// One API call: method, resource, payload, and cache participation.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Resource path relative to the base URL, or an absolute URL.
	pub path: String,
	/// Body encoding.
	pub payload_type: PayloadType,
	/// Body, if any.
	pub payload: Option<Value>,
	/// Whether the response may be served from and stored into the response cache.
	///
	/// Only read-style, idempotent calls should opt in.
	pub cacheable: bool,
}
impl ApiRequest {
	/// Creates a request without payload that bypasses the cache.
	pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			payload_type: PayloadType::Json,
			payload: None,
			cacheable: false,
		}
	}

	/// `GET {path}`.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, path)
	}

	/// `POST {path}` with a JSON payload.
	pub fn post(path: impl Into<String>, payload: Value) -> Self {
		Self::new(HttpMethod::Post, path).with_payload(payload)
	}

	/// `PUT {path}` with a JSON payload.
	pub fn put(path: impl Into<String>, payload: Value) -> Self {
		Self::new(HttpMethod::Put, path).with_payload(payload)
	}

	/// `DELETE {path}`.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(HttpMethod::Delete, path)
	}

	/// Sets the body.
	pub fn with_payload(mut self, payload: Value) -> Self {
		self.payload = Some(payload);

		self
	}

	/// Sets the body encoding.
	pub fn with_payload_type(mut self, payload_type: PayloadType) -> Self {
		self.payload_type = payload_type;

		self
	}

	/// Opts the call into the response cache.
	pub fn cached(self) -> Self {
		self.with_cache(true)
	}

	/// Overrides cache participation.
	pub fn with_cache(mut self, cacheable: bool) -> Self {
		self.cacheable = cacheable;

		self
	}

	/// Encoded body and its content type, when a payload is present.
	pub(crate) fn encode_body(&self) -> Result<Option<(Vec<u8>, &'static str)>, ConfigError> {
		self.payload
			.as_ref()
			.map(|payload| {
				self.payload_type.encode(payload).map(|body| (body, self.payload_type.content_type()))
			})
			.transpose()
	}
}
