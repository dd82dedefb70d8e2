//! Mercado Pago client SDK: OAuth client-credentials and refresh exchanges, policy-driven
//! authenticated requests with bounded retries, and a sliding-expiration response cache.
//!
//! Create one [`context::SdkContext`], configure it, share it behind an `Arc`, and hand it to a
//! [`client::Client`]. Every call resolves its access token explicitly, applies a
//! [`policy::RequestOptions`] snapshot, and optionally goes through the
//! [`cache::ResponseCache`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod client;
pub mod context;
pub mod error;
pub mod http;
pub mod json;
pub mod obs;
pub mod policy;
pub mod request;
pub mod response;
pub mod secret;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::ReqwestSdkClient,
		context::SdkContext,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	};

	/// Builds a reqwest-backed client whose context points at `base_url` (usually an `httpmock`
	/// server) with the given client credentials.
	///
	/// Blank credentials are left unset.
	pub fn build_reqwest_test_client(
		base_url: &str,
		client_id: &str,
		client_secret: &str,
	) -> (ReqwestSdkClient, Arc<SdkContext>) {
		let context = Arc::new(SdkContext::new());

		context.set_base_url(base_url).expect("Mock server URL should be a valid base URL.");
		context.set_client_id(client_id).expect("A fresh context accepts a client id.");
		context.set_client_secret(client_secret).expect("A fresh context accepts a client secret.");

		let client = ReqwestSdkClient::with_http_client(
			context.clone(),
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(client, context)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
