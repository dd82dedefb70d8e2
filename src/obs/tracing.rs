// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by SDK calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("mercadopago_sdk.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `warn` event for an attempt that will be retried.
pub fn trace_retry(kind: CallKind, attempt: u32, max_attempts: u32, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			call = kind.as_str(),
			attempt,
			max_attempts,
			error = %error,
			"Transport failure, retrying."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, attempt, max_attempts, error);
	}
}

/// Emits a `debug` event when a response is served from the cache.
pub fn trace_cache_hit(key: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(key, "Serving cached response.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = key;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn helpers_noop_without_tracing() {
		let _span = CallSpan::new(CallKind::ApiRequest, "test");

		trace_retry(CallKind::ApiRequest, 1, 4, &"connection reset");
		trace_cache_hit("GET https://api.mercadopago.com/v1/payments/1");
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::RefreshToken, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
