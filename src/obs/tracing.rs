// self
use crate::{
	_prelude::*,
	obs::{CredentialEvent, RefreshTrigger},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// Span wrapped around one refresh cycle.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Creates a new span tagged with what triggered the refresh.
	pub fn new(trigger: RefreshTrigger) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("bearer_keeper.refresh", trigger = trigger.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = trigger;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
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

/// Logs a lifecycle event at a level matching its severity.
pub fn log_credential_event(event: CredentialEvent, error: Option<&Error>) {
	#[cfg(feature = "tracing")]
	{
		let error = error.map(|e| e as &(dyn StdError + 'static));

		match event {
			CredentialEvent::NeedRefresh =>
				tracing::debug!(event = event.as_str(), "credential invalid or expired, refreshing"),
			CredentialEvent::ForceRefresh =>
				tracing::debug!(event = event.as_str(), "forcing credential refresh"),
			CredentialEvent::ReadError =>
				tracing::warn!(event = event.as_str(), error, "credential issuer attempt failed"),
			CredentialEvent::RefreshFailed =>
				tracing::error!(event = event.as_str(), error, "credential refresh failed"),
			CredentialEvent::Refreshed =>
				tracing::debug!(event = event.as_str(), "credential refreshed"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, error);
	}
}

/// Logs that the decorator is resubmitting a request after a `401`.
pub fn log_request_retry(attempt: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(attempt, "resource rejected the credential, retrying with a fresh one");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = attempt;
	}
}

/// Logs that a 401 could not be retried because the request body is not replayable.
pub fn log_request_not_replayable() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("resource rejected the credential but the request cannot be replayed");
	}
}
