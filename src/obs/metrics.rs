// self
use crate::obs::CredentialEvent;

/// Records a lifecycle event via the global metrics recorder (when enabled).
pub fn record_credential_event(event: CredentialEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bearer_keeper_credential_event_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

/// Records one authorization-rejection retry issued by the request decorator.
pub fn record_request_retry() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bearer_keeper_request_retry_total").increment(1);
	}
}
