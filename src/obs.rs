//! Lifecycle events plus optional tracing and metrics hooks.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to wrap each refresh in a span named `bearer_keeper.refresh`
//!   with a `trigger` field and to log every lifecycle transition.
//! - Enable `metrics` to increment `bearer_keeper_credential_event_total` (labeled by `event`)
//!   and `bearer_keeper_request_retry_total`.
//!
//! Independently of both features, callers can plug a [`CredentialObserver`] into the
//! manager; it receives every [`CredentialEvent`] synchronously.

mod counters;
mod metrics;
mod tracing;

pub use counters::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Transitions reported by the credential manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialEvent {
	/// The cached credential was missing or expired and a refresh started.
	NeedRefresh,
	/// A refresh was requested regardless of the cached credential's validity.
	ForceRefresh,
	/// One issuer attempt failed; the retry policy may try again.
	ReadError,
	/// Every attempt failed and the cached credential was cleared.
	RefreshFailed,
	/// A new credential was installed.
	Refreshed,
}
impl CredentialEvent {
	/// Every event, in declaration order.
	pub const ALL: [Self; 5] =
		[Self::NeedRefresh, Self::ForceRefresh, Self::ReadError, Self::RefreshFailed, Self::Refreshed];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialEvent::NeedRefresh => "need_refresh",
			CredentialEvent::ForceRefresh => "force_refresh",
			CredentialEvent::ReadError => "read_error",
			CredentialEvent::RefreshFailed => "refresh_failed",
			CredentialEvent::Refreshed => "refreshed",
		}
	}
}
impl Display for CredentialEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// What started a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshTrigger {
	/// A caller needed a credential and none was valid.
	Demand,
	/// A caller asked for an unconditional refresh.
	Forced,
	/// The background loop renewed the credential ahead of expiry.
	Scheduled,
}
impl RefreshTrigger {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshTrigger::Demand => "demand",
			RefreshTrigger::Forced => "forced",
			RefreshTrigger::Scheduled => "scheduled",
		}
	}
}
impl Display for RefreshTrigger {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receives lifecycle events from a [`CredentialManager`](crate::manager::CredentialManager).
///
/// Calls happen inline on the refreshing task while the single-flight guard is held, so
/// implementations should return quickly and must not call back into the manager.
pub trait CredentialObserver
where
	Self: Send + Sync,
{
	/// Handles one event. `error` is set for [`CredentialEvent::ReadError`] and
	/// [`CredentialEvent::RefreshFailed`].
	fn on_event(&self, event: CredentialEvent, error: Option<&Error>);
}
impl<F> CredentialObserver for F
where
	F: Send + Sync + Fn(CredentialEvent, Option<&Error>),
{
	fn on_event(&self, event: CredentialEvent, error: Option<&Error>) {
		self(event, error)
	}
}

/// Fans an event out to tracing, metrics, and the optional observer.
pub(crate) fn emit(
	observer: Option<&dyn CredentialObserver>,
	event: CredentialEvent,
	error: Option<&Error>,
) {
	log_credential_event(event, error);
	record_credential_event(event);

	if let Some(observer) = observer {
		observer.on_event(event, error);
	}
}
