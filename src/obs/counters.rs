// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	obs::{CredentialEvent, CredentialObserver},
};

/// Thread-safe per-event counters, usable directly as a [`CredentialObserver`].
#[derive(Debug, Default)]
pub struct EventCounters {
	need_refresh: AtomicU64,
	force_refresh: AtomicU64,
	read_error: AtomicU64,
	refresh_failed: AtomicU64,
	refreshed: AtomicU64,
}
impl EventCounters {
	/// Returns how many times `event` has been observed.
	pub fn count(&self, event: CredentialEvent) -> u64 {
		self.slot(event).load(Ordering::Relaxed)
	}

	/// Returns the number of installed credentials.
	pub fn refreshed(&self) -> u64 {
		self.count(CredentialEvent::Refreshed)
	}

	/// Returns the number of failed issuer attempts.
	pub fn read_errors(&self) -> u64 {
		self.count(CredentialEvent::ReadError)
	}

	/// Returns the number of refresh cycles that exhausted their retries.
	pub fn failures(&self) -> u64 {
		self.count(CredentialEvent::RefreshFailed)
	}

	fn slot(&self, event: CredentialEvent) -> &AtomicU64 {
		match event {
			CredentialEvent::NeedRefresh => &self.need_refresh,
			CredentialEvent::ForceRefresh => &self.force_refresh,
			CredentialEvent::ReadError => &self.read_error,
			CredentialEvent::RefreshFailed => &self.refresh_failed,
			CredentialEvent::Refreshed => &self.refreshed,
		}
	}
}
impl CredentialObserver for EventCounters {
	fn on_event(&self, event: CredentialEvent, _: Option<&Error>) {
		self.slot(event).fetch_add(1, Ordering::Relaxed);
	}
}
