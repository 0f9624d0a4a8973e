//! Background renewal loop.
//!
//! Each cycle takes the single-flight guard, refreshes when the cached credential is invalid
//! or within `refresh_bias` of expiry, releases the guard, then sleeps until the next due
//! instant (or the fallback interval when nothing valid is cached). The sleep races the
//! cancellation token, so stopping never waits for a timer.

// std
use std::sync::Weak;
// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	clock,
	manager::ManagerInner,
	obs::RefreshTrigger,
};

pub(super) async fn run(manager: Weak<ManagerInner>, cancel: CancellationToken) {
	#[cfg(feature = "tracing")]
	tracing::debug!("credential auto refresh started");

	while !cancel.is_cancelled() {
		// Only hold a strong reference while working, so dropping the manager ends the loop.
		let Some(inner) = manager.upgrade() else { break };
		let delay = inner.renew_once().await;

		drop(inner);

		#[cfg(feature = "tracing")]
		tracing::trace!(
			delay_ms = clock::std_duration(delay).as_millis() as u64,
			"auto refresh sleeping"
		);

		tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			_ = tokio::time::sleep(clock::std_duration(delay)) => {},
		}
	}

	#[cfg(feature = "tracing")]
	tracing::debug!("credential auto refresh stopped");
}

impl ManagerInner {
	async fn renew_once(&self) -> Duration {
		let _singleflight = self.refresh_guard.lock().await;
		let now = self.clock.now();
		let cached = self.current.read().clone();
		let trigger = match cached.as_deref() {
			Some(credential) if credential.is_valid_at(now) =>
				(now >= credential.refresh_due_at(self.refresh_bias))
					.then_some(RefreshTrigger::Scheduled),
			_ => Some(RefreshTrigger::Demand),
		};

		// Failures are already reported through events; the fallback interval covers retrying.
		if let Some(trigger) = trigger {
			let _ = self.refresh(trigger).await;
		}

		self.next_wake_up()
	}
}
