//! Injectable time sources used for every expiry computation.
//!
//! The manager never reads the ambient wall clock directly. Production code uses
//! [`SystemClock`]; tests swap in a [`ManualClock`] and move it forward explicitly.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant according to this clock.
	fn now(&self) -> OffsetDateTime;
}

/// The system clock, expressed in UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle while the manager owns
/// another.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(instant)))
	}

	/// Moves the clock to `instant`, which may lie in the past.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		let mut now = self.0.lock();

		*now += delta;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::UNIX_EPOCH)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Converts a signed duration for use with Tokio timers, treating negative values as zero.
pub(crate) fn std_duration(duration: Duration) -> std::time::Duration {
	duration.try_into().unwrap_or_default()
}
