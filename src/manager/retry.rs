//! Exponential backoff applied around issuer attempts within one refresh cycle.

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// Backoff configuration for one refresh cycle.
///
/// The interval before retry `n` is `initial_interval * multiplier^(n-1)`, capped at
/// `max_interval`, then spread uniformly by `± randomization_factor`. A refresh makes at
/// most `max_retries + 1` issuer calls.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
	/// Retries allowed after the first attempt.
	pub max_retries: u32,
	/// Delay before the first retry.
	pub initial_interval: Duration,
	/// Growth factor applied after each retry.
	pub multiplier: f64,
	/// Upper bound for a single delay before randomization.
	pub max_interval: Duration,
	/// Relative jitter in `[0, 1]`.
	pub randomization_factor: f64,
}
impl RetryPolicy {
	const DEFAULT_INITIAL_INTERVAL: Duration = Duration::milliseconds(500);
	const DEFAULT_MAX_INTERVAL: Duration = Duration::seconds(60);
	const DEFAULT_MAX_RETRIES: u32 = 3;
	const DEFAULT_MULTIPLIER: f64 = 1.5;
	const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;

	/// Retries immediately, without any delay. Mostly useful in tests.
	pub fn immediate(max_retries: u32) -> Self {
		Self {
			max_retries,
			initial_interval: Duration::ZERO,
			multiplier: 1.,
			max_interval: Duration::ZERO,
			randomization_factor: 0.,
		}
	}

	/// Overrides the retry count.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the first delay; negative values are treated as zero.
	pub fn with_initial_interval(mut self, interval: Duration) -> Self {
		self.initial_interval = interval.max(Duration::ZERO);

		self
	}

	/// Overrides the growth factor; values below `1` are treated as `1`.
	pub fn with_multiplier(mut self, multiplier: f64) -> Self {
		self.multiplier = if multiplier >= 1. { multiplier } else { 1. };

		self
	}

	/// Overrides the delay cap; negative values are treated as zero.
	pub fn with_max_interval(mut self, interval: Duration) -> Self {
		self.max_interval = interval.max(Duration::ZERO);

		self
	}

	/// Overrides the jitter factor, clamped to `[0, 1]`.
	pub fn with_randomization_factor(mut self, factor: f64) -> Self {
		self.randomization_factor = if factor.is_nan() { 0. } else { factor.clamp(0., 1.) };

		self
	}

	/// Total issuer calls allowed per refresh cycle.
	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Starts a fresh backoff sequence for one refresh cycle.
	pub fn backoff(&self) -> Backoff {
		Backoff {
			policy: self.clone(),
			next_interval: self.initial_interval.min(self.max_interval),
			retries_left: self.max_retries,
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: Self::DEFAULT_MAX_RETRIES,
			initial_interval: Self::DEFAULT_INITIAL_INTERVAL,
			multiplier: Self::DEFAULT_MULTIPLIER,
			max_interval: Self::DEFAULT_MAX_INTERVAL,
			randomization_factor: Self::DEFAULT_RANDOMIZATION_FACTOR,
		}
	}
}

/// Delay sequence produced by [`RetryPolicy::backoff`].
#[derive(Clone, Debug)]
pub struct Backoff {
	policy: RetryPolicy,
	next_interval: Duration,
	retries_left: u32,
}
impl Backoff {
	/// Returns the delay before the next retry, or `None` once retries are exhausted.
	pub fn next_delay(&mut self) -> Option<Duration> {
		if self.retries_left == 0 {
			return None;
		}

		self.retries_left -= 1;

		let interval = self.next_interval;
		let grown =
			Duration::saturating_seconds_f64(interval.as_seconds_f64() * self.policy.multiplier);

		self.next_interval = grown.min(self.policy.max_interval);

		Some(self.randomize(interval))
	}

	/// Retries still available.
	pub fn retries_left(&self) -> u32 {
		self.retries_left
	}

	fn randomize(&self, interval: Duration) -> Duration {
		let secs = interval.as_seconds_f64();
		let delta = secs * self.policy.randomization_factor;

		// `randomization_factor` is public and may hold NaN or infinity.
		if !delta.is_finite() || delta <= 0. {
			return interval;
		}

		let jittered = rand::rng().random_range((secs - delta)..=(secs + delta));

		Duration::saturating_seconds_f64(jittered)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_policy_allows_four_attempts() {
		let policy = RetryPolicy::default();
		let mut backoff = policy.backoff();
		let delays = std::iter::from_fn(|| backoff.next_delay()).collect::<Vec<_>>();

		assert_eq!(policy.max_attempts(), 4);
		assert_eq!(delays.len(), 3);
		assert!(backoff.next_delay().is_none());

		for (delay, nominal) in delays.iter().zip([0.5, 0.75, 1.125]) {
			let secs = delay.as_seconds_f64();

			assert!(secs >= nominal * 0.5 - 1e-9 && secs <= nominal * 1.5 + 1e-9, "{secs}");
		}
	}

	#[test]
	fn intervals_grow_and_cap_without_jitter() {
		let policy = RetryPolicy::default()
			.with_max_retries(5)
			.with_initial_interval(Duration::seconds(1))
			.with_multiplier(2.)
			.with_max_interval(Duration::seconds(5))
			.with_randomization_factor(0.);
		let mut backoff = policy.backoff();
		let delays = std::iter::from_fn(|| backoff.next_delay()).collect::<Vec<_>>();

		assert_eq!(
			delays,
			[1, 2, 4, 5, 5].map(Duration::seconds).to_vec(),
			"Delays should double until the cap."
		);
	}

	#[test]
	fn unclamped_jitter_factors_fall_back_to_nominal_delay() {
		for factor in [f64::NAN, f64::INFINITY, -0.5] {
			let policy = RetryPolicy {
				randomization_factor: factor,
				..RetryPolicy::default().with_initial_interval(Duration::seconds(2))
			};
			let mut backoff = policy.backoff();

			assert_eq!(
				backoff.next_delay(),
				Some(Duration::seconds(2)),
				"Factor {factor} should leave the delay unjittered."
			);
		}
	}

	#[test]
	fn each_cycle_starts_over() {
		let policy = RetryPolicy::immediate(2);
		let mut first = policy.backoff();

		assert_eq!(first.next_delay(), Some(Duration::ZERO));
		assert_eq!(first.retries_left(), 1);

		let second = policy.backoff();

		assert_eq!(second.retries_left(), 2);
	}

	#[test]
	fn builders_clamp_out_of_range_values() {
		let policy = RetryPolicy::default()
			.with_initial_interval(Duration::seconds(-1))
			.with_multiplier(0.1)
			.with_randomization_factor(4.);

		assert_eq!(policy.initial_interval, Duration::ZERO);
		assert_eq!(policy.multiplier, 1.);
		assert_eq!(policy.randomization_factor, 1.);
	}
}
