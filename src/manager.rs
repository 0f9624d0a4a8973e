//! Credential lifecycle: cache, expiry tracking, single-flight refresh, background renewal.
//!
//! [`CredentialManager::credential`] serves the cached credential while the injected
//! [`Clock`] says it is valid. Otherwise it takes the single-flight guard, re-checks (another
//! caller may have refreshed while it waited), and refreshes through the
//! [`CredentialSource`] under the configured [`RetryPolicy`]. The guard is held for the whole
//! refresh, backoff sleeps included, so concurrent callers collapse into one issuer call and
//! all observe its outcome. A refresh that exhausts its retries clears the cache.

mod auto_refresh;
mod retry;

pub use retry::*;

// crates.io
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	clock::{self, Clock, SystemClock},
	credential::Credential,
	error::ConfigError,
	obs::{self, CredentialEvent, CredentialObserver, RefreshSpan, RefreshTrigger},
	source::CredentialSource,
};

/// Owns the cached credential for one client identity.
///
/// Cloning is cheap; every clone shares the same cache, guard, and background task.
#[derive(Clone)]
pub struct CredentialManager {
	inner: Arc<ManagerInner>,
}
impl CredentialManager {
	/// Creates a manager with default settings.
	pub fn new(source: impl CredentialSource) -> Self {
		Self::builder(source).build()
	}

	/// Returns a builder for customizing clock, observer, retry, and renewal settings.
	pub fn builder(source: impl CredentialSource) -> CredentialManagerBuilder {
		CredentialManagerBuilder::new(source)
	}

	/// Returns a valid credential, refreshing first when the cached one is missing or expired.
	pub async fn credential(&self) -> Result<Arc<Credential>> {
		if let Some(credential) = self.inner.valid_credential() {
			return Ok(credential);
		}

		let _singleflight = self.inner.refresh_guard.lock().await;

		// A caller ahead of us may have refreshed while we waited.
		if let Some(credential) = self.inner.valid_credential() {
			return Ok(credential);
		}

		self.inner.refresh(RefreshTrigger::Demand).await
	}

	/// Refreshes unconditionally, still serialized against other refreshes.
	pub async fn force_refresh(&self) -> Result<Arc<Credential>> {
		let _singleflight = self.inner.refresh_guard.lock().await;

		self.inner.refresh(RefreshTrigger::Forced).await
	}

	/// Returns `true` when a credential is cached and the clock says it has not expired.
	pub fn is_valid(&self) -> bool {
		self.inner.valid_credential().is_some()
	}

	/// Returns the cached credential without checking its validity.
	pub fn current(&self) -> Option<Arc<Credential>> {
		self.inner.current.read().clone()
	}

	/// Drops the cached credential if it still holds the same token as `rejected`.
	///
	/// Returns `true` when the cache was cleared. A credential installed by a concurrent
	/// refresh is left in place, so the next [`credential`](Self::credential) call reuses it.
	pub fn invalidate(&self, rejected: &Credential) -> bool {
		let mut current = self.inner.current.write();

		if current.as_deref().is_some_and(|cached| cached.value == rejected.value) {
			*current = None;

			true
		} else {
			false
		}
	}

	/// Spawns the background renewal task on the current Tokio runtime.
	///
	/// Returns `Ok(false)` when a task is already running.
	pub fn start_auto_refresh(&self) -> Result<bool> {
		let runtime = tokio::runtime::Handle::try_current()
			.map_err(|source| ConfigError::MissingRuntime { source })?;
		let mut slot = self.inner.auto_refresh.lock();

		if slot.as_ref().is_some_and(AutoRefreshTask::is_running) {
			return Ok(false);
		}

		let cancel = CancellationToken::new();
		let handle =
			runtime.spawn(auto_refresh::run(Arc::downgrade(&self.inner), cancel.clone()));

		*slot = Some(AutoRefreshTask { cancel, handle });

		Ok(true)
	}

	/// Signals the background task to exit at its next scheduling point.
	///
	/// A sleeping task exits immediately; one that is mid-refresh exits once the refresh
	/// completes. Returns `false` when no task was running. Calling it again is harmless.
	pub fn stop_auto_refresh(&self) -> bool {
		match self.inner.auto_refresh.lock().take() {
			Some(task) => {
				task.cancel.cancel();

				true
			},
			None => false,
		}
	}

	/// Returns `true` while a background task started by this manager is alive.
	pub fn is_auto_refreshing(&self) -> bool {
		self.inner.auto_refresh.lock().as_ref().is_some_and(AutoRefreshTask::is_running)
	}
}
impl Debug for CredentialManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager")
			.field("credential", &self.current())
			.field("retry", &self.inner.retry)
			.field("refresh_bias", &self.inner.refresh_bias)
			.field("fallback_interval", &self.inner.fallback_interval)
			.field("observer_set", &self.inner.observer.is_some())
			.field("auto_refreshing", &self.is_auto_refreshing())
			.finish()
	}
}

/// Builder for [`CredentialManager`].
pub struct CredentialManagerBuilder {
	source: Arc<dyn CredentialSource>,
	clock: Arc<dyn Clock>,
	observer: Option<Arc<dyn CredentialObserver>>,
	retry: RetryPolicy,
	refresh_bias: Duration,
	fallback_interval: Duration,
}
impl CredentialManagerBuilder {
	const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::seconds(10);
	const DEFAULT_REFRESH_BIAS: Duration = Duration::seconds(2);

	fn new(source: impl CredentialSource) -> Self {
		Self {
			source: Arc::new(source),
			clock: Arc::new(SystemClock),
			observer: None,
			retry: RetryPolicy::default(),
			refresh_bias: Self::DEFAULT_REFRESH_BIAS,
			fallback_interval: Self::DEFAULT_FALLBACK_INTERVAL,
		}
	}

	/// Overrides the clock used for every expiry computation.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Registers an observer for lifecycle events.
	pub fn with_observer<O>(mut self, observer: Arc<O>) -> Self
	where
		O: 'static + CredentialObserver,
	{
		self.observer = Some(observer);

		self
	}

	/// Overrides the retry policy applied around each refresh.
	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides how long before expiry the background task renews (defaults to 2 seconds).
	pub fn with_refresh_bias(mut self, bias: Duration) -> Self {
		self.refresh_bias = if bias.is_negative() { Duration::ZERO } else { bias };

		self
	}

	/// Overrides how long the background task waits before re-checking when no valid
	/// credential is cached (defaults to 10 seconds). Non-positive values keep the default.
	pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
		if interval.is_positive() {
			self.fallback_interval = interval;
		}

		self
	}

	/// Finishes the builder.
	pub fn build(self) -> CredentialManager {
		CredentialManager {
			inner: Arc::new(ManagerInner {
				source: self.source,
				clock: self.clock,
				observer: self.observer,
				retry: self.retry,
				refresh_bias: self.refresh_bias,
				fallback_interval: self.fallback_interval,
				current: Default::default(),
				refresh_guard: AsyncMutex::new(()),
				auto_refresh: Default::default(),
			}),
		}
	}
}
impl Debug for CredentialManagerBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManagerBuilder")
			.field("retry", &self.retry)
			.field("refresh_bias", &self.refresh_bias)
			.field("fallback_interval", &self.fallback_interval)
			.field("observer_set", &self.observer.is_some())
			.finish()
	}
}

struct AutoRefreshTask {
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}
impl AutoRefreshTask {
	fn is_running(&self) -> bool {
		!self.cancel.is_cancelled() && !self.handle.is_finished()
	}
}

struct ManagerInner {
	source: Arc<dyn CredentialSource>,
	clock: Arc<dyn Clock>,
	observer: Option<Arc<dyn CredentialObserver>>,
	retry: RetryPolicy,
	refresh_bias: Duration,
	fallback_interval: Duration,
	current: RwLock<Option<Arc<Credential>>>,
	refresh_guard: AsyncMutex<()>,
	auto_refresh: Mutex<Option<AutoRefreshTask>>,
}
impl ManagerInner {
	fn valid_credential(&self) -> Option<Arc<Credential>> {
		let now = self.clock.now();

		self.current.read().as_ref().filter(|credential| credential.is_valid_at(now)).cloned()
	}

	fn emit(&self, event: CredentialEvent, error: Option<&Error>) {
		obs::emit(self.observer.as_deref(), event, error);
	}

	/// Runs one refresh cycle. Callers must hold `refresh_guard`.
	async fn refresh(&self, trigger: RefreshTrigger) -> Result<Arc<Credential>> {
		let span = RefreshSpan::new(trigger);
		let started = match trigger {
			RefreshTrigger::Forced => CredentialEvent::ForceRefresh,
			RefreshTrigger::Demand | RefreshTrigger::Scheduled => CredentialEvent::NeedRefresh,
		};

		span.instrument(async move {
			self.emit(started, None);

			let mut backoff = self.retry.backoff();
			let mut attempts = 0_u32;

			loop {
				attempts += 1;

				let err = match self.attempt().await {
					Ok(credential) => {
						let credential = Arc::new(credential);

						*self.current.write() = Some(credential.clone());
						self.emit(CredentialEvent::Refreshed, None);

						return Ok(credential);
					},
					Err(err) => err,
				};

				self.emit(CredentialEvent::ReadError, Some(&err));

				match backoff.next_delay() {
					Some(delay) if err.is_retryable() =>
						tokio::time::sleep(clock::std_duration(delay)).await,
					_ => {
						*self.current.write() = None;

						let err = Error::RefreshExhausted { attempts, source: Box::new(err) };

						self.emit(CredentialEvent::RefreshFailed, Some(&err));

						return Err(err);
					},
				}
			}
		})
		.await
	}

	async fn attempt(&self) -> Result<Credential> {
		let issued = self.source.fetch().await?;

		Ok(issued.into_credential(self.clock.now())?)
	}

	/// Delay until the background task should look again.
	fn next_wake_up(&self) -> Duration {
		let now = self.clock.now();

		match self.current.read().as_ref().filter(|credential| credential.is_valid_at(now)) {
			Some(credential) => credential.refresh_due_at(self.refresh_bias) - now,
			None => self.fallback_interval,
		}
	}
}
impl Drop for ManagerInner {
	fn drop(&mut self) {
		if let Some(task) = self.auto_refresh.get_mut().take() {
			task.cancel.cancel();
		}
	}
}
