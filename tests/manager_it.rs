mod common;

// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use bearer_keeper::{
	clock::ManualClock,
	credential::IssuedCredential,
	error::{ConfigError, Error},
	manager::{CredentialManager, RetryPolicy},
	obs::{CredentialEvent, EventCounters},
	source::{CredentialSource, SourceFuture},
};
use common::{EPOCH, ScriptedSource, Step};

fn build_manager(
	source: &ScriptedSource,
	clock: &ManualClock,
) -> (CredentialManager, Arc<EventCounters>) {
	let counters = Arc::new(EventCounters::default());
	let manager = CredentialManager::builder(source.clone())
		.with_clock(clock.clone())
		.with_retry_policy(RetryPolicy::immediate(3))
		.with_observer(counters.clone())
		.build();

	(manager, counters)
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_refresh() {
	let source = ScriptedSource::issuing("aaaa", 300).with_delay(Duration::seconds(1));
	let (manager, counters) = build_manager(&source, &ManualClock::new(EPOCH));
	let (a, b, c, d) = tokio::join!(
		manager.credential(),
		manager.credential(),
		manager.credential(),
		manager.credential(),
	);

	for credential in [a, b, c, d] {
		let credential = credential.expect("Every waiter should observe the shared refresh.");

		assert_eq!(credential.value.expose(), "aaaa");
	}

	assert_eq!(source.calls(), 1, "Concurrent callers should collapse into one issuer call.");
	assert_eq!(counters.count(CredentialEvent::NeedRefresh), 1);
	assert_eq!(counters.refreshed(), 1);
}

#[tokio::test]
async fn cached_credential_expires_at_lifetime_boundary() {
	let source = ScriptedSource::issuing("aaaa", 10);
	let clock = ManualClock::new(EPOCH);
	let (manager, _) = build_manager(&source, &clock);

	assert!(!manager.is_valid(), "A fresh manager should not hold a credential.");

	let credential = manager.credential().await.expect("First demand should refresh.");

	assert_eq!(credential.issued_at, EPOCH);
	assert_eq!(credential.valid_until, EPOCH + Duration::seconds(10));

	clock.advance(Duration::seconds(9));

	assert!(manager.is_valid(), "Credential should still be valid one second before expiry.");

	manager.credential().await.expect("Cached credential should be served.");

	assert_eq!(source.calls(), 1, "A valid credential should be served from cache.");

	clock.advance(Duration::seconds(1));

	assert!(!manager.is_valid(), "Credential should be invalid at the expiry instant.");

	clock.advance(Duration::seconds(1));

	let renewed = manager.credential().await.expect("Expired credential should be refreshed.");

	assert_eq!(source.calls(), 2);
	assert_eq!(renewed.issued_at, EPOCH + Duration::seconds(11));
	assert!(manager.is_valid());
}

#[tokio::test]
async fn refresh_recovers_after_transient_failure() {
	let source = ScriptedSource::new([Step::Fail(503), Step::Issue("bbbb", 60)]);
	let (manager, counters) = build_manager(&source, &ManualClock::new(EPOCH));
	let credential = manager.credential().await.expect("Second attempt should succeed.");

	assert_eq!(credential.value.expose(), "bbbb");
	assert_eq!(source.calls(), 2);
	assert_eq!(counters.read_errors(), 1);
	assert_eq!(counters.refreshed(), 1);
	assert_eq!(counters.failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn default_backoff_sleeps_between_attempts() {
	let source = ScriptedSource::new([Step::Fail(503), Step::Fail(502), Step::Issue("cccc", 60)]);
	let manager = CredentialManager::builder(source.clone()).build();
	let started = tokio::time::Instant::now();
	let credential = manager.credential().await.expect("Third attempt should succeed.");

	assert_eq!(credential.value.expose(), "cccc");
	assert_eq!(source.calls(), 3);
	assert!(
		started.elapsed() >= std::time::Duration::from_millis(250),
		"Retries should wait at least the jittered initial interval."
	);
}

#[tokio::test]
async fn exhausted_refresh_clears_cached_credential() {
	let source = ScriptedSource::new([Step::Issue("aaaa", 10), Step::Fail(500)]);
	let clock = ManualClock::new(EPOCH);
	let (manager, counters) = build_manager(&source, &clock);

	manager.credential().await.expect("Initial refresh should succeed.");
	clock.advance(Duration::seconds(11));

	let err = manager.credential().await.expect_err("Every retry should fail.");

	assert!(matches!(err, Error::RefreshExhausted { attempts: 4, .. }), "Got {err:?}.");
	assert!(matches!(err.root_cause(), Error::IssuerRejected { status: 500, .. }));
	assert_eq!(source.calls(), 5, "One initial call plus one attempt and three retries.");
	assert!(!manager.is_valid());
	assert!(manager.current().is_none(), "An exhausted refresh should clear the cache.");
	assert_eq!(counters.read_errors(), 4);
	assert_eq!(counters.failures(), 1);
}

#[tokio::test]
async fn force_refresh_replaces_valid_credential() {
	let source = ScriptedSource::new([Step::Issue("aaaa", 300), Step::Issue("bbbb", 300)]);
	let (manager, counters) = build_manager(&source, &ManualClock::new(EPOCH));

	manager.credential().await.expect("Initial refresh should succeed.");

	let forced = manager.force_refresh().await.expect("Forced refresh should succeed.");

	assert_eq!(forced.value.expose(), "bbbb");
	assert_eq!(
		manager.credential().await.expect("Forced credential should be cached.").value.expose(),
		"bbbb"
	);
	assert_eq!(source.calls(), 2);
	assert_eq!(counters.count(CredentialEvent::ForceRefresh), 1);
	assert_eq!(counters.count(CredentialEvent::NeedRefresh), 1);
}

#[tokio::test]
async fn invalidate_only_clears_matching_token() {
	let source = ScriptedSource::new([Step::Issue("aaaa", 300), Step::Issue("bbbb", 300)]);
	let (manager, _) = build_manager(&source, &ManualClock::new(EPOCH));
	let stale = manager.credential().await.expect("Initial refresh should succeed.");
	let fresh = manager.force_refresh().await.expect("Forced refresh should succeed.");

	assert!(!manager.invalidate(&stale), "A superseded token should not clear the cache.");
	assert_eq!(manager.current().as_deref(), Some(&*fresh));
	assert!(manager.invalidate(&fresh));
	assert!(manager.current().is_none());

	manager.credential().await.expect("Invalidated cache should be refilled on demand.");

	assert_eq!(source.calls(), 3);
}

struct Misconfigured;
impl CredentialSource for Misconfigured {
	fn fetch(&self) -> SourceFuture<'_> {
		Box::pin(reject())
	}
}

async fn reject() -> Result<IssuedCredential, Error> {
	Err(ConfigError::UnsupportedScheme { scheme: "ftp".into() }.into())
}

#[tokio::test]
async fn non_retryable_failures_stop_immediately() {
	let manager = CredentialManager::builder(Misconfigured)
		.with_retry_policy(RetryPolicy::immediate(3))
		.build();
	let err = manager.credential().await.expect_err("Configuration failures should surface.");

	assert!(matches!(err, Error::RefreshExhausted { attempts: 1, .. }), "Got {err:?}.");
	assert!(matches!(err.root_cause(), Error::Config(ConfigError::UnsupportedScheme { .. })));
}

#[tokio::test]
async fn failed_force_refresh_clears_cached_credential() {
	let source = ScriptedSource::new([Step::Issue("aaaa", 300), Step::Fail(500)]);
	let (manager, counters) = build_manager(&source, &ManualClock::new(EPOCH));

	manager.credential().await.expect("Initial refresh should succeed.");

	let err = manager.force_refresh().await.expect_err("Every forced attempt should fail.");

	assert!(matches!(err, Error::RefreshExhausted { attempts: 4, .. }), "Got {err:?}.");
	assert!(!manager.is_valid(), "A failed forced refresh should not keep the old credential.");
	assert!(manager.current().is_none());
	assert_eq!(source.calls(), 5);
	assert_eq!(counters.count(CredentialEvent::ForceRefresh), 1);
	assert_eq!(counters.failures(), 1);
}

#[tokio::test(start_paused = true)]
async fn nan_jitter_factor_still_retries() {
	let source = ScriptedSource::new([Step::Fail(503), Step::Issue("dddd", 60)]);
	let mut policy = RetryPolicy::default();

	policy.randomization_factor = f64::NAN;

	let manager = CredentialManager::builder(source.clone()).with_retry_policy(policy).build();
	let credential = manager.credential().await.expect("Retry should use the nominal delay.");

	assert_eq!(credential.value.expose(), "dddd");
	assert_eq!(source.calls(), 2);
}
