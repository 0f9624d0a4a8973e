#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use time::{Duration, OffsetDateTime, macros};
// self
use bearer_keeper::{
	credential::{IssuedCredential, TokenSecret},
	error::Error,
	source::{CredentialSource, SourceFuture},
};

/// Fixed instant every manual clock in the suite starts from.
pub const EPOCH: OffsetDateTime = macros::datetime!(2020-04-01 10:10:00 UTC);

/// One scripted issuer response.
#[derive(Clone, Debug)]
pub enum Step {
	/// Issue `token` valid for the given number of seconds.
	Issue(&'static str, i64),
	/// Reject the request with the given HTTP status.
	Fail(u16),
}

/// In-memory issuer that replays a script and repeats its final step forever.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
	steps: Arc<Mutex<VecDeque<Step>>>,
	calls: Arc<AtomicUsize>,
	delay: Option<Duration>,
}
impl ScriptedSource {
	pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
		let steps = steps.into_iter().collect::<VecDeque<_>>();

		assert!(!steps.is_empty(), "Scripted source needs at least one step.");

		Self { steps: Arc::new(Mutex::new(steps)), calls: Default::default(), delay: None }
	}

	pub fn issuing(token: &'static str, expire: i64) -> Self {
		Self::new([Step::Issue(token, expire)])
	}

	/// Makes every fetch sleep on the Tokio timer before answering.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn next_step(&self) -> Step {
		let mut steps = self.steps.lock().expect("Script lock should not be poisoned.");

		if steps.len() > 1 {
			steps.pop_front().expect("Script should not be empty.")
		} else {
			steps.front().cloned().expect("Script should not be empty.")
		}
	}
}
impl CredentialSource for ScriptedSource {
	fn fetch(&self) -> SourceFuture<'_> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay.try_into().expect("Delay should be positive.")).await;
			}

			match self.next_step() {
				Step::Issue(token, expire) =>
					Ok(IssuedCredential { token: TokenSecret::new(token), expire }),
				Step::Fail(status) =>
					Err(Error::IssuerRejected { status, body_preview: "scripted".into() }),
			}
		})
	}
}
