//! Credential issuer contract and the built-in HTTP implementation.

pub mod http;

pub use http::HttpCredentialSource;

// self
use crate::{_prelude::*, credential::IssuedCredential};

/// Boxed future returned by [`CredentialSource::fetch`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<IssuedCredential>> + 'a + Send>>;

/// Remote issuer of time-limited bearer tokens.
///
/// One call to [`fetch`](CredentialSource::fetch) is one attempt; retries, backoff, and
/// caching belong to the [`CredentialManager`](crate::manager::CredentialManager). Failures
/// should be reported as [`Error::Transport`], [`Error::IssuerRejected`], or
/// [`Error::MalformedCredential`] so the manager treats them as retryable.
pub trait CredentialSource
where
	Self: 'static + Send + Sync,
{
	/// Requests a new credential from the issuer.
	fn fetch(&self) -> SourceFuture<'_>;
}
impl<S> CredentialSource for Arc<S>
where
	S: ?Sized + CredentialSource,
{
	fn fetch(&self) -> SourceFuture<'_> {
		(**self).fetch()
	}
}
