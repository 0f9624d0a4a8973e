//! Executor seam for requests sent to the protected resource.
//!
//! [`AuthorizedClient`](crate::client::AuthorizedClient) only needs something that turns a
//! signed [`ReqwestRequest`] into a [`ReqwestResponse`]. [`ReqwestClient`] implements
//! [`RequestExecutor`] directly; wrap it (or replace it) to add middleware such as request
//! logging or a fake transport in tests.

// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`RequestExecutor::execute`].
pub type ExecutorFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ReqwestResponse, TransportError>> + 'a + Send>>;

/// Sends one HTTP request and yields the response, whatever its status.
///
/// Implementations must report non-2xx statuses as `Ok` responses; only failures to obtain a
/// response at all belong in the error channel.
pub trait RequestExecutor
where
	Self: 'static + Send + Sync,
{
	/// Executes `request`.
	fn execute(&self, request: ReqwestRequest) -> ExecutorFuture<'_>;
}
impl RequestExecutor for ReqwestClient {
	fn execute(&self, request: ReqwestRequest) -> ExecutorFuture<'_> {
		Box::pin(async move {
			ReqwestClient::execute(self, request).await.map_err(TransportError::resource)
		})
	}
}
impl<E> RequestExecutor for Arc<E>
where
	E: ?Sized + RequestExecutor,
{
	fn execute(&self, request: ReqwestRequest) -> ExecutorFuture<'_> {
		(**self).execute(request)
	}
}
