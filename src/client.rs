//! Request decorator that signs requests with the managed credential.
//!
//! [`AuthorizedClient::execute`] obtains a credential, sets `Authorization: Bearer <token>`,
//! and forwards the request to the wrapped [`RequestExecutor`]. A `401 Unauthorized`
//! invalidates the rejected credential and resubmits once with a freshly issued one; every
//! other status is handed back untouched. Transport errors are never retried here.

// crates.io
use reqwest::header::{AUTHORIZATION, HeaderValue};
// self
use crate::{
	_prelude::*,
	credential::Credential,
	error::ConfigError,
	http::RequestExecutor,
	manager::CredentialManager,
	obs,
};

/// Wraps an executor and signs every request with a credential from a
/// [`CredentialManager`].
pub struct AuthorizedClient<E = ReqwestClient>
where
	E: ?Sized + RequestExecutor,
{
	executor: Arc<E>,
	manager: CredentialManager,
}
impl<E> AuthorizedClient<E>
where
	E: ?Sized + RequestExecutor,
{
	const MAX_AUTH_RETRIES: u32 = 1;

	/// Combines an executor with the manager that supplies credentials.
	pub fn new(executor: impl Into<Arc<E>>, manager: CredentialManager) -> Self {
		Self { executor: executor.into(), manager }
	}

	/// Manager supplying credentials for this client.
	pub fn manager(&self) -> &CredentialManager {
		&self.manager
	}

	/// Underlying executor.
	pub fn executor(&self) -> &E {
		&self.executor
	}

	/// Signs and sends `request`, resubmitting once if the resource answers `401`.
	///
	/// The final response is returned whatever its status. Requests whose body cannot be
	/// cloned (streams) are sent once and a `401` is returned as-is.
	pub async fn execute(&self, mut request: ReqwestRequest) -> Result<ReqwestResponse> {
		let mut attempt = 0;

		loop {
			let credential = self
				.manager
				.credential()
				.await
				.map_err(|source| Error::CredentialUnavailable { source: Box::new(source) })?;

			sign(&mut request, &credential)?;

			let replay = if attempt < Self::MAX_AUTH_RETRIES { request.try_clone() } else { None };
			let response = self.executor.execute(request).await?;

			let rejected = response.status() == StatusCode::UNAUTHORIZED;

			if !rejected || attempt >= Self::MAX_AUTH_RETRIES {
				return Ok(response);
			}

			let Some(next) = replay else {
				obs::log_request_not_replayable();

				return Ok(response);
			};

			self.manager.invalidate(&credential);

			attempt += 1;

			obs::record_request_retry();
			obs::log_request_retry(attempt);

			request = next;
		}
	}

	/// Like [`execute`](Self::execute), but a final non-2xx status becomes
	/// [`Error::ResourceRejected`].
	pub async fn execute_checked(&self, request: ReqwestRequest) -> Result<ReqwestResponse> {
		let response = self.execute(request).await?;
		let status = response.status();

		if status.is_success() {
			Ok(response)
		} else {
			Err(Error::ResourceRejected { status: status.as_u16() })
		}
	}
}
impl AuthorizedClient<ReqwestClient> {
	/// Builds a client backed by a default reqwest client.
	pub fn with_default_client(manager: CredentialManager) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Ok(Self::new(client, manager))
	}
}
impl<E> Clone for AuthorizedClient<E>
where
	E: ?Sized + RequestExecutor,
{
	fn clone(&self) -> Self {
		Self { executor: self.executor.clone(), manager: self.manager.clone() }
	}
}
impl<E> Debug for AuthorizedClient<E>
where
	E: ?Sized + RequestExecutor,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedClient").field("manager", &self.manager).finish()
	}
}

/// Sets the bearer `Authorization` header, replacing any previous value.
pub fn sign(request: &mut ReqwestRequest, credential: &Credential) -> Result<()> {
	let mut value = HeaderValue::try_from(format!("Bearer {}", credential.value.expose()))
		.map_err(|source| ConfigError::InvalidHeaderValue { source })?;

	value.set_sensitive(true);
	request.headers_mut().insert(AUTHORIZATION, value);

	Ok(())
}
