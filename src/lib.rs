//! Keep a short-lived bearer credential fresh and attach it to outgoing requests.
//!
//! [`manager::CredentialManager`] caches the credential issued by a
//! [`source::CredentialSource`], refreshes it under a single-flight guard with bounded
//! exponential backoff, and can renew it in the background before it expires.
//! [`client::AuthorizedClient`] wraps any [`http::RequestExecutor`], signs each request with
//! the current credential, and resubmits once when the resource answers `401`.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod clock;
pub mod credential;
pub mod error;
pub mod http;
pub mod manager;
pub mod obs;
pub mod source;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{
		Client as ReqwestClient, Request as ReqwestRequest, Response as ReqwestResponse,
		StatusCode,
	};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
