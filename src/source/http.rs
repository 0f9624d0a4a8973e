//! `GET <issuer>` → `{"token", "expire"}` over reqwest.

// self
use crate::{
	_prelude::*,
	credential::IssuedCredential,
	error::{ConfigError, MalformedCredentialError, TransportError},
	source::{CredentialSource, SourceFuture},
};

const BODY_PREVIEW_CHARS: usize = 256;

/// Fetches credentials with an unauthenticated `GET` against a fixed issuer URL.
///
/// Only `200 OK` counts as success; any other status becomes [`Error::IssuerRejected`]
/// carrying a short preview of the body. Connection pooling, TLS, and timeouts are whatever
/// the wrapped [`ReqwestClient`] is configured with.
#[derive(Clone, Debug)]
pub struct HttpCredentialSource {
	issuer: Url,
	client: ReqwestClient,
}
impl HttpCredentialSource {
	/// Parses `issuer` and builds a source backed by a default reqwest client.
	pub fn new(issuer: &str) -> Result<Self> {
		let issuer = Url::parse(issuer).map_err(|source| ConfigError::InvalidIssuerUrl { source })?;

		Self::with_url(issuer)
	}

	/// Builds a source for an already-parsed issuer URL.
	pub fn with_url(issuer: Url) -> Result<Self> {
		if !matches!(issuer.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: issuer.scheme().into() }.into());
		}

		let client = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Ok(Self { issuer, client })
	}

	/// Replaces the HTTP client, e.g. to configure timeouts or custom TLS roots.
	pub fn with_client(mut self, client: ReqwestClient) -> Self {
		self.client = client;

		self
	}

	/// Issuer endpoint this source calls.
	pub fn issuer(&self) -> &Url {
		&self.issuer
	}

	async fn fetch_now(&self) -> Result<IssuedCredential> {
		let response =
			self.client.get(self.issuer.clone()).send().await.map_err(TransportError::issuer)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::issuer)?;

		if status != StatusCode::OK {
			return Err(Error::IssuerRejected {
				status: status.as_u16(),
				body_preview: body_preview(&body),
			});
		}

		parse_issued(&body)
	}
}
impl CredentialSource for HttpCredentialSource {
	fn fetch(&self) -> SourceFuture<'_> {
		Box::pin(self.fetch_now())
	}
}

fn parse_issued(body: &[u8]) -> Result<IssuedCredential> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| MalformedCredentialError::Parse { source }.into())
}

fn body_preview(body: &[u8]) -> String {
	String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_CHARS).collect()
}
