//! Crate-level error types shared by the credential source, manager, and decorator.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure reaching the issuer or the protected resource.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Issuer answered with a status other than `200 OK`.
	#[error("Credential issuer rejected the request with HTTP {status}.")]
	IssuerRejected {
		/// HTTP status code returned by the issuer.
		status: u16,
		/// Leading slice of the response body, for diagnostics.
		body_preview: String,
	},
	/// Issuer body could not be turned into a credential.
	#[error(transparent)]
	MalformedCredential(#[from] MalformedCredentialError),
	/// Every refresh attempt failed; wraps the last attempt's error.
	#[error("Credential refresh failed after {attempts} attempts.")]
	RefreshExhausted {
		/// Number of issuer calls made during the refresh cycle.
		attempts: u32,
		/// Error reported by the final attempt.
		#[source]
		source: Box<Error>,
	},
	/// The decorator could not obtain a credential, so the request was never sent.
	#[error("No credential is available to sign the request.")]
	CredentialUnavailable {
		/// Error reported by the credential manager.
		#[source]
		source: Box<Error>,
	},
	/// Protected resource refused the request with a non-success status.
	#[error("Protected resource rejected the request with HTTP {status}.")]
	ResourceRejected {
		/// Final HTTP status code returned by the resource.
		status: u16,
	},
}
impl Error {
	/// Returns `true` for per-attempt failures that the refresh retry policy recovers from.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			Self::Transport(_) | Self::IssuerRejected { .. } | Self::MalformedCredential(_)
		)
	}

	/// Walks [`Error::RefreshExhausted`] and [`Error::CredentialUnavailable`] wrappers and
	/// returns the innermost error.
	pub fn root_cause(&self) -> &Error {
		match self {
			Self::RefreshExhausted { source, .. } | Self::CredentialUnavailable { source } =>
				source.root_cause(),
			other => other,
		}
	}
}

/// Configuration and construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Issuer URL cannot be parsed.
	#[error("Credential issuer URL is invalid.")]
	InvalidIssuerUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Issuer URL uses a scheme other than `http` or `https`.
	#[error("Credential issuer URL must use http or https, not `{scheme}`.")]
	UnsupportedScheme {
		/// Rejected scheme.
		scheme: String,
	},
	/// Background renewal was started outside of a Tokio runtime.
	#[error("Auto refresh requires a running Tokio runtime.")]
	MissingRuntime {
		/// Runtime lookup failure.
		#[source]
		source: tokio::runtime::TryCurrentError,
	},
	/// Token contains bytes that cannot travel in an `Authorization` header.
	#[error("Credential cannot be encoded as an Authorization header value.")]
	InvalidHeaderValue {
		/// Underlying header encoding failure.
		#[source]
		source: reqwest::header::InvalidHeaderValue,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Issuer bodies that parsed as HTTP but not as a usable credential.
#[derive(Debug, ThisError)]
pub enum MalformedCredentialError {
	/// Body is not the expected JSON document.
	#[error("Credential issuer returned malformed JSON.")]
	Parse {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token field was present but empty.
	#[error("Credential issuer returned an empty token.")]
	EmptyToken,
	/// Lifetime was zero or negative.
	#[error("Credential lifetime must be positive, got {expire} seconds.")]
	NonPositiveLifetime {
		/// Raw `expire` value.
		expire: i64,
	},
	/// Lifetime is too large to add to the current instant.
	#[error("Credential lifetime of {expire} seconds exceeds the supported range.")]
	LifetimeOutOfRange {
		/// Raw `expire` value.
		expire: i64,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Which side of the exchange failed (`issuer` or `resource`).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a network failure observed while calling the credential issuer.
	pub fn issuer(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "the credential issuer", source: Box::new(src) }
	}

	/// Wraps a network failure observed while calling the protected resource.
	pub fn resource(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "the protected resource", source: Box::new(src) }
	}
}
