//! Immutable bearer credential values and the issuer's wire format.

// self
use crate::{_prelude::*, error::MalformedCredentialError};

/// Redacted token wrapper keeping the bearer value out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// A bearer token together with the window during which it is believed valid.
///
/// Credentials are never mutated; a refresh installs a new value in place of the old one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Opaque bearer value.
	pub value: TokenSecret,
	/// Instant the manager installed the credential.
	pub issued_at: OffsetDateTime,
	/// Lifetime reported by the issuer.
	pub lifetime: Duration,
	/// `issued_at + lifetime`; the credential is invalid from this instant on.
	pub valid_until: OffsetDateTime,
}
impl Credential {
	/// Builds a credential issued at `issued_at` and valid for `lifetime`.
	pub fn new(value: impl Into<String>, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
		Self {
			value: TokenSecret::new(value),
			issued_at,
			lifetime,
			valid_until: issued_at + lifetime,
		}
	}

	/// Returns `true` when the token is non-empty and `instant` precedes expiry.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		!self.value.is_empty() && instant < self.valid_until
	}

	/// Time left before expiry, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.valid_until - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Instant at which a proactive refresh should run, `bias` ahead of expiry.
	///
	/// When the bias swallows the whole lifetime the midpoint of the lifetime is used, so a
	/// short-lived credential is not refreshed in a tight loop.
	pub fn refresh_due_at(&self, bias: Duration) -> OffsetDateTime {
		let due = self.valid_until - bias;

		if due > self.issued_at { due } else { self.issued_at + self.lifetime / 2_i32 }
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("value", &self.value)
			.field("issued_at", &self.issued_at)
			.field("lifetime", &self.lifetime)
			.field("valid_until", &self.valid_until)
			.finish()
	}
}

/// JSON body returned by the credential issuer: `{"token": "...", "expire": 300}`.
#[derive(Clone, Deserialize)]
pub struct IssuedCredential {
	/// Bearer value.
	pub token: TokenSecret,
	/// Lifetime in whole seconds.
	#[serde(alias = "expire_seconds")]
	pub expire: i64,
}
impl IssuedCredential {
	/// Validates the payload and stamps it with `now`.
	pub fn into_credential(
		self,
		now: OffsetDateTime,
	) -> Result<Credential, MalformedCredentialError> {
		let Self { token, expire } = self;

		if token.is_empty() {
			return Err(MalformedCredentialError::EmptyToken);
		}
		if expire <= 0 {
			return Err(MalformedCredentialError::NonPositiveLifetime { expire });
		}

		let lifetime = Duration::seconds(expire);
		let valid_until = now
			.checked_add(lifetime)
			.ok_or(MalformedCredentialError::LifetimeOutOfRange { expire })?;

		Ok(Credential { value: token, issued_at: now, lifetime, valid_until })
	}
}
impl Debug for IssuedCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedCredential")
			.field("token", &self.token)
			.field("expire", &self.expire)
			.finish()
	}
}
