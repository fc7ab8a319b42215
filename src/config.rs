//! Client configuration: API base URL, auth endpoints, refresh policy, and storage layout.
//!
//! Values are assembled through [`ClientConfigBuilder`], which validates the base URL and the
//! refresh policy once so sessions and the books client can resolve endpoints without
//! re-checking invariants on every request.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::TokenClaims, auth::TokenSecret, error::ConfigError};

/// Auth endpoint paths, relative to the base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthEndpoints {
	/// Exchanges user credentials for a token pair.
	pub login: String,
	/// Exchanges a refresh token for a new access token.
	pub refresh: String,
	/// Revokes the current token pair.
	pub logout: String,
	/// Creates a new account.
	pub register: String,
	/// Revokes every token issued to the current user.
	pub revoke_all: String,
	/// Returns the authenticated user's profile.
	pub profile: String,
	/// Unauthenticated service health check.
	pub health: String,
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			login: "auth/login".into(),
			refresh: "auth/refresh".into(),
			logout: "auth/logout".into(),
			register: "auth/register".into(),
			revoke_all: "auth/revoke-all".into(),
			profile: "profile".into(),
			health: "health".into(),
		}
	}
}

/// Where the refresh token travels when calling the refresh endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPlacement {
	/// `Authorization: Bearer <refresh_token>`.
	#[default]
	BearerHeader,
	/// JSON body `{ "refresh_token": "<refresh_token>" }`.
	JsonBody,
}

/// Names of the two persisted values holding the credential pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
	/// Key holding the access token.
	pub access_token: String,
	/// Key holding the refresh token.
	pub refresh_token: String,
}
impl Default for StorageKeys {
	fn default() -> Self {
		Self { access_token: "access_token".into(), refresh_token: "refresh_token".into() }
	}
}

/// Timing of the proactive refresh task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefreshPolicy {
	/// Fraction of the token lifetime after which a proactive refresh fires.
	pub lifetime_fraction: f64,
	/// Delay used when the access token carries no readable `iat`/`exp`.
	pub fallback_interval: Duration,
	/// Lower bound for any computed delay.
	pub minimum_delay: Duration,
}
impl RefreshPolicy {
	const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::minutes(4);
	const DEFAULT_LIFETIME_FRACTION: f64 = 0.8;
	const DEFAULT_MINIMUM_DELAY: Duration = Duration::seconds(1);

	/// Computes how long to wait before proactively refreshing `token`.
	///
	/// Tokens with readable `iat`/`exp` claims refresh at `iat + fraction * lifetime`; opaque
	/// tokens fall back to the fixed interval.
	pub fn delay_for(&self, token: &TokenSecret, now: OffsetDateTime) -> Duration {
		let scheduled = TokenClaims::decode(token.expose()).ok().and_then(|claims| {
			let issued_at = claims.issued_at()?;
			let lifetime = claims.lifetime()?;

			Some(issued_at + lifetime * self.lifetime_fraction - now)
		});

		scheduled.unwrap_or(self.fallback_interval).max(self.minimum_delay)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !(self.lifetime_fraction > 0.0 && self.lifetime_fraction <= 1.0) {
			return Err(ConfigError::InvalidLifetimeFraction { fraction: self.lifetime_fraction });
		}
		if !self.fallback_interval.is_positive() {
			return Err(ConfigError::NonPositiveRefreshInterval);
		}
		if self.minimum_delay.is_negative() {
			return Err(ConfigError::NegativeMinimumDelay);
		}

		Ok(())
	}
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self {
			lifetime_fraction: Self::DEFAULT_LIFETIME_FRACTION,
			fallback_interval: Self::DEFAULT_FALLBACK_INTERVAL,
			minimum_delay: Self::DEFAULT_MINIMUM_DELAY,
		}
	}
}

/// Immutable client configuration consumed by sessions and resource clients.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
	/// API root; endpoint paths are appended to its path.
	pub base_url: Url,
	/// Auth endpoint paths.
	pub endpoints: AuthEndpoints,
	/// Refresh token placement for the refresh endpoint.
	pub refresh_placement: RefreshPlacement,
	/// Proactive refresh timing.
	pub refresh_policy: RefreshPolicy,
	/// Persisted key names.
	pub storage_keys: StorageKeys,
}
impl ClientConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a slash-separated path (e.g., `auth/login`) against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.endpoint_segments(path.split('/').filter(|segment| !segment.is_empty()))
	}

	/// Appends individually percent-encoded segments to the base URL.
	pub fn endpoint_segments<'a, I>(&self, segments: I) -> Result<Url, ConfigError>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeABase { url: self.base_url.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
	use time::macros;
	// self
	use super::*;

	fn config(base: &str) -> ClientConfig {
		ClientConfig::builder(base).build().expect("Config fixture should build.")
	}

	#[test]
	fn endpoints_append_to_base_path() {
		let root = config("http://books.example.com:5003");
		let nested = config("http://books.example.com:5003/api");

		assert_eq!(
			root.endpoint("auth/login").expect("Login endpoint should resolve.").as_str(),
			"http://books.example.com:5003/auth/login"
		);
		assert_eq!(
			nested.endpoint("/auth/refresh").expect("Refresh endpoint should resolve.").as_str(),
			"http://books.example.com:5003/api/auth/refresh"
		);
	}

	#[test]
	fn segments_are_percent_encoded() {
		let url = config("http://books.example.com/api")
			.endpoint_segments(["books", "author", "García Márquez/Jr"])
			.expect("Author endpoint should resolve.");

		assert_eq!(
			url.as_str(),
			"http://books.example.com/api/books/author/Garc%C3%ADa%20M%C3%A1rquez%2FJr"
		);
	}

	#[test]
	fn proactive_delay_tracks_token_lifetime() {
		let policy = RefreshPolicy::default();
		let payload = URL_SAFE_NO_PAD.encode("{\"iat\":1735689600,\"exp\":1735689900}");
		let token = TokenSecret::new(format!("h.{payload}.s"));

		assert_eq!(
			policy.delay_for(&token, macros::datetime!(2025-01-01 00:00 UTC)),
			Duration::minutes(4)
		);
		assert_eq!(
			policy.delay_for(&token, macros::datetime!(2025-01-01 00:03 UTC)),
			Duration::minutes(1)
		);
		assert_eq!(
			policy.delay_for(&token, macros::datetime!(2025-01-01 00:10 UTC)),
			Duration::seconds(1)
		);
	}

	#[test]
	fn opaque_tokens_use_fallback_interval() {
		let policy = RefreshPolicy::default();

		assert_eq!(
			policy.delay_for(&TokenSecret::new("A1"), OffsetDateTime::now_utc()),
			Duration::minutes(4)
		);
	}
}
