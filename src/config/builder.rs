// self
use crate::{
	_prelude::*,
	config::{AuthEndpoints, ClientConfig, RefreshPlacement, RefreshPolicy, StorageKeys},
	error::ConfigError,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Raw base URL, parsed during [`build`](Self::build).
	pub base_url: String,
	/// Auth endpoint paths.
	pub endpoints: AuthEndpoints,
	/// Refresh token placement.
	pub refresh_placement: RefreshPlacement,
	/// Proactive refresh timing.
	pub refresh_policy: RefreshPolicy,
	/// Persisted key names.
	pub storage_keys: StorageKeys,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults for every optional setting.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			endpoints: AuthEndpoints::default(),
			refresh_placement: RefreshPlacement::default(),
			refresh_policy: RefreshPolicy::default(),
			storage_keys: StorageKeys::default(),
		}
	}

	/// Overrides every auth endpoint path at once.
	pub fn endpoints(mut self, endpoints: AuthEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Prefixes every endpoint path with `prefix` (e.g., `api` yields `api/auth/login`).
	pub fn auth_prefix(mut self, prefix: &str) -> Self {
		let prefix = prefix.trim_matches('/');

		if prefix.is_empty() {
			return self;
		}

		for path in [
			&mut self.endpoints.login,
			&mut self.endpoints.refresh,
			&mut self.endpoints.logout,
			&mut self.endpoints.register,
			&mut self.endpoints.revoke_all,
			&mut self.endpoints.profile,
			&mut self.endpoints.health,
		] {
			*path = format!("{prefix}/{}", path.trim_start_matches('/'));
		}

		self
	}

	/// Selects where the refresh token is sent.
	pub fn refresh_placement(mut self, placement: RefreshPlacement) -> Self {
		self.refresh_placement = placement;

		self
	}

	/// Overrides the proactive refresh timing.
	pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
		self.refresh_policy = policy;

		self
	}

	/// Overrides the persisted key names.
	pub fn storage_keys(mut self, keys: StorageKeys) -> Self {
		self.storage_keys = keys;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = Url::parse(self.base_url.trim())
			.map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let config = ClientConfig {
			base_url,
			endpoints: self.endpoints,
			refresh_placement: self.refresh_placement,
			refresh_policy: self.refresh_policy,
			storage_keys: self.storage_keys,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		let scheme = self.base_url.scheme();

		if scheme != "http" && scheme != "https" {
			return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: self.base_url.to_string() });
		}

		for (endpoint, path) in [
			("login", &self.endpoints.login),
			("refresh", &self.endpoints.refresh),
			("logout", &self.endpoints.logout),
			("register", &self.endpoints.register),
			("revoke-all", &self.endpoints.revoke_all),
			("profile", &self.endpoints.profile),
			("health", &self.endpoints.health),
		] {
			validate_endpoint(endpoint, path)?;
		}

		validate_storage_keys(&self.storage_keys)?;

		self.refresh_policy.validate()
	}
}

fn validate_endpoint(endpoint: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.split('/').all(|segment| segment.trim().is_empty()) {
		Err(ConfigError::EmptyEndpoint { endpoint })
	} else {
		Ok(())
	}
}

fn validate_storage_keys(keys: &StorageKeys) -> Result<(), ConfigError> {
	if keys.access_token.trim().is_empty() {
		return Err(ConfigError::EmptyStorageKey { slot: "access token" });
	}
	if keys.refresh_token.trim().is_empty() {
		return Err(ConfigError::EmptyStorageKey { slot: "refresh token" });
	}
	if keys.access_token == keys.refresh_token {
		return Err(ConfigError::StorageKeyCollision);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejects_unsupported_schemes_and_bad_urls() {
		assert!(matches!(
			ClientConfig::builder("ftp://books.example.com").build(),
			Err(ConfigError::UnsupportedScheme { .. })
		));
		assert!(matches!(
			ClientConfig::builder("not a url").build(),
			Err(ConfigError::InvalidBaseUrl { .. })
		));
	}

	#[test]
	fn rejects_invalid_refresh_policy() {
		let policy = RefreshPolicy { lifetime_fraction: 1.5, ..RefreshPolicy::default() };

		assert!(matches!(
			ClientConfig::builder("https://books.example.com").refresh_policy(policy).build(),
			Err(ConfigError::InvalidLifetimeFraction { .. })
		));

		let policy =
			RefreshPolicy { fallback_interval: Duration::ZERO, ..RefreshPolicy::default() };

		assert!(matches!(
			ClientConfig::builder("https://books.example.com").refresh_policy(policy).build(),
			Err(ConfigError::NonPositiveRefreshInterval)
		));
	}

	#[test]
	fn rejects_blank_endpoints_and_colliding_keys() {
		let endpoints = AuthEndpoints { logout: "//".into(), ..AuthEndpoints::default() };

		assert!(matches!(
			ClientConfig::builder("https://books.example.com").endpoints(endpoints).build(),
			Err(ConfigError::EmptyEndpoint { endpoint: "logout" })
		));

		let keys = StorageKeys { access_token: "token".into(), refresh_token: "token".into() };

		assert!(matches!(
			ClientConfig::builder("https://books.example.com").storage_keys(keys).build(),
			Err(ConfigError::StorageKeyCollision)
		));
	}

	#[test]
	fn auth_prefix_rewrites_default_paths() {
		let config = ClientConfig::builder("http://books.example.com:5003")
			.auth_prefix("/api/")
			.build()
			.expect("Prefixed config should build.");

		assert_eq!(config.endpoints.login, "api/auth/login");
		assert_eq!(config.endpoints.revoke_all, "api/auth/revoke-all");
		assert_eq!(config.endpoints.profile, "api/profile");
		assert_eq!(config.endpoints.health, "api/health");
		assert_eq!(
			config.endpoint(&config.endpoints.refresh).expect("Refresh should resolve.").as_str(),
			"http://books.example.com:5003/api/auth/refresh"
		);
	}
}
