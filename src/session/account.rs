//! Profile lookup and the unauthenticated health check.

// self
use crate::{
	_prelude::*,
	auth::{HealthStatus, UserProfile},
	http::HttpRequest,
	obs::{self, FlowKind},
	session::Session,
};

impl Session {
	/// Fetches the profile of the authenticated user.
	///
	/// Goes through [`Session::send`], so an expired access token is renewed first. Anonymous
	/// sessions fail with [`Error::Unauthenticated`] before any I/O.
	pub async fn profile(&self) -> Result<UserProfile> {
		obs::observe(FlowKind::Profile, "profile", async {
			let url = self.inner.config.endpoint(&self.inner.config.endpoints.profile)?;
			let request = HttpRequest::get(url).with_header("Accept", "application/json");
			let response = self.send(request).await?.error_for_status()?;

			Ok(response.content().into_json()?)
		})
		.await
	}

	/// Asks the service whether it is up. Never sends credentials.
	///
	/// An unhealthy service answering with a failure status surfaces as [`Error::Server`].
	pub async fn health(&self) -> Result<HealthStatus> {
		let inner = &self.inner;

		obs::observe(FlowKind::Health, "health", async {
			let url = inner.config.endpoint(&inner.config.endpoints.health)?;
			let request = HttpRequest::get(url).with_header("Accept", "application/json");
			let response = inner.dispatch(request).await?.error_for_status()?;

			Ok(response.content().into_json()?)
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, store::MemoryStore};

	#[tokio::test]
	async fn health_check_skips_credentials() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.url.path(), "/api/health");
			assert_eq!(request.header("Authorization"), None);

			Ok(json_response(200, serde_json::json!({ "status": "ok", "db": "ok" })))
		});
		let store = Arc::new(MemoryStore::with_entries([("access_token", "A1")]));
		let session = Session::restore(test_config("http://books.test/api"), transport, store)
			.await
			.expect("Restore should succeed.");
		let health = session.health().await.expect("Health check should succeed.");

		assert!(health.is_ok());
		assert_eq!(health.db.as_deref(), Some("ok"));
	}

	#[tokio::test]
	async fn unhealthy_service_surfaces_its_status() {
		let transport = ScriptedTransport::new(|_| {
			Ok(json_response(500, serde_json::json!({ "status": "error", "db": "error" })))
		});
		let session = Session::new(
			test_config("http://books.test"),
			transport,
			Arc::new(MemoryStore::default()),
		);
		let err = session.health().await.expect_err("A 500 health reply should fail.");

		assert_eq!(err.status(), Some(500));
	}

	#[tokio::test]
	async fn profile_is_fetched_with_the_bearer_token() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.url.path(), "/profile");
			assert_eq!(request.header("Authorization"), Some("Bearer A1"));

			Ok(json_response(
				200,
				serde_json::json!({
					"id": 3,
					"username": "alice",
					"email": "alice@example.com",
					"created_at": "2025-01-01T10:00:00",
				}),
			))
		});
		let store = Arc::new(MemoryStore::with_entries([("access_token", "A1")]));
		let session = Session::restore(test_config("http://books.test"), transport, store)
			.await
			.expect("Restore should succeed.");
		let profile = session.profile().await.expect("Profile lookup should succeed.");

		assert_eq!(profile.id.as_deref(), Some("3"));
		assert_eq!(profile.username, "alice");
		assert!(profile.created_at_utc().is_some());
	}

	#[tokio::test]
	async fn anonymous_profile_lookup_performs_no_io() {
		let transport = ScriptedTransport::unreachable();
		let session = Session::new(
			test_config("http://books.test"),
			transport.clone(),
			Arc::new(MemoryStore::default()),
		);
		let err = session.profile().await.expect_err("Anonymous profile lookup should fail.");

		assert!(matches!(err, Error::Unauthenticated));
		assert!(transport.requests().is_empty());
	}
}
