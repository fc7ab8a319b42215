//! Login, logout, registration, and account-wide revocation.

// std
use std::convert::Infallible;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, LoginCredentials, RegisteredUser, Registration, TokenGrant},
	content::{self, ResponseContent},
	error::DecodeError,
	http::{HttpRequest, RequestBody},
	obs::{self, FlowKind},
	session::{Session, SessionEvent, SessionInner},
};

/// Result of [`Session::logout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogoutOutcome {
	/// Whether the session held credentials before the call.
	pub was_authenticated: bool,
	/// Whether the logout endpoint acknowledged the revocation.
	pub revoked_remotely: bool,
}

#[derive(Serialize)]
struct LogoutPayload<'a> {
	refresh_token: Option<&'a str>,
	access_token: &'a str,
}

impl Session {
	/// Exchanges user credentials for a token pair and persists it.
	///
	/// Blank identifiers or passwords fail validation without any I/O. A non-success response
	/// surfaces as [`Error::Server`] carrying the server's message when it sends one. Logging in
	/// while authenticated replaces the previous pair. When the pair cannot be persisted the
	/// session is left anonymous and the storage error is returned.
	pub async fn login(&self, credentials: &LoginCredentials) -> Result<()> {
		let inner = &self.inner;

		obs::observe(FlowKind::Login, "login", async {
			credentials.validate()?;

			let url = inner.config.endpoint(&inner.config.endpoints.login)?;
			let body =
				RequestBody::json(&credentials.to_payload()).map_err(DecodeError::JsonEncode)?;
			let response =
				inner.dispatch(HttpRequest::post(url).with_body(body)).await?.error_for_status()?;
			let pair = CredentialPair::from(content::decode_json::<TokenGrant>(&response.body)?);
			let epoch = inner.install(pair.clone());

			if let Err(e) = inner.persist(epoch, &pair).await {
				inner.teardown(Some(epoch)).await;

				return Err(e);
			}

			inner.schedule_refresh(&pair.access_token);
			inner.emit(SessionEvent::LoggedIn);

			obs::flow_debug!(
				refreshable = pair.can_refresh(),
				subject = ?crate::auth::TokenClaims::decode(pair.access_token.expose())
					.ok()
					.and_then(|claims| claims.sub),
				"Logged in."
			);

			Ok(())
		})
		.await
	}

	/// Ends the session locally and asks the server to revoke the pair.
	///
	/// Local credentials and storage are always cleared, even when the logout endpoint fails or
	/// is unreachable. Logging out an anonymous session does nothing.
	pub async fn logout(&self) -> LogoutOutcome {
		let inner = &self.inner;
		let Ok(outcome) = obs::observe(FlowKind::Logout, "logout", async {
			let Some(pair) = inner.teardown(None).await else {
				return Ok::<_, Infallible>(LogoutOutcome {
					was_authenticated: false,
					revoked_remotely: false,
				});
			};

			inner.emit(SessionEvent::LoggedOut);

			let revoked_remotely = match inner.revoke_remotely(&pair).await {
				Ok(()) => true,
				Err(e) => {
					obs::flow_warn!(error = %e, "Server-side logout failed; cleared locally.");

					false
				},
			};

			Ok(LogoutOutcome { was_authenticated: true, revoked_remotely })
		})
		.await;

		outcome
	}

	/// Creates a new account. Does not log in.
	pub async fn register(&self, registration: &Registration) -> Result<RegisteredUser> {
		let inner = &self.inner;

		obs::observe(FlowKind::Register, "register", async {
			registration.validate()?;

			let url = inner.config.endpoint(&inner.config.endpoints.register)?;
			let body = RequestBody::json(registration).map_err(DecodeError::JsonEncode)?;
			let response =
				inner.dispatch(HttpRequest::post(url).with_body(body)).await?.error_for_status()?;

			match response.content() {
				ResponseContent::Empty => Ok(RegisteredUser { user_id: None }),
				content => Ok(content.into_json()?),
			}
		})
		.await
	}

	/// Revokes every token of the account server-side, then tears down this session.
	///
	/// The call goes through [`Session::send`], so an expired access token is renewed first.
	/// The local session is kept when the server refuses.
	pub async fn revoke_all(&self) -> Result<()> {
		obs::observe(FlowKind::RevokeAll, "revoke_all", async {
			let url = self.inner.config.endpoint(&self.inner.config.endpoints.revoke_all)?;

			self.send(HttpRequest::post(url)).await?.error_for_status()?;

			if self.inner.teardown(None).await.is_some() {
				self.inner.emit(SessionEvent::Revoked);
			}

			Ok(())
		})
		.await
	}
}

impl SessionInner {
	async fn revoke_remotely(&self, pair: &CredentialPair) -> Result<()> {
		let url = self.config.endpoint(&self.config.endpoints.logout)?;
		let payload = LogoutPayload {
			refresh_token: pair.refresh_token.as_ref().map(|token| token.expose()),
			access_token: pair.access_token.expose(),
		};
		let body = RequestBody::json(&payload).map_err(DecodeError::JsonEncode)?;
		let request =
			HttpRequest::post(url).with_body(body).authorized(pair.access_token.bearer_header());

		self.dispatch(request).await?.error_for_status()?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		error::ValidationError,
		session::SessionState,
		store::MemoryStore,
	};

	#[tokio::test]
	async fn invalid_credentials_fail_without_io() {
		let transport = ScriptedTransport::unreachable();
		let session = Session::new(
			test_config("http://books.test"),
			transport.clone(),
			Arc::new(MemoryStore::default()),
		);
		let err = session
			.login(&LoginCredentials::new("  ", "pw"))
			.await
			.expect_err("Blank identifiers should be rejected.");

		assert!(matches!(err, Error::Validation(ValidationError::EmptyField { .. })));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn rejected_login_surfaces_server_message() {
		let transport = ScriptedTransport::new(|_| {
			Ok(json_response(401, serde_json::json!({ "msg": "Bad username or password" })))
		});
		let store = Arc::new(MemoryStore::default());
		let session = Session::new(test_config("http://books.test"), transport, store.clone());
		let err = session
			.login(&LoginCredentials::new("alice", "wrong"))
			.await
			.expect_err("A 401 from the login endpoint should fail.");

		match err {
			Error::Server(server) => {
				assert_eq!(server.status, 401);
				assert_eq!(server.message.as_deref(), Some("Bad username or password"));
			},
			other => panic!("Unexpected login error: {other:?}."),
		}

		assert_eq!(session.state(), SessionState::Anonymous);
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn login_without_refresh_token_removes_stale_refresh_key() {
		let transport = ScriptedTransport::new(|_| {
			Ok(json_response(200, serde_json::json!({ "access_token": "A1" })))
		});
		let store = Arc::new(MemoryStore::with_entries([("refresh_token", "OLD")]));
		let session = Session::new(test_config("http://books.test"), transport, store.clone());

		session.login(&LoginCredentials::new("alice", "pw")).await.expect("Login should succeed.");

		assert_eq!(store.peek("access_token").as_deref(), Some("A1"));
		assert_eq!(store.peek("refresh_token"), None);
	}

	#[tokio::test]
	async fn unpersistable_login_leaves_the_session_anonymous() {
		let transport = ScriptedTransport::new(|_| {
			let grant = serde_json::json!({ "access_token": "A1", "refresh_token": "R1" });

			Ok(json_response(200, grant))
		});
		let session = Session::new(
			test_config("http://books.test"),
			transport,
			Arc::new(ReadOnlyStore::default()),
		);
		let mut events = session.subscribe();
		let err = session
			.login(&LoginCredentials::new("alice", "pw"))
			.await
			.expect_err("A refused store write should fail the login.");

		assert!(matches!(err, Error::Storage(_)));
		assert_eq!(session.state(), SessionState::Anonymous);
		assert!(!session.refresh_scheduled());
		assert!(events.try_recv().is_err());
	}

	#[tokio::test]
	async fn logout_of_anonymous_session_is_a_no_op() {
		let transport = ScriptedTransport::unreachable();
		let session = Session::new(
			test_config("http://books.test"),
			transport.clone(),
			Arc::new(MemoryStore::default()),
		);
		let outcome = session.logout().await;

		assert_eq!(outcome, LogoutOutcome { was_authenticated: false, revoked_remotely: false });
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn register_accepts_numeric_ids_and_empty_bodies() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.url.path(), "/auth/register");

			Ok(json_response(201, serde_json::json!({ "msg": "created", "user_id": 42 })))
		});
		let session = Session::new(
			test_config("http://books.test"),
			transport,
			Arc::new(MemoryStore::default()),
		);
		let user = session
			.register(&Registration::new("alice", "alice@example.com", "pw"))
			.await
			.expect("Registration should succeed.");

		assert_eq!(user.user_id.as_deref(), Some("42"));
		assert!(!session.is_authenticated());

		let transport =
			ScriptedTransport::new(|_| Ok(crate::http::ApiResponse::new(201, None, Vec::new())));
		let session = Session::new(
			test_config("http://books.test"),
			transport,
			Arc::new(MemoryStore::default()),
		);
		let user = session
			.register(&Registration::new("bob", "bob@example.com", "pw"))
			.await
			.expect("An empty registration response should be accepted.");

		assert_eq!(user.user_id, None);
	}

	#[tokio::test]
	async fn refused_revoke_all_keeps_the_session() {
		let transport = ScriptedTransport::new(|_| {
			Ok(json_response(403, serde_json::json!({ "error": "forbidden" })))
		});
		let store = Arc::new(MemoryStore::with_entries([
			("access_token", "A1"),
			("refresh_token", "R1"),
		]));
		let session = Session::restore(test_config("http://books.test"), transport, store.clone())
			.await
			.expect("Restore should succeed.");
		let err = session.revoke_all().await.expect_err("A 403 should fail revoke-all.");

		assert_eq!(err.status(), Some(403));
		assert!(session.is_authenticated());
		assert_eq!(store.peek("access_token").as_deref(), Some("A1"));
	}

	#[tokio::test]
	async fn revoke_all_tears_down_after_success() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.header("Authorization"), Some("Bearer A1"));

			Ok(json_response(200, serde_json::json!({ "msg": "revoked" })))
		});
		let store = Arc::new(MemoryStore::with_entries([
			("access_token", "A1"),
			("refresh_token", "R1"),
		]));
		let session = Session::restore(test_config("http://books.test"), transport, store.clone())
			.await
			.expect("Restore should succeed.");
		let mut events = session.subscribe();

		session.revoke_all().await.expect("Revoke-all should succeed.");

		assert!(store.is_empty());
		assert!(!session.refresh_scheduled());
		assert_eq!(
			events.recv().await.expect("Revocation should be broadcast."),
			SessionEvent::Revoked
		);

		let books = session.config().endpoint("books").expect("Endpoint should resolve.");
		let err = session
			.send(HttpRequest::get(books))
			.await
			.expect_err("Requests after revoke-all should be unauthenticated.");

		assert!(matches!(err, Error::Unauthenticated));
	}
}
