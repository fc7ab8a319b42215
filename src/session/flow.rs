//! Authenticated request flow and the refresh-token exchange.
//!
//! [`Session::send`] attaches the bearer token, and on HTTP 401 renews the token once and
//! retries once. Renewals are serialized behind the session's refresh guard: a caller that
//! acquires the guard after another caller already rotated the rejected token reuses the new
//! one instead of calling the refresh endpoint again.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenGrant, TokenSecret},
	config::RefreshPlacement,
	content,
	error::ExpiryReason,
	http::{ApiResponse, HttpRequest, RequestBody},
	obs::{self, FlowKind},
	session::{Session, SessionEvent, SessionInner},
};

#[derive(Serialize)]
struct RefreshPayload<'a> {
	refresh_token: &'a str,
}

impl Session {
	/// Sends `request` with the current access token, renewing it once on HTTP 401.
	///
	/// Without an access token the call fails with [`Error::Unauthenticated`] before any I/O.
	/// Non-401 responses, including the response to the single retry, are returned unchanged;
	/// use [`ApiResponse::error_for_status`] to turn failures into errors. When renewal fails
	/// the session is cleared and [`Error::SessionExpired`] is returned without retrying.
	pub async fn send(&self, request: HttpRequest) -> Result<ApiResponse> {
		obs::observe(FlowKind::Request, "send", self.inner.send(request)).await
	}

	/// Renews the access token now, regardless of its remaining lifetime.
	///
	/// Failure expires the session exactly like a failed reactive refresh.
	pub async fn refresh(&self) -> Result<()> {
		let inner = &self.inner;

		obs::observe(FlowKind::Refresh, "manual", async {
			let _singleflight = inner.refresh_guard.lock().await;
			let current = inner.credentials.read().clone();
			let pair = current.ok_or(Error::Unauthenticated)?;

			inner.refresh_locked(pair).await.map(|_| ())
		})
		.await
	}
}

impl SessionInner {
	async fn send(self: &Arc<Self>, request: HttpRequest) -> Result<ApiResponse> {
		let Some(token) = self.access_token() else {
			return Err(Error::Unauthenticated);
		};
		let response = self.dispatch(request.authorized(token.bearer_header())).await?;

		if !response.is_unauthorized() {
			return Ok(response);
		}

		obs::flow_debug!(
			method = %request.method,
			path = request.url.path(),
			"Access token rejected; renewing before a single retry."
		);

		let renewed = self.refresh_after_rejection(&token).await?;

		self.metrics.record_retry();
		self.dispatch(request.authorized(renewed.bearer_header())).await
	}

	pub(super) async fn dispatch(&self, request: HttpRequest) -> Result<ApiResponse> {
		Ok(self.transport.execute(request).await?)
	}

	/// Resolves a fresh access token after `stale` was rejected.
	async fn refresh_after_rejection(self: &Arc<Self>, stale: &TokenSecret) -> Result<TokenSecret> {
		obs::observe(FlowKind::Refresh, "reactive", async {
			let _singleflight = self.refresh_guard.lock().await;
			let current = self.credentials.read().clone();

			match current {
				None => Err(Error::SessionExpired(ExpiryReason::Superseded)),
				Some(pair) if pair.access_token != *stale => {
					self.metrics.record_coalesced();

					Ok(pair.access_token)
				},
				Some(pair) => self.refresh_locked(pair).await.map(|pair| pair.access_token),
			}
		})
		.await
	}

	/// Exchanges the refresh token of `pair` and commits the rotated pair.
	///
	/// Callers must hold the refresh guard. Any failure to obtain a new token expires the
	/// session.
	pub(super) async fn refresh_locked(
		self: &Arc<Self>,
		pair: CredentialPair,
	) -> Result<CredentialPair> {
		let epoch = self.epoch();

		self.metrics.record_attempt();

		let Some(refresh_token) = pair.refresh_token.as_ref() else {
			return Err(self.expire(epoch, ExpiryReason::MissingRefreshToken).await);
		};
		let grant = match self.exchange_refresh_token(refresh_token).await {
			Ok(grant) => grant,
			Err(reason) => return Err(self.expire(epoch, reason).await),
		};
		let rotated = pair.rotated(grant);

		if !self.commit(epoch, rotated.clone()) {
			self.metrics.record_failure();

			return Err(Error::SessionExpired(ExpiryReason::Superseded));
		}

		// The renewed pair stays usable in memory; the next successful write catches up.
		if let Err(e) = self.persist(epoch, &rotated).await {
			obs::flow_warn!(error = %e, "Failed to persist renewed credentials.");
		}

		self.schedule_refresh(&rotated.access_token);
		self.metrics.record_success();
		self.emit(SessionEvent::Refreshed);

		obs::flow_debug!(
			rotated_refresh_token = rotated.refresh_token != pair.refresh_token,
			"Access token renewed."
		);

		Ok(rotated)
	}

	async fn exchange_refresh_token(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<TokenGrant, ExpiryReason> {
		let url = self
			.config
			.endpoint(&self.config.endpoints.refresh)
			.map_err(|e| ExpiryReason::RefreshUnreachable { message: e.to_string() })?;
		let request = match self.config.refresh_placement {
			RefreshPlacement::BearerHeader =>
				HttpRequest::post(url).authorized(refresh_token.bearer_header()),
			RefreshPlacement::JsonBody => {
				let payload = RefreshPayload { refresh_token: refresh_token.expose() };
				let body = RequestBody::json(&payload)
					.map_err(|e| ExpiryReason::RefreshMalformed { message: e.to_string() })?;

				HttpRequest::post(url).with_body(body)
			},
		};
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| ExpiryReason::RefreshUnreachable { message: e.to_string() })?;

		if !response.is_success() {
			return Err(ExpiryReason::RefreshRejected { status: response.status });
		}

		let grant = content::decode_json::<TokenGrant>(&response.body)
			.map_err(|e| ExpiryReason::RefreshMalformed { message: e.to_string() })?;

		if grant.access_token.is_blank() {
			return Err(ExpiryReason::RefreshMalformed {
				message: "access_token is empty".into(),
			});
		}

		Ok(grant)
	}

	/// Clears the session after a failed renewal and returns the error to surface.
	async fn expire(&self, epoch: u64, reason: ExpiryReason) -> Error {
		self.metrics.record_failure();

		obs::flow_warn!(reason = %reason, "Token renewal failed; clearing the session.");

		if self.teardown(Some(epoch)).await.is_some() {
			self.emit(SessionEvent::Expired(reason.clone()));
		}

		Error::SessionExpired(reason)
	}
}
