//! Authenticated session: credential pair, persisted bootstrap state, and the request flow.
//!
//! A [`Session`] is a cheap, clonable handle. Every clone shares one credential pair, one
//! refresh guard, and one proactive refresh task, so concurrent requests that hit an expired
//! access token trigger a single refresh call. Lifecycle transitions bump an internal epoch;
//! work started under an older epoch (a refresh racing a logout, a timer armed before a new
//! login) never commits credentials.

mod account;
mod event;
mod flow;
mod lifecycle;
mod metrics;
mod schedule;

pub use event::SessionEvent;
pub use lifecycle::LogoutOutcome;
pub use metrics::SessionMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::sync::broadcast;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	config::ClientConfig,
	http::HttpTransport,
	obs,
	store::SessionStore,
};
use schedule::RefreshSchedule;

const EVENT_CAPACITY: usize = 16;

/// Whether the session currently holds an access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// No access token is held.
	Anonymous,
	/// An access token is held.
	Authenticated,
}

/// Shared handle to one authenticated client session.
#[derive(Clone)]
pub struct Session {
	inner: Arc<SessionInner>,
}
impl Session {
	/// Creates an anonymous session without touching the store.
	pub fn new(
		config: ClientConfig,
		transport: Arc<dyn HttpTransport>,
		store: Arc<dyn SessionStore>,
	) -> Self {
		Self { inner: Arc::new(SessionInner::new(config, transport, store, None)) }
	}

	/// Rebuilds a session from persisted storage.
	///
	/// A non-empty access token under the configured key is the only signal that a previous
	/// session exists; the refresh token is loaded alongside it when present. Restored sessions
	/// arm the proactive refresh task immediately.
	pub async fn restore(
		config: ClientConfig,
		transport: Arc<dyn HttpTransport>,
		store: Arc<dyn SessionStore>,
	) -> Result<Self> {
		let keys = &config.storage_keys;
		let access = store.get(&keys.access_token).await?.filter(|value| !value.is_empty());
		let credentials = match access {
			Some(access) => {
				let refresh =
					store.get(&keys.refresh_token).await?.filter(|value| !value.is_empty());

				Some(CredentialPair::new(access, refresh))
			},
			None => None,
		};
		let inner = Arc::new(SessionInner::new(config, transport, store, credentials));

		if let Some(token) = inner.access_token() {
			obs::flow_debug!("Restored a persisted session.");

			inner.schedule_refresh(&token);
		}

		Ok(Self { inner })
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		if self.inner.credentials.read().is_some() {
			SessionState::Authenticated
		} else {
			SessionState::Anonymous
		}
	}

	/// Returns `true` while an access token is held.
	pub fn is_authenticated(&self) -> bool {
		self.state() == SessionState::Authenticated
	}

	/// Snapshot of the current credential pair.
	pub fn credentials(&self) -> Option<CredentialPair> {
		self.inner.credentials.read().clone()
	}

	/// Configuration the session was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// Subscribes to lifecycle notifications emitted after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.inner.events.subscribe()
	}

	/// Refresh and retry counters.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.inner.metrics
	}

	/// Returns `true` while a proactive refresh is armed.
	pub fn refresh_scheduled(&self) -> bool {
		self.inner.schedule.is_armed()
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("base_url", &self.inner.config.base_url.as_str())
			.field("state", &self.state())
			.field("refresh_scheduled", &self.refresh_scheduled())
			.finish()
	}
}

struct SessionInner {
	config: ClientConfig,
	transport: Arc<dyn HttpTransport>,
	store: Arc<dyn SessionStore>,
	credentials: RwLock<Option<CredentialPair>>,
	// Bumped under the `credentials` write lock on every lifecycle transition.
	epoch: AtomicU64,
	refresh_guard: AsyncMutex<()>,
	store_guard: AsyncMutex<()>,
	schedule: RefreshSchedule,
	events: broadcast::Sender<SessionEvent>,
	metrics: SessionMetrics,
}
impl SessionInner {
	fn new(
		config: ClientConfig,
		transport: Arc<dyn HttpTransport>,
		store: Arc<dyn SessionStore>,
		credentials: Option<CredentialPair>,
	) -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);

		Self {
			config,
			transport,
			store,
			credentials: RwLock::new(credentials),
			epoch: AtomicU64::new(0),
			refresh_guard: AsyncMutex::new(()),
			store_guard: AsyncMutex::new(()),
			schedule: RefreshSchedule::default(),
			events,
			metrics: SessionMetrics::default(),
		}
	}

	fn epoch(&self) -> u64 {
		self.epoch.load(Ordering::SeqCst)
	}

	fn access_token(&self) -> Option<TokenSecret> {
		self.credentials.read().as_ref().map(|pair| pair.access_token.clone())
	}

	/// Replaces the credentials for a new login and returns the new epoch.
	fn install(&self, pair: CredentialPair) -> u64 {
		let mut guard = self.credentials.write();
		let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

		*guard = Some(pair);

		epoch
	}

	/// Stores rotated credentials unless the session moved on since `epoch`.
	fn commit(&self, epoch: u64, pair: CredentialPair) -> bool {
		let mut guard = self.credentials.write();

		if guard.is_none() || self.epoch() != epoch {
			return false;
		}

		*guard = Some(pair);

		true
	}

	/// Clears the credentials, cancels the timer, and wipes the store.
	///
	/// With `expected` set, nothing happens unless the session is still on that epoch. Returns
	/// the credentials that were cleared.
	async fn teardown(&self, expected: Option<u64>) -> Option<CredentialPair> {
		let cleared = {
			let mut guard = self.credentials.write();

			if expected.is_some_and(|epoch| epoch != self.epoch()) {
				return None;
			}

			self.epoch.fetch_add(1, Ordering::SeqCst);

			guard.take()
		};

		self.schedule.cancel();
		self.clear_store().await;

		cleared
	}

	/// Writes `pair` to the store unless the session moved on since `epoch`.
	async fn persist(&self, epoch: u64, pair: &CredentialPair) -> Result<()> {
		let _persist = self.store_guard.lock().await;

		if self.epoch() != epoch {
			return Ok(());
		}

		let keys = &self.config.storage_keys;

		self.store.set(&keys.access_token, pair.access_token.expose().to_owned()).await?;

		match &pair.refresh_token {
			Some(refresh) =>
				self.store.set(&keys.refresh_token, refresh.expose().to_owned()).await?,
			None => self.store.remove(&keys.refresh_token).await?,
		}

		Ok(())
	}

	async fn clear_store(&self) {
		let _persist = self.store_guard.lock().await;
		let keys = &self.config.storage_keys;

		for key in [&keys.access_token, &keys.refresh_token] {
			if let Err(e) = self.store.remove(key).await {
				obs::flow_warn!(key = %key, error = %e, "Failed to clear a persisted credential.");
			}
		}
	}

	fn emit(&self, event: SessionEvent) {
		// Sending only fails when nobody is subscribed.
		let _ = self.events.send(event);
	}
}
impl Drop for SessionInner {
	fn drop(&mut self) {
		self.schedule.cancel();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, store::MemoryStore};

	#[tokio::test]
	async fn restore_uses_access_key_as_bootstrap_signal() {
		let transport = ScriptedTransport::unreachable();
		let store = Arc::new(MemoryStore::with_entries([("refresh_token", "R1")]));
		let session = Session::restore(test_config("http://books.test/api"), transport, store)
			.await
			.expect("Restore should succeed with a refresh token only.");

		assert_eq!(session.state(), SessionState::Anonymous);
		assert!(!session.refresh_scheduled());

		let store = Arc::new(MemoryStore::with_entries([
			("access_token", "A1"),
			("refresh_token", "R1"),
		]));
		let session = Session::restore(
			test_config("http://books.test/api"),
			ScriptedTransport::unreachable(),
			store,
		)
		.await
		.expect("Restore should succeed with a persisted pair.");
		let pair = session.credentials().expect("Restored session should hold credentials.");

		assert!(session.is_authenticated());
		assert_eq!(pair.access_token.expose(), "A1");
		assert_eq!(pair.refresh_token.as_ref().map(TokenSecret::expose), Some("R1"));
		assert!(session.refresh_scheduled());
	}

	#[tokio::test]
	async fn stale_epoch_cannot_commit_or_persist() {
		let store = Arc::new(MemoryStore::default());
		let session = Session::new(
			test_config("http://books.test"),
			ScriptedTransport::unreachable(),
			store.clone(),
		);
		let inner = &session.inner;
		let epoch = inner.install(CredentialPair::new("A1", Some("R1")));

		assert!(inner.teardown(Some(epoch)).await.is_some());
		assert!(!inner.commit(epoch, CredentialPair::new("A2", Some("R1"))));

		inner
			.persist(epoch, &CredentialPair::new("A2", Some("R1")))
			.await
			.expect("Stale persist should be skipped without error.");

		assert!(store.is_empty());
		assert_eq!(session.state(), SessionState::Anonymous);
	}

	#[tokio::test]
	async fn clones_share_the_refresh_timer() {
		let store = Arc::new(MemoryStore::with_entries([("access_token", "A1")]));
		let session = Session::restore(
			test_config("http://books.test"),
			ScriptedTransport::unreachable(),
			store,
		)
		.await
		.expect("Restore should succeed.");
		let clone = session.clone();

		drop(session);

		assert!(clone.refresh_scheduled());
	}
}
