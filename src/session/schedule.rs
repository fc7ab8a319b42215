//! Cancellable handle for the proactive refresh task.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	obs::{self, FlowKind},
	session::SessionInner,
};

/// Owns at most one armed refresh task.
///
/// Tasks carry an id so a firing task can detach itself before it refreshes; the refresh then
/// arms a successor without aborting the task that is still running.
#[derive(Debug, Default)]
pub(super) struct RefreshSchedule {
	slot: Mutex<Option<ScheduledRefresh>>,
	next_id: AtomicU64,
}
impl RefreshSchedule {
	fn next_id(&self) -> u64 {
		self.next_id.fetch_add(1, Ordering::Relaxed)
	}

	fn install(&self, id: u64, handle: JoinHandle<()>) {
		let previous = self.slot.lock().replace(ScheduledRefresh { id, handle });

		if let Some(previous) = previous {
			previous.handle.abort();
		}
	}

	/// Forgets the task `id` without aborting it.
	fn detach(&self, id: u64) {
		let mut slot = self.slot.lock();

		if slot.as_ref().is_some_and(|scheduled| scheduled.id == id) {
			slot.take();
		}
	}

	pub(super) fn cancel(&self) {
		if let Some(scheduled) = self.slot.lock().take() {
			scheduled.handle.abort();
		}
	}

	pub(super) fn is_armed(&self) -> bool {
		self.slot.lock().as_ref().is_some_and(|scheduled| !scheduled.handle.is_finished())
	}
}

#[derive(Debug)]
struct ScheduledRefresh {
	id: u64,
	handle: JoinHandle<()>,
}

impl SessionInner {
	/// Arms the proactive refresh for `token`, replacing any armed task.
	///
	/// Without a Tokio runtime on the current thread, proactive refresh is skipped and the session
	/// relies on reactive refreshes alone.
	pub(super) fn schedule_refresh(self: &Arc<Self>, token: &TokenSecret) {
		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			obs::flow_warn!("No Tokio runtime is available; proactive refresh is disabled.");

			return;
		};
		let delay = self.config.refresh_policy.delay_for(token, OffsetDateTime::now_utc());
		let sleep_for = std::time::Duration::try_from(delay).unwrap_or_default();
		let id = self.schedule.next_id();
		let epoch = self.epoch();
		let session = Arc::downgrade(self);
		let token = token.clone();

		obs::flow_debug!(delay_secs = delay.whole_seconds(), "Scheduled a proactive refresh.");

		let handle = runtime.spawn(async move {
			tokio::time::sleep(sleep_for).await;

			let Some(session) = session.upgrade() else {
				return;
			};

			session.schedule.detach(id);
			session.refresh_proactively(epoch, token).await;
		});

		self.schedule.install(id, handle);
	}

	async fn refresh_proactively(self: &Arc<Self>, epoch: u64, scheduled: TokenSecret) {
		let result = obs::observe(FlowKind::Refresh, "proactive", async {
			let _singleflight = self.refresh_guard.lock().await;
			let current = self.credentials.read().clone();

			match current {
				Some(pair) if self.epoch() == epoch && pair.access_token == scheduled =>
					self.refresh_locked(pair).await.map(Some),
				_ => Ok(None),
			}
		})
		.await;

		match result {
			Ok(Some(_)) => obs::flow_debug!("Proactive refresh rotated the access token."),
			Ok(None) => obs::flow_debug!("Proactive refresh skipped; the session moved on."),
			Err(e) => obs::flow_warn!(error = %e, "Proactive refresh failed."),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::sync::oneshot;
	// self
	use super::*;

	// The task owns the sender, so the receiver resolves with an error once it is aborted.
	fn parked_task() -> (JoinHandle<()>, oneshot::Receiver<()>) {
		let (tx, rx) = oneshot::channel::<()>();
		let handle = tokio::spawn(async move {
			let _tx = tx;

			std::future::pending::<()>().await;
		});

		(handle, rx)
	}

	#[tokio::test]
	async fn install_aborts_the_previous_task() {
		let schedule = RefreshSchedule::default();
		let (first, first_rx) = parked_task();

		schedule.install(schedule.next_id(), first);

		assert!(schedule.is_armed());

		let (second, _second_rx) = parked_task();
		let second_id = schedule.next_id();

		schedule.install(second_id, second);

		assert!(first_rx.await.is_err());
		assert!(schedule.is_armed());

		schedule.detach(second_id);

		assert!(!schedule.is_armed());
	}

	#[tokio::test]
	async fn detach_ignores_other_ids() {
		let schedule = RefreshSchedule::default();
		let id = schedule.next_id();
		let (task, rx) = parked_task();

		schedule.install(id, task);
		schedule.detach(id + 1);

		assert!(schedule.is_armed());

		schedule.cancel();

		assert!(!schedule.is_armed());
		assert!(rx.await.is_err());
	}
}
