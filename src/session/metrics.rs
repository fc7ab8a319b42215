// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs;

/// Thread-safe counters for refreshes and retries.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	coalesced: AtomicU64,
	retries: AtomicU64,
}
impl SessionMetrics {
	/// Returns the number of refresh attempts, including ones abandoned for lack of a refresh
	/// token.
	pub fn refresh_attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that rotated the access token.
	pub fn refresh_successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh attempts that did not rotate the access token.
	pub fn refresh_failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many rejected requests reused a token rotated by a concurrent refresh.
	pub fn coalesced_refreshes(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Returns the number of requests retried after a refresh.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);

		obs::record_coalesced_refresh();
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);

		obs::record_request_retry();
	}
}
