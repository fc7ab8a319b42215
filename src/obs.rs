//! Optional observability helpers for session flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bookshelf_client.flow` with the `flow`
//!   (operation) and `stage` (call site) fields, plus debug/warn events for refreshes, retries,
//!   and expiry. Token values are never recorded.
//! - Enable `metrics` to increment the `bookshelf_client_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, plus
//!   `bookshelf_client_request_retries_total` and `bookshelf_client_refresh_coalesced_total`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use self::tracing::{flow_debug, flow_warn};

// self
use crate::_prelude::*;

/// Session operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Credential exchange at the login endpoint.
	Login,
	/// Refresh-token exchange, reactive or proactive.
	Refresh,
	/// Best-effort server-side logout.
	Logout,
	/// Authenticated request through the retry flow.
	Request,
	/// Account registration.
	Register,
	/// Revocation of every session of the account.
	RevokeAll,
	/// Profile lookup for the authenticated user.
	Profile,
	/// Unauthenticated service health check.
	Health,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Refresh => "refresh",
			FlowKind::Logout => "logout",
			FlowKind::Request => "request",
			FlowKind::Register => "register",
			FlowKind::RevokeAll => "revoke_all",
			FlowKind::Profile => "profile",
			FlowKind::Health => "health",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a session operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`FlowSpan`], recording attempt and outcome counters around it.
pub(crate) async fn observe<T, E, Fut>(
	kind: FlowKind,
	stage: &'static str,
	fut: Fut,
) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

	span.record_outcome(outcome);
	record_flow_outcome(kind, outcome);

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn flow_labels_are_snake_case() {
		assert_eq!(FlowKind::RevokeAll.to_string(), "revoke_all");
		assert_eq!(FlowKind::Login.as_str(), "login");
		assert_eq!(FlowOutcome::Failure.to_string(), "failure");
	}

	#[tokio::test]
	async fn observe_passes_results_through() {
		let ok = observe(FlowKind::Request, "observe_ok", async { Ok::<_, Error>(7) }).await;

		assert_eq!(ok.expect("Successful flows should pass through."), 7);

		let err = observe::<(), Error, _>(FlowKind::Refresh, "observe_err", async {
			Err(Error::Unauthenticated)
		})
		.await;

		assert!(matches!(err, Err(Error::Unauthenticated)));
	}
}
