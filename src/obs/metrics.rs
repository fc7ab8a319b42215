// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bookshelf_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a request replayed after its access token was renewed.
pub fn record_request_retry() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bookshelf_client_request_retries_total").increment(1);
	}
}

/// Counts a rejected request that reused a token renewed by a concurrent caller.
pub fn record_coalesced_refresh() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bookshelf_client_refresh_coalesced_total").increment(1);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_without_a_recorder_is_a_no_op() {
		record_flow_outcome(FlowKind::Login, FlowOutcome::Failure);
		record_request_retry();
		record_coalesced_refresh();
	}
}
