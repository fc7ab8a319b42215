// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Emits a `debug` event when the `tracing` feature is enabled.
macro_rules! flow_debug {
	($($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!($($arg)+);
		}
	}};
}
pub(crate) use flow_debug;

/// Emits a `warn` event when the `tracing` feature is enabled.
macro_rules! flow_warn {
	($($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::warn!($($arg)+);
		}
	}};
}
pub(crate) use flow_warn;

/// Span wrapping one session operation.
///
/// Carries `flow` and `stage` from creation and an `outcome` field filled in once the operation
/// settles.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at `stage` (e.g., `reactive`, `proactive`, `manual`).
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bookshelf_client.flow",
				flow = kind.as_str(),
				stage,
				outcome = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Fills the `outcome` field.
	pub fn record_outcome(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrumented_flows_pass_values_through() {
		let span = FlowSpan::new(FlowKind::Refresh, "proactive");
		let value = span.instrument(async { 42 }).await;

		span.record_outcome(FlowOutcome::Success);

		assert_eq!(value, 42);
	}
}
