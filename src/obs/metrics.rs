// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_rp_flow_total",
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

/// Counts a swallowed cache failure (when metrics are enabled).
pub(crate) fn record_best_effort_metric(kind: FlowKind, action: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_rp_best_effort_failure_total",
			"flow" => kind.as_str(),
			"action" => action
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, action);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(FlowKind::Exchange, FlowOutcome::Failure);
		record_best_effort_metric(FlowKind::Logout, "delete_token");
	}
}
