// self
use crate::obs::{FlowOutcome, FlowStage};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: FlowStage, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"fapi_par_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Records the outcome of `result` for `stage` and hands it back unchanged.
pub fn observe_stage<T, E>(stage: FlowStage, result: Result<T, E>) -> Result<T, E> {
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

	record_stage_outcome(stage, outcome);

	result
}
