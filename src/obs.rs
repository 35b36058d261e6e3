//! Optional observability for the authorization flow.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `fapi_par.flow` with a `stage` field
//!   per step, plus an event carrying the final authorization URL.
//! - Enable `metrics` to increment the `fapi_par_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Sequential steps of a flow invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Metadata discovery.
	Discovery,
	/// Ephemeral key generation.
	KeyGeneration,
	/// Request object assembly and signing.
	RequestObject,
	/// Pushed authorization request submission.
	PushedAuthorization,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::Discovery => "discovery",
			FlowStage::KeyGeneration => "key_generation",
			FlowStage::RequestObject => "request_object",
			FlowStage::PushedAuthorization => "pushed_authorization",
		}
	}
}
impl Display for FlowStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a stage.
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(FlowStage::PushedAuthorization.to_string(), "pushed_authorization");
		assert_eq!(FlowStage::KeyGeneration.as_str(), "key_generation");
		assert_eq!(FlowOutcome::Failure.to_string(), "failure");
	}
}
