//! Optional observability helpers for credential renewals.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `credhub_client.renewal` with the `strategy`
//!   (certificate/token) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `credhub_client_renewal_total` counter for every
//!   attempt/success/failure, labeled by `strategy` + `outcome`.
//!
//! Per-instance counters are always available through [`RenewalMetrics`].

mod counters;
mod span;

pub use counters::*;
pub use span::*;

// self
use crate::_prelude::*;

pub use crate::config::StrategyKind;

/// Outcome labels recorded for each renewal attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenewalOutcome {
	/// Renewal started.
	Attempt,
	/// New credential installed.
	Success,
	/// Renewal failed and the error was propagated to the caller.
	Failure,
}
impl RenewalOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RenewalOutcome::Attempt => "attempt",
			RenewalOutcome::Success => "success",
			RenewalOutcome::Failure => "failure",
		}
	}
}
impl Display for RenewalOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
