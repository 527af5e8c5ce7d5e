// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{RenewalOutcome, StrategyKind};

/// Records a renewal outcome via the global metrics recorder (when enabled).
pub fn record_renewal_outcome(kind: StrategyKind, outcome: RenewalOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"credhub_client_renewal_total",
			"strategy" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Thread-safe renewal counters owned by a single transport instance.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RenewalMetrics {
	/// Returns the total number of renewal attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals that installed a new credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed renewals.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, kind: StrategyKind, outcome: RenewalOutcome) {
		let counter = match outcome {
			RenewalOutcome::Attempt => &self.attempts,
			RenewalOutcome::Success => &self.success,
			RenewalOutcome::Failure => &self.failure,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		record_renewal_outcome(kind, outcome);
	}
}
