// self
use crate::{_prelude::*, obs::StrategyKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRenewal<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRenewal<F> = F;

/// A span builder used by credential renewals.
#[derive(Clone, Debug)]
pub struct RenewalSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RenewalSpan {
	/// Creates a new span tagged with the provided strategy + stage.
	pub fn new(kind: StrategyKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("credhub_client.renewal", strategy = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRenewal<Fut>
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

	/// Emits a debug event inside the span.
	pub fn note(&self, message: &'static str) {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(|| tracing::debug!("{message}"));
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = message;
		}
	}
}
