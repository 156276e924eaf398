use thiserror::Error;

/// Failures surfaced by the playback engine.
///
/// Stale prune-order entries and re-entrant step attempts are deliberately
/// not errors; they are recovered silently and reported through
/// [`StepOutcome`](super::session::StepOutcome) instead.
#[derive(Debug, Error)]
pub enum EngineError {
	/// Network failure, non-success status, or request timeout. No local
	/// state has been mutated when this is returned.
	#[error("request failed: {0}")]
	Transport(String),
	/// The response parsed as JSON but is missing expected fields. Treated
	/// the same as a transport failure by callers.
	#[error("malformed response: {0}")]
	Malformed(String),
	/// The replay action was cancelled before it was dispatched.
	#[error("action cancelled")]
	Cancelled,
}

impl EngineError {
	/// True for the cancellation variant, which replay must not retry.
	pub fn is_cancellation(&self) -> bool {
		matches!(self, EngineError::Cancelled)
	}
}
