use crate::models::error::RecorderError;
use crate::models::outcome::SessionOutcome;
use crate::models::state::RecorderState;

/// Event delegate for session notifications.
///
/// Every state transition and every failure produces a short notice; hosts
/// surface these as transient UI messages. Methods may be called from the
/// controller's thread only.
pub trait RecorderDelegate: Send + Sync {
    /// Called after each state machine transition.
    fn on_state_changed(&self, state: RecorderState);

    /// A short, user-visible message (state changes, save counts, no-ops).
    fn on_notice(&self, message: &str);

    /// Called when an operation fails. The state machine has already been
    /// returned to idle when this fires for stop-path failures.
    fn on_error(&self, error: &RecorderError);

    /// Called once per session after output generation completes.
    fn on_session_complete(&self, outcome: &SessionOutcome);
}

/// Delegate that forwards everything to the `log` crate.
pub struct LogDelegate;

impl RecorderDelegate for LogDelegate {
    fn on_state_changed(&self, state: RecorderState) {
        log::info!("recorder state: {}", state);
    }

    fn on_notice(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_error(&self, error: &RecorderError) {
        log::error!("{}", error);
    }

    fn on_session_complete(&self, outcome: &SessionOutcome) {
        log::info!(
            "session complete: {} file(s) saved, {:.1}s captured",
            outcome.saved_count(),
            outcome.duration_secs
        );
    }
}
