use std::fmt;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → recording ⇄ paused
///           ↓          ↓
///          idle  ←  (stop)
/// ```
///
/// Transitions are driven through an explicit table ([`RecorderState::next`])
/// rather than ad-hoc flags; an event that is not in the table is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

/// Commands accepted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    Stop,
    Pause,
    Resume,
}

impl RecorderState {
    /// The transition table. Returns `None` for an event that is invalid in
    /// the current state; no transition skips a state.
    pub fn next(self, event: SessionEvent) -> Option<RecorderState> {
        use RecorderState::*;
        use SessionEvent::*;

        match (self, event) {
            (Idle, Start) => Some(Recording),
            (Recording, Stop) => Some(Idle),
            (Recording, Pause) => Some(Paused),
            (Paused, Resume) => Some(Recording),
            (Paused, Stop) => Some(Idle),
            _ => None,
        }
    }

    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether a session currently exists (recording or paused).
    pub fn is_active(self) -> bool {
        !self.is_idle()
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}
