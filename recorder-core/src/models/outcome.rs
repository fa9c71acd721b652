/// One persisted output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Vault path the file was written to (after collision resolution).
    pub path: String,
    /// 1-based track index, or `None` for the merged mixdown.
    pub track_index: Option<usize>,
    /// Size of the written payload in bytes.
    pub bytes: u64,
}

/// Result of a completed Stop, reported to the delegate.
///
/// Partial success is explicit: in multi-file mode each track's save attempt
/// is independent, so `saved` can be shorter than the track count.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// Files actually persisted, in output order.
    pub saved: Vec<SavedFile>,
    /// Tracks whose save attempt failed (multi-file mode).
    pub failed_tracks: usize,
    /// Active capture time, excluding paused spans.
    pub duration_secs: f64,
}

impl SessionOutcome {
    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }
}
