//! Markdown session log.
//!
//! Stands in for a host editor's cursor insertion: saved-file links are
//! appended to a markdown file instead. Append failures are logged and
//! swallowed, matching the collaborator's "no-op without a document"
//! contract.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use recorder_core::NoteSink;

pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NoteSink for SessionLog {
    fn insert_at_cursor(&self, text: &str) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    log::warn!("session log directory unavailable: {}", e);
                    return;
                }
            }
        }

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", text));

        if let Err(e) = result {
            log::warn!("failed to append to session log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.md");
        let log = SessionLog::new(&path);

        log.insert_at_cursor("[a.wav](takes/a.wav)");
        log.insert_at_cursor("[b.wav](takes/b.wav)");

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[a.wav](takes/a.wav)\n[b.wav](takes/b.wav)\n");
    }

    #[test]
    fn creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes/log.md");
        let log = SessionLog::new(&path);

        log.insert_at_cursor("entry");
        assert!(path.exists());
    }
}
