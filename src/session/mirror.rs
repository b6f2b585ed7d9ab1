//! History snapshot mirror
//!
//! Writes the full entry sequence to a fixed JSON file after every session
//! mutation, overwriting the previous snapshot. The file is an audit trail:
//! it is never read back at startup, only by tests and external tooling.

use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::session::Message;

/// Single-file JSON mirror of the session, pretty-printed `{role, content}` pairs
#[derive(Clone, Debug)]
pub struct HistoryMirror {
    path: PathBuf,
}

impl HistoryMirror {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the snapshot with the given sequence; parent directories are
    /// created when missing.
    pub fn snapshot(&self, messages: &[Message]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(&self.path, e))?;
        }
        let json = serde_json::to_string_pretty(messages)?;
        std::fs::write(&self.path, json).map_err(|e| PersistenceError::io(&self.path, e))
    }

    /// Reads the snapshot back; a missing file is an empty history.
    pub fn load(&self) -> Result<Vec<Message>, PersistenceError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| PersistenceError::io(&self.path, e))?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn snapshot_round_trips() {
        let dir = TempDir::new().unwrap();
        let mirror = HistoryMirror::new(dir.path().join("history.json"));
        let messages = vec![
            Message::system("rules"),
            Message::user("move the chair"),
            Message::assistant(r#"{"action": "move"}"#),
        ];

        mirror.snapshot(&messages).unwrap();
        assert_eq!(mirror.load().unwrap(), messages);
    }

    #[test]
    fn snapshot_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let mirror = HistoryMirror::new(dir.path().join("nested/deeper/history.json"));
        mirror.snapshot(&[Message::user("hi")]).unwrap();
        assert!(mirror.path().exists());
    }

    #[test]
    fn empty_sequence_writes_empty_array() {
        let dir = TempDir::new().unwrap();
        let mirror = HistoryMirror::new(dir.path().join("history.json"));
        mirror.snapshot(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(mirror.path()).unwrap(), "[]");
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let mirror = HistoryMirror::new(dir.path().join("never_written.json"));
        assert!(mirror.load().unwrap().is_empty());
    }

    #[test]
    fn snapshot_overwrites_previous_content() {
        let dir = TempDir::new().unwrap();
        let mirror = HistoryMirror::new(dir.path().join("history.json"));
        mirror.snapshot(&[Message::user("first"), Message::assistant("second")]).unwrap();
        mirror.snapshot(&[Message::user("only")]).unwrap();
        assert_eq!(mirror.load().unwrap(), vec![Message::user("only")]);
    }
}
