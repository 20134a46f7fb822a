//! Append-only, file-backed conversation log.

use super::ConversationMessage;
use crate::error::{ColabError, Result};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, instrument};

/// The shared conversation log.
///
/// Appends are serialized twice: by an in-process mutex for sessions sharing
/// this handle, and by an exclusive advisory lock on the file for other
/// processes. Each record is written with a single `write_all`, so a line is
/// never interleaved with another writer's. Reads take no lock; a torn or
/// malformed line is skipped by readers that parse records.
pub struct ConversationLog {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl ConversationLog {
    /// Open a log at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one message as a single line.
    #[instrument(skip(self, message), fields(role = %message.role))]
    pub fn append(&self, message: &ConversationMessage) -> Result<()> {
        let mut line = message.to_line();
        line.push('\n');

        let _guard = self.write_guard.lock().map_err(|e| {
            ColabError::ConversationLog(format!("Failed to acquire lock: {}", e))
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        FileExt::lock_exclusive(&file)?;
        let written = file.write_all(line.as_bytes()).and_then(|_| file.flush());
        FileExt::unlock(&file)?;
        written?;

        debug!("Appended {} bytes to {:?}", line.len(), self.path);
        Ok(())
    }

    /// Read every raw line. Returns `None` when the log does not exist yet.
    ///
    /// Invalid UTF-8 (e.g. a torn multi-byte write) is replaced rather than
    /// failing the whole read.
    pub fn read_lines(&self) -> Result<Option<Vec<String>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Some(text.lines().map(str::to_string).collect()))
    }

    /// The last `n` raw lines, oldest first.
    pub fn tail(&self, n: usize) -> Result<Option<Vec<String>>> {
        Ok(self.read_lines()?.map(|lines| last_n(lines, n)))
    }

    /// The last `n` raw lines parsed into messages, skipping malformed ones.
    /// A missing or unreadable log yields no messages.
    pub fn recent_messages(&self, n: usize) -> Vec<ConversationMessage> {
        match self.tail(n) {
            Ok(Some(lines)) => lines
                .iter()
                .filter_map(|line| ConversationMessage::parse_line(line))
                .collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!("Could not read conversation log: {}", e);
                Vec::new()
            }
        }
    }
}

/// Keep only the last `n` items.
pub(crate) fn last_n(mut lines: Vec<String>, n: usize) -> Vec<String> {
    let start = lines.len().saturating_sub(n);
    lines.drain(..start);
    lines
}
