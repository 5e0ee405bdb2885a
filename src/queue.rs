//! Durable queue of remaining sentences
//!
//! The saved list is the only resume checkpoint: plain UTF-8 text, one
//! sentence per line, in the order they will be offered. Every write
//! replaces the whole file through a temp file and a rename, so a crash
//! leaves either the old list or the new one.

use crate::config::DEFAULT_QUEUE_FILE;
use crate::error::QueueError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The on-disk list of sentences that have not been pasted yet
#[derive(Debug, Clone)]
pub struct DurableQueue {
    path: PathBuf,
}

impl DurableQueue {
    /// Queue stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Queue stored under the default file name in the working directory
    pub fn in_working_dir() -> Self {
        Self::new(DEFAULT_QUEUE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if a saved list is present and non-empty
    pub fn exists(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// Read the remaining sentences in order, skipping blank lines
    ///
    /// A missing file is an empty list. Lines come back exactly as saved,
    /// surrounding spaces included.
    pub fn load(&self) -> Result<Vec<String>, QueueError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(QueueError::io(&self.path, e)),
        };

        Ok(contents
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect())
    }

    /// The sentence that will be offered next, if any
    pub fn peek_front(&self) -> Result<Option<String>, QueueError> {
        Ok(self.load()?.into_iter().next())
    }

    /// Replace the saved list with `lines`
    pub fn save_full<S: AsRef<str>>(&self, lines: &[S]) -> Result<(), QueueError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| QueueError::io(&dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".step_paster")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| QueueError::io(&dir, e))?;

        let mut contents = String::new();
        for line in lines {
            contents.push_str(line.as_ref());
            contents.push('\n');
        }
        temp.write_all(contents.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| QueueError::io(temp.path(), e))?;

        temp.persist(&self.path)
            .map_err(|e| QueueError::io(&self.path, e.error))?;

        tracing::trace!("Saved {} sentence(s) to {:?}", lines.len(), self.path);
        Ok(())
    }

    /// Remove the front sentence and persist the rest
    ///
    /// Returns the removed sentence and what remains. Once the last
    /// sentence is removed the file itself is deleted.
    pub fn pop_front(&self) -> Result<(Option<String>, Vec<String>), QueueError> {
        let mut lines = self.load()?;
        if lines.is_empty() {
            return Ok((None, lines));
        }

        let removed = lines.remove(0);
        if lines.is_empty() {
            self.clear()?;
        } else {
            self.save_full(&lines)?;
        }

        tracing::debug!("Popped {:?}, {} remaining", removed, lines.len());
        Ok((Some(removed), lines))
    }

    /// Delete the saved list
    pub fn clear(&self) -> Result<(), QueueError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QueueError::io(&self.path, e)),
        }
    }
}
