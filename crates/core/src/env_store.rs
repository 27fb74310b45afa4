//! Dotenv-style `KEY=value` store with upsert semantics.
//!
//! Writing a key replaces its first existing line in place and drops any
//! later duplicates, so re-running token acquisition never leaves stale
//! entries behind. Comments, blank lines and unrelated keys are preserved.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Result of an [`EnvStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Key was absent and a new line was appended.
    Inserted,
    /// Key existed and its line was rewritten.
    Replaced {
        /// Number of later lines for the same key that were removed.
        duplicates_removed: usize,
    },
    /// Key already held exactly this value; the file was not touched.
    Unchanged,
}

/// A key=value file such as `.env`.
#[derive(Debug, Clone)]
pub struct EnvStore {
    path: PathBuf,
}

impl EnvStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sets `key` to `value`, creating the file if needed.
    ///
    /// # Errors
    /// Returns error if the key or value is malformed, or the file cannot be written.
    pub fn upsert(&self, key: &str, value: &str) -> Result<UpsertOutcome> {
        validate_key(key)?;
        if value.contains('\n') || value.contains('\r') {
            bail!("value for {key} must be a single line");
        }

        let contents = self.read()?;
        let new_line = format!("{key}={value}");

        let mut lines: Vec<&str> = Vec::new();
        let mut found = false;
        let mut unchanged = false;
        let mut duplicates_removed = 0;

        for line in contents.lines() {
            match parse_line(line) {
                Some((k, _)) if k == key => {
                    if found {
                        duplicates_removed += 1;
                        continue;
                    }
                    found = true;
                    unchanged = line.trim() == new_line;
                    lines.push(&new_line);
                }
                _ => lines.push(line),
            }
        }

        let outcome = match (found, unchanged, duplicates_removed) {
            (true, true, 0) => return Ok(UpsertOutcome::Unchanged),
            (true, _, duplicates_removed) => UpsertOutcome::Replaced { duplicates_removed },
            (false, _, _) => {
                lines.push(&new_line);
                UpsertOutcome::Inserted
            }
        };

        let mut output = lines.join("\n");
        output.push('\n');
        self.write(&output)?;

        tracing::debug!(path = %self.path.display(), key, ?outcome, "Updated env store");
        Ok(outcome)
    }

    fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read env file: {}", self.path.display()))
            }
        }
    }

    /// Writes through a sibling temp file and renames it over the original.
    fn write(&self, contents: &str) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write temp file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace env file: {}", self.path.display()))?;
        Ok(())
    }
}

/// Splits `KEY=value` (optionally prefixed with `export`). Blank lines and comments yield `None`.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    Some((key.trim(), value.trim()))
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("env key cannot be empty");
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid env key: {key}");
    }
    Ok(())
}
