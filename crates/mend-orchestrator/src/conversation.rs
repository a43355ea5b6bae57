//! Append-only conversation log
//!
//! One labeled section per run, containing the summary the model produced.
//! Pure append: no deduplication, no size bound. An optional rotation
//! threshold renames the file to `<name>.1` before appending once it grows
//! past the limit; rotation is off by default and never changes the append
//! contract.

use chrono::Utc;
use mend_core::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Handle to the persistent conversation record
#[derive(Debug, Clone)]
pub struct ConversationLog {
    path: PathBuf,
    rotate_above_bytes: Option<u64>,
}

impl ConversationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotate_above_bytes: None,
        }
    }

    /// Rotate to `<name>.1` before appending once the file exceeds the
    /// threshold. `None` disables rotation.
    pub fn with_rotation(mut self, threshold: Option<u64>) -> Self {
        self.rotate_above_bytes = threshold;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole record, or empty if it does not exist yet
    pub fn load(&self) -> Result<String> {
        if self.path.exists() {
            Ok(std::fs::read_to_string(&self.path)?)
        } else {
            Ok(String::new())
        }
    }

    /// Append one labeled section containing `summary` (possibly empty)
    pub fn append(&self, summary: &str) -> Result<()> {
        self.rotate_if_needed()?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(
            file,
            "\n\n## Model update ({})\n{}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            summary
        )?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<()> {
        let Some(threshold) = self.rotate_above_bytes else {
            return Ok(());
        };

        if let Ok(meta) = std::fs::metadata(&self.path) {
            if meta.len() > threshold {
                let mut rotated = self.path.as_os_str().to_owned();
                rotated.push(".1");
                std::fs::rename(&self.path, PathBuf::from(rotated))?;
                tracing::info!(
                    "Rotated conversation log {} past {} bytes",
                    self.path.display(),
                    threshold
                );
            }
        }
        Ok(())
    }
}
