//! Per-run scratch directory for clips and intermediate mixes.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Uniquely named temporary directory owned by one pipeline run.
///
/// Everything the run writes besides the deliverable lives here and is
/// removed when the workspace is dropped, whether the run succeeded or not.
/// Concurrent runs sharing a parent directory never collide.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    /// Create a workspace under `parent`, or the system temp dir if `None`.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("voxtrack-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        log::debug!("run workspace: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn section_clip(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("section_{index:02}.mp3"))
    }

    pub fn silence_base(&self) -> PathBuf {
        self.dir.path().join("silence_base.mp3")
    }

    pub fn raw_mix(&self) -> PathBuf {
        self.dir.path().join("voiceover_raw.mp3")
    }

    pub fn transcription_input(&self) -> PathBuf {
        self.dir.path().join("transcribe.wav")
    }
}
