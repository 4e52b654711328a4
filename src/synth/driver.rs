//! Turns every section of a timeline into a persisted, measured clip.

use crate::error::{Result, VoxtrackError};
use crate::media::ffmpeg::Ffmpeg;
use crate::schedule::{Section, Timeline};
use crate::synth::synthesizer::{SpeechSynthesizer, SynthesisFailure};
use crate::workspace::RunWorkspace;
use futures_util::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Synthesized audio for one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedClip {
    pub section_index: usize,
    pub path: PathBuf,
    /// Rendered length in seconds, as measured by ffprobe.
    pub measured_duration: f64,
    /// Wall-clock time the synthesis request took.
    pub elapsed: Duration,
}

pub struct SynthesisDriver {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    ffmpeg: Ffmpeg,
    max_concurrent: usize,
}

impl SynthesisDriver {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, ffmpeg: Ffmpeg, max_concurrent: usize) -> Self {
        Self {
            synthesizer,
            ffmpeg,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Synthesize every section, at most `max_concurrent` requests at a time.
    ///
    /// Clips come back in section order regardless of completion order. The
    /// first failure aborts the remaining requests: mixing needs every clip.
    pub async fn synthesize_all(
        &self,
        timeline: &Timeline,
        workspace: &RunWorkspace,
    ) -> Result<Vec<SynthesizedClip>> {
        let semaphore = Semaphore::new(self.max_concurrent);

        let tasks = timeline
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let semaphore = &semaphore;
                let path = workspace.section_clip(index);
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| VoxtrackError::Other(e.to_string()))?;
                    self.synthesize(index, section, &path).await
                }
            });

        try_join_all(tasks).await
    }

    /// Synthesize one section into `path` and measure the result.
    pub async fn synthesize(
        &self,
        index: usize,
        section: &Section,
        path: &Path,
    ) -> Result<SynthesizedClip> {
        let started = Instant::now();
        log::debug!("synthesizing section {index}: {:?}", section.text);

        let audio = self
            .synthesizer
            .synthesize(&section.text)
            .await
            .map_err(|failure| match failure {
                SynthesisFailure::Auth(message) => VoxtrackError::SynthesisAuth { message },
                SynthesisFailure::Request(message) => VoxtrackError::Synthesis {
                    section: index,
                    message,
                },
            })?;
        let elapsed = started.elapsed();

        tokio::fs::write(path, &audio).await?;

        let measured_duration =
            self.ffmpeg
                .probe_duration(path)
                .await
                .map_err(|e| VoxtrackError::Synthesis {
                    section: index,
                    message: format!("could not measure clip duration: {e}"),
                })?;

        Ok(SynthesizedClip {
            section_index: index,
            path: path.to_path_buf(),
            measured_duration,
            elapsed,
        })
    }
}
