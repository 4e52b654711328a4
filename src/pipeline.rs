//! Voiceover assembly pipeline.
//!
//! preflight → synthesize → predict overlaps → mix → normalize → verify
//!
//! Preflight (credential, then ffmpeg/ffprobe) runs before anything is
//! created on disk or sent over the network. Every later failure except
//! verification aborts the run; the run workspace is removed either way.

use crate::config::Config;
use crate::error::Result;
use crate::media::ffmpeg::{Ffmpeg, LoudnessTarget};
use crate::mix::{LoudnessNormalizer, MixPlanner};
use crate::output::{PipelineEvent, Reporter, Stage};
use crate::overlap::{self, OverlapWarning};
use crate::schedule::Timeline;
use crate::synth::{SpeechSynthesizer, SynthesisDriver, SynthesizedClip};
use crate::verify::verifier::{VerificationOutcome, Verifier};
use crate::workspace::RunWorkspace;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-run settings not owned by a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Where the normalized deliverable is written
    pub output: PathBuf,
    /// Parent of the run workspace (system temp dir if `None`)
    pub work_dir: Option<PathBuf>,
    /// Synthesis requests in flight at once
    pub max_concurrent: usize,
    pub loudness: LoudnessTarget,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output: config.output.path.clone(),
            work_dir: None,
            max_concurrent: config.synthesis.max_concurrent,
            loudness: LoudnessTarget::from_config(&config.mix),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub output: PathBuf,
    /// Clip measurements in section order. The clip files themselves are
    /// removed with the run workspace.
    pub clips: Vec<SynthesizedClip>,
    pub warnings: Vec<OverlapWarning>,
    pub verification: VerificationOutcome,
}

pub struct Pipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    ffmpeg: Ffmpeg,
    verifier: Verifier,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        ffmpeg: Ffmpeg,
        verifier: Verifier,
        options: PipelineOptions,
    ) -> Self {
        Self {
            synthesizer,
            ffmpeg,
            verifier,
            options,
        }
    }

    /// Replace the verification capability, e.g. once a model has loaded.
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Check local preconditions: credential first, then the media tools.
    pub async fn preflight(&self) -> Result<()> {
        self.synthesizer.ensure_ready()?;
        self.ffmpeg.check_available().await
    }

    /// Assemble the voiceover for `timeline`.
    pub async fn run(&self, timeline: &Timeline, reporter: &dyn Reporter) -> Result<PipelineReport> {
        self.preflight().await?;
        self.run_checked(timeline, reporter).await
    }

    /// Assemble the voiceover once [`Pipeline::preflight`] has already passed.
    pub async fn run_checked(
        &self,
        timeline: &Timeline,
        reporter: &dyn Reporter,
    ) -> Result<PipelineReport> {
        let workspace = RunWorkspace::create(self.options.work_dir.as_deref())?;
        reporter.report(&PipelineEvent::Started {
            sections: timeline.len(),
            total_chars: timeline.total_chars(),
            voice: self.synthesizer.describe(),
            jobs: self.options.max_concurrent,
        });

        let driver = SynthesisDriver::new(
            Arc::clone(&self.synthesizer),
            self.ffmpeg.clone(),
            self.options.max_concurrent,
        );
        let clips = driver.synthesize_all(timeline, &workspace).await?;

        // Reported in section order, each warning under its own section.
        let warnings = overlap::predict_all(timeline, &clips);
        for clip in &clips {
            let Some(section) = timeline.section(clip.section_index) else {
                continue;
            };
            reporter.report(&PipelineEvent::SectionSynthesized {
                index: clip.section_index,
                offset: section.offset,
                text: section.text.clone(),
                duration: clip.measured_duration,
                elapsed: clip.elapsed,
            });
            for warning in warnings
                .iter()
                .filter(|w| w.section_index == clip.section_index)
            {
                log::info!(
                    "section {} projected to end at {:.2}s, next starts at {}s",
                    warning.section_index,
                    warning.projected_end,
                    warning.next_offset
                );
                reporter.report(&PipelineEvent::OverlapPredicted(warning.clone()));
            }
        }

        let planner = MixPlanner::new(self.ffmpeg.clone());
        let plan = planner.plan(timeline, &clips, workspace.silence_base())?;
        reporter.report(&PipelineEvent::Stage(Stage::CreatingSilence));
        planner.create_base(&plan).await?;
        reporter.report(&PipelineEvent::Stage(Stage::Combining));
        let raw_mix = planner.combine(&plan, &workspace.raw_mix()).await?;

        reporter.report(&PipelineEvent::Stage(Stage::Normalizing));
        let normalizer = LoudnessNormalizer::new(self.ffmpeg.clone(), self.options.loudness);
        let output = normalizer.normalize(&raw_mix, &self.options.output).await?;

        if self.verifier.is_available() {
            reporter.report(&PipelineEvent::Stage(Stage::Transcribing));
        }
        let verification = self
            .verifier
            .verify(
                &output,
                timeline,
                &self.ffmpeg,
                &workspace.transcription_input(),
            )
            .await;
        reporter.report(&PipelineEvent::Verification(verification.clone()));

        drop(workspace);
        reporter.report(&PipelineEvent::Finished {
            output: output.clone(),
        });

        Ok(PipelineReport {
            output,
            clips,
            warnings,
            verification,
        })
    }
}

/// Re-check an existing track against a timeline without re-synthesizing.
pub async fn verify_track(
    audio: &Path,
    timeline: &Timeline,
    ffmpeg: &Ffmpeg,
    verifier: &Verifier,
    work_dir: Option<&Path>,
    reporter: &dyn Reporter,
) -> Result<VerificationOutcome> {
    if !audio.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", audio.display()),
        )
        .into());
    }
    ffmpeg.check_available().await?;

    let workspace = RunWorkspace::create(work_dir)?;
    if verifier.is_available() {
        reporter.report(&PipelineEvent::Stage(Stage::Transcribing));
    }
    let outcome = verifier
        .verify(audio, timeline, ffmpeg, &workspace.transcription_input())
        .await;
    reporter.report(&PipelineEvent::Verification(outcome.clone()));
    Ok(outcome)
}
