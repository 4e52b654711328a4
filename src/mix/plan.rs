//! Time-delayed mix of every clip over a silent base track.
//!
//! The silent base defines the output length: the mix uses
//! `amix=duration=first`, so clip audio that runs past the end of the
//! timeline is cut off instead of extending the track.

use crate::error::{Result, VoxtrackError};
use crate::media::ffmpeg::Ffmpeg;
use crate::schedule::Timeline;
use crate::synth::SynthesizedClip;
use std::path::{Path, PathBuf};

/// One clip input, delayed to its section's offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedTrack {
    pub path: PathBuf,
    pub delay_ms: u64,
}

/// Inputs of the mix, in ffmpeg input order: the base first, then one
/// delayed track per section in section order.
#[derive(Debug, Clone, PartialEq)]
pub struct MixPlan {
    pub base_silence: PathBuf,
    pub total_duration: f64,
    pub delayed_tracks: Vec<DelayedTrack>,
}

/// Millisecond delay for a section starting at `offset` seconds.
pub fn delay_ms(offset: f64) -> u64 {
    (offset * 1000.0).round() as u64
}

impl MixPlan {
    /// Derive the plan from the timeline and one clip per section.
    pub fn build(
        timeline: &Timeline,
        clips: &[SynthesizedClip],
        base_silence: PathBuf,
    ) -> Result<Self> {
        if clips.len() != timeline.len() {
            return Err(VoxtrackError::Mix {
                message: format!(
                    "expected {} clips, got {}",
                    timeline.len(),
                    clips.len()
                ),
            });
        }

        let mut delayed_tracks = Vec::with_capacity(clips.len());
        for (index, clip) in clips.iter().enumerate() {
            if clip.section_index != index {
                return Err(VoxtrackError::Mix {
                    message: format!(
                        "clip for section {} found at position {index}",
                        clip.section_index
                    ),
                });
            }
            let offset = timeline
                .section(index)
                .map(|s| s.offset)
                .unwrap_or_default();
            delayed_tracks.push(DelayedTrack {
                path: clip.path.clone(),
                delay_ms: delay_ms(offset),
            });
        }

        Ok(Self {
            base_silence,
            total_duration: timeline.total_duration(),
            delayed_tracks,
        })
    }

    /// Base plus delayed tracks.
    pub fn input_count(&self) -> usize {
        self.delayed_tracks.len() + 1
    }

    /// The `-filter_complex` graph.
    ///
    /// `[1]adelay=0|0[d0];[2]adelay=5000|5000[d1];[0][d0][d1]amix=inputs=3:duration=first`
    pub fn filter_graph(&self) -> String {
        let mut graph = String::new();
        let mut labels = String::from("[0]");
        for (i, track) in self.delayed_tracks.iter().enumerate() {
            graph.push_str(&format!(
                "[{}]adelay={ms}|{ms}[d{i}];",
                i + 1,
                ms = track.delay_ms
            ));
            labels.push_str(&format!("[d{i}]"));
        }
        graph.push_str(&format!(
            "{labels}amix=inputs={}:duration=first",
            self.input_count()
        ));
        graph
    }

    pub fn ffmpeg_args(&self, output: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        let inputs = std::iter::once(&self.base_silence)
            .chain(self.delayed_tracks.iter().map(|t| &t.path));
        for input in inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }
        args.push("-filter_complex".to_string());
        args.push(self.filter_graph());
        args.push(output.to_string_lossy().to_string());
        args
    }
}

/// Renders mix plans with ffmpeg.
#[derive(Debug, Clone)]
pub struct MixPlanner {
    ffmpeg: Ffmpeg,
}

impl MixPlanner {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }

    pub fn plan(
        &self,
        timeline: &Timeline,
        clips: &[SynthesizedClip],
        base_silence: PathBuf,
    ) -> Result<MixPlan> {
        MixPlan::build(timeline, clips, base_silence)
    }

    /// Generate the silent base, then mix every delayed clip onto it.
    pub async fn render(&self, plan: &MixPlan, output: &Path) -> Result<PathBuf> {
        self.create_base(plan).await?;
        self.combine(plan, output).await
    }

    /// Write the silent base track the plan mixes onto.
    pub async fn create_base(&self, plan: &MixPlan) -> Result<()> {
        self.ffmpeg
            .generate_silence(plan.total_duration, &plan.base_silence)
            .await
            .map_err(|e| mix_error("could not create silent base track", e))
    }

    /// Mix the delayed clips onto an existing base track.
    pub async fn combine(&self, plan: &MixPlan, output: &Path) -> Result<PathBuf> {
        log::debug!("mix filter: {}", plan.filter_graph());
        self.ffmpeg
            .run(&plan.ffmpeg_args(output))
            .await
            .map_err(|e| mix_error("could not combine sections", e))?;
        Ok(output.to_path_buf())
    }
}

fn mix_error(context: &str, source: VoxtrackError) -> VoxtrackError {
    VoxtrackError::Mix {
        message: format!("{context}: {source}"),
    }
}
