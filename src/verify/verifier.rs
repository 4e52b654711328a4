//! Verification capability, chosen once at startup.

use crate::audio::WavSamples;
use crate::config::VerifyConfig;
use crate::media::ffmpeg::Ffmpeg;
use crate::models::download::resolve_model;
use crate::schedule::Timeline;
use crate::verify::alignment::{AlignmentIssue, check_alignment};
use crate::verify::transcriber::{AlignmentSegment, Transcriber};
use crate::verify::whisper::{self, WhisperConfig, WhisperTranscriber};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Whether the final track can be transcribed in this run.
#[derive(Clone)]
pub enum Verifier {
    Available(Arc<dyn Transcriber>),
    /// No transcription capability; verification is skipped with a notice.
    Unavailable { reason: String },
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(t) => f.debug_tuple("Available").field(&t.model_name()).finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Result of a verification attempt. Never fails the run.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Completed {
        segments: Vec<AlignmentSegment>,
        issues: Vec<AlignmentIssue>,
    },
    Unavailable {
        reason: String,
    },
    /// Transcription was attempted but did not produce segments.
    Failed {
        reason: String,
    },
}

impl VerificationOutcome {
    /// Alignment issues found; empty unless verification completed.
    pub fn issues(&self) -> &[AlignmentIssue] {
        match self {
            Self::Completed { issues, .. } => issues,
            _ => &[],
        }
    }

    /// Transcription ran and found no alignment issues.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Completed { issues, .. } if issues.is_empty())
    }
}

impl Verifier {
    pub fn available(transcriber: Arc<dyn Transcriber>) -> Self {
        Self::Available(transcriber)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Pick the capability for this run from configuration.
    ///
    /// Every way of not having Whisper (disabled, compiled out, model missing
    /// and not downloadable, model unloadable) yields `Unavailable`.
    pub async fn from_config(config: &VerifyConfig, allow_download: bool, progress: bool) -> Self {
        if !config.enabled {
            return Self::unavailable("verification disabled");
        }
        if !whisper::is_compiled_in() {
            return Self::unavailable(
                "this build has no Whisper support (rebuild with --features whisper)",
            );
        }

        let model_path = match resolve_model(&config.model) {
            Some(path) => path,
            None => match install_model(&config.model, allow_download, progress).await {
                Ok(path) => path,
                Err(reason) => return Self::unavailable(reason),
            },
        };

        let whisper_config = WhisperConfig {
            model_path,
            language: config.language.clone(),
            threads: None,
        };
        match tokio::task::spawn_blocking(move || WhisperTranscriber::new(whisper_config)).await {
            Ok(Ok(transcriber)) => Self::available(Arc::new(transcriber)),
            Ok(Err(e)) => Self::unavailable(e.to_string()),
            Err(e) => Self::unavailable(format!("model loading panicked: {e}")),
        }
    }

    /// Transcribe `audio` and compare it with the timeline.
    ///
    /// `scratch_wav` receives the decoded 16 kHz mono copy of the track.
    pub async fn verify(
        &self,
        audio: &Path,
        timeline: &Timeline,
        ffmpeg: &Ffmpeg,
        scratch_wav: &Path,
    ) -> VerificationOutcome {
        let transcriber = match self {
            Self::Available(t) => Arc::clone(t),
            Self::Unavailable { reason } => {
                return VerificationOutcome::Unavailable {
                    reason: reason.clone(),
                };
            }
        };

        if let Err(e) = ffmpeg.decode_for_transcription(audio, scratch_wav).await {
            return VerificationOutcome::Failed {
                reason: e.to_string(),
            };
        }

        let wav_path = scratch_wav.to_path_buf();
        let transcribed = tokio::task::spawn_blocking(move || {
            let wav = WavSamples::open(&wav_path)?;
            log::debug!("transcribing {:.1}s of audio", wav.duration_secs());
            transcriber.transcribe(wav.samples())
        })
        .await;

        match transcribed {
            Ok(Ok(segments)) => {
                let issues = check_alignment(&segments, timeline);
                VerificationOutcome::Completed { segments, issues }
            }
            Ok(Err(e)) => VerificationOutcome::Failed {
                reason: e.to_string(),
            },
            Err(e) => VerificationOutcome::Failed {
                reason: format!("transcription task failed: {e}"),
            },
        }
    }
}

#[cfg(feature = "model-download")]
async fn install_model(
    model: &str,
    allow_download: bool,
    progress: bool,
) -> std::result::Result<PathBuf, String> {
    if !allow_download {
        return Err(not_installed(model));
    }
    crate::models::download::download_model(model, progress)
        .await
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "model-download"))]
async fn install_model(
    model: &str,
    _allow_download: bool,
    _progress: bool,
) -> std::result::Result<PathBuf, String> {
    Err(not_installed(model))
}

fn not_installed(model: &str) -> String {
    format!("Whisper model '{model}' is not installed (run: voxtrack models install {model})")
}
