//! Whisper-based timestamped transcription.
//!
//! Requires the `whisper` feature (and cmake to build whisper.cpp). Without it
//! a stub with the same API is compiled that refuses to load.

use crate::defaults;
use crate::error::{Result, VoxtrackError};
use crate::verify::transcriber::{AlignmentSegment, Transcriber};
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for Whisper transcriber.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    pub model_path: PathBuf,
    /// Language code, or "auto" to detect
    pub language: String,
    /// Number of threads for inference (None = whisper.cpp default)
    pub threads: Option<usize>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: crate::models::download::model_path(defaults::WHISPER_MODEL),
            language: defaults::AUTO_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

/// Whether this build can run Whisper at all.
pub const fn is_compiled_in() -> bool {
    cfg!(feature = "whisper")
}

fn model_name_of(config: &WhisperConfig) -> String {
    config
        .model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim_start_matches("ggml-"))
        .unwrap_or("unknown")
        .to_string()
}

/// Whisper-based transcriber. The context is behind a Mutex for `Sync`.
#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Placeholder compiled without the `whisper` feature.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperTranscriber {
    /// Load a model.
    ///
    /// # Errors
    /// `TranscriptionModelNotFound` if the file is missing, `Transcription` if
    /// whisper.cpp cannot load it.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Keep whisper.cpp from printing to stderr over the report.
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(VoxtrackError::TranscriptionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_of(&config);
        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| VoxtrackError::Transcription {
                message: "Invalid UTF-8 in model path".to_string(),
            })?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| VoxtrackError::Transcription {
                message: format!("Failed to load Whisper model: {}", e),
            })?;

        log::debug!("loaded Whisper model {model_name} from {path}");
        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperTranscriber {
    /// Always fails: this build has no speech recognition.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(VoxtrackError::TranscriptionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }
        Err(VoxtrackError::Transcription {
            message: format!(
                "cannot load {}: built without the `whisper` feature",
                model_name_of(&config)
            ),
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

/// whisper.cpp timestamps are in centiseconds.
#[cfg(feature = "whisper")]
fn centis_to_secs(t: i64) -> f64 {
    t as f64 / 100.0
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<AlignmentSegment>> {
        let audio_f32 = crate::audio::to_f32(audio);

        let context = self
            .context
            .lock()
            .map_err(|e| VoxtrackError::Transcription {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context
            .create_state()
            .map_err(|e| VoxtrackError::Transcription {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| VoxtrackError::Transcription {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let segments = state
            .as_iter()
            .map(|segment| AlignmentSegment {
                text: segment.to_string(),
                start: centis_to_secs(segment.start_timestamp()),
                end: centis_to_secs(segment.end_timestamp()),
            })
            .collect::<Vec<_>>();

        log::debug!("whisper produced {} segments", segments.len());
        Ok(segments)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, _audio: &[i16]) -> Result<Vec<AlignmentSegment>> {
        Err(VoxtrackError::Transcription {
            message: "Whisper feature not enabled".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
