//! Error types for voxtrack.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxtrackError {
    // Configuration errors (fatal, checked before any work starts)
    #[error("{var} is not set. Export it with: export {var}=your_key_here")]
    MissingCredential { var: String },

    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid voiceover script: {message}")]
    ScheduleInvalid { message: String },

    // Speech synthesis errors
    #[error("Speech synthesis failed for section {section}: {message}")]
    Synthesis { section: usize, message: String },

    #[error("Speech synthesis rejected the API key: {message}")]
    SynthesisAuth { message: String },

    // External command errors
    #[error("{tool} failed with status {status}: {stderr}")]
    CommandFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {secs}s")]
    CommandTimedOut { tool: String, secs: u64 },

    #[error("Mixing failed: {message}")]
    Mix { message: String },

    #[error("Loudness normalization failed: {message}")]
    Normalization { message: String },

    // Transcription errors
    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    #[error("Failed to decode audio: {message}")]
    AudioDecode { message: String },

    #[error("Model download failed: {message}")]
    ModelDownload { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl VoxtrackError {
    /// Whether this error is a missing local precondition rather than a
    /// failure of a run that already started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::ToolNotFound { .. }
                | Self::ConfigParse { .. }
                | Self::Config(_)
                | Self::ScheduleInvalid { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxtrackError>;
