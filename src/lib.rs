//! voxtrack - Timed voiceover assembly for short promo videos
//!
//! Synthesizes each script section, mixes the clips onto a silent base track
//! at their offsets, normalizes loudness and checks the result against a
//! Whisper transcription.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod media;
pub mod mix;
pub mod models;
pub mod output;
pub mod overlap;
pub mod pipeline;
pub mod schedule;
pub mod synth;
pub mod verify;
pub mod workspace;

// Collaborator seams
pub use media::{CommandExecutor, Ffmpeg, SystemCommandExecutor};
pub use synth::{ElevenLabsSynthesizer, SpeechSynthesizer};
pub use verify::{Transcriber, Verifier};

// Pipeline
pub use output::{PipelineEvent, Reporter};
pub use pipeline::{Pipeline, PipelineOptions, PipelineReport};
pub use schedule::{Script, Section, Timeline};

// Error handling
pub use error::{Result, VoxtrackError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_hash_suffix_matches_build() {
        let ver = version_string();
        match option_env!("GIT_HASH") {
            Some(hash) if !hash.is_empty() => {
                assert_eq!(ver, format!("{}+{}", env!("CARGO_PKG_VERSION"), hash));
            }
            _ => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
