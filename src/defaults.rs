//! Default configuration constants for voxtrack.
//!
//! This module provides shared constants used across the configuration types,
//! the external tool wrappers and the alignment checks.

/// Environment variable holding the ElevenLabs API key.
pub const API_KEY_ENV: &str = "ELEVEN_LABS_API_KEY";

/// Base URL of the ElevenLabs REST API.
pub const ELEVENLABS_ENDPOINT: &str = "https://api.elevenlabs.io";

/// Default ElevenLabs voice ("Matilda", professional American).
pub const DEFAULT_VOICE_ID: &str = "XrExE9yKIg1WjnnlVkGX";

/// Default ElevenLabs synthesis model.
pub const DEFAULT_TTS_MODEL: &str = "eleven_multilingual_v2";

/// Voice settings tuned for clear, professional delivery.
pub const STABILITY: f32 = 0.65;
pub const SIMILARITY_BOOST: f32 = 0.85;
pub const STYLE: f32 = 0.2;
pub const USE_SPEAKER_BOOST: bool = true;

/// Wall-clock limit for a single synthesis request in seconds.
pub const SYNTHESIS_TIMEOUT_SECS: u64 = 60;

/// Number of synthesis requests allowed in flight at once.
///
/// 1 reproduces strictly sequential synthesis.
pub const MAX_CONCURRENT_SYNTHESIS: usize = 4;

/// Sample rate of the silent base track in Hz.
pub const MIX_SAMPLE_RATE: u32 = 44100;

/// Loudness normalization target (EBU R128 style, suited to web video).
pub const INTEGRATED_LUFS: f32 = -16.0;
pub const TRUE_PEAK_DB: f32 = -1.5;
pub const LOUDNESS_RANGE: f32 = 11.0;

/// Wall-clock limit for one ffmpeg/ffprobe invocation in seconds.
pub const TOOL_TIMEOUT_SECS: u64 = 300;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// Deliverable path when neither config nor CLI names one.
pub const OUTPUT_FILE: &str = "voiceover.mp3";

/// Whisper model used for alignment verification.
///
/// "tiny" is plenty for locating known phrases in clean synthesized speech.
pub const WHISPER_MODEL: &str = "tiny";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Sample rate Whisper expects in Hz.
pub const TRANSCRIBE_SAMPLE_RATE: u32 = 16000;

/// A transcribed section may start this many seconds before its offset
/// without being reported.
pub const START_TOLERANCE_SECS: f64 = 0.5;

/// Number of leading characters of a section's text used to find it in the
/// transcription.
pub const MATCH_PREFIX_CHARS: usize = 20;

/// Report the GPU backend compiled into this build.
///
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
