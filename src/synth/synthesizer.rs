use crate::config::VoiceConfig;
use crate::error::{Result, VoxtrackError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Voice-setting bundle sent with every request of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl From<&VoiceConfig> for VoiceSettings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            stability: config.stability,
            similarity_boost: config.similarity_boost,
            style: config.style,
            use_speaker_boost: config.use_speaker_boost,
        }
    }
}

/// Why a single synthesis request failed.
#[derive(Debug, Error)]
pub enum SynthesisFailure {
    /// The service rejected the credential.
    #[error("{0}")]
    Auth(String),
    /// Network failure, timeout, error status or unusable response.
    #[error("{0}")]
    Request(String),
}

/// Trait for text-to-speech services.
///
/// Voice identity and settings are fixed when the synthesizer is built, so
/// every call of a run sounds the same.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Check local preconditions (credential present) without touching the network.
    fn ensure_ready(&self) -> Result<()>;

    /// Synthesize `text`, returning the encoded audio bytes (MP3).
    async fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, SynthesisFailure>;

    /// Human-readable voice description for the console report.
    fn describe(&self) -> String;
}

/// Mock synthesizer for testing
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    audio: Vec<u8>,
    missing_credential: bool,
    failing: Vec<String>,
    rejecting_auth: bool,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    /// Create a mock that returns a small placeholder payload for every text
    pub fn new() -> Self {
        Self {
            audio: b"ID3 mock mp3".to_vec(),
            ..Self::default()
        }
    }

    /// Behave as if the API key were not set
    pub fn without_credential(mut self) -> Self {
        self.missing_credential = true;
        self
    }

    /// Fail requests whose text contains `fragment`
    pub fn with_failure_on(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_string());
        self
    }

    /// Reject every request as unauthorized
    pub fn with_auth_rejection(mut self) -> Self {
        self.rejecting_auth = true;
        self
    }

    /// Delay the response for `text` (used to force out-of-order completion)
    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// Number of synthesis requests made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn ensure_ready(&self) -> Result<()> {
        if self.missing_credential {
            return Err(VoxtrackError::MissingCredential {
                var: crate::defaults::API_KEY_ENV.to_string(),
            });
        }
        Ok(())
    }

    async fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, SynthesisFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        if self.rejecting_auth {
            return Err(SynthesisFailure::Auth("status 401: invalid api key".to_string()));
        }
        if self.failing.iter().any(|f| text.contains(f.as_str())) {
            return Err(SynthesisFailure::Request(
                "mock synthesis failure".to_string(),
            ));
        }
        Ok(self.audio.clone())
    }

    fn describe(&self) -> String {
        "mock voice".to_string()
    }
}
