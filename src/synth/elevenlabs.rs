//! ElevenLabs text-to-speech client.

use crate::config::{SynthesisConfig, VoiceConfig};
use crate::defaults;
use crate::error::{Result, VoxtrackError};
use crate::synth::synthesizer::{SpeechSynthesizer, SynthesisFailure, VoiceSettings};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

/// JSON body of `POST /v1/text-to-speech/{voice_id}`.
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    voice_id: String,
    model_id: String,
    settings: VoiceSettings,
    timeout: Duration,
}

impl std::fmt::Debug for ElevenLabsSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsSynthesizer")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ElevenLabsSynthesizer {
    /// Build a client, taking the API key from `ELEVEN_LABS_API_KEY`.
    ///
    /// A missing key is not an error here; [`SpeechSynthesizer::ensure_ready`]
    /// reports it before any request is made.
    pub fn from_env(voice: &VoiceConfig, synthesis: &SynthesisConfig) -> Result<Self> {
        let api_key = std::env::var(defaults::API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::new(api_key, voice, synthesis)
    }

    pub fn new(
        api_key: Option<String>,
        voice: &VoiceConfig,
        synthesis: &SynthesisConfig,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(synthesis.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoxtrackError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: synthesis.endpoint.trim_end_matches('/').to_string(),
            api_key,
            voice_id: voice.voice_id.clone(),
            model_id: voice.model_id.clone(),
            settings: VoiceSettings::from(voice),
            timeout,
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/text-to-speech/{}", self.endpoint, self.voice_id)
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: self.settings,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn ensure_ready(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(VoxtrackError::MissingCredential {
                var: defaults::API_KEY_ENV.to_string(),
            });
        }
        Ok(())
    }

    async fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, SynthesisFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SynthesisFailure::Auth(format!(
                "{} is not set",
                defaults::API_KEY_ENV
            )));
        };

        let response = self
            .client
            .post(self.url())
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisFailure::Request(format!(
                        "no response within {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    SynthesisFailure::Request(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        log::debug!("POST {} -> {}", self.url(), status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            let message = format!("status {status}: {}", body.trim());
            return Err(
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    SynthesisFailure::Auth(message)
                } else {
                    SynthesisFailure::Request(message)
                },
            );
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisFailure::Request(format!("failed to read audio: {e}")))?;
        if bytes.is_empty() {
            return Err(SynthesisFailure::Request(
                "service returned an empty audio body".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("ElevenLabs voice {} ({})", self.voice_id, self.model_id)
    }
}
