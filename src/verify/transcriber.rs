use crate::error::{Result, VoxtrackError};
use std::sync::Arc;

/// One transcribed stretch of speech with its position in the track.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSegment {
    pub text: String,
    /// Seconds from the start of the track
    pub start: f64,
    pub end: f64,
}

impl AlignmentSegment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Trait for timestamped speech-to-text.
///
/// Implementations are blocking; callers run them off the async runtime.
pub trait Transcriber: Send + Sync {
    /// Transcribe 16 kHz mono 16-bit PCM into ordered, timed segments.
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<AlignmentSegment>>;

    /// Name of the loaded model
    fn model_name(&self) -> &str;
}

impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<AlignmentSegment>> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    segments: Vec<AlignmentSegment>,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a mock that hears nothing
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            segments: Vec::new(),
            should_fail: false,
        }
    }

    /// Append a segment to the scripted transcription
    pub fn with_segment(mut self, text: &str, start: f64, end: f64) -> Self {
        self.segments.push(AlignmentSegment::new(text, start, end));
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[i16]) -> Result<Vec<AlignmentSegment>> {
        if self.should_fail {
            return Err(VoxtrackError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }
        Ok(self.segments.clone())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
