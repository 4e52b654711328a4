//! Post-mix alignment verification against a transcription of the final track.

pub mod alignment;
pub mod transcriber;
pub mod verifier;
pub mod whisper;

pub use alignment::{AlignmentIssue, IssueKind, check_alignment};
pub use transcriber::{AlignmentSegment, MockTranscriber, Transcriber};
pub use verifier::{VerificationOutcome, Verifier};
pub use whisper::{WhisperConfig, WhisperTranscriber};
