//! Decoded audio handling for transcription.

pub mod wav;

pub use wav::{WavSamples, to_f32};
