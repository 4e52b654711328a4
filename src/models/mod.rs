//! Whisper model management for alignment verification.

pub mod catalog;
pub mod download;
