//! Catalog of ggml Whisper models usable for alignment checks.
//!
//! Verification only needs segment timestamps, so the catalog stops at
//! `small`: larger models cost minutes per run without better timing.

const HF_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "tiny", "base.en")
    pub name: &'static str,
    /// Download size in megabytes
    pub size_mb: u32,
    /// SHA-1 of the ggml file as published by whisper.cpp
    pub sha1: &'static str,
    /// Whether this model only understands English
    pub english_only: bool,
}

impl ModelInfo {
    /// HuggingFace download URL.
    pub fn url(&self) -> String {
        format!("{HF_BASE}/{}", self.file_name())
    }

    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self.name)
    }
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        size_mb: 75,
        sha1: "bd577a113a864445d4c299885e0cb97d4ba92b5f",
        english_only: false,
    },
    ModelInfo {
        name: "tiny.en",
        size_mb: 75,
        sha1: "c78c86eb1a8faa21b369bcd33207cc90d64ae9df",
        english_only: true,
    },
    ModelInfo {
        name: "base",
        size_mb: 142,
        sha1: "465707469ff3a37a2b9b8d8f89f2f99de7299dac",
        english_only: false,
    },
    ModelInfo {
        name: "base.en",
        size_mb: 142,
        sha1: "137c40403d78fd54d454da0f9bd998f78703390c",
        english_only: true,
    },
    ModelInfo {
        name: "small",
        size_mb: 466,
        sha1: "55356645c2b361a969dfd0ef2c5a50d530afd8d5",
        english_only: false,
    },
    ModelInfo {
        name: "small.en",
        size_mb: 466,
        sha1: "db8a495a91d927739e50b3fc1cc4c6b8f6c2d022",
        english_only: true,
    },
];

/// Find a model by name.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}
