use crate::defaults;
use crate::error::{Result, VoxtrackError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub voice: VoiceConfig,
    pub synthesis: SynthesisConfig,
    pub mix: MixConfig,
    pub verify: VerifyConfig,
    pub output: OutputConfig,
}

/// Voice identity and the setting bundle sent with every synthesis call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

/// Speech synthesis transport
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
}

/// Mixing and loudness normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixConfig {
    pub sample_rate: u32,
    pub integrated_lufs: f32,
    pub true_peak_db: f32,
    pub loudness_range: f32,
    pub tool_timeout_secs: u64,
    pub ffmpeg: String,
    pub ffprobe: String,
}

/// Post-mix alignment verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerifyConfig {
    pub enabled: bool,
    pub model: String,
    pub language: String,
}

/// Deliverable location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: defaults::DEFAULT_VOICE_ID.to_string(),
            model_id: defaults::DEFAULT_TTS_MODEL.to_string(),
            stability: defaults::STABILITY,
            similarity_boost: defaults::SIMILARITY_BOOST,
            style: defaults::STYLE,
            use_speaker_boost: defaults::USE_SPEAKER_BOOST,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::ELEVENLABS_ENDPOINT.to_string(),
            timeout_secs: defaults::SYNTHESIS_TIMEOUT_SECS,
            max_concurrent: defaults::MAX_CONCURRENT_SYNTHESIS,
        }
    }
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::MIX_SAMPLE_RATE,
            integrated_lufs: defaults::INTEGRATED_LUFS,
            true_peak_db: defaults::TRUE_PEAK_DB,
            loudness_range: defaults::LOUDNESS_RANGE,
            tool_timeout_secs: defaults::TOOL_TIMEOUT_SECS,
            ffmpeg: defaults::FFMPEG.to_string(),
            ffprobe: defaults::FFPROBE.to_string(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: defaults::WHISPER_MODEL.to_string(),
            language: defaults::AUTO_LANGUAGE.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::OUTPUT_FILE),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values. Zero timeouts are rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let zero = if self.synthesis.timeout_secs == 0 {
            Some("[synthesis] timeout_secs")
        } else if self.mix.tool_timeout_secs == 0 {
            Some("[mix] tool_timeout_secs")
        } else {
            None
        };
        match zero {
            Some(key) => Err(VoxtrackError::ConfigParse {
                message: format!("{key} must be greater than zero"),
            }),
            None => Ok(()),
        }
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(VoxtrackError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(VoxtrackError::ConfigParse {
                message: format!("{}: {}", path.display(), e),
            }),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXTRACK_VOICE_ID → voice.voice_id
    /// - VOXTRACK_MODEL_ID → voice.model_id
    /// - VOXTRACK_OUTPUT → output.path
    /// - VOXTRACK_WHISPER_MODEL → verify.model
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(voice) = std::env::var("VOXTRACK_VOICE_ID")
            && !voice.is_empty()
        {
            self.voice.voice_id = voice;
        }

        if let Ok(model) = std::env::var("VOXTRACK_MODEL_ID")
            && !model.is_empty()
        {
            self.voice.model_id = model;
        }

        if let Ok(output) = std::env::var("VOXTRACK_OUTPUT")
            && !output.is_empty()
        {
            self.output.path = PathBuf::from(output);
        }

        if let Ok(model) = std::env::var("VOXTRACK_WHISPER_MODEL")
            && !model.is_empty()
        {
            self.verify.model = model;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxtrack/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("voxtrack")
            .join("config.toml")
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VoxtrackError::ConfigParse {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_voxtrack_env() {
        remove_env("VOXTRACK_VOICE_ID");
        remove_env("VOXTRACK_MODEL_ID");
        remove_env("VOXTRACK_OUTPUT");
        remove_env("VOXTRACK_WHISPER_MODEL");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.voice.voice_id, "XrExE9yKIg1WjnnlVkGX");
        assert_eq!(config.voice.model_id, "eleven_multilingual_v2");
        assert_eq!(config.voice.stability, 0.65);
        assert_eq!(config.voice.similarity_boost, 0.85);
        assert_eq!(config.voice.style, 0.2);
        assert!(config.voice.use_speaker_boost);

        assert_eq!(config.synthesis.timeout_secs, 60);
        assert_eq!(config.synthesis.max_concurrent, 4);

        assert_eq!(config.mix.sample_rate, 44100);
        assert_eq!(config.mix.integrated_lufs, -16.0);
        assert_eq!(config.mix.true_peak_db, -1.5);
        assert_eq!(config.mix.loudness_range, 11.0);
        assert_eq!(config.mix.ffmpeg, "ffmpeg");

        assert!(config.verify.enabled);
        assert_eq!(config.verify.model, "tiny");

        assert_eq!(config.output.path, PathBuf::from("voiceover.mp3"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [voice]
            voice_id = "cjVigY5qzO86Huf0OWal"
            stability = 0.55
            similarity_boost = 0.8
            style = 0.35

            [synthesis]
            max_concurrent = 1

            [mix]
            integrated_lufs = -14.0

            [verify]
            enabled = false

            [output]
            path = "out/promo.mp3"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.voice.voice_id, "cjVigY5qzO86Huf0OWal");
        assert_eq!(config.voice.stability, 0.55);
        assert_eq!(config.voice.style, 0.35);
        assert_eq!(config.voice.model_id, "eleven_multilingual_v2");
        assert_eq!(config.synthesis.max_concurrent, 1);
        assert_eq!(config.synthesis.timeout_secs, 60);
        assert_eq!(config.mix.integrated_lufs, -14.0);
        assert_eq!(config.mix.true_peak_db, -1.5);
        assert!(!config.verify.enabled);
        assert_eq!(config.output.path, PathBuf::from("out/promo.mp3"));
    }

    #[test]
    fn test_env_override_voice_and_output() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxtrack_env();

        set_env("VOXTRACK_VOICE_ID", "voice-123");
        set_env("VOXTRACK_OUTPUT", "/tmp/final.mp3");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.voice.voice_id, "voice-123");
        assert_eq!(config.output.path, PathBuf::from("/tmp/final.mp3"));
        assert_eq!(config.voice.model_id, "eleven_multilingual_v2");

        clear_voxtrack_env();
    }

    #[test]
    fn test_env_override_whisper_model() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxtrack_env();

        set_env("VOXTRACK_WHISPER_MODEL", "base.en");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.verify.model, "base.en");

        clear_voxtrack_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxtrack_env();

        set_env("VOXTRACK_MODEL_ID", "");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.voice.model_id, "eleven_multilingual_v2");

        clear_voxtrack_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[voice\nvoice_id = \"broken").unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(matches!(
            Config::load_or_default(temp_file.path()),
            Err(VoxtrackError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_zero_synthesis_timeout_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[synthesis]\ntimeout_secs = 0\n")
            .unwrap();

        match Config::load(temp_file.path()) {
            Err(VoxtrackError::ConfigParse { message }) => {
                assert!(message.contains("[synthesis] timeout_secs"));
            }
            other => panic!("Expected ConfigParse, got {:?}", other),
        }
        assert!(matches!(
            Config::load_or_default(temp_file.path()),
            Err(VoxtrackError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_zero_tool_timeout_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[mix]\ntool_timeout_secs = 0\n").unwrap();

        match Config::load(temp_file.path()) {
            Err(VoxtrackError::ConfigParse { message }) => {
                assert!(message.contains("[mix] tool_timeout_secs"));
            }
            other => panic!("Expected ConfigParse, got {:?}", other),
        }
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("voxtrack"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_to_toml_round_trips_through_load() {
        let mut config = Config::default();
        config.voice.voice_id = "abc".to_string();
        let rendered = config.to_toml().unwrap();

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
