use crate::error::{Result, VoxtrackError};
use crate::media::ffmpeg::{Ffmpeg, LoudnessTarget};
use std::path::{Path, PathBuf};

/// Brings the raw mix to a fixed loudness profile.
#[derive(Debug, Clone)]
pub struct LoudnessNormalizer {
    ffmpeg: Ffmpeg,
    target: LoudnessTarget,
}

impl LoudnessNormalizer {
    pub fn new(ffmpeg: Ffmpeg, target: LoudnessTarget) -> Self {
        Self { ffmpeg, target }
    }

    pub fn target(&self) -> &LoudnessTarget {
        &self.target
    }

    /// Normalize `raw_mix` into `output`, creating the output's parent directory.
    pub async fn normalize(&self, raw_mix: &Path, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.ffmpeg
            .normalize(raw_mix, output, &self.target)
            .await
            .map_err(|e| VoxtrackError::Normalization {
                message: e.to_string(),
            })?;

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MixConfig;
    use crate::media::executor::MockCommandExecutor;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_normalize_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockCommandExecutor::new());
        let normalizer = LoudnessNormalizer::new(
            Ffmpeg::new(mock.clone(), &MixConfig::default()),
            LoudnessTarget::default(),
        );
        let output = dir.path().join("out").join("voiceover.mp3");

        let written = normalizer
            .normalize(&dir.path().join("raw.mp3"), &output)
            .await
            .unwrap();

        assert_eq!(written, output);
        assert!(output.exists());
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(
            calls[0]
                .1
                .contains(&"loudnorm=I=-16:TP=-1.5:LRA=11".to_string())
        );
    }

    #[tokio::test]
    async fn test_custom_target_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockCommandExecutor::new());
        let target = LoudnessTarget {
            integrated: -14.0,
            true_peak: -1.0,
            range: 7.0,
        };
        let normalizer =
            LoudnessNormalizer::new(Ffmpeg::new(mock.clone(), &MixConfig::default()), target);

        normalizer
            .normalize(&dir.path().join("raw.mp3"), &dir.path().join("v.mp3"))
            .await
            .unwrap();
        assert!(
            mock.calls()[0]
                .1
                .contains(&"loudnorm=I=-14:TP=-1:LRA=7".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_is_a_normalization_error() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockCommandExecutor::new().with_failure("loudnorm");
        let normalizer = LoudnessNormalizer::new(
            Ffmpeg::new(Arc::new(mock), &MixConfig::default()),
            LoudnessTarget::default(),
        );

        let result = normalizer
            .normalize(&dir.path().join("raw.mp3"), &dir.path().join("v.mp3"))
            .await;
        assert!(matches!(
            result,
            Err(VoxtrackError::Normalization { .. })
        ));
    }
}
