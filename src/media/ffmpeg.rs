//! ffmpeg / ffprobe invocations.
//!
//! Argument lists are built by plain functions so they can be asserted on in
//! tests; `Ffmpeg` only dispatches them through a `CommandExecutor`.

use crate::config::MixConfig;
use crate::error::{Result, VoxtrackError};
use crate::media::executor::CommandExecutor;
use std::path::Path;
use std::sync::Arc;

/// Loudness normalization target applied to the raw mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessTarget {
    /// Integrated loudness in LUFS
    pub integrated: f32,
    /// True-peak ceiling in dBTP
    pub true_peak: f32,
    /// Loudness range in LU
    pub range: f32,
}

impl LoudnessTarget {
    pub fn from_config(config: &MixConfig) -> Self {
        Self {
            integrated: config.integrated_lufs,
            true_peak: config.true_peak_db,
            range: config.loudness_range,
        }
    }

    /// The ffmpeg `loudnorm` filter expression.
    pub fn filter(&self) -> String {
        format!(
            "loudnorm=I={}:TP={}:LRA={}",
            self.integrated, self.true_peak, self.range
        )
    }
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self::from_config(&MixConfig::default())
    }
}

/// Handle to the ffmpeg toolchain.
#[derive(Clone)]
pub struct Ffmpeg {
    executor: Arc<dyn CommandExecutor>,
    ffmpeg: String,
    ffprobe: String,
    sample_rate: u32,
}

impl std::fmt::Debug for Ffmpeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ffmpeg")
            .field("ffmpeg", &self.ffmpeg)
            .field("ffprobe", &self.ffprobe)
            .field("sample_rate", &self.sample_rate)
            .field("executor", &"<CommandExecutor>")
            .finish()
    }
}

impl Ffmpeg {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: &MixConfig) -> Self {
        Self {
            executor,
            ffmpeg: config.ffmpeg.clone(),
            ffprobe: config.ffprobe.clone(),
            sample_rate: config.sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Verify ffmpeg and ffprobe can be launched.
    ///
    /// Any failure is reported as `ToolNotFound`: a binary that cannot print
    /// its version is as unusable as a missing one.
    pub async fn check_available(&self) -> Result<()> {
        for tool in [&self.ffmpeg, &self.ffprobe] {
            if let Err(e) = self.executor.run(tool, &strings(&["-version"])).await {
                log::debug!("{tool} -version failed: {e}");
                return Err(VoxtrackError::ToolNotFound { tool: tool.clone() });
            }
        }
        Ok(())
    }

    /// Measure the duration of an audio file in seconds.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let stdout = self.executor.run(&self.ffprobe, &probe_args(path)).await?;
        parse_duration(&stdout)
    }

    /// Write `duration` seconds of mono silence to `output`.
    pub async fn generate_silence(&self, duration: f64, output: &Path) -> Result<()> {
        self.run(&silence_args(duration, self.sample_rate, output))
            .await
    }

    /// Apply loudness normalization to a single input.
    pub async fn normalize(
        &self,
        input: &Path,
        output: &Path,
        target: &LoudnessTarget,
    ) -> Result<()> {
        self.run(&loudnorm_args(input, output, target)).await
    }

    /// Convert any input into 16 kHz mono 16-bit PCM WAV for transcription.
    pub async fn decode_for_transcription(&self, input: &Path, output: &Path) -> Result<()> {
        self.run(&decode_args(input, output)).await
    }

    /// Run ffmpeg with a prepared argument list.
    pub async fn run(&self, args: &[String]) -> Result<()> {
        self.executor.run(&self.ffmpeg, args).await.map(|_| ())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn probe_args(path: &Path) -> Vec<String> {
    let mut args = strings(&[
        "-v",
        "quiet",
        "-show_entries",
        "format=duration",
        "-of",
        "csv=p=0",
    ]);
    args.push(path_arg(path));
    args
}

pub fn parse_duration(stdout: &str) -> Result<f64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| VoxtrackError::AudioDecode {
            message: format!("ffprobe returned no usable duration: {trimmed:?}"),
        })
}

pub fn silence_args(duration: f64, sample_rate: u32, output: &Path) -> Vec<String> {
    let mut args = strings(&["-y", "-f", "lavfi", "-i"]);
    args.push(format!("anullsrc=r={sample_rate}:cl=mono"));
    args.push("-t".to_string());
    args.push(duration.to_string());
    args.extend(strings(&["-q:a", "9", "-acodec", "libmp3lame"]));
    args.push(path_arg(output));
    args
}

pub fn loudnorm_args(input: &Path, output: &Path, target: &LoudnessTarget) -> Vec<String> {
    let mut args = strings(&["-y", "-i"]);
    args.push(path_arg(input));
    args.push("-af".to_string());
    args.push(target.filter());
    args.push(path_arg(output));
    args
}

pub fn decode_args(input: &Path, output: &Path) -> Vec<String> {
    let mut args = strings(&["-y", "-i"]);
    args.push(path_arg(input));
    args.extend(strings(&["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"]));
    args.push(path_arg(output));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::executor::MockCommandExecutor;
    use std::path::PathBuf;

    fn ffmpeg_with(mock: MockCommandExecutor) -> (Ffmpeg, Arc<MockCommandExecutor>) {
        let mock = Arc::new(mock);
        let ffmpeg = Ffmpeg::new(mock.clone(), &MixConfig::default());
        (ffmpeg, mock)
    }

    #[test]
    fn test_loudnorm_filter_formats_default_target() {
        assert_eq!(
            LoudnessTarget::default().filter(),
            "loudnorm=I=-16:TP=-1.5:LRA=11"
        );
    }

    #[test]
    fn test_silence_args() {
        let args = silence_args(19.0, 44100, &PathBuf::from("/w/silence_base.mp3"));
        assert_eq!(
            args,
            vec![
                "-y",
                "-f",
                "lavfi",
                "-i",
                "anullsrc=r=44100:cl=mono",
                "-t",
                "19",
                "-q:a",
                "9",
                "-acodec",
                "libmp3lame",
                "/w/silence_base.mp3",
            ]
        );
    }

    #[test]
    fn test_silence_args_keep_fractional_duration() {
        let args = silence_args(18.3, 44100, &PathBuf::from("s.mp3"));
        assert!(args.contains(&"18.3".to_string()));
    }

    #[test]
    fn test_loudnorm_args() {
        let args = loudnorm_args(
            &PathBuf::from("raw.mp3"),
            &PathBuf::from("voiceover.mp3"),
            &LoudnessTarget::default(),
        );
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "raw.mp3",
                "-af",
                "loudnorm=I=-16:TP=-1.5:LRA=11",
                "voiceover.mp3"
            ]
        );
    }

    #[test]
    fn test_probe_args_end_with_path() {
        let args = probe_args(&PathBuf::from("clip.mp3"));
        assert_eq!(args.last().unwrap(), "clip.mp3");
        assert!(args.contains(&"format=duration".to_string()));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("4.231000\n").unwrap(), 4.231);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("-1").is_err());
    }

    #[tokio::test]
    async fn test_check_available_probes_both_tools() {
        let (ffmpeg, mock) = ffmpeg_with(MockCommandExecutor::new());
        ffmpeg.check_available().await.unwrap();

        let programs: Vec<String> = mock.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(programs, vec!["ffmpeg", "ffprobe"]);
    }

    #[tokio::test]
    async fn test_check_available_reports_missing_ffprobe() {
        let (ffmpeg, _) = ffmpeg_with(MockCommandExecutor::new().with_missing("ffprobe"));
        match ffmpeg.check_available().await {
            Err(VoxtrackError::ToolNotFound { tool }) => assert_eq!(tool, "ffprobe"),
            other => panic!("Expected ToolNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_duration_uses_ffprobe() {
        let (ffmpeg, mock) =
            ffmpeg_with(MockCommandExecutor::new().with_duration("section_01.mp3", 3.5));
        let secs = ffmpeg
            .probe_duration(&PathBuf::from("/tmp/run/section_01.mp3"))
            .await
            .unwrap();
        assert_eq!(secs, 3.5);
        assert_eq!(mock.calls()[0].0, "ffprobe");
    }
}
