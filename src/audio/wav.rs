//! WAV reading for the transcription input.
//!
//! ffmpeg already decodes the final mix to 16 kHz mono, but any WAV is
//! accepted: stereo is downmixed and other rates are resampled.

use crate::defaults::TRANSCRIBE_SAMPLE_RATE;
use crate::error::{Result, VoxtrackError};
use std::io::Read;
use std::path::Path;

/// 16 kHz mono 16-bit samples ready for transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct WavSamples {
    samples: Vec<i16>,
}

impl WavSamples {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| VoxtrackError::AudioDecode {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| VoxtrackError::AudioDecode {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(VoxtrackError::AudioDecode {
                message: format!(
                    "expected 16-bit PCM, got {} bits {:?}",
                    spec.bits_per_sample, spec.sample_format
                ),
            });
        }

        let raw: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| VoxtrackError::AudioDecode {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        let mono = downmix(raw, spec.channels);
        let samples = resample(&mono, spec.sample_rate, TRANSCRIBE_SAMPLE_RATE);
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / TRANSCRIBE_SAMPLE_RATE as f64
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

/// Average interleaved channels into one.
fn downmix(samples: Vec<i16>, channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples;
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let idx = (source_pos.floor() as usize).min(last);
            if idx == last {
                return samples[last];
            }
            let fraction = source_pos - idx as f64;
            let left = samples[idx] as f64;
            let right = samples[idx + 1] as f64;
            (left + (right - left) * fraction) as i16
        })
        .collect()
}

/// Whisper wants f32 in [-1.0, 1.0].
pub fn to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn mono_16khz_is_passed_through() {
        let input = vec![100i16, 200, 300, 400, 500];
        let wav = WavSamples::from_reader(Cursor::new(make_wav_data(16000, 1, &input))).unwrap();
        assert_eq!(wav.samples(), input.as_slice());
    }

    #[test]
    fn stereo_is_downmixed() {
        let stereo = vec![100i16, 200, 300, 400, 500, 600];
        let wav = WavSamples::from_reader(Cursor::new(make_wav_data(16000, 2, &stereo))).unwrap();
        assert_eq!(wav.samples(), &[150i16, 350, 550]);
    }

    #[test]
    fn mix_rate_is_resampled_to_16khz() {
        let input = vec![1000i16; 44100];
        let wav = WavSamples::from_reader(Cursor::new(make_wav_data(44100, 1, &input))).unwrap();

        assert!((15900..=16100).contains(&wav.samples().len()));
        assert!(wav.samples().iter().all(|&s| (900..=1100).contains(&s)));
        assert!((wav.duration_secs() - 1.0).abs() < 0.01);
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.wav");
        std::fs::write(&path, make_wav_data(16000, 1, &[1, 2, 3])).unwrap();
        assert_eq!(WavSamples::open(&path).unwrap().into_samples(), vec![1, 2, 3]);
    }

    #[test]
    fn invalid_data_is_a_decode_error() {
        let result = WavSamples::from_reader(Cursor::new(vec![0u8, 1, 2, 3]));
        match result {
            Err(VoxtrackError::AudioDecode { message }) => {
                assert!(message.contains("Failed to parse WAV file"));
            }
            other => panic!("Expected AudioDecode error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let result = WavSamples::open(Path::new("/nonexistent/voxtrack.wav"));
        assert!(matches!(result, Err(VoxtrackError::AudioDecode { .. })));
    }

    #[test]
    fn resample_upsamples_with_interpolation() {
        let resampled = resample(&[0i16, 1000, 2000], 8000, 16000);
        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0);
        assert!(resampled[1] > 0 && resampled[1] < 1000);
        assert_eq!(resampled[2], 1000);
    }

    #[test]
    fn resample_empty_is_empty() {
        assert!(resample(&[], 44100, 16000).is_empty());
    }

    #[test]
    fn to_f32_scales_to_unit_range() {
        let out = to_f32(&[0, 16384, -32768]);
        assert_eq!(out, vec![0.0, 0.5, -1.0]);
    }
}
