//! Pre-mix overlap prediction from measured clip lengths.

use crate::schedule::{Section, Timeline};
use crate::synth::SynthesizedClip;

/// A section whose speech is projected to run into the next section.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapWarning {
    pub section_index: usize,
    /// `offset + measured_duration`
    pub projected_end: f64,
    pub next_offset: f64,
}

impl OverlapWarning {
    /// Seconds of speech past the next section's start.
    pub fn excess(&self) -> f64 {
        self.projected_end - self.next_offset
    }
}

/// Warn when `section` would still be speaking at `next_offset`.
///
/// Times are compared to the millisecond, the mix's delay resolution, so
/// ending on the next offset is not an overlap.
pub fn predict(
    section_index: usize,
    section: &Section,
    clip: &SynthesizedClip,
    next_offset: f64,
) -> Option<OverlapWarning> {
    let projected_end = section.offset + clip.measured_duration;
    (millis(projected_end) > millis(next_offset)).then_some(OverlapWarning {
        section_index,
        projected_end,
        next_offset,
    })
}

fn millis(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// Predict overlaps between each section and the one after it.
///
/// The last section has no successor: running past the timeline end is
/// truncation by the mix, not an overlap.
pub fn predict_all(timeline: &Timeline, clips: &[SynthesizedClip]) -> Vec<OverlapWarning> {
    clips
        .iter()
        .filter_map(|clip| {
            let index = clip.section_index;
            let next = timeline.section(index + 1)?;
            let section = timeline.section(index)?;
            predict(index, section, clip, next.offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn clip(section_index: usize, measured_duration: f64) -> SynthesizedClip {
        SynthesizedClip {
            section_index,
            path: PathBuf::from(format!("section_{section_index:02}.mp3")),
            measured_duration,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_long_clip_produces_warning() {
        let section = Section::new(5.0, "Long line");
        let warning = predict(0, &section, &clip(0, 6.0), 9.0).unwrap();
        assert_eq!(warning.projected_end, 11.0);
        assert_eq!(warning.next_offset, 9.0);
        assert_eq!(warning.excess(), 2.0);
    }

    #[test]
    fn test_short_clip_produces_no_warning() {
        let section = Section::new(5.0, "Short");
        assert!(predict(0, &section, &clip(0, 3.0), 9.0).is_none());
    }

    #[test]
    fn test_ending_exactly_at_next_offset_is_fine() {
        let section = Section::new(5.0, "Exact");
        assert!(predict(0, &section, &clip(0, 4.0), 9.0).is_none());
    }

    #[test]
    fn test_ending_at_next_offset_despite_float_rounding_is_fine() {
        // 0.1 + 0.2 is 0.30000000000000004 in f64.
        let section = Section::new(0.1, "Time");
        assert!(predict(0, &section, &clip(0, 0.2), 0.3).is_none());
    }

    #[test]
    fn test_one_millisecond_past_next_offset_warns() {
        let section = Section::new(0.1, "Time");
        let warning = predict(0, &section, &clip(0, 0.201), 0.3).unwrap();
        assert_eq!(warning.next_offset, 0.3);
    }

    #[test]
    fn test_predict_all_skips_last_section() {
        let timeline = Timeline::new(
            10.0,
            vec![
                Section::new(0.0, "Hello there everyone"),
                Section::new(3.0, "World"),
            ],
        )
        .unwrap();

        // The last clip runs past the timeline end but has no successor.
        let warnings = predict_all(&timeline, &[clip(0, 5.0), clip(1, 20.0)]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].section_index, 0);
        assert_eq!(warnings[0].projected_end, 5.0);
        assert_eq!(warnings[0].next_offset, 3.0);
    }

    #[test]
    fn test_predict_all_without_overlaps() {
        let timeline = Timeline::new(
            10.0,
            vec![Section::new(0.0, "Hello"), Section::new(5.0, "World")],
        )
        .unwrap();
        assert!(predict_all(&timeline, &[clip(0, 4.0), clip(1, 3.0)]).is_empty());
    }

    #[test]
    fn test_equal_offsets_always_warn() {
        let timeline = Timeline::new(
            10.0,
            vec![Section::new(2.0, "One"), Section::new(2.0, "Two")],
        )
        .unwrap();
        let warnings = predict_all(&timeline, &[clip(0, 0.5), clip(1, 0.5)]);
        assert_eq!(warnings.len(), 1);
    }
}
