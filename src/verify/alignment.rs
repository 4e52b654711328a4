//! Comparison of transcribed timestamps against the scripted timeline.

use crate::defaults::{MATCH_PREFIX_CHARS, START_TOLERANCE_SECS};
use crate::schedule::Timeline;
use crate::verify::transcriber::AlignmentSegment;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Speech begins more than the tolerance before the section's offset.
    StartsTooEarly,
    /// Speech is still going when the next section (or the track end) begins.
    OverlapsNext,
}

/// A section whose transcribed timing disagrees with the script.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentIssue {
    pub section_index: usize,
    pub kind: IssueKind,
    /// Scripted time in seconds: the offset for `StartsTooEarly`, the next
    /// section's offset for `OverlapsNext`.
    pub expected: f64,
    /// Transcribed start or end in seconds.
    pub observed: f64,
}

impl fmt::Display for AlignmentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::StartsTooEarly => write!(
                f,
                "Section {} starts too early: expected {}s, actual {:.1}s",
                self.section_index, self.expected, self.observed
            ),
            IssueKind::OverlapsNext => write!(
                f,
                "Section {} overlaps into next scene: ends at {:.1}s, next scene at {}s",
                self.section_index, self.observed, self.expected
            ),
        }
    }
}

/// Lowercased first characters of a section's text, used to find its segment.
fn match_key(text: &str) -> String {
    text.chars()
        .take(MATCH_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
}

/// Check every section against the first segment containing its text prefix.
///
/// Sections with no matching segment are skipped without an issue: the
/// transcription may split or mishear lines, and a missing match says nothing
/// about timing.
pub fn check_alignment(segments: &[AlignmentSegment], timeline: &Timeline) -> Vec<AlignmentIssue> {
    let lowered: Vec<String> = segments.iter().map(|s| s.text.to_lowercase()).collect();
    let mut issues = Vec::new();

    for (index, section) in timeline.sections().iter().enumerate() {
        let key = match_key(&section.text);
        let Some(position) = lowered.iter().position(|text| text.contains(&key)) else {
            log::debug!("section {index}: no transcribed segment matches {key:?}");
            continue;
        };
        let segment = &segments[position];
        let next_offset = timeline.next_offset(index);

        if segment.start < section.offset - START_TOLERANCE_SECS {
            issues.push(AlignmentIssue {
                section_index: index,
                kind: IssueKind::StartsTooEarly,
                expected: section.offset,
                observed: segment.start,
            });
        }
        if segment.end > next_offset {
            issues.push(AlignmentIssue {
                section_index: index,
                kind: IssueKind::OverlapsNext,
                expected: next_offset,
                observed: segment.end,
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Section;

    fn timeline() -> Timeline {
        Timeline::new(
            10.0,
            vec![Section::new(2.0, "Hello"), Section::new(5.0, "World")],
        )
        .unwrap()
    }

    fn seg(text: &str, start: f64, end: f64) -> AlignmentSegment {
        AlignmentSegment::new(text, start, end)
    }

    #[test]
    fn test_start_within_tolerance_is_fine() {
        let issues = check_alignment(&[seg(" Hello.", 1.6, 3.0)], &timeline());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_start_beyond_tolerance_is_too_early() {
        let issues = check_alignment(&[seg(" Hello.", 1.4, 3.0)], &timeline());
        assert_eq!(
            issues,
            vec![AlignmentIssue {
                section_index: 0,
                kind: IssueKind::StartsTooEarly,
                expected: 2.0,
                observed: 1.4,
            }]
        );
    }

    #[test]
    fn test_end_past_next_offset_overlaps() {
        let issues = check_alignment(&[seg("hello", 2.0, 5.5)], &timeline());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::OverlapsNext);
        assert_eq!(issues[0].expected, 5.0);
        assert_eq!(issues[0].observed, 5.5);
    }

    #[test]
    fn test_last_section_is_checked_against_timeline_end() {
        let issues = check_alignment(&[seg(" World", 5.0, 10.5)], &timeline());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].section_index, 1);
        assert_eq!(issues[0].expected, 10.0);
    }

    #[test]
    fn test_unmatched_section_is_skipped() {
        let issues = check_alignment(&[seg("something else entirely", 0.0, 9.9)], &timeline());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_first_matching_segment_wins() {
        let segments = vec![seg("hello", 2.0, 3.0), seg("hello again", 0.0, 9.0)];
        assert!(check_alignment(&segments, &timeline()).is_empty());
    }

    #[test]
    fn test_match_uses_case_insensitive_prefix() {
        let timeline = Timeline::new(
            19.0,
            vec![Section::new(
                6.5,
                "A clock app carved from ice. Beautiful. Minimal. Yours.",
            )],
        )
        .unwrap();
        // Only the first 20 characters need to appear in the segment.
        let segments = vec![seg(" A CLOCK APP CARVED FROM nothing", 5.0, 9.0)];
        let issues = check_alignment(&segments, &timeline);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::StartsTooEarly);
    }

    #[test]
    fn test_both_issues_for_one_section() {
        let issues = check_alignment(&[seg("hello", 0.5, 6.0)], &timeline());
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::StartsTooEarly, IssueKind::OverlapsNext]);
    }

    #[test]
    fn test_issue_display() {
        let early = AlignmentIssue {
            section_index: 2,
            kind: IssueKind::StartsTooEarly,
            expected: 6.5,
            observed: 5.84,
        };
        assert_eq!(
            early.to_string(),
            "Section 2 starts too early: expected 6.5s, actual 5.8s"
        );

        let overlap = AlignmentIssue {
            section_index: 0,
            kind: IssueKind::OverlapsNext,
            expected: 3.5,
            observed: 4.02,
        };
        assert_eq!(
            overlap.to_string(),
            "Section 0 overlaps into next scene: ends at 4.0s, next scene at 3.5s"
        );
    }
}
