//! Operator-facing progress and report rendering.
//!
//! The pipeline emits [`PipelineEvent`]s through a [`Reporter`]; the CLI
//! renders them to stderr, tests collect them.

use crate::overlap::OverlapWarning;
use crate::verify::verifier::VerificationOutcome;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const RULE_WIDTH: usize = 60;

/// Long-running stages between synthesis and the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreatingSilence,
    Combining,
    Normalizing,
    Transcribing,
}

impl Stage {
    fn describe(self) -> &'static str {
        match self {
            Self::CreatingSilence => "Creating silence base track...",
            Self::Combining => "Combining sections...",
            Self::Normalizing => "Normalizing audio levels...",
            Self::Transcribing => "Transcribing with Whisper to verify timing...",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started {
        sections: usize,
        total_chars: usize,
        voice: String,
        jobs: usize,
    },
    SectionSynthesized {
        index: usize,
        offset: f64,
        text: String,
        /// Measured clip length in seconds
        duration: f64,
        elapsed: Duration,
    },
    OverlapPredicted(OverlapWarning),
    Stage(Stage),
    Verification(VerificationOutcome),
    Finished {
        output: PathBuf,
    },
}

/// Sink for pipeline progress.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &PipelineEvent);
}

/// Renders events to stderr.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    quiet: bool,
    color: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool, color: bool) -> Self {
        Self { quiet, color }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Text for one event, or `None` if it is suppressed.
    ///
    /// Quiet mode keeps alignment issues and the deliverable line.
    pub fn render(&self, event: &PipelineEvent) -> Option<String> {
        match event {
            PipelineEvent::Finished { output } => Some(self.render_finished(output)),
            PipelineEvent::Verification(outcome) if self.quiet => {
                (!outcome.issues().is_empty()).then(|| self.render_issues(outcome))
            }
            _ if self.quiet => None,
            PipelineEvent::Started {
                sections,
                total_chars,
                voice,
                jobs,
            } => Some(format!(
                "Generating voiceover with {sections} sections ({total_chars} characters)...\n\
                 Voice: {voice}{}\n",
                if *jobs > 1 {
                    format!(" ({jobs} requests at a time)")
                } else {
                    String::new()
                }
            )),
            PipelineEvent::SectionSynthesized {
                index,
                offset,
                text,
                duration,
                elapsed,
            } => Some(format!(
                "  [{offset:5.1}s] #{index} {}\n         -> {duration:.1}s audio {}",
                truncate(text, 50),
                self.paint(DIM, &format!("({:.1}s)", elapsed.as_secs_f64()))
            )),
            PipelineEvent::OverlapPredicted(warning) => Some(self.paint(
                YELLOW,
                &format!(
                    "         WARNING: section {} may overlap with next section \
                     (ends at {:.1}s, next at {}s)",
                    warning.section_index, warning.projected_end, warning.next_offset
                ),
            )),
            PipelineEvent::Stage(stage) => Some(stage.describe().to_string()),
            PipelineEvent::Verification(outcome) => Some(self.render_verification(outcome)),
        }
    }

    fn render_verification(&self, outcome: &VerificationOutcome) -> String {
        match outcome {
            VerificationOutcome::Unavailable { reason } => {
                format!("  Timing verification skipped: {reason}")
            }
            VerificationOutcome::Failed { reason } => format!(
                "  {}\n  Skipping timing verification.",
                self.paint(RED, &format!("Whisper error: {reason}"))
            ),
            VerificationOutcome::Completed { segments, issues } => {
                let mut out = String::from("\nWhisper transcription timestamps:\n");
                for seg in segments {
                    out.push_str(&format!(
                        "  {:5.1}s - {:5.1}s: {}\n",
                        seg.start,
                        seg.end,
                        truncate(seg.text.trim(), 60)
                    ));
                }
                if issues.is_empty() {
                    out.push_str(&format!(
                        "\n{}",
                        self.paint(GREEN, "TIMING VERIFIED - No overlaps detected")
                    ));
                } else {
                    out.push_str(&self.render_issues(outcome));
                }
                out
            }
        }
    }

    fn render_issues(&self, outcome: &VerificationOutcome) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = format!(
            "\n{rule}\n{}\n{rule}\n",
            self.paint(RED, "OVERLAPS DETECTED - MUST FIX BEFORE PROCEEDING")
        );
        for issue in outcome.issues() {
            out.push_str(&format!("  - {issue}\n"));
        }
        out.push_str(
            "\nFIX OPTIONS:\n\
             \x20 1. Shorten the overlapping text (make it punchier)\n\
             \x20 2. Increase the next section's offset\n\
             \x20 3. Add '...' to create natural pauses\n\
             \nThen regenerate and verify again. Do NOT proceed with overlaps.\n",
        );
        out.push_str(&rule);
        out
    }

    fn render_finished(&self, output: &std::path::Path) -> String {
        let saved = format!("Success! Saved to: {}", output.display());
        if self.quiet {
            return saved;
        }
        let name = output.display();
        format!(
            "\n{}\n\n\
             Next steps:\n\
             \x20 1. If timing issues were detected, adjust the script and run again\n\
             \x20 2. Add background music:\n\
             \x20    ffmpeg -y -i {name} -i music.mp3 \\\n\
             \x20      -filter_complex \"[1:a]volume=0.15[music];[0:a][music]amix=inputs=2:duration=first\" \\\n\
             \x20      voiceover-with-music.mp3\n\
             \x20 3. Combine with video:\n\
             \x20    ffmpeg -y -i video.mp4 -i voiceover-with-music.mp3 -c:v copy -map 0:v:0 -map 1:a:0 final.mp4",
            self.paint(BOLD, &saved)
        )
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &PipelineEvent) {
        if let Some(text) = self.render(event) {
            eprintln!("{text}");
        }
    }
}

/// Records events for inspection in tests.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn overlap_warnings(&self) -> Vec<OverlapWarning> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::OverlapPredicted(w) => Some(w),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Shorten to `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max).collect();
    short.push_str("...");
    short
}
