//! Voiceover script and the validated timeline it describes.
//!
//! A script is authored as TOML:
//!
//! ```toml
//! duration = 19.0
//!
//! [[sections]]
//! offset = 0.8
//! text = "Time... but not like you know it."
//! ```

use crate::error::{Result, VoxtrackError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One scripted speech line and the second it should start at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub offset: f64,
    pub text: String,
}

impl Section {
    pub fn new(offset: f64, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

/// Ordered sections plus the total length of the final track.
///
/// Invariants, checked by [`Timeline::new`]:
/// - at least one section, every text non-blank
/// - offsets finite, non-negative and non-decreasing
/// - `total_duration >= last offset`
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    total_duration: f64,
    sections: Vec<Section>,
}

impl Timeline {
    pub fn new(total_duration: f64, sections: Vec<Section>) -> Result<Self> {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return Err(invalid(format!(
                "duration must be a positive number of seconds, got {total_duration}"
            )));
        }

        let Some(last) = sections.last() else {
            return Err(invalid("script has no sections".to_string()));
        };

        let mut previous = 0.0;
        for (i, section) in sections.iter().enumerate() {
            if section.text.trim().is_empty() {
                return Err(invalid(format!("section {i} has no text")));
            }
            if !section.offset.is_finite() || section.offset < 0.0 {
                return Err(invalid(format!(
                    "section {i} has invalid offset {}",
                    section.offset
                )));
            }
            if section.offset < previous {
                return Err(invalid(format!(
                    "section {i} starts at {}s, before section {} at {previous}s",
                    section.offset,
                    i - 1
                )));
            }
            previous = section.offset;
        }

        if total_duration < last.offset {
            return Err(invalid(format!(
                "duration {total_duration}s ends before the last section at {}s",
                last.offset
            )));
        }

        Ok(Self {
            total_duration,
            sections,
        })
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always false for a constructed timeline; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Start of the window after section `index`: the next section's offset,
    /// or the end of the timeline for the last section.
    pub fn next_offset(&self, index: usize) -> f64 {
        self.sections
            .get(index + 1)
            .map(|s| s.offset)
            .unwrap_or(self.total_duration)
    }

    pub fn total_chars(&self) -> usize {
        self.sections.iter().map(|s| s.text.chars().count()).sum()
    }
}

fn invalid(message: String) -> VoxtrackError {
    VoxtrackError::ScheduleInvalid { message }
}

/// On-disk form of a voiceover script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Total length of the final track in seconds.
    pub duration: f64,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Script {
    /// Load a script from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| VoxtrackError::ScheduleInvalid {
            message: e.to_string(),
        })
    }

    pub fn into_timeline(self) -> Result<Timeline> {
        Timeline::new(self.duration, self.sections)
    }
}

/// Template written by `voxtrack init`.
pub const SCRIPT_TEMPLATE: &str = r#"# Voiceover script.
#
# duration: total length of the final track in seconds. Speech running past
#           it is cut off.
# offset:   second at which the line starts. Leave room for the previous line
#           to finish; use "..." in the text for natural pauses.

duration = 19.0

[[sections]]
offset = 0.8
text = "Time... but not like you know it."

[[sections]]
offset = 3.5
text = "Introducing Ice Chronos."

[[sections]]
offset = 6.5
text = "A clock app carved from ice. Beautiful. Minimal. Yours."

[[sections]]
offset = 10.0
text = "Smart alarms. Precision timers. World clock."

[[sections]]
offset = 13.2
text = "Four point nine stars. Half a million downloads."

[[sections]]
offset = 15.8
text = "Ice Chronos. A cooler way to keep time."
"#;

/// Write [`SCRIPT_TEMPLATE`] to `path`.
///
/// An existing file is left untouched unless `force` is set.
pub fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )
        .into());
    }
    fs::write(path, SCRIPT_TEMPLATE)?;
    Ok(())
}
