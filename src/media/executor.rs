//! Subprocess execution with testable command dispatch.
//!
//! Every ffmpeg and ffprobe invocation goes through the `CommandExecutor` trait so
//! the mixing logic can be exercised without the real tools installed.

use crate::error::{Result, VoxtrackError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for executing external commands.
///
/// Object-safe, Send + Sync for use across concurrent synthesis tasks.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a program with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the program is missing, exits non-zero or runs past
    /// the executor's time limit.
    async fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

/// Production command executor using tokio::process::Command.
#[derive(Debug, Clone)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::defaults::TOOL_TIMEOUT_SECS))
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        log::debug!("exec: {} {}", program, args.join(" "));

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VoxtrackError::ToolNotFound {
                        tool: program.to_string(),
                    }
                } else {
                    VoxtrackError::CommandFailed {
                        tool: program.to_string(),
                        status: "not started".to_string(),
                        stderr: e.to_string(),
                    }
                }
            })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| VoxtrackError::CommandTimedOut {
                tool: program.to_string(),
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoxtrackError::CommandFailed {
                tool: program.to_string(),
                status: output.status.to_string(),
                stderr: last_lines(&stderr, 5),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// ffmpeg prints its banner first; the cause of a failure is at the end.
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Command executor for tests that stands in for ffmpeg and ffprobe.
///
/// - records every call
/// - answers ffprobe duration queries from a table keyed by file name
/// - writes a placeholder file at the output path (the last argument) of every
///   other call; `.wav` outputs get a short silent 16 kHz mono WAV so they can
///   be decoded
/// - fails calls that mention a configured marker, or whose program is
///   configured as missing
#[derive(Debug, Default)]
pub struct MockCommandExecutor {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    durations: HashMap<String, f64>,
    failures: Vec<String>,
    missing: Vec<String>,
}

impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `secs` as the duration of any probed file named `file_name`.
    pub fn with_duration(mut self, file_name: &str, secs: f64) -> Self {
        self.durations.insert(file_name.to_string(), secs);
        self
    }

    /// Fail any call with an argument containing `marker`.
    pub fn with_failure(mut self, marker: &str) -> Self {
        self.failures.push(marker.to_string());
        self
    }

    /// Behave as if `program` were not installed.
    pub fn with_missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Get the number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn probe_answer(&self, args: &[String]) -> Result<String> {
        let file_name = args
            .last()
            .and_then(|p| Path::new(p).file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.durations.get(file_name) {
            Some(secs) => Ok(format!("{secs}\n")),
            None => Err(VoxtrackError::CommandFailed {
                tool: "ffprobe".to_string(),
                status: "exit status: 1".to_string(),
                stderr: format!("{file_name}: No such file or directory"),
            }),
        }
    }
}

#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((program.to_string(), args.to_vec()));
        }

        if self.missing.iter().any(|m| m == program) {
            return Err(VoxtrackError::ToolNotFound {
                tool: program.to_string(),
            });
        }

        if let Some(marker) = self
            .failures
            .iter()
            .find(|m| args.iter().any(|a| a.contains(m.as_str())))
        {
            return Err(VoxtrackError::CommandFailed {
                tool: program.to_string(),
                status: "exit status: 1".to_string(),
                stderr: format!("mock failure on '{marker}'"),
            });
        }

        if args.iter().any(|a| a == "-version") {
            return Ok(format!("{program} version mock\n"));
        }

        if args.iter().any(|a| a == "-show_entries") {
            return self.probe_answer(args);
        }

        if let Some(output) = args.last() {
            write_placeholder(Path::new(output))?;
        }
        Ok(String::new())
    }
}

fn write_placeholder(path: &Path) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) == Some("wav") {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: crate::defaults::TRANSCRIBE_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|e| VoxtrackError::AudioDecode {
                message: e.to_string(),
            })?;
        for _ in 0..1600 {
            writer
                .write_sample(0i16)
                .map_err(|e| VoxtrackError::AudioDecode {
                    message: e.to_string(),
                })?;
        }
        writer.finalize().map_err(|e| VoxtrackError::AudioDecode {
            message: e.to_string(),
        })?;
        return Ok(());
    }
    std::fs::write(path, b"mock audio")?;
    Ok(())
}
