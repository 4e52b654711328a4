//! Command-line interface for voxtrack
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Timed voiceover assembly for short promo videos
#[derive(Parser, Debug)]
#[command(
    name = "voxtrack",
    version,
    about = "Timed voiceover assembly for short promo videos"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print problems and the final output path
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize, mix, normalize and verify a voiceover script
    Render {
        /// Voiceover script (TOML)
        script: PathBuf,

        /// Output file (default: voiceover.mp3 or [output] path)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Voice ID to synthesize with
        #[arg(long, value_name = "VOICE_ID")]
        voice: Option<String>,

        /// Synthesis requests in flight at once (1 = strictly sequential)
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,

        /// Per-request synthesis timeout. Examples: 60, 90s, 2m
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout_secs)]
        timeout: Option<u64>,

        /// Skip transcription-based timing verification
        #[arg(long)]
        no_verify: bool,

        /// Prevent automatic Whisper model download if the model is missing
        #[arg(long)]
        no_download: bool,

        /// Directory for the per-run scratch workspace (default: system temp)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,
    },

    /// Re-check an existing voiceover against its script
    Verify {
        /// Rendered voiceover audio
        audio: PathBuf,

        /// Voiceover script (TOML) it was rendered from
        script: PathBuf,

        /// Prevent automatic Whisper model download if the model is missing
        #[arg(long)]
        no_download: bool,
    },

    /// Write a commented voiceover script template
    Init {
        /// Where to write the script
        #[arg(default_value = "voiceover.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check system dependencies
    Check,

    /// Manage Whisper models used for verification
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Parse a timeout string into seconds.
///
/// Bare numbers are seconds; anything else goes through `humantime`
/// (`90s`, `2m`, `1m30s`).
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let secs = match s.parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => humantime::parse_duration(s)
            .map(|d| d.as_secs())
            .map_err(|e| e.to_string())?,
    };
    if secs == 0 {
        return Err("timeout must be at least one second".to_string());
    }
    Ok(secs)
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List available models
    List,
    /// Download and install a model
    Install {
        /// Model name (e.g., tiny, base.en, small)
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render_defaults() {
        let cli = Cli::try_parse_from(["voxtrack", "render", "promo.toml"]).unwrap();
        match cli.command {
            Commands::Render {
                script,
                output,
                voice,
                jobs,
                timeout,
                no_verify,
                no_download,
                work_dir,
            } => {
                assert_eq!(script, PathBuf::from("promo.toml"));
                assert!(output.is_none());
                assert!(voice.is_none());
                assert!(jobs.is_none());
                assert!(timeout.is_none());
                assert!(!no_verify);
                assert!(!no_download);
                assert!(work_dir.is_none());
            }
            other => panic!("Expected Render, got {:?}", other),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_render_overrides() {
        let cli = Cli::try_parse_from([
            "voxtrack",
            "render",
            "promo.toml",
            "-o",
            "out.mp3",
            "--voice",
            "abc123",
            "-j",
            "1",
            "--timeout",
            "2m",
            "--no-verify",
            "--work-dir",
            "/tmp/vt",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                output,
                voice,
                jobs,
                timeout,
                no_verify,
                work_dir,
                ..
            } => {
                assert_eq!(output, Some(PathBuf::from("out.mp3")));
                assert_eq!(voice.as_deref(), Some("abc123"));
                assert_eq!(jobs, Some(1));
                assert_eq!(timeout, Some(120));
                assert!(no_verify);
                assert_eq!(work_dir, Some(PathBuf::from("/tmp/vt")));
            }
            other => panic!("Expected Render, got {:?}", other),
        }
    }

    #[test]
    fn test_render_requires_script() {
        assert!(Cli::try_parse_from(["voxtrack", "render"]).is_err());
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["voxtrack"]).is_err());
    }

    #[test]
    fn test_parse_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["voxtrack", "check", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_parse_global_quiet_and_config() {
        let cli = Cli::try_parse_from([
            "voxtrack",
            "--config",
            "/etc/voxtrack.toml",
            "-q",
            "render",
            "a.toml",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/voxtrack.toml")));
    }

    #[test]
    fn test_parse_verify() {
        let cli =
            Cli::try_parse_from(["voxtrack", "verify", "voiceover.mp3", "promo.toml"]).unwrap();
        match cli.command {
            Commands::Verify {
                audio,
                script,
                no_download,
            } => {
                assert_eq!(audio, PathBuf::from("voiceover.mp3"));
                assert_eq!(script, PathBuf::from("promo.toml"));
                assert!(!no_download);
            }
            other => panic!("Expected Verify, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_init_default_path() {
        let cli = Cli::try_parse_from(["voxtrack", "init"]).unwrap();
        match cli.command {
            Commands::Init { path, force } => {
                assert_eq!(path, PathBuf::from("voiceover.toml"));
                assert!(!force);
            }
            other => panic!("Expected Init, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_models_install() {
        let cli = Cli::try_parse_from(["voxtrack", "models", "install", "base.en"]).unwrap();
        match cli.command {
            Commands::Models {
                action: ModelsAction::Install { name },
            } => assert_eq!(name, "base.en"),
            other => panic!("Expected Models Install, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["voxtrack", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["voxtrack", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs("60"), Ok(60));
        assert_eq!(parse_timeout_secs("90s"), Ok(90));
        assert_eq!(parse_timeout_secs("1m30s"), Ok(90));
        assert_eq!(parse_timeout_secs(" 2m "), Ok(120));
        assert!(parse_timeout_secs("0").is_err());
        assert!(parse_timeout_secs("soon").is_err());
    }

    #[test]
    fn test_invalid_jobs_rejected() {
        assert!(Cli::try_parse_from(["voxtrack", "render", "a.toml", "-j", "many"]).is_err());
    }
}
