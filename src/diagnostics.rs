//! System diagnostics and dependency checking.
//!
//! Reports what `voxtrack render` needs before it is run for real.

use crate::config::Config;
use crate::defaults;
use crate::models::download::resolve_model;
use crate::verify::whisper;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Present and working
    Ok,
    /// Not found
    NotFound,
    /// Present but with a problem
    Warning(String),
}

/// Check if an ffmpeg-family binary runs. They take `-version`, not `--version`.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

fn check_credential() -> CheckResult {
    match std::env::var(defaults::API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("{} is set but empty", defaults::API_KEY_ENV)),
        Err(_) => CheckResult::NotFound,
    }
}

fn check_whisper_model(model: &str) -> CheckResult {
    if !whisper::is_compiled_in() {
        return CheckResult::Warning("built without the `whisper` feature".to_string());
    }
    match resolve_model(model) {
        Some(_) => CheckResult::Ok,
        None => CheckResult::NotFound,
    }
}

fn print_tool(label: &str, command: &str) -> bool {
    print!("{label}: ");
    match check_command(command) {
        CheckResult::Ok => {
            println!("✓ OK");
            true
        }
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install ffmpeg  (Debian/Ubuntu)");
            println!("           brew install ffmpeg      (macOS)");
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            false
        }
    }
}

/// Run all dependency checks and print results.
///
/// Returns true when everything `render` requires is present. Verification
/// is optional and never makes this false.
pub fn check_dependencies(config: &Config) -> bool {
    println!("voxtrack {}", crate::version_string());
    println!("Checking dependencies...\n");

    let ffmpeg_ok = print_tool("ffmpeg (mixing)", &config.mix.ffmpeg);
    let ffprobe_ok = print_tool("ffprobe (clip durations)", &config.mix.ffprobe);

    print!("{} (speech synthesis): ", defaults::API_KEY_ENV);
    let credential_ok = match check_credential() {
        CheckResult::Ok => {
            println!("✓ set");
            true
        }
        CheckResult::NotFound => {
            println!("✗ NOT SET");
            println!("  Set it with: export {}=your_key_here", defaults::API_KEY_ENV);
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            false
        }
    };

    println!();
    println!("Timing verification (optional):");
    print!("  Whisper model '{}': ", config.verify.model);
    match check_whisper_model(&config.verify.model) {
        CheckResult::Ok => println!("✓ installed"),
        CheckResult::NotFound => {
            println!(
                "- not installed (downloaded on first render, or: voxtrack models install {})",
                config.verify.model
            );
        }
        CheckResult::Warning(msg) => println!("- unavailable: {}", msg),
    }
    println!("  Compiled backend: {}", defaults::gpu_backend());
    if !config.verify.enabled {
        println!("  Verification is disabled in the configuration.");
    }

    let ready = ffmpeg_ok && ffprobe_ok && credential_ok;
    println!();
    if ready {
        println!("✓ Ready to render voiceovers.");
    } else {
        println!("✗ Fix the items above before running `voxtrack render`.");
    }
    ready
}
