use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use voxtrack::cli::{Cli, Commands, ConfigAction, ModelsAction};
use voxtrack::config::Config;
use voxtrack::diagnostics::check_dependencies;
use voxtrack::media::{Ffmpeg, SystemCommandExecutor};
use voxtrack::models::catalog::{get_model, list_models};
use voxtrack::models::download::format_model_info;
use voxtrack::output::ConsoleReporter;
use voxtrack::pipeline::{Pipeline, PipelineOptions, verify_track};
use voxtrack::schedule::{self, Script, Timeline};
use voxtrack::synth::ElevenLabsSynthesizer;
use voxtrack::verify::Verifier;

/// `render` flags that override the configuration for one run.
struct RenderArgs {
    script: PathBuf,
    output: Option<PathBuf>,
    voice: Option<String>,
    jobs: Option<usize>,
    timeout: Option<u64>,
    no_verify: bool,
    no_download: bool,
    work_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

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
            let config = load_config(cli.config.as_deref())?;
            let args = RenderArgs {
                script,
                output,
                voice,
                jobs,
                timeout,
                no_verify,
                no_download,
                work_dir,
            };
            run_render(config, args, cli.quiet).await?;
        }
        Commands::Verify {
            audio,
            script,
            no_download,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let verified = run_verify(config, &audio, &script, no_download, cli.quiet).await?;
            if !verified {
                std::process::exit(1);
            }
        }
        Commands::Init { path, force } => {
            write_template(&path, force)?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            if !check_dependencies(&config) {
                std::process::exit(1);
            }
        }
        Commands::Models { action } => {
            handle_models_command(action, cli.quiet).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "voxtrack",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// `-v` → debug, `-vv` → trace. `RUST_LOG` wins when set.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (_, 1) => "debug",
        (_, v) if v >= 2 => "trace",
        (true, _) => "error",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/voxtrack/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

fn load_timeline(script: &Path) -> Result<Timeline> {
    let timeline = Script::load(script)
        .and_then(Script::into_timeline)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    Ok(timeline)
}

fn build_ffmpeg(config: &Config) -> Ffmpeg {
    let executor = SystemCommandExecutor::new(Duration::from_secs(config.mix.tool_timeout_secs));
    Ffmpeg::new(Arc::new(executor), &config.mix)
}

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

async fn run_render(mut config: Config, args: RenderArgs, quiet: bool) -> Result<()> {
    if let Some(output) = args.output {
        config.output.path = output;
    }
    if let Some(voice) = args.voice {
        config.voice.voice_id = voice;
    }
    if let Some(jobs) = args.jobs {
        config.synthesis.max_concurrent = jobs.max(1);
    }
    if let Some(timeout) = args.timeout {
        config.synthesis.timeout_secs = timeout;
    }
    if args.no_verify {
        config.verify.enabled = false;
    }

    let timeline = load_timeline(&args.script)?;
    log::debug!(
        "loaded {} sections over {}s from {}",
        timeline.len(),
        timeline.total_duration(),
        args.script.display()
    );

    let synthesizer = ElevenLabsSynthesizer::from_env(&config.voice, &config.synthesis)?;
    let mut options = PipelineOptions::from_config(&config);
    options.work_dir = args.work_dir;

    let pipeline = Pipeline::new(
        Arc::new(synthesizer),
        build_ffmpeg(&config),
        Verifier::unavailable("not loaded"),
        options,
    );

    // Credential and tools are checked before a model download can start.
    pipeline.preflight().await?;

    let progress = !quiet && std::io::stderr().is_terminal();
    let verifier = Verifier::from_config(&config.verify, !args.no_download, progress).await;
    log::debug!("verification capability: {:?}", verifier);
    let pipeline = pipeline.with_verifier(verifier);

    let reporter = ConsoleReporter::new(quiet, use_color());
    pipeline.run_checked(&timeline, &reporter).await?;
    Ok(())
}

/// Returns true when the track was transcribed and no issues were found.
async fn run_verify(
    mut config: Config,
    audio: &Path,
    script: &Path,
    no_download: bool,
    quiet: bool,
) -> Result<bool> {
    let timeline = load_timeline(script)?;
    // Asking for verification explicitly overrides `[verify] enabled = false`.
    config.verify.enabled = true;

    let progress = !quiet && std::io::stderr().is_terminal();
    let verifier = Verifier::from_config(&config.verify, !no_download, progress).await;
    let reporter = ConsoleReporter::new(quiet, use_color());
    let outcome = verify_track(
        audio,
        &timeline,
        &build_ffmpeg(&config),
        &verifier,
        None,
        &reporter,
    )
    .await?;
    Ok(outcome.is_verified())
}

fn write_template(path: &Path, force: bool) -> Result<()> {
    schedule::write_template(path, force)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "Wrote".green(), path.display());
    println!("Edit the sections, then run: voxtrack render {}", path.display());
    Ok(())
}

/// Handle model management commands.
async fn handle_models_command(action: ModelsAction, quiet: bool) -> Result<()> {
    match action {
        ModelsAction::List => {
            println!("Available models:");
            for model in list_models() {
                println!("  {}", format_model_info(model));
            }
        }
        ModelsAction::Install { name } => {
            if get_model(&name).is_none() {
                eprintln!("{}", format!("Unknown model: '{name}'").red());
                eprintln!("Run `voxtrack models list` to see available models.");
                std::process::exit(1);
            }
            install_model(&name, !quiet).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "model-download")]
async fn install_model(name: &str, progress: bool) -> Result<()> {
    let path = voxtrack::models::download::download_model(name, progress).await?;
    println!("Model '{}' installed successfully", name.green());
    println!("Location: {}", path.display());
    Ok(())
}

#[cfg(not(feature = "model-download"))]
async fn install_model(name: &str, _progress: bool) -> Result<()> {
    anyhow::bail!("Cannot install '{name}': this build has no model-download support")
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
