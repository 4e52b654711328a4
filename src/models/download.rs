//! Model download and installation.
//!
//! Models live in `~/.cache/voxtrack/models/ggml-<name>.bin`.

#[cfg(feature = "model-download")]
use crate::error::{Result, VoxtrackError};
use crate::models::catalog::ModelInfo;
#[cfg(feature = "model-download")]
use crate::models::catalog::get_model;
use std::path::{Path, PathBuf};

/// Directory where models are stored.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("voxtrack")
        .join("models")
}

/// Install location of a model, whether or not it exists.
pub fn model_path(name: &str) -> PathBuf {
    models_dir().join(format!("ggml-{name}.bin"))
}

pub fn is_model_installed(name: &str) -> bool {
    model_path(name).is_file()
}

/// Locate a configured model on disk.
///
/// `model` is either a path to a ggml file or a catalog name.
pub fn resolve_model(model: &str) -> Option<PathBuf> {
    let as_path = Path::new(model);
    if as_path.is_file() {
        return Some(as_path.to_path_buf());
    }
    let installed = model_path(model);
    installed.is_file().then_some(installed)
}

/// One line of `voxtrack models list`.
pub fn format_model_info(model: &ModelInfo) -> String {
    let status = if is_model_installed(model.name) {
        "[installed]"
    } else {
        "[not installed]"
    };
    format!("{:10} {:5} MB   {}", model.name, model.size_mb, status)
}

/// Download a catalog model, verifying its SHA-1.
///
/// Returns the installed path; an already installed model is not fetched again.
/// The file is written under a `.part` name and only renamed into place once
/// the checksum matches.
#[cfg(feature = "model-download")]
pub async fn download_model(name: &str, progress: bool) -> Result<PathBuf> {
    let path = model_path(name);
    if path.is_file() {
        log::debug!("model {name} already installed at {}", path.display());
        return Ok(path);
    }

    let info = get_model(name).ok_or_else(|| VoxtrackError::ModelDownload {
        message: format!(
            "Unknown model '{name}'. Run 'voxtrack models list' to see available models."
        ),
    })?;

    download_to_path(info, &path, progress).await?;
    Ok(path)
}

#[cfg(feature = "model-download")]
async fn download_to_path(info: &ModelInfo, output_path: &Path, progress: bool) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let failed = |message: String| VoxtrackError::ModelDownload { message };

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| failed(format!("Failed to create models directory: {e}")))?;
    }

    if progress {
        eprintln!("Downloading Whisper model {} ({} MB)...", info.name, info.size_mb);
    }

    let url = info.url();
    log::debug!("GET {url}");
    let response = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .map_err(|e| failed(format!("Failed to start download: {e}")))?;

    if !response.status().is_success() {
        return Err(failed(format!(
            "Download failed with status: {}",
            response.status()
        )));
    }

    let pb = progress.then(|| {
        let pb = ProgressBar::new(response.content_length().unwrap_or(0));
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    });

    let partial = output_path.with_extension("bin.part");
    save_verified(response.bytes_stream(), &partial, info.sha1, pb.as_ref()).await?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if let Err(e) = tokio::fs::rename(&partial, output_path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            log::warn!("failed to remove partial download {}: {cleanup}", partial.display());
        }
        return Err(failed(format!("Failed to install model: {e}")));
    }

    if progress {
        eprintln!("Model installed to: {}", output_path.display());
    }
    Ok(())
}

/// Stream `body` into `partial` and check its SHA-1.
///
/// `partial` is removed again on any failure.
#[cfg(feature = "model-download")]
async fn save_verified<S, B, E>(
    body: S,
    partial: &Path,
    expected_sha1: &str,
    pb: Option<&indicatif::ProgressBar>,
) -> Result<()>
where
    S: futures_util::Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let result = write_verified(body, partial, expected_sha1, pb).await;
    if result.is_err()
        && let Err(e) = tokio::fs::remove_file(partial).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        log::warn!("failed to remove partial download {}: {e}", partial.display());
    }
    result
}

#[cfg(feature = "model-download")]
async fn write_verified<S, B, E>(
    mut body: S,
    partial: &Path,
    expected_sha1: &str,
    pb: Option<&indicatif::ProgressBar>,
) -> Result<()>
where
    S: futures_util::Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    use futures_util::StreamExt;
    use sha1::{Digest, Sha1};
    use tokio::io::AsyncWriteExt;

    let failed = |message: String| VoxtrackError::ModelDownload { message };

    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| failed(format!("Failed to create {}: {e}", partial.display())))?;
    let mut hasher = Sha1::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| failed(format!("Failed to read download chunk: {e}")))?;
        let chunk = chunk.as_ref();
        file.write_all(chunk)
            .await
            .map_err(|e| failed(format!("Failed to write model file: {e}")))?;
        hasher.update(chunk);
        if let Some(pb) = pb {
            pb.inc(chunk.len() as u64);
        }
    }
    file.flush()
        .await
        .map_err(|e| failed(format!("Failed to write model file: {e}")))?;
    drop(file);

    let calculated = format!("{:x}", hasher.finalize());
    if calculated != expected_sha1 {
        return Err(failed(format!(
            "SHA-1 checksum mismatch. Expected: {expected_sha1}, got: {calculated}"
        )));
    }
    Ok(())
}
