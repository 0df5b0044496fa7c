//! dSYM retrieval for a processed build.
//!
//! The build must be `VALID` and one of its side-loaded build bundles must carry a `dSYMUrl`.
//! The archive is streamed to a partial file in the output directory, renamed over any previous
//! archive of the same build, extracted into a fresh `dSYMs` directory and finally deleted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::kinds::ProcessingState;
use super::models::{BUILD_BUNDLES, BuildBundle, BuildDocument};
use crate::error::AscError;
use crate::process::{Locator, ProcessRunner};

pub const EXTRACTION_DIR: &str = "dSYMs";
pub const DSYM_EXTENSION: &str = "dSYM";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Unpacks a downloaded zip archive into a directory.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, archive: &Path, destination: &Path) -> Result<(), AscError>;
}

/// Runs the system `unzip`.
#[derive(Debug)]
pub struct UnzipExtractor {
    runner: ProcessRunner,
}

impl Default for UnzipExtractor {
    fn default() -> Self {
        Self {
            runner: ProcessRunner::new(
                Locator::new("unzip", "Install the unzip utility.")
                    .known_path("/usr/bin/unzip")
                    .which(),
            ),
        }
    }
}

#[async_trait]
impl Extractor for UnzipExtractor {
    async fn extract(&self, archive: &Path, destination: &Path) -> Result<(), AscError> {
        let args = vec![
            "-o".to_owned(),
            "-q".to_owned(),
            archive.display().to_string(),
            "-d".to_owned(),
            destination.display().to_string(),
        ];
        self.runner.run(&args).await.map(|_| ())
    }
}

/// Pick the dSYM URL of a build, rejecting builds that are not fully processed.
pub fn dsym_url(build_id: &str, document: &BuildDocument) -> Result<String, AscError> {
    match document.data.processing_state() {
        Some(ProcessingState::Valid) => {}
        other => {
            let state = other
                .map(|s| s.as_str().to_lowercase())
                .unwrap_or_else(|| "unknown".to_owned());
            return Err(AscError::DownloadFailed(format!(
                "build {build_id} is in state '{state}'; dSYMs can only be downloaded for valid builds"
            )));
        }
    }

    let bundles: Vec<BuildBundle> = document.included_of(BUILD_BUNDLES);
    bundles
        .iter()
        .filter_map(|bundle| bundle.attrs()?.dsym_url.clone())
        .find(|url| !url.is_empty())
        .ok_or_else(|| {
            AscError::DownloadFailed(format!(
                "no dSYM URL for build {build_id}; dSYMs may not be available yet \
                 (the build may lack debug symbols or they are still being processed)"
            ))
        })
}

/// Download `url`, extract it under `output_dir` and return the extraction directory.
pub async fn fetch_and_extract(
    http: &reqwest::Client,
    url: &str,
    build_id: &str,
    output_dir: &Path,
    extractor: &dyn Extractor,
) -> Result<PathBuf, AscError> {
    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        AscError::DownloadFailed(format!(
            "cannot create output directory {}: {e}",
            output_dir.display()
        ))
    })?;

    let partial = output_dir.join(format!(".dsyms-{build_id}-{}.partial", uuid::Uuid::now_v7()));
    download_to(http, url, &partial).await?;

    let archive = output_dir.join(format!("dsyms-{build_id}.zip"));
    if tokio::fs::try_exists(&archive).await.unwrap_or(false) {
        tokio::fs::remove_file(&archive).await.map_err(|e| {
            AscError::DownloadFailed(format!("cannot replace {}: {e}", archive.display()))
        })?;
    }
    tokio::fs::rename(&partial, &archive).await.map_err(|e| {
        AscError::DownloadFailed(format!("cannot move archive to {}: {e}", archive.display()))
    })?;

    let extraction = output_dir.join(EXTRACTION_DIR);
    if tokio::fs::try_exists(&extraction).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(&extraction).await.map_err(|e| {
            AscError::DownloadFailed(format!(
                "cannot remove stale {}: {e}",
                extraction.display()
            ))
        })?;
    }
    tokio::fs::create_dir_all(&extraction).await.map_err(|e| {
        AscError::DownloadFailed(format!("cannot create {}: {e}", extraction.display()))
    })?;

    extractor
        .extract(&archive, &extraction)
        .await
        .map_err(|e| AscError::DownloadFailed(format!("cannot extract dSYM archive: {e}")))?;

    if let Err(e) = tokio::fs::remove_file(&archive).await {
        tracing::warn!(path = %archive.display(), error = %e, "could not delete dSYM archive");
    }

    tracing::info!(build_id = %build_id, path = %extraction.display(), "dSYMs extracted");
    Ok(extraction)
}

async fn download_to(http: &reqwest::Client, url: &str, target: &Path) -> Result<(), AscError> {
    let mut response = http
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| AscError::DownloadFailed(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AscError::DownloadFailed(format!(
            "server returned HTTP {}",
            status.as_u16()
        )));
    }

    let mut file = tokio::fs::File::create(target).await.map_err(|e| {
        AscError::DownloadFailed(format!("cannot create {}: {e}", target.display()))
    })?;

    let mut written: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AscError::DownloadFailed(format!("transfer interrupted: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| AscError::DownloadFailed(format!("cannot write archive: {e}")))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| AscError::DownloadFailed(format!("cannot write archive: {e}")))?;

    tracing::debug!(bytes = written, "dSYM archive downloaded");
    Ok(())
}

/// `*.dSYM` entries directly under `dir`, sorted by name.
pub async fn list_dsyms(dir: &Path) -> Result<Vec<PathBuf>, AscError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AscError::io(format!("cannot read {}", dir.display()), e))?;

    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AscError::io(format!("cannot read {}", dir.display()), e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(DSYM_EXTENSION) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
