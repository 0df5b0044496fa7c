//! Discovery of local Xcode archives.
//!
//! Archives live in date-bucketed folders: `<root>/<yyyy-mm-dd>/<Name date>.xcarchive`. Each one
//! carries an `Info.plist` manifest describing the archived application.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AscError;

const MANIFEST: &str = "Info.plist";
const DSYMS_DIR: &str = "dSYMs";

/// One parsed archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub path: PathBuf,
    pub name: String,
    pub bundle_id: String,
    pub version: String,
    pub build_number: String,
    pub created: DateTime<Utc>,
    pub dsyms_path: PathBuf,
}

impl ArchiveRecord {
    pub fn display_name(&self) -> String {
        format!("{} v{} ({})", self.name, self.version, self.build_number)
    }
}

#[derive(Deserialize)]
struct Manifest {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CreationDate")]
    creation_date: plist::Date,
    #[serde(rename = "ApplicationProperties")]
    application: ApplicationProperties,
}

#[derive(Deserialize)]
struct ApplicationProperties {
    #[serde(rename = "CFBundleIdentifier")]
    bundle_id: String,
    #[serde(rename = "CFBundleShortVersionString")]
    version: String,
    #[serde(rename = "CFBundleVersion")]
    build_number: String,
}

/// Case-insensitive substring filters, applied after parsing.
#[derive(Debug, Clone, Default)]
pub struct ArchiveFilter {
    pub app_name: Option<String>,
    pub bundle_id: Option<String>,
}

impl ArchiveFilter {
    fn matches(&self, record: &ArchiveRecord) -> bool {
        contains_ci(&record.name, self.app_name.as_deref())
            && contains_ci(&record.bundle_id, self.bundle_id.as_deref())
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

#[derive(Debug, Clone)]
pub struct ArchiveScanner {
    root: PathBuf,
}

impl ArchiveScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Async entry point: the glob walk and manifest reads run on the blocking pool.
    pub async fn search(
        &self,
        filter: ArchiveFilter,
        latest_only: bool,
    ) -> Result<Vec<ArchiveRecord>, AscError> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || {
            if latest_only {
                scanner.find_latest(&filter).map(|record| vec![record])
            } else {
                scanner.find_archives(&filter)
            }
        })
        .await
        .map_err(|e| AscError::io("archive scan did not complete", std::io::Error::other(e)))?
    }

    /// Matching archives, newest first. Unparsable archives are logged and skipped.
    pub fn find_archives(&self, filter: &ArchiveFilter) -> Result<Vec<ArchiveRecord>, AscError> {
        if !self.root.is_dir() {
            tracing::error!(path = %self.root.display(), "archives directory not found");
            return Err(AscError::ArchiveDirectoryNotFound(self.root.clone()));
        }

        let pattern = format!(
            "{}/*/*.xcarchive",
            glob::Pattern::escape(&self.root.to_string_lossy())
        );
        let paths = glob::glob(&pattern)
            .map_err(|e| AscError::Config(format!("invalid archives directory pattern: {e}")))?;

        let mut records = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable archive entry skipped");
                    continue;
                }
            };
            if !path.is_dir() {
                continue;
            }
            match parse_archive(&path) {
                Ok(record) if filter.matches(&record) => records.push(record),
                Ok(_) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "archive skipped"),
            }
        }

        if records.is_empty() {
            return Err(AscError::NoMatchingArchives {
                app_name: filter.app_name.clone(),
                bundle_id: filter.bundle_id.clone(),
            });
        }

        records.sort_by(|a, b| b.created.cmp(&a.created));
        tracing::info!(count = records.len(), "matching archives found");
        Ok(records)
    }

    pub fn find_latest(&self, filter: &ArchiveFilter) -> Result<ArchiveRecord, AscError> {
        self.find_archives(filter)?
            .into_iter()
            .next()
            .ok_or_else(|| AscError::NoMatchingArchives {
                app_name: filter.app_name.clone(),
                bundle_id: filter.bundle_id.clone(),
            })
    }
}

fn parse_archive(path: &Path) -> Result<ArchiveRecord, AscError> {
    let manifest_path = path.join(MANIFEST);
    let manifest: Manifest = plist::from_file(&manifest_path).map_err(|e| AscError::ManifestInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(ArchiveRecord {
        path: path.to_path_buf(),
        name: manifest.name,
        bundle_id: manifest.application.bundle_id,
        version: manifest.application.version,
        build_number: manifest.application.build_number,
        created: DateTime::<Utc>::from(SystemTime::from(manifest.creation_date)),
        dsyms_path: path.join(DSYMS_DIR),
    })
}
