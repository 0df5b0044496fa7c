//! Debug symbol retrieval, Crashlytics upload and local archive discovery.

use std::path::{Path, PathBuf};

use serde_json::json;
use uuid::Uuid;

use super::args::Args;
use super::{Arguments, ToolContext, ToolDescriptor, ToolResult, string_prop};
use crate::archives::ArchiveFilter;
use crate::asc::dsym::{EXTRACTION_DIR, list_dsyms};
use crate::error::AscError;
use crate::format;

const SOURCES: [&str; 3] = ["build_id", "archive_path", "dsyms_path"];

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "download_dsyms",
            "Download dSYM files for a specific build to the specified output path.",
            json!({
                "build_id": string_prop("Build ID from App Store Connect"),
                "output_path": string_prop("Local file path where dSYMs should be downloaded"),
            }),
            &["build_id", "output_path"],
        ),
        ToolDescriptor::new(
            "upload_dsyms_to_firebase",
            "Upload dSYM files to Firebase Crashlytics. Can download from App Store Connect or use local files. Uses Firebase CLI (no CocoaPods dependency).",
            json!({
                "firebase_app_id": string_prop("Firebase app ID (e.g., '1:123456789:ios:abc123def456')"),
                "build_id": string_prop("App Store Connect build ID (downloads dSYMs first)"),
                "archive_path": string_prop("Path to .xcarchive directory (uses archive/dSYMs)"),
                "dsyms_path": string_prop("Direct path to dSYMs directory"),
            }),
            &["firebase_app_id"],
        ),
        ToolDescriptor::new(
            "find_xcode_archives",
            "Find Xcode archives in ~/Library/Developer/Xcode/Archives. Filter by app name or bundle ID, or get latest only.",
            json!({
                "app_name_filter": string_prop("Filter by app name (case-insensitive, partial match)"),
                "bundle_id_filter": string_prop("Filter by bundle ID (case-insensitive, partial match)"),
                "latest_only": {
                    "type": "boolean",
                    "description": "Return only the latest archive (default: false)",
                },
            }),
            &[],
        ),
    ]
}

/// Where the symbols to upload come from.
#[derive(Debug, PartialEq, Eq)]
enum DsymSource {
    Build(String),
    Archive(PathBuf),
    Directory(PathBuf),
}

#[derive(Debug)]
struct FirebaseUploadRequest {
    firebase_app_id: String,
    source: DsymSource,
}

impl FirebaseUploadRequest {
    fn decode(args: &Args<'_>) -> Result<Self, AscError> {
        let firebase_app_id = args.required_str("firebase_app_id")?.to_owned();
        let source = match args.exactly_one_of(&SOURCES)? {
            ("build_id", id) => DsymSource::Build(id.to_owned()),
            ("archive_path", path) => DsymSource::Archive(PathBuf::from(path)),
            (_, path) => DsymSource::Directory(PathBuf::from(path)),
        };
        Ok(Self {
            firebase_app_id,
            source,
        })
    }
}

pub async fn download_dsyms(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let build_id = args.required_str("build_id")?;
    let output_path = PathBuf::from(args.required_str("output_path")?);

    let directory = ctx.gateway.download_dsyms(build_id, &output_path).await?;
    let files = list_dsyms(&directory).await?;

    // Only used to enrich the report.
    let version = match ctx.gateway.get_build(build_id, false).await {
        Ok(document) => document.data.version().map(str::to_owned),
        Err(e) => {
            tracing::warn!(build_id = %build_id, error = %e, "build details unavailable");
            None
        }
    };

    Ok(ToolResult::text(format::dsyms_downloaded(
        build_id,
        version.as_deref(),
        &directory,
        &files,
    )))
}

pub async fn upload_dsyms_to_firebase(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let request = FirebaseUploadRequest::decode(&Args::new(arguments))?;
    tracing::debug!(firebase_app_id = %request.firebase_app_id, source = ?request.source, "preparing dSYM upload");

    let directory = match request.source {
        DsymSource::Build(build_id) => {
            let scratch = std::env::temp_dir().join(format!("firebase-dsyms-{}", Uuid::now_v7()));
            ctx.gateway.download_dsyms(&build_id, &scratch).await?
        }
        DsymSource::Archive(archive) => {
            if !tokio::fs::try_exists(&archive).await.unwrap_or(false) {
                return Err(AscError::FileNotFound(archive));
            }
            archive.join(EXTRACTION_DIR)
        }
        DsymSource::Directory(directory) => directory,
    };

    let files = collect_dsyms(&directory).await?;
    tracing::info!(count = files.len(), directory = %directory.display(), "dSYMs found for upload");

    let output = ctx
        .firebase
        .upload_dsyms(&request.firebase_app_id, &files)
        .await?;
    tracing::info!(firebase_app_id = %request.firebase_app_id, files = files.len(), "dSYMs uploaded to Firebase");

    Ok(ToolResult::text(format::dsyms_uploaded_to_firebase(
        &request.firebase_app_id,
        &directory,
        &files,
        &output,
    )))
}

/// The directory must exist and hold at least one `.dSYM` entry.
async fn collect_dsyms(directory: &Path) -> Result<Vec<PathBuf>, AscError> {
    let is_dir = tokio::fs::metadata(directory)
        .await
        .is_ok_and(|meta| meta.is_dir());
    if !is_dir {
        return Err(AscError::NoDsymsFound(directory.to_path_buf()));
    }
    let files = list_dsyms(directory)
        .await
        .map_err(|_| AscError::NoDsymsFound(directory.to_path_buf()))?;
    if files.is_empty() {
        return Err(AscError::NoDsymsFound(directory.to_path_buf()));
    }
    Ok(files)
}

pub async fn find_xcode_archives(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let filter = ArchiveFilter {
        app_name: args.optional_str("app_name_filter")?.map(str::to_owned),
        bundle_id: args.optional_str("bundle_id_filter")?.map(str::to_owned),
    };
    let latest_only = args.optional_bool("latest_only")?.unwrap_or(false);

    let records = ctx.archives.search(filter, latest_only).await?;

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let dsyms = list_dsyms(&record.dsyms_path).await.ok().map(|f| f.len());
        rows.push((record, dsyms));
    }
    Ok(ToolResult::text(format::archives(&rows)))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn arguments(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    #[test]
    fn upload_source_is_decoded_from_the_single_present_member() {
        let map = arguments(json!({"firebase_app_id": "1:1:ios:a", "archive_path": "/tmp/A.xcarchive"}));
        let request = FirebaseUploadRequest::decode(&Args::new(&map)).unwrap();
        assert_eq!(request.source, DsymSource::Archive(PathBuf::from("/tmp/A.xcarchive")));

        let map = arguments(json!({"firebase_app_id": "1:1:ios:a", "build_id": "b1"}));
        let request = FirebaseUploadRequest::decode(&Args::new(&map)).unwrap();
        assert_eq!(request.source, DsymSource::Build("b1".into()));
    }

    #[test]
    fn upload_requires_app_id_before_source() {
        let map = arguments(json!({"build_id": "b1", "dsyms_path": "/tmp"}));
        assert!(matches!(
            FirebaseUploadRequest::decode(&Args::new(&map)),
            Err(AscError::MissingParameter(p)) if p == "firebase_app_id"
        ));
    }

    #[tokio::test]
    async fn empty_or_missing_directory_has_no_dsyms() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(collect_dsyms(dir.path()).await, Err(AscError::NoDsymsFound(_))));
        assert!(matches!(
            collect_dsyms(&dir.path().join("absent")).await,
            Err(AscError::NoDsymsFound(_))
        ));

        std::fs::create_dir(dir.path().join("App.app.dSYM")).unwrap();
        assert_eq!(collect_dsyms(dir.path()).await.unwrap().len(), 1);
    }
}
