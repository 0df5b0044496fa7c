use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AscError {
    // --- argument decoding ---
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    // --- dispatch ---
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    // --- startup ---
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    // --- App Store Connect gateway ---
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("App Store Connect API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded, try again later")]
    RateLimited,

    #[error("invalid bundle ID '{0}': must be reverse-domain notation (e.g. com.example.app)")]
    InvalidBundleId(String),

    #[error("invalid certificate type: {0}")]
    InvalidCertificateType(String),

    #[error("build not found: {0}")]
    BuildNotFound(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("certificate creation failed: {0}")]
    CertificateCreationFailed(String),

    #[error("certificate revoke failed: {0}")]
    CertificateRevokeFailed(String),

    // --- external processes ---
    #[error("{tool} not found. {hint}")]
    NotInstalled { tool: String, hint: String },

    #[error("command '{command}' failed with exit code {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    #[error("upload failed with exit code {exit_code}: {stderr}")]
    UploadFailed { exit_code: i32, stderr: String },

    #[error("validation failed with exit code {exit_code}: {stderr}")]
    ValidationFailed { exit_code: i32, stderr: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error("not logged into Firebase. Run: firebase login")]
    FirebaseNotLoggedIn,

    #[error("permission denied for Firebase resource: {0}")]
    PermissionDenied(String),

    #[error("Firebase project not found: {0}")]
    ProjectNotFound(String),

    #[error("failed to parse command output as JSON: {0}")]
    InvalidJson(String),

    #[error("no .dSYM files found in {}", .0.display())]
    NoDsymsFound(PathBuf),

    // --- local archive scanner ---
    #[error("Xcode archives directory not found at {}", .0.display())]
    ArchiveDirectoryNotFound(PathBuf),

    #[error("{}", no_matching_archives_message(.app_name.as_deref(), .bundle_id.as_deref()))]
    NoMatchingArchives {
        app_name: Option<String>,
        bundle_id: Option<String>,
    },

    #[error("invalid Info.plist in archive at {}: {reason}", .path.display())]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl AscError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Errors raised from caller input before any remote or process call is made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::InvalidParameter { .. }
                | Self::InvalidBundleId(_)
                | Self::InvalidCertificateType(_)
                | Self::FileNotFound(_)
                | Self::InvalidFile(_)
                | Self::NoDsymsFound(_)
        )
    }
}

fn no_matching_archives_message(app_name: Option<&str>, bundle_id: Option<&str>) -> String {
    let mut message = String::from("No archives found");
    if let Some(name) = app_name {
        message.push_str(&format!(" with app name matching '{name}'"));
    }
    if let Some(bundle_id) = bundle_id {
        if app_name.is_some() {
            message.push_str(" and");
        }
        message.push_str(&format!(" with bundle ID matching '{bundle_id}'"));
    }
    message
}
