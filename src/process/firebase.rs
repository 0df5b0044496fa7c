use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{Locator, ProcessOutput, ProcessRunner};
use crate::error::AscError;

const INSTALL_HINT: &str = "Install with: npm install -g firebase-tools";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseProject {
    pub project_id: String,
    pub project_number: String,
    pub display_name: String,
    pub name: String,
    #[serde(default)]
    pub resources: Option<FirebaseResources>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseResources {
    pub hosting_site: Option<String>,
    pub realtime_database_instance: Option<String>,
    pub storage_bucket: Option<String>,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseApp {
    pub app_id: String,
    pub display_name: Option<String>,
    pub platform: String,
    pub bundle_id: Option<String>,
    pub package_name: Option<String>,
    pub namespace: Option<String>,
}

/// `--platform` filter accepted by `apps:list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirebasePlatform {
    Ios,
    Android,
    Web,
}

impl FirebasePlatform {
    pub const NAMES: &'static [&'static str] = &["ios", "android", "web"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
        }
    }
}

impl FromStr for FirebasePlatform {
    type Err = AscError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "web" => Ok(Self::Web),
            other => Err(AscError::invalid_parameter(
                "platform",
                format!("'{other}' is not one of: {}", Self::NAMES.join(", ")),
            )),
        }
    }
}

/// `firebase --json` output is either wrapped in `{"result": ...}` or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { result: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { result } => result,
            Self::Bare(value) => value,
        }
    }
}

/// Firebase CLI driver. JSON subcommands are decoded only after a zero exit and a clean stderr.
#[derive(Debug)]
pub struct FirebaseCli {
    runner: ProcessRunner,
}

impl Default for FirebaseCli {
    fn default() -> Self {
        Self::new()
    }
}

impl FirebaseCli {
    pub fn new() -> Self {
        Self::with_runner(ProcessRunner::new(Self::locator()))
    }

    pub fn with_runner(runner: ProcessRunner) -> Self {
        Self { runner }
    }

    pub fn locator() -> Locator {
        Locator::new("firebase", INSTALL_HINT)
            .known_path("/opt/homebrew/bin/firebase")
            .known_path("/usr/local/bin/firebase")
            .known_path("/usr/bin/firebase")
            .which()
    }

    pub async fn list_projects(&self) -> Result<Vec<FirebaseProject>, AscError> {
        let args = vec!["projects:list".to_owned(), "--json".to_owned()];
        self.run_json(&args, None).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<FirebaseProject, AscError> {
        let args = vec![
            "projects:get".to_owned(),
            project_id.to_owned(),
            "--json".to_owned(),
        ];
        self.run_json(&args, Some(project_id)).await
    }

    pub async fn list_apps(
        &self,
        project_id: &str,
        platform: Option<FirebasePlatform>,
    ) -> Result<Vec<FirebaseApp>, AscError> {
        let mut args = vec![
            "apps:list".to_owned(),
            "--project".to_owned(),
            project_id.to_owned(),
            "--json".to_owned(),
        ];
        if let Some(platform) = platform {
            args.push("--platform".to_owned());
            args.push(platform.as_str().to_owned());
        }
        self.run_json(&args, Some(project_id)).await
    }

    /// `crashlytics:symbols:upload --app <id> <paths...>`
    pub async fn upload_dsyms(
        &self,
        firebase_app_id: &str,
        dsym_paths: &[PathBuf],
    ) -> Result<ProcessOutput, AscError> {
        let mut args = vec![
            "crashlytics:symbols:upload".to_owned(),
            "--app".to_owned(),
            firebase_app_id.to_owned(),
        ];
        args.extend(dsym_paths.iter().map(|p| p.display().to_string()));

        tracing::info!(app_id = %firebase_app_id, files = dsym_paths.len(), "uploading dSYMs to Crashlytics");
        // Upload success is the exit status alone; stderr carries progress and notices.
        self.runner.run(&args).await
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        args: &[String],
        resource: Option<&str>,
    ) -> Result<T, AscError> {
        let output = self.runner.run(args).await?;
        check_stderr(&output.stderr, resource)?;

        serde_json::from_str::<Envelope<T>>(&output.stdout)
            .map(Envelope::into_inner)
            .map_err(|e| AscError::InvalidJson(e.to_string()))
    }
}

/// Recognizable failure text that the CLI prints without a nonzero exit.
fn check_stderr(stderr: &str, resource: Option<&str>) -> Result<(), AscError> {
    if stderr.contains("not logged in") || stderr.contains("authentication") {
        return Err(AscError::FirebaseNotLoggedIn);
    }
    // Resource checks only apply to commands that address a specific project.
    let Some(resource) = resource else {
        return Ok(());
    };
    if stderr.contains("Permission denied") || stderr.contains("403") {
        return Err(AscError::PermissionDenied(resource.to_owned()));
    }
    if stderr.contains("not found") || stderr.contains("404") {
        return Err(AscError::ProjectNotFound(resource.to_owned()));
    }
    Ok(())
}
