use std::path::Path;
use std::str::FromStr;

use super::{Locator, ProcessRunner};
use crate::error::AscError;

const INSTALL_HINT: &str = "Install Xcode command line tools: xcode-select --install";

/// `-type` values accepted by `iTMSTransporter -m upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPlatform {
    #[default]
    Ios,
    AppleTvOs,
    Osx,
}

impl UploadPlatform {
    pub const NAMES: &'static [&'static str] = &["ios", "appletvos", "osx"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::AppleTvOs => "appletvos",
            Self::Osx => "osx",
        }
    }
}

impl FromStr for UploadPlatform {
    type Err = AscError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Self::Ios),
            "appletvos" => Ok(Self::AppleTvOs),
            "osx" => Ok(Self::Osx),
            other => Err(AscError::invalid_parameter(
                "platform",
                format!("'{other}' is not one of: {}", Self::NAMES.join(", ")),
            )),
        }
    }
}

/// API key credentials passed to the transfer tool.
#[derive(Clone)]
pub struct TransporterAuth {
    pub key_id: String,
    pub issuer_id: String,
}

impl std::fmt::Debug for TransporterAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransporterAuth").finish_non_exhaustive()
    }
}

/// Drives `iTMSTransporter` for binary upload and validation.
#[derive(Debug)]
pub struct TransporterCli {
    runner: ProcessRunner,
    auth: TransporterAuth,
}

impl TransporterCli {
    pub fn new(auth: TransporterAuth) -> Self {
        Self::with_runner(ProcessRunner::new(Self::locator()), auth)
    }

    pub fn with_runner(runner: ProcessRunner, auth: TransporterAuth) -> Self {
        Self { runner, auth }
    }

    pub fn locator() -> Locator {
        Locator::new("iTMSTransporter", INSTALL_HINT)
            .resolver("/usr/bin/xcrun", &["--find", "iTMSTransporter"])
    }

    /// Upload an `.ipa`. Returns the tool's stdout.
    pub async fn upload(&self, ipa_path: &Path, platform: UploadPlatform) -> Result<String, AscError> {
        check_ipa(ipa_path).await?;
        tracing::info!(ipa = %ipa_path.display(), platform = platform.as_str(), "uploading build");

        let args = self.args("upload", ipa_path, platform);
        let output = self.runner.output(&args).await?;
        if !output.success() {
            tracing::error!(exit_code = output.exit_code, "upload failed");
            return Err(AscError::UploadFailed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        tracing::info!(ipa = %ipa_path.display(), "upload completed");
        Ok(output.stdout)
    }

    /// Verify an `.ipa` without uploading it. Returns the tool's stdout.
    pub async fn validate(&self, ipa_path: &Path) -> Result<String, AscError> {
        check_ipa(ipa_path).await?;
        tracing::info!(ipa = %ipa_path.display(), "validating build");

        let args = self.args("verify", ipa_path, UploadPlatform::Ios);
        let output = self.runner.output(&args).await?;
        if !output.success() {
            tracing::error!(exit_code = output.exit_code, "validation failed");
            return Err(AscError::ValidationFailed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        tracing::info!(ipa = %ipa_path.display(), "validation completed");
        Ok(output.stdout)
    }

    fn args(&self, mode: &str, ipa_path: &Path, platform: UploadPlatform) -> Vec<String> {
        vec![
            "-m".to_owned(),
            mode.to_owned(),
            "-assetFile".to_owned(),
            ipa_path.display().to_string(),
            "-type".to_owned(),
            platform.as_str().to_owned(),
            "-apiKey".to_owned(),
            self.auth.key_id.clone(),
            "-apiIssuer".to_owned(),
            self.auth.issuer_id.clone(),
        ]
    }
}

/// The file must exist and carry the `.ipa` extension.
pub async fn check_ipa(path: &Path) -> Result<(), AscError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(AscError::FileNotFound(path.to_path_buf()));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("ipa") {
        return Err(AscError::InvalidFile(format!(
            "{} must be a .ipa file",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ipa_precheck() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("App.ipa");
        assert!(matches!(check_ipa(&missing).await, Err(AscError::FileNotFound(_))));

        let zip = dir.path().join("App.zip");
        std::fs::write(&zip, b"x").unwrap();
        assert!(matches!(check_ipa(&zip).await, Err(AscError::InvalidFile(_))));

        std::fs::write(&missing, b"x").unwrap();
        assert!(check_ipa(&missing).await.is_ok());
    }

    #[test]
    fn upload_platform_defaults_to_ios() {
        assert_eq!(UploadPlatform::default(), UploadPlatform::Ios);
        assert_eq!("osx".parse::<UploadPlatform>().unwrap(), UploadPlatform::Osx);
        assert!("macos".parse::<UploadPlatform>().is_err());
    }

    #[test]
    fn credentials_are_passed_as_api_key() {
        let cli = TransporterCli::new(TransporterAuth {
            key_id: "KEY".into(),
            issuer_id: "ISS".into(),
        });
        let args = cli.args("verify", Path::new("/tmp/App.ipa"), UploadPlatform::Ios);
        assert_eq!(&args[..2], ["-m", "verify"]);
        assert!(args.windows(2).any(|w| w == ["-apiKey", "KEY"]));
        assert!(args.windows(2).any(|w| w == ["-apiIssuer", "ISS"]));
        assert!(!format!("{:?}", cli.auth).contains("KEY"));
    }
}
