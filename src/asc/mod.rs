pub mod auth;
pub mod bundle_id;
pub mod client;
pub mod dsym;
pub mod kinds;
pub mod models;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AscError;
use kinds::{BundleIdPlatform, CapabilityType, CertificateType, ProfileType};
use models::{
    App, Build, BuildDocument, BundleId, BundleIdCapability, Certificate, NewProfile, Profile,
    ProfileList,
};

pub use client::AscClient;

/// Extension point for the App Store Connect backend. Handlers only ever see this trait, so
/// tests drive them with in-memory fakes.
///
/// Required methods map one-to-one onto REST endpoints. Provided methods compose them.
#[async_trait]
pub trait AppStoreConnect: Send + Sync {
    // --- apps ---

    async fn list_apps(&self, bundle_id_filter: Option<&str>) -> Result<Vec<App>, AscError>;

    async fn get_app(&self, app_id: &str) -> Result<App, AscError>;

    // --- builds ---

    /// Builds for an app, newest upload first.
    async fn list_builds(
        &self,
        app_id: &str,
        version_filter: Option<&str>,
    ) -> Result<Vec<Build>, AscError>;

    async fn get_build(&self, build_id: &str, include_bundles: bool)
    -> Result<BuildDocument, AscError>;

    /// Download and extract the dSYMs of a processed build. Returns the extraction directory.
    async fn download_dsyms(&self, build_id: &str, output_dir: &Path)
    -> Result<PathBuf, AscError>;

    // --- certificates ---

    async fn list_certificates(
        &self,
        certificate_type: Option<&CertificateType>,
    ) -> Result<Vec<Certificate>, AscError>;

    async fn get_certificate(&self, certificate_id: &str) -> Result<Certificate, AscError>;

    async fn create_certificate(
        &self,
        csr_content: &str,
        certificate_type: &CertificateType,
    ) -> Result<Certificate, AscError>;

    async fn revoke_certificate(&self, certificate_id: &str) -> Result<(), AscError>;

    // --- bundle ids ---

    async fn list_bundle_ids(
        &self,
        platform: Option<&BundleIdPlatform>,
        identifier: Option<&str>,
    ) -> Result<Vec<BundleId>, AscError>;

    async fn get_bundle_id(&self, bundle_id_id: &str) -> Result<BundleId, AscError>;

    async fn register_bundle_id(
        &self,
        identifier: &str,
        name: &str,
        platform: &BundleIdPlatform,
    ) -> Result<BundleId, AscError>;

    async fn list_capabilities(&self, bundle_id_id: &str)
    -> Result<Vec<BundleIdCapability>, AscError>;

    async fn enable_capability(
        &self,
        bundle_id_id: &str,
        capability: &CapabilityType,
    ) -> Result<BundleIdCapability, AscError>;

    // --- profiles ---

    async fn list_profiles(&self, profile_type: Option<&ProfileType>)
    -> Result<ProfileList, AscError>;

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, AscError>;

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AscError>;

    async fn delete_profile(&self, profile_id: &str) -> Result<(), AscError>;

    // --- composed ---

    async fn find_app_by_bundle_id(&self, bundle_id: &str) -> Result<App, AscError> {
        self.list_apps(Some(bundle_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AscError::NotFound(format!("no app with bundle ID {bundle_id}")))
    }

    async fn get_latest_build(&self, app_id: &str) -> Result<Build, AscError> {
        self.list_builds(app_id, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AscError::BuildNotFound(format!("no builds found for app {app_id}")))
    }

    /// Exact identifier match; the server-side filter is a prefix match.
    async fn find_bundle_id(&self, identifier: &str) -> Result<BundleId, AscError> {
        self.list_bundle_ids(None, Some(identifier))
            .await?
            .into_iter()
            .find(|bundle| bundle.identifier() == Some(identifier))
            .ok_or_else(|| AscError::NotFound(format!("bundle ID {identifier}")))
    }

    async fn download_certificate(
        &self,
        certificate_id: &str,
        output_path: &Path,
    ) -> Result<PathBuf, AscError> {
        let certificate = self.get_certificate(certificate_id).await?;
        let content = certificate
            .attrs()
            .and_then(|a| a.certificate_content.as_deref())
            .ok_or_else(|| {
                AscError::DownloadFailed(format!(
                    "certificate {certificate_id} has no downloadable content"
                ))
            })?;
        write_base64(content, output_path).await
    }

    async fn download_profile(
        &self,
        profile_id: &str,
        output_path: &Path,
    ) -> Result<PathBuf, AscError> {
        let profile = self.get_profile(profile_id).await?;
        let content = profile
            .attrs()
            .and_then(|a| a.profile_content.as_deref())
            .ok_or_else(|| {
                AscError::DownloadFailed(format!(
                    "profile {profile_id} has no content; it may not be active"
                ))
            })?;
        write_base64(content, output_path).await
    }
}

/// Decode base64 file content and write it, creating parent directories as needed.
async fn write_base64(content: &str, output_path: &Path) -> Result<PathBuf, AscError> {
    let bytes = STANDARD
        .decode(content.trim())
        .map_err(|e| AscError::DownloadFailed(format!("content is not valid base64: {e}")))?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AscError::io(format!("cannot create {}", parent.display()), e))?;
    }
    tokio::fs::write(output_path, bytes)
        .await
        .map_err(|e| AscError::io(format!("cannot write {}", output_path.display()), e))?;

    Ok(output_path.to_path_buf())
}
