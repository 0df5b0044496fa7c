use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::AppStoreConnect;
use super::auth::TokenProvider;
use super::bundle_id;
use super::dsym::{self, Extractor, UnzipExtractor};
use super::kinds::{BundleIdPlatform, CapabilityType, CertificateType, ProfileType};
use super::models::{
    App, BUNDLE_IDS, Build, BuildDocument, BundleId, BundleIdAttributes, BundleIdCapability,
    Certificate, Document, ErrorResponse, NewProfile, Profile, ProfileList,
};
use crate::config::Credential;
use crate::error::AscError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const PAGE_LIMIT: &str = "200";

/// `reqwest`-backed gateway. Every request is signed with a fresh-enough bearer token.
pub struct AscClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
    extractor: Arc<dyn Extractor>,
}

impl std::fmt::Debug for AscClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AscClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AscClient {
    pub fn new(base_url: &str, credential: &Credential) -> Result<Self, AscError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AscError::Config(format!("cannot create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens: TokenProvider::new(credential)?,
            extractor: Arc::new(UnzipExtractor::default()),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AscError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| AscError::Config(format!("invalid API URL {}{path}: {e}", self.base_url)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<reqwest::Response, AscError> {
        let token = self.tokens.token()?;
        tracing::debug!(method = %method, path = url.path(), "API request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, AscError> {
        let response = self.send(Method::GET, url, None).await?;
        decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: &Value) -> Result<T, AscError> {
        let response = self.send(Method::POST, url, Some(body)).await?;
        decode(response).await
    }

    async fn delete(&self, url: Url) -> Result<(), AscError> {
        self.send(Method::DELETE, url, None).await.map(|_| ())
    }
}

fn transport_error(e: reqwest::Error) -> AscError {
    let code = if e.is_timeout() {
        408
    } else if e.is_connect() {
        503
    } else {
        0
    };
    tracing::error!(error = %e, code, "API transport failure");
    AscError::ApiError {
        code,
        message: e.to_string(),
    }
}

async fn status_error(response: reqwest::Response) -> AscError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|parsed| parsed.errors.first().map(|detail| detail.message()))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_owned()
            } else {
                body.trim().to_owned()
            }
        });

    tracing::error!(status = status.as_u16(), message = %message, "API request failed");
    match status {
        StatusCode::UNAUTHORIZED => AscError::AuthenticationFailed(message),
        StatusCode::NOT_FOUND => AscError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => AscError::RateLimited,
        other => AscError::ApiError {
            code: other.as_u16(),
            message,
        },
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AscError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| AscError::ApiError {
        code: status,
        message: format!("cannot decode response: {e}"),
    })
}

fn linkage(kind: &str, id: &str) -> Value {
    json!({ "data": { "type": kind, "id": id } })
}

fn linkages(kind: &str, ids: &[String]) -> Value {
    let data: Vec<Value> = ids.iter().map(|id| json!({ "type": kind, "id": id })).collect();
    json!({ "data": data })
}

#[async_trait]
impl AppStoreConnect for AscClient {
    async fn list_apps(&self, bundle_id_filter: Option<&str>) -> Result<Vec<App>, AscError> {
        let mut query = vec![("limit", PAGE_LIMIT)];
        if let Some(filter) = bundle_id_filter {
            query.push(("filter[bundleId]", filter));
        }
        let document: Document<Vec<App>> = self.get(self.url("/v1/apps", &query)?).await?;
        Ok(document.data)
    }

    async fn get_app(&self, app_id: &str) -> Result<App, AscError> {
        let document: Document<App> = self.get(self.url(&format!("/v1/apps/{app_id}"), &[])?).await?;
        Ok(document.data)
    }

    async fn list_builds(
        &self,
        app_id: &str,
        version_filter: Option<&str>,
    ) -> Result<Vec<Build>, AscError> {
        let mut query = vec![
            ("filter[app]", app_id),
            ("sort", "-uploadedDate"),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(version) = version_filter {
            query.push(("filter[version]", version));
        }
        let document: Document<Vec<Build>> = self.get(self.url("/v1/builds", &query)?).await?;
        Ok(document.data)
    }

    async fn get_build(&self, build_id: &str, include_bundles: bool) -> Result<BuildDocument, AscError> {
        let query: &[(&str, &str)] = if include_bundles {
            &[("include", "buildBundles")]
        } else {
            &[]
        };
        self.get(self.url(&format!("/v1/builds/{build_id}"), query)?)
            .await
            .map_err(|e| match e {
                AscError::NotFound(_) => AscError::BuildNotFound(build_id.to_owned()),
                other => other,
            })
    }

    async fn download_dsyms(&self, build_id: &str, output_dir: &Path) -> Result<PathBuf, AscError> {
        tracing::info!(build_id = %build_id, output = %output_dir.display(), "downloading dSYMs");
        let document = self.get_build(build_id, true).await?;
        let url = dsym::dsym_url(build_id, &document)?;
        dsym::fetch_and_extract(&self.http, &url, build_id, output_dir, self.extractor.as_ref()).await
    }

    async fn list_certificates(
        &self,
        certificate_type: Option<&CertificateType>,
    ) -> Result<Vec<Certificate>, AscError> {
        let mut query = vec![("limit", PAGE_LIMIT)];
        if let Some(kind) = certificate_type {
            query.push(("filter[certificateType]", kind.as_str()));
        }
        let document: Document<Vec<Certificate>> =
            self.get(self.url("/v1/certificates", &query)?).await?;
        Ok(document.data)
    }

    async fn get_certificate(&self, certificate_id: &str) -> Result<Certificate, AscError> {
        let document: Document<Certificate> = self
            .get(self.url(&format!("/v1/certificates/{certificate_id}"), &[])?)
            .await?;
        Ok(document.data)
    }

    async fn create_certificate(
        &self,
        csr_content: &str,
        certificate_type: &CertificateType,
    ) -> Result<Certificate, AscError> {
        let body = json!({
            "data": {
                "type": "certificates",
                "attributes": {
                    "csrContent": csr_content,
                    "certificateType": certificate_type.as_str(),
                }
            }
        });
        let document: Document<Certificate> = self
            .post(self.url("/v1/certificates", &[])?, &body)
            .await
            .map_err(|e| match e {
                AscError::ApiError { message, .. } => AscError::CertificateCreationFailed(message),
                other => other,
            })?;
        tracing::info!(certificate_id = %document.data.id, kind = %certificate_type, "certificate created");
        Ok(document.data)
    }

    async fn revoke_certificate(&self, certificate_id: &str) -> Result<(), AscError> {
        self.delete(self.url(&format!("/v1/certificates/{certificate_id}"), &[])?)
            .await
            .map_err(|e| match e {
                AscError::ApiError { message, .. } => AscError::CertificateRevokeFailed(message),
                other => other,
            })?;
        tracing::info!(certificate_id = %certificate_id, "certificate revoked");
        Ok(())
    }

    async fn list_bundle_ids(
        &self,
        platform: Option<&BundleIdPlatform>,
        identifier: Option<&str>,
    ) -> Result<Vec<BundleId>, AscError> {
        let mut query = vec![("limit", PAGE_LIMIT)];
        if let Some(platform) = platform {
            query.push(("filter[platform]", platform.as_str()));
        }
        if let Some(identifier) = identifier {
            query.push(("filter[identifier]", identifier));
        }
        let document: Document<Vec<BundleId>> = self.get(self.url("/v1/bundleIds", &query)?).await?;
        Ok(document.data)
    }

    async fn get_bundle_id(&self, bundle_id_id: &str) -> Result<BundleId, AscError> {
        let document: Document<BundleId> = self
            .get(self.url(&format!("/v1/bundleIds/{bundle_id_id}"), &[])?)
            .await?;
        Ok(document.data)
    }

    async fn register_bundle_id(
        &self,
        identifier: &str,
        name: &str,
        platform: &BundleIdPlatform,
    ) -> Result<BundleId, AscError> {
        bundle_id::validate(identifier)?;
        let body = json!({
            "data": {
                "type": BUNDLE_IDS,
                "attributes": {
                    "identifier": identifier,
                    "name": name,
                    "platform": platform.as_str(),
                }
            }
        });
        let document: Document<BundleId> = self.post(self.url("/v1/bundleIds", &[])?, &body).await?;
        tracing::info!(identifier = %identifier, id = %document.data.id, "bundle ID registered");
        Ok(document.data)
    }

    async fn list_capabilities(&self, bundle_id_id: &str) -> Result<Vec<BundleIdCapability>, AscError> {
        let document: Document<Vec<BundleIdCapability>> = self
            .get(self.url(&format!("/v1/bundleIds/{bundle_id_id}/bundleIdCapabilities"), &[])?)
            .await?;
        Ok(document.data)
    }

    async fn enable_capability(
        &self,
        bundle_id_id: &str,
        capability: &CapabilityType,
    ) -> Result<BundleIdCapability, AscError> {
        let body = json!({
            "data": {
                "type": "bundleIdCapabilities",
                "attributes": { "capabilityType": capability.as_str() },
                "relationships": { "bundleId": linkage(BUNDLE_IDS, bundle_id_id) }
            }
        });
        let document: Document<BundleIdCapability> = self
            .post(self.url("/v1/bundleIdCapabilities", &[])?, &body)
            .await?;
        tracing::info!(bundle_id = %bundle_id_id, capability = %capability, "capability enabled");
        Ok(document.data)
    }

    async fn list_profiles(&self, profile_type: Option<&ProfileType>) -> Result<ProfileList, AscError> {
        let mut query = vec![("include", "bundleId"), ("limit", PAGE_LIMIT)];
        if let Some(kind) = profile_type {
            query.push(("filter[profileType]", kind.as_str()));
        }
        let document: Document<Vec<Profile>> = self.get(self.url("/v1/profiles", &query)?).await?;
        let bundle_ids = document.included_of::<BundleIdAttributes>(BUNDLE_IDS);
        Ok(ProfileList {
            profiles: document.data,
            bundle_ids,
        })
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, AscError> {
        let document: Document<Profile> = self
            .get(self.url(&format!("/v1/profiles/{profile_id}"), &[])?)
            .await?;
        Ok(document.data)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, AscError> {
        let mut relationships = json!({
            "bundleId": linkage(BUNDLE_IDS, &profile.bundle_id),
            "certificates": linkages("certificates", &profile.certificate_ids),
        });
        if !profile.device_ids.is_empty() {
            relationships["devices"] = linkages("devices", &profile.device_ids);
        }
        let body = json!({
            "data": {
                "type": "profiles",
                "attributes": {
                    "name": profile.name,
                    "profileType": profile.profile_type.as_str(),
                },
                "relationships": relationships
            }
        });
        let document: Document<Profile> = self.post(self.url("/v1/profiles", &[])?, &body).await?;
        tracing::info!(profile_id = %document.data.id, name = %profile.name, "profile created");
        Ok(document.data)
    }

    async fn delete_profile(&self, profile_id: &str) -> Result<(), AscError> {
        self.delete(self.url(&format!("/v1/profiles/{profile_id}"), &[])?).await?;
        tracing::info!(profile_id = %profile_id, "profile deleted");
        Ok(())
    }
}
