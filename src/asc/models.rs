//! JSON:API projections of App Store Connect resources.
//!
//! Every entity is `Resource<Attributes>`. Related entities side-loaded through `include=`
//! arrive in `Document::included` as raw resources and are decoded on demand by type.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::kinds::{BundleIdPlatform, CapabilityType, CertificateType, ProcessingState, ProfileType};

#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "Option::default")]
    pub attributes: Option<A>,
    #[serde(default)]
    pub relationships: Option<Relationships>,
}

/// Relationship linkage we read back: single-valued `bundleId`, `app`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationships {
    #[serde(default)]
    pub bundle_id: Option<ToOne>,
    #[serde(default)]
    pub app: Option<ToOne>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToOne {
    #[serde(default)]
    pub data: Option<Linkage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Linkage {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Side-loaded resource whose attributes are decoded lazily.
#[derive(Debug, Clone, Deserialize)]
pub struct RawResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document<T> {
    pub data: T,
    #[serde(default)]
    pub included: Vec<RawResource>,
}

impl<T> Document<T> {
    /// Decode every included resource of `kind`. Entries whose attributes do not decode are
    /// skipped rather than fabricated.
    pub fn included_of<A: DeserializeOwned>(&self, kind: &str) -> Vec<Resource<A>> {
        self.included
            .iter()
            .filter(|raw| raw.kind == kind)
            .filter_map(|raw| {
                let attributes = serde_json::from_value::<A>(raw.attributes.clone()).ok()?;
                Some(Resource {
                    id: raw.id.clone(),
                    kind: raw.kind.clone(),
                    attributes: Some(attributes),
                    relationships: None,
                })
            })
            .collect()
    }
}

// --- attributes ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAttributes {
    pub name: Option<String>,
    pub bundle_id: Option<String>,
    pub sku: Option<String>,
    pub primary_locale: Option<String>,
    pub content_rights_declaration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAttributes {
    pub version: Option<String>,
    pub uploaded_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub expired: Option<bool>,
    pub min_os_version: Option<String>,
    pub processing_state: Option<ProcessingState>,
    pub uses_non_exempt_encryption: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildBundleAttributes {
    #[serde(rename = "bundleId")]
    pub bundle_id: Option<String>,
    #[serde(rename = "dSYMUrl")]
    pub dsym_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateAttributes {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub certificate_type: Option<CertificateType>,
    pub serial_number: Option<String>,
    pub platform: Option<BundleIdPlatform>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub certificate_content: Option<String>,
    pub activated: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleIdAttributes {
    pub name: Option<String>,
    pub platform: Option<BundleIdPlatform>,
    pub identifier: Option<String>,
    pub seed_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityAttributes {
    pub capability_type: Option<CapabilityType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAttributes {
    pub name: Option<String>,
    pub platform: Option<BundleIdPlatform>,
    pub profile_type: Option<ProfileType>,
    pub profile_state: Option<String>,
    pub profile_content: Option<String>,
    pub uuid: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}

pub type App = Resource<AppAttributes>;
pub type Build = Resource<BuildAttributes>;
pub type BuildBundle = Resource<BuildBundleAttributes>;
pub type Certificate = Resource<CertificateAttributes>;
pub type BundleId = Resource<BundleIdAttributes>;
pub type BundleIdCapability = Resource<CapabilityAttributes>;
pub type Profile = Resource<ProfileAttributes>;

pub const BUILD_BUNDLES: &str = "buildBundles";
pub const BUNDLE_IDS: &str = "bundleIds";

impl<A> Resource<A> {
    /// Construct a resource without relationships. Used by fakes and tests.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, attributes: A) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: Some(attributes),
            relationships: None,
        }
    }

    pub fn attrs(&self) -> Option<&A> {
        self.attributes.as_ref()
    }

    pub fn related_bundle_id(&self) -> Option<&str> {
        self.relationships
            .as_ref()?
            .bundle_id
            .as_ref()?
            .data
            .as_ref()
            .map(|linkage| linkage.id.as_str())
    }
}

impl Build {
    pub fn processing_state(&self) -> Option<&ProcessingState> {
        self.attrs()?.processing_state.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.attrs()?.version.as_deref()
    }

    pub fn uploaded_date(&self) -> Option<DateTime<Utc>> {
        self.attrs()?.uploaded_date
    }
}

impl BundleId {
    pub fn identifier(&self) -> Option<&str> {
        self.attrs()?.identifier.as_deref()
    }
}

impl BundleIdCapability {
    pub fn capability_type(&self) -> Option<&CapabilityType> {
        self.attrs()?.capability_type.as_ref()
    }
}

/// A build plus its side-loaded build bundles.
pub type BuildDocument = Document<Build>;

/// Profiles plus the bundle ids they reference.
#[derive(Debug, Clone, Default)]
pub struct ProfileList {
    pub profiles: Vec<Profile>,
    pub bundle_ids: Vec<BundleId>,
}

impl ProfileList {
    /// Identifier of the bundle id a profile points at, when present in the side-table.
    pub fn bundle_identifier_for(&self, profile: &Profile) -> Option<&str> {
        let id = profile.related_bundle_id()?;
        self.bundle_ids
            .iter()
            .find(|bundle| bundle.id == id)
            .and_then(|bundle| bundle.identifier())
    }
}

/// Input for creating a provisioning profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub profile_type: ProfileType,
    pub bundle_id: String,
    pub certificate_ids: Vec<String>,
    pub device_ids: Vec<String>,
}

/// `{"errors": [...]}` body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub status: Option<String>,
    pub code: Option<String>,
    pub title: Option<String>,
    pub detail: Option<String>,
}

impl ErrorDetail {
    pub fn message(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| "Unknown API error".to_owned())
    }
}
