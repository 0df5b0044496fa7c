use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::AscError;

pub const DEFAULT_KEY_EXPIRY_SECS: u64 = 1200;
pub const DEFAULT_API_BASE_URL: &str = "https://api.appstoreconnect.apple.com";

const ENV_KEY_ID: &str = "ASC_KEY_ID";
const ENV_ISSUER_ID: &str = "ASC_ISSUER_ID";
const ENV_PRIVATE_KEY_PATH: &str = "ASC_PRIVATE_KEY_PATH";
const ENV_KEY_EXPIRY: &str = "ASC_KEY_EXPIRY";
const ENV_ARCHIVES_DIR: &str = "ASC_ARCHIVES_DIR";
const ENV_API_BASE_URL: &str = "ASC_API_BASE_URL";

/// Process-wide configuration. Loaded once at startup.
pub struct Config {
    pub key_id: String,
    pub issuer_id: String,
    pub private_key_path: PathBuf,
    pub key_expiry: Duration,
    pub archives_dir: PathBuf,
    pub api_base_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("key_id", &redact(&self.key_id))
            .field("private_key_path", &self.private_key_path)
            .field("key_expiry", &self.key_expiry)
            .field("archives_dir", &self.archives_dir)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// API credential: identifiers plus the PEM-encoded private key.
pub struct Credential {
    pub key_id: String,
    pub issuer_id: String,
    pub private_key: SecretString,
    pub expiry: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AscError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Required values that are absent or blank fail.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AscError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    AscError::Config(format!(
                        "missing required environment variable {key} \
                         (required: {ENV_KEY_ID}, {ENV_ISSUER_ID}, {ENV_PRIVATE_KEY_PATH})"
                    ))
                })
        };

        let key_id = required(ENV_KEY_ID)?;
        let issuer_id = required(ENV_ISSUER_ID)?;
        let private_key_path = PathBuf::from(required(ENV_PRIVATE_KEY_PATH)?);

        // Unparsable or zero expiry falls back to the default.
        let key_expiry_secs = lookup(ENV_KEY_EXPIRY)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_KEY_EXPIRY_SECS);

        let archives_dir = match lookup(ENV_ARCHIVES_DIR).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_archives_dir(lookup("HOME")),
        };

        let api_base_url = lookup(ENV_API_BASE_URL)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        Ok(Self {
            key_id,
            issuer_id,
            private_key_path,
            key_expiry: Duration::from_secs(key_expiry_secs),
            archives_dir,
            api_base_url,
        })
    }

    /// Read the private key file and assemble the API credential.
    pub fn load_credential(&self) -> Result<Credential, AscError> {
        let pem = std::fs::read_to_string(&self.private_key_path).map_err(|e| {
            AscError::InvalidPrivateKey(format!(
                "cannot read {}: {e}",
                self.private_key_path.display()
            ))
        })?;

        Ok(Credential {
            key_id: self.key_id.clone(),
            issuer_id: self.issuer_id.clone(),
            private_key: SecretString::from(pem),
            expiry: self.key_expiry,
        })
    }

    pub fn key_id_redacted(&self) -> String {
        redact(&self.key_id)
    }
}

fn default_archives_dir(home: Option<String>) -> PathBuf {
    PathBuf::from(home.unwrap_or_else(|| "~".to_owned()))
        .join("Library")
        .join("Developer")
        .join("Xcode")
        .join("Archives")
}

/// First four characters, then `***`.
fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{prefix}***")
}
