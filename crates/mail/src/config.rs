//! Voiceflow configuration
//!
//! Google OAuth client credentials are looked up in [`CredentialSource`]
//! order: values baked in at build time, then `google-credentials.json`
//! in the config directory, then the process environment.
//!
//! User settings live in `settings.json`; every field has a default.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const CREDENTIALS_FILE: &str = "google-credentials.json";
const SETTINGS_FILE: &str = "settings.json";

/// Body characters sent to the assistant per email unless configured
pub const DEFAULT_SNIPPET_CHARS: usize = 200;

const CLIENT_ID_VAR: &str = "GOOGLE_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "GOOGLE_CLIENT_SECRET";

/// Where a set of OAuth client credentials came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `GOOGLE_CLIENT_ID`/`GOOGLE_CLIENT_SECRET` set when building
    Embedded,
    /// A Google Cloud Console client secret file
    File(PathBuf),
    /// `GOOGLE_CLIENT_ID`/`GOOGLE_CLIENT_SECRET` in the environment
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "built-in credentials"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// OAuth client credentials for Google sign-in
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub source: CredentialSource,
}

/// Client secret file as downloaded from the Cloud Console. Desktop
/// clients nest under "installed", web clients under "web".
#[derive(Deserialize)]
struct ClientSecretFile {
    #[serde(alias = "web")]
    installed: Option<ClientSecret>,
}

#[derive(Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
}

impl GoogleCredentials {
    fn from_pair(
        client_id: Option<String>,
        client_secret: Option<String>,
        source: CredentialSource,
    ) -> Option<Self> {
        let client_id = client_id.filter(|v| !v.is_empty())?;
        let client_secret = client_secret.filter(|v| !v.is_empty())?;
        Some(Self {
            client_id,
            client_secret,
            source,
        })
    }

    /// Find credentials, trying each [`CredentialSource`] in turn
    pub fn load() -> Result<Self> {
        let creds = match Self::embedded() {
            Some(creds) => creds,
            None => match Self::default_credentials_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::from_env()?,
            },
        };
        debug!("Using Google credentials from {}", creds.source);
        Ok(creds)
    }

    /// Credentials compiled into the binary, e.g.
    /// `GOOGLE_CLIENT_ID=xxx GOOGLE_CLIENT_SECRET=yyy cargo build --release`
    pub fn embedded() -> Option<Self> {
        Self::from_pair(
            option_env!("GOOGLE_CLIENT_ID").map(str::to_string),
            option_env!("GOOGLE_CLIENT_SECRET").map(str::to_string),
            CredentialSource::Embedded,
        )
    }

    /// Read a client secret file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: ClientSecretFile = config::load_json_file(path)?;
        Self::from_client_secret(file, CredentialSource::File(path.to_path_buf()))
    }

    /// Parse client secret JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_client_secret(file, CredentialSource::File(PathBuf::from(CREDENTIALS_FILE)))
    }

    fn from_client_secret(file: ClientSecretFile, source: CredentialSource) -> Result<Self> {
        let Some(secret) = file.installed else {
            bail!("Credentials file has neither an 'installed' nor a 'web' client");
        };
        Self::from_pair(Some(secret.client_id), Some(secret.client_secret), source)
            .context("Credentials file has an empty client id or secret")
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_pair(
            std::env::var(CLIENT_ID_VAR).ok(),
            std::env::var(CLIENT_SECRET_VAR).ok(),
            CredentialSource::Environment,
        )
        .with_context(|| format!("{} and {} must both be set", CLIENT_ID_VAR, CLIENT_SECRET_VAR))
    }

    /// Where `load` looks for a client secret file
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}

/// User-tunable settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gmail search query used when fetching
    pub query: String,
    /// Maximum number of messages to fetch
    pub max_results: usize,
    /// Generative model used by the assistant
    pub model: String,
    /// Number of body characters sent to the assistant per email
    pub snippet_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            query: "in:inbox newer_than:1d".to_string(),
            max_results: 30,
            model: "gemini-2.0-flash".to_string(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl Settings {
    /// Load settings from ~/.config/voiceflow/settings.json, or defaults if absent
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }
        Ok(Self::default())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_client_secret() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let creds = GoogleCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
        assert!(matches!(creds.source, CredentialSource::File(_)));
    }

    #[test]
    fn test_web_client_secret() {
        let json = r#"{ "web": { "client_id": "web-id", "client_secret": "web-secret" } }"#;
        let creds = GoogleCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-id");
    }

    #[test]
    fn test_client_secret_without_client() {
        assert!(GoogleCredentials::from_json(r#"{ "other": {} }"#).is_err());
    }

    #[test]
    fn test_client_secret_with_empty_values() {
        let json = r#"{ "installed": { "client_id": "", "client_secret": "s" } }"#;
        assert!(GoogleCredentials::from_json(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{ "installed": { "client_id": "a", "client_secret": "b" } }"#)
            .unwrap();

        let creds = GoogleCredentials::from_file(&path).unwrap();
        assert_eq!(creds.client_secret, "b");
        assert_eq!(creds.source, CredentialSource::File(path));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CredentialSource::Environment.to_string(), "environment");
        assert_eq!(
            CredentialSource::File(PathBuf::from("/tmp/c.json")).to_string(),
            "/tmp/c.json"
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.query, "in:inbox newer_than:1d");
        assert_eq!(settings.max_results, 30);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings = Settings::from_json(r#"{ "max_results": 10 }"#).unwrap();
        assert_eq!(settings.max_results, 10);
        assert_eq!(settings.query, Settings::default().query);
        assert_eq!(settings.model, Settings::default().model);
    }
}
