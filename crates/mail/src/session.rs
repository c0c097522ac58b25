//! Session storage
//!
//! A session holds the Gmail access token obtained at login. Sessions have
//! a fixed one-hour lifetime and are never refreshed: once expired, the user
//! logs in again.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Session filename in the Voiceflow config directory
const SESSION_FILE: &str = "session.json";

/// Lifetime of a session from the moment it is created
pub const SESSION_LIFETIME_SECS: i64 = 60 * 60;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session issued at `now`
    pub fn new(access_token: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at: now,
            expires_at: now + Duration::seconds(SESSION_LIFETIME_SECS),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Credential store for the current session
pub trait SessionStore: Send + Sync {
    /// Get the current session, or None if missing or expired
    fn get_session(&self) -> Result<Option<Session>>;

    /// Start a new session for an access token, replacing any existing one
    fn create_session(&self, access_token: &str) -> Result<Session>;

    /// Remove the current session
    fn clear_session(&self) -> Result<()>;
}

/// Session store backed by a JSON file
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at the default path (~/.config/voiceflow/session.json)
    pub fn new() -> Result<Self> {
        let path = config::config_path(SESSION_FILE).context("Could not determine config directory")?;
        Ok(Self { path })
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get_session(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let session: Session = match config::load_json_file(&self.path) {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to read session, ignoring it: {:#}", e);
                return Ok(None);
            }
        };

        if session.is_expired() {
            debug!("Session expired at {}", session.expires_at);
            return Ok(None);
        }

        Ok(Some(session))
    }

    fn create_session(&self, access_token: &str) -> Result<Session> {
        let session = Session::new(access_token, Utc::now());
        config::save_json_file(&self.path, &session)?;
        debug!("Session created, expires at {}", session.expires_at);
        Ok(session)
    }

    fn clear_session(&self) -> Result<()> {
        config::remove_file(&self.path)
    }
}

/// Session store kept in memory
#[derive(Default)]
pub struct InMemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding an existing session (possibly already expired)
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_session(&self) -> Result<Option<Session>> {
        let guard = self
            .session
            .read()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        Ok(guard.as_ref().filter(|s| !s.is_expired()).cloned())
    }

    fn create_session(&self, access_token: &str) -> Result<Session> {
        let session = Session::new(access_token, Utc::now());
        let mut guard = self
            .session
            .write()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        *guard = Some(session.clone());
        Ok(session)
    }

    fn clear_session(&self) -> Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_lifetime_is_one_hour() {
        let now = Utc::now();
        let session = Session::new("token", now);
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(1));
        assert!(!session.is_expired_at(now + Duration::minutes(59)));
        assert!(session.is_expired_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::at(dir.path().join("session.json"));

        assert!(store.get_session().unwrap().is_none());

        let created = store.create_session("ya29.token").unwrap();
        let loaded = store.get_session().unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.access_token, "ya29.token");

        store.clear_session().unwrap();
        assert!(store.get_session().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_ignores_expired_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let stale = Session::new("old", Utc::now() - Duration::hours(2));
        config::save_json_file(&path, &stale).unwrap();

        let store = FileSessionStore::at(path);
        assert!(store.get_session().unwrap().is_none());
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::at(path);
        assert!(store.get_session().unwrap().is_none());
    }

    #[test]
    fn test_clear_without_session() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::at(dir.path().join("session.json"));
        assert!(store.clear_session().is_ok());
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemorySessionStore::new();
        assert!(store.get_session().unwrap().is_none());

        store.create_session("abc").unwrap();
        assert_eq!(store.get_session().unwrap().unwrap().access_token, "abc");

        store.clear_session().unwrap();
        assert!(store.get_session().unwrap().is_none());
    }

    #[test]
    fn test_in_memory_store_hides_expired() {
        let stale = Session::new("old", Utc::now() - Duration::hours(2));
        let store = InMemorySessionStore::with_session(stale);
        assert!(store.get_session().unwrap().is_none());
    }
}
