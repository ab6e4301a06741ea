// Credential storage: tokens, cached profile and pending registration email

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use super::types::{SessionCredentials, TokenKind, TokenPair, UserProfile};

const USER_PROFILE_KEY: &str = "user_profile";
const REGISTRATION_EMAIL_KEY: &str = "registration_email";

/// Durable key-value store for session state
///
/// `clear()` must be atomic with respect to later reads: once it returns,
/// every getter yields `None` until something is saved again.
pub trait CredentialStore: Send + Sync {
    fn save_token(&self, token: &str, kind: TokenKind) -> Result<()>;

    fn token(&self, kind: TokenKind) -> Result<Option<String>>;

    fn save_user_profile(&self, serialized_profile: &str) -> Result<()>;

    fn user_profile(&self) -> Result<Option<String>>;

    fn save_registration_email(&self, email: &str) -> Result<()>;

    fn registration_email(&self) -> Result<Option<String>>;

    fn clear_registration_email(&self) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// Persist both halves of a freshly issued pair
    fn save_tokens(&self, tokens: &TokenPair) -> Result<()> {
        self.save_token(&tokens.access_token, TokenKind::Access)?;
        self.save_token(&tokens.refresh_token, TokenKind::Refresh)
    }

    /// Serialize and persist a profile
    fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_string(profile).context("Failed to serialize user profile")?;
        self.save_user_profile(&json)
    }

    /// Decode the cached profile, if any
    fn profile(&self) -> Result<Option<UserProfile>> {
        match self.user_profile()? {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .context("Failed to parse cached user profile"),
        }
    }

    /// Full session, present only when both tokens are stored
    fn session(&self) -> Result<Option<SessionCredentials>> {
        let access = self.token(TokenKind::Access)?;
        let refresh = self.token(TokenKind::Refresh)?;
        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(SessionCredentials {
                tokens: TokenPair {
                    access_token,
                    refresh_token,
                },
                profile: self.profile()?,
            })),
            _ => Ok(None),
        }
    }
}

// ==================================================================================================
// In-memory store
// ==================================================================================================

/// Process-local store, used for ephemeral sessions and tests
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<&'static str, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&self, key: &'static str, value: &str) {
        self.entries.write().insert(key, value.to_string());
    }

    fn get(&self, key: &'static str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save_token(&self, token: &str, kind: TokenKind) -> Result<()> {
        self.put(kind.key(), token);
        Ok(())
    }

    fn token(&self, kind: TokenKind) -> Result<Option<String>> {
        Ok(self.get(kind.key()))
    }

    fn save_user_profile(&self, serialized_profile: &str) -> Result<()> {
        self.put(USER_PROFILE_KEY, serialized_profile);
        Ok(())
    }

    fn user_profile(&self) -> Result<Option<String>> {
        Ok(self.get(USER_PROFILE_KEY))
    }

    fn save_registration_email(&self, email: &str) -> Result<()> {
        self.put(REGISTRATION_EMAIL_KEY, email);
        Ok(())
    }

    fn registration_email(&self) -> Result<Option<String>> {
        Ok(self.get(REGISTRATION_EMAIL_KEY))
    }

    fn clear_registration_email(&self) -> Result<()> {
        self.entries.write().remove(REGISTRATION_EMAIL_KEY);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

// ==================================================================================================
// SQLite store
// ==================================================================================================

/// Store backed by a `session_kv` table in a private SQLite file
pub struct SqliteCredentialStore {
    conn: Mutex<Connection>,
}

impl SqliteCredentialStore {
    /// Open (or create) the store at `path`, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        tracing::debug!("Opened credential store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Store that lives only as long as the process
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .context("Failed to create session_kv table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO session_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, Utc::now().to_rfc3339()),
        )
        .with_context(|| format!("Failed to save {}", key))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value FROM session_kv WHERE key = ?",
            [key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to load {}", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM session_kv WHERE key = ?", [key])
            .with_context(|| format!("Failed to remove {}", key))?;
        Ok(())
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn save_token(&self, token: &str, kind: TokenKind) -> Result<()> {
        self.put(kind.key(), token)
    }

    fn token(&self, kind: TokenKind) -> Result<Option<String>> {
        self.get(kind.key())
    }

    fn save_user_profile(&self, serialized_profile: &str) -> Result<()> {
        self.put(USER_PROFILE_KEY, serialized_profile)
    }

    fn user_profile(&self) -> Result<Option<String>> {
        self.get(USER_PROFILE_KEY)
    }

    fn save_registration_email(&self, email: &str) -> Result<()> {
        self.put(REGISTRATION_EMAIL_KEY, email)
    }

    fn registration_email(&self) -> Result<Option<String>> {
        self.get(REGISTRATION_EMAIL_KEY)
    }

    fn clear_registration_email(&self) -> Result<()> {
        self.remove(REGISTRATION_EMAIL_KEY)
    }

    fn clear(&self) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .context("Failed to begin clear transaction")?;
        tx.execute("DELETE FROM session_kv", [])
            .context("Failed to clear session_kv")?;
        tx.commit().context("Failed to commit clear")?;
        tracing::debug!("Credential store cleared");
        Ok(())
    }
}
