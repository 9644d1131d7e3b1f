//! Credential storage, the client's counterpart to browser local storage.
//!
//! DESIGN
//! ======
//! A synchronous string key/value store under fixed keys. Synchronous
//! access keeps token reads out of the async refresh critical section.
//! `FileStore` persists a flat JSON object so CLI sessions survive between
//! invocations; `MemoryStore` backs tests and embedded use.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ApiError;
use crate::types::User;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Key/value credential store.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), ApiError>;
}

impl dyn TokenStore {
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Stored user snapshot; a corrupt entry reads as absent.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.get(USER_KEY).and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Storage` if either token cannot be written.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> Result<(), ApiError> {
        self.set(ACCESS_TOKEN_KEY, access)?;
        if let Some(refresh) = refresh {
            self.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the user cannot be written.
    pub fn set_user(&self, user: &User) -> Result<(), ApiError> {
        let raw = serde_json::to_string(user).map_err(|e| ApiError::Storage(e.to_string()))?;
        self.set(USER_KEY, &raw)
    }

    /// Remove every credential key. Attempts all removals before reporting
    /// the first failure.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if any key could not be removed.
    pub fn clear_session(&self) -> Result<(), ApiError> {
        let results = [
            self.remove(ACCESS_TOKEN_KEY),
            self.remove(REFRESH_TOKEN_KEY),
            self.remove(USER_KEY),
        ];
        results.into_iter().collect()
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file store. The directory is created 0700 and the file written 0600
/// on unix.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), ApiError> {
        if entries.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)
                    .map_err(|e| ApiError::Storage(format!("remove {}: {e}", self.path.display())))?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("mkdir {}: {e}", parent.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| ApiError::Storage(format!("write {}: {e}", self.path.display())))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| ApiError::Storage(format!("chmod {}: {e}", self.path.display())))?;
        }
        Ok(())
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.read_all();
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.read_all();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
