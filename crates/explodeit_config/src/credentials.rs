//! API key handle and on-disk credential store.

use explodeit_error::{StorageError, StorageErrorKind};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument};

/// Environment variable consulted when no key has been saved.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Shared, updatable API key.
///
/// Clones share the same slot, so a key saved through one clone is seen by
/// every backend holding another.
///
/// # Examples
///
/// ```
/// use explodeit_config::ApiKeyHandle;
///
/// let handle = ApiKeyHandle::default();
/// let backend_view = handle.clone();
/// assert!(backend_view.get().is_none());
///
/// handle.set("abc123");
/// assert_eq!(backend_view.get().as_deref(), Some("abc123"));
///
/// handle.clear();
/// assert!(!backend_view.is_set());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ApiKeyHandle(Arc<RwLock<Option<String>>>);

impl ApiKeyHandle {
    /// Handle holding `key`, or nothing if it is empty.
    pub fn new(key: Option<String>) -> Self {
        let handle = Self::default();
        if let Some(key) = key {
            handle.set(key);
        }
        handle
    }

    /// Current key, if one is set.
    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a key is set.
    pub fn is_set(&self) -> bool {
        self.0.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Replace the key. Blank input clears it.
    pub fn set(&self, key: impl Into<String>) {
        let key = key.into().trim().to_string();
        *self.0.write().unwrap_or_else(PoisonError::into_inner) =
            if key.is_empty() { None } else { Some(key) };
    }

    /// Forget the key.
    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn write_all(mut file: std::fs::File, contents: &str) -> std::io::Result<()> {
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Single-string credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.config/explodeit/credentials`.
    #[track_caller]
    pub fn in_home_dir() -> Result<Self, StorageError> {
        dirs::home_dir()
            .map(|home| Self::new(home.join(".config/explodeit/credentials")))
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::InvalidPath(
                    "home directory not found".to_string(),
                ))
            })
    }

    /// Location of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved key, or `None` when nothing has been saved.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let key = contents.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.path.display(),
                e
            )))),
        }
    }

    /// Persist `key`, creating the parent directory if needed.
    #[instrument(skip(self, key), fields(path = %self.path.display()))]
    pub fn save(&self, key: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        Self::write_private(&self.path, key.trim()).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        })?;
        debug!("Saved API key");
        Ok(())
    }

    /// Write `contents` readable by the owner only. A file left by an
    /// earlier save is narrowed as well.
    fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            let file = options.open(path)?;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
            write_all(file, contents)
        }
        #[cfg(not(unix))]
        {
            write_all(options.open(path)?, contents)
        }
    }

    /// Delete the saved key. Succeeds if nothing was saved.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRemove(format!(
                "{}: {}",
                self.path.display(),
                e
            )))),
        }
    }

    /// Saved key, falling back to the `GEMINI_API_KEY` environment variable.
    pub fn resolve(&self) -> Result<Option<String>, StorageError> {
        Ok(Self::prefer(self.load()?, std::env::var(API_KEY_ENV).ok()))
    }

    fn prefer(stored: Option<String>, env: Option<String>) -> Option<String> {
        stored.or_else(|| env.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_key_wins_over_environment() {
        assert_eq!(
            CredentialStore::prefer(Some("stored".into()), Some("env".into())),
            Some("stored".to_string())
        );
        assert_eq!(
            CredentialStore::prefer(None, Some(" env ".into())),
            Some("env".to_string())
        );
        assert_eq!(CredentialStore::prefer(None, Some("   ".into())), None);
    }

    #[test]
    fn blank_key_clears_handle() {
        let handle = ApiKeyHandle::new(Some("k".into()));
        handle.set("  ");
        assert!(!handle.is_set());
    }
}
