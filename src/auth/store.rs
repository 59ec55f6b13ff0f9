//! Single-file credential persistence.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::credential::Credential;
use super::error::AuthError;

/// Storage abstraction for the single persisted credential.
pub trait CredentialStore: Send + Sync {
    /// Any failure to read or parse is reported as `None`.
    fn load(&self) -> Option<Credential>;
    fn save(&self, credential: &Credential) -> Result<(), AuthError>;
    /// Removing a credential that does not exist is not an error.
    fn delete(&self) -> Result<(), AuthError>;
}

/// File-backed credential store writing one JSON object.
///
/// # Example
/// ```no_run
/// use tokenkeeper::auth::{Credential, CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// let credential = Credential {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     token_type: "Bearer".to_string(),
///     resource_url: None,
///     expiry_date: 1_700_000_000_000,
/// };
/// store.save(&credential)?;
/// # Ok::<(), tokenkeeper::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(crate::config::default_credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    AuthError::Io(format!(
                        "cannot create credential directory {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credential> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Unreadable credential file"
                );
                return None;
            }
        };
        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Malformed credential file"
                );
                return None;
            }
        };
        if value.as_object().is_some_and(|obj| obj.is_empty()) {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(credential) => Some(credential),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Incomplete credential file"
                );
                None
            }
        }
    }

    fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        Self::ensure_parent(&self.path)?;
        let serialized = serde_json::to_string_pretty(credential)?;
        let tmp = self.temp_path();
        let written =
            write_private(&tmp, serialized.as_bytes()).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        tracing::debug!(path = %self.path.display(), "Saved credential");
        Ok(())
    }

    fn delete(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Write `contents` to a file only the owner can read, even while it is
/// being written.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover file keeps its old bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileCredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("oauth_creds.json"));
        (dir, store)
    }

    fn credential() -> Credential {
        Credential {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: "Bearer".to_string(),
            resource_url: Some("portal.example.com".to_string()),
            expiry_date: 1_700_000_000_000,
        }
    }

    #[test]
    fn credential_round_trip_works() {
        let (_dir, store) = temp_store();
        store.save(&credential()).unwrap();
        assert_eq!(store.load(), Some(credential()));
    }

    #[test]
    fn save_replaces_previous_content() {
        let (_dir, store) = temp_store();
        store.save(&credential()).unwrap();
        let replacement = Credential {
            access_token: "second".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            resource_url: None,
            expiry_date: 42,
        };
        store.save(&replacement).unwrap();
        assert_eq!(store.load(), Some(replacement));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn missing_file_loads_as_absent() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn empty_object_loads_as_absent() {
        let (_dir, store) = temp_store();
        FileCredentialStore::ensure_parent(store.path()).unwrap();
        fs::write(store.path(), "{}").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn malformed_content_loads_as_absent() {
        let (_dir, store) = temp_store();
        FileCredentialStore::ensure_parent(store.path()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), None);
        fs::write(store.path(), r#"{"refresh_token":"only"}"#).unwrap();
        assert_eq!(store.load(), None);
        fs::write(store.path(), [0xff, 0xfe, 0x00]).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn delete_removes_credential_and_is_idempotent() {
        let (_dir, store) = temp_store();
        store.save(&credential()).unwrap();
        store.delete().unwrap();
        assert_eq!(store.load(), None);
        store.delete().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.save(&credential()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn leftover_temp_file_is_tightened_before_writing() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        FileCredentialStore::ensure_parent(store.path()).unwrap();
        fs::write(store.temp_path(), "stale").unwrap();
        fs::set_permissions(store.temp_path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&credential()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!store.temp_path().exists());
        assert_eq!(store.load(), Some(credential()));
    }

    #[test]
    fn failed_save_removes_temp_file() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().join("occupied")).unwrap();

        let result = store.save(&credential());

        assert!(matches!(result, Err(AuthError::Io(_))));
        assert!(!store.temp_path().exists());
        assert!(store.path().is_dir());
    }

    #[test]
    fn save_fails_when_directory_cannot_be_created() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let store = FileCredentialStore::new(blocker.join("oauth_creds.json"));
        let result = store.save(&credential());
        assert!(matches!(result, Err(AuthError::Io(_))));
    }
}
