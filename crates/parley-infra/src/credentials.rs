//! JSON-file credential store for the chat client.
//!
//! Holds the token and user record from the last login in
//! `{data_dir}/credentials.json`. On Unix the file is written with mode 0600.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parley_core::client::context::{CredentialStore, StoredCredentials};
use parley_types::error::CredentialError;

use crate::filesystem::credentials_path;

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside `data_dir`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(credentials_path(data_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<StoredCredentials, CredentialError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoredCredentials::default()),
            Err(e) => return Err(CredentialError::Storage(e.to_string())),
        };
        if content.trim().is_empty() {
            return Ok(StoredCredentials::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            CredentialError::Malformed(format!("{}: {e}", self.path.display()))
        })
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CredentialError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(credentials)
            .map_err(|e| CredentialError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| CredentialError::Storage(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| CredentialError::Storage(e.to_string()))?;
        }

        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialError::Storage(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use parley_core::client::context::SessionContext;
    use parley_types::user::UserRecord;

    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_data_dir(tmp.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_load_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_data_dir(&tmp.path().join("nested"));
        let creds = StoredCredentials {
            token: Some("a.b.c".to_string()),
            user: Some(UserRecord {
                id: "u42".to_string(),
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
            }),
            user_id: None,
        };

        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), creds);
        assert_eq!(SessionContext::from_store(&store).unwrap().user_id, "u42");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_data_dir(tmp.path());
        store
            .save(&StoredCredentials {
                token: None,
                user: None,
                user_id: Some("u1".to_string()),
            })
            .unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"userId\""));
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_data_dir(tmp.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(CredentialError::Malformed(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_data_dir(tmp.path());
        store.save(&StoredCredentials::default()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
