//! Credential persistence as plain files in a directory.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::CredentialStore,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Stores each record as `<dir>/<key>`.
///
/// Writes go to a sibling temporary file which is flushed to disk and then
/// renamed over the target, so a reader sees either the old or the new
/// record, even after a crash.
/// Keys must be plain file names.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.ends_with(".tmp");
        if !valid {
            return Err(BridgeError::StorageError(format!(
                "Invalid credential key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        let tmp = self.dir.join(format!("{}.tmp", key));
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(value).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;
        // Persist the rename itself.
        #[cfg(unix)]
        fs::File::open(&self.dir).await?.sync_all().await?;

        debug!(key, path = %path.display(), "Stored credential record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "Credential record not found");
                Ok(None)
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        store
            .put("creds_account1.json", br#"{"access_token":"a"}"#)
            .await
            .unwrap();

        let value = store.get("creds_account1.json").await.unwrap();
        assert_eq!(value.as_deref(), Some(&br#"{"access_token":"a"}"#[..]));
    }

    #[tokio::test]
    async fn test_put_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        store.put("k.json", b"old").await.unwrap();
        store.put("k.json", b"new").await.unwrap();

        assert_eq!(store.get("k.json").await.unwrap(), Some(b"new".to_vec()));
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_key_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("not-created-yet"));

        assert_eq!(store.get("creds_account2.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        for key in ["", "..", "../escape.json", "a/b.json", "x.tmp"] {
            let result = store.put(key, b"v").await;
            assert!(
                matches!(result, Err(BridgeError::StorageError(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
