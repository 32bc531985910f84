//! Filesystem object store: one directory per bucket under a root directory,
//! keys map to relative file paths (`/` in a key creates subdirectories).

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use kippo_core::{KippoError, ObjectStore};
use tokio::fs;
use tracing::{debug, info};

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, KippoError> {
        validate_segment("bucket", bucket)?;
        if bucket.contains('/') {
            return Err(KippoError::Storage(format!("invalid bucket name: {bucket}")));
        }
        Ok(self.root.join(bucket))
    }

    async fn existing_bucket(&self, bucket: &str) -> Result<PathBuf, KippoError> {
        let dir = self.bucket_dir(bucket)?;
        if !fs::try_exists(&dir).await? {
            return Err(KippoError::BucketNotFound(bucket.to_string()));
        }
        Ok(dir)
    }

    async fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, KippoError> {
        validate_segment("key", key)?;
        Ok(self.existing_bucket(bucket).await?.join(key))
    }
}

/// Reject empty names and anything that would escape the bucket directory.
fn validate_segment(kind: &str, value: &str) -> Result<(), KippoError> {
    let path = Path::new(value);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if value.is_empty() || escapes {
        return Err(KippoError::Storage(format!("invalid {kind}: `{value}`")));
    }
    Ok(())
}

fn not_found(bucket: &str, key: &str) -> impl FnOnce(std::io::Error) -> KippoError {
    let bucket = bucket.to_string();
    let key = key.to_string();
    move |err| {
        if err.kind() == ErrorKind::NotFound {
            KippoError::NotFound { bucket, key }
        } else {
            KippoError::Io(err)
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn create_bucket(&self, bucket: &str) -> Result<bool, KippoError> {
        let dir = self.bucket_dir(bucket)?;
        if fs::try_exists(&dir).await? {
            debug!(bucket, "Bucket already exists");
            return Ok(false);
        }
        fs::create_dir_all(&dir).await?;
        info!(bucket, path = ?dir, "Created bucket");
        Ok(true)
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), KippoError> {
        let path = self.object_path(bucket, key).await?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        fs::write(&path, bytes).await?;
        debug!(bucket, key, size, "Stored object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, KippoError> {
        let path = self.object_path(bucket, key).await?;
        fs::read(&path).await.map_err(not_found(bucket, key))
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, KippoError> {
        let path = self.object_path(bucket, key).await?;
        Ok(fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, KippoError> {
        let dir = self.existing_bucket(bucket).await?;
        let mut keys = Vec::new();
        let mut pending = vec![dir.clone()];
        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), KippoError> {
        let path = self.object_path(bucket, key).await?;
        fs::remove_file(&path).await.map_err(not_found(bucket, key))?;
        debug!(bucket, key, "Deleted object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_bucket_reports_existing() {
        let (_dir, store) = store();
        assert!(store.create_bucket("dumps").await.unwrap());
        assert!(!store.create_bucket("dumps").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_get_exists_delete() {
        let (_dir, store) = store();
        store.create_bucket("dumps").await.unwrap();
        store
            .put("dumps", "kippo/all_1.json", b"{}".to_vec())
            .await
            .unwrap();

        assert!(store.exists("dumps", "kippo/all_1.json").await.unwrap());
        assert_eq!(store.get("dumps", "kippo/all_1.json").await.unwrap(), b"{}");

        store.delete("dumps", "kippo/all_1.json").await.unwrap();
        assert!(!store.exists("dumps", "kippo/all_1.json").await.unwrap());
        let err = store.get("dumps", "kippo/all_1.json").await.unwrap_err();
        assert!(matches!(err, KippoError::NotFound { ref key, .. } if key == "kippo/all_1.json"));
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let (_dir, store) = store();
        let err = store.put("nope", "a.json", Vec::new()).await.unwrap_err();
        assert!(matches!(err, KippoError::BucketNotFound(ref b) if b == "nope"));
    }

    #[tokio::test]
    async fn test_list_by_prefix_sorted() {
        let (_dir, store) = store();
        store.create_bucket("dumps").await.unwrap();
        for key in ["kippo/all_2.json", "other/x.json", "kippo/all_1.json"] {
            store.put("dumps", key, Vec::new()).await.unwrap();
        }
        assert_eq!(
            store.list("dumps", "kippo/").await.unwrap(),
            vec!["kippo/all_1.json".to_string(), "kippo/all_2.json".to_string()]
        );
        assert_eq!(store.list("dumps", "").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let (_dir, store) = store();
        store.create_bucket("dumps").await.unwrap();
        assert!(store.put("dumps", "../escape", Vec::new()).await.is_err());
        assert!(store.put("dumps", "/abs", Vec::new()).await.is_err());
        assert!(store.create_bucket("..").await.is_err());
        assert!(store.create_bucket("").await.is_err());
    }
}
