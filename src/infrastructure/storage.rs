//! Disk-backed blob storage for profile images
//!
//! Layout under the storage root:
//! - `originals/<uuid>.<ext>`: uploaded files, named by their storage key
//! - `variants/<sha256(key)>_<w>x<h>.<ext>`: resized copies

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn originals(&self) -> PathBuf {
        self.root.join("originals")
    }

    fn variants(&self) -> PathBuf {
        self.root.join("variants")
    }

    /// Keys are generated here, but they round-trip through the database,
    /// so never let one escape the storage root.
    fn check_key(key: &str) -> Result<(), DomainError> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(DomainError::Storage(format!("invalid storage key: {}", key)));
        }
        Ok(())
    }

    fn variant_prefix(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn variant_path(&self, key: &str, width: u32, height: u32) -> PathBuf {
        let extension = extension_of(key);
        self.variants().join(format!(
            "{}_{}x{}.{}",
            Self::variant_prefix(key),
            width,
            height,
            extension
        ))
    }

    /// Store a new blob and return its key
    pub async fn put(&self, bytes: &[u8], extension: &str) -> Result<String, DomainError> {
        let key = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        fs::create_dir_all(self.originals()).await?;
        fs::write(self.originals().join(&key), bytes).await?;
        tracing::debug!("Stored blob {} ({} bytes)", key, bytes.len());
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        Self::check_key(key)?;
        match fs::read(self.originals().join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DomainError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a blob and every cached variant of it. Missing files are ignored.
    pub async fn delete(&self, key: &str) -> Result<(), DomainError> {
        Self::check_key(key)?;
        remove_if_exists(&self.originals().join(key)).await?;

        let prefix = format!("{}_", Self::variant_prefix(key));
        let mut entries = match fs::read_dir(self.variants()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                remove_if_exists(&entry.path()).await?;
            }
        }
        Ok(())
    }

    pub async fn read_variant(
        &self,
        key: &str,
        width: u32,
        height: u32,
    ) -> Result<Option<Vec<u8>>, DomainError> {
        Self::check_key(key)?;
        match fs::read(self.variant_path(key, width, height)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename, so concurrent readers never
    /// observe a partial variant.
    pub async fn write_variant(
        &self,
        key: &str,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<(), DomainError> {
        Self::check_key(key)?;
        fs::create_dir_all(self.variants()).await?;
        let path = self.variant_path(key, width, height);
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), DomainError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub fn extension_of(key: &str) -> &str {
    key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin")
}

pub fn content_type_of(key: &str) -> &'static str {
    match extension_of(key) {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> DiskStorage {
        DiskStorage::new(std::env::temp_dir().join(format!("bookers-test-{}", uuid::Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = temp_storage();
        let key = storage.put(b"not really a png", "png").await.unwrap();
        assert!(key.ends_with(".png"));
        assert_eq!(storage.get(&key).await.unwrap(), b"not really a png");

        storage.write_variant(&key, 10, 10, b"small").await.unwrap();
        assert_eq!(
            storage.read_variant(&key, 10, 10).await.unwrap(),
            Some(b"small".to_vec())
        );
        assert_eq!(storage.read_variant(&key, 20, 20).await.unwrap(), None);

        storage.delete(&key).await.unwrap();
        assert!(matches!(storage.get(&key).await, Err(DomainError::NotFound)));
        assert_eq!(storage.read_variant(&key, 10, 10).await.unwrap(), None);

        // Deleting twice is fine
        storage.delete(&key).await.unwrap();
        let _ = fs::remove_dir_all(storage.root()).await;
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let storage = temp_storage();
        assert!(matches!(
            storage.get("../secrets.png").await,
            Err(DomainError::Storage(_))
        ));
        assert!(matches!(
            storage.get("a/b.png").await,
            Err(DomainError::Storage(_))
        ));
    }

    #[test]
    fn test_content_type_of() {
        assert_eq!(content_type_of("abc.png"), "image/png");
        assert_eq!(content_type_of("abc.jpg"), "image/jpeg");
        assert_eq!(content_type_of("abc"), "application/octet-stream");
    }
}
