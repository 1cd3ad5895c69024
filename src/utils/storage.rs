use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Where an uploaded file ended up on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub filename: String,
    pub file_path: String,
    pub size: i64,
}

/// Local-disk store for ticket attachments. Files get a server-assigned name
/// so user supplied names never reach the filesystem.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<StoredFile> {
        self.ensure_root().await?;

        let filename = server_filename(original_name);
        let path = self.root.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredFile {
            file_path: format!("uploads/{}", filename),
            filename,
            size: bytes.len() as i64,
        })
    }

    /// Removes a stored file by its server filename. Missing files are not an error.
    pub async fn remove(&self, filename: &str) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.root.join(filename)).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

fn server_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_safe_extensions() {
        assert!(server_filename("report.PDF").ends_with(".pdf"));
        assert!(!server_filename("noext").contains('.'));
        assert!(!server_filename("evil.p/hp").contains('/'));
        assert_eq!(server_filename("../../etc/passwd").len(), 36);
    }

    #[tokio::test]
    async fn store_and_remove() {
        let root = std::env::temp_dir().join(format!("helpdesk-storage-{}", Uuid::new_v4()));
        let storage = FileStorage::new(&root);

        let stored = storage.store("screenshot.png", b"png-bytes").await.unwrap();
        assert_eq!(stored.size, 9);
        assert_eq!(stored.file_path, format!("uploads/{}", stored.filename));
        assert!(root.join(&stored.filename).exists());

        storage.remove(&stored.filename).await.unwrap();
        assert!(!root.join(&stored.filename).exists());
        storage.remove(&stored.filename).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
