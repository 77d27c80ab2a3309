//! Attachment files on local disk.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub async fn initialize(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.base_path).await
    }

    /// Write `data` under a fresh unique name, keeping the original extension.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        let file_name = match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(extension) => format!("{}.{}", Uuid::new_v4(), extension.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.base_path.join(file_name);

        fs::create_dir_all(&self.base_path).await?;
        fs::write(&path, data).await?;
        debug!("Stored attachment at {:?}", path);
        Ok(path)
    }

    /// `None` when the file is gone.
    pub async fn read(&self, path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove a file. A file that is already gone counts as removed.
    pub async fn delete(&self, path: &Path) -> std::io::Result<()> {
        trace!("Deleting attachment {:?}", path);
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Attachment {:?} was already missing", path);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
