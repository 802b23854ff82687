use crate::core::interfaces::FileSystemService;
use crate::utils::{Result, StitchError};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct TokioFileSystemService;

#[async_trait::async_trait]
impl FileSystemService for TokioFileSystemService {
    async fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .map_err(|e| StitchError::read(path, e))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_directory(parent).await?;
        }

        fs::write(path, content).await.map_err(StitchError::Io)
    }

    async fn create_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(StitchError::Io)
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path).await.map_err(|e| StitchError::read(path, e))?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(StitchError::Io)? {
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }

        // read_dir order is platform dependent
        files.sort();
        Ok(files)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
