use crate::core::models::*;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File system operations interface
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<String>;
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
    async fn create_directory(&self, path: &Path) -> Result<()>;
    /// Regular files directly inside `path`, sorted
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn file_exists(&self, path: &Path) -> bool;
}

/// Stylesheet processing interface
#[async_trait]
pub trait CssProcessor: Send + Sync {
    async fn process_css(&self, content: &str, path: &Path) -> Result<String>;
    fn supports(&self, path: &Path) -> bool;
}

/// Build service interface
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn build(&self, config: &BuildConfig) -> Result<BuildResult>;
}
