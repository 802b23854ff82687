use crate::core::interfaces::FileSystemService;
use crate::utils::{Logger, Result, StitchError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Icon logical name → asset file name, built once per build.
///
/// The logical name is the file name up to its first `.`, so
/// `spinner.3f2a.svg` is found as `spinner`.
#[derive(Debug, Clone, Default)]
pub struct IconIndex {
    icons: BTreeMap<String, String>,
}

impl IconIndex {
    pub fn from_file_names<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut icons = BTreeMap::new();

        for file_name in file_names {
            let file_name = file_name.as_ref();
            if !file_name.ends_with(".svg") {
                continue;
            }
            let logical = file_name.split('.').next().unwrap_or(file_name);
            icons.insert(logical.to_string(), file_name.to_string());
        }

        Self { icons }
    }

    /// Scan `dir` for `.svg` files. A missing directory yields an empty index.
    pub async fn scan(fs: &dyn FileSystemService, dir: &Path) -> Result<Self> {
        let files: Vec<PathBuf> = match fs.list_directory(dir).await {
            Ok(files) => files,
            Err(StitchError::Read { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Logger::debug(&format!("Icon directory {} does not exist", dir.display()));
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };
        let names = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string));

        let index = Self::from_file_names(names);
        Logger::icons_indexed(index.len(), &dir.display().to_string());
        Ok(index)
    }

    pub fn get(&self, logical_name: &str) -> Option<&str> {
        self.icons.get(logical_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::TokioFileSystemService;

    #[test]
    fn test_logical_name_is_basename_before_first_dot() {
        let index = IconIndex::from_file_names(["spinner.3f2a.svg", "close.svg", "notes.txt"]);

        assert_eq!(index.get("spinner"), Some("spinner.3f2a.svg"));
        assert_eq!(index.get("close"), Some("close.svg"));
        assert_eq!(index.get("notes"), None);
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("cloud.abc123.svg"), "<svg/>").unwrap();
        std::fs::write(temp_dir.path().join("lib.es.js"), "").unwrap();

        let index = IconIndex::scan(&TokioFileSystemService, temp_dir.path())
            .await
            .unwrap();

        assert_eq!(index.get("cloud"), Some("cloud.abc123.svg"));
        assert_eq!(index.len(), 1);
    }

    /// Serves a fixed listing for one directory
    struct ListingFs {
        dir: PathBuf,
        files: Vec<PathBuf>,
    }

    #[async_trait::async_trait]
    impl FileSystemService for ListingFs {
        async fn read_file(&self, path: &Path) -> Result<String> {
            Err(StitchError::read(path, std::io::ErrorKind::NotFound.into()))
        }

        async fn write_file(&self, _path: &Path, _content: &str) -> Result<()> {
            Ok(())
        }

        async fn create_directory(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
            if path == self.dir {
                Ok(self.files.clone())
            } else {
                Err(StitchError::read(path, std::io::ErrorKind::NotFound.into()))
            }
        }

        fn file_exists(&self, path: &Path) -> bool {
            self.files.iter().any(|f| f == path)
        }
    }

    #[tokio::test]
    async fn test_scan_goes_through_the_file_system_service() {
        let fs = ListingFs {
            dir: PathBuf::from("/virtual/icons"),
            files: vec![PathBuf::from("/virtual/icons/gear.77aa.svg")],
        };

        let index = IconIndex::scan(&fs, Path::new("/virtual/icons")).await.unwrap();
        assert_eq!(index.get("gear"), Some("gear.77aa.svg"));

        let missing = IconIndex::scan(&fs, Path::new("/virtual/other")).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_scan_missing_directory_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let index = IconIndex::scan(&TokioFileSystemService, &temp_dir.path().join("nope"))
            .await
            .unwrap();

        assert!(index.is_empty());
    }
}
