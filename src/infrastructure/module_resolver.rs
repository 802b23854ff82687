use crate::utils::path_aliases::normalize_path;
use std::path::{Path, PathBuf};

/// Looks up candidate files for a resolved request, trying the configured
/// extensions (`.ts`, `/index.ts`, ...) when the exact path is not a file.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    extensions: Vec<String>,
}

impl ModuleResolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    pub fn find_file(&self, base: &Path) -> Option<PathBuf> {
        let base = normalize_path(base);
        if base.is_file() {
            return Some(base);
        }

        let base_str = base.to_string_lossy();
        self.extensions
            .iter()
            .map(|ext| PathBuf::from(format!("{}{}", base_str, ext)))
            .find(|candidate| candidate.is_file())
    }

    /// Resolve a relative (`./`, `../`) or absolute request from `importer`.
    /// Bare specifiers are not handled here.
    pub fn resolve_relative(&self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        if is_bare_specifier(specifier) {
            return None;
        }

        let base = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier)
        } else {
            importer
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(specifier)
        };

        self.find_file(&base)
    }
}

pub fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::default_resolve_extensions;

    #[test]
    fn test_extensions_and_index_are_tried() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("src/widgets")).unwrap();
        std::fs::write(root.join("src/util.ts"), "").unwrap();
        std::fs::write(root.join("src/widgets/index.ts"), "").unwrap();
        std::fs::write(root.join("src/plain.js"), "").unwrap();

        let resolver = ModuleResolver::new(default_resolve_extensions());
        let importer = root.join("src/main.ts");

        assert_eq!(
            resolver.resolve_relative("./util", &importer),
            Some(root.join("src/util.ts"))
        );
        assert_eq!(
            resolver.resolve_relative("./widgets", &importer),
            Some(root.join("src/widgets/index.ts"))
        );
        assert_eq!(
            resolver.resolve_relative("./plain.js", &importer),
            Some(root.join("src/plain.js"))
        );
        assert_eq!(resolver.resolve_relative("./missing", &importer), None);
    }

    #[test]
    fn test_bare_specifiers() {
        assert!(is_bare_specifier("angular"));
        assert!(is_bare_specifier("core/widgets"));
        assert!(!is_bare_specifier("./x"));
        assert!(!is_bare_specifier("../x"));
        assert!(!is_bare_specifier("/abs/x"));

        let resolver = ModuleResolver::new(default_resolve_extensions());
        assert_eq!(resolver.resolve_relative("angular", Path::new("/a/b.ts")), None);
    }
}
