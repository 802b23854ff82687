use crate::utils::Logger;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Logical path prefix → physical path prefix table, loaded once per build.
///
/// Keys are matched as plain string prefixes, the way the source tree writes
/// them (`core/`, `root`, `@spinnaker/core`). When several keys match, the
/// longest one wins so the outcome never depends on map iteration order.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
    root: PathBuf,
}

impl AliasTable {
    pub fn new(aliases: HashMap<String, String>, root: PathBuf) -> Self {
        let mut entries: Vec<(String, String)> = aliases.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Logger::debug(&format!("🔗 Initialized AliasTable with {} aliases", entries.len()));
        for (alias, target) in &entries {
            Logger::debug(&format!("  {} → {}", alias, target));
        }

        Self { entries, root }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First (longest) alias key that `requested` starts with.
    pub fn matching_alias(&self, requested: &str) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .find(|(alias, _)| requested.starts_with(alias.as_str()))
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }

    /// Replace a leading alias key with its physical prefix.
    /// Inputs that start with no alias key come back unchanged.
    pub fn resolve_aliases(&self, requested: &str) -> String {
        match self.matching_alias(requested) {
            Some((alias, target)) => format!("{}{}", target, &requested[alias.len()..]),
            None => requested.to_string(),
        }
    }

    /// Turn an alias-resolved request into a file system path.
    ///
    /// A request without a directory, or whose directory starts with `.`, is
    /// resolved against the requesting file's directory. Anything else is
    /// already rooted: absolute paths are kept, relative ones hang off the
    /// project root.
    pub fn resolve_path(&self, alias_resolved: &str, importer: &Path) -> PathBuf {
        let (dir, base) = match alias_resolved.rfind('/') {
            Some(idx) => (&alias_resolved[..idx], &alias_resolved[idx + 1..]),
            None => ("", alias_resolved),
        };

        let resolved = if dir.is_empty() || dir.starts_with('.') {
            let importer_dir = importer.parent().unwrap_or_else(|| Path::new(""));
            self.absolutize(importer_dir).join(dir).join(base)
        } else {
            self.absolutize(Path::new(alias_resolved))
        };

        normalize_path(&resolved)
    }

    /// Both resolution stages in one go, returning the intermediate as well.
    pub fn resolve_request(&self, requested: &str, importer: &Path) -> (String, PathBuf) {
        let alias_resolved = self.resolve_aliases(requested);
        let path = self.resolve_path(&alias_resolved, importer);
        (alias_resolved, path)
    }

    fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Lexically normalise `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}
