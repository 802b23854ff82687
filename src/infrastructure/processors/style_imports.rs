use crate::core::interfaces::FileSystemService;
use crate::utils::path_aliases::normalize_path;
use crate::utils::{AliasTable, Logger, Result, StitchError};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

// `@import "~x"`, `@import (reference) '~x'`
static TILDE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(@import\s+(?:\([^)]*\)\s*)?)(['"])~([^'"]+)(['"])"#).unwrap()
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+(?:\(([^)]*)\)\s*)?['"]([^'"]+)['"]([^;\n]*);?"#).unwrap()
});

const STYLE_EXTENSIONS: &[&str] = &[".less", ".css", ".scss", ".sass"];

/// Rewrites `~`-prefixed stylesheet imports against the alias table, or
/// against the third-party dependency root when no alias key matches.
#[derive(Debug, Clone)]
pub struct StyleImportRewriter {
    aliases: Arc<AliasTable>,
    node_modules_path: PathBuf,
}

impl StyleImportRewriter {
    pub fn new(aliases: Arc<AliasTable>, node_modules_path: PathBuf) -> Self {
        Self {
            aliases,
            node_modules_path,
        }
    }

    pub fn rewrite(&self, source: &str) -> String {
        TILDE_IMPORT
            .replace_all(source, |caps: &Captures| {
                let target = &caps[3];
                let rewritten = match self.aliases.matching_alias(target) {
                    Some((alias, physical)) => format!("{}{}", physical, &target[alias.len()..]),
                    None => format!(
                        "{}/{}",
                        self.node_modules_path.to_string_lossy().trim_end_matches('/'),
                        target
                    ),
                };
                format!("{}{}{}{}", &caps[1], &caps[2], rewritten, &caps[4])
            })
            .into_owned()
    }
}

struct ImportStatement {
    start: usize,
    end: usize,
    target: String,
    reference: bool,
    /// Media query after the target, e.g. `print`
    media: Option<String>,
}

/// Loads a stylesheet and every stylesheet it imports, applying the `~`
/// rewrite to each file before its imports are followed.
///
/// Each file is inlined at most once per load, so repeated and circular
/// imports collapse. Remote and `url(...)` imports are left to the browser.
pub struct StyleLoader {
    fs: Arc<dyn FileSystemService>,
    rewriter: StyleImportRewriter,
    root: PathBuf,
}

impl StyleLoader {
    pub fn new(fs: Arc<dyn FileSystemService>, rewriter: StyleImportRewriter, root: PathBuf) -> Self {
        Self { fs, rewriter, root }
    }

    pub fn rewriter(&self) -> &StyleImportRewriter {
        &self.rewriter
    }

    /// `source` is the already-read content of `path`.
    pub async fn load(&self, source: &str, path: &Path) -> Result<String> {
        let mut seen = HashSet::new();
        seen.insert(normalize_path(path));
        self.inline_imports(source.to_string(), path.to_path_buf(), &mut seen)
            .await
    }

    fn inline_imports<'a>(
        &'a self,
        source: String,
        path: PathBuf,
        seen: &'a mut HashSet<PathBuf>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let rewritten = self.rewriter.rewrite(&source);
            let imports = collect_imports(&rewritten);

            let mut output = String::with_capacity(rewritten.len());
            let mut last = 0;

            for import in imports {
                output.push_str(&rewritten[last..import.start]);
                last = import.end;

                if is_remote(&import.target) || import.media.as_deref().is_some_and(is_layered) {
                    output.push_str(&rewritten[import.start..import.end]);
                    continue;
                }

                let resolved = self.resolve_import(&import.target, &path).ok_or_else(|| {
                    StitchError::StyleImportNotFound {
                        import: import.target.clone(),
                        importer: path.clone(),
                    }
                })?;

                if !seen.insert(resolved.clone()) {
                    Logger::debug(&format!("Skipping repeated import {}", resolved.display()));
                    continue;
                }
                // reference imports only contribute mixins, which are not evaluated
                if import.reference {
                    continue;
                }

                let content = self.fs.read_file(&resolved).await?;
                let inlined = self.inline_imports(content, resolved, &mut *seen).await?;
                match import.media {
                    Some(ref media) => {
                        output.push_str(&format!("@media {} {{\n{}\n}}", media, inlined.trim_end()))
                    }
                    None => output.push_str(&inlined),
                }
            }

            output.push_str(&rewritten[last..]);
            Ok(output)
        })
    }

    fn resolve_import(&self, target: &str, importer: &Path) -> Option<PathBuf> {
        let bases = if Path::new(target).is_absolute() {
            vec![PathBuf::from(target)]
        } else {
            let importer_dir = importer.parent().unwrap_or_else(|| Path::new(""));
            vec![importer_dir.join(target), self.root.join(target)]
        };

        bases.iter().find_map(|base| self.find_file(base))
    }

    fn find_file(&self, base: &Path) -> Option<PathBuf> {
        let base = normalize_path(base);
        if base.extension().is_some() && self.fs.file_exists(&base) {
            return Some(base);
        }

        let base_str = base.to_string_lossy();
        STYLE_EXTENSIONS
            .iter()
            .map(|ext| PathBuf::from(format!("{}{}", base_str, ext)))
            .find(|candidate| self.fs.file_exists(candidate))
    }
}

fn collect_imports(source: &str) -> Vec<ImportStatement> {
    IMPORT
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let options = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            Some(ImportStatement {
                start: whole.start(),
                end: whole.end(),
                target: caps.get(2)?.as_str().to_string(),
                reference: options.split(',').any(|o| o.trim() == "reference"),
                media: caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|m| !m.is_empty()),
            })
        })
        .collect()
}

// Cascade layers and feature queries cannot be expressed by wrapping
fn is_layered(condition: &str) -> bool {
    condition.starts_with("layer") || condition.starts_with("supports(")
}

fn is_remote(target: &str) -> bool {
    target.contains("://") || target.starts_with("//")
}
