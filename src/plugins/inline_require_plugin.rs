// Inline Require Plugin: replaces build-time resource requires with their content

use crate::core::models::ModuleType;
use crate::core::plugin::{Plugin, PluginContext};
use crate::infrastructure::minify_html;
use crate::infrastructure::processors::module_lowering::js_string;
use crate::utils::{Logger, Result, StitchError};
use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};

static HTML_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(["']([^"']*?\.html)["']\)"#).unwrap());

static MODULE_NAME_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(["']([^"']+)["']\)\.name"#).unwrap());

static ICON_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(['"]\./icons/([^'"]*?)\.svg['"]\)"#).unwrap());

static VERSION_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(['"]root/version\.json['"]\)"#).unwrap());

// `module.exports = angular.module('name', ...)` and its variations
static REGISTERED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)module\.exports.*?=.*?angular.*?module\(['"]([^'"]*)['"]"#).unwrap()
});

/// Version metadata is not resolved; every build gets the same stub.
pub const VERSION_PLACEHOLDER: &str = r#"{"version": "n/a","created": 1461949989729}"#;

/// Companion artifact holding the registered module name for `resolved`
pub fn companion_path(resolved: &Path) -> PathBuf {
    let mut name = resolved.as_os_str().to_os_string();
    name.push(".js");
    PathBuf::from(name)
}

/// Registered module name declared in a companion file's content
pub fn extract_module_name(content: &str) -> Option<&str> {
    REGISTERED_NAME
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The four build-time substitutions applied to every script:
/// HTML templates, registered module names, icons and version metadata.
///
/// Each one is a textual rewrite of a `require(...)` call; text that does
/// not match a pattern is left alone.
pub struct InlineRequirePlugin {
    module_names: DashMap<PathBuf, String>,
}

impl InlineRequirePlugin {
    pub fn new() -> Self {
        Self {
            module_names: DashMap::new(),
        }
    }

    async fn inline_html(&self, code: &str, file_path: &Path, context: &PluginContext) -> Result<String> {
        let mut replacements = Vec::new();

        for (range, template) in captures(&HTML_REQUIRE, code) {
            let (alias_resolved, resolved_path) = context.aliases.resolve_request(&template, file_path);

            if !context.fs.file_exists(&resolved_path) {
                return Err(StitchError::UnresolvedTemplate {
                    template,
                    alias_resolved,
                    resolved_path,
                    importer: file_path.to_path_buf(),
                });
            }

            let html = context.fs.read_file(&resolved_path).await?;
            Logger::debug(&format!("Inlining template {}", resolved_path.display()));
            replacements.push((range, js_string(&minify_html(&html))));
        }

        Ok(splice(code, replacements))
    }

    async fn inline_module_names(&self, code: &str, file_path: &Path, context: &PluginContext) -> Result<String> {
        let mut replacements = Vec::new();

        for (range, request) in captures(&MODULE_NAME_REQUIRE, code) {
            let (_, resolved) = context.aliases.resolve_request(&request, file_path);
            let companion = companion_path(&resolved);

            let cached = self.module_names.get(&companion).map(|name| name.clone());
            let name = match cached {
                Some(name) => name,
                None => {
                    let content = context.fs.read_file(&companion).await?;
                    let name = extract_module_name(&content)
                        .ok_or_else(|| StitchError::ModuleNameNotFound {
                            request: request.clone(),
                            companion: companion.clone(),
                            importer: file_path.to_path_buf(),
                        })?
                        .to_string();
                    self.module_names.insert(companion, name.clone());
                    name
                }
            };

            replacements.push((range, format!("'{}'", name)));
        }

        Ok(splice(code, replacements))
    }

    fn inline_icons(&self, code: &str, file_path: &Path, context: &PluginContext) -> Result<String> {
        let mut replacements = Vec::new();

        for (range, name) in captures(&ICON_REQUIRE, code) {
            let file = context.icons.get(&name).ok_or_else(|| StitchError::IconNotFound {
                name: name.clone(),
                importer: file_path.to_path_buf(),
            })?;
            replacements.push((range, format!("require('./{}')", file)));
        }

        Ok(splice(code, replacements))
    }

    fn inline_version(&self, code: &str) -> String {
        VERSION_REQUIRE.replace_all(code, VERSION_PLACEHOLDER).into_owned()
    }
}

impl Default for InlineRequirePlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for InlineRequirePlugin {
    fn name(&self) -> &str {
        "inline-require-plugin"
    }

    fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        self.module_names.clear();
        if context.icons.is_empty() {
            Logger::debug("Icon index is empty; icon requires will fail");
        }
        Ok(())
    }

    async fn transform(
        &self,
        code: &str,
        file_path: &Path,
        context: &PluginContext,
    ) -> Result<Option<String>> {
        if !matches!(
            ModuleType::from_path(file_path),
            ModuleType::JavaScript | ModuleType::TypeScript
        ) {
            return Ok(None);
        }

        let code = self.inline_html(code, file_path, context).await?;
        let code = self.inline_module_names(&code, file_path, context).await?;
        let code = self.inline_icons(&code, file_path, context)?;
        let code = self.inline_version(&code);

        Ok(Some(code))
    }
}

/// Match ranges with their first capture group
fn captures(regex: &Regex, code: &str) -> Vec<(Range<usize>, String)> {
    regex
        .captures_iter(code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let group = caps.get(1)?;
            Some((whole.range(), group.as_str().to_string()))
        })
        .collect()
}

/// Replace non-overlapping, ascending ranges
fn splice(code: &str, replacements: Vec<(Range<usize>, String)>) -> String {
    if replacements.is_empty() {
        return code.to_string();
    }

    let mut output = String::with_capacity(code.len());
    let mut last = 0;
    for (range, replacement) in replacements {
        output.push_str(&code[last..range.start]);
        output.push_str(&replacement);
        last = range.end;
    }
    output.push_str(&code[last..]);
    output
}
