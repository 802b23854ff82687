// Registration Plugin: validates angular module registrations after inlining

use crate::core::models::ModuleType;
use crate::core::plugin::{Plugin, PluginContext};
use crate::infrastructure::processors::module_lowering::{matching_close, top_level_positions};
use crate::utils::{Result, StitchError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static REGISTRATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"angular\s*\.\s*module\(\s*['"]([^'"]+)['"]\s*,\s*\["#).unwrap()
});

const FALSEY_LITERALS: &[&str] = &["undefined", "null", "false", "0", "NaN", "void 0", "''", "\"\""];

/// Fails the build when a module is registered with a dependency that is
/// falsey, which is what a failed `require(...).name` substitution or a
/// missing export turns into.
pub struct RegistrationPlugin;

/// Check every `angular.module('<name>', [ ... ])` registration in `code`.
pub fn check_registrations(code: &str) -> Result<()> {
    for caps in REGISTRATION.captures_iter(code) {
        let Some(whole) = caps.get(0) else { continue };
        let open = whole.end() - 1;
        let Some(close) = matching_close(&code[open..]) else {
            continue;
        };
        let list = &code[open + 1..open + close];

        let mut dependencies: Vec<&str> = Vec::new();
        let mut start = 0;
        for position in top_level_positions(list, ',') {
            dependencies.push(list[start..position].trim());
            start = position + 1;
        }
        dependencies.push(list[start..].trim());

        // a trailing comma leaves one empty entry behind, which is fine
        let checked = match dependencies.split_last() {
            Some((last, rest)) if last.is_empty() => rest,
            _ => &dependencies[..],
        };

        if checked.iter().any(|d| is_falsey(d)) {
            return Err(StitchError::FalseyDependency {
                module: caps[1].to_string(),
                dependencies: dependencies.join(", "),
            });
        }
    }
    Ok(())
}

fn is_falsey(dependency: &str) -> bool {
    dependency.is_empty() || FALSEY_LITERALS.contains(&dependency)
}

#[async_trait]
impl Plugin for RegistrationPlugin {
    fn name(&self) -> &str {
        "registration-plugin"
    }

    async fn transform(
        &self,
        code: &str,
        file_path: &Path,
        _context: &PluginContext,
    ) -> Result<Option<String>> {
        if matches!(
            ModuleType::from_path(file_path),
            ModuleType::JavaScript | ModuleType::TypeScript
        ) {
            check_registrations(code)?;
        }
        Ok(None)
    }
}
