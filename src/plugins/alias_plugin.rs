// Alias Plugin: resolves import specifiers through the alias table

use crate::core::plugin::{Plugin, PluginContext};
use crate::infrastructure::ModuleResolver;
use crate::utils::{Logger, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Alias-resolves a specifier, turns it into a path (relative to the
/// importer or rooted at the project), then tries the configured
/// extensions.
pub struct AliasPlugin;

#[async_trait]
impl Plugin for AliasPlugin {
    fn name(&self) -> &str {
        "alias-plugin"
    }

    fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        Logger::aliases_loaded(context.aliases.len());
        Ok(())
    }

    async fn resolve(
        &self,
        import: &str,
        importer: &Path,
        context: &PluginContext,
    ) -> Result<Option<PathBuf>> {
        let (alias_resolved, path) = context.aliases.resolve_request(import, importer);
        let resolver = ModuleResolver::new(context.config.resolve_extensions.clone());

        let resolved = resolver.find_file(&path);
        if let Some(ref found) = resolved {
            if alias_resolved != import {
                Logger::debug(&format!("🔗 {} → {} → {}", import, alias_resolved, found.display()));
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plugin::tests::test_context;

    #[tokio::test]
    async fn test_resolves_aliases_and_relative_requests() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let core = root.join("app/scripts/modules/core");
        std::fs::create_dir_all(core.join("widgets")).unwrap();
        std::fs::write(core.join("widgets/button.ts"), "").unwrap();
        std::fs::write(core.join("index.ts"), "").unwrap();

        let context = test_context(root, &[("core/", "app/scripts/modules/core/")]);
        let importer = root.join("app/scripts/modules/pipelines/foo.ts");

        assert_eq!(
            AliasPlugin.resolve("core/widgets/button", &importer, &context).await.unwrap(),
            Some(core.join("widgets/button.ts"))
        );
        assert_eq!(
            AliasPlugin.resolve("../core", &importer, &context).await.unwrap(),
            Some(core.join("index.ts"))
        );
        assert_eq!(
            AliasPlugin.resolve("angular", &importer, &context).await.unwrap(),
            None
        );
    }
}
