// TypeScript Plugin: strips types before the inline substitutions run

use crate::core::models::ModuleType;
use crate::core::plugin::{Plugin, PluginContext};
use crate::infrastructure::OxcTypeScriptTranspiler;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::Path;

pub struct TypeScriptPlugin {
    transpiler: OxcTypeScriptTranspiler,
}

impl TypeScriptPlugin {
    pub fn new() -> Self {
        Self {
            transpiler: OxcTypeScriptTranspiler::new(),
        }
    }
}

impl Default for TypeScriptPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for TypeScriptPlugin {
    fn name(&self) -> &str {
        "typescript-plugin"
    }

    async fn transform(
        &self,
        code: &str,
        file_path: &Path,
        context: &PluginContext,
    ) -> Result<Option<String>> {
        if ModuleType::from_path(file_path) != ModuleType::TypeScript {
            return Ok(None);
        }

        let transpiled = self.transpiler.transpile(code, file_path)?;
        if context.config.output.sourcemap {
            context
                .source_maps
                .insert(file_path.to_path_buf(), transpiled.map);
        }
        Ok(Some(transpiled.code))
    }
}
