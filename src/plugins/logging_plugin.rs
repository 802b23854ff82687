// Logging Plugin: reports every file that enters the transform chain

use crate::core::models::BuildResult;
use crate::core::plugin::{Plugin, PluginContext};
use crate::utils::{Logger, Result};
use async_trait::async_trait;
use std::path::Path;

/// Logs `Processing: '<id>'` for each discovered file and a short summary
/// around the build. Never changes code.
pub struct LoggingPlugin {
    verbose: bool,
}

impl LoggingPlugin {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        "logging-plugin"
    }

    fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        if self.verbose {
            Logger::info(&format!("  Root: {}", context.root.display()));
            Logger::info(&format!("  Format: {:?}", context.config.output.format));
            Logger::info(&format!("  Styles: {:?}", context.config.styles));
            Logger::info(&format!("  Source maps: {}", context.config.output.sourcemap));
        }
        Ok(())
    }

    fn on_build_end(&self, _context: &PluginContext, result: &BuildResult) -> Result<()> {
        if self.verbose && result.success {
            Logger::info(&format!("  Fingerprint: {}", result.fingerprint));
            for warning in &result.warnings {
                Logger::info(&format!("  ⚠️  {}", warning));
            }
        }
        Ok(())
    }

    async fn transform(
        &self,
        _code: &str,
        file_path: &Path,
        context: &PluginContext,
    ) -> Result<Option<String>> {
        Logger::processing_file(&context.config.display_path(file_path));
        Ok(None)
    }
}
