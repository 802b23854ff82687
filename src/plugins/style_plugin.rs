// Style Plugin: turns stylesheets reached from the module graph into modules

use crate::core::interfaces::CssProcessor;
use crate::core::models::{ModuleType, StyleMode};
use crate::core::plugin::{Plugin, PluginContext};
use crate::infrastructure::processors::module_lowering::js_string;
use crate::infrastructure::{LightningCssProcessor, ScssProcessor, StyleImportRewriter, StyleLoader};
use crate::utils::{Logger, Result, StitchError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Loads a stylesheet with its `~` imports rewritten and inlined, compiles
/// it, then either injects it at runtime or hands it to the extracted
/// stylesheet.
pub struct StylePlugin {
    processors: Vec<Arc<dyn CssProcessor>>,
}

impl StylePlugin {
    pub fn new(minify: bool) -> Self {
        let css: Arc<dyn CssProcessor> = Arc::new(LightningCssProcessor::new(minify));
        let scss: Arc<dyn CssProcessor> =
            Arc::new(ScssProcessor::with_css_processor(minify, css.clone()));

        Self {
            processors: vec![scss, css],
        }
    }

    fn processor_for(&self, path: &Path) -> Option<&Arc<dyn CssProcessor>> {
        self.processors.iter().find(|p| p.supports(path))
    }
}

impl Default for StylePlugin {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Plugin for StylePlugin {
    fn name(&self) -> &str {
        "style-plugin"
    }

    async fn transform(
        &self,
        code: &str,
        file_path: &Path,
        context: &PluginContext,
    ) -> Result<Option<String>> {
        if ModuleType::from_path(file_path) != ModuleType::Stylesheet {
            return Ok(None);
        }

        let processor = self.processor_for(file_path).ok_or_else(|| {
            StitchError::CssProcessing(format!("No stylesheet processor for {}", file_path.display()))
        })?;

        let rewriter = StyleImportRewriter::new(
            context.aliases.clone(),
            context.config.node_modules_path.clone(),
        );
        let loader = StyleLoader::new(context.fs.clone(), rewriter, context.root.clone());

        let source = loader.load(code, file_path).await?;
        let css = processor.process_css(&source, file_path).await?;

        let module = match context.config.styles {
            StyleMode::Inject => inject_module(&css, &context.config.display_path(file_path)),
            StyleMode::Extract => {
                Logger::debug(&format!("Extracting {}", file_path.display()));
                context.extracted_styles.insert(file_path.to_path_buf(), css);
                "export {};".to_string()
            }
        };

        Ok(Some(module))
    }
}

fn inject_module(css: &str, id: &str) -> String {
    format!(
        "var css = {css};\n\
         if (typeof document !== 'undefined') {{\n\
         \x20 var style = document.createElement('style');\n\
         \x20 style.setAttribute('data-stitch', {id});\n\
         \x20 style.textContent = css;\n\
         \x20 document.head.appendChild(style);\n\
         }}\n\
         export default css;",
        css = js_string(css),
        id = js_string(id),
    )
}
