use crate::core::interfaces::CssProcessor;
use crate::utils::{Logger, Result, StitchError};
use std::path::Path;
use std::sync::Arc;

/// SCSS/SASS preprocessor using the grass crate
///
/// Compiles SCSS/SASS to CSS and then optionally processes with LightningCSS
#[derive(Clone)]
pub struct ScssProcessor {
    minify: bool,
    css_processor: Option<Arc<dyn CssProcessor>>,
}

impl ScssProcessor {
    pub fn new(minify: bool) -> Self {
        Self {
            minify,
            css_processor: None,
        }
    }

    /// Create SCSS processor with CSS post-processor
    pub fn with_css_processor(minify: bool, css_processor: Arc<dyn CssProcessor>) -> Self {
        Self {
            minify,
            css_processor: Some(css_processor),
        }
    }

    pub fn is_scss_file(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("scss") | Some("sass")
        )
    }

    fn compile_scss(&self, content: &str, path: &Path) -> Result<String> {
        let _timer = crate::utils::Timer::start(&format!(
            "Compiling SCSS {}",
            path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown")
        ));

        let syntax = if path.extension().and_then(|s| s.to_str()) == Some("sass") {
            grass::InputSyntax::Sass
        } else {
            grass::InputSyntax::Scss
        };

        let options = grass::Options::default()
            .input_syntax(syntax)
            .style(if self.minify {
                grass::OutputStyle::Compressed
            } else {
                grass::OutputStyle::Expanded
            });

        // Imports were already inlined by the stylesheet loader
        grass::from_string(content.to_string(), &options).map_err(|e| {
            let error_msg = format!("SCSS compilation error in {}: {}", path.display(), e);
            Logger::error(&error_msg);
            StitchError::CssProcessing(error_msg)
        })
    }
}

#[async_trait::async_trait]
impl CssProcessor for ScssProcessor {
    async fn process_css(&self, content: &str, path: &Path) -> Result<String> {
        let css = self.compile_scss(content, path)?;

        match self.css_processor {
            Some(ref processor) => {
                Logger::debug("Post-processing compiled CSS with LightningCSS");
                processor.process_css(&css, &path.with_extension("css")).await
            }
            None => Ok(css),
        }
    }

    fn supports(&self, path: &Path) -> bool {
        Self::is_scss_file(path)
    }
}
