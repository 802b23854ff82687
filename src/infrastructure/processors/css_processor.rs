use crate::core::interfaces::CssProcessor;
use crate::utils::{Logger, Result};
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{ParserOptions as CssParserOptions, StyleSheet},
};
use std::path::Path;

/// Plain CSS (and import-inlined LESS) through lightningcss.
pub struct LightningCssProcessor {
    minify: bool,
}

impl LightningCssProcessor {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }

    fn fallback_minify(&self, content: &str) -> String {
        if self.minify {
            content
                .lines()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("")
        } else {
            content.to_string()
        }
    }
}

#[async_trait::async_trait]
impl CssProcessor for LightningCssProcessor {
    async fn process_css(&self, content: &str, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");
        let _timer = crate::utils::Timer::start(&format!("Processing CSS {}", name));
        Logger::processing_css(name);

        // LESS syntax lightningcss cannot parse still ships, whitespace-minified
        match StyleSheet::parse(content, CssParserOptions::default()) {
            Ok(stylesheet) => match stylesheet.to_css(PrinterOptions {
                minify: self.minify,
                ..Default::default()
            }) {
                Ok(result) => Ok(result.code),
                Err(_) => {
                    Logger::warn(&format!(
                        "CSS processing failed for {}, using fallback minification",
                        path.display()
                    ));
                    Ok(self.fallback_minify(content))
                }
            },
            Err(_) => {
                Logger::warn(&format!(
                    "CSS parse error for {}, using fallback minification",
                    path.display()
                ));
                Ok(self.fallback_minify(content))
            }
        }
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("css") | Some("less")
        )
    }
}

impl Default for LightningCssProcessor {
    fn default() -> Self {
        Self::new(true)
    }
}
