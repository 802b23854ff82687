// HTML Template Plugin: an imported .html file becomes a string module

use crate::core::models::ModuleType;
use crate::core::plugin::{Plugin, PluginContext};
use crate::infrastructure::minify_html;
use crate::infrastructure::processors::module_lowering::js_string;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::Path;

pub struct HtmlTemplatePlugin;

#[async_trait]
impl Plugin for HtmlTemplatePlugin {
    fn name(&self) -> &str {
        "html-template-plugin"
    }

    async fn transform(
        &self,
        code: &str,
        file_path: &Path,
        _context: &PluginContext,
    ) -> Result<Option<String>> {
        if ModuleType::from_path(file_path) != ModuleType::Html {
            return Ok(None);
        }
        Ok(Some(format!("export default {};", js_string(&minify_html(code)))))
    }
}
