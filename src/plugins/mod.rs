// Built-in pipeline plugins, registered in the order they run

pub mod alias_plugin;
pub mod html_template_plugin;
pub mod inline_require_plugin;
pub mod logging_plugin;
pub mod registration_plugin;
pub mod style_plugin;
pub mod typescript_plugin;

pub use alias_plugin::AliasPlugin;
pub use html_template_plugin::HtmlTemplatePlugin;
pub use inline_require_plugin::InlineRequirePlugin;
pub use logging_plugin::LoggingPlugin;
pub use registration_plugin::RegistrationPlugin;
pub use style_plugin::StylePlugin;
pub use typescript_plugin::TypeScriptPlugin;

use crate::core::plugin::PluginManager;
use std::sync::Arc;

/// logging → alias → TypeScript → stylesheet → HTML template → inline → registration
pub fn default_plugins(verbose: bool) -> PluginManager {
    let mut manager = PluginManager::new();
    manager.register(Arc::new(LoggingPlugin::new(verbose)));
    manager.register(Arc::new(AliasPlugin));
    manager.register(Arc::new(TypeScriptPlugin::new()));
    manager.register(Arc::new(StylePlugin::default()));
    manager.register(Arc::new(HtmlTemplatePlugin));
    manager.register(Arc::new(InlineRequirePlugin::new()));
    manager.register(Arc::new(RegistrationPlugin));
    manager
}
