// Processors module
pub mod bundle_renderer;
pub mod css_processor;
pub mod html_minifier;
pub mod module_lowering;
pub mod scss_processor;
pub mod style_imports;
pub mod typescript;

pub use bundle_renderer::*;
pub use css_processor::*;
pub use html_minifier::*;
pub use module_lowering::{collect_specifiers, lower, LoweredModule};
pub use scss_processor::*;
pub use style_imports::*;
pub use typescript::*;
