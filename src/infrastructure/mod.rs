// Infrastructure layer
pub mod file_system;
pub mod icon_index;
pub mod module_resolver;
pub mod processors;

pub use file_system::*;
pub use icon_index::*;
pub use module_resolver::*;
pub use processors::*;
