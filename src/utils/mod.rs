// Shared utilities module
pub mod config_loader;
pub mod errors;
pub mod logging;
pub mod path_aliases;
pub mod source_maps;
pub mod ui;

pub use config_loader::*;
pub use errors::*;
pub use logging::*;
pub use path_aliases::AliasTable;
pub use source_maps::*;
pub use ui::*;
