// Stitch - build-time source inlining and module bundling

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod plugins;
pub mod utils;

pub use crate::core::{BuildConfig, BuildResult, BuildService, PipelineBuildService};
pub use crate::utils::{Result, StitchError};
