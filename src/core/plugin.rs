// Plugin system for the build pipeline
// Every pipeline stage is a plugin with resolve and transform hooks

use crate::core::interfaces::FileSystemService;
use crate::core::models::{BuildConfig, BuildResult};
use crate::infrastructure::IconIndex;
use crate::utils::{AliasTable, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use sourcemap::SourceMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context provided to plugins during execution
///
/// The alias table and icon index are loaded once per build and only read
/// afterwards.
#[derive(Clone)]
pub struct PluginContext {
    /// Project root directory
    pub root: PathBuf,
    /// Current build configuration
    pub config: BuildConfig,
    pub aliases: Arc<AliasTable>,
    pub icons: Arc<IconIndex>,
    pub fs: Arc<dyn FileSystemService>,
    /// Processed stylesheets by path, when styles are extracted
    pub extracted_styles: Arc<DashMap<PathBuf, String>>,
    /// Maps of transforms that reprinted a module, by path
    pub source_maps: Arc<DashMap<PathBuf, SourceMap>>,
}

impl PluginContext {
    pub fn new(
        config: BuildConfig,
        aliases: Arc<AliasTable>,
        icons: Arc<IconIndex>,
        fs: Arc<dyn FileSystemService>,
    ) -> Self {
        Self {
            root: config.root.clone(),
            config,
            aliases,
            icons,
            fs,
            extracted_styles: Arc::new(DashMap::new()),
            source_maps: Arc::new(DashMap::new()),
        }
    }
}

/// Main plugin trait that all plugins must implement
///
/// Plugins can hook into various stages of the build process:
/// - Build lifecycle: on_build_start, on_build_end
/// - Module resolution: resolve
/// - Code transformation: transform
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name for identification and logging
    fn name(&self) -> &str;

    /// Called once, after the alias table and icon index are loaded
    fn on_build_start(&self, _context: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called after the output has been written
    fn on_build_end(&self, _context: &PluginContext, _result: &BuildResult) -> Result<()> {
        Ok(())
    }

    /// Transform the content of a discovered file
    ///
    /// Return `Some(new_code)` to replace it, `None` to leave it unchanged.
    async fn transform(
        &self,
        _code: &str,
        _file_path: &Path,
        _context: &PluginContext,
    ) -> Result<Option<String>> {
        Ok(None)
    }

    /// Resolve an import specifier to a file
    ///
    /// Return `None` to let the next plugin try.
    async fn resolve(
        &self,
        _import: &str,
        _importer: &Path,
        _context: &PluginContext,
    ) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Manages plugin registration and execution
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        for plugin in &self.plugins {
            plugin.on_build_start(context)?;
        }
        Ok(())
    }

    pub fn on_build_end(&self, context: &PluginContext, result: &BuildResult) -> Result<()> {
        for plugin in &self.plugins {
            plugin.on_build_end(context, result)?;
        }
        Ok(())
    }

    /// Execute transform hooks for all plugins
    ///
    /// Plugins are executed in registration order.
    /// Each plugin receives the output of the previous plugin.
    pub async fn transform(
        &self,
        mut code: String,
        file_path: &Path,
        context: &PluginContext,
    ) -> Result<String> {
        for plugin in &self.plugins {
            if let Some(transformed) = plugin.transform(&code, file_path, context).await? {
                code = transformed;
            }
        }
        Ok(code)
    }

    /// Execute resolve hooks for all plugins
    ///
    /// Returns the first non-None result, or None if no plugin resolved it.
    pub async fn resolve(
        &self,
        import: &str,
        importer: &Path,
        context: &PluginContext,
    ) -> Result<Option<PathBuf>> {
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve(import, importer, context).await? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
