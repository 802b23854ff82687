use crate::core::interfaces::{BuildService, FileSystemService};
use crate::core::models::*;
use crate::core::plugin::{Plugin, PluginContext, PluginManager};
use crate::infrastructure::{
    collect_specifiers, is_bare_specifier, lower, BundleRenderer, IconIndex, RenderedBundle,
};
use crate::utils::path_aliases::normalize_path;
use crate::utils::{
    AliasTable, BuildUI, CompletionStats, Logger, OutputFileInfo, Result, SourceMapUtils,
    StitchError, Timer,
};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Modules in id order (entry first) plus what the walk learned on the way
#[derive(Debug, Default)]
pub struct ModuleGraph {
    pub modules: Vec<ModuleRecord>,
    pub externals: Vec<String>,
    pub warnings: Vec<String>,
}

/// Build service: loads the read-only tables, walks the module graph through
/// the plugin chain, renders the bundle and writes it.
pub struct PipelineBuildService {
    fs_service: Arc<dyn FileSystemService>,
    plugin_manager: PluginManager,
    ui: BuildUI,
}

impl PipelineBuildService {
    pub fn new(fs_service: Arc<dyn FileSystemService>) -> Self {
        Self {
            fs_service,
            plugin_manager: PluginManager::new(),
            ui: BuildUI::new(),
        }
    }

    /// Register a plugin with the build service
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugin_manager.register(plugin);
        self
    }

    /// Replace the plugin chain
    pub fn with_plugins(mut self, plugin_manager: PluginManager) -> Self {
        self.plugin_manager = plugin_manager;
        self
    }

    pub fn with_ui(mut self, ui: BuildUI) -> Self {
        self.ui = ui;
        self
    }

    pub fn plugin_manager_mut(&mut self) -> &mut PluginManager {
        &mut self.plugin_manager
    }

    /// Load the alias table and scan the icon directory
    pub async fn create_context(&self, config: &BuildConfig) -> Result<PluginContext> {
        let aliases = Arc::new(AliasTable::new(config.alias.clone(), config.root.clone()));
        let icons = Arc::new(IconIndex::scan(self.fs_service.as_ref(), &config.icon_dir).await?);

        Ok(PluginContext::new(
            config.clone(),
            aliases,
            icons,
            self.fs_service.clone(),
        ))
    }

    /// Breadth-first walk from the entry. Ids follow discovery order, so the
    /// output does not depend on anything but the inputs.
    pub async fn walk_graph(&self, context: &PluginContext) -> Result<ModuleGraph> {
        let _timer = Timer::start("Module graph");
        let config = &context.config;

        let mut graph = ModuleGraph::default();
        let mut ids: HashMap<PathBuf, usize> = HashMap::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();

        let entry = normalize_path(&config.entry);
        ids.insert(entry.clone(), 0);
        queue.push_back(entry);

        while let Some(path) = queue.pop_front() {
            let id = graph.modules.len();
            let source = self.fs_service.read_file(&path).await?;
            let module_type = ModuleType::from_path(&path);

            let mut code = self
                .plugin_manager
                .transform(source.clone(), &path, context)
                .await?;
            if module_type == ModuleType::Json {
                code = format!("module.exports = {};", code.trim());
            }

            let mut dependencies = HashMap::new();
            for specifier in collect_specifiers(&code) {
                let dependency = self
                    .resolve_dependency(&specifier, &path, context, &mut graph)
                    .await?;

                let dependency = match dependency {
                    Some(resolved) => {
                        let next_id = ids.len();
                        let target = *ids.entry(resolved.clone()).or_insert_with(|| {
                            queue.push_back(resolved);
                            next_id
                        });
                        Dependency::Internal(target)
                    }
                    None => {
                        if !graph.externals.contains(&specifier) {
                            graph.externals.push(specifier.clone());
                        }
                        Dependency::External(specifier.clone())
                    }
                };
                dependencies.insert(specifier, dependency);
            }

            let lowered = lower(&code, &dependencies);
            let input_map = context.source_maps.remove(&path).map(|(_, map)| map);
            graph.modules.push(ModuleRecord {
                id,
                path,
                module_type,
                source,
                code: lowered.code,
                prelude_lines: lowered.prelude_lines,
                input_map,
                exports: lowered.exports,
                star_exports: lowered.star_exports,
                external_imports: lowered.external_imports,
            });
        }

        Ok(graph)
    }

    /// `Some(path)` for a bundled module, `None` for an external
    async fn resolve_dependency(
        &self,
        specifier: &str,
        importer: &Path,
        context: &PluginContext,
        graph: &mut ModuleGraph,
    ) -> Result<Option<PathBuf>> {
        let config = &context.config;
        let is_configured_external = config.external.iter().any(|external| {
            specifier == external || specifier.starts_with(&format!("{}/", external))
        });
        if is_configured_external {
            Logger::external(specifier, &config.display_path(importer));
            return Ok(None);
        }

        match self.plugin_manager.resolve(specifier, importer, context).await? {
            Some(resolved) if ModuleType::from_path(&resolved) != ModuleType::Unknown => {
                Ok(Some(resolved))
            }
            _ => {
                let is_asset = ModuleType::from_path(Path::new(specifier)) == ModuleType::Unknown
                    && Path::new(specifier).extension().is_some();

                if is_bare_specifier(specifier) || is_asset {
                    Logger::external(specifier, &config.display_path(importer));
                } else {
                    let warning = format!(
                        "Could not resolve '{}' from {}; it is treated as external",
                        specifier,
                        config.display_path(importer)
                    );
                    Logger::warn(&warning);
                    graph.warnings.push(warning);
                }
                Ok(None)
            }
        }
    }

    async fn write_output_files(
        &self,
        context: &PluginContext,
        graph: &ModuleGraph,
        rendered: &RenderedBundle,
    ) -> Result<Vec<OutputFile>> {
        let _timer = Timer::start("Writing output files");
        let config = &context.config;
        let mut output_files = Vec::new();

        self.fs_service
            .write_file(&config.output.file, &rendered.code)
            .await?;
        output_files.push(OutputFile::new(config.output.file.clone(), rendered.code.clone()));

        if let Some(ref source_map) = rendered.map {
            let map_path = config.source_map_path();
            let json = SourceMapUtils::to_json(source_map)?;
            self.fs_service.write_file(&map_path, &json).await?;
            output_files.push(OutputFile::new(map_path, json));
        }

        if config.styles == StyleMode::Extract {
            let css: Vec<String> = graph
                .modules
                .iter()
                .filter_map(|m| context.extracted_styles.get(&m.path).map(|css| css.clone()))
                .collect();

            if !css.is_empty() {
                let css_path = config.extracted_css_path();
                let content = format!("{}\n", css.join("\n"));
                self.fs_service.write_file(&css_path, &content).await?;
                output_files.push(OutputFile::new(css_path, content));
            }
        }

        Ok(output_files)
    }
}

/// blake3 over every output file, in write order
pub fn fingerprint(files: &[OutputFile]) -> String {
    let mut hasher = blake3::Hasher::new();
    for file in files {
        hasher.update(file.content.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[async_trait::async_trait]
impl BuildService for PipelineBuildService {
    async fn build(&self, config: &BuildConfig) -> Result<BuildResult> {
        let start_time = Instant::now();
        self.ui.show_banner();
        Logger::build_start(
            &config.display_path(&config.entry),
            &config.display_path(&config.output.file),
        );

        if !self.fs_service.file_exists(&config.entry) {
            return Err(StitchError::EntryNotFound(config.entry.display().to_string()));
        }

        let context = self.create_context(config).await?;
        self.plugin_manager.on_build_start(&context)?;

        let graph = self.walk_graph(&context).await?;
        let rendered = BundleRenderer::new(config).render(&graph.modules)?;
        let output_files = self.write_output_files(&context, &graph, &rendered).await?;

        let mut warnings = graph.warnings.clone();
        warnings.extend(rendered.warnings.iter().cloned());

        let result = BuildResult {
            modules_processed: graph.modules.len(),
            externals: graph.externals.clone(),
            build_time: start_time.elapsed(),
            fingerprint: fingerprint(&output_files),
            output_files,
            success: true,
            warnings,
        };

        self.ui.show_completion(&CompletionStats {
            output_files: result
                .output_files
                .iter()
                .map(|f| OutputFileInfo {
                    name: config.display_path(&f.path),
                    size: f.size,
                })
                .collect(),
            modules: result.modules_processed,
            externals: result.externals.len(),
            warnings: result.warnings.clone(),
            build_time: result.build_time,
        });
        Logger::build_complete(
            result.modules_processed,
            result.externals.len(),
            result.build_time,
            &config.display_path(&config.output.file),
        );

        self.plugin_manager.on_build_end(&context, &result)?;
        Ok(result)
    }
}

/// Alias resolution of one request, stage by stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub requested: String,
    pub alias_resolved: String,
    pub path: PathBuf,
    /// The file a module import would load, after extension probing
    pub module: Option<PathBuf>,
}

impl Resolution {
    pub fn for_request(config: &BuildConfig, requested: &str, importer: &Path) -> Self {
        let aliases = AliasTable::new(config.alias.clone(), config.root.clone());
        let (alias_resolved, path) = aliases.resolve_request(requested, importer);
        let module = crate::infrastructure::ModuleResolver::new(config.resolve_extensions.clone())
            .find_file(&path);

        Self {
            requested: requested.to_string(),
            alias_resolved,
            path,
            module,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
