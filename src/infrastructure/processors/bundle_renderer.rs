use crate::core::models::{BuildConfig, Dependency, ModuleRecord, OutputFormat};
use crate::infrastructure::processors::module_lowering::js_string;
use crate::utils::{Logger, Result, SourceMapGenerator, SourceMapUtils, StitchError};
use sourcemap::SourceMap;
use std::collections::HashSet;

const RUNTIME: &str = r#"var __stitch_cache = [];
function __stitch_require(id) {
  var cached = __stitch_cache[id];
  if (cached) return cached.exports;
  var module = (__stitch_cache[id] = { exports: {} });
  __stitch_modules[id].call(module.exports, module, module.exports, __stitch_require);
  return module.exports;
}
function __stitch_interop(m) {
  return m && m.__esModule ? m : { default: m };
}
function __stitch_namespace(m) {
  return m && m.__esModule ? m : Object.assign({ default: m }, m);
}
function __stitch_export_star(target, source) {
  Object.keys(source).forEach(function (key) {
    if (key === 'default' || key === '__esModule' || Object.prototype.hasOwnProperty.call(target, key)) return;
    Object.defineProperty(target, key, { enumerable: true, get: function () { return source[key]; } });
  });
}"#;

pub struct RenderedBundle {
    pub code: String,
    /// Map to write next to the bundle; `None` when disabled or inlined
    pub map: Option<SourceMap>,
    pub warnings: Vec<String>,
}

/// Emits the module registry, the runtime and the entry glue for the
/// configured output format.
pub struct BundleRenderer<'a> {
    config: &'a BuildConfig,
    lines: Vec<String>,
    map: SourceMapGenerator,
    warnings: Vec<String>,
}

impl<'a> BundleRenderer<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            lines: Vec::new(),
            map: SourceMapGenerator::new(),
            warnings: Vec::new(),
        }
    }

    /// `modules` must be ordered by id with the entry at index 0.
    pub fn render(mut self, modules: &[ModuleRecord]) -> Result<RenderedBundle> {
        let _timer = crate::utils::Timer::start("Rendering bundle");

        if modules.is_empty() {
            return Err(StitchError::build("Nothing to render: the module graph is empty".to_string()));
        }

        self.push(format!("/*! {} */", self.config.output.name));
        match self.config.output.format {
            OutputFormat::Es => self.render_es_externals(modules),
            OutputFormat::Cjs => {
                self.push("'use strict';".to_string());
                self.push("function __stitch_external(specifier) { return require(specifier); }".to_string());
            }
        }

        for line in RUNTIME.lines() {
            self.push(line.to_string());
        }

        self.push("var __stitch_modules = [".to_string());
        for module in modules {
            self.render_module(module);
        }
        self.push("];".to_string());

        match self.config.output.format {
            OutputFormat::Es => self.render_es_entry(modules),
            OutputFormat::Cjs => self.push("module.exports = __stitch_require(0);".to_string()),
        }

        self.finish()
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    fn render_es_externals(&mut self, modules: &[ModuleRecord]) {
        let mut externals: Vec<&str> = Vec::new();
        for module in modules {
            for external in &module.external_imports {
                if !externals.contains(&external.as_str()) {
                    externals.push(external);
                }
            }
        }

        for (index, external) in externals.iter().enumerate() {
            self.push(format!("import * as __stitch_ext_{} from {};", index, js_string(external)));
        }

        self.push("function __stitch_esm(ns) { return Object.assign({ __esModule: true }, ns); }".to_string());
        self.push("var __stitch_externals = {".to_string());
        for (index, external) in externals.iter().enumerate() {
            self.push(format!("  {}: __stitch_esm(__stitch_ext_{}),", js_string(external), index));
        }
        self.push("};".to_string());
        self.push("function __stitch_external(specifier) { return __stitch_externals[specifier]; }".to_string());
    }

    fn render_module(&mut self, module: &ModuleRecord) {
        let display = self.config.display_path(&module.path);
        self.push(format!("/* {}: {} */", module.id, display));
        self.push("function (module, exports, __stitch_require) {".to_string());

        let body_start = self.lines.len() + module.prelude_lines;
        let code_lines: Vec<&str> = module.code.lines().collect();
        let mapped_lines = code_lines.len().saturating_sub(module.prelude_lines);
        for line in code_lines {
            self.push(line.to_string());
        }

        if self.config.output.sourcemap {
            let source_index = self.map.add_source(display, module.source.clone());
            match module.input_map {
                Some(ref input_map) => {
                    self.map.map_through(source_index, body_start as u32, input_map)
                }
                None => self.map.map_lines(
                    source_index,
                    body_start as u32,
                    mapped_lines as u32,
                    module.source.lines().count().max(1) as u32,
                ),
            }
        }

        self.push("},".to_string());
    }

    fn render_es_entry(&mut self, modules: &[ModuleRecord]) {
        let names = self.entry_export_names(modules);

        self.push("var __stitch_entry = __stitch_require(0);".to_string());
        for name in &names {
            if name != "default" {
                self.push(format!("export var {} = __stitch_entry.{};", name, name));
            }
        }

        if names.iter().any(|n| n == "default") {
            self.push("export default __stitch_entry.default;".to_string());
        } else if names.is_empty() {
            // CommonJS entry: its module.exports is the default export
            self.push("export default __stitch_entry;".to_string());
        }
    }

    /// Entry exports including everything reachable through `export *`
    fn entry_export_names(&mut self, modules: &[ModuleRecord]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(0usize, true)];

        while let Some((id, is_entry)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(module) = modules.get(id) else {
                continue;
            };

            for name in &module.exports {
                // `export *` never forwards default
                if (is_entry || name != "default") && !names.contains(name) {
                    names.push(name.clone());
                }
            }

            for star in module.star_exports.iter().rev() {
                match star {
                    Dependency::Internal(target) => stack.push((*target, false)),
                    Dependency::External(specifier) => {
                        let warning = format!(
                            "`export * from '{}'` in {} cannot be enumerated statically; those names are not exported from the bundle",
                            specifier,
                            self.config.display_path(&module.path)
                        );
                        Logger::warn(&warning);
                        self.warnings.push(warning);
                    }
                }
            }
        }

        names
    }

    fn finish(self) -> Result<RenderedBundle> {
        let mut code = self.lines.join("\n");
        let output = &self.config.output;

        let map = if output.sourcemap {
            let file_name = self
                .config
                .output
                .file
                .file_name()
                .map(|n| n.to_string_lossy().to_string());
            let source_map = self.map.generate(file_name.as_deref());

            code.push('\n');
            if output.inline_sourcemap {
                code.push_str(&SourceMapUtils::generate_external_comment(
                    &SourceMapUtils::to_inline_data_url(&source_map)?,
                ));
                None
            } else {
                let map_path = self.config.source_map_path();
                let map_name = map_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                code.push_str(&SourceMapUtils::generate_external_comment(&map_name));
                Some(source_map)
            }
        } else {
            None
        };

        code.push('\n');
        Ok(RenderedBundle {
            code,
            map,
            warnings: self.warnings,
        })
    }
}
