use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Module format of the emitted bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Es,
    Cjs,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "es" | "esm" | "module" => Ok(OutputFormat::Es),
            "cjs" | "commonjs" => Ok(OutputFormat::Cjs),
            other => Err(format!("unknown output format '{}' (expected es or cjs)", other)),
        }
    }
}

/// What happens to processed stylesheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleMode {
    /// Each stylesheet module appends a `<style>` element when evaluated
    #[default]
    Inject,
    /// Stylesheets are collected into a `.css` file next to the bundle
    Extract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputOptions {
    pub file: PathBuf,
    pub name: String,
    pub format: OutputFormat,
    pub sourcemap: bool,
    /// Embed the map as a data URL instead of writing `<file>.map`
    #[serde(default)]
    pub inline_sourcemap: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            file: PathBuf::from("lib/lib.es.js"),
            name: "bundle".to_string(),
            format: OutputFormat::Es,
            sourcemap: true,
            inline_sourcemap: false,
        }
    }
}

/// Fully resolved build configuration. Paths are absolute (anchored at root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub root: PathBuf,
    pub entry: PathBuf,
    pub output: OutputOptions,
    pub alias: HashMap<String, String>,
    pub node_modules_path: PathBuf,
    pub icon_dir: PathBuf,
    pub resolve_extensions: Vec<String>,
    pub styles: StyleMode,
    pub external: Vec<String>,
}

pub fn default_resolve_extensions() -> Vec<String> {
    [".ts", ".tsx", "/index.ts", "/index.tsx", ".js", "/index.js"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl BuildConfig {
    /// Defaults for a project rooted at `root`
    pub fn for_root(root: PathBuf) -> Self {
        Self {
            entry: root.join("src/index.ts"),
            output: OutputOptions {
                file: root.join("lib/lib.es.js"),
                ..OutputOptions::default()
            },
            alias: HashMap::new(),
            node_modules_path: root.join("node_modules"),
            icon_dir: root.join("lib"),
            resolve_extensions: default_resolve_extensions(),
            styles: StyleMode::Inject,
            external: Vec::new(),
            root,
        }
    }

    pub fn source_map_path(&self) -> PathBuf {
        let mut name = self.output.file.as_os_str().to_os_string();
        name.push(".map");
        PathBuf::from(name)
    }

    pub fn extracted_css_path(&self) -> PathBuf {
        self.output.file.with_extension("css")
    }

    /// Path relative to the project root, for ids, logs and source maps
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// A single source file flowing through the transform chain
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub content: String,
}

impl SourceUnit {
    pub fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }

    pub fn module_type(&self) -> ModuleType {
        ModuleType::from_path(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleType {
    JavaScript,
    TypeScript,
    Stylesheet,
    Html,
    Json,
    Unknown,
}

impl ModuleType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => ModuleType::JavaScript,
            "ts" | "tsx" => ModuleType::TypeScript,
            "css" | "less" | "scss" | "sass" => ModuleType::Stylesheet,
            "html" | "htm" => ModuleType::Html,
            "json" => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .map(Self::from_extension)
            .unwrap_or(ModuleType::Unknown)
    }
}

/// Where an import specifier of a module points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Internal(usize),
    External(String),
}

/// A module after the transform chain and lowering into a registry function
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: usize,
    pub path: PathBuf,
    pub module_type: ModuleType,
    /// Content as read from disk, embedded in the source map
    pub source: String,
    /// Body of the registry function
    pub code: String,
    /// Lines the lowering put in front of the transformed code
    pub prelude_lines: usize,
    /// Map from the transformed lines back to `source`, when a transform
    /// reprinted the module
    pub input_map: Option<sourcemap::SourceMap>,
    pub exports: Vec<String>,
    /// Targets of `export * from`
    pub star_exports: Vec<Dependency>,
    /// External specifiers reached through `import`/`export ... from`
    pub external_imports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
    pub size: usize,
}

impl OutputFile {
    pub fn new(path: PathBuf, content: String) -> Self {
        let size = content.len();
        Self { path, content, size }
    }
}

#[derive(Debug, Default)]
pub struct BuildResult {
    pub modules_processed: usize,
    pub externals: Vec<String>,
    pub build_time: std::time::Duration,
    pub output_files: Vec<OutputFile>,
    pub success: bool,
    pub warnings: Vec<String>,
    /// blake3 of every output file, in write order
    pub fingerprint: String,
}
