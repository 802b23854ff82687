use crate::core::models::{default_resolve_extensions, BuildConfig, OutputFormat, OutputOptions, StyleMode};
use crate::utils::{Logger, Result, StitchError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "stitch.config.json";

/// Configuration file format (stitch.config.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchConfig {
    /// Entry point file (e.g., "src/index.ts")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,

    /// Logical prefix → physical prefix
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub alias: HashMap<String, String>,

    /// Separate JSON file holding the alias table, shared with other tooling.
    /// Entries in `alias` take precedence over the ones read from here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSection>,

    /// Third-party dependency root used for `~` stylesheet imports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_modules_path: Option<String>,

    /// Directory scanned for `.svg` icons (default: the output directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_extensions: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<StyleMode>,

    /// Specifiers that are never bundled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_sourcemap: Option<bool>,
}

/// Alias files come either flat or nested the way bundler configs nest them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AliasFile {
    Nested { resolve: AliasFileResolve },
    Flat(HashMap<String, String>),
}

#[derive(Debug, Deserialize)]
struct AliasFileResolve {
    #[serde(default)]
    alias: HashMap<String, String>,
}

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub entry: Option<String>,
    pub file: Option<String>,
    pub name: Option<String>,
    pub format: Option<OutputFormat>,
    pub sourcemap: Option<bool>,
    pub inline_sourcemap: Option<bool>,
    pub styles: Option<StyleMode>,
}

/// Config loader that supports config files with CLI override
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load stitch.config.json from the project root, if present
    pub fn load_from_file(root: &Path) -> Result<Option<StitchConfig>> {
        Self::load_from_path(&root.join(CONFIG_FILE_NAME))
    }

    pub fn load_from_path(config_path: &Path) -> Result<Option<StitchConfig>> {
        if !config_path.exists() {
            Logger::debug(&format!("No {} found, using defaults", config_path.display()));
            return Ok(None);
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));

        let content = std::fs::read_to_string(config_path)
            .map_err(|e| StitchError::read(config_path, e))?;

        let config: StitchConfig = serde_json::from_str(&content).map_err(|e| {
            StitchError::config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;

        Logger::debug("✅ Config file loaded successfully");
        Ok(Some(config))
    }

    /// Read an alias table from a separate JSON file
    pub fn load_alias_file(path: &Path) -> Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(path).map_err(|e| StitchError::read(path, e))?;

        let parsed: AliasFile = serde_json::from_str(&content).map_err(|e| {
            StitchError::config(format!("Failed to parse alias file {}: {}", path.display(), e))
        })?;

        Ok(match parsed {
            AliasFile::Nested { resolve } => resolve.alias,
            AliasFile::Flat(aliases) => aliases,
        })
    }

    /// Merge file config with CLI arguments (CLI > config file > defaults)
    pub fn merge_with_cli(
        file_config: Option<StitchConfig>,
        root: PathBuf,
        cli: CliOverrides,
    ) -> Result<BuildConfig> {
        let base = file_config.unwrap_or_default();
        let defaults = BuildConfig::for_root(root.clone());
        let output = base.output.clone().unwrap_or_default();

        let mut alias = match &base.alias_file {
            Some(alias_file) => Self::load_alias_file(&anchor(&root, alias_file))?,
            None => HashMap::new(),
        };
        alias.extend(base.alias.clone());

        let entry = cli
            .entry
            .or(base.entry)
            .map(|e| anchor(&root, &e))
            .unwrap_or(defaults.entry);

        let file = cli
            .file
            .or(output.file)
            .map(|f| anchor(&root, &f))
            .unwrap_or(defaults.output.file);

        // Icons live next to the bundle unless told otherwise
        let icon_dir = match base.icon_dir {
            Some(dir) => anchor(&root, &dir),
            None => file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.clone()),
        };

        Ok(BuildConfig {
            entry,
            output: OutputOptions {
                file,
                name: cli.name.or(output.name).unwrap_or(defaults.output.name),
                format: cli.format.or(output.format).unwrap_or_default(),
                sourcemap: cli.sourcemap.or(output.sourcemap).unwrap_or(true),
                inline_sourcemap: cli
                    .inline_sourcemap
                    .or(output.inline_sourcemap)
                    .unwrap_or(false),
            },
            alias,
            node_modules_path: base
                .node_modules_path
                .map(|p| anchor(&root, &p))
                .unwrap_or(defaults.node_modules_path),
            icon_dir,
            resolve_extensions: base
                .resolve_extensions
                .unwrap_or_else(default_resolve_extensions),
            styles: cli.styles.or(base.styles).unwrap_or_default(),
            external: base.external,
            root,
        })
    }

    /// Generate example config file
    pub fn generate_example() -> String {
        let mut alias = HashMap::new();
        alias.insert("core/".to_string(), "app/scripts/modules/core/".to_string());
        alias.insert("root".to_string(), ".".to_string());

        let example = StitchConfig {
            entry: Some("src/index.ts".to_string()),
            alias,
            output: Some(OutputSection {
                file: Some("lib/lib.es.js".to_string()),
                name: Some("core".to_string()),
                format: Some(OutputFormat::Es),
                sourcemap: Some(true),
                inline_sourcemap: None,
            }),
            node_modules_path: Some("node_modules".to_string()),
            styles: Some(StyleMode::Inject),
            ..Default::default()
        };

        serde_json::to_string_pretty(&example).unwrap_or_else(|_| {
            r#"{
  "entry": "src/index.ts",
  "output": { "file": "lib/lib.es.js", "name": "core", "format": "es", "sourcemap": true }
}"#
            .to_string()
        })
    }
}

fn anchor(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
