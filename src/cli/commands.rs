use crate::core::models::{BuildConfig, OutputFormat, StyleMode};
use crate::core::{BuildService, PipelineBuildService, Resolution};
use crate::infrastructure::TokioFileSystemService;
use crate::plugins::default_plugins;
use crate::utils::{
    BuildUI, CliOverrides, ConfigLoader, Logger, Result, StitchError, CONFIG_FILE_NAME,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "stitch")]
#[command(about = "Stitch - build-time template, module name and stylesheet inlining bundler")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle the entry module into a single file
    Build {
        /// Project root; config paths are relative to it
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Config file (default: <root>/stitch.config.json)
        #[arg(short, long)]
        config: Option<String>,
        /// Entry module
        #[arg(short, long)]
        entry: Option<String>,
        /// Output file
        #[arg(short = 'o', long)]
        file: Option<String>,
        /// Bundle name used in the banner
        #[arg(short, long)]
        name: Option<String>,
        /// Output module format (es or cjs)
        #[arg(short, long)]
        format: Option<OutputFormat>,
        /// Do not emit a source map
        #[arg(long)]
        no_sourcemap: bool,
        /// Embed the source map in the bundle
        #[arg(long)]
        inline_sourcemap: bool,
        /// Stylesheet handling (inject or extract)
        #[arg(long, value_parser = parse_style_mode)]
        styles: Option<StyleMode>,
        /// Log every module as it is processed
        #[arg(short, long)]
        verbose: bool,
        /// Skip the build summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show how a request resolves through the alias table
    Resolve {
        /// The request as written in source, e.g. core/widgets/button.html
        request: String,
        /// File the request appears in
        #[arg(long)]
        from: String,
        /// Project root
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write an example stitch.config.json
    Init {
        /// Project root
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration and plugin chain
    Info {
        /// Project root
        #[arg(short, long, default_value = ".")]
        root: String,
    },
}

fn parse_style_mode(value: &str) -> std::result::Result<StyleMode, String> {
    match value.to_lowercase().as_str() {
        "inject" => Ok(StyleMode::Inject),
        "extract" => Ok(StyleMode::Extract),
        other => Err(format!("unknown style mode '{}' (expected inject or extract)", other)),
    }
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        Logger::init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Build {
                root,
                config,
                entry,
                file,
                name,
                format,
                no_sourcemap,
                inline_sourcemap,
                styles,
                verbose,
                quiet,
            } => {
                let overrides = CliOverrides {
                    entry,
                    file,
                    name,
                    format,
                    sourcemap: no_sourcemap.then_some(false),
                    inline_sourcemap: inline_sourcemap.then_some(true),
                    styles,
                };
                let config = self.load_config(&root, config.as_deref(), overrides)?;
                self.handle_build_command(&config, verbose, quiet).await
            }
            Commands::Resolve {
                request,
                from,
                root,
                json,
            } => self.handle_resolve_command(&root, &request, &from, json),
            Commands::Init { root, force } => self.handle_init_command(&root, force),
            Commands::Info { root } => self.handle_info_command(&root),
        }
    }

    fn load_config(
        &self,
        root: &str,
        config_path: Option<&str>,
        overrides: CliOverrides,
    ) -> Result<BuildConfig> {
        let root = absolute_root(root)?;
        let file_config = match config_path {
            Some(path) => {
                let path = root.join(path);
                let loaded = ConfigLoader::load_from_path(&path)?;
                if loaded.is_none() {
                    return Err(StitchError::config(format!(
                        "Config file {} does not exist",
                        path.display()
                    )));
                }
                loaded
            }
            None => ConfigLoader::load_from_file(&root)?,
        };

        ConfigLoader::merge_with_cli(file_config, root, overrides)
    }

    async fn handle_build_command(&self, config: &BuildConfig, verbose: bool, quiet: bool) -> Result<()> {
        let ui = if quiet { BuildUI::quiet() } else { BuildUI::new() };
        let build_service = PipelineBuildService::new(Arc::new(TokioFileSystemService))
            .with_plugins(default_plugins(verbose))
            .with_ui(ui);

        let result = build_service.build(config).await?;

        for warning in &result.warnings {
            Logger::warn(warning);
        }
        Logger::debug(&format!("Output fingerprint: {}", result.fingerprint));

        Ok(())
    }

    fn handle_resolve_command(&self, root: &str, request: &str, from: &str, json: bool) -> Result<()> {
        let config = self.load_config(root, None, CliOverrides::default())?;
        let importer = config.root.join(from);
        let resolution = Resolution::for_request(&config, request, &importer);

        if json {
            println!("{}", resolution.to_json()?);
            return Ok(());
        }

        println!("requested:      {}", resolution.requested);
        println!("alias resolved: {}", resolution.alias_resolved);
        println!("path:           {}", resolution.path.display());
        match resolution.module {
            Some(ref module) => println!("module:         {}", module.display()),
            None => println!("module:         (not found)"),
        }
        Ok(())
    }

    fn handle_init_command(&self, root: &str, force: bool) -> Result<()> {
        let path = absolute_root(root)?.join(CONFIG_FILE_NAME);
        if path.exists() && !force {
            return Err(StitchError::config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        std::fs::write(&path, format!("{}\n", ConfigLoader::generate_example()))?;
        Logger::info(&format!("📝 Wrote {}", path.display()));
        Ok(())
    }

    fn handle_info_command(&self, root: &str) -> Result<()> {
        let config = self.load_config(root, None, CliOverrides::default())?;
        let plugins = default_plugins(false);

        tracing::info!("🧵 Stitch v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!("══════════════════════════════════════");
        tracing::info!("📁 Root: {}", config.root.display());
        tracing::info!("📄 Entry: {}", config.display_path(&config.entry));
        tracing::info!(
            "📦 Output: {} ({:?}, sourcemap: {})",
            config.display_path(&config.output.file),
            config.output.format,
            config.output.sourcemap
        );
        tracing::info!("🎨 Styles: {:?}", config.styles);
        tracing::info!("🖼️  Icons: {}", config.display_path(&config.icon_dir));

        let mut aliases: Vec<_> = config.alias.iter().collect();
        aliases.sort();
        tracing::info!("🔗 Aliases ({}):", aliases.len());
        for (alias, target) in aliases {
            tracing::info!("  • {} → {}", alias, target);
        }

        tracing::info!("🔌 Plugins:");
        for name in plugins.plugin_names() {
            tracing::info!("  • {}", name);
        }
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn absolute_root(root: &str) -> Result<PathBuf> {
    let root = Path::new(root);
    if root.is_absolute() {
        Ok(root.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}
