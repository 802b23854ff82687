use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

pub struct Logger;

impl Logger {
    pub fn init() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("stitch=info"));

        // A second init (tests, embedding) keeps the first subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    pub fn build_start(entry: &str, output: &str) {
        info!("🧵 Stitch - Module Build");
        info!("═══════════════════════════════════════");
        info!("📁 Entry: {}", entry);
        info!("📦 Output: {}", output);
    }

    pub fn aliases_loaded(count: usize) {
        info!("🔗 Loaded {} path aliases", count);
    }

    pub fn icons_indexed(count: usize, dir: &str) {
        info!("🖼️  Indexed {} icons from {}", count, dir);
    }

    pub fn processing_file(id: &str) {
        info!("Processing: '{}'", id);
    }

    pub fn transpiling(name: &str) {
        debug!("⚡ Transpiling TypeScript: {}", name);
    }

    pub fn processing_css(name: &str) {
        debug!("🎨 Processing stylesheet: {}", name);
    }

    pub fn external(specifier: &str, importer: &str) {
        debug!("📎 External: '{}' (from {})", specifier, importer);
    }

    pub fn build_complete(modules: usize, externals: usize, build_time: std::time::Duration, output: &str) {
        info!("");
        info!("📊 Build Statistics:");
        info!("  • Modules processed: {}", modules);
        info!("  • External dependencies: {}", externals);
        info!("  • Build time: {:.2?}", build_time);
        info!("  • Output: {}", output);
        info!("✅ Build completed successfully!");
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn error(msg: &str) {
        error!("❌ {}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("⚠️  {}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
