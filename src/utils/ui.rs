use colored::*;
use std::time::Duration;

/// Terminal summary printed after a build
pub struct BuildUI {
    quiet: bool,
}

impl BuildUI {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    pub fn show_banner(&self) {
        if self.quiet {
            return;
        }
        println!("\n  {} {}", "STITCH".bright_cyan().bold(), env!("CARGO_PKG_VERSION").bright_white());
        println!();
    }

    pub fn show_completion(&self, stats: &CompletionStats) {
        if self.quiet {
            return;
        }

        println!();
        for file in &stats.output_files {
            println!(
                "  {} {}",
                file.name.bright_cyan(),
                format!("({})", format_size(file.size)).bright_black()
            );
        }

        println!();
        println!(
            "  {} modules, {} externals",
            stats.modules.to_string().bright_white().bold(),
            stats.externals.to_string().bright_white()
        );
        for warning in &stats.warnings {
            println!("  {} {}", "!".bright_yellow().bold(), warning.yellow());
        }

        println!();
        println!(
            "  {} built in {}",
            "✓".bright_green(),
            format!("{:.0}ms", stats.build_time.as_secs_f64() * 1000.0)
                .bright_white()
                .bold()
        );
    }
}

impl Default for BuildUI {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct CompletionStats {
    pub output_files: Vec<OutputFileInfo>,
    pub modules: usize,
    pub externals: usize,
    pub warnings: Vec<String>,
    pub build_time: Duration,
}

#[derive(Clone, Debug)]
pub struct OutputFileInfo {
    pub name: String,
    pub size: usize,
}

pub fn format_size(size: usize) -> String {
    let size_kb = size as f64 / 1024.0;
    if size_kb < 1.0 {
        format!("{} B", size)
    } else {
        format!("{:.2} kB", size_kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 kB");
    }
}
