use std::path::PathBuf;
use thiserror::Error;

/// Enhanced error with file location context
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub code_snippet: Option<String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            file_path: None,
            line: None,
            column: None,
            code_snippet: None,
        }
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_snippet(mut self, snippet: String) -> Self {
        self.code_snippet = Some(snippet);
        self
    }
}

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error("Build error: {message}")]
    Build {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error(
        "The required html template '{template}' alias resolved: {alias_resolved} resolved to path: '{}' required in {} doesn't exist, and therefore an inline substitution can't be performed!",
        .resolved_path.display(),
        .importer.display()
    )]
    UnresolvedTemplate {
        template: String,
        alias_resolved: String,
        resolved_path: PathBuf,
        importer: PathBuf,
    },

    #[error(
        "Could not find a registered module name for '{request}' in '{}' (required in {})",
        .companion.display(),
        .importer.display()
    )]
    ModuleNameNotFound {
        request: String,
        companion: PathBuf,
        importer: PathBuf,
    },

    #[error("Icon '{name}' required in {} is not present in the icon directory", .importer.display())]
    IconNotFound { name: String, importer: PathBuf },

    #[error("Stylesheet import '{import}' in {} could not be found", .importer.display())]
    StyleImportNotFound { import: String, importer: PathBuf },

    #[error("Got falsey dependency whilst registering angular module '{module}': [{dependencies}]")]
    FalseyDependency {
        module: String,
        dependencies: String,
    },

    #[error("CSS processing error: {0}")]
    CssProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entry point not found: {0}")]
    EntryNotFound(String),
}

impl StitchError {
    /// Create a simple parse error without context
    pub fn parse(message: String) -> Self {
        Self::Parse {
            message,
            context: None,
        }
    }

    /// Create a parse error with context
    pub fn parse_with_context(message: String, context: ErrorContext) -> Self {
        Self::Parse {
            message,
            context: Some(context),
        }
    }

    /// Create a simple build error without context
    pub fn build(message: String) -> Self {
        Self::Build {
            message,
            context: None,
        }
    }

    /// Create a build error with context
    pub fn build_with_context(message: String, context: ErrorContext) -> Self {
        Self::Build {
            message,
            context: Some(context),
        }
    }

    /// Create a configuration error
    pub fn config(message: String) -> Self {
        Self::Config(message)
    }

    /// Wrap an io error with the path that was being read
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Format error with enhanced context display
    pub fn format_detailed(&self) -> String {
        match self {
            StitchError::Parse { message, context } => {
                self.format_error_with_context("Parse Error", message, context)
            }
            StitchError::Build { message, context } => {
                self.format_error_with_context("Build Error", message, context)
            }
            _ => format!("❌ {}", self),
        }
    }

    fn format_error_with_context(
        &self,
        error_type: &str,
        message: &str,
        context: &Option<ErrorContext>,
    ) -> String {
        let mut output = format!("❌ {}: {}", error_type, message);

        if let Some(ctx) = context {
            if let Some(ref file_path) = ctx.file_path {
                output.push_str(&format!("\n📁 File: {}", file_path.display()));
            }

            if let (Some(line), Some(column)) = (ctx.line, ctx.column) {
                output.push_str(&format!("\n📍 Location: line {}, column {}", line, column));
            }

            if let Some(ref snippet) = ctx.code_snippet {
                output.push_str(&format!(
                    "\n📝 Code:\n{}",
                    self.format_code_snippet(snippet, ctx.line)
                ));
            }
        }

        output
    }

    fn format_code_snippet(&self, snippet: &str, error_line: Option<usize>) -> String {
        let mut output = String::new();

        for (i, line) in snippet.lines().enumerate() {
            let line_num = i + 1;

            if error_line == Some(line_num) {
                output.push_str(&format!("→ {:3} │ {}\n", line_num, line));
                output.push_str(&format!("     │ {}\n", "^".repeat(line.len().clamp(1, 60))));
            } else {
                output.push_str(&format!("  {:3} │ {}\n", line_num, line));
            }
        }

        output
    }
}

pub type Result<T> = std::result::Result<T, StitchError>;

impl From<regex::Error> for StitchError {
    fn from(err: regex::Error) -> Self {
        StitchError::parse(format!("Regex error: {}", err))
    }
}

impl From<anyhow::Error> for StitchError {
    fn from(err: anyhow::Error) -> Self {
        StitchError::build(err.to_string())
    }
}

impl From<serde_json::Error> for StitchError {
    fn from(err: serde_json::Error) -> Self {
        StitchError::config(err.to_string())
    }
}
