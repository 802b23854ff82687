use crate::utils::{ErrorContext, Logger, Result, SourceMapUtils, StitchError};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use sourcemap::SourceMap;
use std::path::Path;

/// Printed JavaScript and the map from its lines back to the TypeScript
#[derive(Debug)]
pub struct Transpiled {
    pub code: String,
    pub map: SourceMap,
}

/// TypeScript → JavaScript with oxc: type annotations and type-only imports
/// are stripped, module syntax is left for the bundler.
pub struct OxcTypeScriptTranspiler {
    options: TransformOptions,
}

impl OxcTypeScriptTranspiler {
    pub fn new() -> Self {
        Self {
            options: TransformOptions::default(),
        }
    }

    pub fn transpile(&self, source: &str, path: &Path) -> Result<Transpiled> {
        let _timer = crate::utils::Timer::start(&format!(
            "Transpiling {}",
            path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown")
        ));
        Logger::transpiling(&path.display().to_string());

        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path)
            .unwrap_or_default()
            .with_typescript(true);

        let parsed = Parser::new(&allocator, source, source_type).parse();
        if parsed.panicked || !parsed.errors.is_empty() {
            return Err(StitchError::parse_with_context(
                join_diagnostics(parsed.errors.iter()),
                ErrorContext::new().with_file(path.to_path_buf()),
            ));
        }

        let mut program = parsed.program;
        let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();

        let transformed = Transformer::new(&allocator, path, &self.options)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return Err(StitchError::build_with_context(
                join_diagnostics(transformed.errors.iter()),
                ErrorContext::new().with_file(path.to_path_buf()),
            ));
        }

        // Single quotes keep the output close to what tsc emits, which is
        // what the inline patterns are written against.
        let printed = Codegen::new()
            .with_options(CodegenOptions {
                single_quote: true,
                source_map_path: Some(path.to_path_buf()),
                ..CodegenOptions::default()
            })
            .build(&program);

        let map = match printed.map {
            Some(map) => SourceMapUtils::from_json(&map.to_json_string())?,
            None => {
                return Err(StitchError::build_with_context(
                    "No source map was produced for the transpiled module".to_string(),
                    ErrorContext::new().with_file(path.to_path_buf()),
                ))
            }
        };

        Ok(Transpiled {
            code: printed.code,
            map,
        })
    }
}

impl Default for OxcTypeScriptTranspiler {
    fn default() -> Self {
        Self::new()
    }
}

fn join_diagnostics<'a, I, D>(diagnostics: I) -> String
where
    I: Iterator<Item = &'a D>,
    D: std::fmt::Display + 'a,
{
    diagnostics
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
