use crate::utils::{Result, StitchError};
use base64::{engine::general_purpose, Engine as _};
use sourcemap::{SourceMap, SourceMapBuilder};

/// A single mapping entry, all positions zero based
#[derive(Debug, Clone, Copy)]
struct Mapping {
    generated_line: u32,
    generated_column: u32,
    source_index: u32,
    original_line: u32,
    original_column: u32,
}

/// Collects mappings while the bundle is being rendered
#[derive(Default)]
pub struct SourceMapGenerator {
    sources: Vec<String>,
    sources_content: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source file with its content
    pub fn add_source(&mut self, source_path: String, content: String) -> usize {
        let index = self.sources.len();
        self.sources.push(source_path);
        self.sources_content.push(content);
        index
    }

    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: usize,
        original_line: u32,
        original_column: u32,
    ) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_index: source_index as u32,
            original_line,
            original_column,
        });
    }

    /// Map `line_count` generated lines starting at `generated_start` onto the
    /// source line by line. Lines past the end of the source stick to its last line.
    pub fn map_lines(
        &mut self,
        source_index: usize,
        generated_start: u32,
        line_count: u32,
        source_line_count: u32,
    ) {
        let last_source_line = source_line_count.saturating_sub(1);
        for offset in 0..line_count {
            self.add_mapping(
                generated_start + offset,
                0,
                source_index,
                offset.min(last_source_line),
                0,
            );
        }
    }

    /// Compose with the map of a transform that reprinted the module: every
    /// token of `input` is moved down by `generated_start` lines and pointed
    /// at `source_index`.
    pub fn map_through(&mut self, source_index: usize, generated_start: u32, input: &SourceMap) {
        for token in input.tokens() {
            if token.get_source().is_none() {
                continue;
            }
            self.add_mapping(
                generated_start + token.get_dst_line(),
                token.get_dst_col(),
                source_index,
                token.get_src_line(),
                token.get_src_col(),
            );
        }
    }

    pub fn generate(&self, file_name: Option<&str>) -> SourceMap {
        let mut builder = SourceMapBuilder::new(file_name);

        let ids: Vec<u32> = self
            .sources
            .iter()
            .zip(&self.sources_content)
            .map(|(path, content)| {
                let id = builder.add_source(path);
                builder.set_source_contents(id, Some(content));
                id
            })
            .collect();

        let mut sorted = self.mappings.clone();
        sorted.sort_by_key(|m| (m.generated_line, m.generated_column));
        for mapping in sorted {
            builder.add_raw(
                mapping.generated_line,
                mapping.generated_column,
                mapping.original_line,
                mapping.original_column,
                ids.get(mapping.source_index as usize).copied(),
                None,
                false,
            );
        }

        builder.into_sourcemap()
    }
}

/// Source map utilities
pub struct SourceMapUtils;

impl SourceMapUtils {
    pub fn to_json(source_map: &SourceMap) -> Result<String> {
        let mut buffer = Vec::new();
        source_map
            .to_writer(&mut buffer)
            .map_err(|e| StitchError::build(format!("Failed to serialize source map: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| StitchError::build(format!("Failed to serialize source map: {}", e)))
    }

    /// Parse a map produced by another tool, e.g. the TypeScript printer
    pub fn from_json(json: &str) -> Result<SourceMap> {
        SourceMap::from_slice(json.as_bytes())
            .map_err(|e| StitchError::build(format!("Failed to read source map: {}", e)))
    }

    /// Generate inline source map (data URL)
    pub fn to_inline_data_url(source_map: &SourceMap) -> Result<String> {
        let json = Self::to_json(source_map)?;
        let encoded = general_purpose::STANDARD.encode(json.as_bytes());
        Ok(format!("data:application/json;charset=utf-8;base64,{}", encoded))
    }

    pub fn generate_external_comment(source_map_filename: &str) -> String {
        format!("//# sourceMappingURL={}", source_map_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_line(map: &SourceMap, line: u32, column: u32) -> Option<(String, u32)> {
        let token = map.lookup_token(line, column)?;
        if token.get_dst_line() != line {
            return None;
        }
        Some((token.get_source()?.to_string(), token.get_src_line()))
    }

    #[test]
    fn test_line_mappings_across_sources() {
        let mut generator = SourceMapGenerator::new();
        let a = generator.add_source("a.js".to_string(), "l1\nl2".to_string());
        let b = generator.add_source("b.js".to_string(), "l3".to_string());

        // generated line 0 is a wrapper line without a mapping
        generator.map_lines(a, 1, 2, 2);
        generator.map_lines(b, 3, 1, 1);

        let map = generator.generate(Some("bundle.js"));
        assert_eq!(map.get_file(), Some("bundle.js"));
        assert_eq!(map.sources().collect::<Vec<_>>(), vec!["a.js", "b.js"]);
        assert_eq!(source_line(&map, 0, 0), None);
        assert_eq!(source_line(&map, 1, 0), Some(("a.js".to_string(), 0)));
        assert_eq!(source_line(&map, 2, 0), Some(("a.js".to_string(), 1)));
        assert_eq!(source_line(&map, 3, 0), Some(("b.js".to_string(), 0)));
    }

    #[test]
    fn test_extra_generated_lines_clamp_to_last_source_line() {
        let mut generator = SourceMapGenerator::new();
        let a = generator.add_source("a.js".to_string(), "only".to_string());

        generator.map_lines(a, 0, 3, 1);

        let map = generator.generate(None);
        assert_eq!(source_line(&map, 2, 0), Some(("a.js".to_string(), 0)));
    }

    #[test]
    fn test_map_through_shifts_input_tokens() {
        let mut input = SourceMapBuilder::new(None);
        let src = input.add_source("a.ts");
        // printed line 0 came from line 6, printed line 1 from line 8
        input.add_raw(0, 0, 6, 0, Some(src), None, false);
        input.add_raw(1, 2, 8, 4, Some(src), None, false);
        let input = input.into_sourcemap();

        let mut generator = SourceMapGenerator::new();
        let a = generator.add_source("src/a.ts".to_string(), String::new());
        generator.map_through(a, 10, &input);

        let map = generator.generate(None);
        assert_eq!(source_line(&map, 10, 0), Some(("src/a.ts".to_string(), 6)));
        assert_eq!(source_line(&map, 11, 2), Some(("src/a.ts".to_string(), 8)));
    }

    #[test]
    fn test_json_shape() {
        let mut generator = SourceMapGenerator::new();
        generator.add_source("src/a.ts".to_string(), "let a = 1;".to_string());

        let json = SourceMapUtils::to_json(&generator.generate(Some("lib.es.js"))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["sourcesContent"][0], "let a = 1;");
        assert_eq!(value["file"], "lib.es.js");

        let parsed = SourceMapUtils::from_json(&json).unwrap();
        assert_eq!(parsed.get_source(0), Some("src/a.ts"));
    }

    #[test]
    fn test_inline_data_url_and_comment() {
        let map = SourceMapGenerator::new().generate(None);
        let url = SourceMapUtils::to_inline_data_url(&map).unwrap();
        assert!(url.starts_with("data:application/json;charset=utf-8;base64,"));

        assert_eq!(
            SourceMapUtils::generate_external_comment("lib.es.js.map"),
            "//# sourceMappingURL=lib.es.js.map"
        );
    }
}
