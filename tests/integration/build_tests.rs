use std::path::{Path, PathBuf};
use std::sync::Arc;
use stitch::core::interfaces::BuildService;
use stitch::core::models::{BuildConfig, OutputFormat, StyleMode};
use stitch::core::services::PipelineBuildService;
use stitch::infrastructure::TokioFileSystemService;
use stitch::plugins::default_plugins;
use stitch::utils::{BuildUI, CliOverrides, ConfigLoader, StitchError};

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/angular-project")
}

fn build_service() -> PipelineBuildService {
    PipelineBuildService::new(Arc::new(TokioFileSystemService))
        .with_plugins(default_plugins(false))
        .with_ui(BuildUI::quiet())
}

/// Fixture config with the output redirected into `out_dir`
fn fixture_config(out_dir: &Path, overrides: CliOverrides) -> BuildConfig {
    let root = fixture_root();
    let file_config = ConfigLoader::load_from_file(&root).unwrap();
    let overrides = CliOverrides {
        file: Some(out_dir.join("lib.es.js").to_string_lossy().to_string()),
        ..overrides
    };
    ConfigLoader::merge_with_cli(file_config, root, overrides).unwrap()
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[tokio::test]
async fn test_es_bundle_of_fixture_project() {
    let out_dir = tempfile::tempdir().unwrap();
    let config = fixture_config(out_dir.path(), CliOverrides::default());

    let result = build_service().build(&config).await.unwrap();

    assert!(result.success);
    assert_eq!(result.modules_processed, 4);
    assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
    assert!(result.externals.contains(&"angular".to_string()));
    assert!(result.externals.contains(&"./spinner.8a1b2c.svg".to_string()));

    let bundle = std::fs::read_to_string(out_dir.path().join("lib.es.js")).unwrap();
    assert!(bundle.starts_with("/*! core */\n"));
    assert!(bundle.contains(r#"import * as __stitch_ext_0 from "angular";"#));

    // build-time substitutions
    assert!(bundle.contains("'spinnaker.core.pipeline'"));
    assert!(bundle.contains("'spinnaker.core.widgets'"));
    assert!(bundle.contains(r#""<button class=\"btn btn-default\"> {{ vm.label }} </button>""#));
    assert!(bundle.contains("require('./spinner.8a1b2c.svg')"));
    assert!(bundle.contains(r#"{"version": "n/a","created": 1461949989729}"#));
    assert!(!bundle.contains("require('./pipeline/pipeline.module')"));
    assert!(!bundle.contains("root/version.json"));

    // type annotations are gone, stylesheet is injected
    assert!(!bundle.contains("interface Stage"));
    assert!(bundle.contains("document.createElement('style')"));
    assert!(bundle.contains(".core-variables"));
    assert!(!bundle.contains(".mixin"));

    assert!(bundle.contains("export var CORE_MODULE = __stitch_entry.CORE_MODULE;"));
    assert!(bundle.contains("export var formatStage = __stitch_entry.formatStage;"));
    assert!(bundle.trim_end().ends_with("//# sourceMappingURL=lib.es.js.map"));
}

#[tokio::test]
async fn test_source_map_is_written_next_to_bundle() {
    let out_dir = tempfile::tempdir().unwrap();
    let config = fixture_config(out_dir.path(), CliOverrides::default());

    build_service().build(&config).await.unwrap();

    let map = std::fs::read_to_string(out_dir.path().join("lib.es.js.map")).unwrap();
    let map: serde_json::Value = serde_json::from_str(&map).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "lib.es.js");

    let sources: Vec<&str> = map["sources"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(sources[0], "src/index.ts");
    assert!(sources.contains(&"src/pipeline/format.ts"));
    assert!(!map["mappings"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_cjs_bundle_without_source_map() {
    let out_dir = tempfile::tempdir().unwrap();
    let config = fixture_config(
        out_dir.path(),
        CliOverrides {
            format: Some(OutputFormat::Cjs),
            sourcemap: Some(false),
            ..Default::default()
        },
    );

    let result = build_service().build(&config).await.unwrap();

    assert_eq!(result.output_files.len(), 1);
    let bundle = std::fs::read_to_string(out_dir.path().join("lib.es.js")).unwrap();
    assert!(bundle.contains("'use strict';"));
    assert!(bundle.contains("return require(specifier);"));
    assert!(bundle.trim_end().ends_with("module.exports = __stitch_require(0);"));
    assert!(!bundle.contains("sourceMappingURL"));
    assert!(!bundle.contains("import * as"));
    assert!(!out_dir.path().join("lib.es.js.map").exists());
}

#[tokio::test]
async fn test_extracted_styles() {
    let out_dir = tempfile::tempdir().unwrap();
    let config = fixture_config(
        out_dir.path(),
        CliOverrides {
            styles: Some(StyleMode::Extract),
            ..Default::default()
        },
    );

    build_service().build(&config).await.unwrap();

    let css = std::fs::read_to_string(out_dir.path().join("lib.es.css")).unwrap();
    assert!(css.contains(".core-variables"));
    assert!(css.contains(".app"));

    let bundle = std::fs::read_to_string(out_dir.path().join("lib.es.js")).unwrap();
    assert!(!bundle.contains("document.createElement('style')"));
}

#[tokio::test]
async fn test_unchanged_inputs_give_identical_output() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let first = build_service()
        .build(&fixture_config(first_dir.path(), CliOverrides::default()))
        .await
        .unwrap();
    let second = build_service()
        .build(&fixture_config(second_dir.path(), CliOverrides::default()))
        .await
        .unwrap();

    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(
        std::fs::read_to_string(first_dir.path().join("lib.es.js")).unwrap(),
        std::fs::read_to_string(second_dir.path().join("lib.es.js")).unwrap()
    );
}

#[tokio::test]
async fn test_missing_template_aborts_without_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "src/index.ts",
        "export const template: string = require('core/widgets/missing.html');\n",
    );

    let mut config = BuildConfig::for_root(root.to_path_buf());
    config
        .alias
        .insert("core/".to_string(), "app/scripts/modules/core/".to_string());

    let err = build_service().build(&config).await.unwrap_err();

    assert!(matches!(err, StitchError::UnresolvedTemplate { .. }));
    let message = err.to_string();
    assert!(message.contains("'core/widgets/missing.html'"));
    assert!(message.contains("alias resolved: app/scripts/modules/core/widgets/missing.html"));
    assert!(message.ends_with("doesn't exist, and therefore an inline substitution can't be performed!"));
    assert!(!config.output.file.exists());
}

#[tokio::test]
async fn test_falsey_registration_aborts_build() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "src/index.js",
        "import { helpers } from './helpers';\nexport default angular.module('app', [helpers.missing]);\n",
    );
    write(
        root,
        "src/helpers.js",
        "export const helpers = {};\nangular.module('app.helpers', ['ng', undefined]);\n",
    );

    let mut config = BuildConfig::for_root(root.to_path_buf());
    config.entry = root.join("src/index.js");

    let err = build_service().build(&config).await.unwrap_err();

    assert!(matches!(
        err,
        StitchError::FalseyDependency { ref module, .. } if module == "app.helpers"
    ));
}

#[tokio::test]
async fn test_json_and_commonjs_modules() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "src/index.js",
        "const settings = require('./settings.json');\nconst util = require('./util');\nmodule.exports = { settings, util };\n",
    );
    write(root, "src/settings.json", "{ \"retries\": 3 }\n");
    write(root, "src/util.js", "module.exports = function util() {};\n");

    let mut config = BuildConfig::for_root(root.to_path_buf());
    config.entry = root.join("src/index.js");

    let result = build_service().build(&config).await.unwrap();
    assert_eq!(result.modules_processed, 3);

    let bundle = std::fs::read_to_string(&config.output.file).unwrap();
    assert!(bundle.contains("const settings = __stitch_require(1);"));
    assert!(bundle.contains("const util = __stitch_require(2);"));
    assert!(bundle.contains(r#"module.exports = { "retries": 3 };"#));
    // a CommonJS entry becomes the default export of an es bundle
    assert!(bundle.contains("export default __stitch_entry;"));
}

#[tokio::test]
async fn test_typescript_lines_map_back_to_their_source() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "src/index.ts",
        "// header comment\n\ninterface Stage {\n  name: string;\n}\ntype Id = string;\n\nexport const marker = 1;\n",
    );

    let config = BuildConfig::for_root(root.to_path_buf());
    build_service().build(&config).await.unwrap();

    let bundle = std::fs::read_to_string(&config.output.file).unwrap();
    let line = bundle
        .lines()
        .position(|l| l.contains("const marker = 1;"))
        .unwrap() as u32;

    let map = sourcemap::SourceMap::from_slice(
        &std::fs::read(config.source_map_path()).unwrap(),
    )
    .unwrap();
    let token = map.lookup_token(line, 10).unwrap();
    assert_eq!(token.get_dst_line(), line);
    assert_eq!(token.get_source(), Some("src/index.ts"));
    assert_eq!(token.get_src_line(), 7);
}
