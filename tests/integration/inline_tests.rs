use std::path::Path;
use std::sync::Arc;
use stitch::core::models::BuildConfig;
use stitch::core::plugin::Plugin;
use stitch::core::services::PipelineBuildService;
use stitch::infrastructure::TokioFileSystemService;
use stitch::plugins::{InlineRequirePlugin, TypeScriptPlugin};
use stitch::utils::StitchError;

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn config(root: &Path) -> BuildConfig {
    let mut config = BuildConfig::for_root(root.to_path_buf());
    config
        .alias
        .insert("core/".to_string(), "app/scripts/modules/core/".to_string());
    config.icon_dir = root.join("lib");
    config
}

async fn inline(root: &Path, importer: &str, code: &str) -> stitch::Result<String> {
    let service = PipelineBuildService::new(Arc::new(TokioFileSystemService));
    let context = service.create_context(&config(root)).await?;

    let output = InlineRequirePlugin::new()
        .transform(code, &root.join(importer), &context)
        .await?;
    Ok(output.unwrap_or_else(|| code.to_string()))
}

#[tokio::test]
async fn test_aliased_template_is_inlined() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "app/scripts/modules/core/widgets/button.html", "<div>  Hi  </div>");

    let code = inline(
        root,
        "app/scripts/modules/pipelines/foo.ts",
        "const template = require('core/widgets/button.html');",
    )
    .await
    .unwrap();

    assert_eq!(code, r#"const template = "<div>Hi</div>";"#);
}

#[tokio::test]
async fn test_relative_template_is_inlined() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "src/stages/bake.html", "<p>\n  bake\n</p>\n");

    let code = inline(root, "src/stages/bake.js", "template: require(\"./bake.html\"),")
        .await
        .unwrap();

    assert_eq!(code, r#"template: "<p>bake</p>","#);
}

#[tokio::test]
async fn test_icons_resolve_against_the_scanned_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "lib/spinner.3f2a.svg", "<svg/>");
    write(root, "lib/close.svg", "<svg/>");

    let code = inline(
        root,
        "src/a.js",
        "const a = require('./icons/spinner.svg');\nconst b = require('./icons/close.svg');",
    )
    .await
    .unwrap();

    assert_eq!(
        code,
        "const a = require('./spinner.3f2a.svg');\nconst b = require('./close.svg');"
    );
}

#[tokio::test]
async fn test_missing_icon_is_a_descriptive_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();

    let err = inline(root, "src/a.js", "require('./icons/missing.svg')")
        .await
        .unwrap_err();

    assert!(matches!(err, StitchError::IconNotFound { .. }));
    assert!(err.to_string().contains("'missing'"));
}

#[tokio::test]
async fn test_module_names_across_aliases() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "app/scripts/modules/core/cache/cache.module.js",
        "module.exports = angular.module(\"spinnaker.core.cache\", [\n  require('./deck').name,\n]);\n",
    );

    let code = inline(
        root,
        "app/scripts/modules/pipelines/pipelines.module.js",
        "angular.module('spinnaker.pipelines', [\n  require('core/cache/cache.module').name,\n]);",
    )
    .await
    .unwrap();

    assert_eq!(
        code,
        "angular.module('spinnaker.pipelines', [\n  'spinnaker.core.cache',\n]);"
    );
}

#[tokio::test]
async fn test_missing_companion_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();

    let err = inline(root, "src/a.js", "require('./nowhere').name").await.unwrap_err();

    assert!(matches!(err, StitchError::Read { .. }));
}

#[tokio::test]
async fn test_inlining_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "src/view.html", "<span> x </span>");

    let source = "const v = require('./view.html');\nconst ver = require('root/version.json');";
    let once = inline(root, "src/a.js", source).await.unwrap();
    let twice = inline(root, "src/a.js", &once).await.unwrap();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_typescript_then_inline() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "src/panel.html", "<section>\n  panel\n</section>");

    let service = PipelineBuildService::new(Arc::new(TokioFileSystemService));
    let context = service.create_context(&config(root)).await.unwrap();
    let importer = root.join("src/panel.ts");

    let transpiled = TypeScriptPlugin::new()
        .transform(
            "export const panel: string = require(\"./panel.html\");",
            &importer,
            &context,
        )
        .await
        .unwrap()
        .unwrap();
    let inlined = InlineRequirePlugin::new()
        .transform(&transpiled, &importer, &context)
        .await
        .unwrap()
        .unwrap();

    assert!(inlined.contains(r#"export const panel = "<section>panel</section>";"#));
}
