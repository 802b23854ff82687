use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stitch::core::interfaces::CssProcessor;
use stitch::infrastructure::{
    LightningCssProcessor, ScssProcessor, StyleImportRewriter, StyleLoader, TokioFileSystemService,
};
use stitch::utils::{AliasTable, StitchError};

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn rewriter(root: &Path) -> StyleImportRewriter {
    let aliases: HashMap<String, String> =
        [("core/".to_string(), "app/scripts/modules/core/".to_string())]
            .into_iter()
            .collect();
    StyleImportRewriter::new(
        Arc::new(AliasTable::new(aliases, root.to_path_buf())),
        root.join("node_modules"),
    )
}

fn loader(root: &Path) -> StyleLoader {
    StyleLoader::new(Arc::new(TokioFileSystemService), rewriter(root), root.to_path_buf())
}

#[test]
fn test_aliased_tilde_import_is_rewritten() {
    let rewritten = rewriter(Path::new("/repo")).rewrite("@import \"~core/styles/base\";");

    assert_eq!(rewritten, "@import \"app/scripts/modules/core/styles/base\";");
}

#[test]
fn test_unaliased_tilde_import_points_into_node_modules() {
    let rewritten = rewriter(Path::new("/repo")).rewrite("@import '~bootstrap/less/variables';");

    assert_eq!(rewritten, "@import '/repo/node_modules/bootstrap/less/variables';");
}

#[test]
fn test_plain_imports_are_untouched() {
    let source = "@import './local';\n.a { color: red; }";

    assert_eq!(rewriter(Path::new("/repo")).rewrite(source), source);
}

#[tokio::test]
async fn test_nested_imports_are_rewritten_and_inlined() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "app/scripts/modules/core/styles/base.less", "@import '~theme/colors';\n.base { margin: 0; }\n");
    write(root, "node_modules/theme/colors.less", ".colors { color: blue; }\n");

    let entry = root.join("src/app.less");
    let css = loader(root)
        .load("@import \"~core/styles/base\";\n.app { color: red; }\n", &entry)
        .await
        .unwrap();

    let colors = css.find(".colors").unwrap();
    let base = css.find(".base").unwrap();
    let app = css.find(".app").unwrap();
    assert!(colors < base && base < app);
    assert!(!css.contains("@import"));
}

#[tokio::test]
async fn test_missing_import_names_the_importer() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    let entry = root.join("src/app.less");

    let err = loader(root)
        .load("@import '~core/styles/gone';", &entry)
        .await
        .unwrap_err();

    match err {
        StitchError::StyleImportNotFound { import, importer } => {
            assert_eq!(import, "app/scripts/modules/core/styles/gone");
            assert_eq!(importer, entry);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_scss_with_inlined_partial() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    write(root, "app/scripts/modules/core/styles/vars.scss", "$accent: #ff0000;\n");

    let entry = root.join("src/panel.scss");
    let source = loader(root)
        .load("@import '~core/styles/vars';\n.panel { .title { color: $accent; } }\n", &entry)
        .await
        .unwrap();

    let css = ScssProcessor::new(false)
        .process_css(&source, &PathBuf::from("src/panel.scss"))
        .await
        .unwrap();

    assert!(css.contains(".panel .title"));
    assert!(css.contains("red") || css.contains("#f00") || css.contains("#ff0000"));
}

#[tokio::test]
async fn test_minified_css() {
    let processor = LightningCssProcessor::new(true);

    let css = processor
        .process_css(".a {\n  color: red;\n}\n", Path::new("a.css"))
        .await
        .unwrap();

    assert_eq!(css.trim(), ".a{color:red}");
}
