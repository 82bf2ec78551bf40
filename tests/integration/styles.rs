use std::error::Error;

use assetdag::tasks::style;
use assetdag::types::OutputStyle;
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;
use assetdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn style_project() -> Project {
    let project = Project::new();
    project
        .write("src/css/main.scss", "@import \"1-base/b\";\nbody { margin: 0; }\n")
        .write("src/css/1-base/_b.scss", "$accent: red;\na { color: $accent; }\n")
        .write("src/css/_shared.scss", "p { margin: 0; }\n");
    project
}

#[tokio::test]
async fn partials_are_inlined_and_never_emitted() -> TestResult {
    init_tracing();
    let project = style_project();
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = style::run(&h.ctx).await?;
    assert!(report.is_clean(), "errors: {:?}", report.errors);

    assert_eq!(project.files_under("dist/css"), vec!["main.css", "main.css.map"]);
    let css = project.read("dist/css/main.css");
    assert!(css.contains("a{color:red}"), "css: {css}");
    assert!(css.contains("body{margin:0}"));
    assert!(css.trim_end().ends_with("/*# sourceMappingURL=main.css.map */"));
    Ok(())
}

#[tokio::test]
async fn editing_a_partial_changes_the_entry_output() -> TestResult {
    init_tracing();
    let project = style_project();
    let h = project.harness(ConfigFileBuilder::offline().build());

    style::run(&h.ctx).await?;
    project.write("src/css/1-base/_b.scss", "a { color: blue; }\n");
    style::run(&h.ctx).await?;

    let css = project.read("dist/css/main.css");
    assert!(css.contains("a{color:blue}"), "css: {css}");
    assert!(!css.contains("red"));
    Ok(())
}

#[tokio::test]
async fn source_map_lists_every_loaded_stylesheet() -> TestResult {
    let project = style_project();
    let h = project.harness(ConfigFileBuilder::offline().build());

    style::run(&h.ctx).await?;

    let map: serde_json::Value = serde_json::from_str(&project.read("dist/css/main.css.map"))?;
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "main.css");
    let sources: Vec<&str> = map["sources"]
        .as_array()
        .ok_or("sources is an array")?
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(sources, vec!["/src/css/main.scss", "/src/css/1-base/_b.scss"]);
    assert_eq!(map["sourcesContent"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn maps_can_be_disabled_and_output_expanded() -> TestResult {
    let project = style_project();
    let cfg = ConfigFileBuilder::offline()
        .source_map(false)
        .output_style(OutputStyle::Expanded)
        .build();
    let h = project.harness(cfg);

    style::run(&h.ctx).await?;

    assert_eq!(project.files_under("dist/css"), vec!["main.css"]);
    let css = project.read("dist/css/main.css");
    assert!(css.contains("color: red;"), "css: {css}");
    assert!(!css.contains("sourceMappingURL"));
    Ok(())
}

#[tokio::test]
async fn postprocess_filters_run_in_order() -> TestResult {
    let project = style_project();
    let cfg = ConfigFileBuilder::offline()
        .source_map(false)
        .postprocess("sed 's/red/green/'")
        .postprocess("tr 'a-z' 'A-Z'")
        .build();
    let h = project.harness(cfg);

    let report = style::run(&h.ctx).await?;
    assert!(report.is_clean(), "errors: {:?}", report.errors);

    let css = project.read("dist/css/main.css");
    assert!(css.contains("COLOR:GREEN"), "css: {css}");
    Ok(())
}

#[tokio::test]
async fn compile_error_is_reported_per_file_and_others_still_build() -> TestResult {
    let project = style_project();
    project.write("src/css/broken.scss", "a { color: $undefined; }\n");
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = style::run(&h.ctx).await?;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].path.ends_with("broken.scss"));
    assert!(project.exists("dist/css/main.css"));
    assert!(!project.exists("dist/css/broken.css"));
    Ok(())
}

#[tokio::test]
async fn missing_style_directory_fails_the_task() {
    let project = Project::new();
    project.mkdir("src");
    let h = project.harness(ConfigFileBuilder::offline().build());

    assert!(style::run(&h.ctx).await.is_err());
}
