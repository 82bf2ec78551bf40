use std::error::Error;

use assetdag::tasks::lint;
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;

type TestResult = Result<(), Box<dyn Error>>;

fn lint_project() -> Project {
    let project = Project::new();
    project
        .write("src/css/main.scss", "a {}")
        .write("src/css/1-base/_b.scss", "b {}")
        .write("src/css/1-plugins/slick.scss", "c {}")
        .write("src/js/main.js", "1;")
        .write("src/js/plugins/aos.js", "2;");
    project
}

#[tokio::test]
async fn linter_receives_relative_paths_without_excluded_files() -> TestResult {
    let project = lint_project();
    let cfg = ConfigFileBuilder::offline()
        .style_lint("echo {files} > style-lint.txt", true)
        .script_lint("echo {files} > script-lint.txt", true)
        .build();
    let h = project.harness(cfg);

    lint::style(&h.ctx).await?;
    lint::script(&h.ctx).await?;

    assert_eq!(
        project.read("style-lint.txt").trim(),
        "src/css/1-base/_b.scss src/css/main.scss"
    );
    assert_eq!(project.read("script-lint.txt").trim(), "src/js/main.js");
    Ok(())
}

#[tokio::test]
async fn script_lint_fails_the_task_by_default() {
    let project = lint_project();
    let cfg = ConfigFileBuilder::new()
        .script_lint("false {files}", true)
        .build();
    let h = project.harness(cfg);

    let err = lint::script(&h.ctx).await.unwrap_err();
    assert!(format!("{err:#}").contains("lint-script"), "{err:#}");
}

#[tokio::test]
async fn style_lint_only_warns_by_default() -> TestResult {
    let project = lint_project();
    let cfg = ConfigFileBuilder::new()
        .style_lint("false {files}", false)
        .build();
    let h = project.harness(cfg);

    lint::style(&h.ctx).await?;
    Ok(())
}

#[tokio::test]
async fn nothing_to_lint_skips_the_command() -> TestResult {
    let project = Project::new();
    project.mkdir("src/css");
    let cfg = ConfigFileBuilder::offline()
        .style_lint("touch ran.txt {files}", true)
        .build();
    let h = project.harness(cfg);

    lint::style(&h.ctx).await?;
    assert!(!project.exists("ran.txt"));
    Ok(())
}

#[tokio::test]
async fn missing_lint_directory_fails() {
    let project = Project::new();
    let h = project.harness(ConfigFileBuilder::offline().build());

    assert!(lint::script(&h.ctx).await.is_err());
}
