use std::error::Error;
use std::sync::Arc;

use tokio::time::{Duration, timeout};

use assetdag::config::ConfigFile;
use assetdag::dag::TaskGraph;
use assetdag::engine::RuntimeReport;
use assetdag::execute;
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;
use assetdag_test_utils::init_tracing;
use assetdag_test_utils::notifier::RecordingNotifier;

type TestResult = Result<(), Box<dyn Error>>;

fn full_site() -> Project {
    let project = Project::new();
    project
        .write("src/css/main.scss", "@import \"b\";\nbody { margin: 0; }\n")
        .write("src/css/_b.scss", "a { color: red; }\n")
        .write("src/js/main.js", "console.log(1);\n")
        .write("src/js/plugins/jquery.js", "var $ = 1;")
        .write("src/index.html", "<html><body>{{ page }}</body></html>")
        .write("src/img/logo.svg", "<svg/>")
        .write("src/fonts/inter.woff2", "font");
    project
}

fn offline() -> ConfigFile {
    ConfigFileBuilder::offline()
        .vendor_files(&["src/js/plugins/jquery.js"])
        .build()
}

async fn run(
    project: &Project,
    cfg: ConfigFile,
    tasks: &[&str],
    notifier: Arc<RecordingNotifier>,
) -> Result<RuntimeReport, Box<dyn Error>> {
    let graph = TaskGraph::builtin(&cfg.build)?;
    let tasks = tasks.iter().map(|t| t.to_string()).collect();
    let report = timeout(
        Duration::from_secs(20),
        execute(project.root().to_path_buf(), cfg, graph, tasks, notifier),
    )
    .await??;
    Ok(report)
}

#[tokio::test]
async fn build_produces_every_output() -> TestResult {
    init_tracing();
    let project = full_site();
    let notifier = Arc::new(RecordingNotifier::new());

    let report = run(&project, offline(), &["build"], notifier.clone()).await?;

    assert!(report.failed_manual_tasks().is_empty(), "{report:?}");
    assert!(notifier.is_empty(), "{:?}", notifier.messages());
    assert_eq!(
        project.files_under("dist"),
        vec![
            "css/main.css",
            "css/main.css.map",
            "fonts/inter.woff2",
            "img/logo.svg",
            "index.html",
            "js/main.js",
            "js/main.js.map",
            "js/vendors.min.js",
        ]
    );
    assert_eq!(project.read("dist/index.html"), "<html><body>index.html</body></html>");
    Ok(())
}

#[tokio::test]
async fn clean_then_build_in_one_invocation() -> TestResult {
    let project = full_site();
    project.write("dist/stale.txt", "old");

    let report = run(
        &project,
        offline(),
        &["clean"],
        Arc::new(RecordingNotifier::new()),
    )
    .await?;
    assert!(report.failed_manual_tasks().is_empty());
    assert!(!project.exists("dist/stale.txt"));

    run(
        &project,
        offline(),
        &["styles", "templates"],
        Arc::new(RecordingNotifier::new()),
    )
    .await?;
    assert_eq!(
        project.files_under("dist"),
        vec!["css/main.css", "css/main.css.map", "index.html"]
    );
    Ok(())
}

#[tokio::test]
async fn quality_gate_failure_fails_build_but_not_independent_tasks() -> TestResult {
    let project = full_site();
    let cfg = ConfigFileBuilder::offline()
        .vendor_files(&["src/js/plugins/jquery.js"])
        .script_lint("false {files}", true)
        .quality_gate(true)
        .build();

    let report = run(&project, cfg, &["build"], Arc::new(RecordingNotifier::new())).await?;

    let mut failed = report.failed_manual_tasks();
    failed.sort();
    assert_eq!(failed, vec!["build", "lint-script"]);
    assert!(project.exists("dist/css/main.css"));
    Ok(())
}

#[tokio::test]
async fn per_file_errors_reach_the_notifier_without_failing_the_task() -> TestResult {
    let project = full_site();
    project.write("src/css/broken.scss", "a { color: $nope; }");
    let notifier = Arc::new(RecordingNotifier::new());

    let report = run(&project, offline(), &["sass"], notifier.clone()).await?;

    assert!(report.failed_manual_tasks().is_empty());
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.starts_with("sass: "), "{messages:?}");
    assert!(messages[0].0.ends_with("broken.scss"));
    Ok(())
}

#[tokio::test]
async fn missing_source_directory_fails_the_task() -> TestResult {
    let project = Project::new();
    project.write("src/index.html", "<p>only templates</p>");

    let report = run(
        &project,
        offline(),
        &["fonts"],
        Arc::new(RecordingNotifier::new()),
    )
    .await?;

    assert_eq!(report.failed_manual_tasks(), vec!["fonts".to_string()]);
    Ok(())
}

#[tokio::test]
async fn editing_a_partial_while_serving_recompiles_the_importing_sheet() -> TestResult {
    init_tracing();
    let project = full_site();
    let cfg = offline();
    let graph = TaskGraph::builtin(&cfg.build)?;
    let session = execute(
        project.root().to_path_buf(),
        cfg,
        graph,
        vec!["default".to_string()],
        Arc::new(RecordingNotifier::new()),
    );

    // The watcher only starts once `build` is done and `serve` is listening,
    // so keep rewriting the partial until the change shows up.
    let edit_until_recompiled = async {
        loop {
            let built = std::fs::read_to_string(project.path("dist/css/main.css"))
                .unwrap_or_default();
            if built.contains("blue") {
                return built;
            }
            if !built.is_empty() {
                project.write("src/css/_b.scss", "a { color: blue; }\n");
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    let css = tokio::select! {
        css = timeout(Duration::from_secs(20), edit_until_recompiled) => css?,
        report = session => panic!("session ended early: {report:?}"),
    };

    assert!(!css.contains("red"), "{css}");
    assert!(!project.exists("dist/css/_b.css"));
    Ok(())
}
