use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use assetdag::tasks::template::{self, TemplateGraph, references};
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;
use assetdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn site() -> Project {
    let project = Project::new();
    project
        .write(
            "src/_layout.html",
            "<html><body>{% block body %}{% endblock %}<footer>{{ page }}</footer></body></html>",
        )
        .write("src/_partials/team.html", "<p>Team</p>")
        .write(
            "src/index.html",
            "{% extends \"_layout.html\" %}{% block body %}<h1>Home</h1>{% endblock %}",
        )
        .write(
            "src/about/index.html",
            "{% extends \"_layout.html\" %}{% block body %}{% include \"_partials/team.html\" %}{% endblock %}",
        );

    for rel in [
        "src/_layout.html",
        "src/_partials/team.html",
        "src/index.html",
        "src/about/index.html",
    ] {
        set_mtime(&project, rel, SystemTime::now() - Duration::from_secs(120));
    }
    project
}

fn set_mtime(project: &Project, rel: &str, at: SystemTime) {
    File::options()
        .write(true)
        .open(project.path(rel))
        .and_then(|f| f.set_modified(at))
        .expect("set mtime");
}

#[test]
fn references_cover_every_reference_tag() -> TestResult {
    let refs = references(
        r#"{% extends "base.html" %}
        {%- include 'nav.html' %}
        {% import "macros.html" as m %}
        {% from "forms.html" import field %}
        {{ "include 'not-a-tag.html'" }}"#,
    )?;

    assert_eq!(refs, vec!["base.html", "nav.html", "macros.html", "forms.html"]);
    Ok(())
}

#[test]
fn template_graph_follows_references_transitively() -> TestResult {
    let project = site();
    let src = project.path("src");
    let about = project.path("src/about/index.html");

    let graph = TemplateGraph::scan(&src, &[about.clone()])?;
    let closure = graph.closure(&about);

    let expected: Vec<PathBuf> = vec![
        project.path("src/_layout.html"),
        project.path("src/_partials/team.html"),
        about,
    ];
    assert_eq!(closure.into_iter().collect::<Vec<_>>(), expected);
    Ok(())
}

#[tokio::test]
async fn pages_render_with_layouts_and_fragments_are_skipped() -> TestResult {
    init_tracing();
    let project = site();
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = template::run(&h.ctx).await?;
    assert!(report.is_clean(), "errors: {:?}", report.errors);

    assert_eq!(project.files_under("dist"), vec!["about/index.html", "index.html"]);

    let home = project.read("dist/index.html");
    assert!(home.contains("<h1>Home</h1>"), "home: {home}");
    assert!(home.contains("<footer>index.html</footer>"));

    let about = project.read("dist/about/index.html");
    assert!(about.contains("<p>Team</p>"), "about: {about}");
    assert!(!about.contains("{%"));
    Ok(())
}

#[tokio::test]
async fn unchanged_pages_are_not_rebuilt() -> TestResult {
    let project = site();
    let h = project.harness(ConfigFileBuilder::offline().build());

    let first = template::run(&h.ctx).await?;
    assert_eq!(first.written.len(), 2);

    let second = template::run(&h.ctx).await?;
    assert!(second.written.is_empty(), "rebuilt: {:?}", second.written);
    Ok(())
}

#[tokio::test]
async fn editing_an_include_rebuilds_only_its_dependents() -> TestResult {
    let project = site();
    let h = project.harness(ConfigFileBuilder::offline().build());

    template::run(&h.ctx).await?;

    project.write("src/_partials/team.html", "<p>New team</p>");
    set_mtime(
        &project,
        "src/_partials/team.html",
        SystemTime::now() + Duration::from_secs(5),
    );

    let report = template::run(&h.ctx).await?;
    assert_eq!(report.written, vec![project.path("dist/about/index.html")]);
    assert!(report.skipped.contains(&project.path("src/index.html")));
    assert!(project.read("dist/about/index.html").contains("New team"));
    Ok(())
}

#[tokio::test]
async fn editing_the_layout_rebuilds_every_page() -> TestResult {
    let project = site();
    let h = project.harness(ConfigFileBuilder::offline().build());

    template::run(&h.ctx).await?;
    set_mtime(
        &project,
        "src/_layout.html",
        SystemTime::now() + Duration::from_secs(5),
    );

    let report = template::run(&h.ctx).await?;
    assert_eq!(report.written.len(), 2);
    Ok(())
}

#[tokio::test]
async fn render_error_is_reported_and_other_pages_still_render() -> TestResult {
    let project = site();
    project.write("src/broken.html", "{% include \"_missing.html\" %}");
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = template::run(&h.ctx).await?;

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, project.path("src/broken.html"));
    assert!(project.exists("dist/index.html"));
    assert!(!project.exists("dist/broken.html"));
    Ok(())
}

#[tokio::test]
async fn unreadable_page_is_reported_and_other_pages_still_render() -> TestResult {
    let project = site();
    std::fs::write(project.path("src/latin1.html"), b"<p>caf\xe9</p>")?;
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = template::run(&h.ctx).await?;

    assert_eq!(report.errors.len(), 1, "errors: {:?}", report.errors);
    assert_eq!(report.errors[0].path, project.path("src/latin1.html"));
    assert!(project.exists("dist/index.html"));
    assert!(project.exists("dist/about/index.html"));
    assert!(!project.exists("dist/latin1.html"));
    Ok(())
}

#[test]
fn template_graph_lists_unreadable_templates_without_failing() -> TestResult {
    let project = site();
    std::fs::write(project.path("src/latin1.html"), b"<p>caf\xe9</p>")?;
    let latin1 = project.path("src/latin1.html");
    let index = project.path("src/index.html");

    let graph = TemplateGraph::scan(&project.path("src"), &[latin1.clone(), index.clone()])?;

    assert_eq!(graph.unreadable().keys().collect::<Vec<_>>(), vec![&latin1]);
    assert!(graph.closure(&index).contains(&project.path("src/_layout.html")));
    Ok(())
}

#[tokio::test]
async fn include_with_the_same_mtime_as_the_output_is_rebuilt() -> TestResult {
    let project = site();
    let h = project.harness(ConfigFileBuilder::offline().build());

    template::run(&h.ctx).await?;
    let built = std::fs::metadata(project.path("dist/about/index.html"))?.modified()?;

    project.write("src/_partials/team.html", "<p>Same tick</p>");
    set_mtime(&project, "src/_partials/team.html", built);

    let report = template::run(&h.ctx).await?;
    assert_eq!(report.written, vec![project.path("dist/about/index.html")]);
    assert!(project.read("dist/about/index.html").contains("Same tick"));
    Ok(())
}
