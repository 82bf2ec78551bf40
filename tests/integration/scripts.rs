use std::error::Error;

use assetdag::config::CategoryPaths;
use assetdag::tasks::script;
use assetdag::types::AssetCategory;
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;
use assetdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn script_project() -> Project {
    let project = Project::new();
    project
        .write("src/js/main.js", "console.log('main');\n")
        .write("src/js/admin.js", "console.log('admin');\n")
        .write("src/js/modules/menu.js", "export const menu = 1;\n")
        .write("src/js/plugins/a.js", "var a = 1;")
        .write("src/js/plugins/b.js", "var b = 2;");
    project
}

#[tokio::test]
async fn each_entry_gets_its_own_bundle_and_map() -> TestResult {
    init_tracing();
    let project = script_project();
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = script::bundle(&h.ctx).await?;
    assert!(report.is_clean(), "errors: {:?}", report.errors);
    assert_eq!(
        report.written,
        vec![project.path("dist/js/admin.js"), project.path("dist/js/main.js")]
    );

    assert_eq!(
        project.files_under("dist/js"),
        vec!["admin.js", "admin.js.map", "main.js", "main.js.map"]
    );
    assert_eq!(project.read("dist/js/admin.js"), "console.log('admin');\n");
    Ok(())
}

#[tokio::test]
async fn vendor_plugins_are_never_entries() -> TestResult {
    let project = script_project();
    let cfg = ConfigFileBuilder::offline()
        .paths(
            AssetCategory::Script,
            CategoryPaths {
                source: Some(vec!["src/js/**/*.js".into()]),
                exclude: Some(vec![]),
                ..CategoryPaths::default()
            },
        )
        .build();
    let h = project.harness(cfg);

    let report = script::bundle(&h.ctx).await?;

    assert_eq!(report.skipped.len(), 2);
    assert!(project.exists("dist/js/menu.js"));
    assert!(!project.exists("dist/js/a.js"));
    Ok(())
}

#[tokio::test]
async fn bundler_failure_is_reported_per_entry() -> TestResult {
    let project = script_project();
    let cfg = ConfigFileBuilder::offline()
        .bundle_command("echo bad {entry} >&2 && false {output}")
        .build();
    let h = project.harness(cfg);

    let report = script::bundle(&h.ctx).await?;

    assert_eq!(report.errors.len(), 2);
    assert!(report.written.is_empty());
    assert!(report.errors[0].message.contains("bad"), "{:?}", report.errors);
    Ok(())
}

#[tokio::test]
async fn vendor_bundle_keeps_configured_order() -> TestResult {
    let project = script_project();
    let cfg = ConfigFileBuilder::offline()
        .vendor_files(&["src/js/plugins/b.js", "src/js/plugins/a.js"])
        .build();
    let h = project.harness(cfg);

    let report = script::vendor_bundle(&h.ctx).await?;
    assert!(report.is_clean(), "errors: {:?}", report.errors);
    assert_eq!(project.read("dist/js/vendors.min.js"), "var b = 2;\nvar a = 1;");

    // Running again produces the same file.
    script::vendor_bundle(&h.ctx).await?;
    assert_eq!(project.read("dist/js/vendors.min.js"), "var b = 2;\nvar a = 1;");
    Ok(())
}

#[tokio::test]
async fn missing_vendor_file_is_skipped_and_reported() -> TestResult {
    let project = script_project();
    let cfg = ConfigFileBuilder::offline()
        .vendor_files(&["src/js/plugins/a.js", "src/js/plugins/gone.js"])
        .build();
    let h = project.harness(cfg);

    let report = script::vendor_bundle(&h.ctx).await?;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].path.ends_with("gone.js"));
    assert_eq!(project.read("dist/js/vendors.min.js"), "var a = 1;");
    Ok(())
}

#[tokio::test]
async fn minifier_filters_the_concatenation() -> TestResult {
    let project = script_project();
    let cfg = ConfigFileBuilder::offline()
        .vendor_files(&["src/js/plugins/a.js", "src/js/plugins/b.js"])
        .minify_command("tr -d ' '")
        .build();
    let h = project.harness(cfg);

    script::vendor_bundle(&h.ctx).await?;
    assert_eq!(project.read("dist/js/vendors.min.js"), "vara=1;\nvarb=2;");
    Ok(())
}

#[tokio::test]
async fn failing_minifier_falls_back_to_plain_output() -> TestResult {
    let project = script_project();
    let cfg = ConfigFileBuilder::offline()
        .vendor_files(&["src/js/plugins/a.js"])
        .minify_command("cat >/dev/null; exit 3")
        .build();
    let h = project.harness(cfg);

    let report = script::vendor_bundle(&h.ctx).await?;

    assert_eq!(report.errors.len(), 1);
    assert_eq!(project.read("dist/js/vendors.min.js"), "var a = 1;");
    Ok(())
}
