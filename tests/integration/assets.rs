use std::error::Error;

use assetdag::tasks::{clean, copy, image};
use assetdag_test_utils::builders::ConfigFileBuilder;
use assetdag_test_utils::fixture::Project;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn clean_empties_output_and_is_idempotent() -> TestResult {
    let project = Project::new();
    project
        .write("dist/index.html", "<html></html>")
        .write("dist/css/main.css", "a{}")
        .write("src/index.html", "keep me");
    let h = project.harness(ConfigFileBuilder::offline().build());

    clean::run(&h.ctx).await?;
    assert!(project.exists("dist"));
    assert!(project.files_under("dist").is_empty());
    assert!(project.exists("src/index.html"));

    clean::run(&h.ctx).await?;
    assert!(project.files_under("dist").is_empty());
    Ok(())
}

#[tokio::test]
async fn clean_without_output_directory_is_a_no_op() -> TestResult {
    let project = Project::new();
    assert_eq!(clean::empty_dir(&project.path("dist")).await?, 0);
    Ok(())
}

#[tokio::test]
async fn fonts_are_copied_with_their_layout() -> TestResult {
    let project = Project::new();
    project
        .write("src/fonts/inter/inter.woff2", "woff2")
        .write("src/fonts/icons.eot", "eot");
    let h = project.harness(ConfigFileBuilder::offline().build());

    let report = copy::fonts(&h.ctx).await?;

    assert_eq!(report.written.len(), 2);
    assert_eq!(
        project.files_under("dist/fonts"),
        vec!["icons.eot", "inter/inter.woff2"]
    );
    assert_eq!(project.read("dist/fonts/inter/inter.woff2"), "woff2");
    Ok(())
}

#[tokio::test]
async fn vendor_scripts_are_copied_unchanged() -> TestResult {
    let project = Project::new();
    project.write("src/js/plugins/aos.js", "/* aos */");
    let h = project.harness(ConfigFileBuilder::offline().build());

    copy::vendor_scripts(&h.ctx).await?;

    assert_eq!(project.read("dist/js/plugins/aos.js"), "/* aos */");
    Ok(())
}

#[tokio::test]
async fn images_are_copied_then_optimised_by_extension() -> TestResult {
    let project = Project::new();
    project
        .write("src/img/logo.svg", "<svg>  </svg>")
        .write("src/img/photos/team.png", "png")
        .write("src/img/readme.txt", "not an image");
    let cfg = ConfigFileBuilder::offline()
        .optimizer("svg", "sed -i.bak 's/  //' {output} && rm {output}.bak")
        .build();
    let h = project.harness(cfg);

    let report = image::run(&h.ctx).await?;
    assert!(report.is_clean(), "errors: {:?}", report.errors);

    assert_eq!(
        project.files_under("dist/img"),
        vec!["logo.svg", "photos/team.png"]
    );
    assert_eq!(project.read("dist/img/logo.svg"), "<svg></svg>");
    assert_eq!(project.read("dist/img/photos/team.png"), "png");
    Ok(())
}

#[tokio::test]
async fn failing_optimiser_keeps_the_plain_copy() -> TestResult {
    let project = Project::new();
    project.write("src/img/logo.svg", "<svg/>");
    let cfg = ConfigFileBuilder::offline()
        .optimizer("svg", "false {output}")
        .build();
    let h = project.harness(cfg);

    let report = image::run(&h.ctx).await?;

    assert_eq!(report.errors.len(), 1);
    assert_eq!(project.read("dist/img/logo.svg"), "<svg/>");
    Ok(())
}
