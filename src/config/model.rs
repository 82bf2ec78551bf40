// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{AssetCategory, OutputStyle, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from `Assetdag.toml`, before validation.
///
/// ```toml
/// [dirs]
/// src = "src"
/// dest = "dist"
///
/// [paths.style]
/// source = ["src/css/*.scss"]
/// watch = ["src/css/**/*.scss"]
///
/// [serve]
/// port = 8000
/// ```
///
/// Every section is optional; omitted values fall back to the layout the
/// build has always used (`src/` → `dist/`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub dirs: DirsSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub style: StyleSection,
    #[serde(default)]
    pub script: ScriptSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub serve: ServeSection,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub build: BuildSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (see `config::validate`) or [`ConfigFile::default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub dirs: DirsSection,
    pub paths: PathsSection,
    pub style: StyleSection,
    pub script: ScriptSection,
    pub images: ImagesSection,
    pub serve: ServeSection,
    pub watch: WatchSection,
    pub build: BuildSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            dirs: raw.dirs,
            paths: raw.paths,
            style: raw.style,
            script: raw.script,
            images: raw.images,
            serve: raw.serve,
            watch: raw.watch,
            build: raw.build,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[dirs]` section: source and output roots, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct DirsSection {
    #[serde(default = "default_src")]
    pub src: String,
    #[serde(default = "default_dest")]
    pub dest: String,
}

fn default_src() -> String {
    "src".to_string()
}

fn default_dest() -> String {
    "dist".to_string()
}

impl Default for DirsSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dest: default_dest(),
        }
    }
}

/// `[paths.<category>]` overrides. Any field left out keeps the default
/// derived from `[dirs]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPaths {
    #[serde(default)]
    pub source: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub watch: Option<Vec<String>>,
    #[serde(default)]
    pub dest: Option<String>,
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    #[serde(default)]
    pub style: CategoryPaths,
    #[serde(default)]
    pub script: CategoryPaths,
    #[serde(default)]
    pub vendor_script: CategoryPaths,
    #[serde(default)]
    pub template: CategoryPaths,
    #[serde(default)]
    pub image: CategoryPaths,
    #[serde(default)]
    pub font: CategoryPaths,
}

impl PathsSection {
    pub fn get(&self, category: AssetCategory) -> &CategoryPaths {
        match category {
            AssetCategory::Style => &self.style,
            AssetCategory::Script => &self.script,
            AssetCategory::VendorScript => &self.vendor_script,
            AssetCategory::Template => &self.template,
            AssetCategory::Image => &self.image,
            AssetCategory::Font => &self.font,
        }
    }
}

/// `[style]` section: SCSS compilation, post-processing and style linting.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleSection {
    #[serde(default)]
    pub output_style: OutputStyle,

    #[serde(default = "default_true")]
    pub source_map: bool,

    /// Filters applied to the compiled CSS, in order. Each command reads CSS
    /// on stdin and writes CSS on stdout (vendor prefixing lives here).
    #[serde(default)]
    pub postprocess: Vec<String>,

    #[serde(default = "default_style_lint_command")]
    pub lint_command: String,

    #[serde(default)]
    pub lint_source: Option<Vec<String>>,

    #[serde(default)]
    pub lint_exclude: Option<Vec<String>>,

    /// Style lint only warns unless this is set.
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_true() -> bool {
    true
}

fn default_style_lint_command() -> String {
    "npx stylelint {files}".to_string()
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            output_style: OutputStyle::default(),
            source_map: true,
            postprocess: Vec::new(),
            lint_command: default_style_lint_command(),
            lint_source: None,
            lint_exclude: None,
            fail_on_error: false,
        }
    }
}

impl StyleSection {
    pub fn effective_lint_source(&self, dirs: &DirsSection) -> Vec<String> {
        self.lint_source
            .clone()
            .unwrap_or_else(|| vec![format!("{}/css/**/*.scss", dirs.src)])
    }

    pub fn effective_lint_exclude(&self, dirs: &DirsSection) -> Vec<String> {
        self.lint_exclude
            .clone()
            .unwrap_or_else(|| vec![format!("{}/css/1-plugins/**", dirs.src)])
    }
}

/// `[script]` section: per-entry bundling, the vendor bundle and script linting.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptSection {
    /// Bundler invocation per entry. Placeholders: `{entry}`, `{output}`, `{name}`.
    #[serde(default = "default_bundle_command")]
    pub bundle_command: String,

    /// Ordered vendor scripts concatenated into `vendor_output`.
    #[serde(default)]
    pub vendor_files: Option<Vec<String>>,

    #[serde(default = "default_vendor_output")]
    pub vendor_output: String,

    /// stdin→stdout minifier for the vendor bundle; empty disables it.
    #[serde(default = "default_minify_command")]
    pub minify_command: String,

    #[serde(default = "default_script_lint_command")]
    pub lint_command: String,

    #[serde(default)]
    pub lint_source: Option<Vec<String>>,

    #[serde(default)]
    pub lint_exclude: Option<Vec<String>>,

    #[serde(default = "default_true")]
    pub fail_on_error: bool,
}

fn default_bundle_command() -> String {
    "npx esbuild {entry} --bundle --sourcemap --target=es2015 --outfile={output}".to_string()
}

fn default_vendor_output() -> String {
    "vendors.min.js".to_string()
}

fn default_minify_command() -> String {
    "npx terser --compress --mangle".to_string()
}

fn default_script_lint_command() -> String {
    "npx eslint {files}".to_string()
}

impl Default for ScriptSection {
    fn default() -> Self {
        Self {
            bundle_command: default_bundle_command(),
            vendor_files: None,
            vendor_output: default_vendor_output(),
            minify_command: default_minify_command(),
            lint_command: default_script_lint_command(),
            lint_source: None,
            lint_exclude: None,
            fail_on_error: true,
        }
    }
}

impl ScriptSection {
    pub fn effective_vendor_files(&self, dirs: &DirsSection) -> Vec<String> {
        if let Some(files) = &self.vendor_files {
            return files.clone();
        }
        [
            "jquery.min.js",
            "popper.js",
            "bootstrap.min.js",
            "aos.js",
            "parsley.min.js",
            "slick.min.js",
            "magnific-popup.min.js",
        ]
        .iter()
        .map(|f| format!("{}/js/plugins/{f}", dirs.src))
        .collect()
    }

    pub fn effective_lint_source(&self, dirs: &DirsSection) -> Vec<String> {
        self.lint_source
            .clone()
            .unwrap_or_else(|| vec![format!("{}/js/**/*.js", dirs.src)])
    }

    pub fn effective_lint_exclude(&self, dirs: &DirsSection) -> Vec<String> {
        self.lint_exclude
            .clone()
            .unwrap_or_else(|| vec![format!("{}/js/plugins/**", dirs.src)])
    }

    /// `None` when minification is disabled.
    pub fn minifier(&self) -> Option<&str> {
        let cmd = self.minify_command.trim();
        if cmd.is_empty() { None } else { Some(cmd) }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesSection {
    /// Optimiser command per lowercase extension, run in place on the copied
    /// file. Placeholders: `{input}` (source), `{output}` (destination).
    #[serde(default = "default_optimizers")]
    pub optimizers: BTreeMap<String, String>,
}

fn default_optimizers() -> BTreeMap<String, String> {
    let jpeg = "jpegtran -copy none -progressive -optimize -outfile {output} {input}";
    BTreeMap::from([
        ("gif".to_string(), "gifsicle --batch --interlace {output}".to_string()),
        ("jpeg".to_string(), jpeg.to_string()),
        ("jpg".to_string(), jpeg.to_string()),
        ("png".to_string(), "optipng -quiet -o5 {output}".to_string()),
        ("svg".to_string(), "svgo --quiet {output}".to_string()),
    ])
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            optimizers: default_optimizers(),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Open the served site in a browser once the server is up.
    #[serde(default = "default_true")]
    pub open: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: true,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Coalesce triggers for the same task within this window. `0` keeps
    /// every change event as its own trigger.
    #[serde(default)]
    pub debounce_ms: u64,

    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Make both lint tasks prerequisites of `build`.
    #[serde(default)]
    pub quality_gate: bool,
}
