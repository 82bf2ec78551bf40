#![allow(dead_code)]

use assetdag::config::{CategoryPaths, ConfigFile, RawConfigFile};
use assetdag::errors::Result;
use assetdag::types::{AssetCategory, OutputStyle, TriggerWhileRunningBehaviour};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Goes through the same validation as a config file on disk.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    /// Built-in defaults (external tools via `npx`).
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Defaults with every external tool replaced by plain shell commands,
    /// so builds run without node or image optimisers:
    /// - the "bundler" copies the entry and writes a `.map` next to it
    /// - vendor minification is disabled
    /// - both linters succeed
    /// - no image optimisers
    pub fn offline() -> Self {
        Self::new()
            .bundle_command("cp {entry} {output} && echo '{}' > {output}.map")
            .minify_command("")
            .style_lint("true {files}", false)
            .script_lint("true {files}", true)
            .no_optimizers()
            .serve("127.0.0.1", 0, false)
    }

    pub fn dirs(mut self, src: &str, dest: &str) -> Self {
        self.config.dirs.src = src.to_string();
        self.config.dirs.dest = dest.to_string();
        self
    }

    pub fn paths(mut self, category: AssetCategory, paths: CategoryPaths) -> Self {
        let slot = match category {
            AssetCategory::Style => &mut self.config.paths.style,
            AssetCategory::Script => &mut self.config.paths.script,
            AssetCategory::VendorScript => &mut self.config.paths.vendor_script,
            AssetCategory::Template => &mut self.config.paths.template,
            AssetCategory::Image => &mut self.config.paths.image,
            AssetCategory::Font => &mut self.config.paths.font,
        };
        *slot = paths;
        self
    }

    pub fn output_style(mut self, style: OutputStyle) -> Self {
        self.config.style.output_style = style;
        self
    }

    pub fn source_map(mut self, enabled: bool) -> Self {
        self.config.style.source_map = enabled;
        self
    }

    pub fn postprocess(mut self, cmd: &str) -> Self {
        self.config.style.postprocess.push(cmd.to_string());
        self
    }

    pub fn bundle_command(mut self, cmd: &str) -> Self {
        self.config.script.bundle_command = cmd.to_string();
        self
    }

    pub fn vendor_files(mut self, files: &[&str]) -> Self {
        self.config.script.vendor_files = Some(files.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn minify_command(mut self, cmd: &str) -> Self {
        self.config.script.minify_command = cmd.to_string();
        self
    }

    pub fn style_lint(mut self, cmd: &str, fail_on_error: bool) -> Self {
        self.config.style.lint_command = cmd.to_string();
        self.config.style.fail_on_error = fail_on_error;
        self
    }

    pub fn script_lint(mut self, cmd: &str, fail_on_error: bool) -> Self {
        self.config.script.lint_command = cmd.to_string();
        self.config.script.fail_on_error = fail_on_error;
        self
    }

    pub fn no_optimizers(mut self) -> Self {
        self.config.images.optimizers.clear();
        self
    }

    pub fn optimizer(mut self, ext: &str, cmd: &str) -> Self {
        self.config
            .images
            .optimizers
            .insert(ext.to_string(), cmd.to_string());
        self
    }

    pub fn quality_gate(mut self, enabled: bool) -> Self {
        self.config.build.quality_gate = enabled;
        self
    }

    pub fn serve(mut self, host: &str, port: u16, open: bool) -> Self {
        self.config.serve.host = host.to_string();
        self.config.serve.port = port;
        self.config.serve.open = open;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.watch.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
