// src/exec/command.rs

//! External tool invocation: placeholder substitution and shell execution.
//!
//! Commands come from config as templates such as
//! `npx esbuild {entry} --bundle --outfile={output}`. Placeholder values are
//! shell-quoted before substitution, then the line is run through
//! `sh -c` (or `cmd /C` on Windows) from the project root.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A command template with its placeholder values.
#[derive(Debug, Clone)]
pub struct CommandLine {
    template: String,
    vars: Vec<(String, String)>,
}

impl CommandLine {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            vars: Vec::new(),
        }
    }

    /// Bind `{key}` to a single quoted path.
    pub fn path(mut self, key: &str, value: &Path) -> Self {
        self.vars
            .push((key.to_string(), shell_quote(&value.to_string_lossy())));
        self
    }

    /// Bind `{key}` to a single quoted string.
    pub fn arg(mut self, key: &str, value: &str) -> Self {
        self.vars.push((key.to_string(), shell_quote(value)));
        self
    }

    /// Bind `{key}` to a space separated list of quoted paths.
    pub fn paths<P: AsRef<Path>>(mut self, key: &str, values: &[P]) -> Self {
        let joined = values
            .iter()
            .map(|p| shell_quote(&p.as_ref().to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");
        self.vars.push((key.to_string(), joined));
        self
    }

    /// The command line with every bound placeholder substituted.
    pub fn render(&self) -> String {
        let mut line = self.template.clone();
        for (key, value) in &self.vars {
            line = line.replace(&format!("{{{key}}}"), value);
        }
        line
    }
}

/// Quote a value for the platform shell.
pub fn shell_quote(value: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@".contains(c))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout and stderr joined, trimmed, for reports.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

fn shell(line: &str, cwd: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    };
    cmd.current_dir(cwd).kill_on_drop(true);
    cmd
}

/// Run a rendered command line to completion, capturing its output.
///
/// A non-zero exit is reported through [`CommandOutput::success`]; only a
/// failure to spawn is an error.
pub async fn run_shell(line: &str, cwd: &Path) -> Result<CommandOutput> {
    debug!(cmd = %line, "running external command");

    let output = shell(line, cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("spawning `{line}`"))?;

    Ok(CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Pipe `input` through a stdin→stdout filter command and return its stdout.
///
/// Fails if the command exits unsuccessfully.
pub async fn run_filter(line: &str, cwd: &Path, input: &[u8]) -> Result<Vec<u8>> {
    debug!(cmd = %line, bytes = input.len(), "running filter command");

    let mut child = shell(line, cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning `{line}`"))?;

    let mut stdin = child
        .stdin
        .take()
        .context("filter process has no stdin handle")?;
    let data = input.to_vec();
    // Written concurrently: a streaming filter blocks once its stdout pipe
    // is full.
    let writer = tokio::spawn(async move {
        let res = stdin.write_all(&data).await;
        drop(stdin);
        res
    });

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("waiting for `{line}`"))?;
    let written = writer.await.context("joining filter stdin writer")?;

    if !output.status.success() {
        bail!(
            "`{line}` exited with {}: {}",
            output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    written.with_context(|| format!("writing to stdin of `{line}`"))?;
    Ok(output.stdout)
}
