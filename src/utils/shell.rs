use std::{
    io::{self, Write},
    process::{Command, ExitStatus, Stdio},
};

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::fail;

fn flush_stdout() {
    io::stdout()
        .flush()
        .unwrap_or_else(|e| fail!("Failed to flush STDOUT: {e}"));

    io::stderr()
        .flush()
        .unwrap_or_else(|e| fail!("Failed to flush STDERR: {e}"));
}

/// Open an URL with the platform's default browser
pub fn open_in_browser(url: &str) -> Result<()> {
    let mut cmd = browser_command(url);

    flush_stdout();

    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Failed to run the browser opener")?;

    ensure_cmd_success(&cmd, &status)
}

#[cfg(target_os = "macos")]
fn browser_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(target_os = "windows")]
fn browser_command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    // The empty string is the window title expected by 'start'
    cmd.args(["/C", "start", ""]).arg(url);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn browser_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

fn ensure_cmd_success(cmd: &Command, status: &ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    let status_code = match status.code() {
        Some(code) => code.to_string(),
        None => String::from("<unknown code>"),
    };

    bail!(
        "Command {} failed (status code = {})",
        cmd.get_program().to_string_lossy().bright_cyan(),
        status_code.bright_yellow(),
    );
}
