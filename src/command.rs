//! Running external commands through the platform shell.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::error::{Result, TgenError};

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `command_line` in `cwd` and wait for it to finish.
pub fn run(command_line: &str, cwd: &Path) -> io::Result<CommandOutput> {
    let output = shell(command_line).current_dir(cwd).output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    })
}

/// Run `command_line` and turn a spawn failure or non-zero exit into an error.
pub fn run_checked(command_line: &str, cwd: &Path) -> Result<CommandOutput> {
    let output = run(command_line, cwd).map_err(|e| TgenError::Command {
        command: command_line.to_string(),
        code: None,
        stderr: e.to_string(),
    })?;

    if !output.success() {
        return Err(TgenError::Command {
            command: command_line.to_string(),
            code: output.exit_code,
            stderr: output.stderr.trim_end().to_string(),
        });
    }
    Ok(output)
}

#[cfg(windows)]
fn shell(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", command_line]);
    command
}

#[cfg(not(windows))]
fn shell(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.args(["-c", command_line]);
    command
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_captures_stdout_and_status() {
        let dir = tempdir().unwrap();
        let output = run("echo hello", dir.path()).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "");
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();

        let output = run("ls", dir.path()).unwrap();

        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_failure_is_captured() {
        let dir = tempdir().unwrap();
        let output = run("echo oops >&2; exit 3", dir.path()).unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr, "oops\n");
        assert!(!output.success());
    }

    #[test]
    fn test_run_checked_reports_failure() {
        let dir = tempdir().unwrap();

        match run_checked("echo bad >&2; exit 2", dir.path()) {
            Err(TgenError::Command { code, stderr, .. }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "bad");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
