//! Process execution for compile and run steps
//!
//! Runs one command inside a workspace with piped stdio and a wall-clock
//! timeout. The child is spawned as its own process group leader; on
//! timeout the whole group is killed so nothing outlives the call.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::languages::LanguageProfile;

/// Captured stdout/stderr are truncated to this many bytes
const MAX_CAPTURE_BYTES: usize = 256 * 1024;

/// Wall-clock budget for a compile step in milliseconds
const COMPILE_TIME_LIMIT_MS: u64 = 30_000;

/// Classified outcome of one process invocation
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited with the given code
    Exited(i32),
    /// Wall-clock limit exceeded; the process group was killed
    TimedOut,
}

/// Outcome of running a program once
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    /// Elapsed wall-clock time in milliseconds
    pub time_ms: u64,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Exited(0))
    }
}

/// Result of a compilation attempt
#[derive(Debug)]
pub struct CompileOutcome {
    pub success: bool,
    pub message: Option<String>,
}

/// Compile the materialized source if the profile has a compile step
pub async fn compile(profile: &LanguageProfile, work_dir: &std::path::Path) -> Result<CompileOutcome> {
    let Some(compile_cmd) = &profile.compile_command else {
        // Interpreted language, no compilation needed
        return Ok(CompileOutcome {
            success: true,
            message: None,
        });
    };

    debug!("Compiling with {:?}", compile_cmd);

    let outcome = run_command(
        compile_cmd,
        work_dir,
        "",
        Duration::from_millis(COMPILE_TIME_LIMIT_MS),
    )
    .await?;

    if outcome.is_success() {
        return Ok(CompileOutcome {
            success: true,
            message: None,
        });
    }

    let message = match outcome.status {
        RunStatus::TimedOut => "compilation timed out".to_string(),
        RunStatus::Exited(code) => {
            if !outcome.stderr.trim().is_empty() {
                outcome.stderr
            } else if !outcome.stdout.trim().is_empty() {
                outcome.stdout
            } else {
                format!("compilation failed with exit code {}", code)
            }
        }
    };

    Ok(CompileOutcome {
        success: false,
        message: Some(message),
    })
}

/// Run the profile's run command against one test case input
pub async fn run_test(
    profile: &LanguageProfile,
    work_dir: &std::path::Path,
    input: &str,
    time_limit_ms: u64,
) -> Result<RunOutcome> {
    run_command(
        &profile.run_command,
        work_dir,
        input,
        Duration::from_millis(time_limit_ms),
    )
    .await
}

/// Spawn one command, feed stdin, and wait for it under a timeout
pub async fn run_command(
    command: &[String],
    work_dir: &std::path::Path,
    stdin_content: &str,
    time_limit: Duration,
) -> Result<RunOutcome> {
    let (program, args) = command.split_first().context("empty command")?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .process_group(0);

    let started = Instant::now();
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn {}", program))?;
    let pid = child.id();

    // Feed stdin and close it; an empty input still closes the pipe so
    // programs waiting for EOF make progress.
    let mut stdin = child.stdin.take().context("child stdin not piped")?;
    if !stdin_content.is_empty() {
        // A write failure means the child already exited; its exit status
        // tells the rest of the story.
        if let Err(e) = stdin.write_all(stdin_content.as_bytes()).await {
            debug!("Failed to write stdin to {}: {}", program, e);
        }
    }
    drop(stdin);

    match tokio::time::timeout(time_limit, child.wait_with_output()).await {
        Ok(output) => {
            let output = output.with_context(|| format!("failed to wait for {}", program))?;
            Ok(RunOutcome {
                status: RunStatus::Exited(output.status.code().unwrap_or(-1)),
                stdout: bounded_capture(&output.stdout),
                stderr: bounded_capture(&output.stderr),
                time_ms: started.elapsed().as_millis() as u64,
            })
        }
        Err(_) => {
            // The dropped wait future killed the direct child
            // (kill_on_drop); take out any children it spawned too.
            kill_process_group(pid);
            debug!("Killed {} after {:?} timeout", program, time_limit);
            Ok(RunOutcome {
                status: RunStatus::TimedOut,
                stdout: String::new(),
                stderr: String::new(),
                time_ms: time_limit.as_millis() as u64,
            })
        }
    }
}

fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    // Spawned with process_group(0), so the child's pid is its pgid.
    // ESRCH just means everything is already gone.
    let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

fn bounded_capture(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= MAX_CAPTURE_BYTES {
        return text.into_owned();
    }
    let mut end = MAX_CAPTURE_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    fn work_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let dir = work_dir();
        let outcome = run_command(&sh("echo hello"), dir.path(), "", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Exited(0));
        assert_eq!(outcome.stdout, "hello\n");
        assert!(outcome.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_feeds_stdin() {
        let dir = work_dir();
        let outcome = run_command(&sh("cat"), dir.path(), "line one\n", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.stdout, "line one\n");
    }

    #[tokio::test]
    async fn test_empty_stdin_closes_pipe() {
        // `cat` blocks forever unless stdin is closed
        let dir = work_dir();
        let outcome = run_command(&sh("cat"), dir.path(), "", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert!(outcome.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let dir = work_dir();
        let outcome = run_command(
            &sh("echo boom >&2; exit 3"),
            dir.path(),
            "",
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, RunStatus::Exited(3));
        assert!(outcome.stderr.contains("boom"));
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = work_dir();
        let started = Instant::now();
        let outcome = run_command(&sh("sleep 30"), dir.path(), "", Duration::from_millis(200))
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_runs_in_work_dir() {
        let dir = work_dir();
        std::fs::write(dir.path().join("data.txt"), "from workspace").unwrap();

        let outcome = run_command(&sh("cat data.txt"), dir.path(), "", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, "from workspace");
    }

    #[tokio::test]
    async fn test_compile_skipped_for_interpreted() {
        let registry = LanguageRegistry::builtin().unwrap();
        let dir = work_dir();

        let outcome = compile(registry.get("python").unwrap(), dir.path())
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.message.is_none());
    }

    #[tokio::test]
    async fn test_compile_failure_captures_diagnostics() {
        let registry = LanguageRegistry::from_toml_str(
            r#"
[shellc]
source_file = "solution.sh"
compile_command = "sh solution.sh"
run_command = "sh solution.sh"
"#,
        )
        .unwrap();
        let dir = work_dir();
        std::fs::write(dir.path().join("solution.sh"), "echo broken >&2\nexit 1\n").unwrap();

        let outcome = compile(registry.get("shellc").unwrap(), dir.path())
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.message.unwrap().contains("broken"));
    }

    #[test]
    fn test_bounded_capture_truncates() {
        let big = vec![b'x'; MAX_CAPTURE_BYTES + 100];
        assert_eq!(bounded_capture(&big).len(), MAX_CAPTURE_BYTES);
        assert_eq!(bounded_capture(b"short"), "short");
    }
}
