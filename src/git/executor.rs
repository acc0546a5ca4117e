use std::io::{self, ErrorKind, Read};
use std::process::Stdio;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;

use crate::audit::AuditLogger;
use crate::config::Config;
use crate::error::{GitError, GitResult};
use crate::git::command::GitCommand;

const READ_CHUNK_SIZE: usize = 8 * 1024;
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default ceiling on one plain command execution
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of executing a git command
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Output retained from one stream, flagged when the ceiling was hit
struct Drained {
    data: Vec<u8>,
    truncated: bool,
}

/// Executes git command descriptors and captures their output
///
/// Every wait is bounded. A command that outlives the timeout is killed
/// and reported as such rather than left to hang its caller.
#[derive(Debug)]
pub struct Executor {
    binary: String,
    timeout: Duration,
    audit: Option<AuditLogger>,
}

impl Executor {
    /// Create an executor with the default binary and timeout
    pub fn new() -> Self {
        Self {
            binary: "git".to_string(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
            audit: None,
        }
    }

    /// Build an executor from loaded configuration
    pub fn from_config(config: &Config) -> GitResult<Self> {
        let audit = if config.audit.enabled {
            let logger = match &config.audit.log_path {
                Some(path) => AuditLogger::with_path(path)?,
                None => AuditLogger::new()?,
            };
            Some(logger)
        } else {
            None
        };

        Ok(Self {
            binary: config.git.binary.clone(),
            timeout: config.git_timeout(),
            audit,
        })
    }

    /// Use a different git binary
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use a different timeout for command execution
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record every invocation through the given audit logger
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The git binary this executor spawns
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// The execution timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The audit logger, when one is attached
    pub fn audit(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Execute a command and return its captured output
    ///
    /// Prompts are disabled; a command that would ask for credentials
    /// fails instead. Use the relay for credentialed operations.
    pub async fn execute(&self, command: &GitCommand) -> GitResult<ExecutionOutput> {
        let command_line = command.command_line();
        let limit = command.output_limit();

        let mut child = tokio::process::Command::new(&self.binary)
            .args(command.argv())
            .current_dir(command.repo_path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GitError::LaunchFailed(format!("{command_line}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GitError::LaunchFailed("stdout pipe missing".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GitError::LaunchFailed("stderr pipe missing".to_string()))?;

        let work = async {
            let (out, err) = tokio::join!(
                drain_capped_async(stdout, limit),
                drain_capped_async(stderr, limit)
            );
            let status = child.wait().await?;
            Ok::<_, GitError>((out?, err?, status))
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => {
                let (out, err, status) = result?;
                self.process_output(
                    command,
                    out,
                    err,
                    status.code().unwrap_or(-1),
                    status.success(),
                )
            }
            Err(_) => {
                let _ = child.kill().await;
                Err(GitError::Timeout {
                    command: command_line,
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }

    /// Execute a command on the calling thread
    ///
    /// Both pipes are drained from dedicated threads so a chatty command
    /// cannot deadlock against a full pipe while we wait for it to exit.
    pub fn execute_blocking(&self, command: &GitCommand) -> GitResult<ExecutionOutput> {
        let command_line = command.command_line();
        let limit = command.output_limit();

        let mut child = std::process::Command::new(&self.binary)
            .args(command.argv())
            .current_dir(command.repo_path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GitError::LaunchFailed(format!("{command_line}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GitError::LaunchFailed("stdout pipe missing".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GitError::LaunchFailed("stderr pipe missing".to_string()))?;

        let out_handle = thread::spawn(move || drain_capped(stdout, limit));
        let err_handle = thread::spawn(move || drain_capped(stderr, limit));

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = out_handle.join();
                        let _ = err_handle.join();
                        return Err(GitError::Timeout {
                            command: command_line,
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
            }
        };

        let out = join_drain(out_handle)?;
        let err = join_drain(err_handle)?;

        self.process_output(
            command,
            out,
            err,
            status.code().unwrap_or(-1),
            status.success(),
        )
    }

    /// Turn drained streams into ExecutionOutput, raising overflow and
    /// non-zero-exit failures
    fn process_output(
        &self,
        command: &GitCommand,
        out: Drained,
        err: Drained,
        exit_code: i32,
        success: bool,
    ) -> GitResult<ExecutionOutput> {
        if let Some(audit) = &self.audit {
            // Audit failures must not fail the git operation itself
            let _ = audit.log_command(&command.command_line(), command.repo_path(), exit_code);
        }

        if out.truncated || err.truncated {
            return Err(GitError::OutputOverflow {
                command: command.command_line(),
                limit: command.output_limit(),
            });
        }

        let stdout = String::from_utf8_lossy(&out.data).to_string();
        let stderr = String::from_utf8_lossy(&err.data).to_string();

        if !success {
            return Err(GitError::CommandFailed {
                command: command.command_line(),
                exit_code,
                stdout,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ExecutionOutput {
            stdout,
            stderr,
            exit_code,
            success,
        })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a stream to EOF, retaining at most `limit` bytes
///
/// The stream is always fully consumed so the child never blocks on a
/// full pipe; bytes past the ceiling are dropped and flagged.
fn drain_capped<R: Read>(mut reader: R, limit: usize) -> io::Result<Drained> {
    let mut data = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if truncated {
                    continue;
                }
                let room = limit.saturating_sub(data.len());
                if n <= room {
                    data.extend_from_slice(&buf[..n]);
                } else {
                    data.extend_from_slice(&buf[..room]);
                    truncated = true;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(Drained { data, truncated })
}

async fn drain_capped_async<R>(mut reader: R, limit: usize) -> GitResult<Drained>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut data = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if truncated {
            continue;
        }
        let room = limit.saturating_sub(data.len());
        if n <= room {
            data.extend_from_slice(&buf[..n]);
        } else {
            data.extend_from_slice(&buf[..room]);
            truncated = true;
        }
    }

    Ok(Drained { data, truncated })
}

fn join_drain(handle: JoinHandle<io::Result<Drained>>) -> GitResult<Drained> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(GitError::IoError(io::Error::other(
            "output reader thread panicked",
        ))),
    }
}
