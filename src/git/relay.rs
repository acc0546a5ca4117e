use std::io::{ErrorKind, Read, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, Child, CommandBuilder, PtySize};

use crate::error::{GitError, GitResult};
use crate::git::command::GitCommand;

const READ_CHUNK_SIZE: usize = 8 * 1024;
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default ceiling on one credentialed session
///
/// Generous because clones of large repositories legitimately run for
/// minutes.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(300);

/// Username and password answered into remote prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// How one chunk of terminal output is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSignal {
    UsernamePrompt,
    PasswordPrompt,
    Failure,
    Progress,
}

/// Classify a chunk of PTY output
///
/// Markers are checked in a fixed order: username prompt, password
/// prompt, failure text, then progress as the fallback. Matching is
/// case-insensitive. The order matters; a chunk mentioning several
/// markers acts on the first match only.
pub fn classify_chunk(chunk: &str) -> ChunkSignal {
    let lowered = chunk.to_lowercase();

    if lowered.contains("username") {
        ChunkSignal::UsernamePrompt
    } else if lowered.contains("password") {
        ChunkSignal::PasswordPrompt
    } else if lowered.contains("error") || lowered.contains("fatal") {
        ChunkSignal::Failure
    } else {
        ChunkSignal::Progress
    }
}

/// What a successful relay session reported
#[derive(Debug, Clone)]
pub struct RelayOutcome {
    pub detail: String,
    pub exit_code: i32,
}

/// Observations accumulated while the child is running
///
/// A failure marker is sticky: once recorded, the session finalizes as
/// failed no matter what arrives afterwards. Later failure text replaces
/// earlier text. Finalization consumes the state, so a session can only
/// produce one result, and only after the child has exited.
#[derive(Debug, Default)]
struct SessionState {
    failure: Option<String>,
    progress: Option<String>,
}

impl SessionState {
    fn record(&mut self, signal: ChunkSignal, text: &str) {
        match signal {
            ChunkSignal::Failure => self.failure = Some(text.trim().to_string()),
            ChunkSignal::Progress => self.progress = Some(text.trim().to_string()),
            ChunkSignal::UsernamePrompt | ChunkSignal::PasswordPrompt => {}
        }
    }

    fn finalize(self, exit_code: i32) -> GitResult<RelayOutcome> {
        match self.failure {
            Some(detail) => Err(GitError::RelayFailed(detail)),
            None => Ok(RelayOutcome {
                detail: self.progress.unwrap_or_default(),
                exit_code,
            }),
        }
    }
}

/// Runs git subcommands that may prompt for credentials
///
/// The child is attached to a PTY so the remote helper believes it is
/// talking to a terminal. Output chunks are classified as they arrive;
/// username and password prompts are answered through the PTY writer,
/// carriage-return terminated. Chunk waits and the exit reap share one
/// deadline; on expiry the child is killed.
#[derive(Debug, Clone)]
pub struct RelaySession {
    binary: String,
    timeout: Duration,
}

impl RelaySession {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// The binary this session spawns
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// The session deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the session without blocking the async runtime
    pub async fn run(
        &self,
        command: &GitCommand,
        credentials: Option<&Credentials>,
    ) -> GitResult<RelayOutcome> {
        let session = self.clone();
        let command = command.clone();
        let credentials = credentials.cloned();

        tokio::task::spawn_blocking(move || {
            session.run_blocking(&command, credentials.as_ref())
        })
        .await
        .map_err(|e| GitError::RelayFailed(format!("relay task failed: {e}")))?
    }

    /// Run the session on the calling thread
    pub fn run_blocking(
        &self,
        command: &GitCommand,
        credentials: Option<&Credentials>,
    ) -> GitResult<RelayOutcome> {
        let command_line = command.command_line();

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(relay_error)?;

        let mut builder = CommandBuilder::new(&self.binary);
        builder.cwd(command.repo_path());
        for arg in command.argv() {
            builder.arg(arg);
        }

        let mut child = pair.slave.spawn_command(builder).map_err(relay_error)?;
        drop(pair.slave);

        let reader = match pair.master.try_clone_reader() {
            Ok(reader) => reader,
            Err(error) => {
                terminate(&mut child);
                return Err(relay_error(error));
            }
        };
        let mut writer = match pair.master.take_writer() {
            Ok(writer) => writer,
            Err(error) => {
                terminate(&mut child);
                return Err(relay_error(error));
            }
        };

        let chunks = spawn_reader(reader);
        let deadline = Instant::now() + self.timeout;
        let mut state = SessionState::default();

        loop {
            let now = Instant::now();
            if now >= deadline {
                terminate(&mut child);
                return Err(self.timeout_error(&command_line));
            }

            match chunks.recv_timeout(deadline - now) {
                Ok(chunk) => {
                    let text = String::from_utf8_lossy(&chunk).to_string();
                    match classify_chunk(&text) {
                        ChunkSignal::UsernamePrompt => {
                            answer(&mut writer, credentials.map(|c| c.username.as_str()));
                        }
                        ChunkSignal::PasswordPrompt => {
                            answer(&mut writer, credentials.map(|c| c.password.as_str()));
                        }
                        signal => state.record(signal, &text),
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    terminate(&mut child);
                    return Err(self.timeout_error(&command_line));
                }
                // Reader hit EOF: the child has closed its side
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let exit_code = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status.exit_code() as i32,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        terminate(&mut child);
                        return Err(self.timeout_error(&command_line));
                    }
                    thread::sleep(EXIT_POLL_INTERVAL);
                }
                Err(error) => {
                    terminate(&mut child);
                    return Err(GitError::IoError(error));
                }
            }
        };

        state.finalize(exit_code)
    }

    fn timeout_error(&self, command_line: &str) -> GitError {
        GitError::Timeout {
            command: command_line.to_string(),
            seconds: self.timeout.as_secs(),
        }
    }
}

/// Write a prompt answer followed by a carriage return
///
/// With no credentials a bare empty line is sent so the remote helper
/// fails fast instead of waiting on input forever.
fn answer(writer: &mut Box<dyn Write + Send>, value: Option<&str>) {
    let line = match value {
        Some(value) => format!("{value}\r"),
        None => "\r".to_string(),
    };
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}

fn spawn_reader(mut reader: Box<dyn Read + Send>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });

    rx
}

fn terminate(child: &mut Box<dyn Child + Send + Sync>) {
    let _ = child.kill();
    let _ = child.wait();
}

fn relay_error(error: impl std::fmt::Display) -> GitError {
    GitError::RelayFailed(error.to_string())
}
