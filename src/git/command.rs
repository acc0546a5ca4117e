use std::fmt;
use std::path::{Path, PathBuf};

/// Retention ceiling for captured output of most subcommands
pub const DEFAULT_OUTPUT_LIMIT: usize = 1024 * 200;

/// Retention ceiling for `git log`, which on long-lived repositories
/// produces far more output than any other subcommand
pub const LOG_OUTPUT_LIMIT: usize = 1024 * 5000;

/// A single git invocation: where to run it, the subcommand, its flags,
/// and any trailing arguments
///
/// The descriptor is inert. Building one never touches the filesystem or
/// spawns a process; execution belongs to the executor and the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    repo_path: PathBuf,
    operation: String,
    flags: Vec<String>,
    postfix: String,
    output_limit: usize,
}

impl GitCommand {
    /// Create a descriptor for `operation` running in `repo_path`
    ///
    /// The operation may span several argv tokens ("remote add"). The
    /// output ceiling defaults by subcommand: `log` gets the large one.
    pub fn new<P: AsRef<Path>>(repo_path: P, operation: &str) -> Self {
        let output_limit = if operation.split_whitespace().next() == Some("log") {
            LOG_OUTPUT_LIMIT
        } else {
            DEFAULT_OUTPUT_LIMIT
        };

        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            operation: operation.to_string(),
            flags: Vec::new(),
            postfix: String::new(),
            output_limit,
        }
    }

    /// Append a single flag, passed to git verbatim as one argv token
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        let flag = flag.into();
        if !flag.is_empty() {
            self.flags.push(flag);
        }
        self
    }

    /// Append multiple flags
    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for flag in flags {
            self = self.flag(flag);
        }
        self
    }

    /// Set the trailing arguments
    ///
    /// The postfix is split on whitespace, except inside single or double
    /// quotes; the quotes themselves are stripped. Callers quote values
    /// that must survive as one token, commit messages above all.
    pub fn postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = postfix.into();
        self
    }

    /// Override the output retention ceiling
    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    /// The directory the command runs in
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// The git subcommand, as given
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The output retention ceiling in bytes
    pub fn output_limit(&self) -> usize {
        self.output_limit
    }

    /// Render the full command line for display and audit records
    pub fn command_line(&self) -> String {
        let mut parts = vec!["git".to_string(), self.operation.clone()];
        parts.extend(self.flags.iter().cloned());
        if !self.postfix.is_empty() {
            parts.push(self.postfix.clone());
        }
        parts.join(" ")
    }

    /// The argv passed to the git binary, exclusive of the binary itself
    pub fn argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = self
            .operation
            .split_whitespace()
            .map(str::to_string)
            .collect();
        argv.extend(self.flags.iter().cloned());
        argv.extend(split_quoted(&self.postfix));
        argv
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Split on whitespace outside single/double quotes, stripping the quotes
///
/// There is no escape syntax. An unterminated quote runs to the end of
/// the input. A quoted empty string yields an empty token.
fn split_quoted(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut quoted = false;

    for ch in input.chars() {
        match in_quote {
            Some(q) if ch == q => in_quote = None,
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => {
                in_quote = Some(ch);
                quoted = true;
            }
            None if ch.is_whitespace() => {
                if quoted || !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            None => current.push(ch),
        }
    }

    if quoted || !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
