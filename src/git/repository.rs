use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::error::{GitError, GitResult};
use crate::git::command::{DEFAULT_OUTPUT_LIMIT, GitCommand, LOG_OUTPUT_LIMIT};
use crate::git::executor::{ExecutionOutput, Executor};
use crate::git::parser::{
    self, BranchSet, CommitSummary, LOG_FORMAT_FLAG, LogEntry, RemoteMap, StatusSnapshot,
};
use crate::git::relay::{Credentials, DEFAULT_RELAY_TIMEOUT, RelayOutcome, RelaySession};

/// A git repository bound to a working directory
///
/// Carries the directory basename as its name and caches whether the
/// directory holds a repository (`<path>/.git` exists). Operations that
/// can create or discard that state refresh the cached flag. Every
/// operation comes in an async and a `_blocking` variant built from the
/// same command descriptor.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    name: String,
    initialized: bool,
    executor: Executor,
    relay_timeout: Duration,
    output_limit: usize,
    log_output_limit: usize,
}

impl Repository {
    /// Bind a repository to `path` with default settings
    ///
    /// The directory does not need to hold a repository yet; `init`
    /// creates one in place.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = normalize(path.as_ref());
        let name = repo_name(&path);
        let initialized = path.join(".git").exists();

        Self {
            name,
            initialized,
            executor: Executor::new(),
            relay_timeout: DEFAULT_RELAY_TIMEOUT,
            output_limit: DEFAULT_OUTPUT_LIMIT,
            log_output_limit: LOG_OUTPUT_LIMIT,
            path,
        }
    }

    /// Bind a repository using loaded configuration
    ///
    /// Fallible because the configured audit log may need to be opened.
    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> GitResult<Self> {
        let executor = Executor::from_config(config)?;
        let mut repo = Self::new(path);
        repo.executor = executor;
        repo.relay_timeout = config.relay_timeout();
        repo.output_limit = config.limits.default_output_bytes;
        repo.log_output_limit = config.limits.log_output_bytes;
        Ok(repo)
    }

    /// Find the repository enclosing the current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir().map_err(GitError::IoError)?;
        Self::discover_from(&current_dir)
    }

    /// Find the repository enclosing `start_path`
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            if current.join(".git").exists() {
                return Ok(Self::new(current));
            }

            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// The working directory this repository is bound to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The repository name, taken from the directory basename
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the directory held a repository when last checked
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The executor running this repository's commands
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Initialize the directory as a repository with `git init`
    pub async fn init(&mut self, flags: &[&str]) -> GitResult<()> {
        let command = self.command("init").flags(flags.iter().copied());
        self.executor.execute(&command).await?;
        self.refresh_initialized();
        Ok(())
    }

    /// Blocking variant of [`init`](Self::init)
    pub fn init_blocking(&mut self, flags: &[&str]) -> GitResult<()> {
        let command = self.command("init").flags(flags.iter().copied());
        self.executor.execute_blocking(&command)?;
        self.refresh_initialized();
        Ok(())
    }

    /// Commit history of `branch`, or of the checked-out branch
    ///
    /// Entries arrive newest first. An empty repository yields an empty
    /// history, not an error.
    pub async fn log(&self, branch: Option<&str>) -> GitResult<Vec<LogEntry>> {
        log_entries(self.executor.execute(&self.log_command(branch)).await)
    }

    /// Blocking variant of [`log`](Self::log)
    pub fn log_blocking(&self, branch: Option<&str>) -> GitResult<Vec<LogEntry>> {
        log_entries(self.executor.execute_blocking(&self.log_command(branch)))
    }

    /// Working-tree state as a three-way snapshot
    pub async fn status(&self) -> GitResult<StatusSnapshot> {
        let tracked = self.executor.execute(&self.status_command()).await?;
        let untracked = self.executor.execute(&self.untracked_command()).await?;
        parser::parse_status(&tracked.stdout, &untracked.stdout)
    }

    /// Blocking variant of [`status`](Self::status)
    pub fn status_blocking(&self) -> GitResult<StatusSnapshot> {
        let tracked = self.executor.execute_blocking(&self.status_command())?;
        let untracked = self.executor.execute_blocking(&self.untracked_command())?;
        parser::parse_status(&tracked.stdout, &untracked.stdout)
    }

    /// Stage files for the next commit
    ///
    /// File names containing whitespace must be quoted by the caller.
    pub async fn add(&self, files: &[&str]) -> GitResult<()> {
        self.executor.execute(&self.add_command(files)).await?;
        Ok(())
    }

    /// Blocking variant of [`add`](Self::add)
    pub fn add_blocking(&self, files: &[&str]) -> GitResult<()> {
        self.executor.execute_blocking(&self.add_command(files))?;
        Ok(())
    }

    /// Remove files from the index, leaving working copies in place
    pub async fn remove(&self, files: &[&str]) -> GitResult<()> {
        self.executor.execute(&self.remove_command(files)).await?;
        Ok(())
    }

    /// Blocking variant of [`remove`](Self::remove)
    pub fn remove_blocking(&self, files: &[&str]) -> GitResult<()> {
        self.executor.execute_blocking(&self.remove_command(files))?;
        Ok(())
    }

    /// Unstage files, keeping their working-tree changes
    pub async fn unstage(&self, files: &[&str]) -> GitResult<()> {
        self.executor.execute(&self.unstage_command(files)).await?;
        Ok(())
    }

    /// Blocking variant of [`unstage`](Self::unstage)
    pub fn unstage_blocking(&self, files: &[&str]) -> GitResult<()> {
        self.executor.execute_blocking(&self.unstage_command(files))?;
        Ok(())
    }

    /// Record the staged changes
    ///
    /// An invocation that reports an empty staging area surfaces as
    /// [`GitError::NothingToCommit`] rather than a summary.
    pub async fn commit(&self, message: &str) -> GitResult<CommitSummary> {
        commit_summary(self.executor.execute(&self.commit_command(message)).await)
    }

    /// Blocking variant of [`commit`](Self::commit)
    pub fn commit_blocking(&self, message: &str) -> GitResult<CommitSummary> {
        commit_summary(self.executor.execute_blocking(&self.commit_command(message)))
    }

    /// List local branches
    pub async fn branches(&self) -> GitResult<BranchSet> {
        let output = self.executor.execute(&self.command("branch")).await?;
        parser::parse_branches(&output.stdout)
    }

    /// Blocking variant of [`branches`](Self::branches)
    pub fn branches_blocking(&self) -> GitResult<BranchSet> {
        let output = self.executor.execute_blocking(&self.command("branch"))?;
        parser::parse_branches(&output.stdout)
    }

    /// Create a branch named `name`
    pub async fn create_branch(&self, name: &str) -> GitResult<()> {
        self.executor.execute(&self.command("branch").postfix(name)).await?;
        Ok(())
    }

    /// Blocking variant of [`create_branch`](Self::create_branch)
    pub fn create_branch_blocking(&self, name: &str) -> GitResult<()> {
        self.executor.execute_blocking(&self.command("branch").postfix(name))?;
        Ok(())
    }

    /// Switch to `branch`, reporting the resulting branch set
    pub async fn checkout(&mut self, branch: &str) -> GitResult<BranchSet> {
        let command = self.command("checkout").postfix(branch);
        self.executor.execute(&command).await?;
        self.refresh_initialized();
        self.branches().await
    }

    /// Blocking variant of [`checkout`](Self::checkout)
    pub fn checkout_blocking(&mut self, branch: &str) -> GitResult<BranchSet> {
        let command = self.command("checkout").postfix(branch);
        self.executor.execute_blocking(&command)?;
        self.refresh_initialized();
        self.branches_blocking()
    }

    /// Merge `branch` into the checked-out branch
    pub async fn merge(&self, branch: &str) -> GitResult<()> {
        self.executor.execute(&self.command("merge").postfix(branch)).await?;
        Ok(())
    }

    /// Blocking variant of [`merge`](Self::merge)
    pub fn merge_blocking(&self, branch: &str) -> GitResult<()> {
        self.executor.execute_blocking(&self.command("merge").postfix(branch))?;
        Ok(())
    }

    /// List tags
    pub async fn tags(&self) -> GitResult<Vec<String>> {
        let output = self.executor.execute(&self.command("tag")).await?;
        parser::parse_tags(&output.stdout)
    }

    /// Blocking variant of [`tags`](Self::tags)
    pub fn tags_blocking(&self) -> GitResult<Vec<String>> {
        let output = self.executor.execute_blocking(&self.command("tag"))?;
        parser::parse_tags(&output.stdout)
    }

    /// Create a tag named `name` on the current commit
    pub async fn create_tag(&self, name: &str) -> GitResult<()> {
        self.executor.execute(&self.command("tag").postfix(name)).await?;
        Ok(())
    }

    /// Blocking variant of [`create_tag`](Self::create_tag)
    pub fn create_tag_blocking(&self, name: &str) -> GitResult<()> {
        self.executor.execute_blocking(&self.command("tag").postfix(name))?;
        Ok(())
    }

    /// Register a remote
    pub async fn add_remote(&self, name: &str, url: &str) -> GitResult<()> {
        let command = self.command("remote add").postfix(format!("{name} {url}"));
        self.executor.execute(&command).await?;
        Ok(())
    }

    /// Blocking variant of [`add_remote`](Self::add_remote)
    pub fn add_remote_blocking(&self, name: &str, url: &str) -> GitResult<()> {
        let command = self.command("remote add").postfix(format!("{name} {url}"));
        self.executor.execute_blocking(&command)?;
        Ok(())
    }

    /// Change the URL of an existing remote
    pub async fn set_remote_url(&self, name: &str, url: &str) -> GitResult<()> {
        let command = self.command("remote set-url").postfix(format!("{name} {url}"));
        self.executor.execute(&command).await?;
        Ok(())
    }

    /// Blocking variant of [`set_remote_url`](Self::set_remote_url)
    pub fn set_remote_url_blocking(&self, name: &str, url: &str) -> GitResult<()> {
        let command = self.command("remote set-url").postfix(format!("{name} {url}"));
        self.executor.execute_blocking(&command)?;
        Ok(())
    }

    /// Unregister a remote
    pub async fn remove_remote(&self, name: &str) -> GitResult<()> {
        self.executor.execute(&self.command("remote rm").postfix(name)).await?;
        Ok(())
    }

    /// Blocking variant of [`remove_remote`](Self::remove_remote)
    pub fn remove_remote_blocking(&self, name: &str) -> GitResult<()> {
        self.executor.execute_blocking(&self.command("remote rm").postfix(name))?;
        Ok(())
    }

    /// Map of configured remotes and their URLs
    pub async fn remotes(&self) -> GitResult<RemoteMap> {
        let output = self.executor.execute(&self.command("remote").flag("-v")).await?;
        parser::parse_remotes(&output.stdout)
    }

    /// Blocking variant of [`remotes`](Self::remotes)
    pub fn remotes_blocking(&self) -> GitResult<RemoteMap> {
        let output = self.executor.execute_blocking(&self.command("remote").flag("-v"))?;
        parser::parse_remotes(&output.stdout)
    }

    /// Push `branch` to `remote` through a credential relay session
    ///
    /// Returns the success text the session observed. On a reported
    /// remote failure the raw error text propagates as
    /// [`GitError::RelayFailed`].
    pub async fn push(
        &self,
        remote: &str,
        branch: &str,
        flags: &[&str],
        credentials: Option<&Credentials>,
    ) -> GitResult<String> {
        let command = self.sync_command("push", remote, branch, flags);
        let result = self.relay().run(&command, credentials).await;
        self.record_relay(&command, result)
    }

    /// Blocking variant of [`push`](Self::push)
    pub fn push_blocking(
        &self,
        remote: &str,
        branch: &str,
        flags: &[&str],
        credentials: Option<&Credentials>,
    ) -> GitResult<String> {
        let command = self.sync_command("push", remote, branch, flags);
        let result = self.relay().run_blocking(&command, credentials);
        self.record_relay(&command, result)
    }

    /// Pull `branch` from `remote` through a credential relay session
    pub async fn pull(
        &self,
        remote: &str,
        branch: &str,
        flags: &[&str],
        credentials: Option<&Credentials>,
    ) -> GitResult<String> {
        let command = self.sync_command("pull", remote, branch, flags);
        let result = self.relay().run(&command, credentials).await;
        self.record_relay(&command, result)
    }

    /// Blocking variant of [`pull`](Self::pull)
    pub fn pull_blocking(
        &self,
        remote: &str,
        branch: &str,
        flags: &[&str],
        credentials: Option<&Credentials>,
    ) -> GitResult<String> {
        let command = self.sync_command("pull", remote, branch, flags);
        let result = self.relay().run_blocking(&command, credentials);
        self.record_relay(&command, result)
    }

    /// Hard-reset to `hash`, reporting the resulting history
    pub async fn reset(&self, hash: &str) -> GitResult<Vec<LogEntry>> {
        let command = self.command("reset").flag("--hard").postfix(hash);
        self.executor.execute(&command).await?;
        self.log(None).await
    }

    /// Blocking variant of [`reset`](Self::reset)
    pub fn reset_blocking(&self, hash: &str) -> GitResult<Vec<LogEntry>> {
        let command = self.command("reset").flag("--hard").postfix(hash);
        self.executor.execute_blocking(&command)?;
        self.log_blocking(None)
    }

    /// Identifier of the current commit via `git describe --always`
    pub async fn describe(&self) -> GitResult<String> {
        let command = self.command("describe").flag("--always");
        let output = self.executor.execute(&command).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Blocking variant of [`describe`](Self::describe)
    pub fn describe_blocking(&self) -> GitResult<String> {
        let command = self.command("describe").flag("--always");
        let output = self.executor.execute_blocking(&command)?;
        Ok(output.stdout.trim().to_string())
    }

    /// Apply `commit` onto the checked-out branch
    pub async fn cherry_pick(&mut self, commit: &str) -> GitResult<()> {
        let command = self.command("cherry-pick").postfix(commit);
        self.executor.execute(&command).await?;
        self.refresh_initialized();
        Ok(())
    }

    /// Blocking variant of [`cherry_pick`](Self::cherry_pick)
    pub fn cherry_pick_blocking(&mut self, commit: &str) -> GitResult<()> {
        let command = self.command("cherry-pick").postfix(commit);
        self.executor.execute_blocking(&command)?;
        self.refresh_initialized();
        Ok(())
    }

    /// Clone `url` into `dest` through a credential relay session
    ///
    /// Runs from the destination's parent directory and returns a
    /// repository bound to the destination.
    pub async fn clone_from<P: AsRef<Path>>(
        url: &str,
        dest: P,
        credentials: Option<&Credentials>,
    ) -> GitResult<Self> {
        let command = clone_command(url, dest.as_ref());
        clone_session(None).run(&command, credentials).await?;
        Ok(Self::new(dest))
    }

    /// Blocking variant of [`clone_from`](Self::clone_from)
    pub fn clone_from_blocking<P: AsRef<Path>>(
        url: &str,
        dest: P,
        credentials: Option<&Credentials>,
    ) -> GitResult<Self> {
        let command = clone_command(url, dest.as_ref());
        clone_session(None).run_blocking(&command, credentials)?;
        Ok(Self::new(dest))
    }

    /// Clone using loaded configuration
    ///
    /// The session runs the configured git binary under the configured
    /// relay timeout, and the returned repository is built as
    /// [`with_config`](Self::with_config) would build it.
    pub async fn clone_from_with_config<P: AsRef<Path>>(
        url: &str,
        dest: P,
        credentials: Option<&Credentials>,
        config: &Config,
    ) -> GitResult<Self> {
        let command = clone_command(url, dest.as_ref());
        clone_session(Some(config)).run(&command, credentials).await?;
        Self::with_config(dest, config)
    }

    /// Blocking variant of [`clone_from_with_config`](Self::clone_from_with_config)
    pub fn clone_from_with_config_blocking<P: AsRef<Path>>(
        url: &str,
        dest: P,
        credentials: Option<&Credentials>,
        config: &Config,
    ) -> GitResult<Self> {
        let command = clone_command(url, dest.as_ref());
        clone_session(Some(config)).run_blocking(&command, credentials)?;
        Self::with_config(dest, config)
    }

    fn command(&self, operation: &str) -> GitCommand {
        GitCommand::new(&self.path, operation).with_output_limit(self.output_limit)
    }

    fn relay(&self) -> RelaySession {
        RelaySession::new(self.executor.binary(), self.relay_timeout)
    }

    fn refresh_initialized(&mut self) {
        self.initialized = self.path.join(".git").exists();
    }

    fn log_command(&self, branch: Option<&str>) -> GitCommand {
        let command = self.command("log").with_output_limit(self.log_output_limit);
        let command = match branch {
            Some(branch) => command.flag(branch),
            None => command,
        };
        command.flag(LOG_FORMAT_FLAG)
    }

    fn status_command(&self) -> GitCommand {
        self.command("status").flag("--porcelain")
    }

    fn untracked_command(&self) -> GitCommand {
        self.command("ls-files").flag("-o").flag("--exclude-standard")
    }

    fn add_command(&self, files: &[&str]) -> GitCommand {
        self.command("add").postfix(files.join(" "))
    }

    fn remove_command(&self, files: &[&str]) -> GitCommand {
        self.command("rm").flag("--cached").postfix(files.join(" "))
    }

    fn unstage_command(&self, files: &[&str]) -> GitCommand {
        self.command("reset HEAD").postfix(files.join(" "))
    }

    fn commit_command(&self, message: &str) -> GitCommand {
        self.command("commit")
            .flag("-m")
            .postfix(format!("\"{message}\""))
    }

    fn sync_command(
        &self,
        operation: &str,
        remote: &str,
        branch: &str,
        flags: &[&str],
    ) -> GitCommand {
        self.command(operation)
            .flag(remote)
            .flag(branch)
            .flags(flags.iter().copied())
    }

    /// Audit the outcome of a relay session and reduce it to its detail
    /// text
    fn record_relay(
        &self,
        command: &GitCommand,
        result: GitResult<RelayOutcome>,
    ) -> GitResult<String> {
        match result {
            Ok(outcome) => {
                if let Some(audit) = self.executor.audit() {
                    // Audit failures must not fail the operation itself
                    let _ = audit.log_command(&command.command_line(), &self.path, outcome.exit_code);
                }
                Ok(outcome.detail)
            }
            Err(GitError::RelayFailed(detail)) => {
                if let Some(audit) = self.executor.audit() {
                    let _ = audit.log_relay_failure(&command.command_line(), &self.path, &detail);
                }
                Err(GitError::RelayFailed(detail))
            }
            Err(e) => Err(e),
        }
    }
}

/// An empty repository has no HEAD for `git log` to walk; that specific
/// failure reads as an empty history
fn log_entries(result: GitResult<ExecutionOutput>) -> GitResult<Vec<LogEntry>> {
    match result {
        Ok(output) => parser::parse_log(&output.stdout),
        Err(GitError::CommandFailed { ref stderr, .. }) if is_empty_history(stderr) => {
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn is_empty_history(stderr: &str) -> bool {
    stderr.contains("does not have any commits") || stderr.contains("bad default revision")
}

/// `git commit` reports an empty staging area with a non-zero exit on
/// current versions; the text decides, not the code
fn commit_summary(result: GitResult<ExecutionOutput>) -> GitResult<CommitSummary> {
    match result {
        Ok(output) => parser::parse_commit(&output.stdout),
        Err(GitError::CommandFailed {
            command,
            exit_code,
            stdout,
            stderr,
        }) => {
            if parser::is_nothing_to_commit(&stdout) {
                return Err(GitError::NothingToCommit(stdout.trim().to_string()));
            }
            Err(GitError::CommandFailed {
                command,
                exit_code,
                stdout,
                stderr,
            })
        }
        Err(e) => Err(e),
    }
}

fn clone_session(config: Option<&Config>) -> RelaySession {
    match config {
        Some(config) => RelaySession::new(config.git.binary.clone(), config.relay_timeout()),
        None => RelaySession::new("git", DEFAULT_RELAY_TIMEOUT),
    }
}

/// The clone target is the destination basename, run from its parent
fn clone_command(url: &str, dest: &Path) -> GitCommand {
    let parent = match dest.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    GitCommand::new(parent, "clone")
        .flag(url)
        .postfix(repo_name(dest))
}

/// Drop trailing separators and `.` segments so the basename is stable
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

fn repo_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        Command::new("git")
            .args(["init"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    #[test]
    fn test_new_derives_name_from_basename() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("myproject");
        fs::create_dir(&project).unwrap();

        let repo = Repository::new(&project);
        assert_eq!(repo.name(), "myproject");
        assert!(!repo.is_initialized());
    }

    #[test]
    fn test_new_detects_existing_repo() {
        let (_temp, repo_path) = create_test_repo();
        let repo = Repository::new(&repo_path);
        assert!(repo.is_initialized());
    }

    #[test]
    fn test_new_normalizes_trailing_slash() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("trailing");
        fs::create_dir(&project).unwrap();

        let with_slash = format!("{}/", project.display());
        let repo = Repository::new(&with_slash);
        assert_eq!(repo.name(), "trailing");
        assert_eq!(repo.path(), project.as_path());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let (_temp, repo_path) = create_test_repo();
        let sub_dir = repo_path.join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let repo = Repository::discover_from(&sub_dir).unwrap();
        assert_eq!(repo.path(), repo_path.as_path());
    }

    #[test]
    fn test_discover_not_a_repo() {
        let temp_dir = TempDir::new().unwrap();
        let result = Repository::discover_from(temp_dir.path());
        assert!(matches!(result, Err(GitError::NotARepository)));
    }

    #[test]
    fn test_init_blocking_creates_repository() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = Repository::new(temp_dir.path());
        assert!(!repo.is_initialized());

        repo.init_blocking(&[]).unwrap();
        assert!(repo.is_initialized());
        assert!(temp_dir.path().join(".git").exists());
    }

    #[test]
    fn test_log_command_shape() {
        let repo = Repository::new("/tmp/example");

        let bare = repo.log_command(None);
        assert_eq!(bare.argv(), vec!["log", LOG_FORMAT_FLAG]);
        assert_eq!(bare.output_limit(), LOG_OUTPUT_LIMIT);

        let branched = repo.log_command(Some("dev"));
        assert_eq!(branched.argv(), vec!["log", "dev", LOG_FORMAT_FLAG]);
    }

    #[test]
    fn test_commit_command_keeps_message_as_one_token() {
        let repo = Repository::new("/tmp/example");
        let command = repo.commit_command("first commit");
        assert_eq!(command.argv(), vec!["commit", "-m", "first commit"]);
    }

    #[test]
    fn test_stage_command_shapes() {
        let repo = Repository::new("/tmp/example");

        let add = repo.add_command(&["a.txt", "b.txt"]);
        assert_eq!(add.argv(), vec!["add", "a.txt", "b.txt"]);

        let remove = repo.remove_command(&["a.txt"]);
        assert_eq!(remove.argv(), vec!["rm", "--cached", "a.txt"]);

        let unstage = repo.unstage_command(&["a.txt", "b.txt"]);
        assert_eq!(unstage.argv(), vec!["reset", "HEAD", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_sync_command_places_flags_last() {
        let repo = Repository::new("/tmp/example");
        let command = repo.sync_command("push", "origin", "main", &["--force"]);
        assert_eq!(command.argv(), vec!["push", "origin", "main", "--force"]);
    }

    #[test]
    fn test_clone_command_runs_from_parent() {
        let command = clone_command("https://example.com/proj.git", Path::new("/tmp/work/proj"));
        assert_eq!(command.repo_path(), Path::new("/tmp/work"));
        assert_eq!(command.argv(), vec!["clone", "https://example.com/proj.git", "proj"]);
    }

    #[test]
    fn test_clone_command_bare_destination() {
        let command = clone_command("https://example.com/proj.git", Path::new("proj"));
        assert_eq!(command.repo_path(), Path::new("."));
        assert_eq!(command.argv(), vec!["clone", "https://example.com/proj.git", "proj"]);
    }

    #[test]
    fn test_empty_repository_log_is_empty() {
        let (_temp, repo_path) = create_test_repo();
        let repo = Repository::new(&repo_path);

        let entries = repo.log_blocking(None).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_status_reports_untracked_file() {
        let (_temp, repo_path) = create_test_repo();
        fs::write(repo_path.join("notes.txt"), "jot").unwrap();

        let repo = Repository::new(&repo_path);
        let snapshot = repo.status_blocking().unwrap();
        assert!(snapshot.untracked.contains("notes.txt"));
        assert!(snapshot.staged.is_empty());
    }

    #[test]
    fn test_commit_with_empty_staging_area() {
        let (_temp, repo_path) = create_test_repo();
        let repo = Repository::new(&repo_path);

        let result = repo.commit_blocking("no changes staged");
        assert!(matches!(result, Err(GitError::NothingToCommit(_))));
    }

    #[test]
    fn test_stage_and_commit_cycle() {
        let (_temp, repo_path) = create_test_repo();
        fs::write(repo_path.join("README.md"), "hello").unwrap();

        let repo = Repository::new(&repo_path);
        repo.add_blocking(&["README.md"]).unwrap();

        let summary = repo.commit_blocking("first commit").unwrap();
        assert!(summary.root_commit);
        assert_eq!(summary.message, "first commit");
        assert_eq!(summary.files_changed, 1);

        let entries = repo.log_blocking(None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "first commit");

        assert!(repo.status_blocking().unwrap().is_clean());
    }

    #[test]
    fn test_branches_after_first_commit() {
        let (_temp, repo_path) = create_test_repo();
        fs::write(repo_path.join("a.txt"), "a").unwrap();

        let repo = Repository::new(&repo_path);
        repo.add_blocking(&["a.txt"]).unwrap();
        repo.commit_blocking("first").unwrap();

        let branches = repo.branches_blocking().unwrap();
        assert!(!branches.current.is_empty());
        assert!(branches.others.is_empty());
    }

    #[test]
    fn test_branches_in_empty_repository_fail_to_decode() {
        let (_temp, repo_path) = create_test_repo();
        let repo = Repository::new(&repo_path);

        // No commit yet, so git prints no branch listing at all
        let result = repo.branches_blocking();
        assert!(matches!(result, Err(GitError::ParseError(_))));
    }

    #[test]
    fn test_configured_output_limit_is_enforced() {
        let (_temp, repo_path) = create_test_repo();
        fs::write(repo_path.join("notes.txt"), "jot").unwrap();

        let mut config = Config::default_config();
        config.limits.default_output_bytes = 1;

        let repo = Repository::with_config(&repo_path, &config).unwrap();
        let result = repo.status_blocking();
        assert!(matches!(
            result,
            Err(GitError::OutputOverflow { limit: 1, .. })
        ));
    }

    #[test]
    fn test_configured_log_limit_reaches_log_command() {
        let mut config = Config::default_config();
        config.limits.default_output_bytes = 512;
        config.limits.log_output_bytes = 4096;

        let repo = Repository::with_config("/tmp/example", &config).unwrap();
        assert_eq!(repo.log_command(None).output_limit(), 4096);
        assert_eq!(repo.status_command().output_limit(), 512);
    }

    #[test]
    fn test_clone_session_honors_config() {
        let mut config = Config::default_config();
        config.git.binary = "/opt/git/bin/git".to_string();
        config.relay.timeout_seconds = 7;

        let session = clone_session(Some(&config));
        assert_eq!(session.binary(), "/opt/git/bin/git");
        assert_eq!(session.timeout(), Duration::from_secs(7));

        let default_session = clone_session(None);
        assert_eq!(default_session.binary(), "git");
        assert_eq!(default_session.timeout(), DEFAULT_RELAY_TIMEOUT);
    }

    #[test]
    fn test_describe_after_commit() {
        let (_temp, repo_path) = create_test_repo();
        fs::write(repo_path.join("a.txt"), "a").unwrap();

        let repo = Repository::new(&repo_path);
        repo.add_blocking(&["a.txt"]).unwrap();
        repo.commit_blocking("first").unwrap();

        let id = repo.describe_blocking().unwrap();
        assert!(!id.is_empty());
        assert_eq!(id, id.trim());
    }

    #[tokio::test]
    async fn test_async_stage_and_commit_cycle() {
        let (_temp, repo_path) = create_test_repo();
        fs::write(repo_path.join("async.txt"), "async").unwrap();

        let repo = Repository::new(&repo_path);
        repo.add(&["async.txt"]).await.unwrap();
        repo.commit("async commit").await.unwrap();

        let entries = repo.log(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "async commit");
    }
}
