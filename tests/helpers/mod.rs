use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to create a test git repository
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    // Initialize git repo
    Command::new("git")
        .args(["init"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to init git repo");

    configure_user(&repo_path);

    (temp_dir, repo_path)
}

/// Helper to set the committer identity a repository needs
pub fn configure_user(repo_path: &Path) {
    Command::new("git")
        .args(["config", "user.name", "Test User"])
        .current_dir(repo_path)
        .output()
        .expect("Failed to set git user.name");

    Command::new("git")
        .args(["config", "user.email", "test@example.com"])
        .current_dir(repo_path)
        .output()
        .expect("Failed to set git user.email");
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    let file_path = repo_path.join(file);
    fs::write(&file_path, content).expect("Failed to write file");

    Command::new("git")
        .args(["add", file])
        .current_dir(repo_path)
        .output()
        .expect("Failed to add file");

    Command::new("git")
        .args(["commit", "-m", message])
        .current_dir(repo_path)
        .output()
        .expect("Failed to commit");
}

/// Helper to create a bare repository usable as a push/pull remote
///
/// Its HEAD is pointed at `branch` so clones check out the branch the
/// tests push.
pub fn create_bare_remote(branch: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let remote_path = temp_dir.path().join("remote.git");

    Command::new("git")
        .args(["init", "--bare"])
        .arg(&remote_path)
        .output()
        .expect("Failed to init bare repo");

    Command::new("git")
        .args(["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")])
        .current_dir(&remote_path)
        .output()
        .expect("Failed to point remote HEAD");

    (temp_dir, remote_path)
}
