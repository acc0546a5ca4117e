mod helpers;

use gitrelay::git::{parse_branches, parse_log, parse_remotes, parse_status, GitCommand};
use gitrelay::Repository;
use helpers::{create_commit, create_test_repo};

/// Rendering a descriptor and reading the subcommand token back out of
/// the command line recovers the original operation string.
#[test]
fn test_descriptor_command_line_round_trip() {
    for operation in ["status", "log", "cherry-pick", "remote add"] {
        let command = GitCommand::new("/tmp/repo", operation)
            .flag("--verbose")
            .postfix("extra");

        let line = command.command_line();
        let after_binary = line.strip_prefix("git ").unwrap();
        assert!(after_binary.starts_with(operation));

        let token_count = operation.split_whitespace().count();
        let recovered = after_binary
            .split_whitespace()
            .take(token_count)
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(recovered, operation);
    }
}

/// Decoding the same remote listing twice yields identical maps.
#[test]
fn test_remote_decode_is_idempotent() {
    let raw = "origin\thttps://example.com/a.git (fetch)\n\
               origin\thttps://example.com/a.git (push)\n\
               mirror\thttps://fetch.example.com/b.git (fetch)\n\
               mirror\tgit@push.example.com:b.git (push)\n";

    let first = parse_remotes(raw).unwrap();
    let second = parse_remotes(raw).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

/// Whitespace-only decoder inputs behave like empty ones, except the
/// branch listing, which must always name a current branch.
#[test]
fn test_decoders_on_blank_input() {
    assert!(parse_log("\n  \n").unwrap().is_empty());
    assert!(parse_status("\n", "\n").unwrap().is_clean());
    assert!(parse_branches("\n\n").is_err());
    assert!(parse_remotes("\n").unwrap().is_empty());
}

/// Log entries come back in emission order, newest first.
#[test]
fn test_log_preserves_emission_order() {
    let (_temp, repo_path) = create_test_repo();
    let repo = Repository::new(&repo_path);

    for i in 1..=5 {
        create_commit(&repo_path, &format!("f{i}.txt"), "x", &format!("commit {i}"));
    }

    let entries = repo.log_blocking(None).unwrap();
    assert_eq!(entries.len(), 5);
    for (idx, entry) in entries.iter().enumerate() {
        assert_eq!(entry.message, format!("commit {}", 5 - idx));
        assert_eq!(entry.commit.len(), 40);
        assert!(entry.author.contains("Test User"));
    }
}

/// A branch listing from a real repository keeps the non-current
/// branches in git's reported order.
#[test]
fn test_branch_order_preserved_end_to_end() {
    let (_temp, repo_path) = create_test_repo();
    let repo = Repository::new(&repo_path);

    create_commit(&repo_path, "a.txt", "a", "first");
    for name in ["alpha", "beta", "gamma"] {
        repo.create_branch_blocking(name).unwrap();
    }

    let branches = repo.branches_blocking().unwrap();
    assert!(!branches.current.is_empty());
    assert_eq!(branches.others, vec!["alpha", "beta", "gamma"]);
    assert!(!branches.others.contains(&branches.current));
}

/// A path that is staged and then edited again shows up once, as staged.
#[test]
fn test_modified_after_staging_lands_in_one_set() {
    let (_temp, repo_path) = create_test_repo();
    let repo = Repository::new(&repo_path);

    create_commit(&repo_path, "tracked.txt", "v1", "base");
    std::fs::write(repo_path.join("tracked.txt"), "v2").unwrap();
    repo.add_blocking(&["tracked.txt"]).unwrap();
    std::fs::write(repo_path.join("tracked.txt"), "v3").unwrap();

    let snapshot = repo.status_blocking().unwrap();
    assert!(snapshot.staged.contains("tracked.txt"));
    assert!(!snapshot.unstaged.contains("tracked.txt"));
    assert!(!snapshot.untracked.contains("tracked.txt"));
}
