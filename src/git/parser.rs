use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::{GitError, GitResult};

/// Format flag handed to `git log`; [`parse_log`] decodes its output
///
/// Renders each commit as a JSON object with a trailing comma. The two
/// sides form one wire contract and change together.
pub const LOG_FORMAT_FLAG: &str = concat!(
    "--pretty=format:",
    r#"{"commit":"%H","author":"%an <%ae>","date":"%ad","message":"%s"},"#
);

/// Parse `git log` output produced with the pseudo-JSON format string
///
/// Each entry renders as a JSON object followed by a comma; entries are
/// separated by newlines and the last one keeps its trailing comma. The
/// raw text becomes valid JSON once that comma is stripped and the whole
/// thing is wrapped in brackets.
pub fn parse_log(raw: &str) -> GitResult<Vec<LogEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let body = trimmed.strip_suffix(',').unwrap_or(trimmed);
    let wrapped = format!("[{body}]");

    serde_json::from_str(&wrapped)
        .map_err(|e| GitError::ParseError(format!("log output is not valid JSON: {e}")))
}

/// Parse `git status --porcelain` plus an untracked-file listing into a
/// three-way snapshot
///
/// Every path lands in exactly one set. Untracked wins over everything,
/// then the index column, then the worktree column; a path that is both
/// staged and dirty (`MM`) reports as staged.
pub fn parse_status(porcelain: &str, untracked_listing: &str) -> GitResult<StatusSnapshot> {
    let mut snapshot = StatusSnapshot::default();

    for line in porcelain.lines() {
        if line.len() < 4 {
            continue;
        }

        // Two status columns, one space, then the path text
        let mut prefix = line.chars();
        let index_col = prefix.next().unwrap_or(' ');
        let worktree_col = prefix.next().unwrap_or(' ');
        let text = &line[3..];

        // Renames and copies print "old -> new"; keep the new path
        let path = match index_col {
            'R' | 'C' => text.rsplit(" -> ").next().unwrap_or(text).to_string(),
            _ => text.to_string(),
        };

        match index_col {
            '?' => {
                snapshot.untracked.insert(path);
            }
            '!' => {}
            c if c != ' ' => {
                snapshot.staged.insert(path);
            }
            _ if worktree_col != ' ' => {
                snapshot.unstaged.insert(path);
            }
            _ => {}
        }
    }

    // The untracked listing is authoritative: a path it names leaves
    // the other sets, as with a file whose removal is staged while the
    // working copy stays behind
    for line in untracked_listing.lines() {
        if !line.is_empty() {
            snapshot.staged.remove(line);
            snapshot.unstaged.remove(line);
            snapshot.untracked.insert(line.to_string());
        }
    }

    Ok(snapshot)
}

/// Parse `git branch` output into the current branch and the rest
///
/// Exactly one line must carry the `*` designator. A listing without
/// one, the empty listing included, is malformed rather than a silently
/// empty result.
pub fn parse_branches(raw: &str) -> GitResult<BranchSet> {
    let mut current: Option<String> = None;
    let mut others = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('*') {
            if current.is_some() {
                return Err(GitError::ParseError(
                    "branch listing marks more than one current branch".to_string(),
                ));
            }
            current = Some(rest.trim().to_string());
        } else {
            others.push(line.to_string());
        }
    }

    match current {
        Some(current) => Ok(BranchSet { current, others }),
        None => Err(GitError::ParseError(
            "branch listing marks no current branch".to_string(),
        )),
    }
}

/// Parse `git tag` output into a list of tag names
pub fn parse_tags(raw: &str) -> GitResult<Vec<String>> {
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse `git remote -v` output into a map of remote name to URL
///
/// A remote whose fetch and push URLs match collapses to one entry;
/// otherwise both are kept.
pub fn parse_remotes(raw: &str) -> GitResult<RemoteMap> {
    let mut fetch_urls: BTreeMap<String, String> = BTreeMap::new();
    let mut push_urls: BTreeMap<String, String> = BTreeMap::new();

    for line in raw.lines() {
        if line.is_empty() {
            continue;
        }

        let (name, rest) = line
            .split_once('\t')
            .ok_or_else(|| GitError::ParseError(format!("malformed remote line: {line}")))?;

        let mut parts = rest.rsplitn(2, ' ');
        let role = parts.next().unwrap_or("");
        let url = parts.next().unwrap_or(rest).to_string();

        match role {
            "(push)" => {
                push_urls.insert(name.to_string(), url);
            }
            _ => {
                fetch_urls.insert(name.to_string(), url);
            }
        }
    }

    let mut remotes = RemoteMap::new();
    let names: BTreeSet<String> = fetch_urls.keys().chain(push_urls.keys()).cloned().collect();

    for name in names {
        let fetch = fetch_urls.remove(&name);
        let push = push_urls.remove(&name);

        let url = match (fetch, push) {
            (Some(fetch), Some(push)) if fetch == push => RemoteUrl::Uniform(fetch),
            (Some(fetch), Some(push)) => RemoteUrl::Diverged { fetch, push },
            (Some(single), None) | (None, Some(single)) => RemoteUrl::Uniform(single),
            (None, None) => continue,
        };

        remotes.insert(name, url);
    }

    Ok(remotes)
}

/// Clean-tree text `git commit` prints instead of a summary
///
/// Depending on the git version this arrives under a zero or a non-zero
/// exit code, so detection is textual on both paths.
pub(crate) fn is_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit") || text.contains("no changes added to commit")
}

/// Parse the human-readable summary `git commit` prints
///
/// The header line looks like `[branch hash] message`, with an optional
/// `(root-commit)` designator, followed by a stats line. Clean-tree text
/// is reported as NothingToCommit rather than a decode failure.
pub fn parse_commit(raw: &str) -> GitResult<CommitSummary> {
    if is_nothing_to_commit(raw) {
        return Err(GitError::NothingToCommit(raw.trim().to_string()));
    }

    let header = raw
        .lines()
        .find(|line| line.starts_with('['))
        .ok_or_else(|| GitError::ParseError("commit output has no summary header".to_string()))?;

    let close = header
        .find(']')
        .ok_or_else(|| GitError::ParseError("commit header is unterminated".to_string()))?;

    let inside = &header[1..close];
    let message = header[close + 1..].trim_start().to_string();

    let mut tokens: Vec<&str> = inside.split_whitespace().collect();
    let hash = tokens
        .pop()
        .ok_or_else(|| GitError::ParseError("commit header has no hash".to_string()))?
        .to_string();

    let root_commit = tokens.iter().any(|t| *t == "(root-commit)");
    let branch = tokens
        .into_iter()
        .filter(|t| *t != "(root-commit)")
        .collect::<Vec<_>>()
        .join(" ");

    let mut summary = CommitSummary {
        branch,
        hash,
        message,
        root_commit,
        files_changed: 0,
        insertions: 0,
        deletions: 0,
    };

    if let Some(stats) = raw.lines().find(|line| line.contains("changed")) {
        for segment in stats.split(',') {
            let segment = segment.trim();
            let Some(count) = segment
                .split_whitespace()
                .next()
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };

            if segment.contains("file") {
                summary.files_changed = count;
            } else if segment.contains("insertion") {
                summary.insertions = count;
            } else if segment.contains("deletion") {
                summary.deletions = count;
            }
        }
    }

    Ok(summary)
}

/// A single commit from the log
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    pub commit: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

/// Working-tree state split into disjoint path sets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub staged: BTreeSet<String>,
    pub unstaged: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
}

impl StatusSnapshot {
    /// True when no set has any entries
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

/// Local branches, with the checked-out one singled out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSet {
    pub current: String,
    pub others: Vec<String>,
}

/// A remote's URL as reported by `git remote -v`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteUrl {
    Uniform(String),
    Diverged { fetch: String, push: String },
}

impl RemoteUrl {
    /// The URL used for fetching
    pub fn fetch_url(&self) -> &str {
        match self {
            RemoteUrl::Uniform(url) => url,
            RemoteUrl::Diverged { fetch, .. } => fetch,
        }
    }

    /// The URL used for pushing
    pub fn push_url(&self) -> &str {
        match self {
            RemoteUrl::Uniform(url) => url,
            RemoteUrl::Diverged { push, .. } => push,
        }
    }
}

/// Remote name to URL mapping
pub type RemoteMap = BTreeMap<String, RemoteUrl>;

/// What `git commit` reported about the commit it created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub branch: String,
    pub hash: String,
    pub message: String,
    pub root_commit: bool,
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
}
