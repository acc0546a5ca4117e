use crate::error::{GitError, GitResult};
use std::process::Command;

/// Minimum required git version
///
/// The status decoder reads `--porcelain` output and the untracked
/// listing uses `ls-files -o --exclude-standard`; both are stable from
/// 1.7 onward.
const MIN_GIT_VERSION: (u32, u32) = (1, 7);

/// Represents a git version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Detect the installed git version
    pub fn detect() -> GitResult<Self> {
        Self::detect_with("git")
    }

    /// Detect the version of a specific git binary
    pub fn detect_with(binary: &str) -> GitResult<Self> {
        let output = Command::new(binary)
            .arg("--version")
            .output()
            .map_err(|e| GitError::VersionDetectFailed(format!("Failed to execute git: {}", e)))?;

        if !output.status.success() {
            return Err(GitError::VersionDetectFailed(
                "git --version command failed".to_string(),
            ));
        }

        let version_string = String::from_utf8_lossy(&output.stdout);
        Self::parse(&version_string)
    }

    /// Parse git version from string like "git version 2.39.2"
    pub fn parse(version_str: &str) -> GitResult<Self> {
        // Expected format: "git version X.Y.Z" or "git version X.Y.Z.windows.1" etc.
        let parts: Vec<&str> = version_str.split_whitespace().collect();

        if parts.len() < 3 || parts[0] != "git" || parts[1] != "version" {
            return Err(GitError::ParseError(format!(
                "Unexpected git version format: {}",
                version_str
            )));
        }

        let version_nums = parts[2];
        let nums: Vec<&str> = version_nums.split('.').collect();

        if nums.len() < 2 {
            return Err(GitError::ParseError(format!(
                "Invalid version number format: {}",
                version_nums
            )));
        }

        let major = nums[0]
            .parse::<u32>()
            .map_err(|_| GitError::ParseError(format!("Invalid major version: {}", nums[0])))?;

        let minor = nums[1]
            .parse::<u32>()
            .map_err(|_| GitError::ParseError(format!("Invalid minor version: {}", nums[1])))?;

        let patch = if nums.len() >= 3 {
            nums[2]
                .parse::<u32>()
                .unwrap_or(0) // Allow patch version to have non-numeric suffixes
        } else {
            0
        };

        Ok(GitVersion {
            major,
            minor,
            patch,
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        self.major > MIN_GIT_VERSION.0
            || (self.major == MIN_GIT_VERSION.0 && self.minor >= MIN_GIT_VERSION.1)
    }

    /// Validate that the default git binary is sufficient
    pub fn validate() -> GitResult<Self> {
        Self::validate_with("git")
    }

    /// Validate that a specific git binary is sufficient
    pub fn validate_with(binary: &str) -> GitResult<Self> {
        let version = Self::detect_with(binary)?;

        if !version.is_supported() {
            return Err(GitError::VersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
