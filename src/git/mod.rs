pub mod command;
pub mod executor;
pub mod global;
pub mod parser;
pub mod relay;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use command::GitCommand;
pub use executor::{ExecutionOutput, Executor};
pub use parser::{
    BranchSet, CommitSummary, LogEntry, RemoteMap, RemoteUrl, StatusSnapshot, parse_branches,
    parse_commit, parse_log, parse_remotes, parse_status, parse_tags,
};
pub use relay::{Credentials, RelayOutcome, RelaySession};
pub use repository::Repository;
pub use version::GitVersion;
