pub mod audit;
pub mod config;
pub mod error;
pub mod git;

// Re-export commonly used types for convenience
pub use audit::AuditLogger;
pub use config::{Config, ConfigError};
pub use error::{GitError, GitResult};
pub use git::{Credentials, Executor, GitCommand, GitVersion, Repository};
