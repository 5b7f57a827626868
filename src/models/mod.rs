//! Persisted records

pub mod issue;
pub mod project;

pub use issue::{Issue, IssueField};
pub use project::Project;
