//! Issue service layer
//!
//! Validates request inputs, drives the repositories and shapes the
//! responses. Nothing in here knows about HTTP.

pub mod error;
pub mod forms;
pub mod issues;
pub mod views;

pub use error::{ErrorBody, IssueError};
pub use forms::{FieldValue, IssueDeletion, IssueFilter, IssueUpdate, NewIssue};
pub use issues::{IssueResult, IssueService, IssueServiceOptions};
pub use views::{Acknowledgement, IssueView};
