//! Document store layer
//!
//! The rest of the crate talks to persistence only through
//! [`DocumentBackend`]; the MongoDB driver and the in-memory store are
//! interchangeable implementations of it.

pub mod backends;
pub mod document;
pub mod error;
pub mod traits;
pub mod types;

pub use document::Document;
pub use error::{NoSQLError, Result};
pub use traits::{DocumentBackend, NoSQLBackend};
pub use types::{FindOneAndUpdateOptions, IndexModel, NoSQLBackendType, UpdateResult};
