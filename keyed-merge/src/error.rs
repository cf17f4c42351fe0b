//! Error taxonomy shared by the crate.
//!
//! Malformed input lines are deliberately absent from this list: the record parsers report them
//! as [`Parsed::Invalid`](crate::record::Parsed) and the pipelines drop them.

use thiserror::Error;

/// Errors surfaced by job construction, boundary tables, and execution.
#[derive(Debug, Error)]
pub enum Error {
    /// An average was requested over a group that delivered no records.
    #[error("aggregation over an empty group")]
    EmptyGroup,

    /// A boundary table whose splitters are not strictly ascending, or that does not fit the
    /// requested number of partitions.
    #[error("invalid boundary table: {0}")]
    InvalidBoundaryTable(String),

    /// Inconsistent job or sampler configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker of the timely substrate failed.
    #[error("execution error: {0}")]
    Execution(String),

    /// Side table or boundary table file access.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Boundary table (de)serialization.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
