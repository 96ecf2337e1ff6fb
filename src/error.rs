//! Error types for acquisition, assembly and rendering.

use std::fmt;

use thiserror::Error;

use crate::columns::{ColumnName, TableType};
use crate::orchestrator::GroupKind;

/// Errors that can occur while fetching metrics for one host.
///
/// A fetch error is never fatal on its own: the orchestrator records it and
/// moves on, the refresh loop reports it upward.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Could not connect to the endpoint.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The JSON-RPC endpoint answered with an error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A metric the host must expose was absent from its response.
    #[error("Metric not reported: {0}")]
    MissingMetric(String),

    /// The host has no endpoint for what its group needs.
    #[error("No {0} endpoint configured")]
    NoEndpoint(&'static str),

    /// An enabled group was given no hosts to refresh.
    #[error("Group has no hosts")]
    NoHosts,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// Errors reported by a render surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface was torn down and accepts no more writes.
    #[error("Render surface closed")]
    Closed,

    /// Writing to the terminal failed.
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One failed group from an acquisition round.
#[derive(Debug, Clone)]
pub struct GroupFailure {
    pub group: GroupKind,
    pub error: FetchError,
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.group, self.error)
    }
}

/// Combined per-group failures of one acquisition round.
///
/// An empty list means every enabled group succeeded.
#[derive(Debug, Clone, Default)]
pub struct AggregatedError {
    failures: Vec<GroupFailure>,
}

impl AggregatedError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: GroupFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupFailure> {
        self.failures.iter()
    }

    /// Whether the given group is among the failures.
    pub fn contains(&self, group: GroupKind) -> bool {
        self.failures.iter().any(|f| f.group == group)
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.len() {
            0 => write!(f, "no errors"),
            1 => write!(f, "1 error occurred: {}", self.failures[0]),
            n => {
                write!(f, "{} errors occurred:", n)?;
                for failure in &self.failures {
                    write!(f, "\n\t* {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregatedError {}

/// Top-level error for a monitoring round or a live session.
#[derive(Debug, Error)]
pub enum Error {
    /// A single host fetch failed where it could not be absorbed (live mode).
    #[error("Failed to fetch metrics for {host}: {source}")]
    Fetch {
        host: String,
        #[source]
        source: FetchError,
    },

    /// Every enabled group failed in a one-shot round.
    #[error("All data groups failed: {0}")]
    Aggregation(AggregatedError),

    /// A one-shot round was requested with every group disabled.
    #[error("No data groups enabled")]
    NoGroupsEnabled,

    /// A display column had no value in the mapping it was built from.
    #[error("Failed to get metric for column {column} in {table} table")]
    Assembly {
        table: TableType,
        column: ColumnName,
    },

    /// The render surface reported a failure.
    #[error(transparent)]
    RenderSurface(#[from] SurfaceError),

    /// A background task was aborted before it could report.
    #[error("Task cancelled before completion")]
    Cancelled,
}

/// Result type for monitoring rounds and live sessions.
pub type Result<T> = std::result::Result<T, Error>;
