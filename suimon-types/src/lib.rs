//! # suimon-types
//!
//! Core types for Sui node monitoring. This crate defines the record a single
//! fetch cycle produces for one host, so that pollers, column mappers and
//! renderers can agree on it without depending on each other.
//!
//! ## Design Goals
//!
//! - **Whole-record replacement**: a [`MetricsSnapshot`] is always produced by
//!   exactly one fetch and replaced as a unit, never patched field by field
//! - **Explicit absence**: metrics a host does not expose are `None`, so the
//!   display layer can render a placeholder instead of a misleading zero
//! - **Derived values stay derived**: backlogs and sync percentages are computed
//!   from the stored counters on read
//! - **Optional serialization**: enable the `serde` feature to dump snapshots
//!
//! ## Example
//!
//! ```rust
//! use suimon_types::MetricsSnapshot;
//!
//! let snapshot = MetricsSnapshot {
//!     updated: true,
//!     highest_known_checkpoint: Some(1_000),
//!     highest_synced_checkpoint: Some(990),
//!     last_executed_checkpoint: Some(985),
//!     ..Default::default()
//! };
//!
//! assert_eq!(snapshot.checkpoint_sync_backlog(), Some(10));
//! assert_eq!(snapshot.checkpoint_exec_backlog(), Some(5));
//! assert_eq!(snapshot.checkpoint_sync_percentage(), Some(99));
//! ```

mod metrics;
mod system_state;

pub use metrics::*;
pub use system_state::*;

/// Basis points in one whole; validator voting power is expressed in these.
pub const TOTAL_VOTING_POWER: u64 = 10_000;

/// MIST per SUI.
pub const MIST_PER_SUI: u64 = 1_000_000_000;
