//! # suimon
//!
//! A terminal monitor for Sui full nodes, validators, public RPC endpoints
//! and peers.
//!
//! The crate fetches metrics from every configured host, keeps one
//! atomically replaced snapshot per host, and renders them either as a set
//! of static tables or as a live node dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Orchestrator ──▶ FetchGroup ──▶ HostPoller ──▶ MetricsFetcher   │
//! │  (one round)      (RPC/NODE/     (one host,     (SuiClient:      │
//! │                    PEERS)         one snapshot)  JSON-RPC +      │
//! │                                        │         Prometheus)     │
//! │                                        ▼                         │
//! │  RefreshLoop ─── query tick ──▶ Host (RwLock<Arc<Snapshot>>)     │
//! │      │                                 │                         │
//! │      └───── render tick ──▶ columns::mapper ──▶ CellSurface      │
//! │                                        │                         │
//! │  TableBuilder ─────────────────────────┘──▶ TableSurface         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`orchestrator`]**: runs every enabled group concurrently; a round only
//!   fails when every group failed
//! - **[`poller`]**: refreshes one host and swaps its snapshot in as a whole
//! - **[`refresh`]**: query and render schedules of the live dashboard under
//!   one cancellation token
//! - **[`columns`]**: the closed set of column names, the per-table layouts
//!   and the pure snapshot-to-columns mappers
//! - **[`builder`]**: collects updated hosts into tables and lays them out
//! - **[`ui`]**: ratatui rendering of tables and the dashboard
//!
//! ## Usage
//!
//! ### One acquisition round
//!
//! ```no_run
//! use std::sync::Arc;
//! use suimon::{FetchGroup, GroupKind, HostInfo, HostPoller, Orchestrator, SuiClient};
//! use suimon::client::DEFAULT_REQUEST_TIMEOUT;
//!
//! # tokio_test::block_on(async {
//! let client = Arc::new(SuiClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap());
//! let rpc = HostInfo::rpc_endpoint("https://fullnode.testnet.sui.io:443").unwrap();
//!
//! let orchestrator = Orchestrator::new(vec![FetchGroup::new(
//!     GroupKind::Rpc,
//!     true,
//!     vec![HostPoller::new(rpc, client)],
//! )]);
//!
//! let report = orchestrator.run_once().await.unwrap();
//! println!("{} groups, {}", report.attempted, report.failures);
//! # });
//! ```
//!
//! ### Live refresh into a cell surface
//!
//! ```no_run
//! use std::sync::Arc;
//! use suimon::{run_live, HostInfo, HostPoller, Intervals, SuiClient};
//! use suimon::client::DEFAULT_REQUEST_TIMEOUT;
//! use suimon::ui::DashboardCells;
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let client = Arc::new(SuiClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap());
//! let node = HostPoller::new(HostInfo::node("127.0.0.1", 9000, 9184), client);
//! let cells = Arc::new(DashboardCells::node());
//!
//! let token = CancellationToken::new();
//! run_live(node, cells, Intervals::default(), token).await.unwrap();
//! # });
//! ```

pub mod app;
pub mod builder;
pub mod client;
pub mod columns;
pub mod config;
pub mod duration;
pub mod error;
pub mod events;
pub mod host;
pub mod monitor;
pub mod orchestrator;
pub mod poller;
pub mod refresh;
pub mod surface;
pub mod ui;

// Re-export main types for convenience
pub use builder::{TableBuilder, TableConfig};
pub use client::{MetricsFetcher, SuiClient};
pub use columns::{ColumnName, ColumnValue, ColumnValues, TableType};
pub use config::SuimonConfig;
pub use error::{AggregatedError, Error, FetchError, SurfaceError};
pub use host::{Host, HostInfo, HostStatus, Thresholds};
pub use orchestrator::{FetchGroup, FetchReport, GroupKind, Orchestrator};
pub use poller::HostPoller;
pub use refresh::{run_live, Intervals, LoopState, RefreshLoop};
pub use surface::{CellSurface, TableRow, TableSurface};
pub use suimon_types::MetricsSnapshot;
