//! Live refresh of a single host.
//!
//! Two schedules run side by side under one [`CancellationToken`]: the query
//! schedule refreshes the host, the render schedule copies its current
//! snapshot into the cells of a [`CellSurface`]. Whichever stops first
//! cancels the other.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::columns::mapper::{node_dashboard_columns, HostRecord};
use crate::columns::TableType;
use crate::error::{Error, Result, SurfaceError};
use crate::host::{Host, HostStatus, Thresholds};
use crate::poller::HostPoller;
use crate::surface::CellSurface;

/// Tick periods of the two schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub query: Duration,
    pub render: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            query: Duration::from_secs(1),
            render: Duration::from_millis(500),
        }
    }
}

/// Lifecycle of a [`RefreshLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// One schedule stopped; waiting for the other.
    Cancelling,
    Stopped,
}

/// Query and render schedules for one host.
pub struct RefreshLoop {
    poller: HostPoller,
    cells: Arc<dyn CellSurface>,
    intervals: Intervals,
    thresholds: Thresholds,
    token: CancellationToken,
    state: watch::Sender<LoopState>,
}

impl RefreshLoop {
    pub fn new(
        poller: HostPoller,
        cells: Arc<dyn CellSurface>,
        intervals: Intervals,
        token: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(LoopState::Running);
        Self {
            poller,
            cells,
            intervals,
            thresholds: Thresholds::default(),
            token,
            state,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Watch the loop's lifecycle.
    pub fn state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Run both schedules until either stops or the token is cancelled.
    ///
    /// Returns the first error reported by either schedule. A torn-down
    /// surface or an external cancellation ends the loop without error.
    pub async fn run(self) -> Result<()> {
        let host = Arc::clone(self.poller.host());
        info!(host = %host.info(), "Starting live refresh");

        let mut tasks = JoinSet::new();
        tasks.spawn(query_schedule(
            self.poller.clone(),
            self.intervals.query,
            self.token.clone(),
        ));
        tasks.spawn(render_schedule(
            Arc::clone(&host),
            Arc::clone(&self.cells),
            self.intervals.render,
            self.thresholds,
            self.token.clone(),
        ));

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            if *self.state.borrow() == LoopState::Running {
                self.state.send_replace(LoopState::Cancelling);
                self.token.cancel();
            }

            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(host = %host.info(), error = %e, "Live refresh failed");
                    first_error.get_or_insert(e);
                }
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => {
                    first_error.get_or_insert(Error::Cancelled);
                }
            }
        }

        self.state.send_replace(LoopState::Stopped);
        info!(host = %host.info(), "Live refresh stopped");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Refresh the host every period. The first failure ends the schedule.
async fn query_schedule(
    poller: HostPoller,
    period: Duration,
    token: CancellationToken,
) -> Result<()> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            result = poller.refresh() => {
                result.map_err(|source| Error::Fetch {
                    host: poller.host().info().to_string(),
                    source,
                })?;
            }
        }
    }
}

/// Write the host's columns into the surface every period.
async fn render_schedule(
    host: Arc<Host>,
    cells: Arc<dyn CellSurface>,
    period: Duration,
    thresholds: Thresholds,
    token: CancellationToken,
) -> Result<()> {
    let columns = cells.columns();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let snapshot = host.snapshot();
        let mut values = node_dashboard_columns(&HostRecord {
            index: 0,
            info: host.info(),
            snapshot: &snapshot,
            status: HostStatus::of(&snapshot, &thresholds),
        });

        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = values.remove(column).ok_or(Error::Assembly {
                table: TableType::Node,
                column: *column,
            })?;
            row.push((*column, value));
        }

        for (column, value) in &row {
            if token.is_cancelled() {
                return Ok(());
            }
            match cells.write_cell(*column, value) {
                Ok(()) => {}
                Err(SurfaceError::Closed) => {
                    debug!("Render surface closed");
                    token.cancel();
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Refresh one host and render it until cancelled or until the first error.
pub async fn run_live(
    poller: HostPoller,
    cells: Arc<dyn CellSurface>,
    intervals: Intervals,
    token: CancellationToken,
) -> Result<()> {
    RefreshLoop::new(poller, cells, intervals, token)
        .run()
        .await
}
