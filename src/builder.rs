//! Table assembly for static reports.
//!
//! A [`TableBuilder`] walks the hosts of a group (or the records of the
//! system state), maps each one to its columns and collects the rows into a
//! [`TableConfig`]. The config then lays itself out on a [`TableSurface`]
//! following the table's row bands.

use std::collections::BTreeMap;
use std::sync::Arc;

use suimon_types::{MetricsSnapshot, SystemState};

use crate::columns::layout::{table_bands, Bands};
use crate::columns::mapper::{self, HostRecord};
use crate::columns::{ColumnName, ColumnValue, ColumnValues, TableSource, TableType};
use crate::error::{Error, Result};
use crate::host::{HostStatus, Thresholds};
use crate::orchestrator::{FetchGroup, GroupKind};
use crate::surface::{TableRow, TableSurface};

/// Groups consulted for the system state, in order of preference.
const SYSTEM_STATE_GROUPS: [GroupKind; 2] = [GroupKind::Node, GroupKind::Rpc];

/// Rows of one table, ready to be laid out.
#[derive(Debug, Clone)]
pub struct TableConfig {
    table: TableType,
    bands: Bands,
    widths: BTreeMap<ColumnName, u16>,
    rows: Vec<ColumnValues>,
}

impl TableConfig {
    pub fn new(table: TableType) -> Self {
        let bands = table_bands(table);
        let widths = bands
            .iter()
            .flat_map(|band| band.iter())
            .map(|column| (*column, column.caption_width()))
            .collect();

        Self {
            table,
            bands,
            widths,
            rows: Vec::new(),
        }
    }

    pub fn table(&self) -> TableType {
        self.table
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ColumnValues] {
        &self.rows
    }

    /// Display width of a column: its caption or its widest value.
    pub fn width(&self, column: ColumnName) -> u16 {
        self.widths.get(&column).copied().unwrap_or(0)
    }

    /// Add one item. Every declared column must be present.
    pub fn push(&mut self, mut values: ColumnValues) -> Result<()> {
        let mut row = ColumnValues::new();
        for (column, width) in self.widths.iter_mut() {
            let value = values.remove(column).ok_or(Error::Assembly {
                table: self.table,
                column: *column,
            })?;
            *width = (*width).max(value.to_string().chars().count() as u16);
            row.insert(*column, value);
        }
        self.rows.push(row);
        Ok(())
    }

    /// Lay the rows out on a surface and render it.
    ///
    /// A table with a single band prints its header once. Wider tables wrap
    /// every item over their bands, each band under its own header.
    pub fn assemble(&self, surface: &mut dyn TableSurface) -> Result<()> {
        let slots = self.bands.iter().map(|band| band.len()).max().unwrap_or(0);
        let widths: Vec<u16> = (0..slots)
            .map(|slot| {
                self.bands
                    .iter()
                    .filter_map(|band| band.get(slot))
                    .map(|column| self.width(*column))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        surface.set_columns(self.table.title(), &widths)?;

        if let [band] = self.bands {
            surface.append_row(TableRow::Header(captions(band, slots)))?;
            for row in &self.rows {
                surface.append_row(TableRow::Values(cells(band, row, slots)))?;
            }
        } else {
            for (item, row) in self.rows.iter().enumerate() {
                if item > 0 {
                    surface.append_row(TableRow::Separator)?;
                }
                for band in self.bands {
                    surface.append_row(TableRow::Header(captions(band, slots)))?;
                    surface.append_row(TableRow::Values(cells(band, row, slots)))?;
                }
            }
        }

        surface.render()?;
        Ok(())
    }
}

fn captions(band: &[ColumnName], slots: usize) -> Vec<String> {
    let mut captions: Vec<String> = band.iter().map(|c| c.caption().to_string()).collect();
    captions.resize(slots, String::new());
    captions
}

fn cells(band: &[ColumnName], row: &ColumnValues, slots: usize) -> Vec<String> {
    let mut cells: Vec<String> = band
        .iter()
        .map(|column| {
            row.get(column)
                .map(ColumnValue::to_string)
                .unwrap_or_default()
        })
        .collect();
    cells.resize(slots, String::new());
    cells
}

/// Builds table configs from the current host snapshots.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    thresholds: Thresholds,
}

impl TableBuilder {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Collect the rows of one table.
    ///
    /// Hosts that were never updated are left out; the others keep the
    /// number of their position in the group.
    pub fn build(&self, table: TableType, groups: &[Arc<FetchGroup>]) -> Result<TableConfig> {
        let mut config = TableConfig::new(table);

        match table.source() {
            TableSource::Hosts(kind) => {
                let Some(group) = groups.iter().find(|g| g.kind() == kind) else {
                    return Ok(config);
                };

                for (index, host) in group.hosts().enumerate() {
                    let snapshot = host.snapshot();
                    if !snapshot.updated {
                        continue;
                    }
                    // Health and metrics must come from the same record.
                    let record = HostRecord {
                        index,
                        info: host.info(),
                        snapshot: &snapshot,
                        status: HostStatus::of(&snapshot, &self.thresholds),
                    };
                    if let Some(values) = host_columns(table, &record) {
                        config.push(values)?;
                    }
                }
            }
            TableSource::SystemState => {
                if let Some(snapshot) = system_state_snapshot(groups) {
                    if let Some(state) = &snapshot.system_state {
                        for values in system_columns(table, state) {
                            config.push(values)?;
                        }
                    }
                }
            }
        }

        Ok(config)
    }
}

/// Row of a host table; `None` for tables fed by the system state.
fn host_columns(table: TableType, record: &HostRecord) -> Option<ColumnValues> {
    match table {
        TableType::Rpc => Some(mapper::rpc_columns(record)),
        TableType::Node => Some(mapper::node_columns(record)),
        TableType::Validator => Some(mapper::validator_columns(record)),
        TableType::Peers => Some(mapper::peer_columns(record)),
        TableType::SystemState
        | TableType::ValidatorsCounts
        | TableType::ValidatorsAtRisk
        | TableType::ValidatorReports
        | TableType::ActiveValidators => None,
    }
}

fn system_columns(table: TableType, state: &SystemState) -> Vec<ColumnValues> {
    match table {
        TableType::SystemState => vec![mapper::system_state_columns(state)],
        TableType::ValidatorsCounts => vec![mapper::validator_counts_columns(state)],
        TableType::ValidatorsAtRisk => state
            .validators_at_risk
            .iter()
            .enumerate()
            .map(|(index, v)| mapper::validator_at_risk_columns(index, v))
            .collect(),
        TableType::ValidatorReports => state
            .validator_reports
            .iter()
            .enumerate()
            .map(|(index, r)| mapper::validator_report_columns(index, r))
            .collect(),
        TableType::ActiveValidators => state
            .active_validators
            .iter()
            .enumerate()
            .map(|(index, v)| mapper::active_validator_columns(index, v))
            .collect(),
        TableType::Rpc | TableType::Node | TableType::Validator | TableType::Peers => Vec::new(),
    }
}

/// First updated snapshot carrying a system state, node before RPC hosts.
fn system_state_snapshot(groups: &[Arc<FetchGroup>]) -> Option<Arc<MetricsSnapshot>> {
    SYSTEM_STATE_GROUPS
        .iter()
        .filter_map(|kind| groups.iter().find(|g| g.kind() == *kind))
        .flat_map(|group| group.hosts().map(|host| host.snapshot()))
        .find(|snapshot| snapshot.updated && snapshot.system_state.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetricsFetcher;
    use crate::columns::layout::table_columns;
    use crate::error::{FetchError, SurfaceError};
    use crate::host::HostInfo;
    use crate::poller::HostPoller;
    use async_trait::async_trait;
    use suimon_types::{ValidatorAtRisk, ValidatorSummary};

    struct Unused;

    #[async_trait]
    impl MetricsFetcher for Unused {
        async fn fetch(
            &self,
            _host: &HostInfo,
        ) -> std::result::Result<MetricsSnapshot, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    #[derive(Default)]
    struct Recorder {
        title: String,
        widths: Vec<u16>,
        rows: Vec<TableRow>,
        rendered: bool,
    }

    impl TableSurface for Recorder {
        fn set_columns(
            &mut self,
            title: &str,
            widths: &[u16],
        ) -> std::result::Result<(), SurfaceError> {
            self.title = title.to_string();
            self.widths = widths.to_vec();
            Ok(())
        }

        fn append_row(&mut self, row: TableRow) -> std::result::Result<(), SurfaceError> {
            self.rows.push(row);
            Ok(())
        }

        fn render(&mut self) -> std::result::Result<(), SurfaceError> {
            self.rendered = true;
            Ok(())
        }
    }

    fn group(kind: GroupKind, infos: Vec<HostInfo>) -> Arc<FetchGroup> {
        let fetcher: Arc<dyn MetricsFetcher> = Arc::new(Unused);
        let pollers = infos
            .into_iter()
            .map(|info| HostPoller::new(info, Arc::clone(&fetcher)))
            .collect();
        Arc::new(FetchGroup::new(kind, true, pollers))
    }

    fn rpc_group() -> Arc<FetchGroup> {
        group(
            GroupKind::Rpc,
            vec![
                HostInfo::rpc_endpoint("https://a.example.com").unwrap(),
                HostInfo::rpc_endpoint("https://b.example.com").unwrap(),
                HostInfo::rpc_endpoint("https://c.example.com").unwrap(),
            ],
        )
    }

    fn fetched(checkpoint: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            updated: true,
            generation: 1,
            latest_checkpoint: Some(checkpoint),
            total_transaction_blocks: Some(checkpoint * 10),
            ..Default::default()
        }
    }

    fn values_rows(surface: &Recorder) -> Vec<&Vec<String>> {
        surface
            .rows
            .iter()
            .filter_map(|row| match row {
                TableRow::Values(values) => Some(values),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_stale_hosts_are_excluded() {
        let groups = vec![rpc_group()];
        let builder = TableBuilder::default();

        let config = builder.build(TableType::Rpc, &groups).unwrap();
        assert!(config.is_empty());

        let hosts: Vec<_> = groups[0].hosts().cloned().collect();
        hosts[1].replace(fetched(100));

        let config = builder.build(TableType::Rpc, &groups).unwrap();
        assert_eq!(config.row_count(), 1);
        assert_eq!(config.rows()[0][&ColumnName::Index], ColumnValue::Number(2));
        assert_eq!(
            config.rows()[0][&ColumnName::LatestCheckpoint],
            ColumnValue::Number(100)
        );

        hosts[0].replace(fetched(90));
        let config = builder.build(TableType::Rpc, &groups).unwrap();
        assert_eq!(config.row_count(), 2);
    }

    #[test]
    fn test_missing_column_is_an_assembly_error() {
        let mut config = TableConfig::new(TableType::Peers);
        let mut values: ColumnValues = table_columns(TableType::Peers)
            .into_iter()
            .map(|column| (column, ColumnValue::Missing))
            .collect();
        values.remove(&ColumnName::Uptime);

        let err = config.push(values).unwrap_err();
        assert!(matches!(
            err,
            Error::Assembly {
                table: TableType::Peers,
                column: ColumnName::Uptime
            }
        ));
        assert!(config.is_empty());
    }

    #[test]
    fn test_single_band_table_prints_header_once() {
        let groups = vec![rpc_group()];
        for (n, host) in groups[0].hosts().enumerate() {
            host.replace(fetched(n as u64 * 1_000_000));
        }

        let config = TableBuilder::default()
            .build(TableType::Rpc, &groups)
            .unwrap();
        let mut surface = Recorder::default();
        config.assemble(&mut surface).unwrap();

        assert_eq!(surface.title, "RPC");
        assert!(surface.rendered);
        assert!(matches!(surface.rows[0], TableRow::Header(_)));
        assert_eq!(surface.rows.len(), 4);
        assert_eq!(values_rows(&surface).len(), 3);

        let checkpoint_slot = table_bands(TableType::Rpc)[0]
            .iter()
            .position(|c| *c == ColumnName::LatestCheckpoint)
            .unwrap();
        assert_eq!(values_rows(&surface)[2][checkpoint_slot], "2000000");
        assert!(surface.widths[checkpoint_slot] >= 7);
    }

    #[test]
    fn test_multi_band_table_wraps_each_item() {
        let node = group(
            GroupKind::Node,
            vec![
                HostInfo::node("10.0.0.1", 9000, 9184),
                HostInfo::node("10.0.0.2", 9000, 9184),
            ],
        );
        for host in node.hosts() {
            host.replace(fetched(5));
        }

        let config = TableBuilder::default()
            .build(TableType::Node, &[Arc::clone(&node)])
            .unwrap();
        let mut surface = Recorder::default();
        config.assemble(&mut surface).unwrap();

        let bands = table_bands(TableType::Node).len();
        let separators = surface
            .rows
            .iter()
            .filter(|row| matches!(row, TableRow::Separator))
            .count();
        assert_eq!(separators, 1);
        assert_eq!(values_rows(&surface).len(), 2 * bands);

        let slots = table_bands(TableType::Node)
            .iter()
            .map(|b| b.len())
            .max()
            .unwrap();
        assert_eq!(surface.widths.len(), slots);
        assert!(values_rows(&surface).iter().all(|row| row.len() == slots));
    }

    #[test]
    fn test_system_tables_prefer_node_state() {
        let rpc = rpc_group();
        let node = group(
            GroupKind::Node,
            vec![HostInfo::node("10.0.0.1", 9000, 9184)],
        );

        let state = |epoch: u64, validators: usize| SystemState {
            epoch,
            active_validators: (0..validators)
                .map(|n| ValidatorSummary {
                    name: format!("v{n}"),
                    address: format!("0x{n}"),
                    ..Default::default()
                })
                .collect(),
            validators_at_risk: vec![ValidatorAtRisk {
                name: "v0".to_string(),
                address: "0x0".to_string(),
                epochs_at_risk: 1,
            }],
            ..Default::default()
        };

        rpc.hosts().next().unwrap().replace(MetricsSnapshot {
            system_state: Some(state(7, 2)),
            ..fetched(1)
        });
        let groups = vec![Arc::clone(&rpc), Arc::clone(&node)];
        let builder = TableBuilder::default();

        let config = builder.build(TableType::ActiveValidators, &groups).unwrap();
        assert_eq!(config.row_count(), 2);

        node.hosts().next().unwrap().replace(MetricsSnapshot {
            system_state: Some(state(8, 4)),
            ..fetched(1)
        });
        let config = builder.build(TableType::ActiveValidators, &groups).unwrap();
        assert_eq!(config.row_count(), 4);

        let config = builder.build(TableType::SystemState, &groups).unwrap();
        assert_eq!(config.row_count(), 1);
        assert_eq!(
            config.rows()[0][&ColumnName::SystemEpoch],
            ColumnValue::Number(8)
        );

        let config = builder.build(TableType::ValidatorsAtRisk, &groups).unwrap();
        assert_eq!(config.row_count(), 1);
    }

    #[test]
    fn test_system_tables_empty_without_state() {
        let groups = vec![rpc_group()];
        groups[0].hosts().next().unwrap().replace(fetched(1));

        for table in [
            TableType::SystemState,
            TableType::ValidatorsCounts,
            TableType::ActiveValidators,
        ] {
            let config = TableBuilder::default().build(table, &groups).unwrap();
            assert!(config.is_empty());
        }
    }

    /// A writer flips the node between two records while tables are built;
    /// every row's health must agree with its own sync percentage.
    #[test]
    fn test_health_matches_row_snapshot_under_refresh() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let node = group(
            GroupKind::Node,
            vec![HostInfo::node("10.0.0.1", 9000, 9184)],
        );
        let host = Arc::clone(node.hosts().next().unwrap());
        let synced = |synced: u64| MetricsSnapshot {
            updated: true,
            highest_known_checkpoint: Some(100),
            highest_synced_checkpoint: Some(synced),
            ..Default::default()
        };
        host.replace(synced(100));

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut lagging = false;
                while !done.load(Ordering::Acquire) {
                    lagging = !lagging;
                    host.replace(synced(if lagging { 50 } else { 100 }));
                }
            })
        };

        let groups = vec![node];
        let builder = TableBuilder::default();
        for _ in 0..20_000 {
            let config = builder.build(TableType::Node, &groups).unwrap();
            let row = &config.rows()[0];
            let expected = match row[&ColumnName::CheckpointSyncPercentage] {
                ColumnValue::Percent(50) => HostStatus::Red,
                ColumnValue::Percent(100) => HostStatus::Green,
                ref other => panic!("unexpected sync percentage {other}"),
            };
            assert_eq!(row[&ColumnName::Health], ColumnValue::Status(expected));
        }

        done.store(true, Ordering::Release);
        writer.join().unwrap();
    }

    #[test]
    fn test_each_table_maps_through_one_source() {
        let info = HostInfo::node("10.0.0.1", 9000, 9184);
        let snapshot = fetched(1);
        let record = HostRecord {
            index: 0,
            info: &info,
            snapshot: &snapshot,
            status: HostStatus::Green,
        };
        let state = SystemState {
            active_validators: vec![ValidatorSummary::default()],
            ..Default::default()
        };

        for table in TableType::ALL {
            let host_row = host_columns(table, &record);
            let system_rows = system_columns(table, &state);
            match table.source() {
                TableSource::Hosts(_) => {
                    let declared = table_columns(table).len();
                    assert_eq!(host_row.map(|v| v.len()), Some(declared));
                    assert!(system_rows.is_empty());
                }
                TableSource::SystemState => assert!(host_row.is_none()),
            }
        }
    }
}
