//! Configuration loading.
//!
//! Settings come from a config file (TOML, YAML or JSON, by extension)
//! layered under `SUIMON__*` environment variables:
//!
//! ```toml
//! network = "testnet"
//!
//! [monitors]
//! rpc_table = true
//! node_table = true
//! peers_table = true
//!
//! [rpc]
//! hosts = ["https://fullnode.testnet.sui.io:443"]
//!
//! [node]
//! address = "127.0.0.1"
//! rpc_port = 9000
//! metrics_port = 9184
//!
//! [peers]
//! addresses = ["10.0.0.7:8084"]
//!
//! [hosts."10.0.0.7"]
//! country = "Germany"
//!
//! [intervals]
//! query = "1s"
//! render = "500ms"
//! request_timeout = "3s"
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::client::DEFAULT_REQUEST_TIMEOUT;
use crate::columns::{TableSource, TableType};
use crate::duration::deserialize_duration;
use crate::host::{HostInfo, Thresholds, DEFAULT_METRICS_PORT};
use crate::orchestrator::GroupKind;
use crate::refresh::Intervals;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SUIMON_CONFIG_PATH";

const ENV_PREFIX: &str = "SUIMON";
const DEFAULT_CONFIG_FILE: &str = ".suimon/suimon.toml";
const DEFAULT_RPC_PORT: u16 = 9000;

/// Sui network the public RPC defaults point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Devnet,
    Mainnet,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Public full node endpoint of the network.
    pub fn default_rpc_url(&self) -> String {
        format!("https://fullnode.{}.sui.io:443", self.name())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which tables the static report prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorsConfig {
    pub rpc_table: bool,
    pub node_table: bool,
    pub validator_table: bool,
    pub peers_table: bool,
    pub system_state_table: bool,
    pub validators_counts_table: bool,
    pub validators_at_risk_table: bool,
    pub validator_reports_table: bool,
    pub active_validators_table: bool,
}

impl Default for MonitorsConfig {
    fn default() -> Self {
        Self {
            rpc_table: true,
            node_table: false,
            validator_table: false,
            peers_table: false,
            system_state_table: true,
            validators_counts_table: true,
            validators_at_risk_table: false,
            validator_reports_table: false,
            active_validators_table: false,
        }
    }
}

impl MonitorsConfig {
    /// Enabled tables in display order.
    pub fn enabled_tables(&self) -> Vec<TableType> {
        TableType::ALL
            .into_iter()
            .filter(|table| self.is_enabled(*table))
            .collect()
    }

    pub fn is_enabled(&self, table: TableType) -> bool {
        match table {
            TableType::Rpc => self.rpc_table,
            TableType::Node => self.node_table,
            TableType::Validator => self.validator_table,
            TableType::Peers => self.peers_table,
            TableType::SystemState => self.system_state_table,
            TableType::ValidatorsCounts => self.validators_counts_table,
            TableType::ValidatorsAtRisk => self.validators_at_risk_table,
            TableType::ValidatorReports => self.validator_reports_table,
            TableType::ActiveValidators => self.active_validators_table,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoints. Empty means the network's public full node.
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    pub address: String,
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeersConfig {
    /// Peers as `host:port`.
    pub addresses: Vec<String>,
    pub metrics_port: u16,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

/// Static metadata about a host, keyed by its address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostMetadata {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntervalsConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub query: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub render: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        let intervals = Intervals::default();
        Self {
            query: intervals.query,
            render: intervals.render,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<IntervalsConfig> for Intervals {
    fn from(config: IntervalsConfig) -> Self {
        Intervals {
            query: config.query,
            render: config.render,
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuimonConfig {
    pub network: Network,
    pub monitors: MonitorsConfig,
    pub rpc: RpcConfig,
    pub node: Option<NodeConfig>,
    pub peers: PeersConfig,
    pub hosts: HashMap<String, HostMetadata>,
    pub intervals: IntervalsConfig,
    pub thresholds: Thresholds,
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

impl SuimonConfig {
    /// Load the config file and environment overrides.
    ///
    /// The file is `path` if given, else `$SUIMON_CONFIG_PATH`, else
    /// `~/.suimon/suimon.toml`. Only the last one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut builder = Config::builder();
        match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                builder = builder.add_source(File::from(path));
            }
            None => {
                if let Some(home) = std::env::var_os("HOME") {
                    let path = PathBuf::from(home).join(DEFAULT_CONFIG_FILE);
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rpc.hosts")
                    .with_list_parse_key("peers.addresses"),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn with_network(mut self, network: Option<Network>) -> Self {
        if let Some(network) = network {
            self.network = network;
        }
        self
    }

    /// RPC endpoints, falling back to the network's public full node.
    pub fn rpc_hosts(&self) -> Vec<String> {
        if self.rpc.hosts.is_empty() {
            vec![self.network.default_rpc_url()]
        } else {
            self.rpc.hosts.clone()
        }
    }

    /// Groups that must be fetched to fill the given tables.
    ///
    /// System tables read the node's state when a node is configured and the
    /// RPC hosts' otherwise.
    pub fn required_groups(&self, tables: &[TableType]) -> BTreeSet<GroupKind> {
        tables
            .iter()
            .map(|table| match table.source() {
                TableSource::Hosts(kind) => kind,
                TableSource::SystemState if self.node.is_some() => GroupKind::Node,
                TableSource::SystemState => GroupKind::Rpc,
            })
            .collect()
    }

    /// Check that every requested table has hosts to read from.
    pub fn validate(&self, tables: &[TableType]) -> Result<()> {
        if tables.is_empty() {
            bail!("No tables enabled; enable at least one under [monitors] or pass --tables");
        }
        if self.intervals.query.is_zero() || self.intervals.render.is_zero() {
            bail!("Query and render intervals must be greater than zero");
        }
        if self.intervals.request_timeout.is_zero() {
            bail!("Request timeout must be greater than zero");
        }

        for group in self.required_groups(tables) {
            match group {
                GroupKind::Node if self.node.is_none() => {
                    bail!("Node tables requested but no [node] section configured")
                }
                GroupKind::Peers if self.peers.addresses.is_empty() => {
                    bail!("Peers table requested but peers.addresses is empty")
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Host identities of one group, with their configured metadata.
    pub fn host_infos(&self, group: GroupKind) -> Result<Vec<HostInfo>> {
        let infos = match group {
            GroupKind::Rpc => self
                .rpc_hosts()
                .iter()
                .map(|url| HostInfo::rpc_endpoint(url))
                .collect::<Result<Vec<_>>>()?,
            GroupKind::Node => self
                .node
                .iter()
                .map(|node| HostInfo::node(&node.address, node.rpc_port, node.metrics_port))
                .collect(),
            GroupKind::Peers => self
                .peers
                .addresses
                .iter()
                .map(|address| HostInfo::peer(address, self.peers.metrics_port))
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(infos
            .into_iter()
            .map(|info| {
                let country = self.hosts.get(&info.address).and_then(|m| m.country.clone());
                info.with_country(country)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_file() {
        let file = write_config(
            r#"
network = "mainnet"

[monitors]
rpc_table = false
node_table = true
peers_table = true

[node]
address = "10.0.0.2"

[peers]
addresses = ["peer-a:8084", "peer-b:8084"]

[hosts.peer-a]
country = "Germany"

[intervals]
query = "2s"
render = "250ms"

[thresholds]
sync_warning = 95
"#,
        );

        let config = SuimonConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(
            config.monitors.enabled_tables(),
            vec![
                TableType::Node,
                TableType::Peers,
                TableType::SystemState,
                TableType::ValidatorsCounts
            ]
        );
        assert_eq!(config.intervals.query, Duration::from_secs(2));
        assert_eq!(config.intervals.render, Duration::from_millis(250));
        assert_eq!(config.intervals.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.thresholds.sync_warning, 95);
        assert_eq!(config.thresholds.sync_critical, 90);

        let node = config.node.as_ref().unwrap();
        assert_eq!(node.rpc_port, 9000);
        assert_eq!(node.metrics_port, 9184);

        let peers = config.host_infos(GroupKind::Peers).unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].location.country.as_deref(), Some("Germany"));
        assert!(peers[1].location.country.is_none());

        assert_eq!(
            config.rpc_hosts(),
            vec!["https://fullnode.mainnet.sui.io:443".to_string()]
        );
        config.validate(&config.monitors.enabled_tables()).unwrap();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(SuimonConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let file = write_config("[intervals]\nquery = \"soon\"\n");
        assert!(SuimonConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_system_tables_follow_node() {
        let mut config = SuimonConfig::default();
        let tables = [TableType::SystemState, TableType::ActiveValidators];
        assert_eq!(
            config.required_groups(&tables),
            BTreeSet::from([GroupKind::Rpc])
        );

        config.node = Some(NodeConfig {
            address: "127.0.0.1".to_string(),
            rpc_port: 9000,
            metrics_port: 9184,
        });
        assert_eq!(
            config.required_groups(&tables),
            BTreeSet::from([GroupKind::Node])
        );
    }

    #[test]
    fn test_validate() {
        let config = SuimonConfig::default();
        assert!(config.validate(&[]).is_err());
        assert!(config.validate(&[TableType::Node]).is_err());
        assert!(config.validate(&[TableType::Peers]).is_err());
        config.validate(&[TableType::Rpc, TableType::SystemState]).unwrap();
    }

    #[test]
    fn test_network_override() {
        let config = SuimonConfig::default().with_network(Some(Network::Devnet));
        assert_eq!(config.rpc_hosts(), vec![Network::Devnet.default_rpc_url()]);
    }
}
