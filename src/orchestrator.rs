//! One-shot acquisition across data groups.
//!
//! Every enabled [`FetchGroup`] runs as its own task. The orchestrator waits
//! for all of them, then drains a channel of group errors sized to the number
//! of groups so no task ever blocks while reporting.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::{AggregatedError, Error, FetchError, GroupFailure, Result};
use crate::host::Host;
use crate::poller::HostPoller;

/// Independent category of hosts fetched together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Public JSON-RPC endpoints.
    Rpc,
    /// The operator's own node.
    Node,
    /// Peers of the node, scraped for metrics only.
    Peers,
}

impl GroupKind {
    pub const ALL: [GroupKind; 3] = [GroupKind::Rpc, GroupKind::Node, GroupKind::Peers];

    pub fn name(&self) -> &'static str {
        match self {
            GroupKind::Rpc => "RPC",
            GroupKind::Node => "NODE",
            GroupKind::Peers => "PEERS",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The pollers of one group and whether the group takes part in acquisition.
#[derive(Debug)]
pub struct FetchGroup {
    kind: GroupKind,
    enabled: bool,
    pollers: Vec<HostPoller>,
}

impl FetchGroup {
    pub fn new(kind: GroupKind, enabled: bool, pollers: Vec<HostPoller>) -> Self {
        Self {
            kind,
            enabled,
            pollers,
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pollers(&self) -> &[HostPoller] {
        &self.pollers
    }

    /// Hosts in enumeration order.
    pub fn hosts(&self) -> impl Iterator<Item = &Arc<Host>> {
        self.pollers.iter().map(HostPoller::host)
    }

    /// Refresh every host of the group concurrently.
    ///
    /// The group fails when none of its hosts could be refreshed, including
    /// when it has no hosts at all; the first error is returned. Single-host
    /// failures are logged.
    pub async fn refresh(&self) -> std::result::Result<(), FetchError> {
        if self.pollers.is_empty() {
            return Err(FetchError::NoHosts);
        }

        let mut tasks = JoinSet::new();
        for poller in self.pollers.iter().cloned() {
            tasks.spawn(async move {
                let result = poller.refresh().await;
                (poller, result)
            });
        }

        let mut first_error = None;
        let mut succeeded = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => succeeded += 1,
                Ok((poller, Err(e))) => {
                    warn!(
                        group = %self.kind,
                        host = %poller.host().info(),
                        error = %e,
                        "Host refresh failed"
                    );
                    first_error.get_or_insert(e);
                }
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    first_error.get_or_insert(FetchError::Http(e.to_string()));
                }
            }
        }

        match first_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(()),
        }
    }
}

/// Summary of a successful round.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Number of enabled groups that ran.
    pub attempted: usize,
    /// Groups that failed while at least one other succeeded.
    pub failures: AggregatedError,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs all enabled groups concurrently and aggregates their outcome.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    groups: Vec<Arc<FetchGroup>>,
}

impl Orchestrator {
    pub fn new(groups: Vec<FetchGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn groups(&self) -> &[Arc<FetchGroup>] {
        &self.groups
    }

    pub fn group(&self, kind: GroupKind) -> Option<&Arc<FetchGroup>> {
        self.groups.iter().find(|g| g.kind() == kind)
    }

    /// Run one acquisition round.
    ///
    /// Succeeds when at least one enabled group succeeded; the failures of the
    /// others are kept in the report. Fails with [`Error::Aggregation`] when
    /// every enabled group failed.
    pub async fn run_once(&self) -> Result<FetchReport> {
        let enabled: Vec<_> = self
            .groups
            .iter()
            .filter(|g| g.is_enabled())
            .cloned()
            .collect();
        if enabled.is_empty() {
            return Err(Error::NoGroupsEnabled);
        }

        let (tx, mut rx) = mpsc::channel::<GroupFailure>(GroupKind::ALL.len().max(enabled.len()));
        let mut tasks = JoinSet::new();

        for group in &enabled {
            let group = Arc::clone(group);
            let tx = tx.clone();
            tasks.spawn(async move {
                if let Err(error) = group.refresh().await {
                    let failure = GroupFailure {
                        group: group.kind(),
                        error,
                    };
                    // Capacity covers every group, so this never waits.
                    let _ = tx.send(failure).await;
                }
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
                return Err(Error::Cancelled);
            }
        }

        let mut failures = AggregatedError::new();
        while let Some(failure) = rx.recv().await {
            failures.push(failure);
        }

        if failures.len() == enabled.len() {
            warn!(failed = failures.len(), "All data groups failed");
            return Err(Error::Aggregation(failures));
        }

        if failures.is_empty() {
            info!(groups = enabled.len(), "Acquisition round complete");
        } else {
            warn!(
                groups = enabled.len(),
                failed = failures.len(),
                "Acquisition round complete with failures: {}",
                failures
            );
        }

        Ok(FetchReport {
            attempted: enabled.len(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetricsFetcher;
    use crate::host::HostInfo;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use suimon_types::MetricsSnapshot;

    /// Fails every host of the listed groups with a timeout.
    struct GroupFaults(HashSet<GroupKind>);

    #[async_trait]
    impl MetricsFetcher for GroupFaults {
        async fn fetch(&self, host: &HostInfo) -> std::result::Result<MetricsSnapshot, FetchError> {
            if self.0.contains(&host.group) {
                return Err(FetchError::Timeout);
            }
            Ok(MetricsSnapshot {
                latest_checkpoint: Some(1),
                ..Default::default()
            })
        }
    }

    fn orchestrator(failing: &[GroupKind]) -> Orchestrator {
        let fetcher: Arc<dyn MetricsFetcher> =
            Arc::new(GroupFaults(failing.iter().copied().collect()));
        let poller = |info: HostInfo| HostPoller::new(info, Arc::clone(&fetcher));

        Orchestrator::new(vec![
            FetchGroup::new(
                GroupKind::Rpc,
                true,
                vec![
                    poller(HostInfo::rpc_endpoint("https://a.example.com").unwrap()),
                    poller(HostInfo::rpc_endpoint("https://b.example.com").unwrap()),
                ],
            ),
            FetchGroup::new(
                GroupKind::Node,
                true,
                vec![poller(HostInfo::node("127.0.0.1", 9000, 9184))],
            ),
            FetchGroup::new(
                GroupKind::Peers,
                true,
                vec![poller(HostInfo::peer("10.0.0.1:8084", 9184).unwrap())],
            ),
        ])
    }

    fn updated_hosts(orchestrator: &Orchestrator, kind: GroupKind) -> usize {
        orchestrator
            .group(kind)
            .map(|g| g.hosts().filter(|h| h.is_updated()).count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_all_groups_succeed() {
        let orchestrator = orchestrator(&[]);
        let report = orchestrator.run_once().await.unwrap();

        assert_eq!(report.attempted, 3);
        assert!(report.is_complete());
        assert_eq!(updated_hosts(&orchestrator, GroupKind::Rpc), 2);
    }

    #[tokio::test]
    async fn test_one_group_failing_is_best_effort() {
        let orchestrator = orchestrator(&[GroupKind::Rpc]);
        let report = orchestrator.run_once().await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures.contains(GroupKind::Rpc));
        assert_eq!(updated_hosts(&orchestrator, GroupKind::Rpc), 0);
        assert_eq!(updated_hosts(&orchestrator, GroupKind::Node), 1);
        assert_eq!(updated_hosts(&orchestrator, GroupKind::Peers), 1);
    }

    #[tokio::test]
    async fn test_all_groups_failing_is_fatal() {
        let orchestrator = orchestrator(&GroupKind::ALL);
        let err = orchestrator.run_once().await.unwrap_err();

        match err {
            Error::Aggregation(failures) => assert_eq!(failures.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failure_count_matches_failing_groups() {
        let cases: [&[GroupKind]; 4] = [
            &[],
            &[GroupKind::Peers],
            &[GroupKind::Node, GroupKind::Peers],
            &GroupKind::ALL,
        ];

        for failing in cases {
            let result = orchestrator(failing).run_once().await;
            let k = GroupKind::ALL.len();
            let f = failing.len();
            match result {
                Ok(report) => {
                    assert!(f < k);
                    assert_eq!(report.failures.len(), f);
                }
                Err(Error::Aggregation(failures)) => {
                    assert_eq!(f, k);
                    assert_eq!(failures.len(), f);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn test_disabled_groups_are_not_counted() {
        let fetcher: Arc<dyn MetricsFetcher> =
            Arc::new(GroupFaults([GroupKind::Peers].into_iter().collect()));
        let orchestrator = Orchestrator::new(vec![
            FetchGroup::new(
                GroupKind::Node,
                false,
                vec![HostPoller::new(
                    HostInfo::node("127.0.0.1", 9000, 9184),
                    Arc::clone(&fetcher),
                )],
            ),
            FetchGroup::new(
                GroupKind::Peers,
                true,
                vec![HostPoller::new(
                    HostInfo::peer("10.0.0.1:8084", 9184).unwrap(),
                    fetcher,
                )],
            ),
        ]);

        let err = orchestrator.run_once().await.unwrap_err();
        assert!(matches!(err, Error::Aggregation(ref f) if f.len() == 1));
        assert_eq!(updated_hosts(&orchestrator, GroupKind::Node), 0);
    }

    #[tokio::test]
    async fn test_no_enabled_groups() {
        let orchestrator = Orchestrator::new(vec![FetchGroup::new(GroupKind::Rpc, false, vec![])]);
        assert!(matches!(
            orchestrator.run_once().await,
            Err(Error::NoGroupsEnabled)
        ));
    }

    #[tokio::test]
    async fn test_partially_failing_group_succeeds() {
        struct OnlyFirst;

        #[async_trait]
        impl MetricsFetcher for OnlyFirst {
            async fn fetch(
                &self,
                host: &HostInfo,
            ) -> std::result::Result<MetricsSnapshot, FetchError> {
                if host.address == "a.example.com" {
                    Ok(MetricsSnapshot::default())
                } else {
                    Err(FetchError::Connection("refused".to_string()))
                }
            }
        }

        let fetcher: Arc<dyn MetricsFetcher> = Arc::new(OnlyFirst);
        let group = FetchGroup::new(
            GroupKind::Rpc,
            true,
            vec![
                HostPoller::new(
                    HostInfo::rpc_endpoint("https://a.example.com").unwrap(),
                    Arc::clone(&fetcher),
                ),
                HostPoller::new(
                    HostInfo::rpc_endpoint("https://b.example.com").unwrap(),
                    fetcher,
                ),
            ],
        );

        group.refresh().await.unwrap();
        assert_eq!(group.hosts().filter(|h| h.is_updated()).count(), 1);
    }

    #[tokio::test]
    async fn test_enabled_group_without_hosts_fails() {
        let fetcher: Arc<dyn MetricsFetcher> = Arc::new(GroupFaults(Default::default()));
        let orchestrator = Orchestrator::new(vec![
            FetchGroup::new(GroupKind::Rpc, true, vec![]),
            FetchGroup::new(
                GroupKind::Node,
                true,
                vec![HostPoller::new(
                    HostInfo::node("127.0.0.1", 9000, 9184),
                    fetcher,
                )],
            ),
        ]);

        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures.contains(GroupKind::Rpc));

        let empty = Orchestrator::new(vec![FetchGroup::new(GroupKind::Peers, true, vec![])]);
        match empty.run_once().await {
            Err(Error::Aggregation(failures)) => {
                let errors: Vec<_> = failures.iter().map(|f| &f.error).collect();
                assert!(matches!(errors[..], [FetchError::NoHosts]));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
