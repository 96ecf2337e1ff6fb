//! Entry points wiring configuration, acquisition and rendering together.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::App;
use crate::builder::TableBuilder;
use crate::client::{MetricsFetcher, SuiClient};
use crate::columns::TableType;
use crate::config::SuimonConfig;
use crate::duration::format_duration;
use crate::events;
use crate::orchestrator::{FetchGroup, GroupKind, Orchestrator};
use crate::poller::HostPoller;
use crate::refresh::{Intervals, RefreshLoop};
use crate::ui::{self, DashboardCells, InlinePrinter, Theme};

/// Minimum terminal size for usable display
const MIN_WIDTH: u16 = 80;
const MIN_HEIGHT: u16 = 20;

/// Build the groups needed for `required`, the others disabled and empty.
pub fn build_orchestrator(
    config: &SuimonConfig,
    required: &BTreeSet<GroupKind>,
    fetcher: Arc<dyn MetricsFetcher>,
) -> Result<Orchestrator> {
    let mut groups = Vec::with_capacity(GroupKind::ALL.len());

    for kind in GroupKind::ALL {
        let enabled = required.contains(&kind);
        let pollers = if enabled {
            config
                .host_infos(kind)?
                .into_iter()
                .map(|info| {
                    HostPoller::new(info, Arc::clone(&fetcher))
                        .with_timeout(config.intervals.request_timeout)
                })
                .collect()
        } else {
            Vec::new()
        };
        groups.push(FetchGroup::new(kind, enabled, pollers));
    }

    Ok(Orchestrator::new(groups))
}

/// Fetch every required group once and print the requested tables.
pub fn run_static(config: &SuimonConfig, tables: &[TableType], theme: Theme) -> Result<()> {
    config.validate(tables)?;

    let fetcher: Arc<dyn MetricsFetcher> =
        Arc::new(SuiClient::new(config.intervals.request_timeout)?);
    let required = config.required_groups(tables);
    let orchestrator = build_orchestrator(config, &required, fetcher)?;

    let rt = tokio::runtime::Runtime::new()?;

    eprint!("Generating tables...");
    io::stderr().flush()?;
    let round = rt.block_on(orchestrator.run_once());
    eprintln!();
    let report = round?;

    for failure in report.failures.iter() {
        warn!(group = %failure.group, error = %failure.error, "Group skipped");
    }

    let builder = TableBuilder::new(config.thresholds);
    let mut printer = InlinePrinter::new(theme);
    for table in tables {
        let rows = builder.build(*table, orchestrator.groups())?;
        info!(table = %table, rows = rows.row_count(), "Printing table");
        rows.assemble(&mut printer)?;
    }

    Ok(())
}

/// Watch the configured node on a live dashboard until the user quits or
/// the refresh loop fails.
pub fn run_dynamic(config: &SuimonConfig, theme: Theme) -> Result<()> {
    let node = config
        .host_infos(GroupKind::Node)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("The dashboard needs a [node] section in the configuration"))?;
    if config.intervals.query.is_zero() || config.intervals.render.is_zero() {
        bail!("Query and render intervals must be greater than zero");
    }

    let fetcher: Arc<dyn MetricsFetcher> =
        Arc::new(SuiClient::new(config.intervals.request_timeout)?);
    let host_label = node.to_string();
    let poller = HostPoller::new(node, fetcher).with_timeout(config.intervals.request_timeout);

    let intervals = Intervals::from(config.intervals);
    let cells = Arc::new(DashboardCells::node());
    let token = CancellationToken::new();

    let rt = tokio::runtime::Runtime::new()?;
    let refresh = RefreshLoop::new(poller, cells.clone(), intervals, token.clone())
        .with_thresholds(config.thresholds);
    let handle = rt.spawn(refresh.run());

    let app = App::new(Arc::clone(&cells), host_label, theme).with_refresh_description(format!(
        "query every {} | render every {}",
        format_duration(intervals.query),
        format_duration(intervals.render)
    ));
    let ui_result = run_tui(app, &token);

    token.cancel();
    cells.close();
    let loop_result = rt
        .block_on(handle)
        .map_err(|e| anyhow!("Refresh task failed: {}", e))?;

    ui_result?;
    loop_result?;
    Ok(())
}

/// Run the dashboard on the alternate screen, restoring the terminal afterwards
fn run_tui(mut app: App, token: &CancellationToken) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app, token);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    token: &CancellationToken,
) -> Result<()> {
    while app.running && !token.is_cancelled() {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(app.theme.warning));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(12),   // Dashboard
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::dashboard::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::host::HostInfo;
    use async_trait::async_trait;
    use suimon_types::MetricsSnapshot;

    struct Never;

    #[async_trait]
    impl MetricsFetcher for Never {
        async fn fetch(
            &self,
            _host: &HostInfo,
        ) -> std::result::Result<MetricsSnapshot, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    #[test]
    fn test_orchestrator_enables_required_groups_only() {
        let mut config = SuimonConfig::default();
        config.rpc.hosts = vec![
            "https://a.example.com".to_string(),
            "https://b.example.com".to_string(),
        ];
        config.peers.addresses = vec!["10.0.0.1:8084".to_string()];

        let required = BTreeSet::from([GroupKind::Rpc]);
        let orchestrator = build_orchestrator(&config, &required, Arc::new(Never)).unwrap();

        let rpc = orchestrator.group(GroupKind::Rpc).unwrap();
        assert!(rpc.is_enabled());
        assert_eq!(rpc.pollers().len(), 2);

        let peers = orchestrator.group(GroupKind::Peers).unwrap();
        assert!(!peers.is_enabled());
        assert!(peers.pollers().is_empty());
    }

    #[test]
    fn test_dynamic_mode_requires_node() {
        let err = run_dynamic(&SuimonConfig::default(), Theme::dark()).unwrap_err();
        assert!(err.to_string().contains("[node]"));
    }
}
