use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use color_eyre::Result;
use outbreak_core::{
    load_dataset_from_env, load_panel_config_from_env, log_channel, spawn_repeating, ArticleShelf,
    Dataset, DiseaseFilter, JsonFileStore, MapPanel, PanelConfig, RepeatingHandle,
    TokioTickScheduler,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{info, warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;

use app::InspectorApp;
use ui::TerminalSink;

#[derive(Parser, Debug)]
#[command(author, version, about = "Outbreak map panel in the terminal", long_about = None)]
struct Cli {
    /// Dataset JSON (`{"cities": [...]}`). Defaults to `OUTBREAK_DATASET_PATH` or the builtin copy.
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Panel config JSON. Defaults to `OUTBREAK_PANEL_CONFIG_PATH` or the builtin config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// File backing per-user storage (articles).
    #[arg(long, default_value = "outbreak_store.json")]
    store: PathBuf,
    /// Initial disease filter, e.g. `All` or `Cholera`.
    #[arg(long)]
    disease: Option<DiseaseFilter>,
    /// Show debug events in the log pane.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The terminal owns stdout; events reach the log pane through the forwarder.
    let (log_layer, log_rx) = log_channel();
    let (default_filter, pane_level) = if cli.verbose {
        ("debug", Level::DEBUG)
    } else {
        ("info", Level::INFO)
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(log_layer.with_max_level(pane_level))
        .init();

    let dataset = match &cli.dataset {
        Some(path) => {
            let (dataset, report) = Dataset::from_file(path)?;
            if !report.is_clean() {
                warn!(
                    target: "outbreak::dataset",
                    dropped = report.dropped.len(),
                    "dataset.entries_dropped"
                );
            }
            Arc::new(dataset)
        }
        None => load_dataset_from_env().0,
    };

    let mut config: PanelConfig = match &cli.config {
        Some(path) => PanelConfig::from_file(path)?,
        None => load_panel_config_from_env().0.as_ref().clone(),
    };
    if let Some(disease) = cli.disease {
        config.default_disease = disease;
    }

    let shelf = ArticleShelf::open(JsonFileStore::open(&cli.store)?)?;

    let runtime = Handle::current();
    let (scheduler, ticks) = TokioTickScheduler::channel(runtime.clone());
    let (refresher, refreshes) = start_refresh(&runtime, &config);
    let panel = MapPanel::new(dataset, config, TerminalSink::default(), scheduler);
    info!(target: "outbreak::inspector", store = %cli.store.display(), "inspector.started");

    let ui = tokio::task::spawn_blocking(move || -> Result<()> {
        let app = InspectorApp::new(panel, ticks, refreshes, log_rx, shelf)?;
        app.run()
    });
    ui.await??;

    drop(refresher);
    Ok(())
}

/// Refresh once now, then on every refresh interval.
fn start_refresh(
    runtime: &Handle,
    config: &PanelConfig,
) -> (Option<RepeatingHandle>, UnboundedReceiver<DateTime<Utc>>) {
    let (sender, receiver) = unbounded_channel();
    if !config.refresh.enabled {
        return (None, receiver);
    }
    let _ = sender.send(Utc::now());
    let handle = spawn_repeating(runtime, config.refresh_interval(), move || {
        match sender.send(Utc::now()) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    });
    (Some(handle), receiver)
}
