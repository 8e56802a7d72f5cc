mod app;
mod headless;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hullgraph::dataset::{DatasetOptions, Filter, Selection, load_dataset};
use hullgraph::layout::LayoutConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Dataset JSON: `{ "nodes": [...], "groups": [...] }` or an array of records
    #[arg(long)]
    dataset: PathBuf,

    /// Record attribute holding the node id (falls back to `name`)
    #[arg(long, default_value = "id")]
    id_field: String,

    /// Record attribute driving the node radius
    #[arg(long, default_value = "research_papers")]
    size_field: String,

    /// Derive groups from this attribute instead of the file's `groups`
    #[arg(long)]
    group_by: Option<String>,

    /// Keep only records matching `attribute=value1,value2`
    #[arg(long)]
    filter: Option<Filter>,

    /// JSON file overriding layout constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run the layout to rest and print it as JSON instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Tick budget for headless runs
    #[arg(long, default_value_t = 1000)]
    max_ticks: usize,

    /// Write the headless layout here instead of stdout
    #[arg(long, requires = "headless")]
    output: Option<PathBuf>,
}

impl Args {
    fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            id_field: self.id_field.clone(),
            size_field: self.size_field.clone(),
        }
    }

    fn selection(&self) -> Selection {
        Selection {
            group_by: self.group_by.clone(),
            filter: self.filter.clone(),
        }
    }

    fn layout_config(&self) -> Result<LayoutConfig> {
        match &self.config {
            Some(path) => LayoutConfig::from_json_file(path)
                .with_context(|| format!("failed to load layout config {}", path.display())),
            None => Ok(LayoutConfig::default()),
        }
    }
}

fn log_level(raw: &str) -> Level {
    match raw {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` wins over `--log-level` when set. Logs go to stderr so
/// headless JSON on stdout stays clean.
fn init_tracing(raw_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(raw_level).as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = args.layout_config()?;
    let options = args.dataset_options();
    let selection = args.selection();

    if args.headless {
        let dataset = load_dataset(&args.dataset, &options)
            .with_context(|| format!("failed to load dataset {}", args.dataset.display()))?;
        let snapshot = headless::settle(&dataset, &selection, config, args.max_ticks);
        return headless::write_snapshot(&snapshot, args.output.as_deref());
    }

    info!(dataset = %args.dataset.display(), "starting viewer");
    let source = app::DataSource {
        path: args.dataset.clone(),
        options,
        selection,
        config,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "hullgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::HullGraphApp::new(cc, source)))),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}
