use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use hullgraph::dataset::{Dataset, Selection};
use hullgraph::layout::{Layout, LayoutConfig, LayoutSnapshot};

/// Lays the selection out until it comes to rest or runs out of ticks.
pub fn settle(
    dataset: &Dataset,
    selection: &Selection,
    config: LayoutConfig,
    max_ticks: usize,
) -> LayoutSnapshot {
    let (nodes, groups) = dataset.select(selection, &Default::default());
    let mut layout = Layout::new(nodes, groups, config);
    let ticks = layout.run_until_rest(max_ticks);

    if layout.is_running() {
        warn!(
            ticks,
            alpha = layout.alpha(),
            "tick budget exhausted before the layout came to rest"
        );
    }
    let undefined = layout
        .groups()
        .iter()
        .filter(|group| group.territory.is_none())
        .count();
    info!(
        ticks,
        nodes = layout.nodes().len(),
        groups = layout.groups().len(),
        undefined,
        "layout finished"
    );

    layout.snapshot()
}

/// Writes the snapshot as pretty JSON to `output`, or stdout when absent.
pub fn write_snapshot(snapshot: &LayoutSnapshot, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("failed to encode layout")?;

    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write layout to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write layout to stdout")
        }
    }
}
