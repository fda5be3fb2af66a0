//! Dashboard outputs.
//!
//! The engine never talks to a screen. The orchestrator pushes each
//! snapshot into a `Dashboard`; the binary uses the console implementations
//! below, tests use recording ones.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::alert::AlertFeed;
use crate::engine::stress::{ChartSeries, SeverityTier};
use crate::layers::{Layer, LayerContent, MapSurface};

/// The stress readout widget: value text, bar width and tier badge.
#[derive(Debug, Clone, PartialEq)]
pub struct StressReadout {
    /// One decimal, e.g. "4.3".
    pub text: String,
    /// 0..=100.
    pub bar_width_pct: f64,
    pub tier: SeverityTier,
}

impl StressReadout {
    pub fn label(&self) -> &'static str {
        self.tier.label()
    }

    pub fn color(&self) -> &'static str {
        self.tier.color()
    }
}

pub trait Dashboard {
    fn show_stress(&mut self, readout: &StressReadout);
    /// Replaces the chart's single dataset.
    fn show_series(&mut self, series: &ChartSeries);
    /// Redraws the alert list, most recent first.
    fn show_alerts(&mut self, feed: &AlertFeed);
    fn show_status(&mut self, line: &str);
    fn show_clock(&mut self, now: DateTime<Utc>);
}

// ---------------------------------------------------------------------------
// Console implementations
// ---------------------------------------------------------------------------

const BAR_CELLS: usize = 20;

/// Text dashboard for the daemon. Redraws are logged, not painted.
#[derive(Debug, Default)]
pub struct ConsoleDashboard {
    last_status: Option<String>,
}

impl ConsoleDashboard {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `[#########-----------]` for a percentage.
pub fn render_bar(pct: f64) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * BAR_CELLS as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_CELLS - filled))
}

impl Dashboard for ConsoleDashboard {
    fn show_stress(&mut self, readout: &StressReadout) {
        info!(
            source = "SYS",
            "Ocean stress {} {} {}",
            readout.text,
            render_bar(readout.bar_width_pct),
            readout.label()
        );
    }

    fn show_series(&mut self, series: &ChartSeries) {
        let cells: Vec<String> = series.as_slice().iter().map(|v| format!("{:.1}", v)).collect();
        info!(source = "SYS", "Trend [{}]", cells.join(", "));
    }

    fn show_alerts(&mut self, feed: &AlertFeed) {
        for entry in feed.entries() {
            info!(source = "SYS", "  {}", entry.plain());
        }
    }

    fn show_status(&mut self, line: &str) {
        if self.last_status.as_deref() != Some(line) {
            info!(source = "SYS", "{}", line);
            self.last_status = Some(line.to_string());
        }
    }

    fn show_clock(&mut self, now: DateTime<Utc>) {
        tracing::trace!(source = "SYS", "{}", now.format("%H:%M:%S UTC"));
    }
}

/// Map surface that logs layer changes.
#[derive(Debug, Default)]
pub struct ConsoleMap;

impl MapSurface for ConsoleMap {
    fn add_layer(&mut self, layer: &Layer) {
        match &layer.content {
            LayerContent::Markers(markers) => {
                info!(source = "SYS", layer = layer.key, "{}: {} markers", layer.title, markers.len())
            }
            LayerContent::Tiles(tiles) => {
                info!(source = "SYS", layer = layer.key, "{}: tiles {}", layer.title, tiles.url_template)
            }
        }
    }

    fn remove_layer(&mut self, key: &str) {
        tracing::debug!(source = "SYS", layer = key, "layer removed");
    }
}
