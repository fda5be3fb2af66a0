//! The aggregation engine.
//!
//! Owns one Sample Buffer per `BufferKind` and is the only place they are
//! mutated. Every recomputation derives entirely from the current buffers,
//! so it is safe to run redundantly and in any order relative to which
//! source last reported. Nothing in here panics or returns an error: empty
//! or fully-invalid buffers fall back to calm defaults.
//!
//! Submodules:
//! - `validation`: per-phenomenon validity predicates.
//! - `statistics`: mean/max/min with defaults.
//! - `stress`: stress index, severity tiers, chart series.

pub mod statistics;
pub mod stress;
pub mod validation;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use crate::alert::thresholds::SYSTEM_CHECK_MESSAGE;
use crate::alert::{AlertEntry, AlertEvaluator, AlertFeed, AlertKind, SystemCheck};
use crate::config::AlertConfig;
use crate::model::{BufferKind, UnknownKey};
use statistics::Statistics;
use stress::{ChartSeries, SeverityTier, StressIndex};

/// Everything one recomputation produces for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub statistics: Statistics,
    pub stress: StressIndex,
    pub tier: SeverityTier,
    pub series: ChartSeries,
    /// Entries appended to the feed by this recomputation, oldest first.
    pub fired: Vec<AlertEntry>,
}

impl EngineSnapshot {
    /// Stress formatted to one decimal.
    pub fn stress_text(&self) -> String {
        self.stress.to_string()
    }

    pub fn bar_width_pct(&self) -> f64 {
        self.stress.bar_width_pct()
    }

    /// Threshold alerts fired this recomputation, excluding lifecycle entries.
    pub fn threshold_alerts(&self) -> impl Iterator<Item = &AlertEntry> {
        self.fired.iter().filter(|e| e.kind != AlertKind::Lifecycle)
    }
}

pub struct AggregationEngine {
    buffers: [Vec<Option<f64>>; 4],
    evaluator: AlertEvaluator,
    system_check: SystemCheck,
    feed: AlertFeed,
}

impl AggregationEngine {
    pub fn new(config: &AlertConfig) -> Self {
        Self::with_system_check(config, SystemCheck::new(config.system_check_probability))
    }

    /// Same as `new` but with a deterministic filler roll.
    pub fn with_rng(config: &AlertConfig, rng: StdRng) -> Self {
        Self::with_system_check(config, SystemCheck::with_rng(config.system_check_probability, rng))
    }

    fn with_system_check(config: &AlertConfig, system_check: SystemCheck) -> Self {
        Self {
            buffers: Default::default(),
            evaluator: AlertEvaluator::new(config.mode),
            system_check,
            feed: AlertFeed::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Buffers
    // -----------------------------------------------------------------------

    /// Replaces the buffer for `kind` wholesale with this cycle's values.
    pub fn ingest(&mut self, kind: BufferKind, values: Vec<Option<f64>>) {
        tracing::debug!(source = "ENGINE", buffer = kind.as_str(), len = values.len(), "buffer replaced");
        self.buffers[kind.index()] = values;
    }

    /// `ingest` addressed by the string key ("waves", "wind", "pressure", "uv").
    pub fn ingest_key(&mut self, key: &str, values: Vec<Option<f64>>) -> Result<(), UnknownKey> {
        let kind: BufferKind = key.parse()?;
        self.ingest(kind, values);
        Ok(())
    }

    /// The raw buffer, invalid entries included.
    pub fn buffer(&self, kind: BufferKind) -> &[Option<f64>] {
        &self.buffers[kind.index()]
    }

    pub fn validated(&self, kind: BufferKind) -> Vec<f64> {
        validation::validate(self.buffer(kind).iter().copied(), validation::predicate_for(kind))
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::from_validated(
            &self.validated(BufferKind::Waves),
            &self.validated(BufferKind::Wind),
            &self.validated(BufferKind::Pressure),
            &self.validated(BufferKind::Uv),
        )
    }

    // -----------------------------------------------------------------------
    // Recomputation
    // -----------------------------------------------------------------------

    pub fn recompute(&mut self) -> EngineSnapshot {
        self.recompute_at(Utc::now())
    }

    /// Recomputes statistics, stress, tier and series from the current
    /// buffers, appending any alerts to the feed stamped with `now`.
    pub fn recompute_at(&mut self, now: DateTime<Utc>) -> EngineSnapshot {
        let statistics = self.statistics();
        let stress = StressIndex::from(&statistics);
        let tier = stress.tier();
        let series = stress::derive_chart_series(
            stress.value(),
            statistics.avg_wave,
            statistics.max_wind,
            statistics.min_pressure,
            statistics.max_uv,
        );

        let mut fired: Vec<AlertEntry> = self
            .evaluator
            .evaluate(&statistics)
            .into_iter()
            .map(|alert| AlertEntry::new(now, alert.kind, alert.message))
            .collect();
        if self.system_check.roll() {
            fired.push(AlertEntry::new(now, AlertKind::Lifecycle, SYSTEM_CHECK_MESSAGE));
        }
        for entry in &fired {
            self.feed.push(entry.clone());
        }

        tracing::debug!(
            source = "ENGINE",
            stress = stress.value(),
            tier = tier.label(),
            alerts = fired.len(),
            "recomputed"
        );

        EngineSnapshot {
            statistics,
            stress,
            tier,
            series,
            fired,
        }
    }

    // -----------------------------------------------------------------------
    // Feed
    // -----------------------------------------------------------------------

    /// Appends a lifecycle entry (startup, shutdown...) to the feed.
    pub fn record_lifecycle(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> AlertEntry {
        let entry = AlertEntry::new(now, AlertKind::Lifecycle, message);
        self.feed.push(entry.clone());
        entry
    }

    pub fn feed(&self) -> &AlertFeed {
        &self.feed
    }
}
