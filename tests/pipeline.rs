/// Orchestrator integration tests.
///
/// These verify the fetch-to-dashboard pipeline with in-process fake sources:
/// 1. Batches are applied in arrival order, whatever that order is
/// 2. A source with every point failed leaves its buffers and layers alone
/// 3. Layer toggles never trigger a rebuild or refetch
/// 4. Every applied batch recomputes and redraws the dashboard
/// 5. A batch from an earlier cycle never replaces a newer one
///
/// Run with: cargo test --test pipeline

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use oceanmon_service::alert::{AlertFeed, AlertKind, AlertMode, FEED_CAPACITY};
use oceanmon_service::config::AlertConfig;
use oceanmon_service::display::{Dashboard, StressReadout};
use oceanmon_service::engine::AggregationEngine;
use oceanmon_service::engine::stress::{ChartSeries, SeverityTier};
use oceanmon_service::ingest::{PointFetch, ReadingSource, SourceBatch};
use oceanmon_service::layers::{self, Layer, MapSurface};
use oceanmon_service::model::{BufferKind, Phenomenon, Reading, SourceKind};
use oceanmon_service::orchestrator::{Orchestrator, SourceStatus};
use oceanmon_service::sample_points;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingMap {
    ops: Vec<String>,
    added: Vec<Layer>,
}

impl MapSurface for RecordingMap {
    fn add_layer(&mut self, layer: &Layer) {
        self.ops.push(format!("add:{}", layer.key));
        self.added.push(layer.clone());
    }

    fn remove_layer(&mut self, key: &str) {
        self.ops.push(format!("remove:{}", key));
    }
}

#[derive(Default)]
struct RecordingDashboard {
    readouts: Vec<StressReadout>,
    series: Vec<ChartSeries>,
    alert_redraws: Vec<Vec<AlertKind>>,
    statuses: Vec<String>,
}

impl Dashboard for RecordingDashboard {
    fn show_stress(&mut self, readout: &StressReadout) {
        self.readouts.push(readout.clone());
    }

    fn show_series(&mut self, series: &ChartSeries) {
        self.series.push(*series);
    }

    fn show_alerts(&mut self, feed: &AlertFeed) {
        self.alert_redraws.push(feed.entries().map(|e| e.kind).collect());
    }

    fn show_status(&mut self, line: &str) {
        self.statuses.push(line.to_string());
    }

    fn show_clock(&mut self, _now: DateTime<Utc>) {}
}

/// A source that answers with a fixed batch after an optional delay.
struct FakeSource {
    batch: SourceBatch,
    delay: Duration,
}

impl ReadingSource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.batch.source
    }

    fn fetch(&self) -> SourceBatch {
        thread::sleep(self.delay);
        self.batch.clone()
    }
}

/// A weather source whose first fetch is slow and reports a gale; every later
/// fetch answers at once with a light wind.
struct SlowFirstWeather {
    calls: Arc<AtomicUsize>,
    first_delay: Duration,
}

impl ReadingSource for SlowFirstWeather {
    fn kind(&self) -> SourceKind {
        SourceKind::Weather
    }

    fn fetch(&self) -> SourceBatch {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(self.first_delay);
            weather(80.0, 990.0)
        } else {
            weather(10.0, 1012.0)
        }
    }
}

fn slow_first_weather(first_delay_ms: u64) -> (Arc<dyn ReadingSource>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = SlowFirstWeather {
        calls: Arc::clone(&calls),
        first_delay: Duration::from_millis(first_delay_ms),
    };
    (Arc::new(source), calls)
}

fn stamped(mut batch: SourceBatch, cycle: u64) -> SourceBatch {
    batch.cycle = cycle;
    batch
}

/// Builds a batch over the source's real sample points. Each row is one
/// point's values in `kind.phenomena()` order; `None` rows are failed points.
fn batch(kind: SourceKind, rows: &[Option<&[Option<f64>]>]) -> SourceBatch {
    let points = sample_points::points_for(kind)
        .iter()
        .zip(rows)
        .map(|(point, row)| match row {
            Some(values) => PointFetch {
                point_id: point.id.to_string(),
                readings: kind
                    .phenomena()
                    .iter()
                    .zip(values.iter())
                    .map(|(phenomenon, value)| Reading {
                        phenomenon: *phenomenon,
                        coordinate: point.coordinate,
                        value: *value,
                        source: Some("test".to_string()),
                        observed_at: None,
                    })
                    .collect(),
            },
            None => PointFetch::failed(point.id),
        })
        .collect();
    SourceBatch {
        source: kind,
        fetched_at: Utc::now(),
        cycle: 0,
        points,
    }
}

fn waves(heights: &[f64]) -> SourceBatch {
    let rows: Vec<[Option<f64>; 2]> = heights.iter().map(|h| [Some(*h), Some(8.0)]).collect();
    let rows: Vec<Option<&[Option<f64>]>> = rows.iter().map(|r| Some(&r[..])).collect();
    batch(SourceKind::Waves, &rows)
}

fn weather(wind: f64, pressure: f64) -> SourceBatch {
    let row = [Some(wind), Some(270.0), Some(pressure)];
    batch(SourceKind::Weather, &[Some(&row[..])])
}

fn uv(index: f64) -> SourceBatch {
    let row = [Some(index)];
    batch(SourceKind::Uv, &[Some(&row[..])])
}

fn currents(kmh: f64) -> SourceBatch {
    let row = [Some(kmh)];
    batch(SourceKind::Currents, &[Some(&row[..])])
}

fn all_failed(kind: SourceKind) -> SourceBatch {
    batch(kind, &[None, None, None])
}

fn quiet_engine() -> AggregationEngine {
    let config = AlertConfig {
        mode: AlertMode::Level,
        system_check_probability: 0.0,
    };
    AggregationEngine::with_rng(&config, StdRng::seed_from_u64(11))
}

fn orchestrator(sources: Vec<Arc<dyn ReadingSource>>) -> Orchestrator<RecordingMap, RecordingDashboard> {
    Orchestrator::new(quiet_engine(), RecordingMap::default(), RecordingDashboard::default(), sources)
}

fn fake(batch: SourceBatch, delay_ms: u64) -> Arc<dyn ReadingSource> {
    Arc::new(FakeSource {
        batch,
        delay: Duration::from_millis(delay_ms),
    })
}

fn all_fakes() -> Vec<Arc<dyn ReadingSource>> {
    vec![
        fake(waves(&[2.0]), 0),
        fake(weather(20.0, 1010.0), 0),
        fake(currents(1.0), 0),
        fake(uv(4.0), 0),
    ]
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

#[test]
fn test_start_installs_static_layers_and_lifecycle_entry() {
    let mut orch = orchestrator(all_fakes());
    orch.start(Utc::now());

    assert_eq!(orch.map().ops, vec!["add:radiation", "add:sst"]);
    let latest = orch.engine().feed().latest().expect("startup entry");
    assert_eq!(latest.kind, AlertKind::Lifecycle);
    assert!(latest.message.starts_with("System online: 4 sources"));
    assert_eq!(
        orch.status_line(),
        "waves:pending weather:pending currents:pending uv:pending | AWAITING DATA"
    );
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

#[test]
fn test_apply_order_does_not_change_final_result() {
    let now = Utc::now();
    let batches = [waves(&[2.0, 4.0, 8.0]), weather(50.0, 995.0), uv(9.0), currents(0.4)];

    let mut forward = orchestrator(Vec::new());
    for b in batches.iter().cloned() {
        forward.apply(b, now);
    }
    let mut reverse = orchestrator(Vec::new());
    for b in batches.iter().rev().cloned() {
        reverse.apply(b, now);
    }

    let a = forward.last_snapshot().expect("snapshot");
    let b = reverse.last_snapshot().expect("snapshot");
    assert_eq!(a.stress, b.stress);
    assert_eq!(a.series, b.series);
    assert_eq!(a.tier, SeverityTier::Unstable);
}

#[test]
fn test_weather_batch_feeds_wind_and_pressure() {
    let mut orch = orchestrator(Vec::new());
    orch.apply(weather(45.0, 985.0), Utc::now());

    assert_eq!(orch.engine().buffer(BufferKind::Wind), &[Some(45.0)]);
    assert_eq!(orch.engine().buffer(BufferKind::Pressure), &[Some(985.0)]);
    assert!(orch.layers().get(layers::WIND_LAYER).is_some());
    assert!(orch.layers().get(layers::PRESSURE_LAYER).is_some());
}

#[test]
fn test_failed_points_become_absent_buffer_entries() {
    let row = [Some(3.0), Some(9.0)];
    let mut orch = orchestrator(Vec::new());
    orch.apply(batch(SourceKind::Waves, &[None, Some(&row[..]), None]), Utc::now());

    assert_eq!(orch.engine().buffer(BufferKind::Waves), &[None, Some(3.0), None]);
    assert_eq!(orch.layers().get(layers::WAVES_LAYER).map(|l| l.marker_count()), Some(1));
}

#[test]
fn test_unavailable_source_keeps_previous_buffers_and_layers() {
    let mut orch = orchestrator(Vec::new());
    orch.apply(waves(&[1.0, 2.0]), Utc::now());
    let layer_before = orch.layers().get(layers::WAVES_LAYER).cloned();
    let redraws_before = orch.dashboard().readouts.len();

    let result = orch.apply(all_failed(SourceKind::Waves), Utc::now());

    assert!(result.is_none());
    assert_eq!(orch.engine().buffer(BufferKind::Waves), &[Some(1.0), Some(2.0)]);
    assert_eq!(orch.layers().get(layers::WAVES_LAYER).cloned(), layer_before);
    assert_eq!(orch.dashboard().readouts.len(), redraws_before);
    assert_eq!(orch.source_status(SourceKind::Waves), Some(SourceStatus::Unavailable));
}

#[test]
fn test_currents_batch_triggers_recompute() {
    let mut orch = orchestrator(Vec::new());
    let snap = orch.apply(currents(0.8), Utc::now());
    assert!(snap.is_some());
    assert_eq!(orch.dashboard().readouts.len(), 1);
    assert_eq!(orch.dashboard().series.len(), 1);
    assert_eq!(orch.layers().get(layers::CURRENTS_LAYER).map(|l| l.marker_count()), Some(1));
}

#[test]
fn test_alerts_redraw_feed_capped_at_five() {
    let mut orch = orchestrator(Vec::new());
    for _ in 0..4 {
        orch.apply(weather(60.0, 980.0), Utc::now());
    }
    assert_eq!(orch.engine().feed().len(), FEED_CAPACITY);
    let last = orch.dashboard().alert_redraws.last().expect("alerts were drawn");
    assert_eq!(last.len(), FEED_CAPACITY);
}

#[test]
fn test_readout_matches_snapshot() {
    let mut orch = orchestrator(Vec::new());
    let snap = orch.apply(weather(50.0, 995.0), Utc::now()).expect("snapshot");
    let readout = orch.dashboard().readouts.last().expect("readout");
    assert_eq!(readout.text, snap.stress_text());
    assert_eq!(readout.bar_width_pct, snap.bar_width_pct());
    assert_eq!(readout.tier, snap.tier);
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

#[test]
fn test_hidden_layer_is_rebuilt_but_not_shown() {
    let mut orch = orchestrator(Vec::new());
    orch.apply(waves(&[1.0]), Utc::now());
    assert!(orch.set_layer_visible(layers::WAVES_LAYER, false));
    let ops_after_hide = orch.map().ops.len();

    orch.apply(waves(&[1.0, 2.0, 3.0]), Utc::now());
    assert_eq!(orch.map().ops.len(), ops_after_hide);
    assert_eq!(orch.layers().get(layers::WAVES_LAYER).map(|l| l.marker_count()), Some(3));

    assert!(orch.set_layer_visible(layers::WAVES_LAYER, true));
    let shown = orch.map().added.last().expect("layer shown");
    assert_eq!(shown.marker_count(), 3);
}

#[test]
fn test_toggle_does_not_touch_engine_or_dashboard() {
    let mut orch = orchestrator(Vec::new());
    orch.apply(uv(5.0), Utc::now());
    let readouts = orch.dashboard().readouts.len();

    orch.set_layer_visible(layers::UV_LAYER, false);
    orch.set_layer_visible(layers::UV_LAYER, true);

    assert_eq!(orch.dashboard().readouts.len(), readouts);
    assert_eq!(
        orch.map().ops[orch.map().ops.len() - 2..],
        ["remove:uv".to_string(), "add:uv".to_string()]
    );
    assert!(!orch.set_layer_visible("no-such-layer", true));
}

// ---------------------------------------------------------------------------
// Concurrent dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_run_cycle_collects_every_source() {
    let sources = vec![
        fake(waves(&[2.0]), 60),
        fake(weather(20.0, 1010.0), 0),
        fake(currents(1.0), 30),
        fake(uv(4.0), 10),
    ];
    let mut orch = orchestrator(sources);
    orch.start(Utc::now());

    let received = orch.run_cycle(Duration::from_secs(5));

    assert_eq!(received, 4);
    for kind in SourceKind::ALL {
        assert!(matches!(orch.source_status(kind), Some(SourceStatus::Reported(_))));
    }
    assert!(orch.status_line().ends_with("| STABLE"));
    assert_eq!(orch.dashboard().readouts.len(), 4);
}

#[test]
fn test_slow_source_does_not_block_the_others() {
    let sources = vec![fake(uv(4.0), 0), fake(waves(&[2.0]), 2_000)];
    let mut orch = orchestrator(sources);

    let received = orch.run_cycle(Duration::from_millis(300));

    assert_eq!(received, 1);
    assert!(matches!(orch.source_status(SourceKind::Uv), Some(SourceStatus::Reported(_))));
    assert_eq!(orch.source_status(SourceKind::Waves), Some(SourceStatus::Pending));
    assert_eq!(orch.engine().buffer(BufferKind::Uv), &[Some(4.0)]);
}

#[test]
fn test_late_batch_from_earlier_cycle_is_not_counted_as_current() {
    let (source, calls) = slow_first_weather(300);
    let mut orch = orchestrator(vec![source]);

    assert_eq!(orch.run_cycle(Duration::from_millis(50)), 0);
    thread::sleep(Duration::from_millis(400));

    assert_eq!(orch.run_cycle(Duration::from_secs(2)), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(orch.engine().buffer(BufferKind::Wind), &[Some(10.0)]);
    assert_eq!(orch.engine().statistics().max_wind, 10.0);
}

#[test]
fn test_older_cycle_never_overwrites_newer() {
    let mut orch = orchestrator(Vec::new());
    assert!(orch.apply(stamped(weather(10.0, 1012.0), 2), Utc::now()).is_some());
    let readouts = orch.dashboard().readouts.len();

    assert!(orch.apply(stamped(weather(80.0, 990.0), 1), Utc::now()).is_none());

    assert_eq!(orch.engine().buffer(BufferKind::Wind), &[Some(10.0)]);
    assert_eq!(orch.dashboard().readouts.len(), readouts);

    // Other sources keep their own ordering.
    assert!(orch.apply(stamped(uv(3.0), 1), Utc::now()).is_some());
}

#[test]
fn test_source_still_fetching_is_not_launched_again() {
    let (source, calls) = slow_first_weather(300);
    let mut orch = orchestrator(vec![source, fake(uv(4.0), 0)]);

    assert_eq!(orch.run_cycle(Duration::from_millis(100)), 1);
    // Weather is still on its first fetch: only uv goes out.
    assert_eq!(orch.dispatch(), 1);
    thread::sleep(Duration::from_millis(400));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(orch.run_cycle(Duration::from_secs(2)), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(orch.engine().buffer(BufferKind::Wind), &[Some(10.0)]);
}

#[test]
fn test_replay_fixture_runs_through_pipeline() {
    let raw = r#"{
        "waves": [{"point": "n-atlantic", "phenomenon": "wave-height", "value": 5.0}],
        "uv": [{"point": "coral-sea", "phenomenon": "uv-index", "value": 10.0}]
    }"#;
    let sources: Vec<Arc<dyn ReadingSource>> = oceanmon_service::dev_mode::parse_fixture(raw)
        .expect("fixture parses")
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn ReadingSource>)
        .collect();
    let mut orch = orchestrator(sources);

    assert_eq!(orch.run_cycle(Duration::from_secs(5)), 2);

    let kinds: Vec<AlertKind> = orch.engine().feed().entries().map(|e| e.kind).collect();
    assert!(kinds.contains(&AlertKind::HighSeas));
    assert!(kinds.contains(&AlertKind::ExtremeUv));
    assert!(orch.engine().validated(BufferKind::Waves) == vec![5.0]);
}

#[test]
fn test_registry_sizes_match_batches() {
    // The helpers above rely on at least three points per source.
    for kind in SourceKind::ALL {
        assert!(sample_points::points_for(kind).len() >= 3);
    }
    assert_eq!(Phenomenon::ALL.len(), 7);
}
