//! Fetch orchestration.
//!
//! Each source runs on its own thread and reports one `SourceBatch` over a
//! channel. A single reducer (this struct, on the calling thread) applies
//! batches in whatever order they arrive: rebuild the source's layers,
//! replace its buffers, recompute, redraw. No locks: only the reducer ever
//! touches the engine, the layers or the dashboard.
//!
//! Fetches are fire-and-forget. A source that never answers leaves its
//! buffers as they were; nothing times it out. Each dispatch is numbered and
//! every batch carries the number of the dispatch that launched it, so a
//! batch that lands after a newer one from the same source is dropped. A
//! source whose previous fetch is still running is not launched again.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::PollingConfig;
use crate::display::{Dashboard, StressReadout};
use crate::engine::{AggregationEngine, EngineSnapshot};
use crate::ingest::{ReadingSource, SourceBatch};
use crate::layers::{self, LayerRegistry, MapSurface};
use crate::logging::DataSource;
use crate::model::SourceKind;
use crate::sample_points;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Pending,
    Reported(DateTime<Utc>),
    Unavailable,
}

impl SourceStatus {
    fn word(&self) -> &'static str {
        match self {
            SourceStatus::Pending => "pending",
            SourceStatus::Reported(_) => "ok",
            SourceStatus::Unavailable => "unavailable",
        }
    }
}

pub struct Orchestrator<M: MapSurface, D: Dashboard> {
    engine: AggregationEngine,
    layers: LayerRegistry,
    map: M,
    dashboard: D,
    sources: Vec<Arc<dyn ReadingSource>>,
    status: BTreeMap<SourceKind, SourceStatus>,
    last_snapshot: Option<EngineSnapshot>,
    cycle: u64,
    /// Highest cycle applied per source.
    applied: BTreeMap<SourceKind, u64>,
    /// Cycle of the fetch still running per source.
    in_flight: BTreeMap<SourceKind, u64>,
    tx: Sender<SourceBatch>,
    rx: Receiver<SourceBatch>,
}

impl<M: MapSurface, D: Dashboard> Orchestrator<M, D> {
    pub fn new(engine: AggregationEngine, map: M, dashboard: D, sources: Vec<Arc<dyn ReadingSource>>) -> Self {
        let (tx, rx) = mpsc::channel();
        let status = sources.iter().map(|s| (s.kind(), SourceStatus::Pending)).collect();
        Self {
            engine,
            layers: LayerRegistry::new(),
            map,
            dashboard,
            sources,
            status,
            last_snapshot: None,
            cycle: 0,
            applied: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            tx,
            rx,
        }
    }

    /// Installs the static layers and records the startup entry.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.layers.install(layers::build_radiation_layer(), &mut self.map);
        self.layers.install(layers::build_sst_layer(now.date_naive()), &mut self.map);

        let entry = self.engine.record_lifecycle(
            format!(
                "System online: {} sources, {} sample points",
                self.sources.len(),
                sample_points::distinct_point_count()
            ),
            now,
        );
        info!(source = "SYS", "{}", entry.message);
        self.dashboard.show_alerts(self.engine.feed());
        self.refresh_status();
    }

    /// Starts a new cycle and launches every idle source on its own thread.
    /// Returns how many were launched.
    pub fn dispatch(&mut self) -> usize {
        self.cycle += 1;
        let cycle = self.cycle;
        let mut launched = 0;
        for source in &self.sources {
            let kind = source.kind();
            if let Some(started) = self.in_flight.get(&kind) {
                warn!(
                    source = %DataSource::from(kind),
                    "fetch from cycle {} still running; skipping cycle {}",
                    started,
                    cycle
                );
                continue;
            }
            let source = Arc::clone(source);
            let tx = self.tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("fetch-{}", kind))
                .spawn(move || {
                    let mut batch = source.fetch();
                    batch.cycle = cycle;
                    // The reducer only goes away on shutdown; a late batch is dropped.
                    let _ = tx.send(batch);
                });
            match spawned {
                Ok(_) => {
                    self.in_flight.insert(kind, cycle);
                    launched += 1;
                }
                Err(e) => error!(source = "SYS", "failed to spawn fetch thread: {}", e),
            }
        }
        launched
    }

    /// Reducer step for one completed source.
    ///
    /// Returns `None` when the source was unavailable (every point failed)
    /// or the batch is older than one already applied for the same source;
    /// its buffers and layers are then left untouched.
    pub fn apply(&mut self, batch: SourceBatch, now: DateTime<Utc>) -> Option<EngineSnapshot> {
        let source = batch.source;
        if self.in_flight.get(&source) == Some(&batch.cycle) {
            self.in_flight.remove(&source);
        }
        if let Some(&applied) = self.applied.get(&source) {
            if batch.cycle < applied {
                debug!(
                    source = %DataSource::from(source),
                    "dropping batch from cycle {}; cycle {} already applied",
                    batch.cycle,
                    applied
                );
                return None;
            }
        }
        self.applied.insert(source, batch.cycle);

        if batch.is_unavailable() {
            warn!(
                source = %DataSource::from(source),
                "no sample point answered; keeping previous readings"
            );
            self.status.insert(source, SourceStatus::Unavailable);
            self.refresh_status();
            return None;
        }

        for build in layers::builders_for(source) {
            self.layers.install(build(&batch), &mut self.map);
        }
        for phenomenon in source.phenomena() {
            if let Some(kind) = phenomenon.buffer() {
                self.engine.ingest(kind, batch.values(*phenomenon));
            }
        }
        self.status.insert(source, SourceStatus::Reported(batch.fetched_at));

        let snapshot = self.engine.recompute_at(now);
        self.publish(&snapshot);
        self.last_snapshot = Some(snapshot.clone());
        self.refresh_status();
        Some(snapshot)
    }

    fn publish(&mut self, snapshot: &EngineSnapshot) {
        self.dashboard.show_stress(&StressReadout {
            text: snapshot.stress_text(),
            bar_width_pct: snapshot.bar_width_pct(),
            tier: snapshot.tier,
        });
        self.dashboard.show_series(&snapshot.series);
        if !snapshot.fired.is_empty() {
            self.dashboard.show_alerts(self.engine.feed());
        }
    }

    /// "waves:ok weather:pending ... | STABLE"
    pub fn status_line(&self) -> String {
        let parts: Vec<String> = self
            .status
            .iter()
            .map(|(kind, status)| format!("{}:{}", kind, status.word()))
            .collect();
        let tier = self
            .last_snapshot
            .as_ref()
            .map(|s| s.tier.label())
            .unwrap_or("AWAITING DATA");
        format!("{} | {}", parts.join(" "), tier)
    }

    fn refresh_status(&mut self) {
        let line = self.status_line();
        self.dashboard.show_status(&line);
    }

    /// Applies anything left over from earlier cycles, dispatches, then
    /// applies batches until every source launched this cycle has answered
    /// or `timeout` passes. Returns the number of this cycle's batches
    /// received; late batches from earlier cycles are applied but not counted.
    pub fn run_cycle(&mut self, timeout: Duration) -> usize {
        self.drain_pending();
        let expected = self.dispatch();
        let cycle = self.cycle;
        let deadline = Instant::now() + timeout;
        let mut received = 0;
        while received < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(batch) => {
                    let current = batch.cycle == cycle;
                    self.apply(batch, Utc::now());
                    if current {
                        received += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        source = "SYS",
                        "{} source(s) still outstanding after {:?}",
                        expected - received,
                        timeout
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        received
    }

    fn drain_pending(&mut self) {
        while let Ok(batch) = self.rx.try_recv() {
            self.apply(batch, Utc::now());
        }
    }

    /// Polls forever: dispatch every `poll_interval`, tick the clock every
    /// `clock_interval`, apply batches as they land.
    pub fn run(&mut self, polling: &PollingConfig) {
        let mut next_dispatch = Instant::now();
        let mut next_tick = Instant::now();
        loop {
            let now = Instant::now();
            if now >= next_dispatch {
                let launched = self.dispatch();
                info!(source = "SYS", "cycle {}: dispatched {} source(s)", self.cycle, launched);
                next_dispatch = now + polling.poll_interval();
            }
            if now >= next_tick {
                self.dashboard.show_clock(Utc::now());
                next_tick = now + polling.clock_interval();
            }

            let wait = next_dispatch.min(next_tick).saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(batch) => {
                    self.apply(batch, Utc::now());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn dashboard(&self) -> &D {
        &self.dashboard
    }

    pub fn source_status(&self, kind: SourceKind) -> Option<SourceStatus> {
        self.status.get(&kind).copied()
    }

    pub fn last_snapshot(&self) -> Option<&EngineSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Shows or hides a layer without refetching.
    pub fn set_layer_visible(&mut self, key: &str, visible: bool) -> bool {
        self.layers.set_visible(key, visible, &mut self.map)
    }
}
