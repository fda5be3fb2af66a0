//! Reading sources.
//!
//! A source queries a fixed set of sample points and returns, per point,
//! either readings or nothing. One point failing never fails the source;
//! a source is only *unavailable* when every point failed.
//!
//! Submodules:
//! - `open_meteo`: URL construction, schema-checked parsing, blocking fetch.

pub mod open_meteo;

use chrono::{DateTime, Utc};

use crate::config::HttpConfig;
use crate::logging::{self, DataSource};
use crate::model::{Phenomenon, Reading, SamplePoint, SourceKind};
use crate::sample_points;
use open_meteo::Endpoints;

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// What one sample point produced during one fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFetch {
    pub point_id: String,
    /// Empty when the point failed (network, malformed body...).
    pub readings: Vec<Reading>,
}

impl PointFetch {
    pub fn failed(point_id: impl Into<String>) -> Self {
        Self {
            point_id: point_id.into(),
            readings: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn value_of(&self, phenomenon: Phenomenon) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.phenomenon == phenomenon)
            .and_then(|r| r.value)
    }
}

/// The result of one source's fetch cycle, in sample-point order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source: SourceKind,
    pub fetched_at: DateTime<Utc>,
    /// Dispatch cycle that launched the fetch. Sources leave it at 0; the
    /// orchestrator stamps it before the batch crosses the channel.
    pub cycle: u64,
    pub points: Vec<PointFetch>,
}

impl SourceBatch {
    /// One entry per point, in arrival order: `None` where the point failed
    /// or reported the field as missing. This is what feeds a Sample Buffer.
    pub fn values(&self, phenomenon: Phenomenon) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value_of(phenomenon)).collect()
    }

    /// All readings of one phenomenon, for layer builders.
    pub fn readings(&self, phenomenon: Phenomenon) -> impl Iterator<Item = &Reading> + '_ {
        self.points
            .iter()
            .flat_map(|p| p.readings.iter())
            .filter(move |r| r.phenomenon == phenomenon)
    }

    pub fn successful_points(&self) -> usize {
        self.points.iter().filter(|p| !p.is_failed()).count()
    }

    /// True when no point produced anything this cycle.
    pub fn is_unavailable(&self) -> bool {
        self.successful_points() == 0
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// An independent fetcher for one upstream. Implementations block on I/O
/// and are run on their own thread by the orchestrator.
pub trait ReadingSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch every sample point once. Must not panic on upstream failure.
    fn fetch(&self) -> SourceBatch;
}

// ---------------------------------------------------------------------------
// Live Open-Meteo source
// ---------------------------------------------------------------------------

impl From<&HttpConfig> for Endpoints {
    fn from(http: &HttpConfig) -> Self {
        Endpoints {
            marine_base_url: http.marine_base_url.clone(),
            forecast_base_url: http.forecast_base_url.clone(),
        }
    }
}

pub struct OpenMeteoSource {
    kind: SourceKind,
    client: reqwest::blocking::Client,
    endpoints: Endpoints,
    points: &'static [SamplePoint],
}

impl OpenMeteoSource {
    pub fn new(kind: SourceKind, client: reqwest::blocking::Client, endpoints: Endpoints) -> Self {
        Self {
            kind,
            client,
            endpoints,
            points: sample_points::points_for(kind),
        }
    }

    /// One live source per `SourceKind`, sharing a single HTTP client.
    pub fn all(client: &reqwest::blocking::Client, endpoints: &Endpoints) -> Vec<OpenMeteoSource> {
        SourceKind::ALL
            .into_iter()
            .map(|kind| OpenMeteoSource::new(kind, client.clone(), endpoints.clone()))
            .collect()
    }
}

impl ReadingSource for OpenMeteoSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self) -> SourceBatch {
        let tag = DataSource::from(self.kind);
        let points: Vec<PointFetch> = self
            .points
            .iter()
            .map(|point| {
                match open_meteo::fetch_current(&self.client, &self.endpoints, self.kind, &point.coordinate) {
                    Ok(readings) => PointFetch {
                        point_id: point.id.to_string(),
                        readings,
                    },
                    Err(e) => {
                        logging::log_point_failure(tag, point.id, "fetch current", &e);
                        PointFetch::failed(point.id)
                    }
                }
            })
            .collect();

        let batch = SourceBatch {
            source: self.kind,
            fetched_at: Utc::now(),
            cycle: 0,
            points,
        };
        logging::log_cycle_summary(tag, batch.points.len(), batch.successful_points());
        batch
    }
}
