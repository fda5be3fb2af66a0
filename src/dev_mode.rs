/// Development mode utilities for working offline
///
/// When the live APIs are unavailable (or you want a repeatable picture),
/// replay recorded readings from a JSON fixture through the full pipeline.
///
/// Fixture shape:
///
/// ```json
/// {
///   "waves":   [ { "point": "n-atlantic", "phenomenon": "wave-height", "value": 2.4 } ],
///   "weather": [ { "point": "n-atlantic", "phenomenon": "wind-speed", "value": null } ]
/// }
/// ```
///
/// Points of a source's registry that the fixture does not mention replay
/// as failed points.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::ingest::{PointFetch, ReadingSource, SourceBatch};
use crate::model::{Phenomenon, Reading, SourceKind};
use crate::sample_points;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fixture references unknown point '{0}'")]
    UnknownPoint(String),
    #[error("phenomenon {phenomenon} is not delivered by source {source_kind}")]
    WrongPhenomenon {
        source_kind: SourceKind,
        phenomenon: Phenomenon,
    },
}

#[derive(Debug, Deserialize)]
struct FixtureReading {
    point: String,
    phenomenon: Phenomenon,
    value: Option<f64>,
}

/// A source that returns the same recorded batch on every fetch.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    kind: SourceKind,
    points: Vec<PointFetch>,
}

impl ReadingSource for ReplaySource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self) -> SourceBatch {
        SourceBatch {
            source: self.kind,
            fetched_at: Utc::now(),
            cycle: 0,
            points: self.points.clone(),
        }
    }
}

/// Configuration for development mode replay
pub struct DevMode {
    pub fixture: PathBuf,
}

impl DevMode {
    pub fn new(fixture: impl Into<PathBuf>) -> Self {
        Self {
            fixture: fixture.into(),
        }
    }

    /// Load one replay source per source named in the fixture
    pub fn load_sources(&self) -> Result<Vec<ReplaySource>, ReplayError> {
        load_fixture(&self.fixture)
    }
}

pub fn load_fixture(path: &Path) -> Result<Vec<ReplaySource>, ReplayError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixture(&raw)
}

pub fn parse_fixture(raw: &str) -> Result<Vec<ReplaySource>, ReplayError> {
    let fixture: BTreeMap<SourceKind, Vec<FixtureReading>> = serde_json::from_str(raw)?;

    fixture
        .into_iter()
        .map(|(kind, rows)| {
            let mut by_point: BTreeMap<String, Vec<Reading>> = BTreeMap::new();
            for row in rows {
                if !kind.phenomena().contains(&row.phenomenon) {
                    return Err(ReplayError::WrongPhenomenon {
                        source_kind: kind,
                        phenomenon: row.phenomenon,
                    });
                }
                let point = sample_points::points_for(kind)
                    .iter()
                    .find(|p| p.id == row.point)
                    .ok_or_else(|| ReplayError::UnknownPoint(row.point.clone()))?;
                by_point.entry(row.point).or_default().push(Reading {
                    phenomenon: row.phenomenon,
                    coordinate: point.coordinate,
                    value: row.value,
                    source: Some("replay".to_string()),
                    observed_at: None,
                });
            }

            let points = sample_points::points_for(kind)
                .iter()
                .map(|p| match by_point.remove(p.id) {
                    Some(readings) => PointFetch {
                        point_id: p.id.to_string(),
                        readings,
                    },
                    None => PointFetch::failed(p.id),
                })
                .collect();

            Ok(ReplaySource { kind, points })
        })
        .collect()
}
