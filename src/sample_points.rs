/// Sample point registry for the ocean stress monitoring service.
///
/// Defines the canonical geographic points each reading source is queried
/// at, plus the fixed radiation reference sensors (static constants, never
/// fetched). This is the single source of truth for point ids; other
/// modules should look points up here rather than hardcoding coordinates.

use crate::model::{Coordinate, SamplePoint, SourceKind};

// ---------------------------------------------------------------------------
// Sample points
// ---------------------------------------------------------------------------

const fn point(id: &'static str, name: &'static str, latitude: f64, longitude: f64) -> SamplePoint {
    SamplePoint {
        id,
        name,
        coordinate: Coordinate::from_static(latitude, longitude),
    }
}

/// Open-ocean grid. Chosen away from coastlines: the marine model returns
/// nulls for grid cells that are land.
const OCEAN_GRID: &[SamplePoint] = &[
    point("n-atlantic", "North Atlantic (Rockall Trough)", 56.0, -12.0),
    point("bay-of-biscay", "Bay of Biscay", 45.5, -5.0),
    point("w-mediterranean", "Western Mediterranean", 39.5, 4.5),
    point("s-atlantic", "South Atlantic (Cape Basin)", -34.5, 15.0),
    point("n-pacific", "North Pacific (Gulf of Alaska)", 55.0, -145.0),
    point("coral-sea", "Coral Sea", -18.0, 155.0),
    point("arabian-sea", "Arabian Sea", 15.0, 65.0),
    point("tasman-sea", "Tasman Sea", -40.0, 160.0),
];

/// Points queried by the marine sources (waves, currents).
pub static MARINE_POINTS: &[SamplePoint] = OCEAN_GRID;

/// Points queried by the atmospheric sources (weather, uv).
///
/// Shares the marine grid so that the pressure and wind markers line up with
/// the wave markers on the map.
pub static ATMOSPHERE_POINTS: &[SamplePoint] = OCEAN_GRID;

/// Returns the points a given source queries.
pub fn points_for(source: SourceKind) -> &'static [SamplePoint] {
    match source {
        SourceKind::Waves | SourceKind::Currents => MARINE_POINTS,
        SourceKind::Weather | SourceKind::Uv => ATMOSPHERE_POINTS,
    }
}

/// Looks up a point by id across all registries. Returns `None` if not found.
pub fn find_point(id: &str) -> Option<&'static SamplePoint> {
    MARINE_POINTS
        .iter()
        .chain(ATMOSPHERE_POINTS.iter())
        .find(|p| p.id == id)
}

/// Total number of distinct points monitored.
pub fn distinct_point_count() -> usize {
    let mut ids: Vec<&str> = MARINE_POINTS
        .iter()
        .chain(ATMOSPHERE_POINTS.iter())
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

// ---------------------------------------------------------------------------
// Radiation reference sensors
// ---------------------------------------------------------------------------

/// A fixed radiation monitoring station. Values are published reference
/// dose rates, shown as a static overlay and never refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiationSensor {
    pub name: &'static str,
    pub coordinate: Coordinate,
    /// Ambient dose equivalent rate, µSv/h.
    pub dose_usv_h: f64,
}

const fn sensor(name: &'static str, latitude: f64, longitude: f64, dose_usv_h: f64) -> RadiationSensor {
    RadiationSensor {
        name,
        coordinate: Coordinate::from_static(latitude, longitude),
        dose_usv_h,
    }
}

pub static RADIATION_SENSORS: &[RadiationSensor] = &[
    sensor("Fukushima coast", 37.42, 141.03, 0.12),
    sensor("Sellafield coast", 54.42, -3.51, 0.09),
    sensor("La Hague", 49.68, -1.88, 0.10),
    sensor("Monaco (IAEA MEL)", 43.73, 7.42, 0.08),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
