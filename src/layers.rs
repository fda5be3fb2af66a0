//! Map layers.
//!
//! Layer builders turn one source batch into togglable overlays keyed by
//! phenomenon. They read the same batch the engine ingests, so a source that
//! feeds several phenomena (weather: wind and pressure) is fetched once and
//! multiplexed to several builders. Rendering itself belongs to whatever
//! implements `MapSurface`.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::ingest::SourceBatch;
use crate::model::{Coordinate, Phenomenon, SourceKind};
use crate::sample_points::RADIATION_SENSORS;

// ---------------------------------------------------------------------------
// Layer types
// ---------------------------------------------------------------------------

pub const WAVES_LAYER: &str = "waves";
pub const WIND_LAYER: &str = "wind";
pub const PRESSURE_LAYER: &str = "pressure";
pub const CURRENTS_LAYER: &str = "currents";
pub const UV_LAYER: &str = "uv";
pub const RADIATION_LAYER: &str = "radiation";
pub const SST_LAYER: &str = "sst";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    /// Arrow pointing in the given compass bearing, degrees.
    Arrow { bearing_deg: u16 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub shape: MarkerShape,
    /// Radius in pixels.
    pub radius: f64,
    pub color: &'static str,
    /// Popup text.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    /// `{z}/{y}/{x}` template.
    pub url_template: String,
    pub attribution: &'static str,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    Markers(Vec<Marker>),
    Tiles(TileSource),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub key: &'static str,
    pub title: &'static str,
    pub content: LayerContent,
}

impl Layer {
    pub fn marker_count(&self) -> usize {
        match &self.content {
            LayerContent::Markers(m) => m.len(),
            LayerContent::Tiles(_) => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Map surface
// ---------------------------------------------------------------------------

/// Anything that can show and hide layers by key.
pub trait MapSurface {
    fn add_layer(&mut self, layer: &Layer);
    fn remove_layer(&mut self, key: &str);
}

/// Tracks the current layer per key and its visibility. Rebuilding a layer
/// keeps its visibility; toggling never rebuilds.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: BTreeMap<&'static str, (Layer, bool)>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces `layer`. New keys start visible.
    pub fn install(&mut self, layer: Layer, map: &mut dyn MapSurface) {
        let visible = match self.layers.get(layer.key) {
            Some((_, visible)) => {
                if *visible {
                    map.remove_layer(layer.key);
                }
                *visible
            }
            None => true,
        };
        if visible {
            map.add_layer(&layer);
        }
        self.layers.insert(layer.key, (layer, visible));
    }

    /// Shows or hides a layer. Returns false for an unknown key.
    pub fn set_visible(&mut self, key: &str, visible: bool, map: &mut dyn MapSurface) -> bool {
        let Some((layer, current)) = self.layers.get_mut(key) else {
            return false;
        };
        if *current != visible {
            if visible {
                map.add_layer(layer);
            } else {
                map.remove_layer(key);
            }
            *current = visible;
        }
        true
    }

    pub fn toggle(&mut self, key: &str, map: &mut dyn MapSurface) -> bool {
        match self.is_visible(key) {
            Some(visible) => self.set_visible(key, !visible, map),
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Layer> {
        self.layers.get(key).map(|(layer, _)| layer)
    }

    pub fn is_visible(&self, key: &str) -> Option<bool> {
        self.layers.get(key).map(|(_, visible)| *visible)
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub type LayerBuilder = fn(&SourceBatch) -> Layer;

/// The builders fed by one fetch of `source`.
pub fn builders_for(source: SourceKind) -> &'static [LayerBuilder] {
    match source {
        SourceKind::Waves => &[build_waves_layer],
        SourceKind::Weather => &[build_wind_layer, build_pressure_layer],
        SourceKind::Currents => &[build_currents_layer],
        SourceKind::Uv => &[build_uv_layer],
    }
}

/// Markers for every reading of `phenomenon` that has a value.
fn markers<F>(batch: &SourceBatch, phenomenon: Phenomenon, mut encode: F) -> Vec<Marker>
where
    F: FnMut(f64, Coordinate) -> Marker,
{
    batch
        .readings(phenomenon)
        .filter_map(|r| r.value.map(|v| encode(v, r.coordinate)))
        .collect()
}

pub fn build_waves_layer(batch: &SourceBatch) -> Layer {
    let markers = markers(batch, Phenomenon::WaveHeight, |height, coordinate| Marker {
        coordinate,
        shape: MarkerShape::Circle,
        radius: 4.0 + 3.0 * height.max(0.0),
        color: wave_color(height),
        label: format!("Wave height {:.1} m", height),
    });
    Layer {
        key: WAVES_LAYER,
        title: "Waves",
        content: LayerContent::Markers(markers),
    }
}

pub fn wave_color(height_m: f64) -> &'static str {
    if height_m > 4.0 {
        "#ff4444"
    } else if height_m > 2.0 {
        "#ff9900"
    } else {
        "#00ccff"
    }
}

pub fn build_wind_layer(batch: &SourceBatch) -> Layer {
    let directions: Vec<Option<f64>> = batch.values(Phenomenon::WindDirection);
    let markers: Vec<Marker> = batch
        .points
        .iter()
        .zip(directions)
        .filter_map(|(point, direction)| {
            let reading = point.readings.iter().find(|r| r.phenomenon == Phenomenon::WindSpeed)?;
            let speed = reading.value?;
            let bearing = direction.unwrap_or(0.0).rem_euclid(360.0).round() as u16 % 360;
            Some(Marker {
                coordinate: reading.coordinate,
                shape: MarkerShape::Arrow { bearing_deg: bearing },
                radius: 8.0,
                color: wind_color(speed),
                label: format!("Wind {:.0} km/h from {}°", speed, bearing),
            })
        })
        .collect();
    Layer {
        key: WIND_LAYER,
        title: "Wind",
        content: LayerContent::Markers(markers),
    }
}

pub fn wind_color(speed_kmh: f64) -> &'static str {
    if speed_kmh > 40.0 {
        "#ff4444"
    } else if speed_kmh > 20.0 {
        "#ffdd00"
    } else {
        "#44dd66"
    }
}

pub fn build_pressure_layer(batch: &SourceBatch) -> Layer {
    let markers = markers(batch, Phenomenon::Pressure, |hpa, coordinate| Marker {
        coordinate,
        shape: MarkerShape::Circle,
        radius: 6.0,
        color: pressure_color(hpa),
        label: format!("Pressure {:.0} hPa", hpa),
    });
    Layer {
        key: PRESSURE_LAYER,
        title: "Pressure",
        content: LayerContent::Markers(markers),
    }
}

pub fn pressure_color(hpa: f64) -> &'static str {
    if hpa < 1000.0 {
        "#9933ff"
    } else if hpa > 1020.0 {
        "#3366ff"
    } else {
        "#999999"
    }
}

pub fn build_currents_layer(batch: &SourceBatch) -> Layer {
    let markers = markers(batch, Phenomenon::OceanCurrentVelocity, |kmh, coordinate| Marker {
        coordinate,
        shape: MarkerShape::Circle,
        radius: 4.0 + 10.0 * kmh.max(0.0),
        color: "#00b3a4",
        label: format!("Current {:.2} km/h", kmh),
    });
    Layer {
        key: CURRENTS_LAYER,
        title: "Ocean currents",
        content: LayerContent::Markers(markers),
    }
}

pub fn build_uv_layer(batch: &SourceBatch) -> Layer {
    let markers = markers(batch, Phenomenon::UvIndex, |uv, coordinate| Marker {
        coordinate,
        shape: MarkerShape::Circle,
        radius: 7.0,
        color: uv_color(uv),
        label: format!("UV index {:.1}", uv),
    });
    Layer {
        key: UV_LAYER,
        title: "UV index",
        content: LayerContent::Markers(markers),
    }
}

/// WHO UV index colour bands.
pub fn uv_color(uv: f64) -> &'static str {
    if uv <= 2.0 {
        "#4eb400"
    } else if uv <= 5.0 {
        "#f7e400"
    } else if uv <= 7.0 {
        "#f85900"
    } else if uv <= 10.0 {
        "#d8001d"
    } else {
        "#998cff"
    }
}

// ---------------------------------------------------------------------------
// Static layers
// ---------------------------------------------------------------------------

/// Reference radiation sensors. Built from constants; never refetched.
pub fn build_radiation_layer() -> Layer {
    let markers = RADIATION_SENSORS
        .iter()
        .map(|s| Marker {
            coordinate: s.coordinate,
            shape: MarkerShape::Circle,
            radius: 6.0,
            color: if s.dose_usv_h < 0.3 { "#44dd66" } else { "#ffbf00" },
            label: format!("{}: {:.2} µSv/h", s.name, s.dose_usv_h),
        })
        .collect();
    Layer {
        key: RADIATION_LAYER,
        title: "Radiation (reference)",
        content: LayerContent::Markers(markers),
    }
}

const GIBS_SST_TEMPLATE: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/GHRSST_L4_MUR_Sea_Surface_Temperature/default/{date}/GoogleMapsCompatible_Level7/{z}/{y}/{x}.png";

/// Sea-surface temperature tiles for the day before `today` (the most recent
/// complete composite).
pub fn build_sst_layer(today: NaiveDate) -> Layer {
    let day = today - Duration::days(1);
    Layer {
        key: SST_LAYER,
        title: "Sea surface temperature",
        content: LayerContent::Tiles(TileSource {
            url_template: GIBS_SST_TEMPLATE.replace("{date}", &day.format("%Y-%m-%d").to_string()),
            attribution: "NASA GIBS / GHRSST MUR",
            opacity: 0.6,
        }),
    }
}
