/// Core data types for the ocean stress monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// phenomena, coordinates, readings, sample points and the error types raised
/// at the ingestion boundary. It contains no I/O.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Phenomena
// ---------------------------------------------------------------------------

/// One measured quantity a Reading can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phenomenon {
    /// Significant wave height, metres.
    WaveHeight,
    /// Wave period, seconds.
    WavePeriod,
    /// Wind speed at 10 m, km/h.
    WindSpeed,
    /// Wind direction at 10 m, degrees.
    WindDirection,
    /// Mean sea-level pressure, hPa.
    Pressure,
    /// Ocean surface current velocity, km/h.
    OceanCurrentVelocity,
    /// UV index, unitless.
    UvIndex,
}

impl Phenomenon {
    pub const ALL: [Phenomenon; 7] = [
        Phenomenon::WaveHeight,
        Phenomenon::WavePeriod,
        Phenomenon::WindSpeed,
        Phenomenon::WindDirection,
        Phenomenon::Pressure,
        Phenomenon::OceanCurrentVelocity,
        Phenomenon::UvIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phenomenon::WaveHeight => "wave-height",
            Phenomenon::WavePeriod => "wave-period",
            Phenomenon::WindSpeed => "wind-speed",
            Phenomenon::WindDirection => "wind-direction",
            Phenomenon::Pressure => "pressure",
            Phenomenon::OceanCurrentVelocity => "ocean-current-velocity",
            Phenomenon::UvIndex => "uv-index",
        }
    }

    /// The Sample Buffer this phenomenon feeds, if any.
    ///
    /// Only wave height, wind speed, pressure and UV take part in the stress
    /// index; the rest are layer-only.
    pub fn buffer(&self) -> Option<BufferKind> {
        match self {
            Phenomenon::WaveHeight => Some(BufferKind::Waves),
            Phenomenon::WindSpeed => Some(BufferKind::Wind),
            Phenomenon::Pressure => Some(BufferKind::Pressure),
            Phenomenon::UvIndex => Some(BufferKind::Uv),
            _ => None,
        }
    }
}

impl fmt::Display for Phenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Buffer keys
// ---------------------------------------------------------------------------

/// The four phenomenon categories the Aggregation Engine keeps a Sample
/// Buffer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    Waves,
    Wind,
    Pressure,
    Uv,
}

impl BufferKind {
    pub const ALL: [BufferKind; 4] = [
        BufferKind::Waves,
        BufferKind::Wind,
        BufferKind::Pressure,
        BufferKind::Uv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BufferKind::Waves => "waves",
            BufferKind::Wind => "wind",
            BufferKind::Pressure => "pressure",
            BufferKind::Uv => "uv",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            BufferKind::Waves => 0,
            BufferKind::Wind => 1,
            BufferKind::Pressure => 2,
            BufferKind::Uv => 3,
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BufferKind {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waves" => Ok(BufferKind::Waves),
            "wind" => Ok(BufferKind::Wind),
            "pressure" => Ok(BufferKind::Pressure),
            "uv" => Ok(BufferKind::Uv),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key '{0}'")]
pub struct UnknownKey(pub String);

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// The independent upstream fetchers. `Weather` is one upstream request that
/// is multiplexed into both the wind and the pressure phenomena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Waves,
    Weather,
    Currents,
    Uv,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Waves,
        SourceKind::Weather,
        SourceKind::Currents,
        SourceKind::Uv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Waves => "waves",
            SourceKind::Weather => "weather",
            SourceKind::Currents => "currents",
            SourceKind::Uv => "uv",
        }
    }

    /// Phenomena delivered by one fetch of this source.
    pub fn phenomena(&self) -> &'static [Phenomenon] {
        match self {
            SourceKind::Waves => &[Phenomenon::WaveHeight, Phenomenon::WavePeriod],
            SourceKind::Weather => &[
                Phenomenon::WindSpeed,
                Phenomenon::WindDirection,
                Phenomenon::Pressure,
            ],
            SourceKind::Currents => &[Phenomenon::OceanCurrentVelocity],
            SourceKind::Uv => &[Phenomenon::UvIndex],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A WGS84 coordinate. Latitude is bounded to [-90, 90] and longitude to
/// [-180, 180]. Fields are private: runtime values go through
/// `Coordinate::new`; the static registries use `from_static`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SourceError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(SourceError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    /// Unchecked constructor for compile-time tables. Every table built with
    /// it has a test asserting its entries pass `Coordinate::new`.
    pub(crate) const fn from_static(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A fixed geographic point a source is queried at.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    /// Short stable identifier, e.g. "n-atlantic".
    pub id: &'static str,
    pub name: &'static str,
    pub coordinate: Coordinate,
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single observation of one phenomenon at one point.
///
/// `value` is `None` when the upstream reported the field as missing or null,
/// i.e. the sensor is unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub phenomenon: Phenomenon,
    pub coordinate: Coordinate,
    pub value: Option<f64>,
    pub source: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or validating a single point's data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// Non-2xx HTTP response from the upstream API.
    #[error("HTTP error: {0}")]
    HttpError(u16),
    /// The request never produced a response (DNS, TLS, timeout...).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The response body did not match the expected envelope.
    #[error("Parse error: {0}")]
    ParseError(String),
    /// The envelope parsed but a required field is absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    /// The upstream echoed a coordinate outside WGS84 bounds.
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_rejected_coordinate_reports_offending_values() {
        let err = Coordinate::new(123.0, 2.0).unwrap_err();
        assert_eq!(
            err,
            SourceError::InvalidCoordinate {
                latitude: 123.0,
                longitude: 2.0
            }
        );
        let ok = Coordinate::new(-18.0, 155.0).unwrap();
        assert_eq!((ok.latitude(), ok.longitude()), (-18.0, 155.0));
    }

    #[test]
    fn test_buffer_kind_parses_ingest_keys() {
        for kind in BufferKind::ALL {
            assert_eq!(kind.as_str().parse::<BufferKind>(), Ok(kind));
        }
        assert!("salinity".parse::<BufferKind>().is_err());
    }

    #[test]
    fn test_only_four_phenomena_feed_buffers() {
        let feeding: Vec<_> = Phenomenon::ALL
            .iter()
            .filter_map(|p| p.buffer())
            .collect();
        assert_eq!(feeding, BufferKind::ALL.to_vec());
    }

    #[test]
    fn test_weather_source_multiplexes_wind_and_pressure() {
        let phenomena = SourceKind::Weather.phenomena();
        assert!(phenomena.contains(&Phenomenon::WindSpeed));
        assert!(phenomena.contains(&Phenomenon::Pressure));
    }
}
