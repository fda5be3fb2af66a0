/// Open-Meteo API Client
///
/// Retrieves current marine (waves, ocean currents) and atmospheric (wind,
/// pressure, UV) conditions for one coordinate per request.
///
/// API Documentation: https://open-meteo.com/en/docs/marine-weather-api
/// Forecast API: https://open-meteo.com/en/docs
///
/// Responses are checked against a typed envelope before anything is
/// admitted: a body that does not deserialize drops the point, a field that
/// is missing or null becomes a Reading with no value.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::model::{Coordinate, Phenomenon, Reading, SourceError, SourceKind};

pub const MARINE_BASE_URL: &str = "https://marine-api.open-meteo.com";
pub const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

// ============================================================================
// API Response Structures
// ============================================================================

/// Envelope shared by the marine and forecast endpoints when called with
/// `current=...`.
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub current: CurrentBlock,
}

/// The `current` block. Every measured field is optional: the upstream
/// returns `null` for grid cells it has no model data for.
#[derive(Debug, Deserialize)]
pub struct CurrentBlock {
    pub time: Option<String>,
    #[serde(default)]
    pub wave_height: Option<f64>,
    #[serde(default)]
    pub wave_period: Option<f64>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub wind_direction_10m: Option<f64>,
    #[serde(default)]
    pub pressure_msl: Option<f64>,
    #[serde(default)]
    pub ocean_current_velocity: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
}

impl CurrentBlock {
    fn value_of(&self, phenomenon: Phenomenon) -> Option<f64> {
        match phenomenon {
            Phenomenon::WaveHeight => self.wave_height,
            Phenomenon::WavePeriod => self.wave_period,
            Phenomenon::WindSpeed => self.wind_speed_10m,
            Phenomenon::WindDirection => self.wind_direction_10m,
            Phenomenon::Pressure => self.pressure_msl,
            Phenomenon::OceanCurrentVelocity => self.ocean_current_velocity,
            Phenomenon::UvIndex => self.uv_index,
        }
    }
}

/// Open-Meteo field name for a phenomenon.
pub fn field_name(phenomenon: Phenomenon) -> &'static str {
    match phenomenon {
        Phenomenon::WaveHeight => "wave_height",
        Phenomenon::WavePeriod => "wave_period",
        Phenomenon::WindSpeed => "wind_speed_10m",
        Phenomenon::WindDirection => "wind_direction_10m",
        Phenomenon::Pressure => "pressure_msl",
        Phenomenon::OceanCurrentVelocity => "ocean_current_velocity",
        Phenomenon::UvIndex => "uv_index",
    }
}

/// Human-readable source label attached to each Reading.
pub fn source_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Waves | SourceKind::Currents => "Open-Meteo Marine",
        SourceKind::Weather | SourceKind::Uv => "Open-Meteo Forecast",
    }
}

// ============================================================================
// URL Construction
// ============================================================================

/// Base URLs for the two upstream services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub marine_base_url: String,
    pub forecast_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            marine_base_url: MARINE_BASE_URL.to_string(),
            forecast_base_url: FORECAST_BASE_URL.to_string(),
        }
    }
}

/// Builds the `current=` request URL for one source at one coordinate.
///
/// Wind speed is requested in km/h (the upstream default) and ocean current
/// velocity likewise, so no unit conversion happens downstream.
pub fn build_current_url(endpoints: &Endpoints, kind: SourceKind, at: &Coordinate) -> String {
    let (base, path) = match kind {
        SourceKind::Waves | SourceKind::Currents => (&endpoints.marine_base_url, "/v1/marine"),
        SourceKind::Weather | SourceKind::Uv => (&endpoints.forecast_base_url, "/v1/forecast"),
    };
    let fields: Vec<&str> = kind.phenomena().iter().map(|p| field_name(*p)).collect();
    format!(
        "{}{}?latitude={:.4}&longitude={:.4}&current={}&timezone=GMT",
        base.trim_end_matches('/'),
        path,
        at.latitude(),
        at.longitude(),
        fields.join(",")
    )
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses one point's response body into one Reading per phenomenon the
/// source delivers.
pub fn parse_current_response(body: &str, kind: SourceKind) -> Result<Vec<Reading>, SourceError> {
    let response: CurrentResponse =
        serde_json::from_str(body).map_err(|e| SourceError::ParseError(e.to_string()))?;

    let coordinate = Coordinate::new(response.latitude, response.longitude)?;
    let observed_at = response
        .current
        .time
        .as_deref()
        .ok_or(SourceError::MissingField("time"))
        .and_then(parse_time)?;

    Ok(kind
        .phenomena()
        .iter()
        .map(|p| Reading {
            phenomenon: *p,
            coordinate,
            value: response.current.value_of(*p),
            source: Some(source_label(kind).to_string()),
            observed_at: Some(observed_at),
        })
        .collect())
}

/// Parses the upstream `YYYY-MM-DDTHH:MM` timestamp (GMT, no offset).
fn parse_time(raw: &str) -> Result<DateTime<Utc>, SourceError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
        .map_err(|e| SourceError::ParseError(format!("time '{}': {}", raw, e)))
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch current conditions for one source at one coordinate.
pub fn fetch_current(
    client: &reqwest::blocking::Client,
    endpoints: &Endpoints,
    kind: SourceKind,
    at: &Coordinate,
) -> Result<Vec<Reading>, SourceError> {
    let url = build_current_url(endpoints, kind, at);

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SourceError::HttpError(response.status().as_u16()));
    }

    let body = response
        .text()
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    parse_current_response(&body, kind)
}

// ============================================================================
// Tests
// ============================================================================
