//! Summary statistics over the validated Sample Buffers.
//!
//! Empty buffers fall back to "calm" defaults so the stress index degrades
//! toward zero while a source has not answered yet.

/// Standard atmosphere, hPa. Used when no pressure reading survived validation.
pub const STANDARD_PRESSURE_HPA: f64 = 1013.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean significant wave height, m.
    pub avg_wave: f64,
    /// Highest wind speed, km/h.
    pub max_wind: f64,
    /// Lowest sea-level pressure, hPa.
    pub min_pressure: f64,
    /// Highest UV index.
    pub max_uv: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            avg_wave: 0.0,
            max_wind: 0.0,
            min_pressure: STANDARD_PRESSURE_HPA,
            max_uv: 0.0,
        }
    }
}

impl Statistics {
    /// Arguments must already be validated.
    pub fn from_validated(waves: &[f64], wind: &[f64], pressure: &[f64], uv: &[f64]) -> Self {
        Self {
            avg_wave: mean(waves).unwrap_or(0.0),
            max_wind: max(wind).unwrap_or(0.0),
            min_pressure: min(pressure).unwrap_or(STANDARD_PRESSURE_HPA),
            max_uv: max(uv).unwrap_or(0.0),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}
