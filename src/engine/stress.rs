//! Composite stress index, severity tiers and chart series.
//!
//! The index is a heuristic, not a physically validated measure: each term
//! normalizes one phenomenon against a rough "significant" level (3 m waves,
//! 60 km/h wind, a 25 hPa deficit below 1015 hPa, UV 12 weighted 1.5x) and
//! the sum is hard-clamped to [0, 10]. The coefficients are fixed.

use std::fmt;

use super::statistics::Statistics;

pub const STRESS_MIN: f64 = 0.0;
pub const STRESS_MAX: f64 = 10.0;

const WAVE_SCALE_M: f64 = 3.0;
const WIND_SCALE_KMH: f64 = 60.0;
const PRESSURE_REFERENCE_HPA: f64 = 1015.0;
const PRESSURE_SCALE_HPA: f64 = 25.0;
const UV_SCALE: f64 = 12.0;
const UV_WEIGHT: f64 = 1.5;

// ---------------------------------------------------------------------------
// Stress index
// ---------------------------------------------------------------------------

/// A stress value, always within [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct StressIndex(f64);

impl StressIndex {
    /// Clamps `raw` into range. NaN (only reachable from infinite inputs that
    /// cancel) is treated as calm.
    pub fn clamped(raw: f64) -> Self {
        if raw.is_nan() {
            return StressIndex(STRESS_MIN);
        }
        StressIndex(raw.clamp(STRESS_MIN, STRESS_MAX))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Progress-bar width in percent; 100 at the maximum index.
    pub fn bar_width_pct(&self) -> f64 {
        self.0 * 10.0
    }

    pub fn tier(&self) -> SeverityTier {
        SeverityTier::classify(self.0)
    }
}

impl fmt::Display for StressIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

pub fn compute_stress_index(avg_wave: f64, max_wind: f64, min_pressure: f64, max_uv: f64) -> StressIndex {
    let raw = avg_wave / WAVE_SCALE_M
        + max_wind / WIND_SCALE_KMH
        + (PRESSURE_REFERENCE_HPA - min_pressure) / PRESSURE_SCALE_HPA
        + (max_uv / UV_SCALE) * UV_WEIGHT;
    StressIndex::clamped(raw)
}

impl From<&Statistics> for StressIndex {
    fn from(s: &Statistics) -> Self {
        compute_stress_index(s.avg_wave, s.max_wind, s.min_pressure, s.max_uv)
    }
}

// ---------------------------------------------------------------------------
// Severity tiers
// ---------------------------------------------------------------------------

/// Severity tiers in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeverityTier {
    Stable,
    Unstable,
    HighAlert,
}

impl SeverityTier {
    /// `> 6` high alert, `> 3` unstable, otherwise stable. Ties at 3 and 6
    /// resolve to the lower tier.
    pub fn classify(stress: f64) -> Self {
        if stress > 6.0 {
            SeverityTier::HighAlert
        } else if stress > 3.0 {
            SeverityTier::Unstable
        } else {
            SeverityTier::Stable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Stable => "STABLE",
            SeverityTier::Unstable => "UNSTABLE",
            SeverityTier::HighAlert => "HIGH ALERT",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SeverityTier::Stable => "#00ff88",
            SeverityTier::Unstable => "#ffaa00",
            SeverityTier::HighAlert => "#ff4444",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

pub const CHART_POINTS: usize = 8;

/// Display-only scaling of the current scalars onto an 8-point trend chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSeries(pub [f64; CHART_POINTS]);

impl ChartSeries {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

pub fn derive_chart_series(
    stress: f64,
    avg_wave: f64,
    max_wind: f64,
    min_pressure: f64,
    max_uv: f64,
) -> ChartSeries {
    ChartSeries([
        stress * 8.0,
        avg_wave * 10.0,
        max_wind / 2.0,
        (1013.0 - min_pressure) * 5.0,
        stress * 5.0,
        avg_wave * 5.0,
        max_wind / 3.0,
        max_uv * 2.0,
    ])
}
