//! Stress threshold checking.
//!
//! Four independent conditions are checked on every recomputation. By
//! default alerts are level-triggered: a condition that holds for ten cycles
//! fires ten times. `AlertMode::Edge` fires once per false-to-true transition
//! instead. Level is the default; while a condition persists it can push
//! everything else out of the five-entry feed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::engine::statistics::Statistics;

pub const GALE_WIND_KMH: f64 = 40.0;
pub const STORM_PRESSURE_HPA: f64 = 990.0;
pub const HIGH_SEAS_WAVE_M: f64 = 3.5;
pub const EXTREME_UV_INDEX: f64 = 8.0;

pub const SYSTEM_CHECK_MESSAGE: &str = "System check: all sensors nominal";

/// What raised an alert entry, in evaluation order for the threshold kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Gale,
    Storm,
    HighSeas,
    ExtremeUv,
    Lifecycle,
}

impl AlertKind {
    pub const THRESHOLDS: [AlertKind; 4] = [
        AlertKind::Gale,
        AlertKind::Storm,
        AlertKind::HighSeas,
        AlertKind::ExtremeUv,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Gale => "GALE WARNING",
            AlertKind::Storm => "STORM SYSTEM",
            AlertKind::HighSeas => "HIGH SEAS",
            AlertKind::ExtremeUv => "EXTREME UV",
            AlertKind::Lifecycle => "SYSTEM",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AlertKind::Gale => "#ffaa00",
            AlertKind::Storm => "#ff4444",
            AlertKind::HighSeas => "#4da6ff",
            AlertKind::ExtremeUv => "#c266ff",
            AlertKind::Lifecycle => "#00ff88",
        }
    }

    /// Whether this threshold condition holds for `stats`. Lifecycle never does.
    pub fn holds(&self, stats: &Statistics) -> bool {
        match self {
            AlertKind::Gale => stats.max_wind > GALE_WIND_KMH,
            AlertKind::Storm => stats.min_pressure < STORM_PRESSURE_HPA,
            AlertKind::HighSeas => stats.avg_wave > HIGH_SEAS_WAVE_M,
            AlertKind::ExtremeUv => stats.max_uv > EXTREME_UV_INDEX,
            AlertKind::Lifecycle => false,
        }
    }

    fn describe(&self, stats: &Statistics) -> String {
        match self {
            AlertKind::Gale => format!("winds reaching {:.0} km/h", stats.max_wind),
            AlertKind::Storm => format!("pressure down to {:.0} hPa", stats.min_pressure),
            AlertKind::HighSeas => format!("average wave height {:.1} m", stats.avg_wave),
            AlertKind::ExtremeUv => format!("UV index {:.1}", stats.max_uv),
            AlertKind::Lifecycle => String::new(),
        }
    }
}

/// A threshold breach, before it is timestamped into the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdAlert {
    pub kind: AlertKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// Re-fire every recomputation the condition holds.
    #[default]
    Level,
    /// Fire once when the condition starts holding.
    Edge,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    mode: AlertMode,
    /// Whether each threshold held at the previous evaluation (edge mode).
    active: [bool; 4],
}

impl AlertEvaluator {
    pub fn new(mode: AlertMode) -> Self {
        Self {
            mode,
            active: [false; 4],
        }
    }

    pub fn evaluate(&mut self, stats: &Statistics) -> Vec<ThresholdAlert> {
        let mut fired = Vec::new();
        for (slot, kind) in AlertKind::THRESHOLDS.iter().enumerate() {
            let holds = kind.holds(stats);
            let was_active = std::mem::replace(&mut self.active[slot], holds);
            let fire = match self.mode {
                AlertMode::Level => holds,
                AlertMode::Edge => holds && !was_active,
            };
            if fire {
                fired.push(ThresholdAlert {
                    kind: *kind,
                    message: kind.describe(stats),
                });
            }
        }
        fired
    }
}

// ---------------------------------------------------------------------------
// System check filler
// ---------------------------------------------------------------------------

/// Randomly injects the "system check" lifecycle entry.
#[derive(Debug, Clone)]
pub struct SystemCheck {
    probability: f64,
    rng: StdRng,
}

impl SystemCheck {
    pub fn new(probability: f64) -> Self {
        Self::with_rng(probability, StdRng::from_entropy())
    }

    pub fn with_rng(probability: f64, rng: StdRng) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn roll(&mut self) -> bool {
        self.probability > 0.0 && self.rng.gen_bool(self.probability)
    }
}
