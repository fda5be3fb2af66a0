//! Alerting: threshold evaluation and the bounded alert feed.
//!
//! Submodules:
//! - `thresholds`: the four stress conditions, level/edge triggering, system-check filler.
//! - `feed`: timestamped, capacity-bounded, most-recent-first entries.

pub mod feed;
pub mod thresholds;

pub use feed::{AlertEntry, AlertFeed, FEED_CAPACITY};
pub use thresholds::{AlertEvaluator, AlertKind, AlertMode, SystemCheck, ThresholdAlert};
