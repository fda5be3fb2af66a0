//! Per-phenomenon validity predicates.
//!
//! Values failing a predicate are dropped, never substituted or corrected.

use crate::model::BufferKind;

/// Sanity floor for sea-level pressure, hPa. The lowest ever recorded is
/// about 870 hPa, so anything at or below this is a sensor fault encoding.
pub const PRESSURE_FLOOR_HPA: f64 = 850.0;

pub type Predicate = fn(f64) -> bool;

pub fn non_negative(value: f64) -> bool {
    value >= 0.0
}

pub fn above_pressure_floor(value: f64) -> bool {
    value > PRESSURE_FLOOR_HPA
}

pub fn predicate_for(kind: BufferKind) -> Predicate {
    match kind {
        BufferKind::Waves | BufferKind::Wind | BufferKind::Uv => non_negative,
        BufferKind::Pressure => above_pressure_floor,
    }
}

/// Keeps the present values that satisfy `predicate`, in order.
///
/// NaN fails every predicate (all comparisons are false) and is dropped.
pub fn validate<I>(values: I, predicate: Predicate) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| predicate(*v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nulls_and_negatives_are_dropped() {
        let raw = vec![Some(2.0), Some(-0.5), None, Some(0.0), Some(8.0)];
        assert_eq!(validate(raw, non_negative), vec![2.0, 0.0, 8.0]);
    }

    #[test]
    fn test_pressure_floor_is_exclusive() {
        let raw = vec![Some(850.0), Some(850.1), Some(0.0), Some(1013.0), None];
        assert_eq!(validate(raw, above_pressure_floor), vec![850.1, 1013.0]);
    }

    #[test]
    fn test_nan_is_dropped_by_every_predicate() {
        for kind in BufferKind::ALL {
            assert!(validate(vec![Some(f64::NAN)], predicate_for(kind)).is_empty());
        }
    }

    #[test]
    fn test_validation_is_idempotent() {
        let raw = vec![Some(995.0), Some(-1.0), None, Some(849.0), Some(1030.0), Some(f64::NAN)];
        for kind in BufferKind::ALL {
            let predicate = predicate_for(kind);
            let once = validate(raw.clone(), predicate);
            let twice = validate(once.iter().copied().map(Some), predicate);
            assert_eq!(once, twice, "re-validating {} changed the buffer", kind);
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let raw = vec![Some(3.0), Some(1.0), Some(2.0)];
        assert_eq!(validate(raw, non_negative), vec![3.0, 1.0, 2.0]);
    }
}
