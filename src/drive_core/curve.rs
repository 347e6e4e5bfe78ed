// ==============================================================================
// curve.rs — KEYFRAMED TUNING CURVES
// ------------------------------------------------------------------------------
// The drivetrain and steering read their tuning from keyframed curves:
// - acceleration curves: time (s) -> speed (km/h) at full throttle
// - steering curves: speed (km/h) -> angle limit / rate / centering rate
// - downforce curve: speed (km/h) -> percent of the downforce scalar
//
// `Curve` is the capability the core depends on (evaluate + ordered key
// times). `LinearCurve` is the serde-loadable piecewise-linear implementation
// used by the tuning files. Outside its key range a curve holds its end values.
// ==============================================================================

use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

use crate::drive_core::types::lerp;

pub trait Curve {
    fn evaluate(&self, x: Real) -> Real;

    /// Number of keyframes.
    fn len(&self) -> usize;

    /// Time of the keyframe at `index`, in ascending order.
    fn key_time(&self, index: usize) -> Option<Real>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn first_time(&self) -> Option<Real> {
        self.key_time(0)
    }

    fn last_time(&self) -> Option<Real> {
        self.len().checked_sub(1).and_then(|i| self.key_time(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: Real,
    pub value: Real,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearCurve {
    keys: Vec<Keyframe>,
}

impl LinearCurve {
    /// Build from `(time, value)` pairs; keys are sorted by time.
    pub fn new(points: &[(Real, Real)]) -> Self {
        let mut keys: Vec<Keyframe> = points
            .iter()
            .map(|&(time, value)| Keyframe { time, value })
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn constant(value: Real) -> Self {
        Self::new(&[(0.0, value)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// `Err` carries a human readable reason.
    pub fn check(&self) -> Result<(), String> {
        if self.keys.iter().any(|k| !k.time.is_finite() || !k.value.is_finite()) {
            return Err("contains non-finite keyframes".into());
        }
        if self.keys.windows(2).any(|w| w[1].time < w[0].time) {
            return Err("keyframes are not sorted by time".into());
        }
        Ok(())
    }
}

impl Curve for LinearCurve {
    fn evaluate(&self, x: Real) -> Real {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        // first key strictly after x; never 0 or len here
        let i = self.keys.partition_point(|k| k.time <= x);
        let a = self.keys[i - 1];
        let b = self.keys[i];

        let span = b.time - a.time;
        if span <= Real::EPSILON {
            return b.value;
        }
        lerp(a.value, b.value, (x - a.time) / span)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn key_time(&self, index: usize) -> Option<Real> {
        self.keys.get(index).map(|k| k.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_curve_evaluates_to_zero() {
        let c = LinearCurve::default();
        assert!(c.is_empty());
        assert_eq!(c.evaluate(12.0), 0.0);
        assert_eq!(c.last_time(), None);
    }

    #[test]
    fn interpolates_and_clamps() {
        let c = LinearCurve::new(&[(10.0, 50.0), (0.0, 0.0)]);
        assert_eq!(c.first_time(), Some(0.0));
        assert_eq!(c.last_time(), Some(10.0));
        assert_relative_eq!(c.evaluate(0.1), 0.5, epsilon = 1e-5);
        assert_relative_eq!(c.evaluate(5.0), 25.0, epsilon = 1e-5);
        assert_eq!(c.evaluate(-3.0), 0.0);
        assert_eq!(c.evaluate(99.0), 50.0);
    }

    #[test]
    fn duplicate_times_step() {
        let c = LinearCurve::new(&[(0.0, 0.0), (1.0, 1.0), (1.0, 5.0), (2.0, 5.0)]);
        assert_relative_eq!(c.evaluate(1.5), 5.0);
        assert!(c.check().is_ok());
    }

    #[test]
    fn check_rejects_nan() {
        let c = LinearCurve::new(&[(0.0, Real::NAN)]);
        assert!(c.check().is_err());
    }

    #[test]
    fn deserializes_from_keyframe_list() {
        let c: LinearCurve =
            serde_json::from_str(r#"[{"time":0,"value":10},{"time":4,"value":30}]"#).unwrap();
        assert_eq!(c.len(), 2);
        assert_relative_eq!(c.evaluate(2.0), 20.0);
    }
}
