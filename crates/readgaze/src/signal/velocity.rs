//! Velocity derivation and fixation/saccade classification

use crate::types::{GazeSample, SampleKind};
use std::ops::Range;

/// First difference of the smoothed position over elapsed time (px/ms).
///
/// Sample 0 and any step with `dt <= 0` get zero velocity.
pub fn derive_velocity_range(samples: &mut [GazeSample], range: Range<usize>) {
    for i in range {
        let (vx, vy) = if i == 0 {
            (0.0, 0.0)
        } else {
            let (prev, cur) = (&samples[i - 1], &samples[i]);
            let dt = cur.t - prev.t;
            if dt > 0.0 {
                ((cur.gx - prev.gx) / dt, (cur.gy - prev.gy) / dt)
            } else {
                (0.0, 0.0)
            }
        };
        samples[i].vx = vx;
        samples[i].vy = vy;
    }
}

pub fn derive_velocity(samples: &mut [GazeSample]) {
    let len = samples.len();
    derive_velocity_range(samples, 0..len);
}

/// Tracker-reported state wins; otherwise speed against `fixation_velocity`.
pub fn classify(sample: &GazeSample, fixation_velocity: f64) -> SampleKind {
    if let Some(kind) = sample.reported_kind {
        return kind;
    }
    if sample.fill.is_none() {
        return SampleKind::Unknown;
    }
    if sample.vx.hypot(sample.vy) < fixation_velocity {
        SampleKind::Fixation
    } else {
        SampleKind::Saccade
    }
}

pub fn classify_range(samples: &mut [GazeSample], range: Range<usize>, fixation_velocity: f64) {
    for s in &mut samples[range] {
        s.kind = classify(s, fixation_velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn smoothed(t: f64, gx: f64) -> GazeSample {
        let mut s = GazeSample::new(t, Some(gx), Some(0.0));
        s.fill = Some(Point { x: gx, y: 0.0 });
        s.gx = gx;
        s
    }

    #[test]
    fn test_zero_at_start() {
        let mut s = vec![smoothed(0.0, 400.0), smoothed(10.0, 410.0)];
        s[0].vx = 99.0;
        derive_velocity(&mut s);
        assert_eq!((s[0].vx, s[0].vy), (0.0, 0.0));
        assert_eq!(s[1].vx, 1.0);
    }

    #[test]
    fn test_uses_smoothed_not_raw() {
        let mut s = vec![smoothed(0.0, 100.0), smoothed(20.0, 140.0)];
        s[1].x = Some(9999.0);
        derive_velocity(&mut s);
        assert_eq!(s[1].vx, 2.0);
    }

    #[test]
    fn test_non_positive_dt() {
        let mut s = vec![smoothed(50.0, 100.0), smoothed(50.0, 200.0), smoothed(40.0, 300.0)];
        derive_velocity(&mut s);
        assert_eq!(s[1].vx, 0.0);
        assert_eq!(s[2].vx, 0.0);
    }

    #[test]
    fn test_classification() {
        let mut slow = smoothed(0.0, 0.0);
        slow.vx = 0.3;
        assert_eq!(classify(&slow, 0.5), SampleKind::Fixation);

        let mut fast = smoothed(0.0, 0.0);
        fast.vx = -4.0;
        assert_eq!(classify(&fast, 0.5), SampleKind::Saccade);

        fast.reported_kind = Some(SampleKind::Fixation);
        assert_eq!(classify(&fast, 0.5), SampleKind::Fixation);

        let lost = GazeSample::new(0.0, None, None);
        assert_eq!(classify(&lost, 0.5), SampleKind::Unknown);
    }
}
