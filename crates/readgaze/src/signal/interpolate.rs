//! Gap interpolation over tracking dropouts

use crate::types::{GazeSample, Point};
use std::ops::Range;

/// Resolve the position of every sample in `range`.
///
/// Valid samples keep their raw position. A missing sample is interpolated
/// by elapsed time between its nearest valid neighbours, copies the only
/// neighbour it has, or stays unresolved when the series holds no valid
/// sample at all. Neighbours are searched over the whole slice.
pub fn interpolate_range(samples: &mut [GazeSample], range: Range<usize>) {
    let anchor = |s: &GazeSample| s.raw_point().map(|p| (s.t, p));
    let mut prev = samples[..range.start].iter().rev().find_map(anchor);
    // next valid sample after the current dropout run, found once per run
    let mut next: Option<(usize, Option<(f64, Point)>)> = None;

    for i in range {
        if let Some(p) = samples[i].raw_point() {
            samples[i].fill = Some(p);
            prev = Some((samples[i].t, p));
            continue;
        }

        let bound = match next {
            Some((j, bound)) if j > i => bound,
            _ => {
                let found = samples[i + 1..]
                    .iter()
                    .position(|s| s.raw_point().is_some())
                    .map(|off| i + 1 + off);
                let bound = found.and_then(|j| anchor(&samples[j]));
                next = Some((found.unwrap_or(samples.len()), bound));
                bound
            }
        };
        samples[i].fill = resolve(samples[i].t, prev, bound);
    }
}

/// Resolve the whole series.
pub fn interpolate(samples: &mut [GazeSample]) {
    let len = samples.len();
    interpolate_range(samples, 0..len);
}

fn resolve(t: f64, prev: Option<(f64, Point)>, next: Option<(f64, Point)>) -> Option<Point> {
    match (prev, next) {
        (Some((tp, p)), Some((tn, n))) => {
            let span = tn - tp;
            if span <= 0.0 {
                return Some(p);
            }
            Some(Point {
                x: p.x + (n.x - p.x) * (t - tp) / span,
                y: p.y + (n.y - p.y) * (t - tp) / span,
            })
        }
        (Some((_, p)), None) => Some(p),
        (None, Some((_, n))) => Some(n),
        (None, None) => None,
    }
}
