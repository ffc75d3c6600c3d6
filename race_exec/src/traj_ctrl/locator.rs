//! Locating the vehicle on the path and choosing the pursuit target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use ordered_float::OrderedFloat;

use crate::path::SampledPath;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the sample nearest to `position_m`.
///
/// Only the segment leading up to `next_waypoint` is searched, so sections of
/// track that pass close to each other cannot be confused. The first of any
/// equally near samples is returned.
pub fn nearest_point(path: &SampledPath, next_waypoint: usize, position_m: &Vector2<f64>) -> usize {
    let num_segments = path.num_segments();
    let segment = (next_waypoint % num_segments + num_segments - 1) % num_segments;
    let range = path.segment_range(segment);
    let fallback = range.start;

    range
        .min_by_key(|&i| OrderedFloat((path.point(i) - position_m).norm()))
        .unwrap_or(fallback)
}

/// Walk forward from `nearest_index`, wrapping around the path, and return
/// the first sample further than `lookahead_m` from the nearest sample.
///
/// If `inclusive` a sample exactly `lookahead_m` away also qualifies. The
/// nearest sample itself is never returned, so a non-positive lookahead gives
/// the sample after it. Returns `None` if no sample on the path is far enough
/// away.
pub fn find_lookahead(
    path: &SampledPath,
    nearest_index: usize,
    lookahead_m: f64,
    inclusive: bool,
) -> Option<usize> {
    let origin = path.point(nearest_index);

    (1..path.len())
        .map(|step| path.offset_index(nearest_index, step as isize))
        .find(|&i| {
            let distance_m = (path.point(i) - origin).norm();
            if inclusive {
                distance_m >= lookahead_m
            }
            else {
                distance_m > lookahead_m
            }
        })
}
