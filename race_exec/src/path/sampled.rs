//! Densely sampled reference path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::ops::Range;

use log::{debug, warn};
use nalgebra::Vector2;
use serde::Serialize;

use util::maths::cyclic_index;

use super::{CatmullRomSpline, PathError, PathMode};
use crate::track::Track;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Smallest number of samples tried per spline segment.
pub const MIN_SAMPLES_PER_SEGMENT: usize = 4;

/// Largest number of samples tried per spline segment.
pub const MAX_SAMPLES_PER_SEGMENT: usize = 512;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A closed path made of ordered samples, grouped by waypoint segment.
///
/// Segment `i` runs from waypoint `i` towards waypoint `i + 1`, and owns the
/// samples from `segment_starts[i]` up to the start of the next segment. The
/// first sample of each segment is exactly its waypoint. The last sample of the
/// path is followed by the first.
#[derive(Debug, Clone, Serialize)]
pub struct SampledPath {
    points_m: Vec<Vector2<f64>>,

    segment_starts: Vec<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SampledPath {
    /// Build the path for the given track.
    pub fn from_track(
        track: &Track,
        mode: PathMode,
        alpha: f64,
        min_segment_length_m: f64,
    ) -> Self {
        match mode {
            PathMode::Spline => Self::spline(track, alpha, min_segment_length_m),
            PathMode::Polyline => Self::polyline(track),
        }
    }

    /// Interpolate every waypoint segment with a spline and sample each one
    /// until no gap between neighbouring samples reaches `min_segment_length_m`.
    pub fn spline(track: &Track, alpha: f64, min_segment_length_m: f64) -> Self {
        let segments = (0..track.num_waypoints())
            .map(|i| {
                let spline = CatmullRomSpline::from_track(track, i, alpha);
                let samples = sample_segment(&spline, min_segment_length_m);
                debug!("Segment {} sampled with {} points", i, samples.len());
                samples
            })
            .collect();

        Self::from_segments_unchecked(segments)
    }

    /// Use the track waypoints as the path, one sample per segment.
    pub fn polyline(track: &Track) -> Self {
        Self {
            points_m: track.waypoints().to_vec(),
            segment_starts: (0..track.num_waypoints()).collect(),
        }
    }

    /// Build a path from explicit per-segment samples.
    pub fn from_segments(segments: Vec<Vec<Vector2<f64>>>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::NoSegments);
        }
        if let Some(i) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment(i));
        }

        Ok(Self::from_segments_unchecked(segments))
    }

    fn from_segments_unchecked(segments: Vec<Vec<Vector2<f64>>>) -> Self {
        let mut points_m = Vec::with_capacity(segments.iter().map(Vec::len).sum());
        let mut segment_starts = Vec::with_capacity(segments.len());

        for seg in segments {
            segment_starts.push(points_m.len());
            points_m.extend(seg);
        }

        Self {
            points_m,
            segment_starts,
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points_m
    }

    /// Get the sample at `index`, wrapping around the path.
    pub fn point(&self, index: usize) -> Vector2<f64> {
        self.points_m[index % self.points_m.len()]
    }

    /// Index of the sample after `index`.
    pub fn next_index(&self, index: usize) -> usize {
        cyclic_index(index, 1, self.points_m.len())
    }

    /// Index of the sample `offset` places from `index`.
    pub fn offset_index(&self, index: usize, offset: isize) -> usize {
        cyclic_index(index, offset, self.points_m.len())
    }

    pub fn num_segments(&self) -> usize {
        self.segment_starts.len()
    }

    /// Index of the first sample of the segment, wrapping around the path.
    pub fn segment_start(&self, segment: usize) -> usize {
        self.segment_starts[segment % self.segment_starts.len()]
    }

    /// Indices of all samples belonging to the segment.
    pub fn segment_range(&self, segment: usize) -> Range<usize> {
        let segment = segment % self.segment_starts.len();
        let end = self
            .segment_starts
            .get(segment + 1)
            .copied()
            .unwrap_or_else(|| self.points_m.len());

        self.segment_starts[segment]..end
    }

    /// Straight-line distance between the sample and the one before it.
    pub fn step_length_m(&self, index: usize) -> f64 {
        (self.point(index) - self.point(self.offset_index(index, -1))).norm()
    }

    /// Length of the closed sample polyline.
    pub fn length_m(&self) -> f64 {
        (0..self.len()).map(|i| self.step_length_m(i)).sum()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Sample a spline segment at `n` evenly spaced parameter values in [0, 1),
/// with `n` doubling from `MIN_SAMPLES_PER_SEGMENT` until the longest gap,
/// including the gap to the segment's end point, is below
/// `min_segment_length_m`.
///
/// If `MAX_SAMPLES_PER_SEGMENT` samples still leave too large a gap the
/// densest sampling is used.
pub fn sample_segment(spline: &CatmullRomSpline, min_segment_length_m: f64) -> Vec<Vector2<f64>> {
    let end = spline.end_m();
    let mut num_samples = MIN_SAMPLES_PER_SEGMENT;

    loop {
        let samples: Vec<Vector2<f64>> = (0..num_samples)
            .map(|k| spline.progress(k as f64 / num_samples as f64))
            .collect();

        let longest_gap_m = samples
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .chain(samples.last().map(|last| (end - last).norm()))
            .fold(0.0, f64::max);

        if longest_gap_m < min_segment_length_m {
            return samples;
        }

        if num_samples >= MAX_SAMPLES_PER_SEGMENT {
            warn!(
                "Segment starting at {:?} still has a {:.3} m gap with {} samples",
                spline.start_m().as_slice(),
                longest_gap_m,
                num_samples
            );
            return samples;
        }

        num_samples *= 2;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_track() -> Track {
        Track::new(
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(100.0, 0.0),
                Vector2::new(100.0, 100.0),
                Vector2::new(0.0, 100.0),
            ],
            10.0,
        )
        .unwrap()
    }

    #[test]
    fn test_polyline() {
        let track = square_track();
        let path = SampledPath::polyline(&track);

        assert_eq!(path.len(), 4);
        assert_eq!(path.num_segments(), 4);
        assert_eq!(path.segment_range(2), 2..3);
        assert_eq!(path.segment_range(3), 3..4);
        assert_eq!(path.length_m(), 400.0);
    }

    #[test]
    fn test_spline_sampling_bound() {
        let track = square_track();
        let path = SampledPath::spline(&track, 0.5, 10.0);

        assert_eq!(path.num_segments(), 4);

        for seg in 0..path.num_segments() {
            let range = path.segment_range(seg);
            let n = range.len();

            // Each segment starts exactly on its waypoint
            assert_eq!(path.point(range.start), track.waypoint(seg));

            // Power of two sample count in the searched range
            assert!(n.is_power_of_two());
            assert!(n >= MIN_SAMPLES_PER_SEGMENT && n <= MAX_SAMPLES_PER_SEGMENT);

            // Every gap, including the one into the next segment, is below the bound
            for i in range {
                assert!((path.point(i + 1) - path.point(i)).norm() < 10.0);
            }
        }
    }

    #[test]
    fn test_sampling_is_capped() {
        let spline = CatmullRomSpline::new(
            Vector2::new(-1000.0, 0.0),
            Vector2::new(0.0, 0.0),
            Vector2::new(1000.0, 0.0),
            Vector2::new(2000.0, 0.0),
            0.5,
        );

        // 1000 m segment can never get below 1 m with 512 samples
        let samples = sample_segment(&spline, 1.0);
        assert_eq!(samples.len(), MAX_SAMPLES_PER_SEGMENT);
    }

    #[test]
    fn test_segment_indexing() {
        let path = SampledPath::from_segments(vec![
            vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)],
            vec![Vector2::new(2.0, 0.0)],
            vec![Vector2::new(2.0, 1.0), Vector2::new(1.0, 1.0), Vector2::new(0.0, 1.0)],
        ])
        .unwrap();

        assert_eq!(path.len(), 6);
        assert_eq!(path.segment_range(0), 0..2);
        assert_eq!(path.segment_range(1), 2..3);
        assert_eq!(path.segment_range(2), 3..6);
        assert_eq!(path.segment_start(4), 2);
        assert_eq!(path.next_index(5), 0);
        assert_eq!(path.step_length_m(0), 1.0);
    }

    #[test]
    fn test_from_segments_errors() {
        assert!(matches!(
            SampledPath::from_segments(vec![]),
            Err(PathError::NoSegments)
        ));
        assert!(matches!(
            SampledPath::from_segments(vec![vec![Vector2::new(0.0, 0.0)], vec![]]),
            Err(PathError::EmptySegment(1))
        ));
    }
}
