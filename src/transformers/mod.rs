//! Capability traits for the transformer pipeline: `PathFinder`
//! (found a path), `Stepper` (walks one already found), and the sparse
//! `PathPlan` view of a dense path.

use crate::grid::Tile;

pub mod minimap;
pub mod smoothing;
pub mod stepper;

pub use minimap::MiniMapTransformer;
pub use smoothing::SmoothingWaterTransformer;
pub use stepper::PathFinderStepper;

/// Anything that can answer "what is the path from one of these tiles to
/// that tile". Implemented directly by the A\* cores and by each
/// transformer that wraps an inner `PathFinder`.
pub trait PathFinder {
    fn find_path(&mut self, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
        self.find_path_multi(&[start], goal)
    }

    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>>;

    /// Derives a sparse keypoint + per-segment tile-count plan by compacting
    /// straight runs in the dense path ("path plan"). The default works
    /// for any finder; [`SmoothingWaterTransformer`] already returns a
    /// straightened dense path so it inherits this unchanged.
    fn plan_segments(&mut self, start: Tile, goal: Tile) -> Option<PathPlan> {
        self.find_path(start, goal).map(|path| PathPlan::from_dense(&path))
    }
}

impl<'a> PathFinder for Box<dyn PathFinder + 'a> {
    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        (**self).find_path_multi(starts, goal)
    }
}

/// A sparse view of a dense path: keypoints at every direction change, plus
/// the tile count covered by the segment ending at each keypoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPlan {
    pub keypoints: Vec<Tile>,
    pub segment_tile_counts: Vec<u32>,
}

impl PathPlan {
    pub fn from_dense(path: &[Tile]) -> Self {
        if path.len() < 2 {
            return Self {
                keypoints: path.to_vec(),
                segment_tile_counts: Vec::new(),
            };
        }

        let mut keypoints = vec![path[0]];
        let mut segment_tile_counts = Vec::new();
        let mut segment_start = 0usize;
        let mut current_delta = path[1] as i64 - path[0] as i64;

        for i in 2..path.len() {
            let delta = path[i] as i64 - path[i - 1] as i64;
            if delta != current_delta {
                keypoints.push(path[i - 1]);
                segment_tile_counts.push((i - 1 - segment_start) as u32);
                segment_start = i - 1;
                current_delta = delta;
            }
        }
        keypoints.push(*path.last().unwrap());
        segment_tile_counts.push((path.len() - 1 - segment_start) as u32);

        Self {
            keypoints,
            segment_tile_counts,
        }
    }

    pub fn dense_len(&self) -> u32 {
        self.segment_tile_counts.iter().sum()
    }
}

/// Outcome of one `Stepper::next` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResult {
    Complete,
    Next(Tile),
    NotFound,
}

/// Step-by-step traversal of a cached path, with invalidation when the
/// destination changes or the caller's reported position no longer matches
/// where the stepper expects it.
pub trait Stepper {
    fn next(&mut self, from: Tile, to: Tile, dist: Option<u32>) -> PathResult;
    fn invalidate(&mut self);
}
