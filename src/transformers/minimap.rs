//! Mini-map delegation: runs the inner finder over the half-resolution
//! [`MiniGrid`](crate::grid::MiniGrid) and upscales the result, trading
//! precision for a quarter of the search area. Each candidate start is
//! downscaled and searched individually (not via the inner finder's own
//! multi-source support) so every candidate can be scored independently.

use crate::grid::{Tile, TileGrid};
use crate::transformers::smoothing::bresenham_tiles;
use crate::transformers::PathFinder;

/// Wraps an inner [`PathFinder`] that was constructed against a *separate*
/// [`TileGrid`] built from `grid.mini_grid().terrain()` -- the caller owns
/// that mini grid and is responsible for keeping it alive alongside `grid`.
pub struct MiniMapTransformer<'g, F: PathFinder> {
    inner: F,
    grid: &'g TileGrid,
}

impl<'g, F: PathFinder> MiniMapTransformer<'g, F> {
    pub fn new(inner: F, grid: &'g TileGrid) -> Self {
        Self { inner, grid }
    }

    fn upscale_tile(&self, mini_tile: Tile) -> Tile {
        let (x, y) = self.grid.mini_grid().upscale(mini_tile);
        let x = x.min(self.grid.width() - 1);
        let y = y.min(self.grid.height() - 1);
        self.grid.ref_unchecked(x, y)
    }

    /// Upscales every mini-tile keypoint, then linearly interpolates between
    /// consecutive upscaled keypoints so the result stays 4-adjacent at full
    /// resolution (two mini-adjacent tiles land two tiles apart at x2).
    fn upscale_path(&self, mini_path: &[Tile]) -> Vec<Tile> {
        let Some(&first) = mini_path.first() else {
            return Vec::new();
        };

        let mut dense = vec![self.upscale_tile(first)];
        for pair in mini_path.windows(2) {
            let a = self.upscale_tile(pair[0]);
            let b = self.upscale_tile(pair[1]);
            let segment = bresenham_tiles(self.grid, a, b);
            dense.extend_from_slice(&segment[1..]);
        }
        dense
    }
}

impl<'g, F: PathFinder> PathFinder for MiniMapTransformer<'g, F> {
    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        let mini_goal = self.grid.mini_grid().downscale(self.grid.width(), goal);

        let mut best: Option<(u32, Vec<Tile>, Tile)> = None;
        for &start in starts {
            let mini_start = self.grid.mini_grid().downscale(self.grid.width(), start);
            let Some(mini_path) = self.inner.find_path(mini_start, mini_goal) else {
                continue;
            };
            let upscaled = self.upscale_path(&mini_path);
            let Some(&last) = upscaled.last() else {
                continue;
            };

            // distTarget + 0.1 * distPathStart, scaled by 10 to stay in
            // integer arithmetic (relative ordering is unaffected).
            let dist_target = self.grid.manhattan_dist(last, goal);
            let dist_path_start = self.grid.manhattan_dist(upscaled[0], start);
            let score = dist_target * 10 + dist_path_start;

            if best.as_ref().map(|(b, ..)| score < *b).unwrap_or(true) {
                best = Some((score, upscaled, start));
            }
        }

        let (_, mut path, start) = best?;
        if let Some(first) = path.first_mut() {
            *first = start;
        }
        if let Some(last) = path.last_mut() {
            *last = goal;
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::AStarWater;
    use crate::config::LocalAStarOptions;

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn upscaled_path_reaches_exact_endpoints() {
        let grid = water_grid(20, 20);
        let mini = grid.mini_grid();
        let mini_grid = TileGrid::load(mini.terrain(), mini.width(), mini.height()).unwrap();
        let mini_astar = AStarWater::new(&mini_grid, LocalAStarOptions::default());

        let mut transformer = MiniMapTransformer::new(mini_astar, &grid);
        let start = grid.try_ref(1, 1).unwrap();
        let goal = grid.try_ref(18, 18).unwrap();
        let path = transformer.find_path(start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn picks_nearer_of_two_candidate_starts() {
        let grid = water_grid(20, 20);
        let mini = grid.mini_grid();
        let mini_grid = TileGrid::load(mini.terrain(), mini.width(), mini.height()).unwrap();
        let mini_astar = AStarWater::new(&mini_grid, LocalAStarOptions::default());

        let mut transformer = MiniMapTransformer::new(mini_astar, &grid);
        let goal = grid.try_ref(19, 19).unwrap();
        let near = grid.try_ref(17, 17).unwrap();
        let far = grid.try_ref(0, 0).unwrap();
        let path = transformer.find_path_multi(&[far, near], goal).unwrap();
        assert_eq!(*path.first().unwrap(), near);
    }
}
