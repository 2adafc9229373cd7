//! One-tile-at-a-time traversal of a cached path (`Stepper<Tile>`).
//! Recomputes the underlying path when the destination changes or the
//! caller's reported position has drifted from where the stepper expects it.

use crate::grid::{Tile, TileGrid};
use crate::transformers::{PathFinder, PathResult, Stepper};

struct CachedPath {
    path: Vec<Tile>,
    target: Tile,
    index: usize,
}

pub struct PathFinderStepper<'g, F: PathFinder> {
    finder: F,
    grid: &'g TileGrid,
    cached: Option<CachedPath>,
}

impl<'g, F: PathFinder> PathFinderStepper<'g, F> {
    pub fn new(finder: F, grid: &'g TileGrid) -> Self {
        Self {
            finder,
            grid,
            cached: None,
        }
    }

    /// A cached path is still usable from `from` if `from` is the tile the
    /// stepper expects next, or the one immediately before it.
    fn cache_matches(cached: &CachedPath, from: Tile, to: Tile) -> bool {
        if cached.target != to {
            return false;
        }
        let at_current = cached.path.get(cached.index) == Some(&from);
        let at_previous = cached.index > 0 && cached.path.get(cached.index - 1) == Some(&from);
        at_current || at_previous
    }
}

impl<'g, F: PathFinder> Stepper for PathFinderStepper<'g, F> {
    /// `dist` is a proximity-completion threshold, not a speed: if `from` is
    /// already within `dist` tiles of `to` (Manhattan), this returns
    /// `Complete` without computing or advancing a path.
    fn next(&mut self, from: Tile, to: Tile, dist: Option<u32>) -> PathResult {
        let distance = self.grid.manhattan_dist(from, to);
        if distance == 0 || dist.map_or(false, |d| distance <= d) {
            self.cached = None;
            return PathResult::Complete;
        }

        let needs_recompute = match &self.cached {
            Some(cached) => !Self::cache_matches(cached, from, to),
            None => true,
        };

        if needs_recompute {
            let Some(path) = self.finder.find_path(from, to) else {
                self.cached = None;
                return PathResult::NotFound;
            };
            self.cached = Some(CachedPath {
                path,
                target: to,
                index: 0,
            });
        }

        let cached = self.cached.as_mut().expect("just populated above");
        if cached.path.get(cached.index) == Some(&from) && cached.index + 1 < cached.path.len() {
            // already aligned, nothing to do before advancing
        } else if cached.index > 0 && cached.path.get(cached.index - 1) == Some(&from) {
            cached.index -= 1;
        }

        cached.index = (cached.index + 1).min(cached.path.len() - 1);

        let tile = cached.path[cached.index];
        if cached.index == cached.path.len() - 1 {
            self.cached = None;
        }
        PathResult::Next(tile)
    }

    fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::AStarWater;
    use crate::config::LocalAStarOptions;
    use crate::grid::TileGrid;

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn advances_one_tile_at_a_time() {
        let grid = water_grid(10, 10);
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut stepper = PathFinderStepper::new(astar, &grid);

        let start = grid.try_ref(0, 0).unwrap();
        let goal = grid.try_ref(5, 0).unwrap();
        let result = stepper.next(start, goal, None);
        assert_eq!(result, PathResult::Next(grid.try_ref(1, 0).unwrap()));
    }

    #[test]
    fn same_tile_completes_immediately() {
        let grid = water_grid(5, 5);
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut stepper = PathFinderStepper::new(astar, &grid);
        let tile = grid.try_ref(2, 2).unwrap();
        assert_eq!(stepper.next(tile, tile, None), PathResult::Complete);
    }

    #[test]
    fn completes_once_within_proximity_threshold() {
        let grid = water_grid(10, 10);
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut stepper = PathFinderStepper::new(astar, &grid);
        let start = grid.try_ref(0, 0).unwrap();
        let goal = grid.try_ref(3, 0).unwrap();
        // Manhattan distance is 3, within the threshold of 5: COMPLETE
        // without ever computing a path.
        assert_eq!(stepper.next(start, goal, Some(5)), PathResult::Complete);
    }

    #[test]
    fn unreachable_goal_reports_not_found() {
        let mut bytes = vec![5u8; 9];
        let land = 5u8 | (1 << 7);
        for y in 0..3u32 {
            bytes[(y * 3 + 1) as usize] = land;
        }
        let grid = TileGrid::load(&bytes, 3, 3).unwrap();
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut stepper = PathFinderStepper::new(astar, &grid);
        let result = stepper.next(0, 2, None);
        assert_eq!(result, PathResult::NotFound);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let grid = water_grid(10, 10);
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut stepper = PathFinderStepper::new(astar, &grid);
        let start = grid.try_ref(0, 0).unwrap();
        let goal = grid.try_ref(5, 0).unwrap();
        stepper.next(start, goal, None);
        stepper.invalidate();
        assert!(stepper.cached.is_none());
    }
}
