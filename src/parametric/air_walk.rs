//! Biased random walk for free-flying units: mostly steps toward the
//! target along whichever axis lags furthest behind, occasionally takes a
//! random detour step. The random source is the caller's own (the game's
//! seeded RNG), represented here only as a small consumed trait.

use crate::grid::{Tile, TileGrid};
use crate::transformers::PathResult;

/// A source of randomness the walker consumes but does not own or seed.
pub trait Rng {
    /// A uniformly distributed integer in `[lo, hi]`, inclusive.
    fn next_int(&mut self, lo: i32, hi: i32) -> i32;
    /// `true` with probability `1 / one_in_n`.
    fn chance(&mut self, one_in_n: u32) -> bool;
}

pub struct AirWalker<'g, R: Rng> {
    grid: &'g TileGrid,
    rng: R,
    detour_chance: u32,
}

impl<'g, R: Rng> AirWalker<'g, R> {
    pub fn new(grid: &'g TileGrid, rng: R, detour_chance: u32) -> Self {
        Self {
            grid,
            rng,
            detour_chance,
        }
    }

    /// Takes one step from `current` toward `target`, biased random walk.
    /// Returns `Complete` on arrival rather than a no-op tile.
    pub fn next(&mut self, current: Tile, target: Tile) -> PathResult {
        if current == target {
            return PathResult::Complete;
        }

        let cx = self.grid.x(current) as i32;
        let cy = self.grid.y(current) as i32;
        let tx = self.grid.x(target) as i32;
        let ty = self.grid.y(target) as i32;

        let (mut dx, mut dy) = if self.detour_chance > 0 && self.rng.chance(self.detour_chance) {
            (self.rng.next_int(-1, 1), self.rng.next_int(-1, 1))
        } else {
            (0, 0)
        };

        if dx == 0 && dy == 0 {
            let dist_x = (tx - cx).abs();
            let dist_y = (ty - cy).abs();
            if dist_x >= dist_y {
                dx = (tx - cx).signum();
            } else {
                dy = (ty - cy).signum();
            }
        }

        let nx = (cx + dx).clamp(0, self.grid.width() as i32 - 1) as u32;
        let ny = (cy + dy).clamp(0, self.grid.height() as i32 - 1) as u32;
        PathResult::Next(self.grid.ref_unchecked(nx, ny))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng {
        detour: bool,
        dx: i32,
        dy: i32,
    }

    impl Rng for FixedRng {
        fn next_int(&mut self, _lo: i32, _hi: i32) -> i32 {
            if self.dx != 0 {
                self.dx
            } else {
                self.dy
            }
        }
        fn chance(&mut self, _one_in_n: u32) -> bool {
            self.detour
        }
    }

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn no_detour_steps_toward_target() {
        let grid = water_grid(10, 10);
        let rng = FixedRng {
            detour: false,
            dx: 0,
            dy: 0,
        };
        let mut walker = AirWalker::new(&grid, rng, 100);
        let start = grid.try_ref(0, 0).unwrap();
        let target = grid.try_ref(9, 0).unwrap();
        let next = walker.next(start, target);
        assert_eq!(next, PathResult::Next(grid.try_ref(1, 0).unwrap()));
    }

    #[test]
    fn same_tile_completes_immediately() {
        let grid = water_grid(5, 5);
        let rng = FixedRng {
            detour: false,
            dx: 0,
            dy: 0,
        };
        let mut walker = AirWalker::new(&grid, rng, 0);
        let tile = grid.try_ref(2, 2).unwrap();
        assert_eq!(walker.next(tile, tile), PathResult::Complete);
    }

    #[test]
    fn step_stays_within_grid_bounds() {
        let grid = water_grid(5, 5);
        let rng = FixedRng {
            detour: true,
            dx: -1,
            dy: -1,
        };
        let mut walker = AirWalker::new(&grid, rng, 1);
        let corner = grid.try_ref(0, 0).unwrap();
        let target = grid.try_ref(4, 4).unwrap();
        let next = walker.next(corner, target);
        assert_eq!(next, PathResult::Next(corner));
    }
}
