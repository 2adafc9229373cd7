//! Path smoothing: string-pulls a dense path down to its visual
//! keypoints via line-of-sight reduction, re-solves a short bounded A\* near
//! each endpoint against a stricter floor, reduces again, then re-expands to
//! a dense path so the result stays steppable one tile at a time.

use crate::astar::AStarWaterBounded;
use crate::config::LocalAStarOptions;
use crate::grid::{Tile, TileGrid};
use crate::transformers::PathFinder;

pub struct SmoothingWaterTransformer<'g, F: PathFinder> {
    inner: F,
    grid: &'g TileGrid,
    magnitude_floor_1: u8,
    magnitude_floor_2: u8,
    refine_radius: u32,
    refine: AStarWaterBounded<'g>,
}

impl<'g, F: PathFinder> SmoothingWaterTransformer<'g, F> {
    pub fn new(
        inner: F,
        grid: &'g TileGrid,
        magnitude_floor_1: u8,
        magnitude_floor_2: u8,
        refine_radius: u32,
        refine_max_search_area: usize,
    ) -> Self {
        Self {
            inner,
            grid,
            magnitude_floor_1,
            magnitude_floor_2,
            refine_radius,
            refine: AStarWaterBounded::new(grid, refine_max_search_area, LocalAStarOptions::default()),
        }
    }

    fn line_of_sight(&self, a: Tile, b: Tile, magnitude_floor: u8) -> bool {
        bresenham_tiles(self.grid, a, b)
            .iter()
            .all(|&t| self.grid.is_water(t) && self.grid.magnitude(t) >= magnitude_floor)
    }

    /// Greedily keeps only the keypoints where line of sight to the last
    /// kept keypoint breaks.
    fn los_reduce(&self, path: &[Tile], magnitude_floor: u8) -> Vec<Tile> {
        if path.len() <= 2 {
            return path.to_vec();
        }

        let mut result = vec![path[0]];
        let mut anchor = 0usize;
        let mut i = 2usize;
        while i < path.len() {
            if self.line_of_sight(path[anchor], path[i], magnitude_floor) {
                i += 1;
            } else {
                result.push(path[i - 1]);
                anchor = i - 1;
                i += 1;
            }
        }
        result.push(*path.last().unwrap());
        result
    }

    /// Re-solves a short bounded search near one endpoint, falling back to
    /// the unrefined sub-range on failure rather than hard-failing.
    fn refine_endpoint(&mut self, from: Tile, to: Tile) -> Vec<Tile> {
        let grid = self.grid;
        let cx = grid.x(from);
        let cy = grid.y(from);
        let min_x = cx.saturating_sub(self.refine_radius);
        let max_x = (cx + self.refine_radius).min(grid.width() - 1);
        let min_y = cy.saturating_sub(self.refine_radius);
        let max_y = (cy + self.refine_radius).min(grid.height() - 1);

        self.refine
            .search_bounded(&[from], to, min_x, max_x, min_y, max_y)
            .unwrap_or_else(|| vec![from, to])
    }

    fn refine_endpoints(&mut self, sparse: &[Tile]) -> Vec<Tile> {
        if sparse.len() < 3 {
            return sparse.to_vec();
        }

        let leading = self.refine_endpoint(sparse[0], sparse[1]);
        let trailing = self.refine_endpoint(sparse[sparse.len() - 2], sparse[sparse.len() - 1]);

        let mut out = leading;
        out.extend_from_slice(&sparse[1..sparse.len() - 2]);
        if out.last() == trailing.first() {
            out.extend_from_slice(&trailing[1..]);
        } else {
            out.extend_from_slice(&trailing);
        }
        out
    }

    fn expand_to_dense(&self, sparse: &[Tile]) -> Vec<Tile> {
        if sparse.len() < 2 {
            return sparse.to_vec();
        }

        let mut dense = vec![sparse[0]];
        for pair in sparse.windows(2) {
            let segment = bresenham_tiles(self.grid, pair[0], pair[1]);
            dense.extend_from_slice(&segment[1..]);
        }
        dense
    }
}

impl<'g, F: PathFinder> PathFinder for SmoothingWaterTransformer<'g, F> {
    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        let dense = self.inner.find_path_multi(starts, goal)?;
        let reduced = self.los_reduce(&dense, self.magnitude_floor_1);
        let refined = self.refine_endpoints(&reduced);
        let reduced_again = self.los_reduce(&refined, self.magnitude_floor_2);
        Some(self.expand_to_dense(&reduced_again))
    }
}

/// Tiles visited by a Bresenham line from `a` to `b`, inclusive of both ends.
pub(crate) fn bresenham_tiles(grid: &TileGrid, a: Tile, b: Tile) -> Vec<Tile> {
    let mut x0 = grid.x(a) as i32;
    let mut y0 = grid.y(a) as i32;
    let x1 = grid.x(b) as i32;
    let y1 = grid.y(b) as i32;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut tiles = Vec::new();
    loop {
        tiles.push(grid.ref_unchecked(x0 as u32, y0 as u32));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astar::AStarWater;
    use crate::config::LocalAStarOptions;

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![20u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn bresenham_is_inclusive_of_both_ends() {
        let grid = water_grid(10, 10);
        let a = grid.try_ref(0, 0).unwrap();
        let b = grid.try_ref(5, 0).unwrap();
        let tiles = bresenham_tiles(&grid, a, b);
        assert_eq!(*tiles.first().unwrap(), a);
        assert_eq!(*tiles.last().unwrap(), b);
        assert_eq!(tiles.len(), 6);
    }

    #[test]
    fn smoothed_path_keeps_exact_endpoints_on_open_water() {
        let grid = water_grid(40, 40);
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut transformer = SmoothingWaterTransformer::new(astar, &grid, 3, 6, 50, 40 * 40);

        let start = grid.try_ref(2, 2).unwrap();
        let goal = grid.try_ref(35, 30).unwrap();
        let path = transformer.find_path(start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn straight_open_water_path_reduces_to_two_keypoints() {
        let grid = water_grid(30, 30);
        let astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let mut transformer = SmoothingWaterTransformer::new(astar, &grid, 3, 6, 50, 30 * 30);

        let start = grid.try_ref(0, 10).unwrap();
        let goal = grid.try_ref(29, 10).unwrap();
        let path = transformer.find_path(start, goal).unwrap();
        let reduced = transformer.los_reduce(&path, 3);
        assert_eq!(reduced.len(), 2);
    }
}
