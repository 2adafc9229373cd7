//! Bounded water A\*: clamps the search to an axis-aligned
//! rectangle, translating between global and local indices. Working arrays
//! are sized to `max_search_area` once; searches whose rectangle would
//! exceed that budget are rejected with `None`, never a panic.
//!
//! Ported from the teacher's `AStarWaterBounded`.

use crate::astar::{abs_diff, cross_product_tie_breaker, magnitude_penalty, StampedArrays, BASE_COST};
use crate::config::LocalAStarOptions;
use crate::grid::{Tile, TileGrid};
use crate::queue::{MinHeap, PriorityQueue};
use crate::transformers::PathFinder;

const SHALLOW_PENALTY: u32 = 3;
const DEEP_PENALTY: u32 = 1;

pub struct AStarWaterBounded<'g> {
    grid: &'g TileGrid,
    max_search_area: usize,
    heuristic_weight: u32,
    max_iterations: u32,
    arrays: StampedArrays,
    heap: MinHeap,
}

impl<'g> AStarWaterBounded<'g> {
    pub fn new(grid: &'g TileGrid, max_search_area: usize, options: LocalAStarOptions) -> Self {
        Self {
            grid,
            max_search_area,
            heuristic_weight: options.heuristic_weight,
            max_iterations: options.max_iterations,
            arrays: StampedArrays::new(max_search_area),
            heap: MinHeap::new((max_search_area * 4).max(16)),
        }
    }

    /// Finds a path from `start` to `goal`, with bounds computed as the
    /// bounding box of the two tiles.
    pub fn find_path(&mut self, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
        self.find_path_multi(&[start], goal)
    }

    pub fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        let grid = self.grid;
        let goal_x = grid.x(goal);
        let goal_y = grid.y(goal);

        let mut min_x = goal_x;
        let mut max_x = goal_x;
        let mut min_y = goal_y;
        let mut max_y = goal_y;
        for &s in starts {
            min_x = min_x.min(grid.x(s));
            max_x = max_x.max(grid.x(s));
            min_y = min_y.min(grid.y(s));
            max_y = max_y.max(grid.y(s));
        }

        self.search_bounded(starts, goal, min_x, max_x, min_y, max_y)
    }

    /// Finds a path within an explicit rectangle (inclusive bounds).
    pub fn search_bounded(
        &mut self,
        starts: &[Tile],
        goal: Tile,
        min_x: u32,
        max_x: u32,
        min_y: u32,
        max_y: u32,
    ) -> Option<Vec<Tile>> {
        let bounds_width = max_x - min_x + 1;
        let bounds_height = max_y - min_y + 1;
        let num_local_nodes = (bounds_width * bounds_height) as usize;
        if num_local_nodes > self.max_search_area {
            return None;
        }

        self.arrays.bump();
        let grid = self.grid;
        let map_width = grid.width();
        let weight = self.heuristic_weight;
        self.heap.clear();

        let goal_x = grid.x(goal);
        let goal_y = grid.y(goal);
        let goal_x_clamped = goal_x.clamp(min_x, max_x);
        let goal_y_clamped = goal_y.clamp(min_y, max_y);
        let goal_local = (goal_y_clamped - min_y) * bounds_width + (goal_x_clamped - min_x);

        let s0 = starts[0];
        let start_x = grid.x(s0).clamp(min_x, max_x);
        let start_y = grid.y(s0).clamp(min_y, max_y);
        let dx_goal = goal_x as i32 - start_x as i32;
        let dy_goal = goal_y as i32 - start_y as i32;
        let cross_norm = (dx_goal.abs() + dy_goal.abs()).max(1) as u32;

        for &s in starts {
            let sx = grid.x(s).clamp(min_x, max_x);
            let sy = grid.y(s).clamp(min_y, max_y);
            let local = ((sy - min_y) * bounds_width + (sx - min_x)) as usize;
            if local >= num_local_nodes {
                continue;
            }
            self.arrays.set_g(local, 0, -1);
            let h = weight * BASE_COST * (abs_diff(sx, goal_x) + abs_diff(sy, goal_y));
            self.heap.push(local as u32, h);
        }

        let mut iterations = self.max_iterations;
        while !self.heap.is_empty() {
            iterations -= 1;
            if iterations == 0 {
                log::warn!(
                    "AStarWaterBounded exceeded max_iterations ({})",
                    self.max_iterations
                );
                return None;
            }

            let current_local = self.heap.pop() as usize;
            if self.arrays.is_closed(current_local) {
                continue;
            }
            self.arrays.close(current_local);

            if current_local as u32 == goal_local {
                return Some(build_path_local(
                    &self.arrays,
                    goal_local,
                    min_x,
                    min_y,
                    bounds_width,
                    map_width,
                    num_local_nodes,
                ));
            }

            let current_g = self.arrays.g(current_local);
            let local_x = current_local as u32 % bounds_width;
            let local_y = current_local as u32 / bounds_width;
            let current_x = local_x + min_x;
            let current_y = local_y + min_y;
            let current_global = current_y * map_width + current_x;

            let candidates: [Option<(u32, u32, u32, usize)>; 4] = [
                (current_y > min_y).then(|| {
                    (
                        current_global - map_width,
                        current_x,
                        current_y - 1,
                        current_local - bounds_width as usize,
                    )
                }),
                (current_y < max_y).then(|| {
                    (
                        current_global + map_width,
                        current_x,
                        current_y + 1,
                        current_local + bounds_width as usize,
                    )
                }),
                (current_x > min_x).then(|| {
                    (
                        current_global - 1,
                        current_x - 1,
                        current_y,
                        current_local - 1,
                    )
                }),
                (current_x < max_x).then(|| {
                    (
                        current_global + 1,
                        current_x + 1,
                        current_y,
                        current_local + 1,
                    )
                }),
            ];

            for (neighbour_global, neighbour_x, neighbour_y, neighbour_local) in
                candidates.into_iter().flatten()
            {
                if self.arrays.is_closed(neighbour_local) {
                    continue;
                }
                if neighbour_global != goal && grid.is_land(neighbour_global) {
                    continue;
                }

                let cost = BASE_COST
                    + magnitude_penalty(grid.magnitude(neighbour_global), SHALLOW_PENALTY, DEEP_PENALTY);
                let tentative_g = current_g + cost;

                if !self.arrays.has_g(neighbour_local) || tentative_g < self.arrays.g(neighbour_local) {
                    self.arrays
                        .set_g(neighbour_local, tentative_g, current_local as i32);

                    let dist_to_goal = abs_diff(neighbour_x, goal_x) + abs_diff(neighbour_y, goal_y);
                    let h = weight * BASE_COST * dist_to_goal;
                    let tie = cross_product_tie_breaker(
                        neighbour_x, neighbour_y, goal_x, goal_y, dx_goal, dy_goal, cross_norm,
                    );
                    self.heap.push(neighbour_local as u32, tentative_g + h + tie);
                }
            }
        }

        None
    }
}

impl<'g> PathFinder for AStarWaterBounded<'g> {
    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        AStarWaterBounded::find_path_multi(self, starts, goal)
    }
}

#[allow(clippy::too_many_arguments)]
fn build_path_local(
    arrays: &StampedArrays,
    goal_local: u32,
    min_x: u32,
    min_y: u32,
    bounds_width: u32,
    map_width: u32,
    max_path_length: usize,
) -> Vec<Tile> {
    let mut path = Vec::new();
    let mut current = goal_local as i32;
    let mut iterations = 0;

    while current != -1 && iterations < max_path_length {
        let local_x = current as u32 % bounds_width;
        let local_y = current as u32 / bounds_width;
        let global = (local_y + min_y) * map_width + (local_x + min_x);
        path.push(global);
        current = arrays.parent(current as usize);
        iterations += 1;
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn finds_path_within_bounds() {
        let grid = water_grid(100, 100);
        let mut astar = AStarWaterBounded::new(&grid, 50 * 50, LocalAStarOptions::default());
        let start = 10 * 100 + 10;
        let goal = 40 * 100 + 40;
        let path = astar.search_bounded(&[start], goal, 0, 49, 0, 49).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn rejects_oversized_rectangle() {
        let grid = water_grid(100, 100);
        let mut astar = AStarWaterBounded::new(&grid, 10, LocalAStarOptions::default());
        let path = astar.search_bounded(&[0], 99 * 100 + 99, 0, 99, 0, 99);
        assert!(path.is_none());
    }

    #[test]
    fn routes_around_obstacle_within_bounds() {
        let mut bytes = vec![5u8; 400];
        let land = 5u8 | (1 << 7);
        for y in 0..20u32 {
            if y != 10 {
                bytes[(y * 20 + 10) as usize] = land;
            }
        }
        let grid = TileGrid::load(&bytes, 20, 20).unwrap();
        let mut astar = AStarWaterBounded::new(&grid, 20 * 20, LocalAStarOptions::default());
        let start = 5 * 20 + 5;
        let goal = 5 * 20 + 15;
        let path = astar.search_bounded(&[start], goal, 0, 19, 0, 19).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
        assert!(path.len() > 11);
    }
}
