//! Unbounded water A\*: operates over the whole grid. Ported from the
//! teacher's `AStarWater`, generalized to take its tuning as a
//! [`crate::config::LocalAStarOptions`] and to share [`StampedArrays`] /
//! [`crate::queue::MinHeap`] instead of inlining its own copies.

use crate::astar::{abs_diff, cross_product_tie_breaker, magnitude_penalty, StampedArrays, BASE_COST};
use crate::config::LocalAStarOptions;
use crate::grid::{Tile, TileGrid};
use crate::queue::{MinHeap, PriorityQueue};
use crate::transformers::PathFinder;

const SHALLOW_PENALTY: u32 = 10;
const DEEP_PENALTY: u32 = 1;

/// A\* pathfinder searching the whole water grid. One instance is created
/// per consumer and reused across many `find_path` calls.
pub struct AStarWater<'g> {
    grid: &'g TileGrid,
    heuristic_weight: u32,
    max_iterations: u32,
    arrays: StampedArrays,
    heap: MinHeap,
}

impl<'g> AStarWater<'g> {
    pub fn new(grid: &'g TileGrid, options: LocalAStarOptions) -> Self {
        let num_nodes = grid.num_tiles();
        Self {
            grid,
            heuristic_weight: options.heuristic_weight,
            max_iterations: options.max_iterations,
            arrays: StampedArrays::new(num_nodes),
            heap: MinHeap::new(num_nodes.min(1024)),
        }
    }

    /// Finds a path from `start` to `goal`. Returns `None` if no path
    /// exists or the iteration budget is exhausted.
    pub fn find_path(&mut self, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
        self.find_path_multi(&[start], goal)
    }

    /// Multi-source search: all starts are pushed with `g=0`; the winning
    /// start emerges naturally when the path is traced back.
    pub fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        self.arrays.bump();
        let grid = self.grid;
        let weight = self.heuristic_weight;
        self.heap.clear();

        let goal_x = grid.x(goal);
        let goal_y = grid.y(goal);

        let s0 = starts[0];
        let dx_goal = grid.x(goal) as i32 - grid.x(s0) as i32;
        let dy_goal = grid.y(goal) as i32 - grid.y(s0) as i32;
        let cross_norm = (dx_goal.abs() + dy_goal.abs()).max(1) as u32;

        for &s in starts {
            self.arrays.set_g(s as usize, 0, -1);
            let h = weight * BASE_COST * grid.manhattan_dist(s, goal);
            self.heap.push(s, h);
        }

        let mut iterations = self.max_iterations;
        while !self.heap.is_empty() {
            iterations -= 1;
            if iterations == 0 {
                log::warn!("AStarWater exceeded max_iterations ({})", self.max_iterations);
                return None;
            }

            let current = self.heap.pop();
            let current_idx = current as usize;
            if self.arrays.is_closed(current_idx) {
                continue;
            }
            self.arrays.close(current_idx);

            if current == goal {
                return Some(build_path(&self.arrays, goal));
            }

            let current_g = self.arrays.g(current_idx);

            for neighbour in grid.neighbours(current) {
                let neighbour_idx = neighbour as usize;
                if self.arrays.is_closed(neighbour_idx) {
                    continue;
                }
                if neighbour != goal && grid.is_land(neighbour) {
                    continue;
                }

                let cost = BASE_COST
                    + magnitude_penalty(grid.magnitude(neighbour), SHALLOW_PENALTY, DEEP_PENALTY);
                let tentative_g = current_g + cost;

                if !self.arrays.has_g(neighbour_idx) || tentative_g < self.arrays.g(neighbour_idx) {
                    self.arrays.set_g(neighbour_idx, tentative_g, current as i32);

                    let nx = grid.x(neighbour);
                    let ny = grid.y(neighbour);
                    let h = weight * BASE_COST * (abs_diff(nx, goal_x) + abs_diff(ny, goal_y));
                    let tie = cross_product_tie_breaker(
                        nx, ny, goal_x, goal_y, dx_goal, dy_goal, cross_norm,
                    );
                    self.heap.push(neighbour, tentative_g + h + tie);
                }
            }
        }

        None
    }
}

impl<'g> PathFinder for AStarWater<'g> {
    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        AStarWater::find_path_multi(self, starts, goal)
    }
}

pub(crate) fn build_path(arrays: &StampedArrays, goal: Tile) -> Vec<Tile> {
    let mut path = Vec::new();
    let mut current = goal as i32;
    while current != -1 {
        path.push(current as Tile);
        current = arrays.parent(current as usize);
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
    fn finds_simple_path() {
        let grid = water_grid(10, 10);
        let mut astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let start = 0;
        let goal = 5 * 10 + 5;
        let path = astar.find_path(start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn no_path_through_land_wall() {
        let mut bytes = vec![5u8; 25];
        let land = 5u8 | (1 << 7);
        for y in 0..5u32 {
            bytes[(y * 5 + 2) as usize] = land;
        }
        let grid = TileGrid::load(&bytes, 5, 5).unwrap();
        let mut astar = AStarWater::new(&grid, LocalAStarOptions::default());
        assert!(astar.find_path(0, 4).is_none());
    }

    #[test]
    fn multi_source_picks_closer_start() {
        let grid = water_grid(8, 8);
        let mut astar = AStarWater::new(&grid, LocalAStarOptions::default());
        let far = grid.try_ref(0, 0).unwrap();
        let near = grid.try_ref(0, 7).unwrap();
        let goal = grid.try_ref(7, 4).unwrap();

        let path = astar.find_path_multi(&[far, near], goal).unwrap();
        assert_eq!(*path.first().unwrap(), near);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn exhausted_iteration_budget_returns_none() {
        let grid = water_grid(50, 50);
        let mut astar = AStarWater::new(
            &grid,
            LocalAStarOptions {
                heuristic_weight: 5,
                max_iterations: 1,
            },
        );
        assert!(astar.find_path(0, 49 * 50 + 49).is_none());
    }
}
