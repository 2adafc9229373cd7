//! Generic adapter A\*: delegates neighbours, cost, and heuristic to
//! an adapter. Used for rail navigation and, via a different adapter, for
//! planning on the abstract graph. The adapter reports
//! `max_neighbours`/`max_priority` so the bucket queue and neighbour buffer
//! can be sized up front.

use crate::astar::water::build_path;
use crate::astar::StampedArrays;
use crate::config::RailPathfinderOptions;
use crate::grid::{Tile, TileGrid};
use crate::queue::{BucketQueue, PriorityQueue};

pub trait NodeAdapter {
    /// Upper bound on neighbours any node can report; sizes the scratch buffer.
    fn max_neighbours(&self) -> usize;
    /// Upper bound on any priority this adapter will ever push; sizes the bucket queue.
    fn max_priority(&self) -> u32;
    /// Writes traversable neighbours of `node` into `out`, returns the count written.
    fn neighbours(&self, node: u32, out: &mut [u32]) -> usize;
    /// Cost of the move `from -> to`, given the node visited before `from`
    /// (`-1` if `from` is a start node).
    fn cost(&self, from: u32, to: u32, prev: i32) -> u32;
    /// Heuristic distance estimate from `node` to `goal`; must stay
    /// admissible-enough for the weighted search to terminate in practice.
    fn heuristic(&self, node: u32, goal: u32) -> u32;
}

/// A\* driven entirely by a [`NodeAdapter`], using a bucket queue since
/// adapters report integer-bounded priorities.
pub struct AdapterAStar<A: NodeAdapter> {
    adapter: A,
    arrays: StampedArrays,
    queue: BucketQueue,
    neighbour_buf: Vec<u32>,
    max_iterations: u32,
}

impl<A: NodeAdapter> AdapterAStar<A> {
    pub fn new(adapter: A, num_nodes: usize, max_iterations: u32) -> Self {
        let neighbour_buf = vec![0; adapter.max_neighbours()];
        let queue = BucketQueue::new(adapter.max_priority() as usize);
        Self {
            adapter,
            arrays: StampedArrays::new(num_nodes),
            queue,
            neighbour_buf,
            max_iterations,
        }
    }

    pub fn find_path(&mut self, start: u32, goal: u32) -> Option<Vec<u32>> {
        self.find_path_multi(&[start], goal)
    }

    pub fn find_path_multi(&mut self, starts: &[u32], goal: u32) -> Option<Vec<u32>> {
        self.arrays.bump();
        self.queue.clear();

        for &s in starts {
            self.arrays.set_g(s as usize, 0, -1);
            let h = self.adapter.heuristic(s, goal);
            self.queue.push(s, h);
        }

        let mut iterations = self.max_iterations;
        while !self.queue.is_empty() {
            iterations -= 1;
            if iterations == 0 {
                log::warn!("AdapterAStar exceeded max_iterations ({})", self.max_iterations);
                return None;
            }

            let current = self.queue.pop();
            let current_idx = current as usize;
            if self.arrays.is_closed(current_idx) {
                continue;
            }
            self.arrays.close(current_idx);

            if current == goal {
                return Some(build_path(&self.arrays, goal));
            }

            let current_g = self.arrays.g(current_idx);
            let prev = self.arrays.parent(current_idx);

            let count = self.adapter.neighbours(current, &mut self.neighbour_buf);
            for i in 0..count {
                let neighbour = self.neighbour_buf[i];
                let neighbour_idx = neighbour as usize;
                if self.arrays.is_closed(neighbour_idx) {
                    continue;
                }

                let move_cost = self.adapter.cost(current, neighbour, prev);
                let tentative_g = current_g + move_cost;

                if !self.arrays.has_g(neighbour_idx) || tentative_g < self.arrays.g(neighbour_idx) {
                    self.arrays.set_g(neighbour_idx, tentative_g, current as i32);
                    let h = self.adapter.heuristic(neighbour, goal);
                    self.queue.push(neighbour, tentative_g + h);
                }
            }
        }

        None
    }
}

const LAND_BIT: u8 = 1 << 7;
const SHORELINE_BIT: u8 = 1 << 6;

struct RailAdapter<'g> {
    grid: &'g TileGrid,
    direction_change_penalty: u32,
    water_penalty: u32,
    heuristic_weight: u32,
}

impl<'g> RailAdapter<'g> {
    #[inline]
    fn is_water(&self, tile: Tile) -> bool {
        self.grid.is_water(tile)
    }

    #[inline]
    fn is_shoreline(&self, tile: Tile) -> bool {
        self.grid.is_shoreline(tile)
    }

    #[inline]
    fn is_traversable(&self, to: Tile, from_shoreline: bool) -> bool {
        if !self.is_water(to) {
            return true;
        }
        from_shoreline || self.is_shoreline(to)
    }
}

impl<'g> NodeAdapter for RailAdapter<'g> {
    fn max_neighbours(&self) -> usize {
        4
    }

    fn max_priority(&self) -> u32 {
        let max_cost = 1 + self.water_penalty + self.direction_change_penalty;
        self.heuristic_weight * (self.grid.width() + self.grid.height()) * max_cost
    }

    fn neighbours(&self, node: u32, out: &mut [u32]) -> usize {
        let from_shoreline = self.is_shoreline(node);
        let mut count = 0;
        for neighbour in self.grid.neighbours(node) {
            if self.is_traversable(neighbour, from_shoreline) {
                out[count] = neighbour;
                count += 1;
            }
        }
        count
    }

    fn cost(&self, from: u32, to: u32, prev: i32) -> u32 {
        let penalized = self.is_water(to) || self.is_shoreline(to);
        let mut cost = if penalized { 1 + self.water_penalty } else { 1 };

        if prev != -1 {
            let d1 = from as i32 - prev;
            let d2 = to as i32 - from as i32;
            if d1 != d2 {
                cost += self.direction_change_penalty;
            }
        }
        cost
    }

    fn heuristic(&self, node: u32, goal: u32) -> u32 {
        self.heuristic_weight * self.grid.manhattan_dist(node, goal)
    }
}

/// Rail pathfinder (`makeRailPathfinder`): penalises water and
/// direction changes, built atop [`AdapterAStar`].
pub struct AStarRail<'g> {
    inner: AdapterAStar<RailAdapter<'g>>,
}

impl<'g> AStarRail<'g> {
    pub fn new(grid: &'g TileGrid, options: RailPathfinderOptions) -> Self {
        let adapter = RailAdapter {
            grid,
            direction_change_penalty: options.direction_change_penalty,
            water_penalty: options.water_penalty,
            heuristic_weight: options.heuristic_weight,
        };
        Self {
            inner: AdapterAStar::new(adapter, grid.num_tiles(), options.max_iterations),
        }
    }

    pub fn find_path(&mut self, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
        self.inner.find_path(start, goal)
    }

    pub fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        self.inner.find_path_multi(starts, goal)
    }
}
