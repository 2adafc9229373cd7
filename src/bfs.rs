//! Grid BFS: 4-neighbour, stamp-based visited tracking,
//! visitor-callback driven. Used for nearest-gateway search and for scanning
//! cluster-local connectivity when the abstract graph is built.

use std::collections::VecDeque;

use crate::grid::Tile;

/// What the visitor wants to happen after seeing a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfsSignal {
    /// Keep exploring past this tile.
    Continue,
    /// This tile is a dead end; don't enqueue its neighbours, but keep
    /// searching elsewhere.
    Prune,
    /// Stop the search entirely.
    Stop,
}

/// Reusable BFS working memory, stamp-gated like the A* cores so
/// repeated searches don't pay for a bulk clear.
pub struct GridBfs {
    visited_stamp: Vec<u32>,
    dist: Vec<u32>,
    stamp: u32,
    queue: VecDeque<Tile>,
}

impl GridBfs {
    pub fn new(num_tiles: usize) -> Self {
        Self {
            visited_stamp: vec![0; num_tiles],
            dist: vec![0; num_tiles],
            stamp: 1,
            queue: VecDeque::new(),
        }
    }

    #[inline]
    fn bump_stamp(&mut self) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.visited_stamp.fill(0);
            self.stamp = 1;
        }
        self.stamp
    }

    #[inline]
    pub fn distance_if_visited(&self, tile: Tile, stamp: u32) -> Option<u32> {
        if self.visited_stamp[tile as usize] == stamp {
            Some(self.dist[tile as usize])
        } else {
            None
        }
    }

    /// Runs a BFS from `start`. `neighbours_of` yields up to four candidate
    /// neighbours (already filtered for traversability/bounds by the
    /// caller); `visit` is called once per newly discovered tile (including
    /// `start`, at distance 0) and controls further expansion.
    pub fn run<N, V>(&mut self, start: Tile, mut neighbours_of: N, mut visit: V)
    where
        N: FnMut(Tile) -> [Option<Tile>; 4],
        V: FnMut(Tile, u32) -> BfsSignal,
    {
        let stamp = self.bump_stamp();
        self.queue.clear();
        self.visited_stamp[start as usize] = stamp;
        self.dist[start as usize] = 0;

        match visit(start, 0) {
            BfsSignal::Stop => return,
            BfsSignal::Prune => return,
            BfsSignal::Continue => self.queue.push_back(start),
        }

        while let Some(current) = self.queue.pop_front() {
            let d = self.dist[current as usize];
            for neighbour in neighbours_of(current).into_iter().flatten() {
                let idx = neighbour as usize;
                if self.visited_stamp[idx] == stamp {
                    continue;
                }
                self.visited_stamp[idx] = stamp;
                self.dist[idx] = d + 1;

                match visit(neighbour, d + 1) {
                    BfsSignal::Stop => return,
                    BfsSignal::Prune => {}
                    BfsSignal::Continue => self.queue.push_back(neighbour),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileGrid;

    fn all_water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn finds_nearest_target_by_distance() {
        let grid = all_water_grid(5, 5);
        let mut bfs = GridBfs::new(grid.num_tiles());
        let start = grid.try_ref(0, 0).unwrap();
        let target = grid.try_ref(3, 0).unwrap();

        let mut found_at = None;
        bfs.run(
            start,
            |t| {
                let mut out = [None; 4];
                for (i, n) in grid.neighbours(t).enumerate() {
                    out[i] = Some(n);
                }
                out
            },
            |tile, dist| {
                if tile == target {
                    found_at = Some(dist);
                    BfsSignal::Stop
                } else {
                    BfsSignal::Continue
                }
            },
        );

        assert_eq!(found_at, Some(3));
    }

    #[test]
    fn prune_stops_expansion_without_stopping_search() {
        let grid = all_water_grid(5, 1);
        let mut bfs = GridBfs::new(grid.num_tiles());
        let start = grid.try_ref(0, 0).unwrap();
        let mut visited = Vec::new();

        bfs.run(
            start,
            |t| {
                let mut out = [None; 4];
                for (i, n) in grid.neighbours(t).enumerate() {
                    out[i] = Some(n);
                }
                out
            },
            |tile, _dist| {
                visited.push(tile);
                if tile == 2 {
                    BfsSignal::Prune
                } else {
                    BfsSignal::Continue
                }
            },
        );

        // Tile 2 was visited but never expanded, so tiles 3 and 4 are
        // unreachable from this search.
        assert!(visited.contains(&2));
        assert!(!visited.contains(&3));
        assert!(!visited.contains(&4));
    }
}
