//! Hierarchical water A\*: short-path fast path below a Manhattan
//! threshold, otherwise resolve sources/target to their nearest in-cluster
//! gateway nodes, plan on the abstract graph, and stitch concrete segments
//! (cache hit, or bounded A\* within the segment's cluster with a 3x3-cluster
//! fallback). The returned sequence is always re-anchored to the exact
//! requested tiles.

use crate::abstract_graph::{padded_bounds, AbstractEdge, AbstractGraph, NodeId};
use crate::astar::adapter::{AdapterAStar, NodeAdapter};
use crate::astar::water_bounded::AStarWaterBounded;
use crate::bfs::GridBfs;
use crate::config::{LocalAStarOptions, WaterPathfinderOptions};
use crate::grid::{Tile, TileGrid};
use crate::transformers::PathFinder;

pub struct HierarchicalWaterAStar<'g> {
    grid: &'g TileGrid,
    graph: &'g AbstractGraph,
    local: AStarWaterBounded<'g>,
    abstract_astar: AdapterAStar<AbstractGraphAdapter<'g>>,
    gateway_bfs: GridBfs,
    short_path_threshold: u32,
    cluster_size: u32,
}

impl<'g> HierarchicalWaterAStar<'g> {
    pub fn new(grid: &'g TileGrid, graph: &'g AbstractGraph, options: WaterPathfinderOptions) -> Self {
        let cluster_size = graph.cluster_size();
        // The working-array budget must cover both the short-path bbox and
        // the widest 3x3-cluster stitching fallback; the bounded A* rejects
        // anything larger with None, never a panic.
        let short_rect = (options.short_path_threshold + 2) as usize;
        let region_rect = (3 * cluster_size + 2) as usize;
        let max_search_area = short_rect.max(region_rect).pow(2);

        let adapter = AbstractGraphAdapter::new(graph, grid, options.heuristic_weight);
        let abstract_astar = AdapterAStar::new(adapter, graph.num_nodes(), options.max_iterations);

        Self {
            grid,
            graph,
            local: AStarWaterBounded::new(grid, max_search_area, LocalAStarOptions::default()),
            abstract_astar,
            gateway_bfs: GridBfs::new(grid.num_tiles()),
            short_path_threshold: options.short_path_threshold,
            cluster_size,
        }
    }

    pub fn find_path(&mut self, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
        self.find_path_multi(&[start], goal)
    }

    /// Multi-source hierarchical search. All candidate sources are
    /// considered; the cheapest abstract plan wins.
    pub fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        if starts.is_empty() {
            return None;
        }

        let is_short = starts
            .iter()
            .all(|&s| self.grid.manhattan_dist(s, goal) < self.short_path_threshold);
        if is_short {
            if let Some(path) = self.local.find_path_multi(starts, goal) {
                return Some(path);
            }
        }

        self.find_path_via_abstract_graph(starts, goal)
    }

    fn find_path_via_abstract_graph(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        let mut start_nodes: Vec<(Tile, NodeId)> = Vec::new();
        for &s in starts {
            if let Some(node) = self
                .graph
                .nearest_node_in_cluster(self.grid, &mut self.gateway_bfs, s)
            {
                start_nodes.push((s, node));
            }
        }
        if start_nodes.is_empty() {
            return None;
        }
        let goal_node = self
            .graph
            .nearest_node_in_cluster(self.grid, &mut self.gateway_bfs, goal)?;

        let node_ids: Vec<NodeId> = start_nodes.iter().map(|&(_, n)| n).collect();
        let abstract_path = self.abstract_astar.find_path_multi(&node_ids, goal_node)?;

        let winning_node = abstract_path[0];
        let winning_start = start_nodes
            .iter()
            .find(|&&(_, n)| n == winning_node)
            .map(|&(s, _)| s)?;

        if abstract_path.len() == 1 {
            let segment = self.bounded_segment(winning_start, goal)?;
            return Some(reanchor(segment, winning_start, goal));
        }

        let winning_node_tile = self.graph.node(winning_node).tile;
        let mut full_path = self.bounded_segment(winning_start, winning_node_tile)?;

        for pair in abstract_path.windows(2) {
            let segment = self.stitch_edge(pair[0], pair[1])?;
            append_segment(&mut full_path, segment);
        }

        let last_node = *abstract_path.last().unwrap();
        let last_node_tile = self.graph.node(last_node).tile;
        let trailing = self.bounded_segment(last_node_tile, goal)?;
        append_segment(&mut full_path, trailing);

        Some(reanchor(full_path, winning_start, goal))
    }

    /// Bounded A* restricted to `from`'s home cluster (padded), falling back
    /// to a 3x3-cluster region on miss.
    fn bounded_segment(&mut self, from: Tile, to: Tile) -> Option<Vec<Tile>> {
        let (cx, cy) = self.graph.cluster_of(self.grid, from);
        if let Some(path) = self.search_in_cluster(from, to, cx, cy) {
            return Some(path);
        }
        self.search_in_region(from, to, cx, cy)
    }

    fn stitch_edge(&mut self, from_node: NodeId, to_node: NodeId) -> Option<Vec<Tile>> {
        let edge: &AbstractEdge = self.graph.edge_between(from_node, to_node)?;
        let direction = edge.direction_from(from_node);
        let edge_id = edge.id;
        if let Some(cached) = self.graph.cached_segment(edge_id, direction) {
            return Some(cached);
        }

        let (cx, cy) = edge.cluster;
        let from_tile = self.graph.node(from_node).tile;
        let to_tile = self.graph.node(to_node).tile;

        let path = self
            .search_in_cluster(from_tile, to_tile, cx, cy)
            .or_else(|| self.search_in_region(from_tile, to_tile, cx, cy))?;

        self.graph.cache_segment(edge_id, direction, path.clone());
        Some(path)
    }

    fn search_in_cluster(&mut self, from: Tile, to: Tile, cx: u32, cy: u32) -> Option<Vec<Tile>> {
        let (min_x, max_x, min_y, max_y) =
            padded_bounds(cx, cy, self.cluster_size, self.grid.width(), self.grid.height());
        self.local.search_bounded(&[from], to, min_x, max_x, min_y, max_y)
    }

    fn search_in_region(&mut self, from: Tile, to: Tile, cx: u32, cy: u32) -> Option<Vec<Tile>> {
        let (min_x, max_x, min_y, max_y) =
            region_bounds(cx, cy, 1, self.cluster_size, self.grid.width(), self.grid.height());
        self.local.search_bounded(&[from], to, min_x, max_x, min_y, max_y)
    }
}

impl<'g> PathFinder for HierarchicalWaterAStar<'g> {
    fn find_path_multi(&mut self, starts: &[Tile], goal: Tile) -> Option<Vec<Tile>> {
        HierarchicalWaterAStar::find_path_multi(self, starts, goal)
    }
}

fn append_segment(full: &mut Vec<Tile>, segment: Vec<Tile>) {
    if full.last() == segment.first() {
        full.extend(segment.into_iter().skip(1));
    } else {
        full.extend(segment);
    }
}

fn reanchor(mut path: Vec<Tile>, start: Tile, goal: Tile) -> Vec<Tile> {
    if path.first() != Some(&start) {
        path.insert(0, start);
    }
    if path.last() != Some(&goal) {
        path.push(goal);
    }
    path
}

/// A cluster's rectangle padded by `pad_clusters` whole clusters on every
/// side, clamped to the grid -- the 3x3-region fallback when the
/// one-tile-padded cluster rectangle fails to connect two endpoints.
fn region_bounds(
    cx: u32,
    cy: u32,
    pad_clusters: u32,
    cluster_size: u32,
    grid_width: u32,
    grid_height: u32,
) -> (u32, u32, u32, u32) {
    let base_min_x = cx * cluster_size;
    let base_max_x = ((cx + 1) * cluster_size - 1).min(grid_width - 1);
    let base_min_y = cy * cluster_size;
    let base_max_y = ((cy + 1) * cluster_size - 1).min(grid_height - 1);
    let pad = pad_clusters * cluster_size;
    (
        base_min_x.saturating_sub(pad),
        (base_max_x + pad).min(grid_width - 1),
        base_min_y.saturating_sub(pad),
        (base_max_y + pad).min(grid_height - 1),
    )
}

/// Adapts the abstract graph to [`NodeAdapter`] so the same generic A* core
/// used for rails plans at the cluster-gateway level.
struct AbstractGraphAdapter<'g> {
    graph: &'g AbstractGraph,
    grid: &'g TileGrid,
    heuristic_weight: u32,
    max_neighbours: usize,
    max_edge_cost: u32,
}

impl<'g> AbstractGraphAdapter<'g> {
    fn new(graph: &'g AbstractGraph, grid: &'g TileGrid, heuristic_weight: u32) -> Self {
        let max_neighbours = (0..graph.num_nodes() as u32)
            .map(|id| graph.node(id).edge_ids.len())
            .max()
            .unwrap_or(0)
            .max(1);
        let max_edge_cost = graph.edges().iter().map(|e| e.cost).max().unwrap_or(1).max(1);
        Self {
            graph,
            grid,
            heuristic_weight,
            max_neighbours,
            max_edge_cost,
        }
    }
}

impl<'g> NodeAdapter for AbstractGraphAdapter<'g> {
    fn max_neighbours(&self) -> usize {
        self.max_neighbours
    }

    fn max_priority(&self) -> u32 {
        let heuristic_bound = self.heuristic_weight * (self.grid.width() + self.grid.height());
        let g_bound = self.max_edge_cost * (self.graph.num_nodes().max(1) as u32);
        heuristic_bound + g_bound
    }

    fn neighbours(&self, node: u32, out: &mut [u32]) -> usize {
        let edge_ids = &self.graph.node(node).edge_ids;
        let mut count = 0;
        for &edge_id in edge_ids {
            out[count] = self.graph.edge(edge_id).other(node);
            count += 1;
        }
        count
    }

    fn cost(&self, from: u32, to: u32, _prev: i32) -> u32 {
        self.graph
            .edge_between(from, to)
            .map(|e| e.cost)
            .unwrap_or(self.max_edge_cost)
    }

    fn heuristic(&self, node: u32, goal: u32) -> u32 {
        let a = self.graph.node(node).tile;
        let b = self.graph.node(goal).tile;
        self.heuristic_weight * self.grid.manhattan_dist(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ConnectedComponents;

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn short_path_fast_path_is_exact() {
        let grid = water_grid(20, 20);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 8).unwrap();
        let mut hpa = HierarchicalWaterAStar::new(&grid, &graph, WaterPathfinderOptions::default());

        let start = grid.try_ref(2, 2).unwrap();
        let goal = grid.try_ref(5, 5).unwrap();
        let path = hpa.find_path(start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn long_path_crosses_multiple_clusters() {
        let grid = water_grid(80, 80);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 16).unwrap();
        let mut options = WaterPathfinderOptions::default();
        options.short_path_threshold = 10;
        let mut hpa = HierarchicalWaterAStar::new(&grid, &graph, options);

        let start = grid.try_ref(1, 1).unwrap();
        let goal = grid.try_ref(78, 78).unwrap();
        let path = hpa.find_path(start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn returns_none_across_disconnected_components() {
        let mut bytes = vec![5u8; 32 * 32];
        let land = 5u8 | (1 << 7);
        for y in 0..32u32 {
            bytes[(y * 32 + 16) as usize] = land;
        }
        let grid = TileGrid::load(&bytes, 32, 32).unwrap();
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 8).unwrap();
        let mut options = WaterPathfinderOptions::default();
        options.short_path_threshold = 1;
        let mut hpa = HierarchicalWaterAStar::new(&grid, &graph, options);

        let start = grid.try_ref(1, 1).unwrap();
        let goal = grid.try_ref(30, 30).unwrap();
        assert!(hpa.find_path(start, goal).is_none());
    }

    #[test]
    fn multi_source_prefers_reachable_start() {
        let grid = water_grid(64, 64);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 16).unwrap();
        let mut options = WaterPathfinderOptions::default();
        options.short_path_threshold = 5;
        let mut hpa = HierarchicalWaterAStar::new(&grid, &graph, options);

        let near = grid.try_ref(60, 60).unwrap();
        let far = grid.try_ref(0, 0).unwrap();
        let goal = grid.try_ref(63, 63).unwrap();

        let path = hpa.find_path_multi(&[far, near], goal).unwrap();
        assert_eq!(*path.last().unwrap(), goal);
    }
}
