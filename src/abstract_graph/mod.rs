//! Abstract graph: precomputed gateways on cluster boundaries,
//! intra-cluster edges with costs, and a direction-aware path cache. Built
//! once, read many times.
//!
//! Gateway placement convention: a gateway sits on the lower-index side of
//! the boundary it straddles (west for vertical boundaries, north for
//! horizontal ones). Its neighbouring cluster reaches it through a
//! one-tile padding of its own rectangle -- a modest allowance for path
//! deviation -- rather than through a second node and a
//! zero-cost edge. This keeps the invariant that an abstract node has one
//! tile literal.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::bfs::{BfsSignal, GridBfs};
use crate::components::ConnectedComponents;
use crate::error::PathfindingError;
use crate::grid::{Tile, TileGrid};

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Backward => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbstractNode {
    pub id: NodeId,
    pub tile: Tile,
    pub component_id: u32,
    pub edge_ids: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct AbstractEdge {
    pub id: EdgeId,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub cost: u32,
    pub cluster: (u32, u32),
}

impl AbstractEdge {
    #[inline]
    pub fn other(&self, node: NodeId) -> NodeId {
        if node == self.node_a {
            self.node_b
        } else {
            self.node_a
        }
    }

    #[inline]
    pub fn direction_from(&self, from: NodeId) -> Direction {
        if from == self.node_a {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub cx: u32,
    pub cy: u32,
    pub node_ids: Vec<NodeId>,
}

pub struct AbstractGraph {
    cluster_size: u32,
    grid_width: u32,
    grid_height: u32,
    clusters_x: u32,
    clusters_y: u32,
    clusters: Vec<Cluster>,
    nodes: Vec<AbstractNode>,
    node_by_tile: HashMap<Tile, NodeId>,
    edges: Vec<AbstractEdge>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    // Monotonically-written shared mutable state: first writer per
    // slot wins, and it is never evicted during a match.
    path_cache: RefCell<Vec<Option<Vec<Tile>>>>,
}

impl AbstractGraph {
    /// Builds the abstract graph for `grid` (`buildAbstractGraph`).
    pub fn build(
        grid: &TileGrid,
        components: &ConnectedComponents,
        cluster_size: u32,
    ) -> Result<Self, PathfindingError> {
        if cluster_size == 0 {
            return Err(PathfindingError::ZeroClusterSize);
        }

        let clusters_x = grid.width().div_ceil(cluster_size);
        let clusters_y = grid.height().div_ceil(cluster_size);

        let mut nodes: Vec<AbstractNode> = Vec::new();
        let mut node_by_tile: HashMap<Tile, NodeId> = HashMap::new();
        let mut cluster_node_ids: Vec<Vec<NodeId>> =
            vec![Vec::new(); (clusters_x * clusters_y) as usize];

        let mut add_gateway =
            |tile: Tile, owning: (u32, u32), other: (u32, u32)| -> NodeId {
                let id = *node_by_tile.entry(tile).or_insert_with(|| {
                    let id = nodes.len() as NodeId;
                    nodes.push(AbstractNode {
                        id,
                        tile,
                        component_id: components.component_id(tile),
                        edge_ids: Vec::new(),
                    });
                    id
                });

                for (cx, cy) in [owning, other] {
                    let idx = (cy * clusters_x + cx) as usize;
                    if !cluster_node_ids[idx].contains(&id) {
                        cluster_node_ids[idx].push(id);
                    }
                }
                id
            };

        // Vertical boundaries: between column bx-1 (west cluster) and bx (east cluster).
        for cx in 1..clusters_x {
            let bx = cx * cluster_size;
            if bx >= grid.width() {
                continue;
            }
            let mut y = 0u32;
            while y < grid.height() {
                let west = grid.ref_unchecked(bx - 1, y);
                let east = grid.ref_unchecked(bx, y);
                if grid.is_water(west) && grid.is_water(east) {
                    let run_start = y;
                    while y < grid.height() {
                        let w = grid.ref_unchecked(bx - 1, y);
                        let e = grid.ref_unchecked(bx, y);
                        if grid.is_water(w) && grid.is_water(e) {
                            y += 1;
                        } else {
                            break;
                        }
                    }
                    let run_end = y - 1;
                    let mid_y = run_start + (run_end - run_start) / 2;
                    let gateway_tile = grid.ref_unchecked(bx - 1, mid_y);
                    let west_cluster = ((bx - 1) / cluster_size, mid_y / cluster_size);
                    let east_cluster = (bx / cluster_size, mid_y / cluster_size);
                    add_gateway(gateway_tile, west_cluster, east_cluster);
                } else {
                    y += 1;
                }
            }
        }

        // Horizontal boundaries: between row by-1 (north cluster) and by (south cluster).
        for cy in 1..clusters_y {
            let by = cy * cluster_size;
            if by >= grid.height() {
                continue;
            }
            let mut x = 0u32;
            while x < grid.width() {
                let north = grid.ref_unchecked(x, by - 1);
                let south = grid.ref_unchecked(x, by);
                if grid.is_water(north) && grid.is_water(south) {
                    let run_start = x;
                    while x < grid.width() {
                        let n = grid.ref_unchecked(x, by - 1);
                        let s = grid.ref_unchecked(x, by);
                        if grid.is_water(n) && grid.is_water(s) {
                            x += 1;
                        } else {
                            break;
                        }
                    }
                    let run_end = x - 1;
                    let mid_x = run_start + (run_end - run_start) / 2;
                    let gateway_tile = grid.ref_unchecked(mid_x, by - 1);
                    let north_cluster = (mid_x / cluster_size, (by - 1) / cluster_size);
                    let south_cluster = (mid_x / cluster_size, by / cluster_size);
                    add_gateway(gateway_tile, north_cluster, south_cluster);
                } else {
                    x += 1;
                }
            }
        }

        let clusters: Vec<Cluster> = (0..clusters_y)
            .flat_map(|cy| (0..clusters_x).map(move |cx| (cx, cy)))
            .map(|(cx, cy)| Cluster {
                cx,
                cy,
                node_ids: cluster_node_ids[(cy * clusters_x + cx) as usize].clone(),
            })
            .collect();

        let mut edges: Vec<AbstractEdge> = Vec::new();
        let mut edge_index: HashMap<(NodeId, NodeId), EdgeId> = HashMap::new();

        let mut bfs = GridBfs::new(grid.num_tiles());
        for cluster in &clusters {
            if cluster.node_ids.len() < 2 {
                continue;
            }
            let (min_x, max_x, min_y, max_y) =
                padded_bounds(cluster.cx, cluster.cy, cluster_size, grid.width(), grid.height());
            let target_tiles: HashMap<Tile, NodeId> = cluster
                .node_ids
                .iter()
                .map(|&id| (nodes[id as usize].tile, id))
                .collect();

            for &start_id in &cluster.node_ids {
                let start_tile = nodes[start_id as usize].tile;
                let start_component = nodes[start_id as usize].component_id;

                bfs.run(
                    start_tile,
                    |t| {
                        let mut out = [None; 4];
                        let mut i = 0;
                        for n in grid.neighbours(t) {
                            let nx = grid.x(n);
                            let ny = grid.y(n);
                            if nx >= min_x
                                && nx <= max_x
                                && ny >= min_y
                                && ny <= max_y
                                && grid.is_water(n)
                                && components.component_id(n) == start_component
                            {
                                out[i] = Some(n);
                                i += 1;
                            }
                        }
                        out
                    },
                    |tile, dist| {
                        if tile != start_tile {
                            if let Some(&target_id) = target_tiles.get(&tile) {
                                if target_id != start_id {
                                    record_edge(
                                        &mut edges,
                                        &mut edge_index,
                                        &mut nodes,
                                        start_id,
                                        target_id,
                                        dist,
                                        (cluster.cx, cluster.cy),
                                    );
                                }
                            }
                        }
                        BfsSignal::Continue
                    },
                );
            }
        }

        log::info!(
            "built abstract graph: {} nodes, {} edges, {}x{} clusters of size {}",
            nodes.len(),
            edges.len(),
            clusters_x,
            clusters_y,
            cluster_size
        );

        Ok(Self {
            cluster_size,
            grid_width: grid.width(),
            grid_height: grid.height(),
            clusters_x,
            clusters_y,
            clusters,
            nodes,
            node_by_tile,
            path_cache: RefCell::new(vec![None; edges.len() * 2]),
            edges,
        })
    }

    #[inline]
    pub fn cluster_size(&self) -> u32 {
        self.cluster_size
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &AbstractNode {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &AbstractEdge {
        &self.edges[id as usize]
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn edges(&self) -> &[AbstractEdge] {
        &self.edges
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&AbstractEdge> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edge_index.get(&key).map(|&id| &self.edges[id as usize])
    }

    #[inline]
    pub fn cluster_of(&self, grid: &TileGrid, tile: Tile) -> (u32, u32) {
        (
            grid.x(tile) / self.cluster_size,
            grid.y(tile) / self.cluster_size,
        )
    }

    fn cluster(&self, cx: u32, cy: u32) -> &Cluster {
        &self.clusters[(cy * self.clusters_x + cx) as usize]
    }

    /// Resolves `tile` to the nearest gateway node inside its own cluster,
    /// stepping through any terrain (gateways must be reachable even
    /// through shoreline or land tiles) with a distance cutoff
    /// proportional to `clusterSize^2`.
    pub fn nearest_node_in_cluster(
        &self,
        grid: &TileGrid,
        bfs: &mut GridBfs,
        tile: Tile,
    ) -> Option<NodeId> {
        let (cx, cy) = self.cluster_of(grid, tile);
        let cluster = self.cluster(cx, cy);
        if cluster.node_ids.is_empty() {
            return None;
        }
        if let Some(&id) = self.node_by_tile.get(&tile) {
            if cluster.node_ids.contains(&id) {
                return Some(id);
            }
        }

        let target_tiles: std::collections::HashSet<Tile> = cluster
            .node_ids
            .iter()
            .map(|&id| self.nodes[id as usize].tile)
            .collect();
        let max_distance = (self.cluster_size as u64 * self.cluster_size as u64) as u32;

        let mut found = None;
        bfs.run(
            tile,
            |t| {
                let mut out = [None; 4];
                let mut i = 0;
                for n in grid.neighbours(t) {
                    out[i] = Some(n);
                    i += 1;
                }
                out
            },
            |t, dist| {
                if dist > max_distance {
                    return BfsSignal::Stop;
                }
                if target_tiles.contains(&t) {
                    found = self.node_by_tile.get(&t).copied();
                    return BfsSignal::Stop;
                }
                BfsSignal::Continue
            },
        );
        found
    }

    pub fn cached_segment(&self, edge_id: EdgeId, direction: Direction) -> Option<Vec<Tile>> {
        let idx = edge_id as usize * 2 + direction.index();
        self.path_cache.borrow()[idx].clone()
    }

    /// First writer wins; the cache is never evicted.
    pub fn cache_segment(&self, edge_id: EdgeId, direction: Direction, path: Vec<Tile>) {
        let idx = edge_id as usize * 2 + direction.index();
        let mut cache = self.path_cache.borrow_mut();
        if cache[idx].is_none() {
            cache[idx] = Some(path);
        }
    }

    pub fn grid_dims(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }
}

#[allow(clippy::too_many_arguments)]
fn record_edge(
    edges: &mut Vec<AbstractEdge>,
    edge_index: &mut HashMap<(NodeId, NodeId), EdgeId>,
    nodes: &mut [AbstractNode],
    start: NodeId,
    target: NodeId,
    dist: u32,
    cluster: (u32, u32),
) {
    let (a, b) = if start < target {
        (start, target)
    } else {
        (target, start)
    };
    let key = (a, b);
    if let Some(&id) = edge_index.get(&key) {
        let edge = &mut edges[id as usize];
        if dist < edge.cost {
            edge.cost = dist;
        }
    } else {
        let id = edges.len() as EdgeId;
        edges.push(AbstractEdge {
            id,
            node_a: a,
            node_b: b,
            cost: dist,
            cluster,
        });
        edge_index.insert(key, id);
        nodes[a as usize].edge_ids.push(id);
        nodes[b as usize].edge_ids.push(id);
    }
}

/// A cluster's own rectangle, padded by one tile on each side that borders
/// another cluster, clamped to the grid -- the "modest allowance for path
/// deviation" used when building intra-cluster edges.
pub(crate) fn padded_bounds(
    cx: u32,
    cy: u32,
    cluster_size: u32,
    grid_width: u32,
    grid_height: u32,
) -> (u32, u32, u32, u32) {
    let base_min_x = cx * cluster_size;
    let base_max_x = ((cx + 1) * cluster_size - 1).min(grid_width - 1);
    let base_min_y = cy * cluster_size;
    let base_max_y = ((cy + 1) * cluster_size - 1).min(grid_height - 1);

    let min_x = base_min_x.saturating_sub(1);
    let max_x = (base_max_x + 1).min(grid_width - 1);
    let min_y = base_min_y.saturating_sub(1);
    let max_y = (base_max_y + 1).min(grid_height - 1);

    (min_x, max_x, min_y, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_grid(width: u32, height: u32) -> TileGrid {
        TileGrid::load(&vec![5u8; (width * height) as usize], width, height).unwrap()
    }

    #[test]
    fn builds_gateways_on_open_water() {
        let grid = water_grid(16, 16);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 8).unwrap();

        // A 16x16 grid with cluster_size=8 makes a 2x2 cluster grid with one
        // vertical and one horizontal internal boundary, each fully open
        // water -> one gateway node per boundary line.
        assert!(graph.num_nodes() >= 2);
        assert!(!graph.edges.is_empty());
    }

    #[test]
    fn edges_respect_nodeA_less_than_nodeB() {
        let grid = water_grid(16, 16);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 8).unwrap();
        for edge in &graph.edges {
            assert!(edge.node_a < edge.node_b);
        }
    }

    #[test]
    fn no_edge_crosses_water_components() {
        // Two separate lakes split by a land column; cluster_size spans both.
        let mut bytes = vec![5u8; 16 * 16];
        let land = 5u8 | (1 << 7);
        for y in 0..16u32 {
            bytes[(y * 16 + 8) as usize] = land;
        }
        let grid = TileGrid::load(&bytes, 16, 16).unwrap();
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 16).unwrap();

        for edge in &graph.edges {
            let a = graph.node(edge.node_a).component_id;
            let b = graph.node(edge.node_b).component_id;
            assert_eq!(a, b);
        }
    }

    #[test]
    fn nearest_node_in_cluster_finds_gateway() {
        let grid = water_grid(16, 16);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 8).unwrap();
        let mut bfs = GridBfs::new(grid.num_tiles());

        let corner = grid.try_ref(0, 0).unwrap();
        let found = graph.nearest_node_in_cluster(&grid, &mut bfs, corner);
        assert!(found.is_some());
    }

    #[test]
    fn path_cache_first_writer_wins() {
        let grid = water_grid(16, 16);
        let cc = ConnectedComponents::build(&grid);
        let graph = AbstractGraph::build(&grid, &cc, 8).unwrap();
        if graph.edges.is_empty() {
            return;
        }
        graph.cache_segment(0, Direction::Forward, vec![1, 2, 3]);
        graph.cache_segment(0, Direction::Forward, vec![9, 9]);
        assert_eq!(
            graph.cached_segment(0, Direction::Forward),
            Some(vec![1, 2, 3])
        );
        assert_eq!(graph.cached_segment(0, Direction::Backward), None);
    }
}
