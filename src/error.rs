//! Error taxonomy for the pathfinding core.
//!
//! Only programmer errors (out-of-range coordinates, mis-sized buffers,
//! nonsensical configuration) are represented here. "No path found" is a
//! normal outcome and is never an error -- see [`crate::transformers::PathResult`].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathfindingError {
    #[error("coordinate ({x}, {y}) is out of bounds for a {width}x{height} grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("terrain buffer has {actual} bytes, expected {expected} for a {width}x{height} grid")]
    MisshapenGrid {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("maxIterations must be > 0")]
    ZeroIterationBudget,

    #[error("cluster size must be > 0")]
    ZeroClusterSize,

    #[error("requested search rectangle ({area} tiles) exceeds max_search_area ({max_search_area})")]
    SearchAreaTooLarge { area: usize, max_search_area: usize },
}
