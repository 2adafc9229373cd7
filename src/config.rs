//! Options structs that configure the factory functions.
//!
//! Mirrors the teacher crate's constructor pattern (`AStarWater::new(..,
//! heuristic_weight: Option<u32>, max_iterations: Option<u32>)`) but gathers
//! the knobs into named, `Default`-able structs instead of positional
//! optional arguments, since the water pathfinder now has several more of
//! them (hierarchical/mini-map/smoothing toggles) than the teacher's single
//! flat A* did.

/// Smoothing stage applied by [`crate::api::make_water_pathfinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMode {
    Off,
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterPathfinderOptions {
    pub use_hierarchical: bool,
    pub use_mini_map: bool,
    pub smoothing: SmoothingMode,
    pub max_iterations: u32,
    pub heuristic_weight: u32,
    /// Cluster size used when `use_hierarchical` is set; ignored otherwise.
    pub cluster_size: u32,
    /// Short-path fast-path threshold, in tiles.
    pub short_path_threshold: u32,
}

impl Default for WaterPathfinderOptions {
    fn default() -> Self {
        Self {
            use_hierarchical: true,
            use_mini_map: false,
            smoothing: SmoothingMode::Full,
            max_iterations: 1_000_000,
            heuristic_weight: 5,
            cluster_size: 32,
            short_path_threshold: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailPathfinderOptions {
    pub direction_change_penalty: u32,
    pub water_penalty: u32,
    pub heuristic_weight: u32,
    pub max_iterations: u32,
}

impl Default for RailPathfinderOptions {
    fn default() -> Self {
        Self {
            direction_change_penalty: 3,
            water_penalty: 5,
            heuristic_weight: 2,
            max_iterations: 500_000,
        }
    }
}

/// Options for a single bounded/unbounded water A* instance, as opposed to
/// the higher-level [`WaterPathfinderOptions`] that configures the whole
/// stepper pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalAStarOptions {
    pub heuristic_weight: u32,
    pub max_iterations: u32,
}

impl Default for LocalAStarOptions {
    fn default() -> Self {
        Self {
            heuristic_weight: 3,
            max_iterations: 100_000,
        }
    }
}
