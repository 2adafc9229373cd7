//! Wasm-bindgen surface. A loaded grid is process-wide and immutable
//! for the rest of the session, so its backing memory is
//! intentionally leaked once per `loadGrid` call rather than reference
//! counted -- this keeps every downstream pathfinder a plain `&'static`
//! borrow instead of threading a lifetime or an `Rc` through the wasm
//! boundary, matching the grid's own "created at start, torn down with the
//! process" lifecycle.

use wasm_bindgen::prelude::*;

use crate::abstract_graph::AbstractGraph;
use crate::astar::{AStarRail, AStarWater};
use crate::components::ConnectedComponents;
use crate::config::{RailPathfinderOptions, SmoothingMode, WaterPathfinderOptions};
use crate::error::PathfindingError;
use crate::grid::TileGrid;
use crate::hierarchical::HierarchicalWaterAStar;
use crate::parametric::air_walk::{AirWalker, Rng};
use crate::parametric::parabola::ParabolaPlanner;
use crate::transformers::minimap::MiniMapTransformer;
use crate::transformers::smoothing::SmoothingWaterTransformer;
use crate::transformers::stepper::PathFinderStepper;
use crate::transformers::{PathFinder, PathResult, Stepper};

const MAGNITUDE_FLOOR_1: u8 = 3;
const MAGNITUDE_FLOOR_2: u8 = 6;
const REFINE_RADIUS: u32 = 50;

fn to_js_error(err: PathfindingError) -> JsError {
    JsError::new(&err.to_string())
}

/// An owning handle to a loaded grid (`loadGrid`).
#[wasm_bindgen]
pub struct GridHandle {
    grid: &'static TileGrid,
    components: &'static ConnectedComponents,
}

#[wasm_bindgen]
impl GridHandle {
    #[wasm_bindgen(js_name = loadGrid)]
    pub fn load_grid(bytes: &[u8], width: u32, height: u32) -> Result<GridHandle, JsError> {
        let grid = TileGrid::load(bytes, width, height).map_err(to_js_error)?;
        let grid: &'static TileGrid = Box::leak(Box::new(grid));
        let components = ConnectedComponents::build(grid);
        let components: &'static ConnectedComponents = Box::leak(Box::new(components));
        Ok(Self { grid, components })
    }

    #[wasm_bindgen(js_name = width)]
    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    #[wasm_bindgen(js_name = height)]
    pub fn height(&self) -> u32 {
        self.grid.height()
    }
}

/// A built abstract graph over a grid (`buildAbstractGraph`), exposed
/// separately from `makeWaterPathfinder` for inspection/debugging use.
#[wasm_bindgen]
pub struct AbstractGraphHandle {
    graph: &'static AbstractGraph,
}

#[wasm_bindgen]
impl AbstractGraphHandle {
    #[wasm_bindgen(js_name = buildAbstractGraph)]
    pub fn build(grid: &GridHandle, cluster_size: u32) -> Result<AbstractGraphHandle, JsError> {
        let graph = AbstractGraph::build(grid.grid, grid.components, cluster_size).map_err(to_js_error)?;
        let graph: &'static AbstractGraph = Box::leak(Box::new(graph));
        Ok(Self { graph })
    }

    #[wasm_bindgen(js_name = numNodes)]
    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes()
    }

    #[wasm_bindgen(js_name = numEdges)]
    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }
}

/// Translation of [`PathResult`] into a wasm-friendly shape -- wasm-bindgen
/// can export fieldless enums but not ones carrying data.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Complete,
    Next,
    NotFound,
}

#[wasm_bindgen]
pub struct StepOutcome {
    kind: StepKind,
    tile: u32,
}

#[wasm_bindgen]
impl StepOutcome {
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    #[wasm_bindgen(getter)]
    pub fn tile(&self) -> u32 {
        self.tile
    }
}

impl From<PathResult> for StepOutcome {
    fn from(result: PathResult) -> Self {
        match result {
            PathResult::Complete => StepOutcome {
                kind: StepKind::Complete,
                tile: 0,
            },
            PathResult::Next(tile) => StepOutcome {
                kind: StepKind::Next,
                tile,
            },
            PathResult::NotFound => StepOutcome {
                kind: StepKind::NotFound,
                tile: 0,
            },
        }
    }
}

/// Builds the transformer pipeline described here: hierarchical or plain
/// water A* at the core, optionally wrapped in mini-map delegation, always
/// followed by the smoothing pass unless the caller switched it off.
fn build_water_pipeline(
    grid: &'static TileGrid,
    components: &'static ConnectedComponents,
    options: WaterPathfinderOptions,
) -> Result<Box<dyn PathFinder>, PathfindingError> {
    let local_options = crate::config::LocalAStarOptions {
        heuristic_weight: options.heuristic_weight,
        max_iterations: options.max_iterations,
    };

    let base: Box<dyn PathFinder> = if options.use_hierarchical {
        let graph = AbstractGraph::build(grid, components, options.cluster_size)?;
        let graph: &'static AbstractGraph = Box::leak(Box::new(graph));
        Box::new(HierarchicalWaterAStar::new(grid, graph, options))
    } else {
        Box::new(AStarWater::new(grid, local_options))
    };

    let base: Box<dyn PathFinder> = if options.use_mini_map {
        let mini = grid.mini_grid();
        let mini_grid = TileGrid::load(mini.terrain(), mini.width(), mini.height())
            .expect("mini grid terrain buffer always matches its own declared dimensions");
        let mini_grid: &'static TileGrid = Box::leak(Box::new(mini_grid));

        let mini_inner: Box<dyn PathFinder> = if options.use_hierarchical {
            let mini_components = ConnectedComponents::build(mini_grid);
            let mini_components: &'static ConnectedComponents = Box::leak(Box::new(mini_components));
            let mini_graph = AbstractGraph::build(mini_grid, mini_components, options.cluster_size)?;
            let mini_graph: &'static AbstractGraph = Box::leak(Box::new(mini_graph));
            Box::new(HierarchicalWaterAStar::new(mini_grid, mini_graph, options))
        } else {
            Box::new(AStarWater::new(mini_grid, local_options))
        };

        Box::new(MiniMapTransformer::new(mini_inner, grid))
    } else {
        base
    };

    let pipeline: Box<dyn PathFinder> = match options.smoothing {
        SmoothingMode::Off => base,
        SmoothingMode::Full => {
            let refine_max_search_area = ((REFINE_RADIUS * 2 + 1).pow(2) as usize).min(grid.num_tiles());
            Box::new(SmoothingWaterTransformer::new(
                base,
                grid,
                MAGNITUDE_FLOOR_1,
                MAGNITUDE_FLOOR_2,
                REFINE_RADIUS,
                refine_max_search_area,
            ))
        }
    };

    Ok(pipeline)
}

/// A steppable water pathfinder (`makeWaterPathfinder`).
#[wasm_bindgen]
pub struct WaterStepper {
    inner: PathFinderStepper<'static, Box<dyn PathFinder>>,
}

#[wasm_bindgen]
impl WaterStepper {
    #[wasm_bindgen(js_name = makeWaterPathfinder)]
    pub fn make(grid: &GridHandle, options: WaterOptionsArg) -> Result<WaterStepper, JsError> {
        let pipeline = build_water_pipeline(grid.grid, grid.components, options.into()).map_err(to_js_error)?;
        Ok(Self {
            inner: PathFinderStepper::new(pipeline, grid.grid),
        })
    }

    #[wasm_bindgen(js_name = next)]
    pub fn next(&mut self, from: u32, to: u32, dist: Option<u32>) -> StepOutcome {
        self.inner.next(from, to, dist).into()
    }

    #[wasm_bindgen(js_name = invalidate)]
    pub fn invalidate(&mut self) {
        self.inner.invalidate();
    }
}

/// A steppable rail pathfinder (`makeRailPathfinder`). Rail routes are
/// never hierarchical, mini-mapped, or smoothed.
#[wasm_bindgen]
pub struct RailStepper {
    inner: PathFinderStepper<'static, AStarRail<'static>>,
}

#[wasm_bindgen]
impl RailStepper {
    #[wasm_bindgen(js_name = makeRailPathfinder)]
    pub fn make(grid: &GridHandle, options: RailOptionsArg) -> RailStepper {
        let rail = AStarRail::new(grid.grid, options.into());
        Self {
            inner: PathFinderStepper::new(rail, grid.grid),
        }
    }

    #[wasm_bindgen(js_name = next)]
    pub fn next(&mut self, from: u32, to: u32, dist: Option<u32>) -> StepOutcome {
        self.inner.next(from, to, dist).into()
    }

    #[wasm_bindgen(js_name = invalidate)]
    pub fn invalidate(&mut self) {
        self.inner.invalidate();
    }
}

/// Plain-data mirror of [`WaterPathfinderOptions`] for the wasm boundary
/// (wasm-bindgen cannot export the struct itself without `Copy` getters for
/// every field, which would be pure boilerplate here).
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct WaterOptionsArg {
    pub use_hierarchical: bool,
    pub use_mini_map: bool,
    pub smoothing_off: bool,
    pub max_iterations: u32,
    pub heuristic_weight: u32,
    pub cluster_size: u32,
    pub short_path_threshold: u32,
}

#[wasm_bindgen]
impl WaterOptionsArg {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let defaults = WaterPathfinderOptions::default();
        Self {
            use_hierarchical: defaults.use_hierarchical,
            use_mini_map: defaults.use_mini_map,
            smoothing_off: defaults.smoothing == SmoothingMode::Off,
            max_iterations: defaults.max_iterations,
            heuristic_weight: defaults.heuristic_weight,
            cluster_size: defaults.cluster_size,
            short_path_threshold: defaults.short_path_threshold,
        }
    }
}

impl Default for WaterOptionsArg {
    fn default() -> Self {
        Self::new()
    }
}

impl From<WaterOptionsArg> for WaterPathfinderOptions {
    fn from(arg: WaterOptionsArg) -> Self {
        Self {
            use_hierarchical: arg.use_hierarchical,
            use_mini_map: arg.use_mini_map,
            smoothing: if arg.smoothing_off {
                SmoothingMode::Off
            } else {
                SmoothingMode::Full
            },
            max_iterations: arg.max_iterations,
            heuristic_weight: arg.heuristic_weight,
            cluster_size: arg.cluster_size,
            short_path_threshold: arg.short_path_threshold,
        }
    }
}

#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct RailOptionsArg {
    pub direction_change_penalty: u32,
    pub water_penalty: u32,
    pub heuristic_weight: u32,
    pub max_iterations: u32,
}

#[wasm_bindgen]
impl RailOptionsArg {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let defaults = RailPathfinderOptions::default();
        Self {
            direction_change_penalty: defaults.direction_change_penalty,
            water_penalty: defaults.water_penalty,
            heuristic_weight: defaults.heuristic_weight,
            max_iterations: defaults.max_iterations,
        }
    }
}

impl Default for RailOptionsArg {
    fn default() -> Self {
        Self::new()
    }
}

impl From<RailOptionsArg> for RailPathfinderOptions {
    fn from(arg: RailOptionsArg) -> Self {
        Self {
            direction_change_penalty: arg.direction_change_penalty,
            water_penalty: arg.water_penalty,
            heuristic_weight: arg.heuristic_weight,
            max_iterations: arg.max_iterations,
        }
    }
}

/// A seeded RNG supplied from JS, consumed by [`AirWalker`]. The
/// walker never seeds or owns randomness itself.
#[wasm_bindgen]
pub struct JsRng {
    next_int_fn: js_sys::Function,
    chance_fn: js_sys::Function,
}

#[wasm_bindgen]
impl JsRng {
    #[wasm_bindgen(constructor)]
    pub fn new(next_int_fn: js_sys::Function, chance_fn: js_sys::Function) -> Self {
        Self {
            next_int_fn,
            chance_fn,
        }
    }
}

impl Rng for JsRng {
    fn next_int(&mut self, lo: i32, hi: i32) -> i32 {
        self.next_int_fn
            .call2(&JsValue::NULL, &JsValue::from(lo), &JsValue::from(hi))
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v as i32)
            .unwrap_or(0)
    }

    fn chance(&mut self, one_in_n: u32) -> bool {
        self.chance_fn
            .call1(&JsValue::NULL, &JsValue::from(one_in_n))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[wasm_bindgen]
pub struct AirWalkerHandle {
    grid: &'static TileGrid,
    rng: JsRng,
    detour_chance: u32,
}

#[wasm_bindgen]
impl AirWalkerHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(grid: &GridHandle, rng: JsRng, detour_chance: u32) -> Self {
        Self {
            grid: grid.grid,
            rng,
            detour_chance,
        }
    }

    #[wasm_bindgen(js_name = step)]
    pub fn step(&mut self, current: u32, target: u32) -> StepOutcome {
        let mut walker = AirWalker::new(self.grid, &mut self.rng, self.detour_chance);
        walker.next(current, target).into()
    }
}

impl<'a, R: Rng> Rng for &'a mut R {
    fn next_int(&mut self, lo: i32, hi: i32) -> i32 {
        (**self).next_int(lo, hi)
    }
    fn chance(&mut self, one_in_n: u32) -> bool {
        (**self).chance(one_in_n)
    }
}

/// Exposes [`ParabolaPlanner`] for projectile/ground-arc movement:
/// `ParabolaPlanner(grid).configure(orig, dst, minHeight)`, constructed here
/// in one step since this crate has no separate `configure` call.
#[wasm_bindgen]
pub struct ParabolaPlannerHandle {
    inner: ParabolaPlanner,
}

#[wasm_bindgen]
impl ParabolaPlannerHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(grid: &GridHandle, orig: u32, dst: u32, min_height: Option<f64>) -> Self {
        let g = grid.grid;
        let start = (g.x(orig) as f64, g.y(orig) as f64);
        let end = (g.x(dst) as f64, g.y(dst) as f64);
        Self {
            inner: ParabolaPlanner::new(start, end, min_height.unwrap_or(50.0)),
        }
    }

    /// Advances by `speed` and returns `[x, y, height]`, or an empty array
    /// once the arc has landed.
    #[wasm_bindgen(js_name = advance)]
    pub fn advance(&mut self, speed: f64) -> Vec<f64> {
        match self.inner.advance(speed) {
            Some((x, y, h)) => vec![x, y, h],
            None => Vec::new(),
        }
    }

    #[wasm_bindgen(js_name = isDone)]
    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_bytes(width: u32, height: u32) -> Vec<u8> {
        vec![5u8; (width * height) as usize]
    }

    #[test]
    fn load_grid_rejects_mismatched_dimensions() {
        let err = GridHandle::load_grid(&water_bytes(4, 4)[..10], 4, 4).unwrap_err();
        assert!(err.to_string().contains("terrain buffer"));
    }

    #[test]
    fn build_water_pipeline_runs_end_to_end() {
        let bytes = water_bytes(80, 80);
        let grid = TileGrid::load(&bytes, 80, 80).unwrap();
        let grid: &'static TileGrid = Box::leak(Box::new(grid));
        let components = ConnectedComponents::build(grid);
        let components: &'static ConnectedComponents = Box::leak(Box::new(components));

        let mut options = WaterPathfinderOptions::default();
        options.cluster_size = 16;
        let mut pipeline = build_water_pipeline(grid, components, options).unwrap();

        let start = grid.try_ref(2, 2).unwrap();
        let goal = grid.try_ref(70, 70).unwrap();
        let path = pipeline.find_path(start, goal).unwrap();
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }
}
