use wasm_bindgen::prelude::*;

pub mod abstract_graph;
pub mod api;
pub mod astar;
pub mod bfs;
pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod hierarchical;
pub mod parametric;
pub mod queue;
pub mod transformers;

/// Wires up panic-to-console and the `log` facade before anything else runs.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
