//! Closed-form ground/air movement planners that sit beside the
//! tile-graph pathfinders: a parabolic arc for projectiles and a biased
//! random walk for free-flying units. Neither one searches a grid.

pub mod air_walk;
pub mod parabola;

pub use air_walk::{AirWalker, Rng};
pub use parabola::ParabolaPlanner;
