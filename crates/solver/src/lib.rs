pub mod item;
pub mod metrics;
pub mod objective;
pub mod optimizer;
pub mod penalty;

pub use item::{Container, Item, ItemSet, PlacementError};
pub use objective::{center_of_mass, ObjectiveParams};
pub use optimizer::{
    solve_placement, solve_placement_observed, IterationSnapshot, OptimizerConfig,
    PlacementObserver, PlacementResult, PlacementStatus,
};
pub use penalty::{safe_exp_penalty, safe_exp_penalty_with_knee};
