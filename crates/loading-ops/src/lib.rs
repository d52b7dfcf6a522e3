pub mod convert;
pub mod plan;

pub use convert::{build_item_set, rest_on_floor, write_back_positions, PLACEMENT_CLEARANCE_M};
pub use plan::{plan_loading, LoadingReport};
