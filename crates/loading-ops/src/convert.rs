//! Unit and axis conversion between millimeter platform records and the
//! solver's meter-based frame.
//!
//! The record layer stores box dimensions as (length, width, height) with
//! longitudinal CG coordinates measured from the platform end wall; the
//! solver works in (lateral, longitudinal, vertical) axes centered on the
//! platform middle. `build_item_set` swaps axes on the way in and
//! `write_back_positions` restores the record convention afterward.

use nalgebra::Vector3;
use stow_solver::{Container, Item, ItemSet, PlacementError};
use stow_types::{CargoBox, Platform};

const MM_PER_M: f64 = 1000.0;
const KG_PER_TONNE: f64 = 1000.0;

/// Vertical extent of the placement volume, meters. Single-layer placement
/// never approaches it; it only has to exceed any cargo height.
pub const PLACEMENT_CLEARANCE_M: f64 = 10.0;

/// Build a solver item set from platform and cargo records. The boxes'
/// recorded CG coordinates become the initial positions, so a run is
/// deterministic for a given input document.
pub fn build_item_set(platform: &Platform, boxes: &[CargoBox]) -> Result<ItemSet, PlacementError> {
    let container = Container {
        center: Vector3::zeros(),
        size: Vector3::new(
            platform.floor_width / MM_PER_M,
            platform.floor_length / MM_PER_M,
            PLACEMENT_CLEARANCE_M,
        ),
    };

    let half_length_m = platform.floor_length / MM_PER_M / 2.0;
    let items = boxes
        .iter()
        .enumerate()
        .map(|(id, cargo)| Item {
            id,
            mass: cargo.weight * KG_PER_TONNE,
            bbox_offset: Vector3::zeros(),
            // Record order is (length, width, height); the solver's first
            // axis is lateral, so length and width swap places.
            extents: Vector3::new(
                cargo.dimensions[1],
                cargo.dimensions[0],
                cargo.dimensions[2],
            ) / MM_PER_M,
            position: Vector3::new(
                cargo.cg_coords[1] / MM_PER_M,
                cargo.cg_coords[0] / MM_PER_M - half_length_m,
                cargo.cg_coords[2] / MM_PER_M,
            ),
        })
        .collect();

    ItemSet::new(container, items)
}

/// Single-layer floor rule: every box rests directly on the platform floor,
/// so the optimized vertical coordinate is overwritten with half the box
/// height. Applied after a run; the optimizer itself is unaware of it.
pub fn rest_on_floor(set: &mut ItemSet) {
    for item in set.items_mut() {
        item.position.z = item.extents.z / 2.0;
    }
}

/// Write finalized positions back into the cargo records, restoring the
/// millimeter end-wall coordinate convention. Only call after the run has
/// terminated.
pub fn write_back_positions(set: &ItemSet, platform: &Platform, boxes: &mut [CargoBox]) {
    let half_length_mm = platform.floor_length / 2.0;
    for (item, cargo) in set.items().iter().zip(boxes.iter_mut()) {
        cargo.cg_coords = [
            item.position.y * MM_PER_M + half_length_mm,
            item.position.x * MM_PER_M,
            item.position.z * MM_PER_M,
        ];
    }
}
