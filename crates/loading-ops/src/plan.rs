//! One-call loading-plan orchestration: convert records into solver items,
//! optimize, apply the floor rule and write the coordinates back.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use stow_solver::{solve_placement, OptimizerConfig, PlacementError, PlacementStatus};
use stow_types::{CargoBox, Platform};

use crate::convert::{build_item_set, rest_on_floor, write_back_positions};

/// Outcome of one loading-plan computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadingReport {
    pub status: PlacementStatus,
    pub iterations: usize,
    pub final_loss: f64,
    /// False when the run was capped: no feasible arrangement was found and
    /// the written-back positions must not be used as a valid layout.
    pub feasible: bool,
}

/// Compute a loading plan for `boxes` on `platform`, updating each box's CG
/// coordinates in place. The boxes' current coordinates serve as the
/// starting layout.
pub fn plan_loading(
    platform: &Platform,
    boxes: &mut [CargoBox],
    config: &OptimizerConfig,
) -> Result<LoadingReport, PlacementError> {
    let mut set = build_item_set(platform, boxes)?;
    let result = solve_placement(&mut set, config)?;
    rest_on_floor(&mut set);
    write_back_positions(&set, platform, boxes);

    let feasible = result.status == PlacementStatus::Converged;
    if feasible {
        info!(
            iterations = result.iterations,
            final_loss = result.final_loss,
            boxes = boxes.len(),
            "loading plan computed"
        );
    } else {
        warn!(
            iterations = result.iterations,
            final_loss = result.final_loss,
            "no feasible arrangement found"
        );
    }

    Ok(LoadingReport {
        status: result.status,
        iterations: result.iterations,
        final_loss: result.final_loss,
        feasible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> Platform {
        Platform {
            floor_length: 13300.0,
            floor_width: 2870.0,
            tare_weight: 21.0,
            height_from_rails: 1310.0,
            cg_height_from_rails: 800.0,
            base_length: 9720.0,
        }
    }

    /// Rectangles (lateral, longitudinal, in mm) may not overlap on both
    /// floor axes at once beyond the tolerance.
    fn footprints_disjoint(boxes: &[CargoBox], tol_mm: f64) -> bool {
        for (i, a) in boxes.iter().enumerate() {
            for b in boxes.iter().skip(i + 1) {
                let long_overlap = (a.dimensions[0] + b.dimensions[0]) / 2.0
                    - (a.cg_coords[0] - b.cg_coords[0]).abs();
                let lat_overlap = (a.dimensions[1] + b.dimensions[1]) / 2.0
                    - (a.cg_coords[1] - b.cg_coords[1]).abs();
                if long_overlap > tol_mm && lat_overlap > tol_mm {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_plan_loading_produces_feasible_single_layer_layout() {
        let platform = platform();
        let mut boxes = [
            CargoBox::new([3000.0, 300.0, 400.0], [2400.0, 1600.0, 800.0], 2.0),
            CargoBox::new([7000.0, -200.0, 500.0], [3000.0, 1800.0, 1000.0], 3.5),
            CargoBox::new([10500.0, 100.0, 300.0], [1800.0, 1200.0, 600.0], 1.0),
        ];

        let config = OptimizerConfig {
            safe_distance: 0.05,
            max_iterations: 30_000,
            ..OptimizerConfig::default()
        };
        let report = plan_loading(&platform, &mut boxes, &config).unwrap();
        assert!(report.feasible, "final loss {}", report.final_loss);
        assert_eq!(report.status, PlacementStatus::Converged);

        for cargo in &boxes {
            // Floor rule: each box rests on the floor.
            assert!(
                (cargo.cg_coords[2] - cargo.dimensions[2] / 2.0).abs() < 1e-6,
                "box {} floats at {} mm",
                cargo.id,
                cargo.cg_coords[2]
            );
            // Stays on the platform, within the solver's soft tolerance.
            let slack_mm = 2.0 * config.safe_distance * 1000.0;
            let half_len = cargo.dimensions[0] / 2.0;
            assert!(cargo.cg_coords[0] - half_len >= -slack_mm);
            assert!(cargo.cg_coords[0] + half_len <= platform.floor_length + slack_mm);
            let half_width = cargo.dimensions[1] / 2.0;
            assert!(cargo.cg_coords[1].abs() + half_width <= platform.floor_width / 2.0 + slack_mm);
        }

        assert!(
            footprints_disjoint(&boxes, 2.0 * config.safe_distance * 1000.0),
            "boxes overlap on the floor"
        );
    }

    #[test]
    fn test_plan_loading_surfaces_infeasible_input() {
        // Two boxes wider than half the platform cannot sit side by side and
        // together exceed the floor length: nothing fits.
        let narrow = Platform {
            floor_length: 4000.0,
            floor_width: 2870.0,
            ..platform()
        };
        let mut boxes = [
            CargoBox::new([1000.0, 0.0, 400.0], [2600.0, 2000.0, 800.0], 2.0),
            CargoBox::new([2800.0, 0.0, 400.0], [2600.0, 2000.0, 800.0], 2.0),
        ];
        let config = OptimizerConfig {
            safe_distance: 0.05,
            max_iterations: 400,
            ..OptimizerConfig::default()
        };
        let report = plan_loading(&narrow, &mut boxes, &config).unwrap();
        assert!(!report.feasible);
        assert_eq!(report.status, PlacementStatus::Capped);
    }

    #[test]
    fn test_plan_loading_empty_manifest_is_noop() {
        let mut boxes: [CargoBox; 0] = [];
        let report =
            plan_loading(&platform(), &mut boxes, &OptimizerConfig::default()).unwrap();
        assert!(report.feasible);
        assert_eq!(report.iterations, 0);
    }
}
