//! Composes per-pair collision penalties, per-item containment penalties,
//! the lateral-centering term and the global center-of-mass pull into one
//! scalar loss, evaluated against a flat trial parameter vector.

use nalgebra::Vector3;

use crate::item::{Item, ItemSet};
use crate::metrics::{containment_margin, pair_separation};
use crate::penalty::safe_exp_penalty;

/// Weight of the containment term relative to the collision term.
const CONTAINMENT_WEIGHT: f64 = 10.0;
/// Weight of the global center-of-mass pull.
const BALANCE_WEIGHT: f64 = 10.0;

/// Tuning inputs the composed objective depends on.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveParams {
    /// Safety radius fed to the penalty shaping, meters.
    pub safe_distance: f64,
    /// Axis whose absolute coordinate is penalized, pulling items toward
    /// the longitudinal centerline.
    pub lateral_axis: usize,
}

/// Trial parameter layout: `[x0, y0, z0, x1, y1, z1, ...]`, positions only.
fn position_at(positions: &[f64], index: usize) -> Vector3<f64> {
    Vector3::new(
        positions[3 * index],
        positions[3 * index + 1],
        positions[3 * index + 2],
    )
}

fn bbox_at(item: &Item, positions: &[f64], index: usize) -> (Vector3<f64>, Vector3<f64>) {
    (position_at(positions, index) + item.bbox_offset, item.extents)
}

/// Loss contribution of item `i`: collision penalties against every other
/// item, the weighted containment penalty, and the lateral-centering pull.
/// Self-pairs are excluded; their contribution would be position-independent.
pub fn item_loss(set: &ItemSet, positions: &[f64], i: usize, obj: &ObjectiveParams) -> f64 {
    let items = set.items();
    let (center_i, extents_i) = bbox_at(&items[i], positions, i);

    let mut loss = 0.0;
    for (j, other) in items.iter().enumerate() {
        if j == i {
            continue;
        }
        let (center_j, extents_j) = bbox_at(other, positions, j);
        let separation = pair_separation(&center_i, &extents_i, &center_j, &extents_j);
        loss += safe_exp_penalty(-separation, obj.safe_distance);
    }

    let margin = containment_margin(&center_i, &extents_i, set.container());
    loss += CONTAINMENT_WEIGHT * safe_exp_penalty(-margin, obj.safe_distance);

    loss += position_at(positions, i)[obj.lateral_axis].abs();
    loss
}

/// Per-item losses in item order. This is the vector observers see.
pub fn item_losses(set: &ItemSet, positions: &[f64], obj: &ObjectiveParams) -> Vec<f64> {
    (0..set.len())
        .map(|i| item_loss(set, positions, i, obj))
        .collect()
}

/// The scalar objective: mean per-item loss plus the weighted norm of the
/// aggregate center of mass. Mean, not sum, so item count does not rescale
/// gradient magnitudes.
pub fn total_loss(set: &ItemSet, positions: &[f64], obj: &ObjectiveParams) -> f64 {
    let n = set.len();
    if n == 0 {
        return 0.0;
    }
    let per_item: f64 = (0..n).map(|i| item_loss(set, positions, i, obj)).sum();
    per_item / n as f64 + BALANCE_WEIGHT * center_of_mass_at(set, positions).norm()
}

/// Mass-weighted mean position over a trial parameter vector. Total mass is
/// positive for any validated, non-empty set.
pub fn center_of_mass_at(set: &ItemSet, positions: &[f64]) -> Vector3<f64> {
    let mut weighted = Vector3::zeros();
    let mut total_mass = 0.0;
    for (i, item) in set.items().iter().enumerate() {
        weighted += item.mass * position_at(positions, i);
        total_mass += item.mass;
    }
    weighted / total_mass
}

/// Mass-weighted mean position over the items' stored positions.
pub fn center_of_mass(items: &[Item]) -> Vector3<f64> {
    let mut weighted = Vector3::zeros();
    let mut total_mass = 0.0;
    for item in items {
        weighted += item.mass * item.position;
        total_mass += item.mass;
    }
    weighted / total_mass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Container;

    fn item(id: usize, mass: f64, position: Vector3<f64>) -> Item {
        Item {
            id,
            mass,
            bbox_offset: Vector3::zeros(),
            extents: Vector3::new(1.0, 1.0, 1.0),
            position,
        }
    }

    fn set_of(items: Vec<Item>) -> ItemSet {
        let container = Container {
            center: Vector3::zeros(),
            size: Vector3::new(20.0, 20.0, 20.0),
        };
        ItemSet::new(container, items).unwrap()
    }

    fn flatten(set: &ItemSet) -> Vec<f64> {
        set.items()
            .iter()
            .flat_map(|item| [item.position.x, item.position.y, item.position.z])
            .collect()
    }

    const OBJ: ObjectiveParams = ObjectiveParams {
        safe_distance: 0.1,
        lateral_axis: 0,
    };

    #[test]
    fn test_center_of_mass_single_item_is_its_position() {
        let position = Vector3::new(1.25, -3.0, 0.5);
        let com = center_of_mass(&[item(0, 7.5, position)]);
        assert!((com - position).norm() < 1e-15);
    }

    #[test]
    fn test_center_of_mass_symmetric_pair_at_origin() {
        let com = center_of_mass(&[
            item(0, 1.0, Vector3::new(2.0, -1.0, 0.5)),
            item(1, 1.0, Vector3::new(-2.0, 1.0, -0.5)),
        ]);
        assert!(com.norm() < 1e-6, "center of mass = {com:?}");
    }

    #[test]
    fn test_center_of_mass_weights_by_mass() {
        let com = center_of_mass(&[
            item(0, 3.0, Vector3::new(1.0, 0.0, 0.0)),
            item(1, 1.0, Vector3::new(-3.0, 0.0, 0.0)),
        ]);
        assert!(com.norm() < 1e-12, "center of mass = {com:?}");
    }

    #[test]
    fn test_total_loss_empty_set_is_zero() {
        let set = set_of(Vec::new());
        assert_eq!(total_loss(&set, &[], &OBJ), 0.0);
    }

    #[test]
    fn test_overlapping_pair_costs_more_than_separated() {
        let overlapping = set_of(vec![
            item(0, 1.0, Vector3::zeros()),
            item(1, 1.0, Vector3::new(0.4, 0.0, 0.0)),
        ]);
        let separated = set_of(vec![
            item(0, 1.0, Vector3::new(0.0, -2.0, 0.0)),
            item(1, 1.0, Vector3::new(0.0, 2.0, 0.0)),
        ]);
        let loss_overlap = total_loss(&overlapping, &flatten(&overlapping), &OBJ);
        let loss_separated = total_loss(&separated, &flatten(&separated), &OBJ);
        assert!(
            loss_overlap > loss_separated,
            "overlap {loss_overlap} vs separated {loss_separated}"
        );
    }

    #[test]
    fn test_lateral_term_charges_off_axis_items() {
        let set = set_of(vec![item(0, 1.0, Vector3::new(2.0, 0.0, 0.0))]);
        let positions = flatten(&set);
        // Single far-inside item: collision is absent and containment is
        // negligible, so the lateral |x| term dominates the item loss.
        assert!(item_loss(&set, &positions, 0, &OBJ) >= 2.0);
    }

    #[test]
    fn test_item_losses_length_matches_set() {
        let set = set_of(vec![
            item(0, 1.0, Vector3::new(0.0, -2.0, 0.0)),
            item(1, 1.0, Vector3::new(0.0, 2.0, 0.0)),
        ]);
        assert_eq!(item_losses(&set, &flatten(&set), &OBJ).len(), 2);
    }
}
