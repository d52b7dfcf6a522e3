//! Smooth separation and containment metrics over axis-aligned boxes.
//!
//! True overlap/containment predicates are discontinuous; these functions
//! are differentiable surrogates whose values pass continuously through zero
//! near contact, so a gradient solver can steer across the boundary. They
//! operate on explicit `(center, extents)` boxes so the objective can
//! evaluate trial parameter vectors without touching stored item state.

use nalgebra::Vector3;

use crate::item::Container;

/// Per-axis gaps are clipped to this before squaring in the separated
/// branch, keeping the square root's gradient finite at exact contact.
pub(crate) const GAP_EPS: f64 = 1e-12;

/// Smooth face-to-face separation between two absolute bounding boxes.
///
/// When the boxes are separated along at least one axis the result is the
/// Euclidean norm of the clipped-positive per-axis gaps, i.e. the minimum
/// face-to-face distance. When they interpenetrate on all three axes the
/// result is the product of the (all negative) gaps: a signed penetration
/// proxy whose magnitude grows smoothly with overlap depth without blowing
/// up along any single axis. Not an exact signed-distance field.
pub fn pair_separation(
    center_a: &Vector3<f64>,
    extents_a: &Vector3<f64>,
    center_b: &Vector3<f64>,
    extents_b: &Vector3<f64>,
) -> f64 {
    let mut gaps = [0.0; 3];
    for k in 0..3 {
        gaps[k] = (center_a[k] - center_b[k]).abs() - (extents_a[k] + extents_b[k]) / 2.0;
    }

    let separated = gaps.iter().any(|&g| g > 0.0);
    if separated {
        gaps.iter()
            .map(|g| g.max(GAP_EPS))
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt()
    } else {
        gaps.iter().product()
    }
}

/// Signed containment margin of a box against the container, taken on the
/// most-violating axis (exceeding the container on any single axis is
/// disqualifying). Positive: inside with that much clearance; negative:
/// sticking out by that magnitude on the worst axis.
pub fn containment_margin(
    center: &Vector3<f64>,
    extents: &Vector3<f64>,
    container: &Container,
) -> f64 {
    let mut worst = f64::NEG_INFINITY;
    for k in 0..3 {
        let violation =
            (container.center[k] - center[k]).abs() - (container.size[k] - extents[k]) / 2.0;
        worst = worst.max(violation);
    }
    -worst
}
