use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rigid cargo item. `position` is the free variable the optimizer moves;
/// mass and geometry stay fixed for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Stable index of this item within its set.
    pub id: usize,
    /// Mass in kilograms. Always positive.
    pub mass: f64,
    /// Offset of the bounding-box geometric center from the center of mass,
    /// meters.
    pub bbox_offset: Vector3<f64>,
    /// Full box widths per axis, meters. Always positive.
    pub extents: Vector3<f64>,
    /// Center-of-mass location in container coordinates, meters.
    pub position: Vector3<f64>,
}

impl Item {
    /// Absolute axis-aligned bounding box `(center, extents)` at the item's
    /// current position. Derived on every call; the box moves with
    /// `position`, so it is never cached across iterations.
    pub fn absolute_bbox(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.position + self.bbox_offset, self.extents)
    }
}

/// The fixed axis-aligned box every item must stay inside. Immutable for the
/// duration of a run; only items move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub center: Vector3<f64>,
    /// Full widths per axis, meters. Always positive.
    pub size: Vector3<f64>,
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("item {index} has non-positive mass ({mass} kg)")]
    NonPositiveMass { index: usize, mass: f64 },
    #[error("item {index} has non-positive extent on axis {axis}")]
    NonPositiveExtent { index: usize, axis: usize },
    #[error("container has non-positive size on axis {axis}")]
    NonPositiveContainerSize { axis: usize },
    #[error("container has non-finite geometry")]
    NonFiniteContainer,
    #[error("item {index} has non-finite mass or geometry")]
    NonFiniteInput { index: usize },
    #[error("invalid optimizer configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error(
        "loss or gradient became non-finite at iteration {iteration}; \
         this indicates an input or tuning-parameter bug, not a retryable condition"
    )]
    NonFiniteLoss { iteration: usize },
}

/// An ordered set of items sharing one container and one optimization run.
///
/// Construction validates masses, extents and container size so the
/// objective downstream is well-defined. During a run the optimizer mutates
/// positions in place; once the run has terminated the set should be treated
/// as read-only by consumers. Reading positions mid-run is unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSet {
    container: Container,
    items: Vec<Item>,
}

impl ItemSet {
    pub fn new(container: Container, items: Vec<Item>) -> Result<Self, PlacementError> {
        if !container.center.iter().all(|c| c.is_finite())
            || !container.size.iter().all(|s| s.is_finite())
        {
            return Err(PlacementError::NonFiniteContainer);
        }
        for axis in 0..3 {
            if container.size[axis] <= 0.0 {
                return Err(PlacementError::NonPositiveContainerSize { axis });
            }
        }

        for (index, item) in items.iter().enumerate() {
            let finite = item.mass.is_finite()
                && item.position.iter().all(|v| v.is_finite())
                && item.bbox_offset.iter().all(|v| v.is_finite())
                && item.extents.iter().all(|v| v.is_finite());
            if !finite {
                return Err(PlacementError::NonFiniteInput { index });
            }
            if item.mass <= 0.0 {
                return Err(PlacementError::NonPositiveMass {
                    index,
                    mass: item.mass,
                });
            }
            for axis in 0..3 {
                if item.extents[axis] <= 0.0 {
                    return Err(PlacementError::NonPositiveExtent { index, axis });
                }
            }
        }

        Ok(Self { container, items })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Mutable access for caller-side post-run rules (e.g. a floor-rest
    /// adjustment). Not for use while a run is in progress.
    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
