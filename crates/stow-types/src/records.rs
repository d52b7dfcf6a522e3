use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flat rail platform as recorded by the surrounding application.
/// Lengths are millimeters, weights tonnes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Usable floor length, mm.
    pub floor_length: f64,
    /// Usable floor width, mm.
    pub floor_width: f64,
    /// Empty weight of the platform, t.
    pub tare_weight: f64,
    /// Floor height above the rail heads, mm.
    pub height_from_rails: f64,
    /// Height of the empty platform's center of gravity above the rail
    /// heads, mm.
    pub cg_height_from_rails: f64,
    /// Distance between the bogie pivot centers, mm.
    pub base_length: f64,
}

/// A rectangular cargo box to be placed on a platform.
///
/// Coordinates use the document convention: the center of gravity is
/// measured from the platform end wall along the length, from the
/// longitudinal centerline laterally, and from the floor vertically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CargoBox {
    pub id: Uuid,
    /// CG coordinates (longitudinal, lateral, vertical), mm.
    pub cg_coords: [f64; 3],
    /// Outer dimensions (length, width, height), mm.
    pub dimensions: [f64; 3],
    /// Weight, t.
    pub weight: f64,
}

impl CargoBox {
    /// Create a box with a fresh id.
    pub fn new(cg_coords: [f64; 3], dimensions: [f64; 3], weight: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            cg_coords,
            dimensions,
            weight,
        }
    }
}
