use serde::{Deserialize, Serialize};

/// Requested field: in-plane magnitude and direction plus a Z offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldVector {
    /// Gauss
    pub magnitude: f64,
    /// Radians, measured from the X coil towards the Y coil
    pub angle: f64,
    /// Gauss, usually cancels the local earth field
    pub z_offset: f64,
}

impl FieldVector {
    pub fn new(magnitude: f64, angle: f64, z_offset: f64) -> Self {
        Self {
            magnitude,
            angle,
            z_offset,
        }
    }

    pub fn from_degrees(magnitude: f64, degrees: f64, z_offset: f64) -> Self {
        Self::new(magnitude, degrees.to_radians(), z_offset)
    }

    pub fn bx(&self) -> f64 {
        self.magnitude * self.angle.cos()
    }

    pub fn by(&self) -> f64 {
        self.magnitude * self.angle.sin()
    }

    pub fn bz(&self) -> f64 {
        self.z_offset
    }

    /// `sqrt(Bx² + By²)` recomputed from the components.
    pub fn planar_magnitude(&self) -> f64 {
        let (bx, by) = (self.bx(), self.by());
        (bx * bx + by * by).sqrt()
    }
}
