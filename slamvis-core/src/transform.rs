/// Point transforms for placing markers, and the view orbit state
use nalgebra::{Point3, Vector3};

/// Offset a point by (dx, dy, dz)
pub fn translate(point: &Point3<f32>, dx: f32, dy: f32, dz: f32) -> Point3<f32> {
    Point3::new(point.x + dx, point.y + dy, point.z + dz)
}

/// Rotate a point about the Z axis by `theta_degrees`.
///
/// Positive angles turn clockwise when seen from +Z looking down, so a
/// heading of 90 takes +Y onto +X. Angles are not normalized.
pub fn rotate_yaw(point: &Point3<f32>, theta_degrees: f32) -> Point3<f32> {
    let (sin, cos) = theta_degrees.to_radians().sin_cos();
    Point3::new(
        point.x * cos + point.y * sin,
        -point.x * sin + point.y * cos,
        point.z,
    )
}

/// Camera orbit angles around the scene center (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub azimuth: f32,
    pub elevation: f32,
}

impl RotationState {
    /// Elevation stays short of the poles so the view never flips
    const MAX_ELEVATION: f32 = 1.5;

    pub fn new(azimuth: f32, elevation: f32) -> Self {
        Self {
            azimuth,
            elevation: elevation.clamp(-Self::MAX_ELEVATION, Self::MAX_ELEVATION),
        }
    }

    pub fn zero() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(std::f32::consts::TAU);
        self.elevation = (self.elevation + d_elevation)
            .clamp(-Self::MAX_ELEVATION, Self::MAX_ELEVATION);
    }

    /// Unit vector from the orbit center towards the eye
    pub fn eye_direction(&self) -> Vector3<f32> {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        Vector3::new(cos_el * cos_az, cos_el * sin_az, sin_el)
    }
}

impl Default for RotationState {
    /// Oblique view from the -Y side, a little above the floor
    fn default() -> Self {
        Self::new(-std::f32::consts::FRAC_PI_3, 0.5)
    }
}
