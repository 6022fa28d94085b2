/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::surface::Axes;
use crate::transform::RotationState;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
        }
    }
}

/// Camera orbiting the center of the world volume, with +Z up
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
    distance: f32,
}

impl Camera {
    /// Frame the axis box from the given orbit angles
    pub fn for_axes(axes: &Axes, orbit: &RotationState, aspect: f32) -> Self {
        let target = axes.center();
        let fov = std::f32::consts::PI / 4.0; // 45 degrees
        // Bounding sphere of the box must fit inside the view cone
        let radius = axes.extent().norm() / 2.0;
        let distance = radius / (fov / 2.0).sin() * 1.1;

        let mut camera = Self {
            position: target,
            target,
            up: Vector3::z(),
            fov,
            aspect,
            near: distance * 0.01,
            far: distance * 4.0,
            mode: ProjectionMode::Perspective,
            distance,
        };
        camera.orbit_to(orbit);
        camera
    }

    /// Move the eye onto the orbit sphere at the given angles
    pub fn orbit_to(&mut self, orbit: &RotationState) {
        self.position = self.target + orbit.eye_direction() * self.distance;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = self.distance * (self.fov / 2.0).tan() * 2.0;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a world point to screen space, returning (x, y, depth).
    ///
    /// Points behind the eye or outside the view volume yield `None`.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let (x, y, depth) = self.project_unclipped(point, width, height)?;

        // Clip test
        if x < 0.0 || x > width as f32 || y < 0.0 || y > height as f32 {
            return None;
        }
        Some((x, y, depth))
    }

    /// Project a world point to screen space without clipping to the screen.
    ///
    /// Only points behind the near plane yield `None`; anything else maps to
    /// screen coordinates that may lie outside `0..width` / `0..height`.
    pub fn project_unclipped(
        &self,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let eye_space = self.view_matrix().transform_point(point);
        // Right-handed view space looks down -Z
        if eye_space.z > -self.near {
            return None;
        }

        let ndc = self.projection_matrix().transform_point(&eye_space);
        if !ndc.coords.iter().all(|c| c.is_finite()) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}
