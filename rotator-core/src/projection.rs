/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::orientation::Orientation;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera looking at the origin, where the model sits
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
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: width.max(1) as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Pull the camera back along its view axis until a sphere of `radius`
    /// around the target fits the narrower field of view.
    pub fn frame_radius(&mut self, radius: f32) {
        let radius = radius.max(1e-3);
        let half_vertical = self.fov * 0.5;
        let half_horizontal = (half_vertical.tan() * self.aspect).atan();
        let half_fov = half_vertical.min(half_horizontal);
        let distance = radius / half_fov.sin() * 1.1;

        let back = (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        self.position = self.target + back * distance;
        self.near = (distance - radius * 1.5).max(0.01);
        self.far = distance + radius * 2.0;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm();
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

    /// Full model-view-projection matrix for a model at `orientation`
    pub fn mvp(&self, orientation: &Orientation) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix() * orientation.to_homogeneous()
    }

    /// Map a model-space point to screen coordinates plus NDC depth.
    ///
    /// Returns `None` for points outside the view volume.
    pub fn project(
        mvp: &Matrix4<f32>,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let clip = mvp * point.to_homogeneous();
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;
        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
