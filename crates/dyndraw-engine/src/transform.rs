//! Model/view/projection math for the `MVP` uniform.
//!
//! Matrices are built with GL conventions (right-handed, clip z in [-1, 1]) and
//! converted to wgpu clip space (z in [0, 1]) as the last step.

use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Perspective camera looking down -Z from `distance` units in front of the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub fov_y: Deg<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: Deg(90.0),
            aspect: 1.0,
            near: 0.1,
            far: 1024.0,
            distance: 4.0,
        }
    }
}

impl Camera {
    /// Updates the aspect ratio from a framebuffer size; zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        let projection = cgmath::perspective(self.fov_y, self.aspect, self.near, self.far);
        let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -self.distance));
        OPENGL_TO_WGPU_MATRIX * projection * view
    }
}

/// Constant-rate rotation about a fixed axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spin {
    pub axis: Vector3<f32>,
    /// Degrees per second.
    pub rate: f32,
    angle: Deg<f32>,
}

impl Spin {
    pub fn new(axis: [f32; 3], rate: f32) -> Self {
        Self {
            axis: axis.into(),
            rate,
            angle: Deg(0.0),
        }
    }

    /// Current angle, wrapped to `[0, 360)`.
    pub fn angle(&self) -> Deg<f32> {
        self.angle
    }

    pub fn advance(&mut self, dt: f32) {
        self.angle = Deg((self.angle.0 + self.rate * dt).rem_euclid(360.0));
    }

    /// Model matrix; a degenerate axis yields identity.
    pub fn model(&self) -> Matrix4<f32> {
        if self.axis.magnitude2() <= f32::EPSILON {
            return Matrix4::identity();
        }
        Matrix4::from_axis_angle(self.axis.normalize(), self.angle)
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::new([1.0, 0.0, 1.25], 30.0)
    }
}

/// Column-major `MVP` ready for upload.
pub fn mvp(camera: &Camera, model: Matrix4<f32>) -> [[f32; 4]; 4] {
    (camera.view_projection() * model).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn project(m: [[f32; 4]; 4], p: [f32; 3]) -> [f32; 3] {
        let clip = Matrix4::from(m) * Vector4::new(p[0], p[1], p[2], 1.0);
        [clip.x / clip.w, clip.y / clip.w, clip.z / clip.w]
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let ndc = project(mvp(&Camera::default(), Matrix4::identity()), [0.0; 3]);
        assert!(ndc[0].abs() < 1e-6);
        assert!(ndc[1].abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc[2]));
    }

    #[test]
    fn cube_corner_lands_inside_clip_volume() {
        // Front corner sits 3 units from the eye; 90 degree fov gives x = y = 1/3.
        let ndc = project(mvp(&Camera::default(), Matrix4::identity()), [1.0, 1.0, 1.0]);
        assert!((ndc[0] - 1.0 / 3.0).abs() < 1e-5);
        assert!((ndc[1] - 1.0 / 3.0).abs() < 1e-5);
        assert!(ndc[2] > 0.0 && ndc[2] < 1.0);
    }

    #[test]
    fn spin_wraps_angle() {
        let mut spin = Spin::new([0.0, 1.0, 0.0], 90.0);
        spin.advance(5.0);
        assert!((spin.angle().0 - 90.0).abs() < 1e-4);
    }

    #[test]
    fn zero_axis_spin_is_identity() {
        let mut spin = Spin::new([0.0, 0.0, 0.0], 45.0);
        spin.advance(1.0);
        assert_eq!(spin.model(), Matrix4::identity());
    }

    #[test]
    fn aspect_ignores_zero_size() {
        let mut camera = Camera::default();
        camera.set_viewport(0, 300);
        assert_eq!(camera.aspect, 1.0);
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
    }
}
