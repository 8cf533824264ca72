use glam::Mat4;

use crate::math::{Frustum, Transform};

/// Perspective camera owned by a scene.
///
/// The camera is not a scene-graph primitive; the host drives its transform
/// directly (or copies one from a primitive) and the render passes pull
/// matrices and the culling frustum from here.
#[derive(Debug, Clone)]
pub struct Camera {
    fov_y: f32,
    aspect_ratio: f32,
    z_near: f32,
    z_far: f32,
    transform: Transform,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    view_projection_matrix: Mat4,
    frustum: Frustum,
}

impl Camera {
    /// Creates a camera with a vertical field of view in radians.
    #[must_use]
    pub fn new(fov_y: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        let mut camera = Self {
            fov_y,
            aspect_ratio,
            z_near,
            z_far,
            transform: Transform::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
        };
        camera.rebuild();
        camera
    }

    /// World transform of the camera.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Moves the camera.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.rebuild();
    }

    /// Changes the projection parameters.
    pub fn set_perspective(&mut self, fov_y: f32, aspect_ratio: f32, z_near: f32, z_far: f32) {
        self.fov_y = fov_y;
        self.aspect_ratio = aspect_ratio;
        self.z_near = z_near;
        self.z_far = z_far;
        self.rebuild();
    }

    /// Vertical field of view in radians.
    #[must_use]
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Width over height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Near plane distance.
    #[must_use]
    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    /// Far plane distance.
    #[must_use]
    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// World-to-camera matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    /// Camera-to-clip matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    /// World-to-clip matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }

    /// Culling frustum of the current view.
    #[must_use]
    pub fn frustum(&self) -> Frustum {
        self.frustum
    }

    fn rebuild(&mut self) {
        self.view_matrix = self.transform.to_mat4().inverse();
        self.projection_matrix =
            Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.z_near, self.z_far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(&self.view_projection_matrix);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0)
    }
}
