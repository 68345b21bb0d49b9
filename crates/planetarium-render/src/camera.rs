//! Perspective camera with reverse-Z projection.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Camera data shared by every 3D pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// World-space camera position (w unused).
    pub camera_pos: [f32; 4],
}

/// A perspective camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Orientation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// A camera at `position` looking down -Z, with the field of view in degrees.
    pub fn perspective(fov_y_degrees: f32, aspect_ratio: f32, near: f32, far: f32, position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect_ratio,
            near,
            far,
        }
    }

    /// View matrix (inverse of the camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Projection matrix with reverse-Z: near maps to 1, far maps to 0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Inverse of the rotation-only view-projection, for reconstructing view
    /// directions of a backdrop at infinite distance.
    pub fn sky_inverse_view_projection(&self) -> Mat4 {
        let rotation_only = Mat4::from_quat(self.rotation.inverse());
        (self.projection_matrix() * rotation_only).inverse()
    }

    /// Update the aspect ratio. Ignores degenerate sizes.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    /// GPU representation.
    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            camera_pos: self.position.extend(1.0).to_array(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(75.0, 16.0 / 9.0, 0.1, 100.0, Vec3::new(0.0, 0.0, 9.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn ndc(camera: &Camera, point: Vec3) -> Vec3 {
        let clip = camera.view_projection_matrix() * point.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn test_default_camera_matches_scene_setup() {
        let camera = Camera::default();
        assert!((camera.fov_y - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 100.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 9.0));
        assert!((camera.rotation * Vec3::NEG_Z - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_reverse_z_near_is_one_far_is_zero() {
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0, Vec3::ZERO);
        let near = ndc(&camera, Vec3::new(0.0, 0.0, -0.1));
        let far = ndc(&camera, Vec3::new(0.0, 0.0, -100.0));
        assert!((near.z - 1.0).abs() < 1e-4);
        assert!(far.z.abs() < 1e-4);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = Camera::default();
        let p = ndc(&camera, Vec3::ZERO);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
        camera.set_aspect_ratio(0.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_sky_matrix_ignores_translation() {
        let mut a = Camera::default();
        let mut b = Camera::default();
        a.position = Vec3::ZERO;
        b.position = Vec3::new(30.0, -4.0, 12.0);
        let center = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let da = a.sky_inverse_view_projection() * center;
        let db = b.sky_inverse_view_projection() * center;
        let da = (da.truncate() / da.w).normalize();
        let db = (db.truncate() / db.w).normalize();
        assert!((da - db).length() < 1e-5);
        assert!((da - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_uniform_layout_is_80_bytes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        let u = Camera::default().to_uniform();
        assert_eq!(u.camera_pos, [0.0, 0.0, 9.0, 1.0]);
    }
}
