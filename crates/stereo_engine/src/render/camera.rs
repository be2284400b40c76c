//! # Camera
//!
//! Picking and the construction tools only need a narrow view of the camera:
//! projecting world points to pixels, turning a pixel back into a ray, and the
//! combined projection-view matrix for renderers. That view is the
//! [`ViewCamera`] trait; [`Camera`] is the perspective implementation used by
//! hosts and saved with scene files.
//!
//! ## Coordinate System
//! Screen coordinates are pixels with the origin at the top-left corner and
//! Y growing downwards. The projection folds in the Y/Z flip for Vulkan's
//! clip space, so normalized device coordinates map to pixels directly:
//! `screen = (ndc + 1) / 2 * (width, height)`.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Transform, Vec2, Vec3, Vec4};
use crate::geometry::Ray;

/// Below this `|w|` a projected point is treated as lying at infinity
const W_EPSILON: f64 = 1e-8;

/// The camera interface consumed by picking and builders
pub trait ViewCamera {
    /// Unit direction of the ray through a screen position
    fn screen_to_world(&self, screen: Vec2) -> Vec3;

    /// Pixel position of a world point; non-finite when it cannot be projected
    fn world_to_screen(&self, world: Vec3) -> Vec2;

    /// Combined projection * view matrix
    fn proj_view_matrix(&self) -> Mat4;

    /// Camera position in world space
    fn translation(&self) -> Vec3;

    /// Viewport width in pixels
    fn width(&self) -> f64;

    /// Viewport height in pixels
    fn height(&self) -> f64;

    /// Ray from the camera through a screen position
    fn ray_through(&self, screen: Vec2) -> Ray {
        Ray::new(self.translation(), self.screen_to_world(screen))
    }
}

/// Camera pose as stored in scene files: `"x y z"` and `"w x y z"`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CameraSettings {
    /// Translation as three space-separated numbers
    pub translation: String,
    /// Rotation quaternion as four space-separated numbers, scalar first
    pub rotation: String,
}

/// Errors from parsing camera settings
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Malformed camera {field}: {value:?}")]
pub struct CameraSettingsError {
    /// Offending field
    pub field: &'static str,
    /// Raw value
    pub value: String,
}

fn parse_numbers<const N: usize>(field: &'static str, value: &str) -> Result<[f64; N], CameraSettingsError> {
    let err = || CameraSettingsError { field, value: value.to_string() };
    let numbers = value
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| err())?;
    numbers.try_into().map_err(|_| err())
}

/// Perspective camera
///
/// Looks along its local +Z axis with +Y up. Defaults follow the editor:
/// 100 degree vertical field of view, near plane 0.01, far plane 1000.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Position and orientation
    pub transform: Transform,

    /// Vertical field of view in degrees
    pub fov: f64,

    /// Distance to near clipping plane
    pub near: f64,

    /// Distance to far clipping plane
    pub far: f64,

    width: f64,
    height: f64,
}

impl Camera {
    /// Create a camera for a viewport
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            transform: Transform::from_translation(Vec3::new(-5.0, 2.0, -5.0)),
            fov: 100.0,
            near: 0.01,
            far: 1000.0,
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Set the viewport size; sizes below one pixel are ignored
    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 1.0 && height > 1.0 {
            self.width = width;
            self.height = height;
            log::trace!("Camera viewport resized to {}x{}", width, height);
        }
    }

    /// Move the camera
    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.translation = translation;
    }

    /// Orient the camera
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    /// World-to-camera matrix
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.transform.translation;
        Mat4::look_at(eye, eye + self.transform.forward(), self.transform.up())
    }

    /// Camera-to-clip matrix, including the Vulkan axis flip
    pub fn proj_matrix(&self) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.fov), self.width / self.height, self.near, self.far)
            * Mat4::vulkan_coordinate_transform()
    }

    /// Normalized device coordinates of a world point, `None` at infinity
    pub fn world_to_device(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.proj_view_matrix() * Vec4::new(world.x, world.y, world.z, 1.0);
        if clip.w.abs() < W_EPSILON {
            return None;
        }
        Some(clip.xyz() / clip.w)
    }

    /// World position `depth` units along the ray through a screen position
    pub fn click_position(&self, screen: Vec2, depth: f64) -> Vec3 {
        self.ray_through(screen).at(depth)
    }

    /// Pose for saving
    pub fn settings(&self) -> CameraSettings {
        let t = self.transform.translation;
        let q = self.transform.rotation.quaternion();
        CameraSettings {
            translation: format!("{} {} {}", t.x, t.y, t.z),
            rotation: format!("{} {} {} {}", q.w, q.i, q.j, q.k),
        }
    }

    /// Restore a saved pose
    pub fn apply_settings(&mut self, settings: &CameraSettings) -> Result<(), CameraSettingsError> {
        let [x, y, z] = parse_numbers::<3>("translation", &settings.translation)?;
        let [w, i, j, k] = parse_numbers::<4>("rotation", &settings.rotation)?;
        self.transform.translation = Vec3::new(x, y, z);
        self.transform.rotation = Quat::from_quaternion(nalgebra::Quaternion::new(w, i, j, k));
        Ok(())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl ViewCamera for Camera {
    fn screen_to_world(&self, screen: Vec2) -> Vec3 {
        let ndc_x = 2.0 * screen.x / self.width - 1.0;
        let ndc_y = 2.0 * screen.y / self.height - 1.0;
        let Some(inverse) = self.proj_view_matrix().try_inverse() else {
            return self.transform.forward();
        };
        let near = inverse * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let direction = far.xyz() / far.w - near.xyz() / near.w;
        direction.normalize()
    }

    fn world_to_screen(&self, world: Vec3) -> Vec2 {
        match self.world_to_device(world) {
            Some(ndc) => Vec2::new((ndc.x + 1.0) / 2.0 * self.width, (ndc.y + 1.0) / 2.0 * self.height),
            None => Vec2::new(f64::INFINITY, f64::INFINITY),
        }
    }

    fn proj_view_matrix(&self) -> Mat4 {
        self.proj_matrix() * self.view_matrix()
    }

    fn translation(&self) -> Vec3 {
        self.transform.translation
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera_at_origin() -> Camera {
        let mut camera = Camera::new(800.0, 600.0);
        camera.set_translation(Vec3::zeros());
        camera
    }

    #[test]
    fn test_point_ahead_projects_to_center() {
        let camera = camera_at_origin();
        let screen = camera.world_to_screen(Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(screen, Vec2::new(400.0, 300.0), epsilon = 1e-9);
    }

    #[test]
    fn test_point_above_projects_to_top_half() {
        let camera = camera_at_origin();
        let screen = camera.world_to_screen(Vec3::new(0.0, 1.0, 5.0));
        assert!(screen.y < 300.0);
    }

    #[test]
    fn test_screen_to_world_inverts_world_to_screen() {
        let camera = camera_at_origin();
        let target = Vec3::new(1.5, -0.5, 7.0);
        let screen = camera.world_to_screen(target);
        let ray = camera.ray_through(screen);
        assert_relative_eq!(ray.direction, target.normalize(), epsilon = 1e-9);
        assert_relative_eq!(camera.click_position(screen, target.norm()), target, epsilon = 1e-9);
    }

    #[test]
    fn test_point_in_camera_plane_is_not_finite() {
        let camera = camera_at_origin();
        let screen = camera.world_to_screen(Vec3::new(1.0, 0.0, 0.0));
        assert!(!screen.x.is_finite());
    }

    #[test]
    fn test_settings_round_trip() {
        let mut camera = Camera::default();
        camera.set_translation(Vec3::new(1.0, -2.5, 3.0));
        camera.set_rotation(Quat::from_euler_angles(0.1, 0.2, 0.3));
        let settings = camera.settings();

        let mut restored = Camera::default();
        restored.apply_settings(&settings).expect("valid settings");
        assert_relative_eq!(restored.translation(), camera.translation(), epsilon = 1e-12);
        assert_relative_eq!(
            restored.transform.rotation.quaternion().coords,
            camera.transform.rotation.quaternion().coords,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_malformed_settings_are_rejected() {
        let mut camera = Camera::default();
        let settings = CameraSettings { translation: "1 2".to_string(), rotation: "1 0 0 0".to_string() };
        let err = camera.apply_settings(&settings).unwrap_err();
        assert_eq!(err.field, "translation");
    }
}
