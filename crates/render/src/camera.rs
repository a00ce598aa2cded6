use glam::{Mat4, Vec3};

/// Perspective camera looking from `position` at `target`.
///
/// The projection matrix is cached; call [`update_projection_matrix`] after
/// changing `fov_degrees`, `aspect`, `near` or `far`.
///
/// [`update_projection_matrix`]: PerspectiveCamera::update_projection_matrix
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).try_normalize().unwrap_or(Vec3::X)
    }

    /// Camera-space up expressed in world space.
    pub fn camera_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 1.0, 10000.0);
        let before = cam.projection_matrix();
        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(45f32.to_radians(), 2.0, 1.0, 10000.0)
        );
    }

    #[test]
    fn basis_is_orthonormal() {
        let mut cam = PerspectiveCamera::new(45.0, 1.5, 1.0, 10000.0);
        cam.position = Vec3::new(250.0, 50.0, 250.0);
        cam.look_at(Vec3::new(0.0, 50.0, 0.0));
        let (f, r, u) = (cam.forward(), cam.right(), cam.camera_up());
        assert!(f.dot(r).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!((u.length() - 1.0).abs() < 1e-5);
        assert!(u.y > 0.99, "level camera keeps world up: {u:?}");
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut cam = PerspectiveCamera::new(45.0, 16.0 / 9.0, 1.0, 10000.0);
        cam.position = Vec3::new(250.0, 50.0, 250.0);
        cam.look_at(Vec3::new(0.0, 50.0, 0.0));
        let ndc = cam.view_projection().project_point3(Vec3::new(0.0, 50.0, 0.0));
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
