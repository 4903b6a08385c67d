use glam::{Mat4, Quat, Vec3};

/// A perspective camera with an orthonormal look/up/right basis.
///
/// The view matrix is rebuilt after every pose change, and the projection
/// after every call to [`Camera::set_projection_matrix`]. Projection uses the
/// right-handed, `0..1` depth convention wgpu expects.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    position: Vec3,
    look: Vec3,
    up: Vec3,
    right: Vec3,

    aspect: f32,
    near: f32,
    far: f32,
    fov_y: f32,

    view: Mat4,
    proj: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            look: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            aspect: 1.0,
            near: 0.1,
            far: 10.0,
            fov_y: std::f32::consts::FRAC_PI_4,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };
        camera.rebuild_view();
        camera.rebuild_projection();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the pose and derives an orthonormal basis from `look` and `up`.
    ///
    /// Neither vector needs to be unit length. `look` parallel to `up` has no
    /// defined basis and must be avoided by the caller.
    pub fn set_view_matrix(&mut self, position: Vec3, look: Vec3, up: Vec3) {
        self.position = position;
        self.look = look;
        self.up = up;
        self.orthonormalize();
        self.rebuild_view();
    }

    /// Rebuilds the perspective projection. `fov_y` is the vertical field of
    /// view in radians.
    pub fn set_projection_matrix(&mut self, aspect: f32, near: f32, far: f32, fov_y: f32) {
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.fov_y = fov_y;
        self.rebuild_projection();
    }

    /// Changes only the aspect ratio, keeping the clip planes and field of view.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.set_projection_matrix(aspect, self.near, self.far, self.fov_y);
    }

    /// Changes only the clip planes.
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.set_projection_matrix(self.aspect, near, far, self.fov_y);
    }

    /// Yaws the basis about the world up axis (+Y).
    pub fn rotate_around_up(&mut self, angle: f32) {
        self.rotate(Quat::from_axis_angle(Vec3::Y, angle));
    }

    /// Pitches the basis about the camera's right axis.
    pub fn rotate_around_right(&mut self, angle: f32) {
        self.rotate(Quat::from_axis_angle(self.right, angle));
    }

    /// Moves the camera by a world-space offset.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.rebuild_view();
    }

    fn rotate(&mut self, rotation: Quat) {
        self.look = rotation * self.look;
        self.up = rotation * self.up;
        self.orthonormalize();
        self.rebuild_view();
    }

    /// Re-derives right, then up, from the current look so the basis cannot drift.
    fn orthonormalize(&mut self) {
        self.look = self.look.normalize();
        self.right = self.look.cross(self.up).normalize();
        self.up = self.right.cross(self.look);
    }

    fn rebuild_view(&mut self) {
        self.view = Mat4::look_to_rh(self.position, self.look, self.up);
    }

    fn rebuild_projection(&mut self) {
        self.proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look(&self) -> Vec3 {
        self.look
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// The look direction projected onto the horizontal plane, or zero when
    /// looking straight up or down.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(self.look.x, 0.0, self.look.z).normalize_or_zero()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj
    }

    pub fn view_projection(&self) -> Mat4 {
        self.proj * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(camera: &Camera) {
        assert_relative_eq!(camera.look().length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.up().length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.right().length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.look().dot(camera.up()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.look().dot(camera.right()), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.up().dot(camera.right()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn view_basis_is_renormalized() {
        let mut camera = Camera::new();
        camera.set_view_matrix(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, -1.0, -4.0), Vec3::new(0.0, 3.0, 0.0));
        assert_orthonormal(&camera);
        assert!(camera.up().y > 0.0);
    }

    #[test]
    fn view_matrix_moves_the_eye_to_the_origin() {
        let mut camera = Camera::new();
        camera.set_view_matrix(Vec3::new(4.0, -1.0, 2.0), Vec3::X, Vec3::Y);

        let eye = camera.view_matrix().transform_point3(camera.position());
        assert_relative_eq!(eye.length(), 0.0, epsilon = 1e-5);

        let ahead = camera.view_matrix().transform_point3(Vec3::new(5.0, -1.0, 2.0));
        assert_relative_eq!(ahead.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn rotations_keep_the_basis_orthonormal() {
        let mut camera = Camera::new();
        camera.set_view_matrix(Vec3::ZERO, Vec3::new(0.3, 0.2, -1.0), Vec3::Y);

        for step in 0..2000 {
            let angle = 0.013 * (step % 7) as f32 - 0.03;
            if step % 3 == 0 {
                camera.rotate_around_right(angle);
            } else {
                camera.rotate_around_up(angle * 1.7);
            }
        }

        assert_orthonormal(&camera);
    }

    #[test]
    fn yaw_by_quarter_turn_faces_negative_x() {
        let mut camera = Camera::new();
        camera.rotate_around_up(std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(camera.look().x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.up().y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn flat_forward_ignores_pitch() {
        let mut camera = Camera::new();
        camera.rotate_around_right(0.6);
        let forward = camera.flat_forward();
        assert_eq!(forward.y, 0.0);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn translate_moves_position_only() {
        let mut camera = Camera::new();
        let look = camera.look();
        camera.translate(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.position(), Vec3::new(0.0, 1.0, 3.0));
        assert_eq!(camera.look(), look);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let mut camera = Camera::new();
        camera.set_projection_matrix(16.0 / 9.0, 0.5, 50.0, 1.0);
        let clip = camera.projection_matrix() * glam::Vec4::new(0.0, 0.0, -0.5, 1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.aspect(), 16.0 / 9.0);
    }
}
