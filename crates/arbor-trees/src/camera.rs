//! Camera collaborator: position, orientation, and sphere visibility.
//!
//! The drawer only talks to cameras through [`ViewCamera`]. [`Camera`] is a
//! plain perspective camera whose frustum planes are extracted from the
//! view-projection matrix with the Griggs-Hartmann method.

use glam::{Mat4, Vec3, Vec4};

/// What the tree drawer needs from a camera.
pub trait ViewCamera {
    /// Eye position in world space.
    fn position(&self) -> Vec3;

    /// Unit view direction.
    fn forward(&self) -> Vec3;

    /// Unit right vector.
    fn right(&self) -> Vec3;

    /// Unit up vector.
    fn up(&self) -> Vec3;

    /// Whether a sphere is at least partially inside the view volume.
    fn in_view(&self, center: Vec3, radius: f32) -> bool;
}

/// Perspective camera with cached frustum planes.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    /// Left, right, bottom, top, near, far; normals point inwards.
    planes: [Vec4; 6],
}

impl Camera {
    /// Create a camera at `position` looking along `forward`.
    ///
    /// `fov_y` is in radians. A zero `forward` falls back to `-Z`.
    pub fn new(position: Vec3, forward: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            fov_y,
            aspect,
            near,
            far,
            planes: [Vec4::ZERO; 6],
        };
        camera.look_to(position, forward);
        camera
    }

    /// Move the camera and point it along `forward`.
    pub fn look_to(&mut self, position: Vec3, forward: Vec3) {
        self.position = position;
        self.forward = forward.try_normalize().unwrap_or(Vec3::NEG_Z);

        // Looking straight up or down leaves world-up parallel to the view.
        let world_up = if self.forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        self.right = self.forward.cross(world_up).normalize();
        self.up = self.right.cross(self.forward);

        let view = Mat4::look_to_rh(self.position, self.forward, self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        self.planes = extract_planes(&(proj * view));
    }

    /// View-projection matrix for the current pose.
    pub fn view_projection(&self) -> Mat4 {
        let view = Mat4::look_to_rh(self.position, self.forward, self.up);
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far) * view
    }
}

/// Frustum planes for a `[0, 1]` depth range projection.
fn extract_planes(vp: &Mat4) -> [Vec4; 6] {
    let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];
    let mut planes = [
        rows[3] + rows[0],
        rows[3] - rows[0],
        rows[3] + rows[1],
        rows[3] - rows[1],
        rows[2],
        rows[3] - rows[2],
    ];
    for plane in &mut planes {
        let len = plane.truncate().length();
        if len > 0.0 {
            *plane /= len;
        }
    }
    planes
}

impl ViewCamera for Camera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn right(&self) -> Vec3 {
        self.right
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn in_view(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}
