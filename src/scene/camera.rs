use glam::{Mat4, Vec3, Vec4};

/// Projection / view matrix holder. Pure math, no state machine.
///
/// The projection uses a left-handed, zero-to-one depth convention (the
/// world is y-down, +Z forward), which matches wgpu's depth range directly.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    pub fn set_perspective_projection(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        debug_assert!(aspect > f32::EPSILON);
        // wgpu clip space is y-up while the world is y-down. Negating the
        // projection's y row puts world-up at the top of the framebuffer;
        // pipelines compensate with a clockwise front face.
        let mut projection = Mat4::perspective_lh(fov_y, aspect, near, far);
        projection.y_axis.y = -projection.y_axis.y;
        self.projection = projection;
    }

    /// Rebuilds view and inverse-view from a position and Y-X-Z Euler
    /// rotation, without going through a matrix inversion.
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let (s1, c1) = rotation.y.sin_cos();
        let (s2, c2) = rotation.x.sin_cos();
        let (s3, c3) = rotation.z.sin_cos();
        let u = Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1);
        let v = Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3);
        let w = Vec3::new(c2 * s1, -s2, c1 * c2);

        self.view = Mat4::from_cols(
            Vec4::new(u.x, v.x, w.x, 0.0),
            Vec4::new(u.y, v.y, w.y, 0.0),
            Vec4::new(u.z, v.z, w.z, 0.0),
            Vec4::new(-u.dot(position), -v.dot(position), -w.dot(position), 1.0),
        );
        self.inverse_view = Mat4::from_cols(
            u.extend(0.0),
            v.extend(0.0),
            w.extend(0.0),
            position.extend(1.0),
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn inverse_view(&self) -> Mat4 {
        self.inverse_view
    }

    pub fn position(&self) -> Vec3 {
        self.inverse_view.w_axis.truncate()
    }
}
