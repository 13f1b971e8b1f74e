use glam::{EulerRot, Mat3, Mat4, Vec3};

/// Translation, Euler rotation (Y-X-Z order) and scale.
///
/// Matrices are recomputed on every call; nothing is cached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_trs(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        )
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_mat3(self.rotation_matrix())
            * Mat4::from_scale(self.scale)
    }

    /// Inverse-transpose of the upper 3x3, expressed directly as
    /// rotation times reciprocal scale.
    pub fn normal_matrix(&self) -> Mat3 {
        self.rotation_matrix() * Mat3::from_diagonal(self.scale.recip())
    }
}
