// scene/components.rs
// Pure hecs components - no custom entity system

use crate::asset::Handle;
use crate::renderer::{Mesh, Texture};
use crate::scene::picking::Aabb;
use crate::scene::Transform;
use glam::{Vec2, Vec3};

/// Name used for persistence matching and the HUD.
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Transform component (position, rotation, scale)
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// Mesh component
#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub Handle<Mesh>);

/// Diffuse texture component
#[derive(Debug, Clone, Copy)]
pub struct DiffuseTexture(pub Handle<Texture>);

/// Per-object UV tiling factor for the forward shader.
#[derive(Debug, Clone, Copy)]
pub struct UvScale(pub Vec2);

impl Default for UvScale {
    fn default() -> Self {
        Self(Vec2::ONE)
    }
}

/// Local-space bounding box, fixed at spawn time from the mesh data.
/// Read by raycast picking and the edit-mode overlay.
#[derive(Debug, Clone, Copy)]
pub struct LocalBounds(pub Aabb);

/// Role of a point light in the frame uniform. The sun is packed
/// unconditionally and drives nothing but the last uniform slot; ordinary
/// lights orbit and fill the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Sun,
    Ordinary,
}

/// Point light component. The billboard quad half-extent comes from the
/// entity's transform scale, not from here.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl PointLight {
    pub fn ordinary(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Ordinary,
        }
    }

    pub fn sun(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Sun,
        }
    }
}
