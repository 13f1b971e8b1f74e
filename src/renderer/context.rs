//! Per-frame draw-list assembly. Everything here is plain data so the pass
//! recording code never touches the ECS directly.

use crate::asset::Handle;
use crate::renderer::uniforms::{BillboardInstance, FrameUniform, MeshInstance, OverlayVertex};
use crate::renderer::{Mesh, Texture};
use crate::scene::components::{DiffuseTexture, MeshComponent, TransformComponent, UvScale};
use glam::Vec2;
use hecs::World;

/// One mesh draw: which buffers to bind and which instance slot carries its
/// transforms.
#[derive(Clone, Copy)]
pub struct MeshDraw {
    pub mesh: Handle<Mesh>,
    pub texture: Handle<Texture>,
    pub instance: u32,
}

/// Everything the render passes consume for one frame.
pub struct FrameInputs<'a> {
    pub uniform: FrameUniform,
    pub mesh_draws: &'a [MeshDraw],
    pub mesh_instances: &'a [MeshInstance],
    pub billboards: &'a [BillboardInstance],
    pub overlay: &'a [OverlayVertex],
}

/// Collects every textured mesh entity into a draw list plus a parallel
/// instance array. Draw `i` reads instance slot `draws[i].instance`, which
/// both the shadow and forward passes share.
pub fn build_mesh_draws(world: &World) -> (Vec<MeshDraw>, Vec<MeshInstance>) {
    let mut draws = Vec::new();
    let mut instances = Vec::new();

    for (_entity, (mesh, texture, transform, uv_scale)) in world
        .query::<(
            &MeshComponent,
            &DiffuseTexture,
            &TransformComponent,
            Option<&UvScale>,
        )>()
        .iter()
    {
        let model = transform.0.matrix();
        let normal = glam::Mat4::from_mat3(transform.0.normal_matrix());
        let uv = uv_scale.map_or(Vec2::ONE, |s| s.0);

        draws.push(MeshDraw {
            mesh: mesh.0,
            texture: texture.0,
            instance: instances.len() as u32,
        });
        instances.push(MeshInstance::new(model, normal, uv));
    }

    (draws, instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::components::{LocalBounds, Name, PointLight};
    use crate::scene::picking::Aabb;
    use crate::scene::Transform;
    use glam::Vec3;

    fn spawn_mesh(world: &mut World, uv_scale: Option<Vec2>) {
        let entity = world.spawn((
            Name::new("thing"),
            MeshComponent(Handle::new(0)),
            DiffuseTexture(Handle::new(0)),
            TransformComponent(Transform::default()),
            LocalBounds(Aabb {
                min: Vec3::splat(-0.5),
                max: Vec3::splat(0.5),
            }),
        ));
        if let Some(scale) = uv_scale {
            world.insert_one(entity, UvScale(scale)).unwrap();
        }
    }

    #[test]
    fn draws_and_instances_stay_parallel() {
        let mut world = World::new();
        spawn_mesh(&mut world, None);
        spawn_mesh(&mut world, Some(Vec2::splat(2.0)));
        spawn_mesh(&mut world, None);

        let (draws, instances) = build_mesh_draws(&world);
        assert_eq!(draws.len(), 3);
        assert_eq!(instances.len(), 3);
        for (i, draw) in draws.iter().enumerate() {
            assert_eq!(draw.instance as usize, i);
        }
    }

    #[test]
    fn lights_without_meshes_are_not_drawn() {
        let mut world = World::new();
        world.spawn((
            TransformComponent(Transform::default()),
            PointLight::ordinary(Vec3::ONE, 0.5),
        ));

        let (draws, _) = build_mesh_draws(&world);
        assert!(draws.is_empty());
    }

    #[test]
    fn uv_scale_defaults_to_one() {
        let mut world = World::new();
        spawn_mesh(&mut world, None);
        spawn_mesh(&mut world, Some(Vec2::new(2.0, 3.0)));

        let (_, instances) = build_mesh_draws(&world);
        assert_eq!(instances[0].uv_scale[..2], [1.0, 1.0]);
        assert_eq!(instances[1].uv_scale[..2], [2.0, 3.0]);
    }
}
