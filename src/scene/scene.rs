use crate::asset::Assets;
use crate::renderer::mesh::{cube_data, plane_data};
use crate::renderer::{Mesh, Renderer, Texture};
use crate::scene::components::*;
use glam::{Vec2, Vec3};
use hecs::World;
use std::f32::consts::TAU;

/// Entity registry plus the shared mesh/texture store. Entities are created
/// during population and live until process exit.
pub struct Scene {
    pub world: World,
    pub assets: Assets,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            assets: Assets::default(),
        }
    }

    /// Spawns the demo scene: a plate on a stone floor, a ring of six
    /// colored orbiting lights and a single sun light.
    pub fn populate(&mut self, renderer: &Renderer) {
        let device = renderer.device();
        let queue = renderer.queue();
        let layout = renderer.texture_layout();

        let white = self.assets.add_texture(Texture::from_pixel(
            device,
            queue,
            layout,
            [255, 255, 255, 255],
            "white",
        ));
        let stone = self.assets.add_texture(Texture::checkerboard(
            device,
            queue,
            layout,
            [142, 135, 125, 255],
            [110, 104, 96, 255],
            "stone",
        ));

        let cube_mesh = cube_data();
        let plane_mesh = plane_data();
        let cube_bounds = cube_mesh.bounds();
        let plane_bounds = plane_mesh.bounds();
        let cube = self.assets.add_mesh(Mesh::from_data(device, &cube_mesh, "cube"));
        let plane = self
            .assets
            .add_mesh(Mesh::from_data(device, &plane_mesh, "floor"));

        self.world.spawn((
            Name::new("Plate"),
            TransformComponent(crate::scene::Transform::from_trs(
                Vec3::new(0.0, 0.3, 5.0),
                Vec3::new(std::f32::consts::PI, 0.0, 0.0),
                Vec3::splat(0.4),
            )),
            MeshComponent(cube),
            LocalBounds(cube_bounds),
            DiffuseTexture(white),
            UvScale(Vec2::ONE),
        ));

        self.world.spawn((
            Name::new("Floor"),
            TransformComponent(crate::scene::Transform::from_trs(
                Vec3::new(0.0, 0.7, 5.0),
                Vec3::ZERO,
                Vec3::new(5.0, 1.0, 5.0),
            )),
            MeshComponent(plane),
            LocalBounds(plane_bounds),
            DiffuseTexture(stone),
            UvScale(Vec2::splat(2.0)),
        ));

        let light_colors = [
            Vec3::new(1.0, 0.1, 0.1),
            Vec3::new(0.1, 0.1, 1.0),
            Vec3::new(0.1, 1.0, 0.1),
            Vec3::new(1.0, 1.0, 0.1),
            Vec3::new(0.1, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        let ring_center = Vec3::new(0.0, 0.0, 5.0);
        for (i, color) in light_colors.iter().enumerate() {
            let angle = i as f32 * TAU / light_colors.len() as f32;
            let offset = glam::Mat3::from_axis_angle(Vec3::new(0.0, -1.0, 0.0), angle)
                * Vec3::new(-1.5, -1.0, -1.5);
            self.world.spawn((
                Name::new(format!("Light_{i}")),
                TransformComponent(crate::scene::Transform::from_trs(
                    ring_center + offset,
                    Vec3::ZERO,
                    Vec3::splat(0.1),
                )),
                PointLight::ordinary(*color, 0.5),
            ));
        }

        self.world.spawn((
            Name::new("Sun"),
            TransformComponent(crate::scene::Transform::from_trs(
                Vec3::new(-30.0, -60.0, -30.0),
                Vec3::ZERO,
                Vec3::splat(5.0),
            )),
            PointLight::sun(Vec3::new(0.98, 1.0, 0.95), 10000.0),
        ));

        log::info!("Scene populated with {} entities", self.world.len());
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
