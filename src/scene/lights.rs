//! Per-frame light aggregation: orbit animation, uniform packing and
//! billboard draw ordering.

use crate::scene::components::{LightKind, PointLight, TransformComponent};
use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use hecs::World;

use crate::renderer::uniforms::{PackedLight, MAX_LIGHTS};

/// Angular rate of the ordinary-light orbit, radians per second about the
/// world's vertical axis (y-down, so the axis is (0,-1,0)).
pub const ORBIT_RATE: f32 = 0.5;

/// Packed light array for the frame uniform plus the number of slots
/// actually written.
#[derive(Clone, Copy)]
pub struct PackedLights {
    pub lights: [PackedLight; MAX_LIGHTS],
    pub count: u32,
}

impl Default for PackedLights {
    fn default() -> Self {
        Self {
            lights: [PackedLight::zeroed(); MAX_LIGHTS],
            count: 0,
        }
    }
}

/// Advances the light orbit animation and packs lights for the frame
/// uniform.
///
/// Ordinary lights are rotated in place about the vertical axis and packed
/// first, into at most `MAX_LIGHTS - 1` slots; once capacity is reached the
/// remaining ordinary lights are left untouched for this frame. The sun, if
/// present, always takes the next slot - it is never dropped, even when
/// ordinary lights would fill the buffer.
///
/// Transforms are mutated here, so this must run before the billboard order
/// is computed and before the uniform buffer write for the same frame.
pub fn update_lights(world: &mut World, dt: f32) -> PackedLights {
    let mut ordinary: Vec<hecs::Entity> = Vec::new();
    let mut sun: Option<hecs::Entity> = None;

    for (entity, light) in world.query::<&PointLight>().iter() {
        match light.kind {
            LightKind::Sun => sun = Some(entity),
            LightKind::Ordinary => ordinary.push(entity),
        }
    }

    let orbit = Mat4::from_axis_angle(Vec3::new(0.0, -1.0, 0.0), ORBIT_RATE * dt);
    let mut packed = PackedLights::default();

    for entity in ordinary {
        if packed.count as usize >= MAX_LIGHTS - 1 {
            break;
        }
        let position = {
            let Ok(mut transform) = world.get::<&mut TransformComponent>(entity) else {
                continue;
            };
            transform.0.translation = orbit.transform_point3(transform.0.translation);
            transform.0.translation
        };
        let Ok(light) = world.get::<&PointLight>(entity) else {
            continue;
        };
        packed.lights[packed.count as usize] =
            PackedLight::new(position, light.color, light.intensity);
        packed.count += 1;
    }

    if let Some(entity) = sun {
        if let (Ok(transform), Ok(light)) = (
            world.get::<&TransformComponent>(entity),
            world.get::<&PointLight>(entity),
        ) {
            packed.lights[packed.count as usize] =
                PackedLight::new(transform.0.translation, light.color, light.intensity);
            packed.count += 1;
        }
    }

    packed
}

/// One billboard quad, drawn with position/color/radius as per-draw data.
/// The radius is the entity's x scale, matching how the demo scene sizes
/// its light markers.
#[derive(Clone, Copy, Debug)]
pub struct BillboardDraw {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

/// Billboards are alpha blended, so they must be composited back-to-front.
/// Returns all light entities ordered by descending squared distance to the
/// camera; equal distances keep world iteration order (stable sort).
pub fn billboard_draw_list(world: &World, camera_position: Vec3) -> Vec<BillboardDraw> {
    let mut draws: Vec<(f32, BillboardDraw)> = world
        .query::<(&PointLight, &TransformComponent)>()
        .iter()
        .map(|(_entity, (light, transform))| {
            let offset = camera_position - transform.0.translation;
            (
                offset.length_squared(),
                BillboardDraw {
                    position: transform.0.translation,
                    color: light.color,
                    intensity: light.intensity,
                    radius: transform.0.scale.x,
                },
            )
        })
        .collect();

    draws.sort_by(|a, b| b.0.total_cmp(&a.0));
    draws.into_iter().map(|(_, draw)| draw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    fn spawn_light(world: &mut World, position: Vec3, light: PointLight) -> hecs::Entity {
        world.spawn((
            TransformComponent(Transform::from_trs(position, Vec3::ZERO, Vec3::ONE)),
            light,
        ))
    }

    fn spawn_ordinary_ring(world: &mut World, count: usize) {
        for i in 0..count {
            spawn_light(
                world,
                Vec3::new(i as f32 + 1.0, -1.0, 0.0),
                PointLight::ordinary(Vec3::ONE, 0.5),
            );
        }
    }

    #[test]
    fn packs_all_lights_when_under_capacity() {
        let mut world = World::new();
        spawn_ordinary_ring(&mut world, 4);
        let packed = update_lights(&mut world, 0.016);
        assert_eq!(packed.count, 4);
    }

    #[test]
    fn ordinary_lights_cap_at_one_below_capacity() {
        let mut world = World::new();
        spawn_ordinary_ring(&mut world, MAX_LIGHTS + 3);
        let packed = update_lights(&mut world, 0.016);
        assert_eq!(packed.count as usize, MAX_LIGHTS - 1);
    }

    #[test]
    fn sun_is_packed_even_when_ordinary_lights_overflow() {
        let mut world = World::new();
        spawn_ordinary_ring(&mut world, MAX_LIGHTS + 3);
        let sun_color = Vec3::new(0.98, 1.0, 0.95);
        spawn_light(
            &mut world,
            Vec3::new(-30.0, -60.0, -30.0),
            PointLight::sun(sun_color, 10000.0),
        );

        let packed = update_lights(&mut world, 0.016);
        assert_eq!(packed.count as usize, MAX_LIGHTS);

        let last = packed.lights[MAX_LIGHTS - 1];
        assert_eq!(last.color[3], 10000.0);
        assert_eq!(last.position[..3], [-30.0, -60.0, -30.0]);
    }

    #[test]
    fn packed_count_formula_holds() {
        for k in [0usize, 1, 5, 9, 12] {
            for sun in [false, true] {
                let mut world = World::new();
                spawn_ordinary_ring(&mut world, k);
                if sun {
                    spawn_light(
                        &mut world,
                        Vec3::new(0.0, -10.0, 0.0),
                        PointLight::sun(Vec3::ONE, 9000.0),
                    );
                }
                let packed = update_lights(&mut world, 0.01);
                let expected = k.min(MAX_LIGHTS - 1) + usize::from(sun);
                assert_eq!(packed.count as usize, expected, "k={k} sun={sun}");
            }
        }
    }

    #[test]
    fn orbit_preserves_distance_to_axis() {
        let mut world = World::new();
        let entity = spawn_light(
            &mut world,
            Vec3::new(-1.5, -1.0, -1.5),
            PointLight::ordinary(Vec3::ONE, 0.5),
        );

        update_lights(&mut world, 0.25);

        let transform = world.get::<&TransformComponent>(entity).unwrap();
        let p = transform.0.translation;
        let radius = (p.x * p.x + p.z * p.z).sqrt();
        let expected = (1.5f32 * 1.5 + 1.5 * 1.5).sqrt();
        assert!((radius - expected).abs() < 1e-5);
        assert!((p.y + 1.0).abs() < 1e-6);
        // A quarter second at 0.5 rad/s actually moved the light.
        assert!(!p.abs_diff_eq(Vec3::new(-1.5, -1.0, -1.5), 1e-6));
    }

    #[test]
    fn sun_does_not_orbit() {
        let mut world = World::new();
        let sun = spawn_light(
            &mut world,
            Vec3::new(-30.0, -60.0, -30.0),
            PointLight::sun(Vec3::ONE, 10000.0),
        );
        update_lights(&mut world, 0.5);
        let transform = world.get::<&TransformComponent>(sun).unwrap();
        assert_eq!(transform.0.translation, Vec3::new(-30.0, -60.0, -30.0));
    }

    #[test]
    fn billboards_are_ordered_back_to_front() {
        let mut world = World::new();
        for z in [2.0f32, 9.0, 5.0, 7.0, 1.0] {
            spawn_light(
                &mut world,
                Vec3::new(0.0, 0.0, z),
                PointLight::ordinary(Vec3::ONE, 0.5),
            );
        }

        let camera = Vec3::ZERO;
        let draws = billboard_draw_list(&world, camera);
        assert_eq!(draws.len(), 5);

        let mut previous = f32::INFINITY;
        for draw in &draws {
            let d = (camera - draw.position).length_squared();
            assert!(d <= previous, "draw order must be non-increasing in distance");
            previous = d;
        }
        assert_eq!(draws[0].position.z, 9.0);
        assert_eq!(draws[4].position.z, 1.0);
    }
}
