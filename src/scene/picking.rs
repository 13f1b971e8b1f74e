//! Raycast selection against entity bounding boxes (edit mode only).

use crate::scene::components::{LocalBounds, MeshComponent, TransformComponent};
use glam::{Mat4, Vec2, Vec3, Vec4};
use hecs::World;

const PARALLEL_EPS: f32 = 1e-8;

/// Axis-aligned box in some local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Pads any degenerate axis so flat meshes still have pickable volume.
    pub fn inflated(mut self, eps: f32) -> Self {
        for axis in 0..3 {
            if self.max[axis] - self.min[axis] < eps {
                self.min[axis] -= eps * 0.5;
                self.max[axis] += eps * 0.5;
            }
        }
        self
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Slab test. Returns the entry distance along the ray, or `None` on a
    /// miss. A direction component near zero is treated as an immediate
    /// reject when the origin lies outside that slab and as "no constraint"
    /// otherwise, so axis-aligned rays never divide by zero.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < PARALLEL_EPS {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        if t_far < 0.0 {
            return None;
        }
        let entry = t_near.max(0.0);
        entry.is_finite().then_some(entry)
    }
}

/// World-space ray with a normalized direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Builds the world-space ray under the cursor: NDC through the inverse
    /// projection, then out of view space through the inverse view.
    pub fn from_cursor(
        cursor: Vec2,
        surface_size: Vec2,
        projection: Mat4,
        inverse_view: Mat4,
    ) -> Self {
        // Screen y grows downward; wgpu NDC y grows upward.
        let nx = (2.0 * cursor.x) / surface_size.x - 1.0;
        let ny = 1.0 - (2.0 * cursor.y) / surface_size.y;
        let clip = Vec4::new(nx, ny, 0.1, 1.0);
        let eye = projection.inverse() * clip;
        let eye = Vec4::new(eye.x, eye.y, 1.0, 0.0);
        let world = (inverse_view * eye).truncate().normalize();
        Self {
            origin: inverse_view.w_axis.truncate(),
            direction: world,
        }
    }
}

/// Tests the ray against every mesh entity's local bounds (transformed into
/// object space via the inverse model matrix) and returns the entity with
/// the smallest entry distance, or `None` when nothing is hit.
pub fn pick(world: &World, ray: &Ray) -> Option<hecs::Entity> {
    let mut best: Option<(f32, hecs::Entity)> = None;

    for (entity, (_, bounds, transform)) in world
        .query::<(&MeshComponent, &LocalBounds, &TransformComponent)>()
        .iter()
    {
        let inverse_model = transform.0.matrix().inverse();
        let local_origin = inverse_model.transform_point3(ray.origin);
        let local_direction = inverse_model.transform_vector3(ray.direction);

        if let Some(t) = bounds.0.intersect_ray(local_origin, local_direction) {
            if best.map_or(true, |(closest, _)| t < closest) {
                best = Some((t, entity));
            }
        }
    }

    best.map(|(_, entity)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Handle;
    use crate::scene::Transform;

    fn unit_box() -> Aabb {
        Aabb {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }

    fn spawn_box(world: &mut World, translation: Vec3, scale: Vec3) -> hecs::Entity {
        world.spawn((
            MeshComponent(Handle::new(0)),
            LocalBounds(unit_box()),
            TransformComponent(Transform::from_trs(translation, Vec3::ZERO, scale)),
        ))
    }

    #[test]
    fn ray_through_box_hits() {
        let b = unit_box();
        let t = b.intersect_ray(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!((t.unwrap() - 4.5).abs() < 1e-6);
    }

    #[test]
    fn ray_away_from_box_misses() {
        let b = unit_box();
        assert!(b.intersect_ray(Vec3::new(0.0, 0.0, -5.0), Vec3::NEG_Z).is_none());
        assert!(b.intersect_ray(Vec3::new(0.0, 0.0, -5.0), Vec3::Y).is_none());
    }

    #[test]
    fn axis_aligned_ray_does_not_produce_nan() {
        let b = unit_box();
        // Direction has exact zeros on two axes; origin sits on a face plane.
        let t = b.intersect_ray(Vec3::new(0.5, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let t = t.expect("grazing ray should still hit");
        assert!(t.is_finite());

        // Parallel ray outside the slab misses cleanly.
        assert!(b
            .intersect_ray(Vec3::new(2.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0))
            .is_none());
    }

    #[test]
    fn origin_inside_box_reports_zero_entry() {
        let b = unit_box();
        let t = b.intersect_ray(Vec3::ZERO, Vec3::X).unwrap();
        assert_eq!(t, 0.0);
    }

    #[test]
    fn pick_selects_containing_entity() {
        let mut world = World::new();
        let target = spawn_box(&mut world, Vec3::new(0.0, 0.0, 5.0), Vec3::splat(2.0));

        // Ray from the origin through the box center.
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(pick(&world, &ray), Some(target));
    }

    #[test]
    fn pick_prefers_nearest_entity() {
        let mut world = World::new();
        let near = spawn_box(&mut world, Vec3::new(0.0, 0.0, 3.0), Vec3::ONE);
        let _far = spawn_box(&mut world, Vec3::new(0.0, 0.0, 8.0), Vec3::ONE);

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(pick(&world, &ray), Some(near));
    }

    #[test]
    fn pick_misses_everything() {
        let mut world = World::new();
        spawn_box(&mut world, Vec3::new(0.0, 0.0, 5.0), Vec3::ONE);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(pick(&world, &ray), None);
    }

    #[test]
    fn cursor_ray_points_through_screen_center() {
        let mut camera = crate::scene::Camera::default();
        camera.set_perspective_projection(50f32.to_radians(), 1.0, 0.1, 100.0);
        camera.set_view_yxz(Vec3::new(0.0, 0.0, -2.5), Vec3::ZERO);

        let ray = Ray::from_cursor(
            Vec2::new(400.0, 300.0),
            Vec2::new(800.0, 600.0),
            camera.projection(),
            camera.inverse_view(),
        );

        assert!(ray.origin.abs_diff_eq(Vec3::new(0.0, 0.0, -2.5), 1e-5));
        assert!(ray.direction.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn cursor_above_center_rays_toward_world_up() {
        let mut camera = crate::scene::Camera::default();
        camera.set_perspective_projection(50f32.to_radians(), 1.0, 0.1, 100.0);
        camera.set_view_yxz(Vec3::ZERO, Vec3::ZERO);

        let ray = Ray::from_cursor(
            Vec2::new(400.0, 150.0),
            Vec2::new(800.0, 600.0),
            camera.projection(),
            camera.inverse_view(),
        );

        // World up is -y, so a cursor in the upper half tilts the ray up.
        assert!(ray.direction.y < 0.0);
        assert!(ray.direction.z > 0.0);
    }

    #[test]
    fn pick_finds_the_entity_under_its_rendered_pixel() {
        let mut world = World::new();
        let center = Vec3::new(0.0, -1.0, 5.0);
        let target = spawn_box(&mut world, center, Vec3::ONE);

        let surface = Vec2::new(800.0, 600.0);
        let mut camera = crate::scene::Camera::default();
        camera.set_perspective_projection(50f32.to_radians(), surface.x / surface.y, 0.1, 100.0);
        camera.set_view_yxz(Vec3::ZERO, Vec3::ZERO);

        // Project the box center to the framebuffer pixel it renders at
        // (NDC y-up, screen y-down), then cast the cursor ray from there.
        let clip = camera.projection() * camera.view() * center.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let pixel = Vec2::new(
            (ndc.x + 1.0) * 0.5 * surface.x,
            (1.0 - ndc.y) * 0.5 * surface.y,
        );
        assert!(pixel.y < surface.y * 0.5, "box above the axis renders in the upper half");

        let ray = Ray::from_cursor(pixel, surface, camera.projection(), camera.inverse_view());
        assert_eq!(pick(&world, &ray), Some(target));
    }
}
